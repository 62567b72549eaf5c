use serde::{Deserialize, Serialize};

/// Structured datum/redeemer payload handed to the transaction builder.
/// Encoding to the ledger wire format is the builder's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlutusData {
    Constr { tag: u64, fields: Vec<PlutusData> },
    Map { entries: Vec<(PlutusData, PlutusData)> },
    List { items: Vec<PlutusData> },
    Int { value: i128 },
    Bytes {
        #[serde(with = "hex")]
        value: Vec<u8>,
    },
}

impl PlutusData {
    pub fn constr(tag: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { tag, fields }
    }

    pub fn int(value: i128) -> Self {
        PlutusData::Int { value }
    }

    pub fn bytes(value: impl Into<Vec<u8>>) -> Self {
        PlutusData::Bytes {
            value: value.into(),
        }
    }

    /// UTF-8 text as a byte string, the convention for metadata keys/values.
    pub fn text(value: impl AsRef<str>) -> Self {
        PlutusData::Bytes {
            value: value.as_ref().as_bytes().to_vec(),
        }
    }

    pub fn list(items: Vec<PlutusData>) -> Self {
        PlutusData::List { items }
    }

    pub fn map(entries: Vec<(PlutusData, PlutusData)>) -> Self {
        PlutusData::Map { entries }
    }

    /// Byte-string payload interpreted as UTF-8 text, when it is one.
    pub fn as_text(&self) -> Option<String> {
        match self {
            PlutusData::Bytes { value } => String::from_utf8(value.clone()).ok(),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn map_get(&self, key: &PlutusData) -> Option<&PlutusData> {
        match self {
            PlutusData::Map { entries } => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}
