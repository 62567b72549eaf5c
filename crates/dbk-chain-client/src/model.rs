use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::PlutusData;

/// A transaction output, possibly carrying an inline datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: String,
    /// `-1` is the sentinel for "no output" (a burned token's pointer).
    pub output_index: i64,
    pub address: String,
    /// Unit (policy id ++ asset name, or "lovelace") to quantity.
    pub assets: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<PlutusData>,
}

impl Utxo {
    pub fn out_ref(&self) -> OutRef {
        OutRef {
            tx_hash: self.tx_hash.clone(),
            output_index: self.output_index,
        }
    }

    /// The "no output" marker: empty address, empty assets, index −1.
    pub fn sentinel(tx_hash: impl Into<String>) -> Self {
        Utxo {
            tx_hash: tx_hash.into(),
            output_index: -1,
            address: String::new(),
            assets: BTreeMap::new(),
            datum: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.output_index < 0 && self.address.is_empty() && self.assets.is_empty()
    }
}

/// Reference to a transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutRef {
    pub tx_hash: String,
    pub output_index: i64,
}

/// One asset holding reported for an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub policy_id: String,
    /// Hex asset name, label prefix included.
    pub asset_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptRole {
    MintingPolicy,
    SpendingValidator,
    /// Attach for both minting and spending purposes.
    Any,
}

/// An on-chain script handed to the builder as an opaque blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptAttachment {
    pub role: ScriptRole,
    /// Serialized script, hex.
    pub script: String,
}

/// How the builder should materialize a redeemer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RedeemerSpec {
    /// A payload known at planning time.
    Fixed { data: PlutusData },
    /// A payload that depends on the positions of `inputs` in the final
    /// transaction input ordering: the builder resolves the indices and
    /// produces `Constr(constructor, [Int(i), ...])`. Order-sensitive.
    SelectedInputs {
        inputs: Vec<OutRef>,
        constructor: u64,
    },
}

/// A planned transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOutput {
    pub address: String,
    pub assets: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_datum: Option<PlutusData>,
}

/// Declarative transaction plan consumed by a [`crate::TxBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxPlan {
    /// Inputs to collect.
    pub collect: Vec<Utxo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collect_redeemer: Option<RedeemerSpec>,
    /// Unit to signed mint amount; negative burns.
    pub mint: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mint_redeemer: Option<RedeemerSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptAttachment>,
    pub outputs: Vec<PlannedOutput>,
    /// Transaction validity deadline, epoch milliseconds.
    pub valid_until_epoch_ms: u64,
}

/// Builder output, not yet signed. Opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub tx: String,
}

/// A transaction carrying its witnesses, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    pub tx: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_has_no_output() {
        let u = Utxo::sentinel("deadbeef");
        assert_eq!(u.output_index, -1);
        assert!(u.address.is_empty());
        assert!(u.assets.is_empty());
        assert!(u.is_sentinel());
    }

    #[test]
    fn regular_utxo_is_not_sentinel() {
        let mut assets = BTreeMap::new();
        assets.insert("lovelace".to_owned(), 2_000_000);
        let u = Utxo {
            tx_hash: "ab".repeat(32),
            output_index: 0,
            address: "addr_test1xyz".to_owned(),
            assets,
            datum: None,
        };
        assert!(!u.is_sentinel());
    }
}
