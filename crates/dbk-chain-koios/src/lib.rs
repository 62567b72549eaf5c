//! HTTP adapters for the chain capability traits.
//!
//! [`KoiosProvider`] reads the ledger through a Koios-style REST API and
//! submits signed transactions. [`RemoteTxBuilder`] hands transaction
//! plans to a hosted builder endpoint; balancing, fees and wire encoding
//! happen there.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use dbk_chain_client::{
    AssetEntry, ChainError, ChainProvider, PlutusData, SignedTx, TxBuilder, TxPlan, UnsignedTx,
    Utxo,
};

/// Koios-style REST chain provider.
///
/// Reads `DOCBANK_KOIOS_URL` from the environment at construction time
/// (default: `https://preview.koios.rest/api/v1`).
pub struct KoiosProvider {
    endpoint: String,
    http: reqwest::Client,
}

impl Default for KoiosProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl KoiosProvider {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("DOCBANK_KOIOS_URL").ok())
            .unwrap_or_else(|| "https://preview.koios.rest/api/v1".to_owned());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
        }
    }

    async fn post_rows<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<T>, ChainError> {
        let url = format!("{}/{}", self.endpoint, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| ChainError::Transport(err.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            // Unknown address: report an empty result, not a failure.
            return Ok(Vec::new());
        }

        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ChainError::Provider {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text).map_err(|err| ChainError::Transport(err.to_string()))
    }
}

// ── Koios wire types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddressAssetRow {
    policy_id: String,
    asset_name: String,
}

#[derive(Debug, Deserialize)]
struct AssetListEntry {
    policy_id: String,
    asset_name: String,
    quantity: String,
}

#[derive(Debug, Deserialize)]
struct InlineDatum {
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AddressUtxoRow {
    tx_hash: String,
    tx_index: i64,
    #[serde(default)]
    address: Option<String>,
    value: String,
    #[serde(default)]
    asset_list: Option<Vec<AssetListEntry>>,
    #[serde(default)]
    inline_datum: Option<InlineDatum>,
}

/// Map the provider's datum JSON schema onto [`PlutusData`].
fn datum_from_json(value: &serde_json::Value) -> Result<PlutusData, ChainError> {
    let object = value
        .as_object()
        .ok_or_else(|| ChainError::Datum(format!("unexpected datum node: {value}")))?;

    if let Some(constructor) = object.get("constructor").and_then(|v| v.as_u64()) {
        let fields = object
            .get("fields")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ChainError::Datum("constructor without fields".to_owned()))?
            .iter()
            .map(datum_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(PlutusData::constr(constructor, fields));
    }

    if let Some(entries) = object.get("map").and_then(|v| v.as_array()) {
        let entries = entries
            .iter()
            .map(|entry| {
                let k = entry
                    .get("k")
                    .ok_or_else(|| ChainError::Datum("map entry without key".to_owned()))?;
                let v = entry
                    .get("v")
                    .ok_or_else(|| ChainError::Datum("map entry without value".to_owned()))?;
                Ok((datum_from_json(k)?, datum_from_json(v)?))
            })
            .collect::<Result<Vec<_>, ChainError>>()?;
        return Ok(PlutusData::map(entries));
    }

    if let Some(items) = object.get("list").and_then(|v| v.as_array()) {
        let items = items
            .iter()
            .map(datum_from_json)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(PlutusData::list(items));
    }

    if let Some(bytes) = object.get("bytes").and_then(|v| v.as_str()) {
        let decoded =
            hex::decode(bytes).map_err(|err| ChainError::Datum(format!("bad bytes: {err}")))?;
        return Ok(PlutusData::bytes(decoded));
    }

    if let Some(int) = object.get("int") {
        let int = int
            .as_i64()
            .map(i128::from)
            .or_else(|| int.as_u64().map(i128::from))
            .ok_or_else(|| ChainError::Datum("non-integral int".to_owned()))?;
        return Ok(PlutusData::int(int));
    }

    Err(ChainError::Datum(format!("unknown datum node: {value}")))
}

fn utxo_from_row(queried_address: &str, row: AddressUtxoRow) -> Result<Utxo, ChainError> {
    let mut assets = BTreeMap::new();
    let lovelace = row.value.parse::<u64>().unwrap_or_else(|_| {
        warn!("non-numeric lovelace value '{}', defaulting to 0", row.value);
        0
    });
    assets.insert("lovelace".to_owned(), lovelace);

    for entry in row.asset_list.unwrap_or_default() {
        let quantity = entry.quantity.parse::<u64>().unwrap_or(0);
        assets.insert(format!("{}{}", entry.policy_id, entry.asset_name), quantity);
    }

    let datum = row
        .inline_datum
        .map(|datum| datum_from_json(&datum.value))
        .transpose()?;

    Ok(Utxo {
        tx_hash: row.tx_hash,
        output_index: row.tx_index,
        address: row.address.unwrap_or_else(|| queried_address.to_owned()),
        assets,
        datum,
    })
}

#[async_trait]
impl ChainProvider for KoiosProvider {
    async fn utxos_at(&self, address: &str) -> Result<Vec<Utxo>, ChainError> {
        let rows: Vec<AddressUtxoRow> = self
            .post_rows(
                "address_utxos",
                &serde_json::json!({ "_addresses": [address], "_extended": true }),
            )
            .await?;

        rows.into_iter()
            .map(|row| utxo_from_row(address, row))
            .collect()
    }

    async fn utxos_at_with_unit(&self, address: &str, unit: &str) -> Result<Vec<Utxo>, ChainError> {
        let utxos = self.utxos_at(address).await?;
        Ok(utxos
            .into_iter()
            .filter(|utxo| utxo.assets.contains_key(unit))
            .collect())
    }

    async fn address_assets(
        &self,
        address: &str,
        policy_id: &str,
    ) -> Result<Vec<AssetEntry>, ChainError> {
        let rows: Vec<AddressAssetRow> = self
            .post_rows(
                "address_assets",
                &serde_json::json!({ "_addresses": [address] }),
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter(|row| row.policy_id == policy_id)
            .map(|row| AssetEntry {
                policy_id: row.policy_id,
                asset_name: row.asset_name,
            })
            .collect())
    }

    async fn submit_tx(&self, signed_tx: &str) -> Result<String, ChainError> {
        let bytes = hex::decode(signed_tx)
            .map_err(|err| ChainError::Rejected(format!("malformed transaction hex: {err}")))?;

        let url = format!("{}/submittx", self.endpoint);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/cbor")
            .body(bytes)
            .send()
            .await
            .map_err(|err| ChainError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ChainError::Rejected(text));
        }

        Ok(text.trim().trim_matches('"').to_owned())
    }
}

// ── Remote transaction builder ───────────────────────────────────────

#[derive(Debug, Serialize)]
struct BuildRequest<'a> {
    plan: &'a TxPlan,
}

#[derive(Debug, Deserialize)]
struct BuildResponse {
    tx: String,
}

#[derive(Debug, Serialize)]
struct AssembleRequest<'a> {
    tx: &'a str,
    witness: &'a str,
}

/// Transaction builder backed by a hosted builder service.
///
/// Reads `DOCBANK_BUILDER_URL` from the environment at construction time
/// (default: `http://localhost:3030`).
pub struct RemoteTxBuilder {
    endpoint: String,
    http: reqwest::Client,
}

impl Default for RemoteTxBuilder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl RemoteTxBuilder {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("DOCBANK_BUILDER_URL").ok())
            .unwrap_or_else(|| "http://localhost:3030".to_owned());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            http: reqwest::Client::new(),
        }
    }

    async fn post_tx<T: Serialize + Sync>(&self, path: &str, body: &T) -> Result<String, ChainError> {
        let url = format!("{}/{}", self.endpoint, path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| ChainError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ChainError::Builder(text));
        }

        let body: BuildResponse =
            serde_json::from_str(&text).map_err(|err| ChainError::Builder(err.to_string()))?;
        Ok(body.tx)
    }
}

#[async_trait]
impl TxBuilder for RemoteTxBuilder {
    async fn build(&self, plan: &TxPlan) -> Result<UnsignedTx, ChainError> {
        let tx = self.post_tx("build", &BuildRequest { plan }).await?;
        Ok(UnsignedTx { tx })
    }

    async fn assemble(
        &self,
        unsigned: &UnsignedTx,
        witness: &str,
    ) -> Result<SignedTx, ChainError> {
        let tx = self
            .post_tx(
                "assemble",
                &AssembleRequest {
                    tx: &unsigned.tx,
                    witness,
                },
            )
            .await?;
        Ok(SignedTx { tx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utxo_row_maps_value_and_assets() {
        let row: AddressUtxoRow = serde_json::from_str(
            r#"{
                "tx_hash": "aaaa",
                "tx_index": 2,
                "address": "addr_test1xyz",
                "value": "5000000",
                "asset_list": [
                    {"policy_id": "ab", "asset_name": "000643b0cd", "quantity": "1"}
                ]
            }"#,
        )
        .unwrap();

        let utxo = utxo_from_row("addr_test1queried", row).unwrap();
        assert_eq!(utxo.output_index, 2);
        assert_eq!(utxo.address, "addr_test1xyz");
        assert_eq!(utxo.assets["lovelace"], 5_000_000);
        assert_eq!(utxo.assets["ab000643b0cd"], 1);
        assert!(utxo.datum.is_none());
    }

    #[test]
    fn utxo_row_without_address_falls_back_to_queried() {
        let row: AddressUtxoRow = serde_json::from_str(
            r#"{"tx_hash": "aaaa", "tx_index": 0, "value": "0"}"#,
        )
        .unwrap();
        let utxo = utxo_from_row("addr_test1queried", row).unwrap();
        assert_eq!(utxo.address, "addr_test1queried");
    }

    #[test]
    fn datum_json_covers_every_node_kind() {
        let value = serde_json::json!({
            "constructor": 0,
            "fields": [
                {"map": [
                    {"k": {"bytes": "6e616d65"}, "v": {"bytes": "646f63"}}
                ]},
                {"int": 1},
                {"list": [{"bytes": "6d657461646174615f75726c"}]}
            ]
        });

        let datum = datum_from_json(&value).unwrap();
        match &datum {
            PlutusData::Constr { tag: 0, fields } => {
                assert_eq!(fields.len(), 3);
                assert_eq!(
                    fields[0]
                        .map_get(&PlutusData::text("name"))
                        .and_then(|v| v.as_text())
                        .as_deref(),
                    Some("doc")
                );
                assert_eq!(fields[1], PlutusData::int(1));
            }
            other => panic!("unexpected datum: {other:?}"),
        }
    }

    #[test]
    fn malformed_datum_is_a_tagged_error() {
        let err = datum_from_json(&serde_json::json!("just a string")).unwrap_err();
        assert!(matches!(err, ChainError::Datum(_)));

        let err = datum_from_json(&serde_json::json!({"bytes": "zz"})).unwrap_err();
        assert!(matches!(err, ChainError::Datum(_)));
    }

    #[test]
    fn asset_rows_filter_on_policy() {
        let rows: Vec<AddressAssetRow> = serde_json::from_str(
            r#"[
                {"policy_id": "aa", "asset_name": "000de14001", "quantity": "1"},
                {"policy_id": "bb", "asset_name": "000de14002", "quantity": "1"}
            ]"#,
        )
        .unwrap();
        let matching: Vec<_> = rows.into_iter().filter(|r| r.policy_id == "aa").collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].asset_name, "000de14001");
    }
}
