use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentStatus {
    #[serde(rename = "MINTED")]
    Minted,
    #[serde(rename = "NOT MINTED")]
    NotMinted,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Minted => write!(f, "MINTED"),
            DocumentStatus::NotMinted => write!(f, "NOT MINTED"),
        }
    }
}

/// One row of the `documents` registry, as served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: Uuid,
    pub owner_address: String,
    pub document_hash: String,
    pub document_uri: String,
    pub document_name: String,
    pub document_type: String,
    /// Size in bytes, stored as a string.
    pub document_size: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UploadMode {
    Upload,
    Mint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadDocumentRequest {
    pub owner_address: String,
    pub document_name: String,
    pub file_name: String,
    /// Raw file bytes, base64-encoded.
    pub file_base64: String,
    pub mode: UploadMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadDocumentResponse {
    /// Upload-only mode: the registry row that was written.
    Stored { document: DocumentRecord },
    /// Mint mode: the projected token plus the unsigned transaction the
    /// wallet still has to sign.
    MintPending {
        token: TokenDto,
        unsigned_tx: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCountResponse {
    pub owner_address: String,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageStatsResponse {
    pub owner_address: String,
    pub used_size: f64,
    pub used_unit: String,
    pub quota_gb: u64,
    /// Share of the quota in use, capped at 100.
    pub percentage: f64,
    pub document_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoDto {
    pub tx_hash: String,
    pub output_index: i64,
    pub address: String,
    pub assets: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDto {
    pub name: String,
    pub image: String,
    pub asset_name: String,
    pub utxo: UtxoDto,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListResponse {
    pub tokens: Vec<TokenDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUpdateRequest {
    pub owner_address: String,
    pub name: String,
    pub image: String,
    pub asset_name: String,
    pub utxo: UtxoDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBurnRequest {
    pub owner_address: String,
    pub name: String,
    pub image: String,
    pub asset_name: String,
    pub utxo: UtxoDto,
}

/// A prepared (planned and built, not yet signed) token transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparedTokenResponse {
    pub token: TokenDto,
    pub unsigned_tx: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSubmitRequest {
    /// Serialized unsigned transaction returned by a prepare endpoint.
    pub tx: String,
    /// Witness set produced by the signing wallet.
    pub witness: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSubmitResponse {
    pub tx_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
