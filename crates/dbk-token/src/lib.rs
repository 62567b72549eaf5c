//! CIP-68-style token operations: mint, update, burn, list.
//!
//! Each operation plans a transaction (pure, in `plan`), then hands the
//! plan to the external builder, the wallet session for signing, and the
//! chain provider for submission. The reference unit always lives at the
//! script address; the user-held unit authorizes update and burn.

mod error;
mod ops;
mod plan;
pub mod script;

pub use error::TokenError;
pub use ops::{burn, list_tokens, mint, update};
pub use plan::{
    PreparedToken, VALIDITY_WINDOW_MS, asset_name_from_nonce, burn_redeemer, cip68_datum,
    cip68_metadata_map, datum_to_json, mint_redeemer, plan_burn, plan_mint, plan_update,
    select_nonce, update_redeemer, validate_token_name,
};

use dbk_chain_client::Utxo;
use serde::{Deserialize, Serialize};

/// Inputs to a mint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenParams {
    pub name: String,
    pub image: String,
    /// Free-form extra metadata, merged into the on-chain map.
    pub metadata: Option<serde_json::Value>,
}

/// A minted token as tracked locally: its display fields plus the pointer
/// to the on-chain output holding the reference unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub name: String,
    pub image: String,
    pub utxo: Utxo,
    /// Derived 56-hex-char asset name (label prefix excluded).
    pub asset_name: String,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Token {
    /// Stamp the submitted transaction hash onto the UTxO pointer.
    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.utxo.tx_hash = tx_hash.into();
        self
    }
}
