//! Capability boundary for everything chain-shaped.
//!
//! Transaction construction, signing and submission are delegated to
//! external components; this crate only defines the traits those
//! components implement and the plan/data models handed across the seam.

pub mod address;
mod data;
mod error;
mod model;

pub use data::PlutusData;
pub use error::ChainError;
pub use model::{
    AssetEntry, OutRef, PlannedOutput, RedeemerSpec, ScriptAttachment, ScriptRole, SignedTx,
    TxPlan, UnsignedTx, Utxo,
};

use async_trait::async_trait;

/// Read and submit access to the ledger.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// All UTxOs currently sitting at `address`.
    async fn utxos_at(&self, address: &str) -> Result<Vec<Utxo>, ChainError>;

    /// UTxOs at `address` that carry at least one `unit`.
    async fn utxos_at_with_unit(&self, address: &str, unit: &str) -> Result<Vec<Utxo>, ChainError>;

    /// Asset holdings of `address` under `policy_id`.
    async fn address_assets(
        &self,
        address: &str,
        policy_id: &str,
    ) -> Result<Vec<AssetEntry>, ChainError>;

    /// Submit a fully signed transaction, returning its hash.
    async fn submit_tx(&self, signed_tx: &str) -> Result<String, ChainError>;
}

/// The opaque transaction-builder capability. Balancing, fee calculation,
/// redeemer index resolution and wire encoding all happen behind it.
#[async_trait]
pub trait TxBuilder: Send + Sync {
    /// Turn a declarative plan into an unsigned transaction.
    async fn build(&self, plan: &TxPlan) -> Result<UnsignedTx, ChainError>;

    /// Combine an unsigned transaction with a wallet-produced witness set.
    async fn assemble(&self, unsigned: &UnsignedTx, witness: &str)
    -> Result<SignedTx, ChainError>;
}

/// An authorized session with a user's wallet.
#[async_trait]
pub trait WalletSession: Send + Sync {
    /// The wallet's spending address.
    async fn address(&self) -> Result<String, ChainError>;

    /// The wallet's reward address, when one exists.
    async fn reward_address(&self) -> Result<Option<String>, ChainError>;

    /// The wallet's spendable outputs.
    async fn utxos(&self) -> Result<Vec<Utxo>, ChainError>;

    /// Sign an unsigned transaction.
    async fn sign_tx(&self, unsigned: &UnsignedTx) -> Result<SignedTx, ChainError>;
}
