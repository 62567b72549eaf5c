use thiserror::Error;

use crate::address::AddressError;

/// Tagged failures produced at the chain boundary. Every adapter maps its
/// transport/wire failures into one of these at the point of occurrence;
/// no caller inspects error strings.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("chain provider is not initialized")]
    NotConnected,

    #[error("wallet is not connected")]
    WalletDisconnected,

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("chain provider rejected the request ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("transaction builder error: {0}")]
    Builder(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("malformed address: {0}")]
    Address(#[from] AddressError),

    #[error("malformed datum: {0}")]
    Datum(String),
}
