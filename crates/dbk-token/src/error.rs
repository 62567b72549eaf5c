use thiserror::Error;

use dbk_chain_client::ChainError;

use crate::plan::MAX_NAME_LEN;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token name is required")]
    NameRequired,

    #[error("token name is too long; max {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("token name may only contain alphanumeric characters and underscores")]
    NameInvalid,

    #[error("image URL is required")]
    ImageRequired,

    #[error("image URL is too long; max {max} characters")]
    ImageTooLong { max: usize },

    #[error("user wallet holds no spendable outputs")]
    EmptyWallet,

    #[error("user token not found in the wallet")]
    MissingUserToken,

    #[error("malformed transaction hash: {0}")]
    MalformedTxHash(String),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
