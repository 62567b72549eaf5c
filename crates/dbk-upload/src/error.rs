use thiserror::Error;

use dbk_pinning::PinError;
use dbk_registry::RegistryError;
use dbk_token::TokenError;

use crate::validate::MAX_NAME_LEN;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("connect your wallet first")]
    NotConnected,

    #[error("select a document to proceed")]
    NoFile,

    #[error("enter a document name to proceed")]
    NameRequired,

    #[error("document name is too long; max {MAX_NAME_LEN} characters")]
    NameTooLong,

    #[error("document name may only contain letters, digits, underscores and spaces")]
    NameInvalid,

    #[error("unsupported document type: {0:?}")]
    UnsupportedType(String),

    #[error("document exceeds the 10 MiB size limit")]
    FileTooLarge,

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Token(#[from] TokenError),
}
