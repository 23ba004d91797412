//! Error types for the greeting service.

use thiserror::Error;
use unary_rpc::HandlerError;

/// Result type alias for greeting operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for greeting operations.
#[derive(Debug, Error)]
pub enum Error {
    /// RPC framework error.
    #[error("RPC error: {0}")]
    Rpc(#[from] unary_rpc::Error),

    /// The name to greet was rejected.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// Generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<Error> for HandlerError {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidName(reason) => Self::InvalidArgument(reason),
            other => Self::Internal(other.to_string()),
        }
    }
}
