//! Error types for the order service.

use thiserror::Error;
use unary_rpc::HandlerError;

/// Result type alias for order operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for order operations.
#[derive(Debug, Error)]
pub enum Error {
    /// RPC framework error.
    #[error("RPC error: {0}")]
    Rpc(#[from] unary_rpc::Error),

    /// No order with this id exists.
    #[error("Order {0} not found")]
    OrderNotFound(i64),

    /// Generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<Error> for HandlerError {
    fn from(err: Error) -> Self {
        match err {
            Error::OrderNotFound(id) => Self::NotFound(format!("order {id}")),
            other => Self::Internal(other.to_string()),
        }
    }
}
