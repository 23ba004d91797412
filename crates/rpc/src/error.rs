//! Error types for the RPC runtime.

use crate::endpoint::Endpoint;
use crate::protocol::message::{ErrorInfo, ErrorKind};
use std::io;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for RPC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by server-side handlers.
pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

/// Main error type for RPC operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection-related errors.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The peer closed the channel, or it was closed locally.
    #[error("Channel closed")]
    ChannelClosed,

    /// Protocol-level errors.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Codec errors during serialization/deserialization.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The server processed the call and reported a failure.
    #[error("Remote error: {0}")]
    Remote(ErrorInfo),

    /// No binding exists for the service name.
    #[error("Service not found: {0}")]
    NotFound(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Endpoint string could not be parsed.
    #[error("Invalid endpoint `{input}`: {reason}")]
    InvalidEndpoint {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the kind reported by the server if this is a remote failure.
    #[must_use]
    pub const fn remote_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Remote(info) => Some(info.kind),
            _ => None,
        }
    }
}

/// Connection-specific errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Failed to establish connection.
    #[error("Failed to connect to {endpoint}: {source}")]
    ConnectFailed {
        /// The endpoint we tried to connect to.
        endpoint: Endpoint,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Connecting took longer than the configured limit.
    #[error("Connecting to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout {
        /// The endpoint we tried to connect to.
        endpoint: Endpoint,
        /// The configured limit.
        timeout: Duration,
    },

    /// An established connection failed.
    #[error("Connection dropped: {0}")]
    Dropped(#[source] io::Error),
}

/// Protocol-level errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Invalid frame received.
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Frame too large.
    #[error("Frame size {size} exceeds maximum {max}")]
    FrameTooLarge {
        /// Size of the frame.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Checksum mismatch.
    #[error("Checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Expected checksum.
        expected: u32,
        /// Actual checksum.
        actual: u32,
    },

    /// Unexpected frame type.
    #[error("Unexpected frame type: expected {expected}, got {actual}")]
    UnexpectedFrame {
        /// Expected frame type.
        expected: String,
        /// Actual frame type received.
        actual: String,
    },

    /// Reply does not belong to the request that was sent.
    #[error("Response for request {actual} does not match request {expected}")]
    CorrelationMismatch {
        /// Id of the request that was sent.
        expected: Uuid,
        /// Id carried by the reply.
        actual: Uuid,
    },
}

/// Codec-related errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("Failed to serialize: {0}")]
    SerializationFailed(String),

    /// Deserialization failed.
    #[error("Failed to deserialize: {0}")]
    DeserializationFailed(String),

    /// Input held more bytes than the decoded value.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),
}

/// Handler errors from server-side processing.
///
/// These never leave the server as Rust errors. The dispatcher turns them
/// into an [`ErrorInfo`] carried by the response envelope.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered for the operation.
    #[error("No handler registered for operation: {0}")]
    UnknownOperation(String),

    /// The request could not be decoded.
    #[error("Failed to decode request: {0}")]
    Decode(String),

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was well-formed but not acceptable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Handler panicked.
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// Handler returned an error.
    #[error("Handler error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Wire-level kind for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownOperation(_) => ErrorKind::UnknownOperation,
            Self::Decode(_) => ErrorKind::Decode,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Panicked(_) => ErrorKind::Panicked,
            Self::Internal(_) => ErrorKind::Handler,
        }
    }
}

impl From<Error> for HandlerError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(name) => Self::NotFound(name),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<&HandlerError> for ErrorInfo {
    fn from(err: &HandlerError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<HandlerError> for ErrorInfo {
    fn from(err: HandlerError) -> Self {
        Self::from(&err)
    }
}
