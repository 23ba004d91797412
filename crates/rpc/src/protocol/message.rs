//! Core message traits and envelope types.

use crate::error::{CodecError, Result};
use crate::protocol::codec::CodecKind;
use bincode::Options;
use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use uuid::Uuid;

/// Name under which an operation is dispatched.
pub type Operation = &'static str;

/// Base trait for RPC messages.
///
/// Each request type names the operation it invokes and the response type
/// that operation produces. The operation name is the key of the server's
/// dispatch table, so it must be unique within a server.
pub trait RpcMessage: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The response type for this message.
    type Response: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Operation this message invokes.
    const OPERATION: Operation;

    /// Returns the operation name; used for routing and logging.
    fn operation(&self) -> Operation {
        Self::OPERATION
    }
}

/// Request envelope for wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Unique request ID for correlation.
    pub id: Uuid,
    /// Operation to invoke.
    pub operation: String,
    /// Codec used for `payload`, and expected for the reply.
    pub codec: CodecKind,
    /// Serialized request payload.
    pub payload: Vec<u8>,
}

/// Response envelope for wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Request ID this response is for. Nil when the request could not be read.
    pub request_id: Uuid,
    /// Outcome of the call.
    pub body: ResponseBody,
}

/// Outcome of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBody {
    /// Serialized response payload.
    Ok(Vec<u8>),
    /// The call failed.
    Error(ErrorInfo),
}

/// Error information for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error kind for categorization.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Category of a server-reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The request bytes could not be decoded.
    Decode,
    /// No handler is registered for the operation.
    UnknownOperation,
    /// The handler could not find what was asked for.
    NotFound,
    /// The handler rejected the arguments.
    InvalidArgument,
    /// The handler failed.
    Handler,
    /// The handler panicked.
    Panicked,
}

fn envelope_options(limit: usize) -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(limit as u64)
        .reject_trailing_bytes()
}

fn to_envelope_bytes<T: Serialize>(value: &T) -> Result<Bytes> {
    bincode::DefaultOptions::new()
        .serialize(value)
        .map(Bytes::from)
        .map_err(|e| CodecError::SerializationFailed(e.to_string()).into())
}

fn from_envelope_bytes<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    envelope_options(data.len())
        .deserialize(data)
        .map_err(|e| CodecError::DeserializationFailed(e.to_string()).into())
}

impl RequestEnvelope {
    /// Build an envelope for `message`, encoding it with `codec`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be serialized.
    pub fn for_message<M: RpcMessage>(message: &M, codec: CodecKind) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            operation: message.operation().to_string(),
            codec,
            payload: codec.encode(message)?.to_vec(),
        })
    }

    /// Serialize the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Bytes> {
        to_envelope_bytes(self)
    }

    /// Deserialize an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not exactly one request envelope.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        from_envelope_bytes(data)
    }
}

impl ResponseEnvelope {
    /// Successful response.
    #[must_use]
    pub const fn ok(request_id: Uuid, payload: Vec<u8>) -> Self {
        Self {
            request_id,
            body: ResponseBody::Ok(payload),
        }
    }

    /// Failed response.
    #[must_use]
    pub const fn error(request_id: Uuid, error: ErrorInfo) -> Self {
        Self {
            request_id,
            body: ResponseBody::Error(error),
        }
    }

    /// Serialize the envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Bytes> {
        to_envelope_bytes(self)
    }

    /// Deserialize an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not exactly one response envelope.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        from_envelope_bytes(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ping {
        seq: u64,
    }

    impl RpcMessage for Ping {
        type Response = Ping;

        const OPERATION: Operation = "test.ping";
    }

    #[test]
    fn test_request_envelope_roundtrip() {
        let envelope = RequestEnvelope::for_message(&Ping { seq: 7 }, CodecKind::Json).unwrap();
        assert_eq!(envelope.operation, "test.ping");

        let decoded = RequestEnvelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, envelope);

        let ping: Ping = decoded.codec.decode(&decoded.payload).unwrap();
        assert_eq!(ping, Ping { seq: 7 });
    }

    #[test]
    fn test_response_envelope_error_body() {
        let envelope = ResponseEnvelope::error(
            Uuid::nil(),
            ErrorInfo {
                kind: ErrorKind::Decode,
                message: "bad bytes".to_string(),
            },
        );

        let decoded = ResponseEnvelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_garbage_envelope_is_rejected() {
        assert!(RequestEnvelope::from_bytes(&[0xff; 3]).is_err());

        // A huge declared length must fail instead of allocating.
        let mut bogus = bincode::DefaultOptions::new().serialize(&Uuid::nil()).unwrap();
        bogus.extend_from_slice(&[0xfc, 0xff, 0xff, 0xff, 0x7f]);
        assert!(RequestEnvelope::from_bytes(&bogus).is_err());
    }

    #[test]
    fn test_truncated_envelope_is_rejected() {
        let bytes = ResponseEnvelope::ok(Uuid::new_v4(), vec![1, 2, 3])
            .to_bytes()
            .unwrap();
        assert!(ResponseEnvelope::from_bytes(&bytes[..bytes.len() - 1]).is_err());
    }
}
