//! Payload codecs.
//!
//! Request and response payloads are encoded with the codec the client
//! selected. The request envelope names it, and the server answers in kind.
//! Decoding is strict: a payload that does not match the expected shape, or
//! that carries bytes past the decoded value, is rejected.

use crate::error::{CodecError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::str::FromStr;

/// Encoding used for message payloads.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CodecKind {
    /// CBOR via `ciborium`.
    #[default]
    Cbor,
    /// JSON via `serde_json`.
    Json,
}

impl CodecKind {
    /// Encode a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be serialized.
    pub fn encode<T: Serialize>(self, msg: &T) -> Result<Bytes> {
        match self {
            Self::Cbor => encode(msg),
            Self::Json => serde_json::to_vec(msg)
                .map(Bytes::from)
                .map_err(|e| CodecError::SerializationFailed(e.to_string()).into()),
        }
    }

    /// Decode a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the data does not hold exactly one value of type `T`.
    pub fn decode<T: DeserializeOwned>(self, data: &[u8]) -> Result<T> {
        match self {
            Self::Cbor => decode(data),
            Self::Json => serde_json::from_slice(data)
                .map_err(|e| CodecError::DeserializationFailed(e.to_string()).into()),
        }
    }

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cbor => "cbor",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CodecKind {
    type Err = CodecError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cbor" => Ok(Self::Cbor),
            "json" => Ok(Self::Json),
            other => Err(CodecError::DeserializationFailed(format!(
                "unknown codec: {other}"
            ))),
        }
    }
}

/// Encode a message into CBOR bytes.
///
/// # Errors
///
/// Returns an error if the message cannot be serialized.
pub fn encode<T: Serialize>(msg: &T) -> Result<Bytes> {
    let mut vec = Vec::new();
    ciborium::ser::into_writer(msg, &mut vec)
        .map_err(|e| CodecError::SerializationFailed(e.to_string()))?;
    Ok(Bytes::from(vec))
}

/// Decode CBOR bytes into a message.
///
/// # Errors
///
/// Returns an error if the data is invalid, the message cannot be
/// deserialized, or bytes remain after the message.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    let mut remaining = data;
    let value = ciborium::de::from_reader(&mut remaining)
        .map_err(|e| CodecError::DeserializationFailed(e.to_string()))?;

    if !remaining.is_empty() {
        return Err(CodecError::TrailingBytes(remaining.len()).into());
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct TestMessage {
        id: i64,
        name: String,
        quantity: i32,
        tags: Vec<String>,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct OtherShape {
        user_id: i64,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Narrow {
        quantity: i32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wide {
        quantity: i64,
    }

    fn sample() -> TestMessage {
        TestMessage {
            id: 42,
            name: "test".to_string(),
            quantity: 2,
            tags: vec!["a".to_string(), "b".to_string()],
        }
    }

    #[test]
    fn test_encode_decode() {
        let msg = sample();

        let encoded = encode(&msg).unwrap();
        let decoded: TestMessage = decode(&encoded).unwrap();

        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_decode_error() {
        let bad_data = vec![0xFF, 0xFF, 0xFF];
        let result: Result<TestMessage> = decode(&bad_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_shape_is_rejected() {
        for codec in [CodecKind::Cbor, CodecKind::Json] {
            let encoded = codec.encode(&sample()).unwrap();
            let result: Result<OtherShape> = codec.decode(&encoded);
            assert!(result.is_err(), "{codec} accepted a foreign shape");
        }
    }

    #[test]
    fn test_out_of_range_integer_is_not_truncated() {
        for codec in [CodecKind::Cbor, CodecKind::Json] {
            let encoded = codec
                .encode(&Wide {
                    quantity: i64::from(i32::MAX) + 1,
                })
                .unwrap();
            let result: Result<Narrow> = codec.decode(&encoded);
            assert!(result.is_err(), "{codec} coerced an out-of-range integer");
        }
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut encoded = encode(&sample()).unwrap().to_vec();
        encoded.push(0x00);

        let result: Result<TestMessage> = decode(&encoded);
        assert!(matches!(
            result,
            Err(crate::Error::Codec(CodecError::TrailingBytes(1)))
        ));

        let mut json = CodecKind::Json.encode(&sample()).unwrap().to_vec();
        json.extend_from_slice(b"{}");
        assert!(CodecKind::Json.decode::<TestMessage>(&json).is_err());
    }

    #[test]
    fn test_codec_kind_from_str() {
        assert_eq!("CBOR".parse::<CodecKind>().unwrap(), CodecKind::Cbor);
        assert_eq!("json".parse::<CodecKind>().unwrap(), CodecKind::Json);
        assert!("xml".parse::<CodecKind>().is_err());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(
            id in any::<i64>(),
            name in ".*",
            quantity in any::<i32>(),
            tags in proptest::collection::vec(".*", 0..8),
            json in any::<bool>(),
        ) {
            let codec = if json { CodecKind::Json } else { CodecKind::Cbor };
            let msg = TestMessage { id, name, quantity, tags };

            let encoded = codec.encode(&msg).unwrap();
            let decoded: TestMessage = codec.decode(&encoded).unwrap();

            prop_assert_eq!(msg, decoded);
        }
    }
}
