//! Protocol layer for the RPC runtime.
//!
//! This module contains the core protocol definitions including:
//! - Message traits and envelopes
//! - Payload codecs
//! - Framing

pub mod codec;
pub mod framing;
pub mod message;

pub use codec::CodecKind;
pub use framing::{Frame, FrameCodec, FrameType, MAX_FRAME_SIZE};
pub use message::{
    ErrorInfo, ErrorKind, Operation, RequestEnvelope, ResponseBody, ResponseEnvelope, RpcMessage,
};
