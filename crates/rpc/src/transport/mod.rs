//! Transport layer for the RPC runtime.
//!
//! This module handles framed TCP channels, the unary client, the
//! connection-per-task server, and operation routing.

pub mod channel;
pub mod client;
pub mod router;
pub mod server;

pub use channel::{Channel, ChannelCloser};
pub use client::{ClientBuilder, ClientConfig, RpcClient};
pub use router::Router;
pub use server::{RpcHandler, RpcServer, ServerConfig, ServerHandle, ServerState};
