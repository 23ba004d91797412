//! Minimal unary RPC over TCP.
//!
//! This crate provides a small request/response RPC runtime: a caller sends
//! one request and waits for exactly one reply.
//!
//! # Features
//!
//! - **Framing**: length-prefixed frames with crc32 checksums
//! - **Pluggable Payloads**: CBOR by default, JSON on request
//! - **Registry**: bind service names to endpoints and resolve them
//! - **Routing**: typed handlers keyed by operation name
//! - **Graceful Shutdown**: stop accepting, then drain in-flight calls
//!
//! # Example
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use std::future::ready;
//! use unary_rpc::{Endpoint, Operation, Router, RpcClient, RpcMessage, RpcServer, ServerConfig};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Echo {
//!     message: String,
//! }
//!
//! impl RpcMessage for Echo {
//!     type Response = String;
//!
//!     const OPERATION: Operation = "Echo";
//! }
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let router = Router::new().route(|echo: Echo| ready(Ok(echo.message)));
//!     let mut server = RpcServer::new(Endpoint::localhost(0), router, ServerConfig::default());
//!     let endpoint = server.bind().await?;
//!     tokio::spawn(server.serve());
//!
//!     let client = RpcClient::builder().endpoint(endpoint).build()?;
//!     let reply = client
//!         .call(Echo {
//!             message: "Hello".to_string(),
//!         })
//!         .await?;
//!     assert_eq!(reply, "Hello");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod transport;

// Re-export commonly used types
pub use endpoint::{DEFAULT_REGISTRY_PORT, Endpoint};
pub use error::{Error, HandlerError, HandlerResult, Result};
pub use protocol::{CodecKind, ErrorInfo, ErrorKind, Operation, RpcMessage};
pub use registry::{Registry, RegistryClient, RegistryServer};
pub use transport::{
    Channel, ChannelCloser, ClientBuilder, ClientConfig, Router, RpcClient, RpcHandler, RpcServer,
    ServerConfig, ServerHandle, ServerState,
};

// Re-export dependencies that are part of our public API
pub use async_trait::async_trait;
pub use bytes::Bytes;
