//! Greeting service built on the unary RPC runtime.
//!
//! The service is published in a registry under [`SERVICE_NAME`] and answers
//! `SayHello(name)` with `"Hello {name}"`.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod commands;
pub mod error;
pub mod server;

pub use client::HelloClient;
pub use commands::{HelloRequest, HelloResponse};
pub use error::{Error, Result};
pub use server::{Greeter, HelloServer, HelloService, router};

/// Name the greeting service is bound under in a registry.
pub const SERVICE_NAME: &str = "HelloService";
