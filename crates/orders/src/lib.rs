//! Order lookup service built on the unary RPC runtime.
//!
//! Exposes two operations, `GetOrder` and `GetOrders`, behind a typed
//! client and a server that can be registered under [`SERVICE_NAME`].

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod commands;
pub mod error;
pub mod server;
pub mod service;

pub use client::OrderClient;
pub use commands::{GetOrderRequest, GetOrdersRequest, Order, OrderList};
pub use error::{Error, Result};
pub use server::{OrderServer, router};
pub use service::{CatalogOrderService, OrderService, UnknownOrderPolicy};

/// Name the order service is bound under in a registry.
pub const SERVICE_NAME: &str = "OrderService";
