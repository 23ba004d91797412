//! Service registry.
//!
//! Servers bind a service name to the endpoint they listen on; clients
//! resolve the name before calling. The registry runs either as its own
//! process ([`RegistryServer`]) or embedded in a service process by merging
//! [`router`] into the service's router.

pub mod client;
pub mod directory;
pub mod messages;
pub mod server;

pub use client::RegistryClient;
pub use directory::Registry;
pub use server::{RegistryServer, router};
