//! Client implementation for the greeting service.

use crate::SERVICE_NAME;
use crate::commands::HelloRequest;
use crate::error::Result;
use tracing::instrument;
use unary_rpc::{ClientBuilder, Endpoint, RegistryClient, RpcClient};

/// Client for calling the greeting service.
#[derive(Debug)]
pub struct HelloClient {
    inner: RpcClient,
}

impl HelloClient {
    /// Create a new greeting client for the service at `endpoint`.
    ///
    /// # Errors
    /// Returns an error if the RPC client cannot be created.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let inner = RpcClient::builder().endpoint(endpoint).build()?;

        Ok(Self { inner })
    }

    /// Create a new greeting client from an existing RPC client.
    #[must_use]
    pub const fn from_rpc_client(inner: RpcClient) -> Self {
        Self { inner }
    }

    /// Find the greeting service through `registry`.
    ///
    /// # Errors
    /// Returns an error if the registry cannot be reached or holds no
    /// binding for the greeting service.
    pub async fn lookup(registry: &RegistryClient, builder: ClientBuilder) -> Result<Self> {
        let inner = registry.lookup(SERVICE_NAME, builder).await?;
        Ok(Self { inner })
    }

    /// Greet `name`, returning the greeting text.
    ///
    /// # Errors
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn say_hello(&self, name: &str) -> Result<String> {
        let response = self
            .inner
            .call(HelloRequest {
                name: name.to_string(),
            })
            .await?;
        Ok(response.message)
    }
}
