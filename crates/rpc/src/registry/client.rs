//! Client for a remote registry.

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::protocol::ErrorKind;
use crate::registry::messages::{BindRequest, ListRequest, ResolveRequest, UnbindRequest};
use crate::transport::{ClientBuilder, RpcClient};
use tracing::{debug, instrument};

/// Talks to a registry served by [`RegistryServer`](super::RegistryServer).
#[derive(Debug)]
pub struct RegistryClient {
    inner: RpcClient,
}

impl RegistryClient {
    /// Client for the registry at `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        Ok(Self::from_rpc_client(
            RpcClient::builder().endpoint(endpoint).build()?,
        ))
    }

    /// Wrap an already configured client.
    #[must_use]
    pub const fn from_rpc_client(inner: RpcClient) -> Self {
        Self { inner }
    }

    /// Bind `name` to `endpoint`, returning the endpoint it replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached or rejects the name.
    #[instrument(skip(self))]
    pub async fn bind(&self, name: &str, endpoint: Endpoint) -> Result<Option<Endpoint>> {
        let response = self
            .inner
            .call(BindRequest {
                name: name.to_string(),
                endpoint,
            })
            .await?;
        Ok(response.previous)
    }

    /// Look up the endpoint bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound to `name`, or an error
    /// if the registry cannot be reached.
    #[instrument(skip(self))]
    pub async fn resolve(&self, name: &str) -> Result<Endpoint> {
        self.inner
            .call(ResolveRequest {
                name: name.to_string(),
            })
            .await
            .map_err(|e| match e.remote_kind() {
                Some(ErrorKind::NotFound) => Error::NotFound(name.to_string()),
                _ => e,
            })
    }

    /// Remove the binding for `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    #[instrument(skip(self))]
    pub async fn unbind(&self, name: &str) -> Result<Option<Endpoint>> {
        self.inner
            .call(UnbindRequest {
                name: name.to_string(),
            })
            .await
    }

    /// All bound names, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be reached.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.inner.call(ListRequest).await
    }

    /// Resolve `name` and build a client for it from `builder`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is bound to `name`, or an error
    /// if the registry cannot be reached.
    pub async fn lookup(&self, name: &str, builder: ClientBuilder) -> Result<RpcClient> {
        let endpoint = self.resolve(name).await?;
        debug!("Resolved {} to {}", name, endpoint);
        builder.endpoint(endpoint).build()
    }
}
