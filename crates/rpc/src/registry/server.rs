//! Registry served over the network.

use crate::endpoint::Endpoint;
use crate::error::{HandlerError, HandlerResult, Result};
use crate::registry::directory::Registry;
use crate::registry::messages::{
    BindRequest, BindResponse, ListRequest, ResolveRequest, UnbindRequest,
};
use crate::transport::{Router, RpcServer, ServerConfig, ServerHandle};
use std::future::ready;
use tracing::info;

fn require_name(name: &str) -> HandlerResult<()> {
    if name.is_empty() {
        return Err(HandlerError::InvalidArgument(
            "service name must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Routes for the registry operations, backed by `registry`.
///
/// Merge these into another router to embed the registry in a service
/// process.
#[must_use]
pub fn router(registry: &Registry) -> Router {
    let bind = registry.clone();
    let resolve = registry.clone();
    let unbind = registry.clone();
    let list = registry.clone();

    Router::new()
        .route(move |request: BindRequest| {
            ready(require_name(&request.name).map(|()| {
                info!("Bound {} to {}", request.name, request.endpoint);
                BindResponse {
                    previous: bind.bind(request.name, request.endpoint),
                }
            }))
        })
        .route(move |request: ResolveRequest| {
            ready(
                resolve
                    .resolve(&request.name)
                    .map_err(HandlerError::from),
            )
        })
        .route(move |request: UnbindRequest| {
            ready(require_name(&request.name).map(|()| unbind.unbind(&request.name)))
        })
        .route(move |_: ListRequest| ready(Ok(list.list())))
}

/// A standalone registry process.
pub struct RegistryServer {
    inner: RpcServer<Router>,
    registry: Registry,
}

impl RegistryServer {
    /// Registry server listening on `endpoint` with default settings.
    #[must_use]
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_config(endpoint, Registry::new(), ServerConfig::default())
    }

    /// Registry server over an existing directory.
    #[must_use]
    pub fn with_config(endpoint: Endpoint, registry: Registry, config: ServerConfig) -> Self {
        Self {
            inner: RpcServer::new(endpoint, router(&registry), config),
            registry,
        }
    }

    /// The directory this server exposes.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Bind the listener, returning the bound endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(&mut self) -> Result<Endpoint> {
        self.inner.bind().await
    }

    /// Handle for shutting the server down.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        self.inner.handle()
    }

    /// Serve until shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind.
    pub async fn serve(self) -> Result<()> {
        self.inner.serve().await
    }
}
