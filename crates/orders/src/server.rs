//! Server implementation for the order service.

use crate::commands::{GetOrderRequest, GetOrdersRequest};
use crate::service::OrderService;
use std::sync::Arc;
use tracing::{debug, error};
use unary_rpc::{
    Endpoint, HandlerError, Router, RpcServer, ServerConfig, ServerHandle,
};

/// Routes for the order operations, backed by `service`.
///
/// Merge these with other routers to serve several services from one
/// process.
#[must_use]
pub fn router<S: OrderService>(service: S) -> Router {
    let service = Arc::new(service);
    let orders = Arc::clone(&service);

    Router::new()
        .route(move |request: GetOrderRequest| {
            let service = Arc::clone(&service);
            async move {
                debug!("Received GetOrder for {}", request.order_id);
                service.get_order(request).await.map_err(|e| {
                    error!("GetOrder {} failed: {}", request.order_id, e);
                    HandlerError::from(e)
                })
            }
        })
        .route(move |request: GetOrdersRequest| {
            let service = Arc::clone(&orders);
            async move {
                debug!("Received GetOrders for user {}", request.user_id);
                service.get_orders(request).await.map_err(|e| {
                    error!("GetOrders for user {} failed: {}", request.user_id, e);
                    HandlerError::from(e)
                })
            }
        })
}

/// Order server that listens for requests.
pub struct OrderServer {
    inner: RpcServer<Router>,
}

impl OrderServer {
    /// Create a new order server.
    #[must_use]
    pub fn new<S: OrderService>(endpoint: Endpoint, service: S) -> Self {
        Self::with_config(endpoint, service, ServerConfig::default())
    }

    /// Create a new order server with custom configuration.
    #[must_use]
    pub fn with_config<S: OrderService>(
        endpoint: Endpoint,
        service: S,
        config: ServerConfig,
    ) -> Self {
        Self {
            inner: RpcServer::new(endpoint, router(service), config),
        }
    }

    /// Bind the listener, returning the bound endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(&mut self) -> crate::Result<Endpoint> {
        Ok(self.inner.bind().await?)
    }

    /// Handle for shutting the server down.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        self.inner.handle()
    }

    /// Start serving requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn serve(self) -> crate::Result<()> {
        self.inner.serve().await?;
        Ok(())
    }
}
