//! Client implementation for the order service.

use crate::SERVICE_NAME;
use crate::commands::{GetOrderRequest, GetOrdersRequest, Order, OrderList};
use crate::error::{Error, Result};
use tracing::{debug, instrument};
use unary_rpc::{ClientBuilder, Endpoint, ErrorKind, RegistryClient, RpcClient};

/// Client for calling the order service.
#[derive(Debug)]
pub struct OrderClient {
    inner: RpcClient,
}

impl OrderClient {
    /// Create a new order client for the service at `endpoint`.
    ///
    /// # Errors
    /// Returns an error if the RPC client cannot be created.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let inner = RpcClient::builder().endpoint(endpoint).build()?;

        Ok(Self { inner })
    }

    /// Create a new order client from an existing RPC client.
    #[must_use]
    pub const fn from_rpc_client(inner: RpcClient) -> Self {
        Self { inner }
    }

    /// Find the order service through `registry`.
    ///
    /// # Errors
    /// Returns an error if the registry cannot be reached or holds no
    /// binding for the order service.
    pub async fn lookup(registry: &RegistryClient, builder: ClientBuilder) -> Result<Self> {
        let inner = registry.lookup(SERVICE_NAME, builder).await?;
        Ok(Self { inner })
    }

    /// Fetch one order.
    ///
    /// # Errors
    /// Returns [`Error::OrderNotFound`] if the server holds no such order, or
    /// an RPC error if the call fails.
    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i64) -> Result<Order> {
        debug!("Sending GetOrder request");

        self.inner
            .call(GetOrderRequest { order_id })
            .await
            .map_err(|e| match e.remote_kind() {
                Some(ErrorKind::NotFound) => Error::OrderNotFound(order_id),
                _ => e.into(),
            })
    }

    /// Fetch the orders of a user.
    ///
    /// # Errors
    /// Returns an error if the call fails.
    #[instrument(skip(self))]
    pub async fn get_orders(&self, user_id: i64) -> Result<OrderList> {
        debug!("Sending GetOrders request");

        Ok(self.inner.call(GetOrdersRequest { user_id }).await?)
    }
}
