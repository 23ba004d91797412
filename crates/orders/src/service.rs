//! The order service contract and its catalog-backed implementation.

use crate::commands::{GetOrderRequest, GetOrdersRequest, Order, OrderList};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Trait that must be implemented to serve order requests.
///
/// Implementations are shared by every connection of a server and must not
/// depend on the order in which calls arrive.
#[async_trait]
pub trait OrderService: Send + Sync + 'static {
    /// Handle a single-order request.
    async fn get_order(&self, request: GetOrderRequest) -> Result<Order>;

    /// Handle an order-list request.
    async fn get_orders(&self, request: GetOrdersRequest) -> Result<OrderList>;
}

/// What `get_order` answers for an id the catalog does not hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownOrderPolicy {
    /// Fail with [`Error::OrderNotFound`].
    #[default]
    NotFound,
    /// Answer with the reference order regardless of the id.
    Placeholder,
}

/// Number of orders every user has unless configured otherwise.
pub const DEFAULT_ORDERS_PER_USER: u16 = 3;

/// Order service over a fixed in-memory catalog.
///
/// The catalog starts with the reference order `{id: 1, item: "itm-1",
/// quantity: 2}`. Order lists are generated: entry `i` of a user's list is
/// `{id: i + 1, item: "itm-i", quantity: i + 1}`.
#[derive(Debug, Clone)]
pub struct CatalogOrderService {
    catalog: BTreeMap<i64, Order>,
    policy: UnknownOrderPolicy,
    orders_per_user: u16,
}

impl Default for CatalogOrderService {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogOrderService {
    /// Catalog holding only the reference order.
    #[must_use]
    pub fn new() -> Self {
        let reference = Self::reference_order();
        Self {
            catalog: BTreeMap::from([(reference.id, reference)]),
            policy: UnknownOrderPolicy::default(),
            orders_per_user: DEFAULT_ORDERS_PER_USER,
        }
    }

    /// The record `get_order(1)` returns.
    #[must_use]
    pub fn reference_order() -> Order {
        Order {
            id: 1,
            item: "itm-1".to_string(),
            quantity: 2,
        }
    }

    /// Set the unknown-order policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: UnknownOrderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set how many orders each user's list holds.
    #[must_use]
    pub const fn with_orders_per_user(mut self, count: u16) -> Self {
        self.orders_per_user = count;
        self
    }

    /// Add or replace a catalog entry.
    #[must_use]
    pub fn with_order(mut self, order: Order) -> Self {
        self.catalog.insert(order.id, order);
        self
    }

    /// The configured unknown-order policy.
    #[must_use]
    pub const fn policy(&self) -> UnknownOrderPolicy {
        self.policy
    }

    fn order_list(&self) -> OrderList {
        OrderList {
            orders: (0..self.orders_per_user)
                .map(|i| Order {
                    id: i64::from(i) + 1,
                    item: format!("itm-{i}"),
                    quantity: i32::from(i) + 1,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl OrderService for CatalogOrderService {
    async fn get_order(&self, request: GetOrderRequest) -> Result<Order> {
        if let Some(order) = self.catalog.get(&request.order_id) {
            return Ok(order.clone());
        }

        match self.policy {
            UnknownOrderPolicy::NotFound => Err(Error::OrderNotFound(request.order_id)),
            UnknownOrderPolicy::Placeholder => {
                debug!("Order {} unknown, answering with placeholder", request.order_id);
                Ok(Self::reference_order())
            }
        }
    }

    async fn get_orders(&self, request: GetOrdersRequest) -> Result<OrderList> {
        debug!("Listing orders for user {}", request.user_id);
        Ok(self.order_list())
    }
}
