//! Command definitions for the order service.

mod get_order;
mod get_orders;

pub use get_order::GetOrderRequest;
pub use get_orders::{GetOrdersRequest, OrderList};

use serde::{Deserialize, Serialize};

/// A single order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Order {
    /// Order id.
    pub id: i64,
    /// Item ordered.
    pub item: String,
    /// Number of items.
    pub quantity: i32,
}
