use super::Order;
use serde::{Deserialize, Serialize};
use unary_rpc::{Operation, RpcMessage};

/// Fetch one order by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetOrderRequest {
    /// Id of the order to fetch.
    pub order_id: i64,
}

impl RpcMessage for GetOrderRequest {
    type Response = Order;

    const OPERATION: Operation = "OrderService.GetOrder";
}
