use super::Order;
use serde::{Deserialize, Serialize};
use unary_rpc::{Operation, RpcMessage};

/// Fetch the orders of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetOrdersRequest {
    /// Id of the user whose orders to fetch.
    pub user_id: i64,
}

/// Orders of one user, in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderList {
    /// The orders.
    pub orders: Vec<Order>,
}

impl RpcMessage for GetOrdersRequest {
    type Response = OrderList;

    const OPERATION: Operation = "OrderService.GetOrders";
}
