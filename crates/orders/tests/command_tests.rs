//! Tests for order command handling.

use async_trait::async_trait;
use unary_rpc::{CodecKind, HandlerError, RpcHandler};
use unary_orders::{
    CatalogOrderService, GetOrderRequest, GetOrdersRequest, Order, OrderList, OrderService,
    Result, router,
};

/// Mock service for testing.
struct MockService {
    should_fail: bool,
}

#[async_trait]
impl OrderService for MockService {
    async fn get_order(&self, request: GetOrderRequest) -> Result<Order> {
        if self.should_fail {
            Err(anyhow::anyhow!("Mock catalog unavailable").into())
        } else {
            Ok(Order {
                id: request.order_id,
                item: "mock".to_string(),
                quantity: 1,
            })
        }
    }

    async fn get_orders(&self, _request: GetOrdersRequest) -> Result<OrderList> {
        if self.should_fail {
            Err(anyhow::anyhow!("Mock catalog unavailable").into())
        } else {
            Ok(OrderList::default())
        }
    }
}

#[tokio::test]
async fn test_successful_get_order() {
    let handler = router(MockService { should_fail: false });

    let message = CodecKind::Cbor.encode(&GetOrderRequest { order_id: 5 }).unwrap();
    let response = handler
        .handle_message("OrderService.GetOrder", message, CodecKind::Cbor)
        .await
        .unwrap();

    let order: Order = CodecKind::Cbor.decode(&response).unwrap();
    assert_eq!(order.id, 5);
    assert_eq!(order.item, "mock");
}

#[tokio::test]
async fn test_failed_get_order() {
    let handler = router(MockService { should_fail: true });

    let message = CodecKind::Cbor.encode(&GetOrderRequest { order_id: 5 }).unwrap();
    let err = handler
        .handle_message("OrderService.GetOrder", message, CodecKind::Cbor)
        .await
        .unwrap_err();

    match err {
        HandlerError::Internal(message) => assert!(message.contains("Mock catalog unavailable")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let handler = router(CatalogOrderService::new());

    let message = CodecKind::Json.encode(&GetOrderRequest { order_id: 404 }).unwrap();
    let err = handler
        .handle_message("OrderService.GetOrder", message, CodecKind::Json)
        .await
        .unwrap_err();

    assert!(matches!(err, HandlerError::NotFound(_)));
}

#[tokio::test]
async fn test_get_orders_json() {
    let handler = router(CatalogOrderService::new());

    let message = CodecKind::Json.encode(&GetOrdersRequest { user_id: 1 }).unwrap();
    let response = handler
        .handle_message("OrderService.GetOrders", message, CodecKind::Json)
        .await
        .unwrap();

    let list: OrderList = CodecKind::Json.decode(&response).unwrap();
    assert_eq!(list.orders.len(), 3);
    assert_eq!(list.orders[0].item, "itm-0");
}

#[tokio::test]
async fn test_wrong_shape_is_decode_error() {
    let handler = router(CatalogOrderService::new());

    // A GetOrders payload sent to GetOrder.
    let message = CodecKind::Json.encode(&GetOrdersRequest { user_id: 1 }).unwrap();
    let err = handler
        .handle_message("OrderService.GetOrder", message, CodecKind::Json)
        .await
        .unwrap_err();

    assert!(matches!(err, HandlerError::Decode(_)));
}

#[tokio::test]
async fn test_unknown_operation() {
    let handler = router(MockService { should_fail: false });

    let message = CodecKind::Cbor.encode(&GetOrderRequest { order_id: 1 }).unwrap();
    let err = handler
        .handle_message("OrderService.CancelOrder", message, CodecKind::Cbor)
        .await
        .unwrap_err();

    assert!(matches!(err, HandlerError::UnknownOperation(_)));
}
