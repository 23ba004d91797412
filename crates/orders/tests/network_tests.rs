//! End-to-end tests for the order service over TCP.

use proptest::prelude::*;
use unary_orders::{
    CatalogOrderService, Error, Order, OrderClient, OrderServer, SERVICE_NAME,
    UnknownOrderPolicy,
};
use unary_rpc::{ClientBuilder, CodecKind, Endpoint, RegistryClient, RegistryServer, RpcClient, ServerHandle};

async fn spawn_orders(service: CatalogOrderService) -> (Endpoint, ServerHandle) {
    let mut server = OrderServer::new(Endpoint::localhost(0), service);
    let endpoint = server.bind().await.unwrap();
    let handle = server.handle();
    tokio::spawn(server.serve());
    (endpoint, handle)
}

#[tokio::test]
async fn test_get_order_reference_scenario() {
    let (endpoint, handle) = spawn_orders(CatalogOrderService::new()).await;
    let client = OrderClient::new(endpoint).unwrap();

    let order = client.get_order(1).await.unwrap();
    assert_eq!(
        order,
        Order {
            id: 1,
            item: "itm-1".to_string(),
            quantity: 2,
        }
    );

    handle.shutdown();
}

#[tokio::test]
async fn test_get_orders_is_deterministic() {
    let (endpoint, handle) = spawn_orders(CatalogOrderService::new()).await;
    let client = OrderClient::new(endpoint).unwrap();

    let first = client.get_orders(1).await.unwrap();
    let second = client.get_orders(1).await.unwrap();
    assert_eq!(first, second);

    let expected: Vec<Order> = (0..3)
        .map(|i| Order {
            id: i + 1,
            item: format!("itm-{i}"),
            quantity: i32::try_from(i).unwrap() + 1,
        })
        .collect();
    assert_eq!(first.orders, expected);

    handle.shutdown();
}

#[tokio::test]
async fn test_unknown_order_over_network() {
    let (endpoint, handle) = spawn_orders(CatalogOrderService::new()).await;
    let client = OrderClient::new(endpoint).unwrap();

    assert!(matches!(
        client.get_order(99).await,
        Err(Error::OrderNotFound(99))
    ));
    // The failure did not affect the server.
    assert_eq!(client.get_order(1).await.unwrap().id, 1);

    handle.shutdown();
}

#[tokio::test]
async fn test_placeholder_policy_over_network() {
    let service = CatalogOrderService::new().with_policy(UnknownOrderPolicy::Placeholder);
    let (endpoint, handle) = spawn_orders(service).await;
    let client = OrderClient::new(endpoint).unwrap();

    assert_eq!(
        client.get_order(99).await.unwrap(),
        CatalogOrderService::reference_order()
    );

    handle.shutdown();
}

#[tokio::test]
async fn test_json_client() {
    let (endpoint, handle) = spawn_orders(CatalogOrderService::new()).await;
    let client = OrderClient::from_rpc_client(
        RpcClient::builder()
            .endpoint(endpoint)
            .codec(CodecKind::Json)
            .build()
            .unwrap(),
    );

    assert_eq!(client.get_order(1).await.unwrap().quantity, 2);
    assert_eq!(client.get_orders(1).await.unwrap().orders.len(), 3);

    handle.shutdown();
}

#[tokio::test]
async fn test_lookup_through_registry() {
    let mut registry_server = RegistryServer::new(Endpoint::localhost(0));
    let registry_endpoint = registry_server.bind().await.unwrap();
    let registry_handle = registry_server.handle();
    tokio::spawn(registry_server.serve());

    let (endpoint, handle) = spawn_orders(CatalogOrderService::new()).await;
    let registry = RegistryClient::new(registry_endpoint).unwrap();

    assert!(matches!(
        OrderClient::lookup(&registry, ClientBuilder::new()).await,
        Err(Error::Rpc(unary_rpc::Error::NotFound(_)))
    ));

    registry.bind(SERVICE_NAME, endpoint).await.unwrap();
    let client = OrderClient::lookup(&registry, ClientBuilder::new())
        .await
        .unwrap();
    assert_eq!(client.get_order(1).await.unwrap().item, "itm-1");

    handle.shutdown();
    registry_handle.shutdown();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Every list entry follows the generation rule, whatever the user id.
    #[test]
    fn prop_order_list_ignores_user(user_id in any::<i64>(), count in 0u16..50) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let service = CatalogOrderService::new().with_orders_per_user(count);
        let list = runtime
            .block_on(unary_orders::OrderService::get_orders(
                &service,
                unary_orders::GetOrdersRequest { user_id },
            ))
            .unwrap();

        prop_assert_eq!(list.orders.len(), usize::from(count));
        for (i, order) in list.orders.iter().enumerate() {
            prop_assert_eq!(order.id, i64::try_from(i).unwrap() + 1);
            prop_assert_eq!(&order.item, &format!("itm-{i}"));
            prop_assert_eq!(order.quantity, i32::try_from(i).unwrap() + 1);
        }
    }
}
