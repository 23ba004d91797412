//! End-to-end tests for the greeting service.

use unary_hello::{Error, Greeter, HelloClient, HelloServer, HelloService, SERVICE_NAME};
use unary_rpc::{ClientBuilder, Endpoint, ErrorKind, Registry, RegistryClient, RpcServer, ServerConfig};

async fn spawn_hello<S: HelloService>(service: S) -> (Endpoint, unary_rpc::ServerHandle) {
    let mut server = HelloServer::new(Endpoint::localhost(0), service);
    let endpoint = server.bind().await.unwrap();
    let handle = server.handle();
    tokio::spawn(server.serve());
    (endpoint, handle)
}

#[tokio::test]
async fn test_say_hello() {
    let (endpoint, handle) = spawn_hello(Greeter).await;
    let client = HelloClient::new(endpoint).unwrap();

    assert_eq!(client.say_hello("1").await.unwrap(), "Hello 1");
    assert_eq!(client.say_hello("world").await.unwrap(), "Hello world");

    handle.shutdown();
}

#[tokio::test]
async fn test_empty_name_is_invalid_argument() {
    let (endpoint, handle) = spawn_hello(Greeter).await;
    let client = HelloClient::new(endpoint).unwrap();

    match client.say_hello("").await {
        Err(Error::Rpc(e)) => assert_eq!(e.remote_kind(), Some(ErrorKind::InvalidArgument)),
        other => panic!("unexpected result: {other:?}"),
    }

    handle.shutdown();
}

#[tokio::test]
async fn test_lookup_in_embedded_registry() {
    // The service process hosts the registry too, on the same port.
    let directory = Registry::new();
    let router = unary_hello::router(Greeter).merge(unary_rpc::registry::router(&directory));
    let mut server = RpcServer::new(Endpoint::localhost(0), router, ServerConfig::default());
    let endpoint = server.bind().await.unwrap();
    let handle = server.handle();
    tokio::spawn(server.serve());

    directory.bind(SERVICE_NAME, endpoint.clone());

    let registry = RegistryClient::new(endpoint).unwrap();
    let client = HelloClient::lookup(&registry, ClientBuilder::new())
        .await
        .unwrap();
    assert_eq!(client.say_hello("1").await.unwrap(), "Hello 1");

    handle.shutdown();
}
