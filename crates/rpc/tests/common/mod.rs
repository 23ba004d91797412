//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::task::JoinHandle;
use unary_rpc::{
    Endpoint, HandlerError, Operation, Result, Router, RpcHandler, RpcMessage, RpcServer,
    ServerConfig, ServerHandle,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Echo {
    pub message: String,
}

impl RpcMessage for Echo {
    type Response = String;

    const OPERATION: Operation = "test.echo";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sleep {
    pub millis: u64,
}

impl RpcMessage for Sleep {
    type Response = u64;

    const OPERATION: Operation = "test.sleep";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explode;

impl RpcMessage for Explode {
    type Response = ();

    const OPERATION: Operation = "test.explode";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reject {
    pub reason: String,
}

impl RpcMessage for Reject {
    type Response = ();

    const OPERATION: Operation = "test.reject";
}

/// Never routed anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Missing;

impl RpcMessage for Missing {
    type Response = ();

    const OPERATION: Operation = "test.missing";
}

pub fn test_router() -> Router {
    Router::new()
        .route(|echo: Echo| async move { Ok(echo.message) })
        .route(|sleep: Sleep| async move {
            tokio::time::sleep(Duration::from_millis(sleep.millis)).await;
            Ok(sleep.millis)
        })
        .route(|_: Explode| async move {
            if true {
                panic!("handler exploded");
            }
            Ok(())
        })
        .route(|reject: Reject| async move { Err(HandlerError::InvalidArgument(reject.reason)) })
}

/// Bind `handler` on an ephemeral loopback port and serve it in the background.
pub async fn spawn_server<H: RpcHandler>(
    handler: H,
    config: ServerConfig,
) -> (Endpoint, ServerHandle, JoinHandle<Result<()>>) {
    let mut server = RpcServer::new(Endpoint::localhost(0), handler, config);
    let endpoint = server.bind().await.expect("bind server");
    let handle = server.handle();
    let task = tokio::spawn(server.serve());
    (endpoint, handle, task)
}

/// A loopback endpoint nothing listens on.
pub async fn unused_endpoint() -> Endpoint {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = Endpoint::from(listener.local_addr().unwrap());
    drop(listener);
    endpoint
}
