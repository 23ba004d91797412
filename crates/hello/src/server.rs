//! Server implementation for the greeting service.

use crate::commands::{HelloRequest, HelloResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};
use unary_rpc::{Endpoint, HandlerError, Router, RpcServer, ServerConfig, ServerHandle};

/// Trait that must be implemented to answer greetings.
#[async_trait]
pub trait HelloService: Send + Sync + 'static {
    /// Handle a greeting request.
    async fn say_hello(&self, request: HelloRequest) -> Result<HelloResponse>;
}

/// Greets with `"Hello {name}"`. Empty names are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greeter;

#[async_trait]
impl HelloService for Greeter {
    async fn say_hello(&self, request: HelloRequest) -> Result<HelloResponse> {
        if request.name.is_empty() {
            return Err(Error::InvalidName("name must not be empty".to_string()));
        }
        Ok(HelloResponse {
            message: format!("Hello {}", request.name),
        })
    }
}

/// Routes for the greeting operation, backed by `service`.
#[must_use]
pub fn router<S: HelloService>(service: S) -> Router {
    let service = Arc::new(service);

    Router::new().route(move |request: HelloRequest| {
        let service = Arc::clone(&service);
        async move {
            debug!("Received SayHello");
            service.say_hello(request).await.map_err(|e| {
                error!("SayHello failed: {}", e);
                HandlerError::from(e)
            })
        }
    })
}

/// Greeting server that listens for requests.
pub struct HelloServer {
    inner: RpcServer<Router>,
}

impl HelloServer {
    /// Create a new greeting server.
    #[must_use]
    pub fn new<S: HelloService>(endpoint: Endpoint, service: S) -> Self {
        Self::with_config(endpoint, service, ServerConfig::default())
    }

    /// Create a new greeting server with custom configuration.
    #[must_use]
    pub fn with_config<S: HelloService>(
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
    pub async fn bind(&mut self) -> Result<Endpoint> {
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
    pub async fn serve(self) -> Result<()> {
        self.inner.serve().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_greeter() {
        let response = Greeter
            .say_hello(HelloRequest {
                name: "1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.message, "Hello 1");
    }

    #[tokio::test]
    async fn test_greeter_rejects_empty_name() {
        let err = Greeter
            .say_hello(HelloRequest {
                name: String::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidName(_)));
    }
}
