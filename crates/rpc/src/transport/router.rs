//! Operation router.
//!
//! A [`Router`] is a dispatch table from operation name to a typed handler.
//! Each route decodes the request with the codec the caller chose, runs the
//! handler, and encodes the reply with the same codec.

use crate::error::{HandlerError, HandlerResult};
use crate::protocol::{CodecKind, RpcMessage};
use crate::transport::server::RpcHandler;
use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

type Route = Arc<dyn Fn(Bytes, CodecKind) -> BoxFuture<'static, HandlerResult<Bytes>> + Send + Sync>;

/// Dispatch table mapping operation names to handlers.
#[derive(Clone, Default)]
pub struct Router {
    routes: HashMap<String, Route>,
}

impl Router {
    /// Create an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `M::OPERATION`, replacing any previous route.
    #[must_use]
    pub fn route<M, F, Fut>(mut self, handler: F) -> Self
    where
        M: RpcMessage,
        F: Fn(M) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<M::Response>> + Send + 'static,
    {
        let route: Route = Arc::new(move |payload: Bytes, codec: CodecKind| {
            let request = codec
                .decode::<M>(&payload)
                .map_err(|e| HandlerError::Decode(e.to_string()));

            match request {
                Ok(request) => {
                    let reply = handler(request);
                    async move {
                        let response = reply.await?;
                        codec
                            .encode(&response)
                            .map_err(|e| HandlerError::Internal(e.to_string()))
                    }
                    .boxed()
                }
                Err(e) => future::ready(Err(e)).boxed(),
            }
        });

        if self.routes.insert(M::OPERATION.to_string(), route).is_some() {
            warn!("Route for {} replaced", M::OPERATION);
        }
        self
    }

    /// Add every route of `other`. Routes in `other` win on conflict.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (operation, route) in other.routes {
            if self.routes.insert(operation.clone(), route).is_some() {
                warn!("Route for {} replaced", operation);
            }
        }
        self
    }

    /// Whether a route exists for `operation`.
    #[must_use]
    pub fn contains(&self, operation: &str) -> bool {
        self.routes.contains_key(operation)
    }

    /// Registered operation names, sorted.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        let mut operations: Vec<String> = self.routes.keys().cloned().collect();
        operations.sort();
        operations
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("operations", &self.operations())
            .finish()
    }
}

#[async_trait]
impl RpcHandler for Router {
    async fn handle_message(
        &self,
        operation: &str,
        payload: Bytes,
        codec: CodecKind,
    ) -> HandlerResult<Bytes> {
        let Some(route) = self.routes.get(operation) else {
            debug!("No route for {}", operation);
            return Err(HandlerError::UnknownOperation(operation.to_string()));
        };
        route(payload, codec).await
    }
}
