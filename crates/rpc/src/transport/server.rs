//! RPC server implementation.

use crate::endpoint::Endpoint;
use crate::error::{Error, HandlerError, HandlerResult, Result};
use crate::protocol::{
    CodecKind, ErrorInfo, Frame, FrameType, MAX_FRAME_SIZE, RequestEnvelope, ResponseEnvelope,
};
use crate::transport::channel::Channel;
use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use parking_lot::RwLock;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// How long a connection rejected for a bad frame keeps draining input.
const DISCARD_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for the RPC server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// How long a connection may sit without sending a request.
    pub idle_timeout: Duration,
    /// Maximum frame size.
    pub max_frame_size: usize,
    /// How long shutdown waits for in-flight requests.
    pub drain_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            idle_timeout: Duration::from_secs(60),
            max_frame_size: MAX_FRAME_SIZE,
            drain_timeout: Duration::from_secs(30),
        }
    }
}

/// Lifecycle of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Constructed, not yet bound.
    Created,
    /// Bound and accepting connections.
    Listening,
    /// No longer accepting; waiting for in-flight requests.
    Draining,
    /// All work finished.
    Stopped,
}

/// Trait for handling RPC requests.
///
/// Implementations must be safe to call from many connections at once.
#[async_trait]
pub trait RpcHandler: Send + Sync + 'static {
    /// Handle one request and produce the encoded reply payload.
    async fn handle_message(
        &self,
        operation: &str,
        payload: Bytes,
        codec: CodecKind,
    ) -> HandlerResult<Bytes>;

    /// Called when a new connection is established. Returning an error
    /// rejects the connection.
    async fn on_connect(&self, _peer: &Endpoint) -> HandlerResult<()> {
        Ok(())
    }

    /// Called when a connection is closed.
    async fn on_disconnect(&self, _peer: &Endpoint) {
        // Default: do nothing
    }
}

/// Controls a running server from another task.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: CancellationToken,
    state: Arc<RwLock<ServerState>>,
}

impl ServerHandle {
    /// Stop accepting connections and drain in-flight requests.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServerState {
        *self.state.read()
    }
}

/// RPC server that listens for incoming connections.
pub struct RpcServer<H: RpcHandler> {
    endpoint: Endpoint,
    handler: Arc<H>,
    config: ServerConfig,
    listener: Option<TcpListener>,
    shutdown: CancellationToken,
    state: Arc<RwLock<ServerState>>,
}

impl<H: RpcHandler> RpcServer<H> {
    /// Create a new RPC server. Nothing is bound until [`bind`](Self::bind)
    /// or [`serve`](Self::serve).
    pub fn new(endpoint: Endpoint, handler: H, config: ServerConfig) -> Self {
        Self {
            endpoint,
            handler: Arc::new(handler),
            config,
            listener: None,
            shutdown: CancellationToken::new(),
            state: Arc::new(RwLock::new(ServerState::Created)),
        }
    }

    /// Bind the listener and return the address actually bound, which
    /// differs from the configured one when port 0 was requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(&mut self) -> Result<Endpoint> {
        if self.listener.is_none() {
            self.listener = Some(self.open_listener().await?);
        }
        Ok(self.endpoint.clone())
    }

    async fn open_listener(&mut self) -> Result<TcpListener> {
        let listener = TcpListener::bind((self.endpoint.host(), self.endpoint.port()))
            .await
            .map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("Failed to bind to {}: {}", self.endpoint, e),
                )
            })?;
        self.endpoint = Endpoint::from(listener.local_addr()?);
        *self.state.write() = ServerState::Listening;
        Ok(listener)
    }

    /// The configured endpoint, or the bound one after [`bind`](Self::bind).
    #[must_use]
    pub const fn local_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Handle for shutting the server down.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
            state: Arc::clone(&self.state),
        }
    }

    /// Start serving requests until shutdown is requested, then drain.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn serve(mut self) -> Result<()> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => self.open_listener().await?,
        };

        info!("RPC server listening on {}", self.endpoint);

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                biased;

                () = self.shutdown.cancelled() => {
                    info!("Server shutdown requested");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let Ok(permit) = Arc::clone(&semaphore).try_acquire_owned() else {
                                warn!("Max connections reached, rejecting connection from {}", addr);
                                continue;
                            };

                            let handler = Arc::clone(&self.handler);
                            let config = self.config.clone();
                            let shutdown = self.shutdown.clone();
                            tracker.spawn(async move {
                                Self::handle_connection(stream, Endpoint::from(addr), handler, config, shutdown).await;
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        drop(listener);
        *self.state.write() = ServerState::Draining;

        tracker.close();
        if timeout(self.config.drain_timeout, tracker.wait()).await.is_err() {
            warn!(
                "Drain timed out after {:?}, abandoning {} connections",
                self.config.drain_timeout,
                tracker.len()
            );
        }

        *self.state.write() = ServerState::Stopped;
        info!("RPC server stopped");

        Ok(())
    }

    /// Serve one connection until the peer leaves, idles out, or the
    /// server shuts down. Requests on a connection are answered in order.
    #[instrument(skip(stream, handler, config, shutdown))]
    async fn handle_connection(
        stream: TcpStream,
        peer: Endpoint,
        handler: Arc<H>,
        config: ServerConfig,
        shutdown: CancellationToken,
    ) {
        debug!("New connection from {}", peer);

        if let Err(e) = handler.on_connect(&peer).await {
            warn!("Connection from {} rejected: {}", peer, e);
            return;
        }

        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }
        let mut channel = Channel::from_stream(stream, peer.clone(), config.max_frame_size);

        loop {
            let received = tokio::select! {
                biased;

                () = shutdown.cancelled() => None,
                received = timeout(config.idle_timeout, channel.receive()) => Some(received),
            };

            // Once shutdown starts, only requests that have already arrived
            // are still answered.
            let received = match received {
                Some(received) => received,
                None => match channel.receive().now_or_never() {
                    Some(received) => Ok(received),
                    None => break,
                },
            };

            let frame = match received {
                Ok(Ok(frame)) => frame,
                Ok(Err(Error::ChannelClosed)) => {
                    debug!("Connection closed by client");
                    break;
                }
                Ok(Err(Error::Protocol(e))) => {
                    warn!("Frame error from {}: {}", peer, e);
                    let info = HandlerError::Decode(e.to_string()).into();
                    Self::reply(&mut channel, ResponseEnvelope::error(Uuid::nil(), info)).await;
                    if let Err(e) = channel.close_and_discard(DISCARD_TIMEOUT).await {
                        debug!("Failed to close connection to {}: {}", peer, e);
                    }
                    break;
                }
                Ok(Err(e)) => {
                    warn!("Connection error from {}: {}", peer, e);
                    break;
                }
                Err(_) => {
                    debug!("Connection from {} idle, closing", peer);
                    break;
                }
            };

            if frame.frame_type != FrameType::Request {
                warn!("Unexpected frame type: {:?}", frame.frame_type);
                break;
            }

            let response = Self::dispatch(&handler, &frame.payload).await;
            let response = Self::fit_to_frame(response, config.max_frame_size);
            if !Self::reply(&mut channel, response).await {
                break;
            }
        }

        handler.on_disconnect(&peer).await;

        if let Err(e) = channel.close().await {
            debug!("Failed to close connection to {}: {}", peer, e);
        }
    }

    /// Decode one request envelope and run it through the handler.
    ///
    /// Never fails: every outcome, including a panicking handler, becomes a
    /// response envelope.
    async fn dispatch(handler: &Arc<H>, payload: &[u8]) -> ResponseEnvelope {
        let envelope = match RequestEnvelope::from_bytes(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Failed to decode request envelope: {}", e);
                return ResponseEnvelope::error(
                    Uuid::nil(),
                    HandlerError::Decode(e.to_string()).into(),
                );
            }
        };

        debug!(
            "Dispatching {} ({}) with {} bytes",
            envelope.operation,
            envelope.id,
            envelope.payload.len()
        );

        let call = handler.handle_message(
            &envelope.operation,
            Bytes::from(envelope.payload),
            envelope.codec,
        );

        let outcome = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Handler for {} panicked: {}", envelope.operation, message);
                Err(HandlerError::Panicked(message))
            }
        };

        match outcome {
            Ok(reply) => {
                debug!("Handler returned response with {} bytes", reply.len());
                ResponseEnvelope::ok(envelope.id, reply.to_vec())
            }
            Err(e) => {
                debug!("Handler for {} failed: {}", envelope.operation, e);
                ResponseEnvelope::error(envelope.id, ErrorInfo::from(e))
            }
        }
    }

    /// Replace a response that would not fit in one frame with an error.
    fn fit_to_frame(response: ResponseEnvelope, max_frame_size: usize) -> ResponseEnvelope {
        match response.to_bytes() {
            Ok(bytes) if bytes.len() <= max_frame_size => response,
            Ok(bytes) => ResponseEnvelope::error(
                response.request_id,
                HandlerError::Internal(format!(
                    "response of {} bytes exceeds maximum frame size {}",
                    bytes.len(),
                    max_frame_size
                ))
                .into(),
            ),
            Err(e) => ResponseEnvelope::error(
                response.request_id,
                HandlerError::Internal(e.to_string()).into(),
            ),
        }
    }

    /// Send a response. Returns whether the connection is still usable.
    async fn reply(channel: &mut Channel, response: ResponseEnvelope) -> bool {
        let bytes = match response.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to encode response: {}", e);
                return false;
            }
        };

        match channel.send(Frame::new(FrameType::Response, bytes)).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Failed to send response to {}: {}", channel.peer(), e);
                false
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
