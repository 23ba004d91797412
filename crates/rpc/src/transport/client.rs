//! RPC client implementation.

use crate::endpoint::Endpoint;
use crate::error::{Error, ProtocolError, Result};
use crate::protocol::{
    CodecKind, Frame, FrameType, MAX_FRAME_SIZE, RequestEnvelope, ResponseBody, ResponseEnvelope,
    RpcMessage,
};
use crate::transport::channel::Channel;
use std::io;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Configuration for the RPC client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Payload codec for requests and replies.
    pub codec: CodecKind,
    /// Limit for establishing a connection.
    pub connect_timeout: Duration,
    /// Limit for a whole call. `None` waits as long as the server takes.
    pub request_timeout: Option<Duration>,
    /// Keep the connection open between calls.
    pub reuse_connection: bool,
    /// Maximum frame size.
    pub max_frame_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            codec: CodecKind::default(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: None,
            reuse_connection: false,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

/// Builder for creating RPC clients.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    endpoint: Option<Endpoint>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Create a new client builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint to call.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the payload codec.
    #[must_use]
    pub const fn codec(mut self, codec: CodecKind) -> Self {
        self.config.codec = codec;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Keep one connection open and reuse it for later calls.
    #[must_use]
    pub const fn reuse_connection(mut self, reuse: bool) -> Self {
        self.config.reuse_connection = reuse;
        self
    }

    /// Set the maximum frame size.
    #[must_use]
    pub const fn max_frame_size(mut self, size: usize) -> Self {
        self.config.max_frame_size = size;
        self
    }

    /// Build the RPC client. No connection is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint was set.
    pub fn build(self) -> Result<RpcClient> {
        let endpoint = self.endpoint.ok_or_else(|| {
            Error::from(io::Error::new(
                io::ErrorKind::InvalidInput,
                "endpoint not specified",
            ))
        })?;

        Ok(RpcClient {
            endpoint,
            config: self.config,
            connection: Mutex::new(None),
        })
    }
}

/// RPC client for making unary calls against one endpoint.
///
/// Calls made through the same client run one at a time. Without
/// `reuse_connection` every call opens its own connection and closes it
/// after the reply. With it, the connection is kept after a successful call
/// and dropped after any failure, so the next call starts fresh. Failed calls
/// are never retried.
#[derive(Debug)]
pub struct RpcClient {
    endpoint: Endpoint,
    config: ClientConfig,
    connection: Mutex<Option<Channel>>,
}

impl RpcClient {
    /// Create a new client builder.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Endpoint this client calls.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the server cannot be reached,
    /// [`Error::ChannelClosed`] if it hangs up mid-call, a codec error if
    /// either side's bytes do not decode, [`Error::Remote`] if the server
    /// reports a failure, and [`Error::Timeout`] if the configured request
    /// timeout elapses.
    #[instrument(skip_all, fields(operation = M::OPERATION, endpoint = %self.endpoint))]
    pub async fn call<M: RpcMessage>(&self, message: M) -> Result<M::Response> {
        let codec = self.config.codec;
        let envelope = RequestEnvelope::for_message(&message, codec)?;
        let request_id = envelope.id;
        let frame = Frame::new(FrameType::Request, envelope.to_bytes()?);

        debug!("Sending request {}", request_id);

        let response = match self.config.request_timeout {
            Some(limit) => timeout(limit, self.exchange(frame))
                .await
                .map_err(|_| Error::Timeout(limit))??,
            None => self.exchange(frame).await?,
        };

        if response.request_id != request_id {
            // A nil id marks a request the server could not read far enough
            // to learn its id.
            return match response.body {
                ResponseBody::Error(info) if response.request_id.is_nil() => {
                    debug!("Request {} rejected unread: {}", request_id, info);
                    Err(Error::Remote(info))
                }
                _ => Err(ProtocolError::CorrelationMismatch {
                    expected: request_id,
                    actual: response.request_id,
                }
                .into()),
            };
        }

        match response.body {
            ResponseBody::Ok(payload) => {
                debug!("Response for request {}: {} bytes", request_id, payload.len());
                codec.decode(&payload)
            }
            ResponseBody::Error(info) => {
                debug!("Request {} failed remotely: {}", request_id, info);
                Err(Error::Remote(info))
            }
        }
    }

    /// Send one request frame and read its reply on a fresh or cached channel.
    ///
    /// The cached channel is taken out of its slot for the duration of the
    /// exchange. If the exchange fails or is cancelled by a timeout the
    /// channel is dropped instead of being put back.
    async fn exchange(&self, frame: Frame) -> Result<ResponseEnvelope> {
        let mut slot = self.connection.lock().await;

        let cached = slot.take().filter(|channel| !channel.is_closed());
        let cached = cached.and_then(|mut channel| {
            if channel.peer_hung_up() {
                debug!("Cached connection to {} went stale", self.endpoint);
                None
            } else {
                Some(channel)
            }
        });

        let mut channel = match cached {
            Some(channel) => channel,
            None => {
                Channel::connect_with(
                    &self.endpoint,
                    Some(self.config.connect_timeout),
                    self.config.max_frame_size,
                )
                .await?
            }
        };

        channel.send(frame).await?;
        let reply = channel.receive().await?;

        if reply.frame_type != FrameType::Response {
            return Err(ProtocolError::UnexpectedFrame {
                expected: format!("{:?}", FrameType::Response),
                actual: format!("{:?}", reply.frame_type),
            }
            .into());
        }

        let envelope = ResponseEnvelope::from_bytes(&reply.payload)?;

        if self.config.reuse_connection {
            *slot = Some(channel);
        } else if let Err(e) = channel.close().await {
            warn!("Failed to close connection to {}: {}", self.endpoint, e);
        }

        Ok(envelope)
    }

    /// Close the cached connection, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame cannot be written.
    pub async fn close(&self) -> Result<()> {
        if let Some(mut channel) = self.connection.lock().await.take() {
            debug!("Closing connection to {}", self.endpoint);
            channel.close().await?;
        }
        Ok(())
    }
}
