//! Framed TCP channel.

use crate::endpoint::Endpoint;
use crate::error::{ConnectionError, Error, Result};
use crate::protocol::{Frame, FrameCodec, FrameType, MAX_FRAME_SIZE};
use futures::{FutureExt, SinkExt, StreamExt};
use std::io;
use std::time::Duration;
use tokio::io::{self as tokio_io, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// A connection exchanging whole frames with one peer.
///
/// `receive` waits until a complete frame has arrived. It fails with
/// [`Error::ChannelClosed`] when the peer closes the connection, when a
/// close frame arrives, or when the channel is closed locally, including
/// through a [`ChannelCloser`] held by another task.
#[derive(Debug)]
pub struct Channel {
    peer: Endpoint,
    framed: Framed<TcpStream, FrameCodec>,
    closed: CancellationToken,
}

/// Closes a [`Channel`] from outside the task that owns it.
#[derive(Clone, Debug)]
pub struct ChannelCloser {
    closed: CancellationToken,
}

impl ChannelCloser {
    /// Close the channel. Any pending `receive` returns [`Error::ChannelClosed`].
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether the channel has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

impl Channel {
    /// Connect to `endpoint` with default limits and no connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::ConnectFailed`] if the endpoint is
    /// unreachable or refuses the connection.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self> {
        Self::connect_with(endpoint, None, MAX_FRAME_SIZE).await
    }

    /// Connect to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the endpoint cannot be reached or
    /// `connect_timeout` elapses first.
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    pub async fn connect_with(
        endpoint: &Endpoint,
        connect_timeout: Option<Duration>,
        max_frame_size: usize,
    ) -> Result<Self> {
        let connect = TcpStream::connect((endpoint.host(), endpoint.port()));

        let connected = match connect_timeout {
            Some(limit) => timeout(limit, connect).await.map_err(|_| {
                ConnectionError::ConnectTimeout {
                    endpoint: endpoint.clone(),
                    timeout: limit,
                }
            })?,
            None => connect.await,
        };

        let stream = connected.map_err(|source| ConnectionError::ConnectFailed {
            endpoint: endpoint.clone(),
            source,
        })?;
        stream.set_nodelay(true).map_err(ConnectionError::Dropped)?;

        debug!("Connected to {}", endpoint);

        Ok(Self::from_stream(stream, endpoint.clone(), max_frame_size))
    }

    /// Wrap an accepted stream.
    #[must_use]
    pub fn from_stream(stream: TcpStream, peer: Endpoint, max_frame_size: usize) -> Self {
        Self {
            peer,
            framed: Framed::new(stream, FrameCodec::new().with_max_frame_size(max_frame_size)),
            closed: CancellationToken::new(),
        }
    }

    /// The endpoint on the other side.
    #[must_use]
    pub const fn peer(&self) -> &Endpoint {
        &self.peer
    }

    /// Handle that can close this channel from another task.
    #[must_use]
    pub fn closer(&self) -> ChannelCloser {
        ChannelCloser {
            closed: self.closed.clone(),
        }
    }

    /// Whether the channel has been closed by either side.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Send one frame and flush it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is closed, or an
    /// error if the frame is too large or the write fails.
    pub async fn send(&mut self, frame: Frame) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }

        let result = self.framed.send(frame).await.map_err(classify);
        if matches!(result, Err(Error::ChannelClosed)) {
            self.closed.cancel();
        }
        result
    }

    /// Wait for the next complete frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelClosed`] if the channel is or becomes closed
    /// before a full frame arrives, or a protocol error for malformed input.
    pub async fn receive(&mut self) -> Result<Frame> {
        if self.is_closed() {
            return Err(Error::ChannelClosed);
        }

        tokio::select! {
            biased;

            () = self.closed.cancelled() => Err(Error::ChannelClosed),
            next = self.framed.next() => match next {
                Some(Ok(frame)) if frame.frame_type == FrameType::Close => {
                    debug!("Peer {} sent close", self.peer);
                    self.closed.cancel();
                    Err(Error::ChannelClosed)
                }
                Some(Ok(frame)) => Ok(frame),
                Some(Err(e)) => {
                    let err = classify(e);
                    if matches!(err, Error::ChannelClosed) {
                        self.closed.cancel();
                    }
                    Err(err)
                }
                None => {
                    self.closed.cancel();
                    Err(Error::ChannelClosed)
                }
            },
        }
    }

    /// Check, without waiting, whether the peer has already hung up.
    ///
    /// A channel with nothing to read is live. A pending close frame, an end
    /// of stream, or any unsolicited frame marks the channel closed.
    pub fn peer_hung_up(&mut self) -> bool {
        if self.is_closed() {
            return true;
        }

        match self.framed.next().now_or_never() {
            None => false,
            Some(next) => {
                match next {
                    Some(Ok(frame)) if frame.frame_type == FrameType::Close => {
                        debug!("Peer {} sent close", self.peer);
                    }
                    Some(Ok(frame)) => {
                        debug!("Unsolicited {:?} frame from {}", frame.frame_type, self.peer);
                    }
                    Some(Err(e)) => debug!("Connection to {} failed: {}", self.peer, e),
                    None => debug!("Peer {} disconnected", self.peer),
                }
                self.closed.cancel();
                true
            }
        }
    }

    /// Close the channel, then read and drop whatever the peer still sends
    /// until it hangs up or `limit` elapses.
    ///
    /// Unread input at close time makes the socket reset the connection,
    /// which can discard a reply that was already written.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Channel::close`].
    pub async fn close_and_discard(&mut self, limit: Duration) -> Result<()> {
        let closed = self.close().await;

        let stream = self.framed.get_mut();
        match timeout(limit, tokio_io::copy(stream, &mut tokio_io::sink())).await {
            Ok(Ok(discarded)) => debug!("Discarded {} bytes from {}", discarded, self.peer),
            Ok(Err(e)) => debug!("Discard from {} ended: {}", self.peer, e),
            Err(_) => debug!("Peer {} still sending after {:?}", self.peer, limit),
        }

        closed
    }

    /// Close the channel, telling the peer if it is still there.
    ///
    /// # Errors
    ///
    /// Returns an error if the close frame could not be written for a reason
    /// other than the peer being gone already.
    pub async fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.closed.cancel();

        let sent = self.framed.send(Frame::close()).await.map_err(classify);
        let _ = self.framed.get_mut().shutdown().await;

        match sent {
            Ok(()) | Err(Error::ChannelClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn classify(err: Error) -> Error {
    match err {
        Error::Io(e) if is_disconnect(&e) => Error::ChannelClosed,
        Error::Io(e) => ConnectionError::Dropped(e).into(),
        other => other,
    }
}

fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}
