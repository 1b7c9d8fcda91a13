//! Bidirectional streaming over a WebSocket-style connection.
//!
//! A [`Socket`] is the raw connection: it connects on demand, yields a stream
//! of [`SocketEvent`]s and writes [`Frame`]s. A [`WebSocketChannel`] sits on top
//! and shares one socket among any number of consumers.
//!
//! # Channel Lifecycle
//!
//! ```text
//! Idle ──first subscribe / send──▶ Connecting ──Connected event──▶ Connected
//!   │                                  │                               │
//!   └──────────────── close / error / last consumer gone ─────────────┴──▶ Closed
//! ```
//!
//! - The connection opens lazily, on the first subscription (or send).
//! - A keepalive ping runs while the channel is open for subscribers.
//! - Every inbound message is fanned out to all attached consumers; a
//!   consumer whose buffer is full is dropped.
//! - The last consumer detaching, a socket error or a close event tears the
//!   connection down and finishes every remaining consumer.
//! - `Closed` is terminal: sends fail with [`NotConnected`](crate::NetError::NotConnected)
//!   and new subscriptions end immediately.

mod channel;
mod tungstenite_socket;

pub use channel::{ChannelState, ChannelStream, WebSocketChannel};
pub use tungstenite_socket::TungsteniteSocket;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Events reported by a connected socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    /// Handshake completed.
    Connected,
    /// Connection ended normally.
    Disconnected,
    /// Text message.
    Text(String),
    /// Binary message.
    Binary(Bytes),
    /// Ping from the peer.
    Ping,
    /// Pong from the peer.
    Pong,
    /// Transport failure.
    Error(String),
    /// The network path became viable or not.
    ViabilityChanged(bool),
    /// Connection cancelled locally.
    Cancelled,
    /// The peer sent a close frame.
    PeerClosed,
}

impl SocketEvent {
    /// Whether this event ends the connection.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SocketEvent::Disconnected
                | SocketEvent::Error(_)
                | SocketEvent::Cancelled
                | SocketEvent::PeerClosed
        )
    }
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text frame.
    Text(String),
    /// Binary frame.
    Binary(Bytes),
    /// Keepalive ping.
    Ping(Bytes),
}

/// A raw bidirectional connection.
#[async_trait]
pub trait Socket: Send + Sync + 'static {
    /// Open the connection and return its event stream.
    ///
    /// The stream should start with [`SocketEvent::Connected`] and end after a
    /// terminal event.
    async fn connect(&self) -> Result<BoxStream<'static, SocketEvent>>;

    /// Write one frame.
    async fn send(&self, frame: Frame) -> Result<()>;

    /// Close the connection. Idempotent.
    async fn disconnect(&self);
}
