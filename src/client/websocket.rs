//! Streaming execution over WebSocket channels.
//!
//! Mirrors the HTTP pipeline: the request is materialized and pre-validated,
//! then handed to the snapshot's [`WebSocketClient`]. There is no status to
//! validate; instead every inbound message goes through the serializer, and a
//! message the serializer rejects is offered to the error decoder first.

use super::http::decode_error_or;
use super::NetworkClient;
use crate::codec::Serializer;
use crate::config::{ConfigKey, Configs, WebSocketConfig};
use crate::error::Result;
use crate::socket::{TungsteniteSocket, WebSocketChannel};
use crate::types::{Bytes, HttpRequest};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Opens streaming channels.
pub trait WebSocketClient: Send + Sync + 'static {
    /// Create a channel for `request`. Connection happens lazily.
    fn connect(&self, request: &HttpRequest, configs: &Configs) -> Result<WebSocketChannel<Bytes>>;
}

/// Setting: the active WebSocket transport.
pub struct WebSocketClientKey;

impl ConfigKey for WebSocketClientKey {
    type Value = Arc<dyn WebSocketClient>;
}

impl Configs {
    /// Active WebSocket transport, [`TungsteniteClient::default`] when unset.
    pub fn web_socket_client(&self) -> Arc<dyn WebSocketClient> {
        self.get::<WebSocketClientKey>()
            .unwrap_or_else(|| Arc::new(TungsteniteClient::default()))
    }
}

/// Default transport creating a [`TungsteniteSocket`] per channel.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteClient {
    config: WebSocketConfig,
}

impl TungsteniteClient {
    /// Transport with custom ping and buffering.
    pub fn with_config(config: WebSocketConfig) -> Self {
        TungsteniteClient { config }
    }
}

impl WebSocketClient for TungsteniteClient {
    fn connect(&self, request: &HttpRequest, configs: &Configs) -> Result<WebSocketChannel<Bytes>> {
        let socket = Arc::new(TungsteniteSocket::new(request.clone()));
        Ok(WebSocketChannel::with_logger(
            socket,
            self.config.clone(),
            configs.logger(),
        ))
    }
}

/// In-memory transport building channels from a closure.
pub struct FnWebSocketClient<F> {
    connect: F,
}

impl<F> FnWebSocketClient<F>
where
    F: Fn(&HttpRequest, &Configs) -> Result<WebSocketChannel<Bytes>> + Send + Sync + 'static,
{
    /// Transport calling `connect` for every channel.
    pub fn new(connect: F) -> Self {
        FnWebSocketClient { connect }
    }
}

impl<F> WebSocketClient for FnWebSocketClient<F>
where
    F: Fn(&HttpRequest, &Configs) -> Result<WebSocketChannel<Bytes>> + Send + Sync + 'static,
{
    fn connect(&self, request: &HttpRequest, configs: &Configs) -> Result<WebSocketChannel<Bytes>> {
        (self.connect)(request, configs)
    }
}

type BodyMapFn = dyn Fn(Bytes, &Configs) -> Result<Bytes> + Send + Sync;

/// Rewrites every inbound message of the wrapped transport's channels.
pub(crate) struct MapWebSocketClient {
    base: Arc<dyn WebSocketClient>,
    map: Arc<BodyMapFn>,
}

impl MapWebSocketClient {
    pub(crate) fn new(base: Arc<dyn WebSocketClient>, map: Arc<BodyMapFn>) -> Self {
        MapWebSocketClient { base, map }
    }
}

impl WebSocketClient for MapWebSocketClient {
    fn connect(&self, request: &HttpRequest, configs: &Configs) -> Result<WebSocketChannel<Bytes>> {
        let channel = self.base.connect(request, configs)?;
        let map = self.map.clone();
        let configs = configs.clone();
        Ok(channel.try_map(move |data| map(data, &configs)))
    }
}

impl NetworkClient {
    /// Replace the WebSocket transport.
    #[must_use]
    pub fn web_socket_client(&self, client: impl WebSocketClient) -> Self {
        self.config::<WebSocketClientKey>(Arc::new(client))
    }

    /// Open a channel whose messages are serialized with `serializer`.
    ///
    /// # Errors
    ///
    /// Materialization and pre-validation errors, as for [`NetworkClient::http`].
    /// Connection and per-message errors are delivered through the channel.
    pub fn web_socket<T: 'static>(&self, serializer: Serializer<T>) -> Result<WebSocketChannel<T>> {
        let (request, configs, logger) = self.prepare()?;
        logger.debug(format_args!("{} opening channel", request));

        let channel = configs
            .web_socket_client()
            .connect(&request, &configs)
            .map_err(|err| {
                logger.error(format_args!("{} channel failed: {}", request, err));
                err
            })?;

        Ok(channel.try_map(move |data| {
            serializer.serialize(data.clone(), &configs).map_err(|err| {
                let err = decode_error_or(&data, &configs, err.into_decoding_failure());
                logger.error(format_args!("Message decoding failed: {}", err));
                err
            })
        }))
    }

    /// Channel of raw messages.
    pub fn stream(&self) -> Result<WebSocketChannel<Bytes>> {
        self.web_socket(Serializer::data())
    }

    /// Channel of untyped JSON messages.
    pub fn json_stream(&self) -> Result<WebSocketChannel<Value>> {
        self.web_socket(Serializer::json())
    }

    /// Channel of messages decoded into `T`.
    pub fn decodable_stream<T: DeserializeOwned + 'static>(&self) -> Result<WebSocketChannel<T>> {
        self.web_socket(Serializer::decodable())
    }
}
