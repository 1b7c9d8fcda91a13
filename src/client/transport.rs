//! HTTP transports and response-shaping decorators.
//!
//! The active transport lives in the snapshot under [`HttpClientKey`].
//! Decorators wrap the transport that was active when their configuration step
//! replayed, so the last modifier in the chain is the outermost layer:
//!
//! ```text
//! .retry(2).map_response(f)   ==>   MapResponse( Retry( Reqwest ) )
//! ```

use super::websocket::{MapWebSocketClient, WebSocketClientKey};
use super::NetworkClient;
use crate::config::{ConfigKey, Configs, TransportConfig};
use crate::error::{NetError, Result};
use crate::types::{Bytes, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Performs one HTTP exchange.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send `request` and return the response, whatever its status.
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse>;
}

/// Setting: the active HTTP transport.
pub struct HttpClientKey;

impl ConfigKey for HttpClientKey {
    type Value = Arc<dyn HttpClient>;
}

impl Configs {
    /// Active transport, a process-wide [`ReqwestClient`] when unset.
    pub fn http_client(&self) -> Arc<dyn HttpClient> {
        self.get::<HttpClientKey>().unwrap_or_else(default_http_client)
    }
}

fn default_http_client() -> Arc<dyn HttpClient> {
    static DEFAULT: OnceLock<Arc<dyn HttpClient>> = OnceLock::new();
    DEFAULT
        .get_or_init(|| Arc::new(ReqwestClient::new()))
        .clone()
}

/// Transport backed by a pooled `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Transport with [`TransportConfig::default`].
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Transport with custom timeouts, pooling and proxy.
    pub fn with_config(config: TransportConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .user_agent(config.user_agent.clone());

        if !config.proxy_url.is_empty() {
            match reqwest::Proxy::all(&config.proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => tracing::warn!("Ignoring invalid proxy {}: {}", config.proxy_url, err),
            }
        }

        let client = builder.build().unwrap_or_default();
        ReqwestClient { client }
    }

    /// Wrap an existing `reqwest` client.
    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestClient { client }
    }
}

impl Default for ReqwestClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: &HttpRequest, _configs: &Configs) -> Result<HttpResponse> {
        let method = request
            .method
            .to_http()
            .map_err(|err| NetError::TransportFailed(Box::new(err)))?;

        let mut builder = self
            .client
            .request(method, request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

type RespondFn = dyn Fn(&HttpRequest, &Configs) -> Result<HttpResponse> + Send + Sync;

/// In-memory transport answering from a closure.
#[derive(Clone)]
pub struct FnHttpClient {
    respond: Arc<RespondFn>,
}

impl FnHttpClient {
    /// Transport calling `respond` for every request.
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&HttpRequest, &Configs) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        FnHttpClient {
            respond: Arc::new(respond),
        }
    }
}

#[async_trait]
impl HttpClient for FnHttpClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        (self.respond)(request, configs)
    }
}

type BodyMapFn = dyn Fn(Bytes, &Configs) -> Result<Bytes> + Send + Sync;

/// Rewrites response bodies after a successful exchange.
pub struct MapResponseClient {
    base: Arc<dyn HttpClient>,
    map: Arc<BodyMapFn>,
}

#[async_trait]
impl HttpClient for MapResponseClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        let mut response = self.base.send(request, configs).await?;
        response.body = (self.map)(response.body, configs)?;
        Ok(response)
    }
}

type InspectFn = dyn Fn(&HttpRequest, &HttpResponse, &Configs) + Send + Sync;

/// Observes responses without changing them.
pub struct InspectResponseClient {
    base: Arc<dyn HttpClient>,
    inspect: Arc<InspectFn>,
}

#[async_trait]
impl HttpClient for InspectResponseClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        let response = self.base.send(request, configs).await?;
        (self.inspect)(request, &response, configs);
        Ok(response)
    }
}

type ResponseMapFn = dyn Fn(HttpResponse, &Configs) -> Result<HttpResponse> + Send + Sync;

/// Replaces whole responses.
pub struct MapHttpResponseClient {
    base: Arc<dyn HttpClient>,
    map: Arc<ResponseMapFn>,
}

#[async_trait]
impl HttpClient for MapHttpResponseClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        let response = self.base.send(request, configs).await?;
        (self.map)(response, configs)
    }
}

impl NetworkClient {
    /// Replace the transport.
    #[must_use]
    pub fn http_client(&self, client: impl HttpClient) -> Self {
        self.config::<HttpClientKey>(Arc::new(client))
    }

    /// Wrap the current transport.
    #[must_use]
    pub fn map_http_client<F>(&self, wrap: F) -> Self
    where
        F: Fn(Arc<dyn HttpClient>) -> Arc<dyn HttpClient> + Send + Sync + 'static,
    {
        self.configs(move |configs| {
            let wrapped = wrap(configs.http_client());
            configs.set::<HttpClientKey>(wrapped);
        })
    }

    /// Rewrite response bytes before validation, for HTTP and WebSocket alike.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let client = api.map_response(|body, _| Ok(gunzip(&body)?.into()));
    /// ```
    #[must_use]
    pub fn map_response<F>(&self, map: F) -> Self
    where
        F: Fn(Bytes, &Configs) -> Result<Bytes> + Send + Sync + 'static,
    {
        let map: Arc<BodyMapFn> = Arc::new(map);
        self.configs(move |configs| {
            let http = MapResponseClient {
                base: configs.http_client(),
                map: map.clone(),
            };
            configs.set::<HttpClientKey>(Arc::new(http));

            let socket = MapWebSocketClient::new(configs.web_socket_client(), map.clone());
            configs.set::<WebSocketClientKey>(Arc::new(socket));
        })
    }

    /// Observe every response that reaches this layer.
    #[must_use]
    pub fn on_response<F>(&self, inspect: F) -> Self
    where
        F: Fn(&HttpRequest, &HttpResponse, &Configs) + Send + Sync + 'static,
    {
        let inspect: Arc<InspectFn> = Arc::new(inspect);
        self.map_http_client(move |base| {
            Arc::new(InspectResponseClient {
                base,
                inspect: inspect.clone(),
            })
        })
    }

    /// Replace whole responses before validation.
    #[must_use]
    pub fn map_http_response<F>(&self, map: F) -> Self
    where
        F: Fn(HttpResponse, &Configs) -> Result<HttpResponse> + Send + Sync + 'static,
    {
        let map: Arc<ResponseMapFn> = Arc::new(map);
        self.map_http_client(move |base| {
            Arc::new(MapHttpResponseClient {
                base,
                map: map.clone(),
            })
        })
    }
}
