//! Static configuration for the default transports.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `request_timeout_ms` | 30000 | Whole-request timeout |
//! | `connect_timeout_ms` | 10000 | TCP/TLS connect timeout |
//! | `pool_idle_timeout_secs` | 90 | Idle connection lifetime |
//! | `max_idle_per_host` | 100 | Idle connections kept per host |
//! | `proxy_url` | empty | Route every request through this proxy |
//! | `user_agent` | `netclient/<version>` | `User-Agent` header |
//!
//! # Examples
//!
//! ```
//! use netclient::config::TransportConfig;
//!
//! let config = TransportConfig {
//!     request_timeout_ms: 5_000,
//!     ..Default::default()
//! };
//! assert_eq!(config.connect_timeout_ms, 10_000);
//! ```

use std::time::Duration;

/// Configuration for the default reqwest-backed HTTP transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Maximum time for a whole request, in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum time to establish a connection, in milliseconds.
    pub connect_timeout_ms: u64,

    /// How long idle pooled connections are kept, in seconds.
    pub pool_idle_timeout_secs: u64,

    /// Maximum idle pooled connections per host.
    pub max_idle_per_host: usize,

    /// Proxy URL. Empty disables the proxy.
    pub proxy_url: String,

    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            request_timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            pool_idle_timeout_secs: 90,
            max_idle_per_host: 100,
            proxy_url: String::new(),
            user_agent: concat!("netclient/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Configuration for the default WebSocket transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebSocketConfig {
    /// Keepalive ping period. `None` disables pings.
    pub ping_interval: Option<Duration>,

    /// Messages buffered per consumer before it is dropped as too slow.
    pub consumer_buffer: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        WebSocketConfig {
            ping_interval: Some(Duration::from_secs(15)),
            consumer_buffer: 1024,
        }
    }
}
