//! The request builder and its execution pipelines.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── builder      - NetworkClient, materialization
//! ├── request      - path, method, header, query and body modifiers
//! ├── coding       - codec and log level selection
//! ├── auth         - AuthModifier and the auth switch
//! ├── validation   - request and response validators
//! ├── transport    - HttpClient, reqwest transport, response decorators
//! ├── retry        - retry and wait-for-connectivity decorators
//! ├── reachability - connectivity reporting
//! ├── http         - request/response pipeline and terminals
//! ├── websocket    - streaming pipeline and terminals
//! └── mock         - canned-response and inspection transports
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`NetworkClient`] | Immutable request builder |
//! | [`HttpClient`] | Pluggable one-shot transport |
//! | [`WebSocketClient`] | Pluggable streaming transport |
//! | [`AuthModifier`] | Credentials applied when auth is enabled |
//! | [`RequestValidator`] / [`ResponseValidator`] | Composable checks |
//! | [`ConnectivityService`] | Reachability source for `wait_for_connection` |
//!
//! # Examples
//!
//! ```
//! use netclient::{HttpMethod, NetworkClient};
//! use serde_json::json;
//!
//! let api = NetworkClient::new("https://petstore.example.com/v2")
//!     .header("Accept", "application/json");
//!
//! let create = api.path("pet").post().body(json!({"name": "Rex"}));
//! let request = create.request().unwrap();
//!
//! assert_eq!(request.method, HttpMethod::POST);
//! assert_eq!(request.url.path(), "/v2/pet");
//! assert_eq!(request.header("content-type"), Some("application/json"));
//! ```

mod auth;
mod builder;
mod coding;
mod http;
mod mock;
mod reachability;
mod request;
mod retry;
mod transport;
mod validation;
mod websocket;

pub use auth::{AuthEnabledKey, AuthModifier};
pub use builder::NetworkClient;
pub use mock::{MockHttpClient, MockResponseKey, TestHandlerKey, TestHttpClient};
pub use reachability::{AlwaysReachable, Connectivity, ConnectivityMonitor, ConnectivityService};
pub use retry::{ConnectivityRetryClient, RetryBudget, RetryBudgetKey, RetryClient};
pub use transport::{
    FnHttpClient, HttpClient, HttpClientKey, InspectResponseClient, MapHttpResponseClient,
    MapResponseClient, ReqwestClient,
};
pub use validation::{RequestValidator, RequestValidatorKey, ResponseValidator, ResponseValidatorKey};
pub use websocket::{FnWebSocketClient, TungsteniteClient, WebSocketClient, WebSocketClientKey};
