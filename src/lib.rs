#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # netclient: declarative HTTP and WebSocket clients
//!
//! Describe an endpoint once as an immutable [`NetworkClient`], then execute it
//! as many times as you like, from as many tasks as you like.
//!
//! ## Overview
//!
//! A client is built by chaining modifiers. Each modifier returns a new client
//! with one more step appended; nothing runs until a terminal operation:
//!
//! 1. **Configuration steps** are replayed into a fresh [`Configs`] snapshot
//! 2. **Request steps** build an [`HttpRequest`] against that snapshot
//! 3. **The pipeline** validates, sends through the snapshot's transport,
//!    validates the response, decodes errors and serializes the result
//!
//! Every pluggable piece (transport, encoders, decoders, validators, auth,
//! retry) lives in the snapshot, so any of them can be swapped per endpoint.
//!
//! ## Client Usage
//!
//! ```ignore
//! use netclient::{AuthModifier, NetworkClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> netclient::Result<()> {
//!     let api = NetworkClient::new("https://petstore.example.com/v2")
//!         .auth(AuthModifier::bearer("t0k3n"))
//!         .validate_status_code()
//!         .retry(2);
//!
//!     let pet: Pet = api.path("pet").path(1).decodable().await?;
//!     println!("{} is called {}", pet.id, pet.name);
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming Usage
//!
//! ```ignore
//! use futures::StreamExt;
//! use netclient::NetworkClient;
//!
//! let channel = NetworkClient::new("wss://feed.example.com").path("prices").json_stream()?;
//! let mut prices = channel.subscribe();
//! channel.send_text(r#"{"subscribe":"BTC"}"#).await?;
//!
//! while let Some(price) = prices.next().await {
//!     println!("{}", price?);
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[client]** - The builder, transports, decorators and pipelines
//! - **[codec]** - Encoder, decoder, serializer and error decoder contracts
//! - **[config]** - The configuration snapshot, logging and transport settings
//! - **[socket]** - Sockets and multi-consumer streaming channels
//! - **[types]** - Request, response, method and content type values
//! - **[error]** - Error types and result handling
//! - **[protocol]** - Header, status and URL helpers

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod socket;
pub mod types;

pub use client::{
    AlwaysReachable, AuthModifier, Connectivity, ConnectivityMonitor, ConnectivityService,
    HttpClient, NetworkClient, RequestValidator, ResponseValidator, WebSocketClient,
};
pub use codec::{ContentSerializer, Serializer};
pub use config::Configs;
pub use error::{NetError, Result};
pub use protocol::HeaderMode;
pub use socket::{ChannelState, WebSocketChannel};
pub use types::{Bytes, ContentType, HttpMethod, HttpRequest, HttpResponse};

#[cfg(test)]
mod tests;
