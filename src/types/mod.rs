//! Core value types describing a request and its response.
//!
//! # Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HttpMethod`] | Upper-case normalized method token |
//! | [`ContentType`] | Structured `type/subtype;k=v` media type |
//! | [`HttpRequest`] | Materialized request description |
//! | [`HttpResponse`] | Status, headers and body bytes |
//!
//! ```text
//! NetworkClient ──materialize──▶ HttpRequest ──transport──▶ HttpResponse ──serializer──▶ T
//! ```

mod content_type;
mod method;
mod request;
mod response;

pub use content_type::ContentType;
pub use method::HttpMethod;
pub use request::HttpRequest;
pub use response::HttpResponse;

pub use bytes::Bytes;
