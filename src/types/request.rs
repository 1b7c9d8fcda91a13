use super::{ContentType, HttpMethod};
use crate::error::Result;
use crate::protocol::{apply_header, HeaderMode};
use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE};
use std::fmt;
use url::Url;

/// The materialized target of a call.
///
/// Produced by replaying a [`NetworkClient`](crate::NetworkClient)'s request
/// steps against a configuration snapshot. Immutable for the duration of one
/// execution attempt once handed to the pipeline.
///
/// # Examples
///
/// ```
/// use netclient::{HttpMethod, HttpRequest};
/// use url::Url;
///
/// let request = HttpRequest::new(Url::parse("https://example.com/pets").unwrap())
///     .with_method(HttpMethod::POST);
/// assert_eq!(request.to_string(), "POST https://example.com/pets");
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Absolute URL including path and query.
    pub url: Url,
    /// Method token.
    pub method: HttpMethod,
    /// Header multiset.
    pub headers: HeaderMap,
    /// Optional body bytes.
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Create a `GET` request with no headers and no body.
    pub fn new(url: Url) -> Self {
        HttpRequest {
            url,
            method: HttpMethod::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Replace the method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<HttpMethod>) -> Self {
        self.method = method.into();
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Write a header.
    pub fn set_header(&mut self, name: &str, value: &str, mode: HeaderMode) -> Result<()> {
        apply_header(&mut self.headers, name, value, mode)
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Declared content type of the body.
    pub fn content_type(&self) -> Option<ContentType> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ContentType::parse)
    }

    /// Query items in URL order.
    pub fn query_items(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

impl fmt::Display for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
