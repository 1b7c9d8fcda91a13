//! Error types for request construction and execution.
//!
//! Every terminal operation of a [`NetworkClient`](crate::NetworkClient) reports
//! failure through [`NetError`]. The variant tells you which pipeline stage gave up.
//!
//! # Error Categories
//!
//! | Stage | Variants | Retryable |
//! |-------|----------|-----------|
//! | Materialization | `RequestCreationFailed`, `Encode`, `InvalidHeader` | No |
//! | Pre-flight | `RequestInvalid` | No |
//! | Transport | `TransportFailed` | Yes |
//! | Response | `InvalidStatusCode`, `DecodedServerError`, `ResponseDecodingFailed` | Depends |
//! | Streaming | `NotConnected`, `Socket`, `InvalidUtf8` | No |
//! | Mocking | `MockMissing`, `Unimplemented` | No |
//!
//! # Examples
//!
//! ```
//! use netclient::NetError;
//!
//! let err = NetError::InvalidStatusCode(503);
//! assert!(err.is_retryable());
//! assert!(err.to_string().contains("503"));
//!
//! let err = NetError::NotConnected;
//! assert!(!err.is_retryable());
//! ```

use thiserror::Error;

/// Boxed error used wherever a stage forwards a foreign error untouched.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for all client operations.
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors that can occur while building or executing a request.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NetError {
    /// A builder step failed while materializing the request.
    ///
    /// Fatal to that call and never retried.
    #[error("Request creation failed: {0}")]
    RequestCreationFailed(#[source] BoxError),

    /// The pre-flight request validator rejected the request.
    ///
    /// No network attempt was made.
    #[error("Request is invalid: {0}")]
    RequestInvalid(#[source] BoxError),

    /// The transport failed, or retries were exhausted on a failing transport.
    #[error("Transport failed: {0}")]
    TransportFailed(#[source] BoxError),

    /// The response status is outside the accepted range.
    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    /// A structured application error decoded from a failed response.
    ///
    /// The inner error is whatever the configured error decoder produced; use
    /// [`NetError::server_error`] to downcast it.
    #[error("{0}")]
    DecodedServerError(#[source] BoxError),

    /// The response body could not be turned into the requested result.
    #[error("Response decoding failed: {0}")]
    ResponseDecodingFailed(#[source] BoxError),

    /// A value could not be encoded into a body or query.
    #[error("Encoding failed: {0}")]
    Encode(#[source] BoxError),

    /// Bytes could not be decoded into a value.
    #[error("Decoding failed: {0}")]
    Decode(#[source] BoxError),

    /// A header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Send or receive on a streaming channel that is not open.
    #[error("Not connected")]
    NotConnected,

    /// The underlying socket reported an error.
    #[error("Socket error: {0}")]
    Socket(String),

    /// Encoded data is not valid UTF-8 and cannot be sent as a text frame.
    #[error("Invalid UTF-8 data")]
    InvalidUtf8,

    /// A mock transport was installed but no mock response was configured.
    #[error("Mock response is missing for {0}")]
    MockMissing(String),

    /// A test transport was installed without a handler.
    #[error("Unimplemented")]
    Unimplemented,
}

impl NetError {
    /// Check if the failed operation could succeed when attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetError::TransportFailed(_) => true,
            NetError::InvalidStatusCode(status) => crate::protocol::is_retryable_status(*status),
            _ => false,
        }
    }

    /// Downcast a [`NetError::DecodedServerError`] to the application error type.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// match client.decodable::<Pet>().await {
    ///     Err(err) => {
    ///         if let Some(api) = err.server_error::<ApiError>() {
    ///             eprintln!("server said: {}", api.message);
    ///         }
    ///     }
    ///     Ok(pet) => println!("{pet:?}"),
    /// }
    /// ```
    pub fn server_error<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            NetError::DecodedServerError(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub(crate) fn encode(err: impl Into<BoxError>) -> Self {
        NetError::Encode(err.into())
    }

    pub(crate) fn decode(err: impl Into<BoxError>) -> Self {
        NetError::Decode(err.into())
    }

    /// Wrap as a materialization failure unless it already is one.
    pub(crate) fn into_creation_failure(self) -> Self {
        match self {
            NetError::RequestCreationFailed(_) => self,
            other => NetError::RequestCreationFailed(Box::new(other)),
        }
    }

    /// Wrap as a pre-flight failure unless it already is one.
    pub(crate) fn into_invalid_request(self) -> Self {
        match self {
            NetError::RequestInvalid(_) => self,
            other => NetError::RequestInvalid(Box::new(other)),
        }
    }

    /// Wrap as a transport failure, leaving transport-level variants as they are.
    pub(crate) fn into_transport_failure(self) -> Self {
        match self {
            NetError::TransportFailed(_)
            | NetError::MockMissing(_)
            | NetError::Unimplemented
            | NetError::InvalidStatusCode(_)
            | NetError::DecodedServerError(_) => self,
            other => NetError::TransportFailed(Box::new(other)),
        }
    }

    /// Wrap as a decoding failure unless a structured error was already produced.
    pub(crate) fn into_decoding_failure(self) -> Self {
        match self {
            NetError::ResponseDecodingFailed(_) | NetError::DecodedServerError(_) => self,
            other => NetError::ResponseDecodingFailed(Box::new(other)),
        }
    }
}

impl From<reqwest::Error> for NetError {
    fn from(err: reqwest::Error) -> Self {
        NetError::TransportFailed(Box::new(err))
    }
}

impl From<serde_json::Error> for NetError {
    fn from(err: serde_json::Error) -> Self {
        NetError::Decode(Box::new(err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for NetError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        NetError::Socket(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for NetError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        NetError::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for NetError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        NetError::InvalidHeader(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct ApiError(String);

    impl std::fmt::Display for ApiError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl std::error::Error for ApiError {}

    #[test]
    fn test_decoded_server_error_displays_inner_message() {
        let err = NetError::DecodedServerError(Box::new(ApiError("test_error".into())));
        assert_eq!(err.to_string(), "test_error");
        assert_eq!(err.server_error::<ApiError>().map(|e| e.0.as_str()), Some("test_error"));
    }

    #[test]
    fn test_server_error_on_other_variant() {
        assert!(NetError::NotConnected.server_error::<ApiError>().is_none());
    }

    #[test]
    fn test_wrapping_is_idempotent() {
        let err = NetError::InvalidHeader("x".into()).into_creation_failure();
        let err = err.into_creation_failure();
        match err {
            NetError::RequestCreationFailed(inner) => {
                assert!(inner.downcast_ref::<NetError>().is_some());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_transport_wrapping_keeps_mock_errors() {
        assert!(matches!(
            NetError::Unimplemented.into_transport_failure(),
            NetError::Unimplemented
        ));
        assert!(matches!(
            NetError::Socket("boom".into()).into_transport_failure(),
            NetError::TransportFailed(_)
        ));
    }

    #[test]
    fn test_is_retryable() {
        assert!(NetError::InvalidStatusCode(429).is_retryable());
        assert!(!NetError::InvalidStatusCode(404).is_retryable());
        assert!(!NetError::InvalidUtf8.is_retryable());
    }
}
