//! Test collaborators: canned responses and request inspection.
//!
//! Neither transport is ever installed implicitly.

use super::transport::HttpClient;
use super::NetworkClient;
use crate::config::{ConfigKey, Configs};
use crate::error::{NetError, Result};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::Arc;

/// Setting: response returned by [`MockHttpClient`].
pub struct MockResponseKey;

impl ConfigKey for MockResponseKey {
    type Value = HttpResponse;
}

/// Transport answering with the snapshot's mock response.
///
/// Fails with [`NetError::MockMissing`] when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockHttpClient;

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        configs
            .get::<MockResponseKey>()
            .ok_or_else(|| NetError::MockMissing(request.to_string()))
    }
}

type TestHandler = Arc<dyn Fn(&HttpRequest, &Configs) -> Result<()> + Send + Sync>;

/// Setting: inspector run by [`TestHttpClient`].
pub struct TestHandlerKey;

impl ConfigKey for TestHandlerKey {
    type Value = TestHandler;
}

/// Transport running the snapshot's test handler, then answering `200` with
/// an empty body.
///
/// Fails with [`NetError::Unimplemented`] when no handler is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestHttpClient;

#[async_trait]
impl HttpClient for TestHttpClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        let handler = configs
            .get::<TestHandlerKey>()
            .ok_or(NetError::Unimplemented)?;
        handler(request, configs)?;
        Ok(HttpResponse::ok(""))
    }
}

impl NetworkClient {
    /// Answer every call with `response` instead of touching the network.
    ///
    /// # Examples
    ///
    /// ```
    /// use netclient::{HttpResponse, NetworkClient};
    ///
    /// # tokio_test::block_on(async {
    /// let text = NetworkClient::new("https://example.com")
    ///     .mock(HttpResponse::ok("hello"))
    ///     .text()
    ///     .await
    ///     .unwrap();
    /// assert_eq!(text, "hello");
    /// # });
    /// ```
    #[must_use]
    pub fn mock(&self, response: HttpResponse) -> Self {
        self.config::<MockResponseKey>(response)
            .http_client(MockHttpClient)
    }

    /// Execute, handing the final request to `handler` instead of the network.
    pub async fn http_test<F>(&self, handler: F) -> Result<()>
    where
        F: Fn(&HttpRequest, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        let handler: TestHandler = Arc::new(handler);
        self.config::<TestHandlerKey>(handler)
            .http_client(TestHttpClient)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthModifier;

    #[tokio::test]
    async fn test_mock_missing() {
        let err = NetworkClient::new("https://example.com/pets")
            .http_client(MockHttpClient)
            .send()
            .await
            .unwrap_err();
        match err {
            NetError::MockMissing(target) => assert_eq!(target, "GET https://example.com/pets"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unimplemented_without_handler() {
        let err = NetworkClient::new("https://example.com")
            .http_client(TestHttpClient)
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Unimplemented));
    }

    #[tokio::test]
    async fn test_http_test_sees_final_request() {
        NetworkClient::new("https://example.com")
            .path("pet")
            .auth(AuthModifier::bearer("abc"))
            .http_test(|request, _| {
                assert_eq!(request.url.path(), "/pet");
                assert_eq!(request.header("authorization"), Some("Bearer abc"));
                Ok(())
            })
            .await
            .unwrap();
    }
}
