//! The request/response execution pipeline.
//!
//! Stages run strictly in order, each failing stage logging before it
//! propagates:
//!
//! | Stage | Failure |
//! |-------|---------|
//! | Materialize request and snapshot | `RequestCreationFailed` |
//! | Request validator | `RequestInvalid` |
//! | Transport (with its decorators) | `TransportFailed` |
//! | Response validator | error decoder, else the validator's error |
//! | Serializer | error decoder, else `ResponseDecodingFailed` |
//!
//! The error decoder swallows its own failures: if it cannot produce a
//! structured error, the original error surfaces.

use super::retry::{RetryBudget, RetryBudgetKey};
use super::NetworkClient;
use crate::codec::Serializer;
use crate::config::{Configs, Logger};
use crate::error::{NetError, Result};
use crate::types::{Bytes, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;

impl NetworkClient {
    /// Materialize, validate and send, returning the validated response.
    pub async fn response(&self) -> Result<HttpResponse> {
        self.execute().await.map(|(response, _)| response)
    }

    /// Execute and serialize the body with `serializer`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let names = api
    ///     .path("pets")
    ///     .http(Serializer::<Vec<Pet>>::decodable().map(|pets| {
    ///         Ok(pets.into_iter().map(|pet| pet.name).collect::<Vec<_>>())
    ///     }))
    ///     .await?;
    /// ```
    pub async fn http<T: 'static>(&self, serializer: Serializer<T>) -> Result<T> {
        let (response, configs) = self.execute().await?;
        let logger = configs.logger();
        match serializer.serialize(response.body.clone(), &configs) {
            Ok(value) => Ok(value),
            Err(err) => {
                let err = decode_error_or(&response.body, &configs, err.into_decoding_failure());
                logger.error(format_args!("Response decoding failed: {}", err));
                Err(err)
            }
        }
    }

    /// Raw response body.
    pub async fn data(&self) -> Result<Bytes> {
        self.http(Serializer::data()).await
    }

    /// Response body as UTF-8 text.
    pub async fn text(&self) -> Result<String> {
        self.http(Serializer::text()).await
    }

    /// Response body as an untyped JSON value.
    pub async fn json(&self) -> Result<Value> {
        self.http(Serializer::json()).await
    }

    /// Response body decoded into `T` with the snapshot's body decoder.
    pub async fn decodable<T: DeserializeOwned + 'static>(&self) -> Result<T> {
        self.http(Serializer::decodable()).await
    }

    /// Execute and discard the body without parsing it.
    pub async fn send(&self) -> Result<()> {
        self.http(Serializer::void()).await
    }

    /// Materialize and pre-validate. Shared with the streaming path.
    pub(crate) fn prepare(&self) -> Result<(HttpRequest, Configs, Logger)> {
        let mut configs = self.snapshot();
        configs.set::<RetryBudgetKey>(RetryBudget::new());
        let logger = configs.logger();

        let request = self.build_request(&configs).map_err(|err| {
            logger.error(format_args!("Request creation failed: {}", err));
            err
        })?;

        configs
            .request_validator()
            .validate(&request, &configs)
            .map_err(|err| {
                let err = err.into_invalid_request();
                logger.error(format_args!("{} rejected: {}", request, err));
                err
            })?;

        Ok((request, configs, logger))
    }

    async fn execute(&self) -> Result<(HttpResponse, Configs)> {
        let (request, configs, logger) = self.prepare()?;
        logger.debug(format_args!("{} started", request));

        let response = match configs.http_client().send(&request, &configs).await {
            Ok(response) => response,
            Err(err) => {
                let err = err.into_transport_failure();
                logger.error(format_args!("{} failed: {}", request, err));
                return Err(err);
            }
        };
        logger.debug(format_args!(
            "{} returned {} ({} bytes)",
            request,
            response.status,
            response.body.len()
        ));

        if let Err(err) = configs.response_validator().validate(&response, &configs) {
            let err = decode_error_or(&response.body, &configs, err);
            logger.error(format_args!("{} response invalid: {}", request, err));
            return Err(err);
        }

        Ok((response, configs))
    }
}

/// The structured error decoded from `body`, or `fallback`.
pub(crate) fn decode_error_or(body: &[u8], configs: &Configs, fallback: NetError) -> NetError {
    match configs.error_decoder().decode_error(body, configs) {
        Some(decoded) => NetError::DecodedServerError(decoded),
        None => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::FnHttpClient;
    use crate::client::validation::RequestValidator;
    use serde::Deserialize;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Deserialize)]
    struct ApiError {
        error: String,
    }

    impl fmt::Display for ApiError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.error)
        }
    }

    impl std::error::Error for ApiError {}

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        id: u64,
    }

    fn respond(status: u16, body: &'static str) -> NetworkClient {
        NetworkClient::new("https://example.com")
            .http_client(FnHttpClient::new(move |_, _| Ok(HttpResponse::new(status, body))))
    }

    #[tokio::test]
    async fn test_decodable() {
        let pet: Pet = respond(200, r#"{"id": 3}"#).decodable().await.unwrap();
        assert_eq!(pet, Pet { id: 3 });
    }

    #[tokio::test]
    async fn test_default_accepts_any_status() {
        let text = respond(500, "oops").text().await.unwrap();
        assert_eq!(text, "oops");
    }

    #[tokio::test]
    async fn test_invalid_status() {
        let result = respond(404, "").validate_status_code().send().await;
        assert!(matches!(result, Err(NetError::InvalidStatusCode(404))));
    }

    #[tokio::test]
    async fn test_error_decoder_takes_precedence() {
        let err = respond(400, r#"{"error":"test_error"}"#)
            .validate_status_code()
            .decodable_error::<ApiError>()
            .send()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "test_error");
        assert!(err.server_error::<ApiError>().is_some());
    }

    #[tokio::test]
    async fn test_undecodable_error_body_keeps_status_error() {
        let err = respond(400, "plain")
            .validate_status_code()
            .decodable_error::<ApiError>()
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::InvalidStatusCode(400)));
    }

    #[tokio::test]
    async fn test_decode_failure_consults_error_decoder() {
        let err = respond(200, r#"{"error":"test_error"}"#)
            .decodable_error::<ApiError>()
            .decodable::<Pet>()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "test_error");
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let err = respond(200, "{").decodable::<Pet>().await.unwrap_err();
        assert!(matches!(err, NetError::ResponseDecodingFailed(_)));
    }

    #[tokio::test]
    async fn test_void_does_not_parse() {
        respond(204, "").send().await.unwrap();
    }

    #[tokio::test]
    async fn test_request_validator_blocks_transport() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let err = NetworkClient::new("https://example.com")
            .http_client(FnHttpClient::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(HttpResponse::ok(""))
            }))
            .request_validator(RequestValidator::new(|_, _| Err(NetError::Unimplemented)))
            .send()
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::RequestInvalid(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_error_wrapped() {
        let err = NetworkClient::new("https://example.com")
            .http_client(FnHttpClient::new(|_, _| Err(NetError::Socket("reset".into()))))
            .data()
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::TransportFailed(_)));
    }

    #[tokio::test]
    async fn test_creation_failure() {
        let err = NetworkClient::new("::").send().await.unwrap_err();
        assert!(matches!(err, NetError::RequestCreationFailed(_)));
    }
}
