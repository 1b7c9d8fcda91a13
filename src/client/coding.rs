//! Modifiers selecting codecs and logging for the snapshot.

use super::NetworkClient;
use crate::codec::{
    BodyDecoderKey, BodyEncoderKey, ContentEncoder, DataDecoder, DecodableErrorDecoder,
    ErrorDecoder, ErrorDecoderKey, QueryEncoder, QueryEncoderKey,
};
use crate::config::{LevelFilter, LogLevelKey};
use serde::de::DeserializeOwned;
use std::sync::Arc;

impl NetworkClient {
    /// Encoder used by [`NetworkClient::body`].
    #[must_use]
    pub fn body_encoder(&self, encoder: impl ContentEncoder) -> Self {
        self.config::<BodyEncoderKey>(Arc::new(encoder))
    }

    /// Decoder used by decodable terminals and [`DecodableErrorDecoder`].
    #[must_use]
    pub fn body_decoder(&self, decoder: impl DataDecoder) -> Self {
        self.config::<BodyDecoderKey>(Arc::new(decoder))
    }

    /// Wrap the current body decoder.
    #[must_use]
    pub fn map_decoder<F>(&self, map: F) -> Self
    where
        F: Fn(Arc<dyn DataDecoder>) -> Arc<dyn DataDecoder> + Send + Sync + 'static,
    {
        self.configs(move |configs| {
            let decoder = map(configs.body_decoder());
            configs.set::<BodyDecoderKey>(decoder);
        })
    }

    /// Encoder used by [`NetworkClient::query`].
    #[must_use]
    pub fn query_encoder(&self, encoder: impl QueryEncoder) -> Self {
        self.config::<QueryEncoderKey>(Arc::new(encoder))
    }

    /// Decoder consulted when a response fails validation or decoding.
    #[must_use]
    pub fn error_decoder(&self, decoder: impl ErrorDecoder) -> Self {
        self.config::<ErrorDecoderKey>(Arc::new(decoder))
    }

    /// Decode failure bodies into `E` with the snapshot's body decoder.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// #[derive(Debug, Deserialize, thiserror::Error)]
    /// #[error("{message}")]
    /// struct ApiError { message: String }
    ///
    /// let pet = client.decodable_error::<ApiError>().decodable::<Pet>().await;
    /// ```
    #[must_use]
    pub fn decodable_error<E>(&self) -> Self
    where
        E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
    {
        self.error_decoder(DecodableErrorDecoder::<E>::new())
    }

    /// Maximum verbosity of pipeline logging. Off by default.
    #[must_use]
    pub fn log_level(&self, level: LevelFilter) -> Self {
        self.config::<LogLevelKey>(level)
    }
}
