use super::DataDecoder;
use crate::config::{ConfigKey, Configs};
use crate::error::BoxError;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::Arc;

/// Attempts to extract a structured application error from a failed response.
///
/// Returning `None` means "no structured error available"; the pipeline then
/// surfaces the original failure. Decode attempts never raise.
pub trait ErrorDecoder: Send + Sync + 'static {
    /// Try to decode `body` into an error.
    fn decode_error(&self, body: &[u8], configs: &Configs) -> Option<BoxError>;
}

impl<F> ErrorDecoder for F
where
    F: Fn(&[u8], &Configs) -> Option<BoxError> + Send + Sync + 'static,
{
    fn decode_error(&self, body: &[u8], configs: &Configs) -> Option<BoxError> {
        self(body, configs)
    }
}

/// Setting: the active error decoder.
pub struct ErrorDecoderKey;

impl ConfigKey for ErrorDecoderKey {
    type Value = Arc<dyn ErrorDecoder>;
}

impl Configs {
    /// Error decoder, [`NoneErrorDecoder`] when unset.
    pub fn error_decoder(&self) -> Arc<dyn ErrorDecoder> {
        self.get::<ErrorDecoderKey>()
            .unwrap_or_else(|| Arc::new(NoneErrorDecoder))
    }
}

/// Never produces a structured error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoneErrorDecoder;

impl ErrorDecoder for NoneErrorDecoder {
    fn decode_error(&self, _body: &[u8], _configs: &Configs) -> Option<BoxError> {
        None
    }
}

/// Decodes the failure body into `E` with a data decoder.
///
/// Uses the snapshot's body decoder unless one was given explicitly.
pub struct DecodableErrorDecoder<E> {
    decoder: Option<Arc<dyn DataDecoder>>,
    _marker: PhantomData<fn() -> E>,
}

impl<E> DecodableErrorDecoder<E> {
    /// Decode with the snapshot's body decoder.
    pub fn new() -> Self {
        DecodableErrorDecoder {
            decoder: None,
            _marker: PhantomData,
        }
    }

    /// Decode with a fixed decoder.
    pub fn with_decoder(decoder: Arc<dyn DataDecoder>) -> Self {
        DecodableErrorDecoder {
            decoder: Some(decoder),
            _marker: PhantomData,
        }
    }
}

impl<E> Default for DecodableErrorDecoder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ErrorDecoder for DecodableErrorDecoder<E>
where
    E: DeserializeOwned + std::error::Error + Send + Sync + 'static,
{
    fn decode_error(&self, body: &[u8], configs: &Configs) -> Option<BoxError> {
        let decoder = self
            .decoder
            .clone()
            .unwrap_or_else(|| configs.body_decoder());
        decoder
            .decode::<E>(body)
            .ok()
            .map(|failure| Box::new(failure) as BoxError)
    }
}
