use crate::config::{ConfigKey, Configs};
use crate::error::{NetError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Decodes response bytes into a JSON-model value.
pub trait DataDecoder: Send + Sync + 'static {
    /// Decode raw bytes.
    fn decode_value(&self, data: &[u8]) -> Result<Value>;
}

impl dyn DataDecoder {
    /// Decode raw bytes into a typed value.
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        let value = self.decode_value(data)?;
        serde_json::from_value(value).map_err(NetError::decode)
    }
}

/// Setting: decoder used by [`Serializer::decodable`](super::Serializer::decodable)
/// and [`DecodableErrorDecoder`](super::DecodableErrorDecoder).
pub struct BodyDecoderKey;

impl ConfigKey for BodyDecoderKey {
    type Value = Arc<dyn DataDecoder>;
}

impl Configs {
    /// Body decoder, [`JsonDecoder`] when unset.
    pub fn body_decoder(&self) -> Arc<dyn DataDecoder> {
        self.get::<BodyDecoderKey>()
            .unwrap_or_else(|| Arc::new(JsonDecoder))
    }
}

/// JSON decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl DataDecoder for JsonDecoder {
    fn decode_value(&self, data: &[u8]) -> Result<Value> {
        serde_json::from_slice(data).map_err(NetError::decode)
    }
}
