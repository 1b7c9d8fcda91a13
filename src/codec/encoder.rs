use super::query::UrlQueryEncoder;
use super::QueryEncoder;
use crate::config::{ConfigKey, Configs};
use crate::error::{NetError, Result};
use crate::types::ContentType;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Encodes a value into request body bytes of a fixed content type.
pub trait ContentEncoder: Send + Sync + 'static {
    /// Content type of the produced bytes.
    fn content_type(&self) -> ContentType;

    /// Encode a JSON-model value.
    fn encode(&self, value: &Value) -> Result<Bytes>;
}

impl dyn ContentEncoder {
    /// Encode any serializable value.
    pub fn encode_serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        let value = serde_json::to_value(value).map_err(NetError::encode)?;
        self.encode(&value)
    }
}

/// Setting: encoder used by [`NetworkClient::body`](crate::NetworkClient::body).
pub struct BodyEncoderKey;

impl ConfigKey for BodyEncoderKey {
    type Value = Arc<dyn ContentEncoder>;
}

impl Configs {
    /// Body encoder, [`JsonEncoder`] when unset.
    pub fn body_encoder(&self) -> Arc<dyn ContentEncoder> {
        self.get::<BodyEncoderKey>()
            .unwrap_or_else(|| Arc::new(JsonEncoder::default()))
    }
}

/// `application/json` encoder. Object keys are written sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder {
    /// Indent the output.
    pub pretty: bool,
}

impl JsonEncoder {
    /// Encoder producing indented JSON.
    pub fn pretty() -> Self {
        JsonEncoder { pretty: true }
    }
}

impl ContentEncoder for JsonEncoder {
    fn content_type(&self) -> ContentType {
        ContentType::json()
    }

    fn encode(&self, value: &Value) -> Result<Bytes> {
        let sorted = sort_keys(value);
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&sorted)
        } else {
            serde_json::to_vec(&sorted)
        }
        .map_err(NetError::encode)?;
        Ok(Bytes::from(bytes))
    }
}

// serde_json keeps insertion order when built with `preserve_order`.
fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// `application/x-www-form-urlencoded` encoder.
///
/// Flattens the value with a [`UrlQueryEncoder`] and percent-encodes the pairs.
///
/// # Examples
///
/// ```
/// use netclient::codec::{ContentEncoder, FormUrlEncoder};
/// use serde_json::json;
///
/// let body = FormUrlEncoder::default()
///     .encode(&json!({"name": "Rex", "tags": ["a", "b"]}))
///     .unwrap();
/// assert_eq!(&body[..], b"name=Rex&tags=a%2Cb");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormUrlEncoder {
    /// Flattening rules.
    pub query: UrlQueryEncoder,
}

impl ContentEncoder for FormUrlEncoder {
    fn content_type(&self) -> ContentType {
        ContentType::form_url_encoded()
    }

    fn encode(&self, value: &Value) -> Result<Bytes> {
        let pairs = self.query.encode(value)?;
        let encoded = serde_urlencoded::to_string(&pairs).map_err(NetError::encode)?;
        Ok(Bytes::from(encoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_sorted_keys() {
        let bytes = JsonEncoder::default()
            .encode(&json!({"b": 1, "a": {"d": 2, "c": 3}}))
            .unwrap();
        assert_eq!(&bytes[..], br#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn test_json_content_type() {
        assert_eq!(JsonEncoder::pretty().content_type(), ContentType::json());
    }

    #[test]
    fn test_encode_serialize() {
        #[derive(Serialize)]
        struct Pet {
            name: &'static str,
        }
        let encoder: Arc<dyn ContentEncoder> = Arc::new(JsonEncoder::default());
        let bytes = encoder.encode_serialize(&Pet { name: "Rex" }).unwrap();
        assert_eq!(&bytes[..], br#"{"name":"Rex"}"#);
    }

    #[test]
    fn test_default_body_encoder_is_json() {
        assert_eq!(Configs::new().body_encoder().content_type(), ContentType::json());
    }

    #[test]
    fn test_form_encoder_escapes() {
        let bytes = FormUrlEncoder::default()
            .encode(&json!({"q": "a b&c"}))
            .unwrap();
        assert_eq!(&bytes[..], b"q=a+b%26c");
    }
}
