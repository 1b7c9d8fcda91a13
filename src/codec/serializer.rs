use super::{ContentEncoder, FormUrlEncoder, JsonEncoder};
use crate::config::Configs;
use crate::error::{NetError, Result};
use crate::types::ContentType;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type SerializeFn<T> = dyn Fn(Bytes, &Configs) -> Result<T> + Send + Sync;
type ContentFn<T> = dyn Fn(&T, &Configs) -> Result<(Bytes, Option<ContentType>)> + Send + Sync;

/// Turns raw response bytes into the result of a terminal operation.
///
/// # Examples
///
/// ```
/// use netclient::codec::Serializer;
/// use netclient::config::Configs;
/// use netclient::Bytes;
///
/// let configs = Configs::new();
/// let len = Serializer::data().map(|bytes| Ok(bytes.len()));
/// assert_eq!(len.serialize(Bytes::from_static(b"abc"), &configs).unwrap(), 3);
///
/// // `void` never looks at the body.
/// assert!(Serializer::void().serialize(Bytes::from_static(b"{not json"), &configs).is_ok());
/// ```
pub struct Serializer<T> {
    serialize: Arc<SerializeFn<T>>,
}

impl<T> Clone for Serializer<T> {
    fn clone(&self) -> Self {
        Serializer {
            serialize: self.serialize.clone(),
        }
    }
}

impl<T> fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer").finish_non_exhaustive()
    }
}

impl<T: 'static> Serializer<T> {
    /// Wrap a serialize function.
    pub fn new<F>(serialize: F) -> Self
    where
        F: Fn(Bytes, &Configs) -> Result<T> + Send + Sync + 'static,
    {
        Serializer {
            serialize: Arc::new(serialize),
        }
    }

    /// Run the serializer.
    pub fn serialize(&self, data: Bytes, configs: &Configs) -> Result<T> {
        (self.serialize)(data, configs)
    }

    /// Post-process the serialized value.
    pub fn map<U: 'static, F>(self, f: F) -> Serializer<U>
    where
        F: Fn(T) -> Result<U> + Send + Sync + 'static,
    {
        let inner = self.serialize;
        Serializer::new(move |data, configs| inner(data, configs).and_then(&f))
    }
}

impl Serializer<Bytes> {
    /// Raw bytes, untouched.
    pub fn data() -> Self {
        Serializer::new(|data, _| Ok(data))
    }
}

impl Serializer<()> {
    /// Discards the body without parsing it.
    pub fn void() -> Self {
        Serializer::new(|_, _| Ok(()))
    }
}

impl Serializer<String> {
    /// UTF-8 text.
    pub fn text() -> Self {
        Serializer::new(|data, _| {
            String::from_utf8(data.to_vec()).map_err(NetError::decode)
        })
    }
}

impl Serializer<Value> {
    /// Untyped JSON value.
    pub fn json() -> Self {
        Serializer::new(|data, _| serde_json::from_slice(&data).map_err(NetError::decode))
    }
}

impl<T: DeserializeOwned + 'static> Serializer<T> {
    /// Typed value, decoded with the snapshot's body decoder.
    pub fn decodable() -> Self {
        Serializer::new(|data, configs| configs.body_decoder().decode::<T>(&data))
    }
}

/// Turns a typed value into request body bytes plus an optional content type.
///
/// A `None` content type leaves the request's `Content-Type` header alone.
pub struct ContentSerializer<T> {
    serialize: Arc<ContentFn<T>>,
}

impl<T> Clone for ContentSerializer<T> {
    fn clone(&self) -> Self {
        ContentSerializer {
            serialize: self.serialize.clone(),
        }
    }
}

impl<T> fmt::Debug for ContentSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSerializer").finish_non_exhaustive()
    }
}

impl<T: 'static> ContentSerializer<T> {
    /// Wrap a serialize function.
    pub fn new<F>(serialize: F) -> Self
    where
        F: Fn(&T, &Configs) -> Result<(Bytes, Option<ContentType>)> + Send + Sync + 'static,
    {
        ContentSerializer {
            serialize: Arc::new(serialize),
        }
    }

    /// Run the serializer.
    pub fn serialize(&self, value: &T, configs: &Configs) -> Result<(Bytes, Option<ContentType>)> {
        (self.serialize)(value, configs)
    }
}

impl<T: Serialize + 'static> ContentSerializer<T> {
    /// Encode with the snapshot's body encoder.
    pub fn encodable() -> Self {
        ContentSerializer::new(|value, configs| {
            let encoder = configs.body_encoder();
            let bytes = encoder.encode_serialize(value)?;
            Ok((bytes, Some(encoder.content_type())))
        })
    }

    /// Encode with a fixed encoder, ignoring the snapshot.
    pub fn encoder(encoder: Arc<dyn ContentEncoder>) -> Self {
        ContentSerializer::new(move |value, _| {
            let bytes = encoder.encode_serialize(value)?;
            Ok((bytes, Some(encoder.content_type())))
        })
    }

    /// `application/x-www-form-urlencoded` body.
    pub fn form() -> Self {
        Self::encoder(Arc::new(FormUrlEncoder::default()))
    }
}

impl ContentSerializer<Value> {
    /// Raw JSON bytes of an untyped value.
    pub fn json() -> Self {
        Self::encoder(Arc::new(JsonEncoder::default()))
    }
}

impl ContentSerializer<Bytes> {
    /// Bytes passed through with no content type.
    pub fn bytes() -> Self {
        ContentSerializer::new(|value: &Bytes, _| Ok((value.clone(), None)))
    }
}

impl ContentSerializer<String> {
    /// `text/plain;charset=utf-8`
    pub fn text() -> Self {
        ContentSerializer::new(|value: &String, _| {
            Ok((
                Bytes::from(value.clone()),
                Some(ContentType::text_plain(Some("utf-8"))),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BodyEncoderKey;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Pet {
        name: String,
    }

    #[test]
    fn test_decodable() {
        let pet = Serializer::<Pet>::decodable()
            .serialize(Bytes::from_static(br#"{"name":"Rex"}"#), &Configs::new())
            .unwrap();
        assert_eq!(pet, Pet { name: "Rex".into() });
    }

    #[test]
    fn test_void_skips_parsing() {
        assert!(Serializer::void()
            .serialize(Bytes::new(), &Configs::new())
            .is_ok());
    }

    #[test]
    fn test_text_rejects_invalid_utf8() {
        let result = Serializer::text().serialize(Bytes::from_static(&[0xff, 0xfe]), &Configs::new());
        assert!(matches!(result, Err(NetError::Decode(_))));
    }

    #[test]
    fn test_json_serializer() {
        let value = Serializer::json()
            .serialize(Bytes::from_static(b"[1,2]"), &Configs::new())
            .unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[test]
    fn test_encodable_follows_snapshot() {
        let mut configs = Configs::new();
        let (body, ct) = ContentSerializer::encodable()
            .serialize(&Pet { name: "Rex".into() }, &configs)
            .unwrap();
        assert_eq!(&body[..], br#"{"name":"Rex"}"#);
        assert_eq!(ct, Some(ContentType::json()));

        configs.set::<BodyEncoderKey>(Arc::new(FormUrlEncoder::default()));
        let (body, ct) = ContentSerializer::encodable()
            .serialize(&Pet { name: "Rex".into() }, &configs)
            .unwrap();
        assert_eq!(&body[..], b"name=Rex");
        assert_eq!(ct, Some(ContentType::form_url_encoded()));
    }

    #[test]
    fn test_bytes_pass_through() {
        let (body, ct) = ContentSerializer::bytes()
            .serialize(&Bytes::from_static(b"\x00\x01"), &Configs::new())
            .unwrap();
        assert_eq!(&body[..], b"\x00\x01");
        assert!(ct.is_none());
    }
}
