//! Encode/decode extension points.
//!
//! Each contract is a single-operation trait selected from the
//! [`Configs`](crate::config::Configs) snapshot at execution time, with a
//! built-in default when nothing is configured:
//!
//! | Contract | Direction | Default |
//! |----------|-----------|---------|
//! | [`ContentEncoder`] | value → body bytes + content type | [`JsonEncoder`] |
//! | [`DataDecoder`] | body bytes → value | [`JsonDecoder`] |
//! | [`QueryEncoder`] | value → query items | [`UrlQueryEncoder`] |
//! | [`ErrorDecoder`] | failure body → structured error | [`NoneErrorDecoder`] |
//! | [`Serializer`] | response bytes → terminal result | chosen per call |
//! | [`ContentSerializer`] | typed value → body | chosen per call |
//!
//! Encoders and decoders work on [`serde_json::Value`] so they stay object
//! safe; typed values cross that boundary through `serde`.

mod decoder;
mod encoder;
mod error_decoder;
mod query;
mod serializer;

pub use decoder::{BodyDecoderKey, DataDecoder, JsonDecoder};
pub use encoder::{BodyEncoderKey, ContentEncoder, FormUrlEncoder, JsonEncoder};
pub use error_decoder::{DecodableErrorDecoder, ErrorDecoder, ErrorDecoderKey, NoneErrorDecoder};
pub use query::{ArrayEncoding, NestedEncoding, QueryEncoder, QueryEncoderKey, UrlQueryEncoder};
pub use serializer::{ContentSerializer, Serializer};
