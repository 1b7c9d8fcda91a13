use crate::config::{ConfigKey, Configs};
use crate::error::{NetError, Result};
use serde_json::Value;
use std::sync::Arc;

/// Encodes a value into URL query items.
pub trait QueryEncoder: Send + Sync + 'static {
    /// Flatten a JSON-model value into `(name, value)` pairs.
    fn encode(&self, value: &Value) -> Result<Vec<(String, String)>>;
}

/// Setting: encoder used by [`NetworkClient::query`](crate::NetworkClient::query).
pub struct QueryEncoderKey;

impl ConfigKey for QueryEncoderKey {
    type Value = Arc<dyn QueryEncoder>;
}

impl Configs {
    /// Query encoder, [`UrlQueryEncoder::default`] when unset.
    pub fn query_encoder(&self) -> Arc<dyn QueryEncoder> {
        self.get::<QueryEncoderKey>()
            .unwrap_or_else(|| Arc::new(UrlQueryEncoder::default()))
    }
}

/// How arrays are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayEncoding {
    /// `tags=a,b`
    #[default]
    CommaSeparated,
    /// `tags=a&tags=b`
    RepeatedKey,
    /// `tags[]=a&tags[]=b`
    Brackets,
}

/// How nested objects are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NestedEncoding {
    /// `filter.kind=cat`
    #[default]
    Point,
    /// `filter[kind]=cat`
    Brackets,
}

/// Standard URL query encoder.
///
/// Object entries are emitted sorted by key at every level, so the same input
/// always yields the same item order. `null` values are skipped.
///
/// # Examples
///
/// ```
/// use netclient::codec::{QueryEncoder, UrlQueryEncoder};
/// use serde_json::json;
///
/// let items = UrlQueryEncoder::default()
///     .encode(&json!({"b": 1, "a": 2}))
///     .unwrap();
/// assert_eq!(items, vec![("a".into(), "2".into()), ("b".into(), "1".into())]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlQueryEncoder {
    /// Array rule.
    pub arrays: ArrayEncoding,
    /// Nested object rule.
    pub nested: NestedEncoding,
}

impl UrlQueryEncoder {
    fn flatten(&self, key: &str, value: &Value, out: &mut Vec<(String, String)>) {
        match value {
            Value::Null => {}
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                for (child, value) in entries {
                    let child_key = match self.nested {
                        NestedEncoding::Point => format!("{}.{}", key, child),
                        NestedEncoding::Brackets => format!("{}[{}]", key, child),
                    };
                    self.flatten(&child_key, value, out);
                }
            }
            Value::Array(items) => match self.arrays {
                ArrayEncoding::CommaSeparated => {
                    let joined = items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(scalar_string)
                        .collect::<Vec<_>>()
                        .join(",");
                    out.push((key.to_string(), joined));
                }
                ArrayEncoding::RepeatedKey => {
                    for item in items {
                        self.flatten(key, item, out);
                    }
                }
                ArrayEncoding::Brackets => {
                    let bracketed = format!("{}[]", key);
                    for item in items {
                        self.flatten(&bracketed, item, out);
                    }
                }
            },
            scalar => out.push((key.to_string(), scalar_string(scalar))),
        }
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl QueryEncoder for UrlQueryEncoder {
    fn encode(&self, value: &Value) -> Result<Vec<(String, String)>> {
        let map = match value {
            Value::Null => return Ok(Vec::new()),
            Value::Object(map) => map,
            other => {
                return Err(NetError::encode(format!(
                    "query value must be an object, got {}",
                    other
                )))
            }
        };

        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut out = Vec::new();
        for (key, value) in entries {
            self.flatten(key, value, &mut out);
        }
        Ok(out)
    }
}
