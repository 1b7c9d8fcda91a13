use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Structured media type: `type/subtype;key=value;...`.
///
/// Parameters are kept in a sorted map so the canonical string form is
/// deterministic and parsing then formatting round-trips.
///
/// # Examples
///
/// ```
/// use netclient::ContentType;
///
/// let ct: ContentType = "application/json;charset=utf-8".parse().unwrap();
/// assert_eq!(ct.r#type, "application");
/// assert_eq!(ct.subtype, "json");
/// assert_eq!(ct.parameters.get("charset").map(String::as_str), Some("utf-8"));
/// assert_eq!(ct.to_string(), "application/json;charset=utf-8");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentType {
    /// Top-level type, e.g. `application`.
    pub r#type: String,
    /// Subtype, e.g. `json`.
    pub subtype: String,
    /// Parameters such as `charset` or `boundary`.
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Create a content type without parameters.
    pub fn new(r#type: impl Into<String>, subtype: impl Into<String>) -> Self {
        ContentType {
            r#type: r#type.into(),
            subtype: subtype.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add or replace a parameter.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Parse a header value. Missing type or subtype becomes `*`.
    pub fn parse(raw: &str) -> Self {
        let mut sections = raw.split(';');
        let essence = sections.next().unwrap_or_default().trim();
        let (r#type, subtype) = essence.split_once('/').unwrap_or((essence, ""));

        let parameters = sections
            .filter_map(|section| {
                let section = section.trim();
                if section.is_empty() {
                    return None;
                }
                let (key, value) = section.split_once('=').unwrap_or((section, ""));
                Some((
                    key.trim().to_string(),
                    value.trim_matches(|c| c == ' ' || c == '"').to_string(),
                ))
            })
            .collect();

        ContentType {
            r#type: non_empty_or_any(r#type),
            subtype: non_empty_or_any(subtype),
            parameters,
        }
    }

    /// `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        format!("{}/{}", self.r#type, self.subtype)
    }

    /// `application/json`
    pub fn json() -> Self {
        Self::new("application", "json")
    }

    /// `application/x-www-form-urlencoded`
    pub fn form_url_encoded() -> Self {
        Self::new("application", "x-www-form-urlencoded")
    }

    /// `application/octet-stream`
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// `text/plain`, optionally with a charset.
    pub fn text_plain(charset: Option<&str>) -> Self {
        let ct = Self::new("text", "plain");
        match charset {
            Some(charset) => ct.with_parameter("charset", charset),
            None => ct,
        }
    }

    /// `multipart/form-data`, optionally with a boundary.
    pub fn multipart_form_data(boundary: Option<&str>) -> Self {
        let ct = Self::new("multipart", "form-data");
        match boundary {
            Some(boundary) => ct.with_parameter("boundary", boundary),
            None => ct,
        }
    }

    /// `*/*`
    pub fn any() -> Self {
        Self::new("*", "*")
    }
}

fn non_empty_or_any(part: &str) -> String {
    let part = part.trim();
    if part.is_empty() {
        "*".to_string()
    } else {
        part.to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.r#type, self.subtype)?;
        for (key, value) in &self.parameters {
            write!(f, ";{}={}", key, value)?;
        }
        Ok(())
    }
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(ContentType::parse(s))
    }
}

impl From<&str> for ContentType {
    fn from(raw: &str) -> Self {
        ContentType::parse(raw)
    }
}

impl Serialize for ContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ContentType::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let raw = "application/json;charset=utf-8";
        assert_eq!(ContentType::parse(raw).to_string(), raw);
    }

    #[test]
    fn test_parameters_sorted() {
        let ct = ContentType::parse("multipart/form-data; charset=utf-8; boundary=\"xyz\"");
        assert_eq!(ct.to_string(), "multipart/form-data;boundary=xyz;charset=utf-8");
    }

    #[test]
    fn test_missing_parts() {
        let ct = ContentType::parse("");
        assert_eq!(ct, ContentType::any());
        let ct = ContentType::parse("text");
        assert_eq!(ct.essence(), "text/*");
    }

    #[test]
    fn test_constructors() {
        assert_eq!(ContentType::json().to_string(), "application/json");
        assert_eq!(
            ContentType::text_plain(Some("utf-8")).to_string(),
            "text/plain;charset=utf-8"
        );
        assert_eq!(
            ContentType::form_url_encoded().to_string(),
            "application/x-www-form-urlencoded"
        );
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ContentType::json()).unwrap();
        assert_eq!(json, "\"application/json\"");
        let ct: ContentType = serde_json::from_str("\"text/html;charset=ascii\"").unwrap();
        assert_eq!(ct, ContentType::new("text", "html").with_parameter("charset", "ascii"));
    }
}
