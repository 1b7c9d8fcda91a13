use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// HTTP method token, normalized to upper case at construction.
///
/// Equality is value equality on the normalized token.
///
/// # Examples
///
/// ```
/// use netclient::HttpMethod;
///
/// assert_eq!(HttpMethod::new("patch"), HttpMethod::PATCH);
/// assert_eq!(HttpMethod::from("Get").as_str(), "GET");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpMethod(Cow<'static, str>);

impl HttpMethod {
    /// `GET`
    pub const GET: HttpMethod = HttpMethod(Cow::Borrowed("GET"));
    /// `PUT`
    pub const PUT: HttpMethod = HttpMethod(Cow::Borrowed("PUT"));
    /// `POST`
    pub const POST: HttpMethod = HttpMethod(Cow::Borrowed("POST"));
    /// `DELETE`
    pub const DELETE: HttpMethod = HttpMethod(Cow::Borrowed("DELETE"));
    /// `OPTIONS`
    pub const OPTIONS: HttpMethod = HttpMethod(Cow::Borrowed("OPTIONS"));
    /// `HEAD`
    pub const HEAD: HttpMethod = HttpMethod(Cow::Borrowed("HEAD"));
    /// `PATCH`
    pub const PATCH: HttpMethod = HttpMethod(Cow::Borrowed("PATCH"));
    /// `TRACE`
    pub const TRACE: HttpMethod = HttpMethod(Cow::Borrowed("TRACE"));

    /// Create a method from any token, upper-casing it.
    pub fn new(token: impl AsRef<str>) -> Self {
        HttpMethod(Cow::Owned(token.as_ref().trim().to_ascii_uppercase()))
    }

    /// The normalized token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to the `http` crate's method type used by transports.
    pub fn to_http(&self) -> std::result::Result<http::Method, http::method::InvalidMethod> {
        http::Method::from_bytes(self.0.as_bytes())
    }
}

impl Default for HttpMethod {
    fn default() -> Self {
        HttpMethod::GET
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HttpMethod {
    fn from(token: &str) -> Self {
        HttpMethod::new(token)
    }
}

impl From<String> for HttpMethod {
    fn from(token: String) -> Self {
        HttpMethod::new(token)
    }
}

impl From<http::Method> for HttpMethod {
    fn from(method: http::Method) -> Self {
        HttpMethod::new(method.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(HttpMethod::new(s))
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(HttpMethod::new(token))
    }
}
