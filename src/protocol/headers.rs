//! Header mutation shared by every header-writing modifier.
//!
//! Request headers are a multiset: [`HeaderMode::Add`] appends another value for
//! the same name, [`HeaderMode::Set`] drops every earlier value first.
//!
//! # Examples
//!
//! ```
//! use http::HeaderMap;
//! use netclient::protocol::{apply_header, HeaderMode};
//!
//! let mut headers = HeaderMap::new();
//! apply_header(&mut headers, "Accept", "text/html", HeaderMode::Add).unwrap();
//! apply_header(&mut headers, "Accept", "application/json", HeaderMode::Add).unwrap();
//! assert_eq!(headers.get_all("accept").iter().count(), 2);
//!
//! apply_header(&mut headers, "Accept", "*/*", HeaderMode::Set).unwrap();
//! assert_eq!(headers.get_all("accept").iter().count(), 1);
//! ```

use crate::error::Result;
use http::header::{HeaderMap, HeaderName, HeaderValue};

/// How a header value combines with earlier values for the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    /// Append a value, keeping earlier ones.
    Add,
    /// Replace every earlier value.
    #[default]
    Set,
}

/// Write a header into `headers` according to `mode`.
///
/// # Errors
///
/// Returns [`NetError::InvalidHeader`](crate::NetError::InvalidHeader) if the
/// name or value is not valid HTTP.
pub fn apply_header(headers: &mut HeaderMap, name: &str, value: &str, mode: HeaderMode) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes())?;
    let value = HeaderValue::from_str(value)?;
    match mode {
        HeaderMode::Add => {
            headers.append(name, value);
        }
        HeaderMode::Set => {
            headers.insert(name, value);
        }
    }
    Ok(())
}
