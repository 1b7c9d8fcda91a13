//! Protocol-level helpers shared by the builder, transports and decorators.
//!
//! - **[headers]** - header update modes and header map mutation
//! - status classification and retry backoff
//! - URL scheme rewriting for WebSocket upgrades

pub mod headers;

pub use headers::{apply_header, HeaderMode};

use std::time::Duration;
use url::Url;

/// Default accepted status range for [`ResponseValidator::status_code`](crate::ResponseValidator::status_code).
pub const SUCCESS_STATUS: std::ops::RangeInclusive<u16> = 200..=299;

/// Check if a status code lies in the 2xx range.
#[inline]
pub fn is_success_status(status: u16) -> bool {
    SUCCESS_STATUS.contains(&status)
}

/// Check if status code indicates a retryable error.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
}

/// Exponential backoff delay: `base * 2^attempt`, exponent capped at 10.
///
/// # Examples
///
/// ```
/// use netclient::protocol::exponential_backoff;
/// use std::time::Duration;
///
/// assert_eq!(exponential_backoff(0, Duration::from_millis(100)), Duration::from_millis(100));
/// assert_eq!(exponential_backoff(2, Duration::from_millis(100)), Duration::from_millis(400));
/// ```
pub fn exponential_backoff(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.pow(attempt.min(10)))
}

/// Rewrite `http`/`https` URLs to `ws`/`wss`, leaving other schemes untouched.
pub fn websocket_url(url: &Url) -> Url {
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return url.clone(),
    };
    let rewritten = format!("{}{}", scheme, &url.as_str()[url.scheme().len()..]);
    Url::parse(&rewritten).unwrap_or_else(|_| url.clone())
}
