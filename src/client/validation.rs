//! Pre-flight request validation and response validation.
//!
//! Validators live in the snapshot. Adding one composes it after whatever was
//! configured before, so every validator in the chain must pass.

use super::NetworkClient;
use crate::config::{ConfigKey, Configs};
use crate::error::{NetError, Result};
use crate::protocol::SUCCESS_STATUS;
use crate::types::{HttpRequest, HttpResponse};
use std::fmt;
use std::ops::RangeBounds;
use std::sync::Arc;

type RequestCheck = dyn Fn(&HttpRequest, &Configs) -> Result<()> + Send + Sync;
type ResponseCheck = dyn Fn(&HttpResponse, &Configs) -> Result<()> + Send + Sync;

/// Checks a materialized request before any network call.
#[derive(Clone)]
pub struct RequestValidator {
    check: Arc<RequestCheck>,
}

impl RequestValidator {
    /// Custom validator.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&HttpRequest, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        RequestValidator {
            check: Arc::new(check),
        }
    }

    /// Accepts every request.
    pub fn always_success() -> Self {
        Self::new(|_, _| Ok(()))
    }

    /// Run the validator.
    pub fn validate(&self, request: &HttpRequest, configs: &Configs) -> Result<()> {
        (self.check)(request, configs)
    }

    /// Run `self`, then `next`.
    #[must_use]
    pub fn and_then(&self, next: RequestValidator) -> Self {
        let first = self.clone();
        Self::new(move |request, configs| {
            first.validate(request, configs)?;
            next.validate(request, configs)
        })
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::always_success()
    }
}

impl fmt::Debug for RequestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestValidator").finish_non_exhaustive()
    }
}

/// Checks a received response before it is serialized.
#[derive(Clone)]
pub struct ResponseValidator {
    check: Arc<ResponseCheck>,
}

impl ResponseValidator {
    /// Custom validator.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&HttpResponse, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        ResponseValidator {
            check: Arc::new(check),
        }
    }

    /// Accepts every response.
    pub fn always_success() -> Self {
        Self::new(|_, _| Ok(()))
    }

    /// Rejects statuses outside `200..=299` with [`NetError::InvalidStatusCode`].
    pub fn status_code() -> Self {
        Self::status_codes(SUCCESS_STATUS)
    }

    /// Rejects statuses outside `range` with [`NetError::InvalidStatusCode`].
    ///
    /// # Examples
    ///
    /// ```
    /// use netclient::{config::Configs, HttpResponse, ResponseValidator};
    ///
    /// let validator = ResponseValidator::status_codes(200..400);
    /// assert!(validator.validate(&HttpResponse::new(304, ""), &Configs::new()).is_ok());
    /// assert!(validator.validate(&HttpResponse::new(404, ""), &Configs::new()).is_err());
    /// ```
    pub fn status_codes<R>(range: R) -> Self
    where
        R: RangeBounds<u16> + Send + Sync + 'static,
    {
        Self::new(move |response, _| {
            if range.contains(&response.status) {
                Ok(())
            } else {
                Err(NetError::InvalidStatusCode(response.status))
            }
        })
    }

    /// Run the validator.
    pub fn validate(&self, response: &HttpResponse, configs: &Configs) -> Result<()> {
        (self.check)(response, configs)
    }

    /// Run `self`, then `next`.
    #[must_use]
    pub fn and_then(&self, next: ResponseValidator) -> Self {
        let first = self.clone();
        Self::new(move |response, configs| {
            first.validate(response, configs)?;
            next.validate(response, configs)
        })
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::always_success()
    }
}

impl fmt::Debug for ResponseValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseValidator").finish_non_exhaustive()
    }
}

/// Setting: active request validator.
pub struct RequestValidatorKey;

impl ConfigKey for RequestValidatorKey {
    type Value = RequestValidator;
}

/// Setting: active response validator.
pub struct ResponseValidatorKey;

impl ConfigKey for ResponseValidatorKey {
    type Value = ResponseValidator;
}

impl Configs {
    /// Request validator, accepting everything when unset.
    pub fn request_validator(&self) -> RequestValidator {
        self.get::<RequestValidatorKey>().unwrap_or_default()
    }

    /// Response validator, accepting everything when unset.
    pub fn response_validator(&self) -> ResponseValidator {
        self.get::<ResponseValidatorKey>().unwrap_or_default()
    }
}

impl NetworkClient {
    /// Add a request validator after the current one.
    #[must_use]
    pub fn request_validator(&self, validator: RequestValidator) -> Self {
        self.configs(move |configs| {
            let combined = configs.request_validator().and_then(validator.clone());
            configs.set::<RequestValidatorKey>(combined);
        })
    }

    /// Add a response validator after the current one.
    #[must_use]
    pub fn response_validator(&self, validator: ResponseValidator) -> Self {
        self.configs(move |configs| {
            let combined = configs.response_validator().and_then(validator.clone());
            configs.set::<ResponseValidatorKey>(combined);
        })
    }

    /// Reject responses outside `200..=299`.
    #[must_use]
    pub fn validate_status_code(&self) -> Self {
        self.response_validator(ResponseValidator::status_code())
    }

    /// Reject responses outside `range`.
    #[must_use]
    pub fn validate_status_codes<R>(&self, range: R) -> Self
    where
        R: RangeBounds<u16> + Send + Sync + 'static,
    {
        self.response_validator(ResponseValidator::status_codes(range))
    }
}
