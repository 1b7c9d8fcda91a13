//! Authorization modifiers gated by a snapshot switch.
//!
//! [`NetworkClient::auth`] appends a request step that runs the modifier only
//! if [`Configs::is_auth_enabled`] holds in the final snapshot. Because
//! configuration steps replay before request steps, a later
//! [`NetworkClient::disable_auth`] suppresses an earlier `auth(...)` and a
//! later `enable_auth(true)` revives it.
//!
//! # Examples
//!
//! ```
//! use netclient::{AuthModifier, NetworkClient};
//!
//! let api = NetworkClient::new("https://example.com").auth(AuthModifier::bearer("t0k3n"));
//! let request = api.request().unwrap();
//! assert_eq!(request.header("authorization"), Some("Bearer t0k3n"));
//!
//! let public = api.disable_auth().request().unwrap();
//! assert_eq!(public.header("authorization"), None);
//! ```

use super::NetworkClient;
use crate::config::{ConfigKey, Configs};
use crate::error::Result;
use crate::protocol::HeaderMode;
use crate::types::HttpRequest;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use std::fmt;
use std::sync::Arc;

/// Setting: whether auth modifiers apply. Defaults to `false`.
pub struct AuthEnabledKey;

impl ConfigKey for AuthEnabledKey {
    type Value = bool;
}

impl Configs {
    /// Whether auth modifiers apply.
    pub fn is_auth_enabled(&self) -> bool {
        self.get::<AuthEnabledKey>().unwrap_or(false)
    }
}

type ModifyFn = dyn Fn(&mut HttpRequest, &Configs) -> Result<()> + Send + Sync;

/// Adds credentials to a request.
#[derive(Clone)]
pub struct AuthModifier {
    modify: Arc<ModifyFn>,
}

impl AuthModifier {
    /// Custom modifier.
    pub fn new<F>(modify: F) -> Self
    where
        F: Fn(&mut HttpRequest, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        AuthModifier {
            modify: Arc::new(modify),
        }
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::header(AUTHORIZATION.as_str(), format!("Bearer {}", token.into()))
    }

    /// `Authorization: Basic base64(<username>:<password>)`
    pub fn basic(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        Self::header(
            AUTHORIZATION.as_str(),
            format!("Basic {}", STANDARD.encode(credentials)),
        )
    }

    /// API key in a custom header, e.g. `X-API-Key`.
    pub fn api_key(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self::header(header, key)
    }

    fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        Self::new(move |request, _| request.set_header(&name, &value, HeaderMode::Set))
    }

    /// Apply the credentials.
    pub fn modify(&self, request: &mut HttpRequest, configs: &Configs) -> Result<()> {
        (self.modify)(request, configs)
    }
}

impl fmt::Debug for AuthModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthModifier").finish_non_exhaustive()
    }
}

impl NetworkClient {
    /// Enable auth and apply `modifier` when the final snapshot has auth enabled.
    #[must_use]
    pub fn auth(&self, modifier: AuthModifier) -> Self {
        self.enable_auth(true)
            .modify_request_with_configs(move |request, configs| {
                if configs.is_auth_enabled() {
                    modifier.modify(request, configs)?;
                }
                Ok(())
            })
    }

    /// Turn auth modifiers on or off.
    #[must_use]
    pub fn enable_auth(&self, enabled: bool) -> Self {
        self.config::<AuthEnabledKey>(enabled)
    }

    /// Turn auth modifiers off.
    #[must_use]
    pub fn disable_auth(&self) -> Self {
        self.enable_auth(false)
    }
}
