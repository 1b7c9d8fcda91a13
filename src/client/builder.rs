//! The immutable request builder.
//!
//! A [`NetworkClient`] is a base-request factory plus two ordered step lists:
//! configuration steps and request steps. Modifiers never touch `self`; they
//! return a copy with one more step appended. Nothing runs until a terminal
//! operation materializes the client:
//!
//! ```text
//! Configs::new() ──config steps──▶ snapshot
//! snapshot ──base──▶ HttpRequest ──request steps──▶ materialized request
//! ```
//!
//! Configuration steps are replayed before any request step, so a request step
//! always observes the final snapshot regardless of where it sits in the chain.

use crate::config::{ConfigKey, Configs};
use crate::error::{NetError, Result};
use crate::types::HttpRequest;
use std::fmt;
use std::sync::Arc;
use url::Url;

type BaseFn = dyn Fn(&Configs) -> Result<HttpRequest> + Send + Sync;
type RequestStep = dyn Fn(&mut HttpRequest, &Configs) -> Result<()> + Send + Sync;
type ConfigStep = dyn Fn(&mut Configs) + Send + Sync;

/// Reusable, immutable description of how to build and execute a request.
///
/// Cheap to clone; clones share their steps.
///
/// # Examples
///
/// ```
/// use netclient::NetworkClient;
///
/// let pets = NetworkClient::new("https://petstore.example.com/v2").path("pet");
/// let one = pets.path(42);
///
/// assert_eq!(pets.request().unwrap().url.as_str(), "https://petstore.example.com/v2/pet");
/// assert_eq!(one.request().unwrap().url.as_str(), "https://petstore.example.com/v2/pet/42");
/// ```
#[derive(Clone)]
pub struct NetworkClient {
    base: Arc<BaseFn>,
    request_steps: Vec<Arc<RequestStep>>,
    config_steps: Vec<Arc<ConfigStep>>,
}

impl NetworkClient {
    /// Client rooted at a base URL.
    ///
    /// An unparsable URL is reported as
    /// [`NetError::RequestCreationFailed`] by the first terminal operation.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self::from_factory(move |_| {
            let url = Url::parse(&base_url)
                .map_err(|err| NetError::RequestCreationFailed(Box::new(err)))?;
            Ok(HttpRequest::new(url))
        })
    }

    /// Client rooted at a parsed URL.
    pub fn from_url(url: Url) -> Self {
        Self::from_request(HttpRequest::new(url))
    }

    /// Client starting from a fixed request template.
    pub fn from_request(request: HttpRequest) -> Self {
        Self::from_factory(move |_| Ok(request.clone()))
    }

    /// Client whose base request is computed from the snapshot.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(&Configs) -> Result<HttpRequest> + Send + Sync + 'static,
    {
        NetworkClient {
            base: Arc::new(factory),
            request_steps: Vec::new(),
            config_steps: Vec::new(),
        }
    }

    /// Append a request step.
    #[must_use]
    pub fn modify_request<F>(&self, step: F) -> Self
    where
        F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
    {
        self.modify_request_with_configs(move |request, _| step(request))
    }

    /// Append a request step that reads the snapshot.
    #[must_use]
    pub fn modify_request_with_configs<F>(&self, step: F) -> Self
    where
        F: Fn(&mut HttpRequest, &Configs) -> Result<()> + Send + Sync + 'static,
    {
        let mut result = self.clone();
        result.request_steps.push(Arc::new(step));
        result
    }

    /// Append a configuration step.
    #[must_use]
    pub fn configs<F>(&self, step: F) -> Self
    where
        F: Fn(&mut Configs) + Send + Sync + 'static,
    {
        let mut result = self.clone();
        result.config_steps.push(Arc::new(step));
        result
    }

    /// Set one configuration value.
    #[must_use]
    pub fn config<K: ConfigKey>(&self, value: K::Value) -> Self {
        self.configs(move |configs| configs.set::<K>(value.clone()))
    }

    /// Replay the configuration steps into a fresh snapshot.
    pub fn snapshot(&self) -> Configs {
        let mut configs = Configs::new();
        for step in &self.config_steps {
            step(&mut configs);
        }
        configs
    }

    /// Build the request and its snapshot.
    ///
    /// # Errors
    ///
    /// Any step failure, wrapped as [`NetError::RequestCreationFailed`].
    pub fn materialize(&self) -> Result<(HttpRequest, Configs)> {
        let configs = self.snapshot();
        let request = self.build_request(&configs)?;
        Ok((request, configs))
    }

    /// Build the request without executing it.
    pub fn request(&self) -> Result<HttpRequest> {
        self.materialize().map(|(request, _)| request)
    }

    /// Run `operation` against a fresh snapshot.
    pub fn with_configs<R>(&self, operation: impl FnOnce(&Configs) -> R) -> R {
        operation(&self.snapshot())
    }

    /// Run `operation` against the materialized request and its snapshot.
    pub fn with_request<R>(
        &self,
        operation: impl FnOnce(&HttpRequest, &Configs) -> Result<R>,
    ) -> Result<R> {
        let (request, configs) = self.materialize()?;
        operation(&request, &configs)
    }

    pub(crate) fn build_request(&self, configs: &Configs) -> Result<HttpRequest> {
        let mut request = (self.base)(configs).map_err(NetError::into_creation_failure)?;
        for step in &self.request_steps {
            step(&mut request, configs).map_err(NetError::into_creation_failure)?;
        }
        Ok(request)
    }
}

impl fmt::Debug for NetworkClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkClient")
            .field("request_steps", &self.request_steps.len())
            .field("config_steps", &self.config_steps.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HttpMethod;

    struct Marker;
    impl ConfigKey for Marker {
        type Value = u8;
    }

    #[test]
    fn test_invalid_base_url_fails_lazily() {
        let client = NetworkClient::new("not a url");
        assert!(matches!(
            client.request(),
            Err(NetError::RequestCreationFailed(_))
        ));
    }

    #[test]
    fn test_modifiers_do_not_mutate() {
        let base = NetworkClient::new("https://example.com");
        let _post = base.modify_request(|request| {
            request.method = HttpMethod::POST;
            Ok(())
        });
        assert_eq!(base.request().unwrap().method, HttpMethod::GET);
    }

    #[test]
    fn test_request_steps_see_final_snapshot() {
        let client = NetworkClient::new("https://example.com")
            .modify_request_with_configs(|request, configs| {
                let marker = configs.get::<Marker>().unwrap_or_default();
                request.url.set_path(&format!("/m{}", marker));
                Ok(())
            })
            .config::<Marker>(1)
            .config::<Marker>(2);
        assert_eq!(client.request().unwrap().url.path(), "/m2");
    }

    #[test]
    fn test_step_error_becomes_creation_failure() {
        let client = NetworkClient::new("https://example.com")
            .modify_request(|_| Err(NetError::InvalidHeader("bad".into())));
        assert!(matches!(
            client.request(),
            Err(NetError::RequestCreationFailed(_))
        ));
    }

    #[test]
    fn test_with_request() {
        let client = NetworkClient::new("https://example.com/a").config::<Marker>(9);
        let seen = client
            .with_request(|request, configs| {
                Ok((request.url.path().to_string(), configs.get::<Marker>()))
            })
            .unwrap();
        assert_eq!(seen, ("/a".to_string(), Some(9)));
    }
}
