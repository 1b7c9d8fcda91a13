//! Retry decorators.
//!
//! Both decorators re-send the same materialized request. A response counts as
//! failed when the transport errors or its status is outside `200..=299`; when
//! retries run out, the last error or the last response is returned as is.
//!
//! Every retry-type decorator in one execution draws from the same
//! [`RetryBudget`], so stacking `retry(2)` on `wait_for_connection(2)` still
//! allows at most two extra attempts. The pipeline installs a fresh budget for
//! each execution.

use super::reachability::ConnectivityService;
use super::transport::HttpClient;
use super::NetworkClient;
use crate::config::{ConfigKey, Configs};
use crate::error::Result;
use crate::protocol::{exponential_backoff, is_success_status};
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Retries consumed by one execution.
#[derive(Clone, Debug, Default)]
pub struct RetryBudget {
    used: Arc<AtomicU32>,
}

impl RetryBudget {
    /// Fresh budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one retry if fewer than `limit` were taken. `None` is unbounded.
    pub fn try_acquire(&self, limit: Option<u32>) -> bool {
        match limit {
            None => {
                self.used.fetch_add(1, Ordering::SeqCst);
                true
            }
            Some(limit) => self
                .used
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |used| {
                    (used < limit).then_some(used + 1)
                })
                .is_ok(),
        }
    }

    /// Retries taken so far.
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }
}

/// Setting: the budget shared by retry decorators.
pub struct RetryBudgetKey;

impl ConfigKey for RetryBudgetKey {
    type Value = RetryBudget;
}

impl Configs {
    /// Shared retry budget of this execution.
    ///
    /// Unset snapshots get a fresh, unshared budget on every call.
    pub fn retry_budget(&self) -> RetryBudget {
        self.get::<RetryBudgetKey>().unwrap_or_default()
    }
}

fn needs_retry(outcome: &Result<HttpResponse>) -> bool {
    match outcome {
        Ok(response) => !is_success_status(response.status),
        Err(_) => true,
    }
}

fn describe(outcome: &Result<HttpResponse>) -> String {
    match outcome {
        Ok(response) => format!("status {}", response.status),
        Err(err) => err.to_string(),
    }
}

/// Retries failed exchanges up to a bound, with optional exponential backoff.
pub struct RetryClient {
    base: Arc<dyn HttpClient>,
    limit: Option<u32>,
    backoff: Option<Duration>,
}

impl RetryClient {
    /// Wrap `base`. `limit` counts retries, not attempts.
    pub fn new(base: Arc<dyn HttpClient>, limit: Option<u32>) -> Self {
        RetryClient {
            base,
            limit,
            backoff: None,
        }
    }

    /// Sleep `base * 2^retry` before each retry.
    #[must_use]
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff = Some(base);
        self
    }
}

#[async_trait]
impl HttpClient for RetryClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        let budget = configs.retry_budget();
        let logger = configs.logger();
        let mut attempt = 0;
        loop {
            let outcome = self.base.send(request, configs).await;
            if !needs_retry(&outcome) || !budget.try_acquire(self.limit) {
                return outcome;
            }
            logger.warn(format_args!(
                "{} failed (attempt {}), retrying: {}",
                request,
                attempt + 1,
                describe(&outcome)
            ));
            if let Some(base) = self.backoff {
                sleep(exponential_backoff(attempt, base)).await;
            }
            attempt += 1;
        }
    }
}

/// Waits for connectivity before each attempt.
///
/// Retries like [`RetryClient`] while the budget lasts, and keeps retrying
/// past it for as long as the network is unreachable after a failure.
pub struct ConnectivityRetryClient {
    base: Arc<dyn HttpClient>,
    limit: Option<u32>,
    service: Arc<dyn ConnectivityService>,
}

impl ConnectivityRetryClient {
    /// Wrap `base`.
    pub fn new(
        base: Arc<dyn HttpClient>,
        limit: Option<u32>,
        service: Arc<dyn ConnectivityService>,
    ) -> Self {
        ConnectivityRetryClient {
            base,
            limit,
            service,
        }
    }
}

#[async_trait]
impl HttpClient for ConnectivityRetryClient {
    async fn send(&self, request: &HttpRequest, configs: &Configs) -> Result<HttpResponse> {
        let budget = configs.retry_budget();
        let logger = configs.logger();
        let mut attempt = 0_u32;
        loop {
            if !self.service.is_reachable() {
                logger.debug(format_args!("{} waiting for connectivity", request));
                self.service.wait_reachable().await;
            }

            let outcome = self.base.send(request, configs).await;
            if !needs_retry(&outcome) {
                return outcome;
            }
            let offline = !self.service.is_reachable();
            if !offline && !budget.try_acquire(self.limit) {
                return outcome;
            }
            attempt += 1;
            logger.warn(format_args!(
                "{} failed (attempt {}{}), retrying: {}",
                request,
                attempt,
                if offline { ", offline" } else { "" },
                describe(&outcome)
            ));
        }
    }
}

impl NetworkClient {
    /// Retry failed exchanges. `limit` counts retries; `None` is unbounded.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Up to three attempts in total.
    /// let pets = api.retry(2).decodable::<Vec<Pet>>().await?;
    /// ```
    #[must_use]
    pub fn retry(&self, limit: impl Into<Option<u32>>) -> Self {
        let limit = limit.into();
        self.map_http_client(move |base| Arc::new(RetryClient::new(base, limit)))
    }

    /// Retry failed exchanges, sleeping `base * 2^retry` in between.
    #[must_use]
    pub fn retry_with_backoff(&self, limit: impl Into<Option<u32>>, base: Duration) -> Self {
        let limit = limit.into();
        self.map_http_client(move |inner| Arc::new(RetryClient::new(inner, limit).with_backoff(base)))
    }

    /// Wait for connectivity before sending, and retry while offline.
    #[must_use]
    pub fn wait_for_connection(
        &self,
        limit: impl Into<Option<u32>>,
        service: Arc<dyn ConnectivityService>,
    ) -> Self {
        let limit = limit.into();
        self.map_http_client(move |base| {
            Arc::new(ConnectivityRetryClient::new(base, limit, service.clone()))
        })
    }
}
