//! Cross-module behavior of the builder and the HTTP pipeline.

use crate::client::{FnHttpClient, HttpClientKey};
use crate::config::{ConfigKey, Configs};
use crate::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Region;

impl ConfigKey for Region {
    type Value = String;
}

fn counting(status: u16) -> (Arc<AtomicUsize>, FnHttpClient) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let client = FnHttpClient::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        if status == 0 {
            Err(NetError::TransportFailed("connection refused".into()))
        } else {
            Ok(HttpResponse::new(status, ""))
        }
    });
    (calls, client)
}

#[test]
fn test_builder_immutability() {
    let base = NetworkClient::new("https://example.com").path("pets");
    let before = base.request().unwrap();

    let _derived = base
        .path("1")
        .post()
        .header("X-Trace", "abc")
        .query(json!({"q": 1}))
        .body(json!({"name": "Rex"}));

    let after = base.request().unwrap();
    assert_eq!(before.url, after.url);
    assert_eq!(before.method, after.method);
    assert!(after.headers.is_empty());
    assert!(after.body.is_none());
}

#[test]
fn test_config_override_shadowing() {
    let client = NetworkClient::new("https://example.com")
        .config::<Region>("eu".to_string())
        .config::<Region>("us".to_string());
    assert_eq!(client.snapshot().get::<Region>().as_deref(), Some("us"));
}

#[test]
fn test_auth_toggling() {
    let disabled = NetworkClient::new("https://example.com")
        .auth(AuthModifier::bearer("secret"))
        .disable_auth();
    assert!(disabled.request().unwrap().header("authorization").is_none());

    let enabled = disabled.enable_auth(true);
    assert_eq!(
        enabled.request().unwrap().header("authorization"),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_retry_limit_two_makes_three_attempts() {
    let (calls, transport) = counting(0);
    let err = NetworkClient::new("https://example.com")
        .http_client(transport)
        .retry(2)
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::TransportFailed(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_budget_is_per_execution() {
    let (calls, transport) = counting(503);
    let client = NetworkClient::new("https://example.com")
        .http_client(transport)
        .retry(1)
        .validate_status_code();

    for _ in 0..2 {
        let err = client.send().await.unwrap_err();
        assert!(matches!(err, NetError::InvalidStatusCode(503)));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_stacked_retries_share_budget() {
    let (calls, transport) = counting(0);
    let _ = NetworkClient::new("https://example.com")
        .http_client(transport)
        .retry(2)
        .wait_for_connection(2, Arc::new(AlwaysReachable))
        .send()
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_concurrent_executions_share_builder() {
    let client = NetworkClient::new("https://example.com")
        .http_client(FnHttpClient::new(|request, _| {
            Ok(HttpResponse::ok(request.url.query().unwrap_or_default().to_string()))
        }));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let client = client.query_item("n", Some(i));
            tokio::spawn(async move { client.text().await })
        })
        .collect();

    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap().unwrap(), format!("n={}", i));
    }
}

#[tokio::test]
async fn test_transport_override_in_snapshot() {
    let (calls, transport) = counting(200);
    let transport: Arc<dyn HttpClient> = Arc::new(transport);
    let client = NetworkClient::new("https://example.com").config::<HttpClientKey>(transport);
    client.send().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let configs: Configs = client.snapshot();
    assert!(configs.contains::<HttpClientKey>());
}
