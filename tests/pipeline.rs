//! End-to-end tests of the ingestion pipeline over a real socket.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use collector_sdk::{CollectRequest, CollectorClient};
use cookie_collector::storage::{IngestionStore, MemoryStore};
use serde_json::{json, Value};

mod common;
use common::{start_server, test_config, API_KEY, ORIGIN};

#[tokio::test]
async fn test_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;
    let client = CollectorClient::new(&server.url()).with_api_key(API_KEY);

    let before = Utc::now();
    let receipt = client
        .collect(&CollectRequest {
            site_identifier: "example.com".into(),
            cookies: vec![json!({"name": "a", "value": "1"})],
            collected_at: None,
        })
        .await
        .expect("collect failed");

    assert!(receipt.success);
    assert_eq!(receipt.count, 1);

    let records = client.recent().await.expect("logs failed");
    let first = &records[0];
    assert_eq!(first.id, receipt.id);
    assert_eq!(first.site_identifier, "example.com");
    assert_eq!(first.cookies, vec![json!({"name": "a", "value": "1"})]);

    let collected_at: DateTime<Utc> = first.collected_at.parse().unwrap();
    assert!(collected_at >= before, "{} < {}", collected_at, before);
}

#[tokio::test]
async fn test_missing_or_wrong_key_creates_nothing() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;
    let body = json!({"site_identifier": "example.com", "cookies": []});

    let anonymous = CollectorClient::new(&server.url());
    let res = anonymous.post_collect(&body).await.unwrap();
    assert_eq!(res.status(), 401);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["error"], "unauthorized");

    let wrong = CollectorClient::new(&server.url()).with_api_key("not-the-key");
    assert_eq!(wrong.post_collect(&body).await.unwrap().status(), 401);
    assert_eq!(wrong.get_logs().await.unwrap().status(), 401);

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_non_array_cookies_rejected() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;
    let client = CollectorClient::new(&server.url()).with_api_key(API_KEY);

    for cookies in [json!("a=1; b=2"), json!({"a": "1"}), json!(42), Value::Null] {
        let res = client
            .post_collect(&json!({"site_identifier": "example.com", "cookies": cookies}))
            .await
            .unwrap();
        assert_eq!(res.status(), 400, "cookies = {}", cookies);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["error"], "invalid payload");
    }

    let res = client
        .post_collect(&json!({"site_identifier": "", "cookies": []}))
        .await
        .unwrap();
    assert_eq!(res.status(), 400);

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_legacy_field_names_accepted() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;
    let client = CollectorClient::new(&server.url()).with_api_key(API_KEY);

    let res = client
        .post_collect(&json!({"host": "legacy.example", "cookies": [{"name": "x"}]}))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let records = store.recent(1).await.unwrap();
    assert_eq!(records[0].site_identifier, "legacy.example");
}

#[tokio::test]
async fn test_identical_submissions_are_not_deduplicated() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;
    let client = CollectorClient::new(&server.url()).with_api_key(API_KEY);

    let request = CollectRequest {
        site_identifier: "example.com".into(),
        cookies: vec![json!({"name": "a", "value": "1"})],
        collected_at: None,
    };
    let first = client.collect(&request).await.unwrap();
    let second = client.collect(&request).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_logs_bounded_and_ordered() {
    let mut config = test_config();
    config.storage.recent_limit = 5;
    config.rate_limit.enabled = false;

    let store = Arc::new(MemoryStore::new());
    let server = start_server(config, store.clone()).await;
    let client = CollectorClient::new(&server.url()).with_api_key(API_KEY);

    // Caller-supplied timestamps, deliberately out of order
    for minute in [3, 11, 7, 1, 9, 5, 10, 2] {
        client
            .collect(&CollectRequest {
                site_identifier: format!("site-{}", minute),
                cookies: vec![],
                collected_at: Some(format!("2025-01-01T00:{:02}:00Z", minute)),
            })
            .await
            .unwrap();
    }

    let records = client.recent().await.unwrap();
    assert_eq!(records.len(), 5);

    let sites: Vec<_> = records.iter().map(|r| r.site_identifier.as_str()).collect();
    assert_eq!(sites, vec!["site-11", "site-10", "site-9", "site-7", "site-5"]);

    let times: Vec<DateTime<Utc>> = records.iter().map(|r| r.collected_at.parse().unwrap()).collect();
    assert!(times.windows(2).all(|w| w[0] > w[1]));
}

#[tokio::test]
async fn test_empty_logs() {
    let server = start_server(test_config(), Arc::new(MemoryStore::new())).await;
    let client = CollectorClient::new(&server.url()).with_api_key(API_KEY);

    let res = client.get_logs().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_disallowed_origin_never_gets_cors_headers() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;
    let client = CollectorClient::new(&server.url())
        .with_api_key(API_KEY)
        .with_origin("https://evil.example");

    // Valid and invalid payloads alike
    for body in [
        json!({"site_identifier": "example.com", "cookies": []}),
        json!({"site_identifier": "example.com", "cookies": "nope"}),
    ] {
        let res = client.post_collect(&body).await.unwrap();
        assert_eq!(res.status(), 403);
        assert!(res.headers().get("access-control-allow-origin").is_none());
    }

    let res = client.preflight("/collect").await.unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_none());

    assert!(store.is_empty());
}

#[tokio::test]
async fn test_allowed_origin_preflight_and_request() {
    let store = Arc::new(MemoryStore::new());
    let server = start_server(test_config(), store.clone()).await;

    // Preflight carries no key and still succeeds
    let browser = CollectorClient::new(&server.url()).with_origin(ORIGIN);
    let res = browser.preflight("/collect").await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], ORIGIN);
    let allowed_headers = res.headers()["access-control-allow-headers"].to_str().unwrap();
    assert!(allowed_headers.contains("x-api-key"));

    let browser = browser.with_api_key(API_KEY);
    let res = browser
        .post_collect(&json!({"site_identifier": "example.com", "cookies": []}))
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], ORIGIN);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_liveness_and_request_id() {
    let server = start_server(test_config(), Arc::new(MemoryStore::new())).await;
    let client = CollectorClient::new(&server.url());
    assert_eq!(client.liveness().await.unwrap(), "cookie-collector is running");

    let res = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("{}/", server.url()))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");
}
