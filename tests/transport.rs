//! The reqwest transport against a local mock backend.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use api_monitor::config::MonitorConfig;
use api_monitor::model::HttpMethod;
use api_monitor::store::{InMemoryStore, Store};
use api_monitor::transport::{HttpTransport, ReqwestTransport, TransportError};
use api_monitor::{CycleKind, CycleReport, MonitoringEngine};

mod common;
use common::{closed_addr, endpoint, start_mock_backend, start_programmable_backend, MockReply};

fn transport(timeout: Duration, body_sample_bytes: usize) -> ReqwestTransport {
    ReqwestTransport::new(timeout, "api-monitor-test", body_sample_bytes).unwrap()
}

#[tokio::test]
async fn test_error_status_is_a_response() {
    let addr = start_mock_backend(MockReply::new(503, "down for maintenance")).await;
    let t = transport(Duration::from_secs(5), 2048);

    let response = t
        .perform(HttpMethod::Get, &format!("http://{addr}/health"))
        .await
        .unwrap();
    assert_eq!(response.status, 503);
    assert_eq!(response.body_sample.as_deref(), Some("down for maintenance"));
    assert_eq!(response.content_length, Some(20));
}

#[tokio::test]
async fn test_headers_are_captured_lowercased() {
    let addr = start_mock_backend(
        MockReply::new(200, r#"{"ok":true}"#)
            .header("Content-Type", "application/json")
            .header("X-Frame-Options", "DENY")
            .header("Set-Cookie", "a=1")
            .header("Set-Cookie", "b=2"),
    )
    .await;
    let t = transport(Duration::from_secs(5), 2048);

    let response = t
        .perform(HttpMethod::Post, &format!("http://{addr}/orders"))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(response.headers.get("x-frame-options").map(String::as_str), Some("DENY"));
    assert_eq!(response.headers.get("set-cookie").map(String::as_str), Some("a=1, b=2"));

    let metadata = response.into_metadata();
    assert!(metadata.has_header("X-Frame-Options"));
}

#[tokio::test]
async fn test_body_sample_is_truncated() {
    let body = "x".repeat(10_000);
    let addr = start_mock_backend(MockReply::new(200, body)).await;

    let capped = transport(Duration::from_secs(5), 64)
        .perform(HttpMethod::Get, &format!("http://{addr}/big"))
        .await
        .unwrap();
    assert_eq!(capped.body_sample.map(|s| s.len()), Some(64));

    let disabled = transport(Duration::from_secs(5), 0)
        .perform(HttpMethod::Get, &format!("http://{addr}/big"))
        .await
        .unwrap();
    assert!(disabled.body_sample.is_none());
}

#[tokio::test]
async fn test_connection_refused_is_connect_error() {
    let addr = closed_addr().await;
    let result = transport(Duration::from_secs(5), 2048)
        .perform(HttpMethod::Get, &format!("http://{addr}/"))
        .await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let addr = start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_millis(800)).await;
        MockReply::new(200, "late")
    })
    .await;
    let result = transport(Duration::from_millis(100), 2048)
        .perform(HttpMethod::Get, &format!("http://{addr}/slow"))
        .await;
    assert!(matches!(result, Err(TransportError::Timeout(_))));
}

#[tokio::test]
async fn test_engine_probes_real_backend() {
    let hits = Arc::new(AtomicU32::new(0));
    let counter = hits.clone();
    let addr = start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            MockReply::new(503, "unavailable").header("Content-Type", "text/plain")
        }
    })
    .await;
    let up = start_mock_backend(MockReply::new(200, "ok")).await;
    let refused = closed_addr().await;

    let failing = endpoint(&format!("http://{addr}"), "/status");
    let healthy = endpoint(&format!("http://{up}"), "/status");
    let gone = endpoint(&format!("http://{refused}"), "/status");

    let store = Arc::new(InMemoryStore::new());
    store.sync_endpoints(vec![failing.clone(), healthy.clone(), gone.clone()]);
    let mut config = MonitorConfig::default();
    config.prober.timeout_secs = 5;
    let engine = MonitoringEngine::with_defaults(config, store.clone()).unwrap();

    let report = match engine.tick(CycleKind::Performance).await {
        CycleReport::Performance(report) => report,
        other => panic!("unexpected report {other:?}"),
    };
    assert_eq!(report.endpoints, 3);
    assert_eq!(report.recorded, 3);
    assert_eq!(report.transport_failures, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let now = Utc::now();
    let since = now - ChronoDuration::minutes(5);
    let failed = store.query_metrics(failing.id, since, now).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].status_code, Some(503));
    assert!(!failed[0].success);
    let metadata = failed[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));
    assert_eq!(metadata.body_sample.as_deref(), Some("unavailable"));

    let ok = store.query_metrics(healthy.id, since, now).await.unwrap();
    assert!(ok[0].success);

    let lost = store.query_metrics(gone.id, since, now).await.unwrap();
    assert!(lost[0].status_code.is_none());
    assert!(lost[0].error_message.is_some());
    assert!(store.find_open_incident(gone.id).await.unwrap().is_some());
}
