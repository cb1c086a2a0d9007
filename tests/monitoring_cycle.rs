//! Performance cycle behaviour end to end: probe, persist, evaluate, escalate.

use std::time::Duration as StdDuration;

use chrono::Duration;

use api_monitor::model::{AlertStatus, AlertType, IncidentStatus, Metric, Severity};
use api_monitor::monitor::PerformanceCycleReport;
use api_monitor::store::{AlertFilter, IncidentFilter, Store};
use api_monitor::{Clock, CycleKind, CycleReport, MonitorError};

mod common;
use common::{endpoint, engine, hardened, Scripted, TestEngine};

const BASE: &str = "http://api.internal";

async fn perf(t: &TestEngine) -> PerformanceCycleReport {
    match t.engine.tick(CycleKind::Performance).await {
        CycleReport::Performance(report) => report,
        other => panic!("expected performance report, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_raises_one_response_time_alert() {
    let mut ep = endpoint(BASE, "/search");
    ep.response_time_threshold_ms = 20;
    let t = engine(vec![ep.clone()]);
    t.transport.script(
        &ep.target_url(),
        vec![Scripted::Slow(StdDuration::from_millis(80), hardened(200))],
    );

    let report = perf(&t).await;
    assert_eq!(report.endpoints, 1);
    assert_eq!(report.recorded, 1);
    assert_eq!(report.alerts, 1);

    let alerts = t.store.list_alerts(&AlertFilter::default()).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_type, AlertType::ResponseTime);
    assert_eq!(alerts[0].threshold, Some(20.0));
    assert!(alerts[0].value.unwrap() >= 80.0);

    // Still slow next cycle: the open alert absorbs the repeat.
    perf(&t).await;
    let alerts = t.store.list_alerts(&AlertFilter::default()).await.unwrap();
    assert_eq!(alerts.len(), 1);
}

#[tokio::test]
async fn test_error_rate_breach_escalates_to_high_incident() {
    let mut ep = endpoint(BASE, "/orders");
    ep.error_rate_threshold = 10.0;
    let t = engine(vec![ep.clone()]);

    // Nine earlier probes in the trailing hour, five of them failing.
    for i in 0..9u16 {
        let ts = t.clock.now() - Duration::minutes(50 - i64::from(i) * 5);
        let status = if i < 5 { 500 } else { 200 };
        let metric = Metric::from_response(ep.id, ts, 25, status, None);
        t.store.insert_metric(&metric).await.unwrap();
    }
    t.transport.script(&ep.target_url(), vec![Scripted::status(500)]);

    let report = perf(&t).await;
    assert_eq!(report.incidents, 1);

    let alerts = t.store.list_alerts(&AlertFilter::default()).await.unwrap();
    let types: Vec<AlertType> = alerts.iter().map(|a| a.alert_type).collect();
    assert!(types.contains(&AlertType::StatusCode));
    assert!(types.contains(&AlertType::ErrorRate));
    assert_eq!(
        alerts.iter().filter(|a| a.alert_type == AlertType::ErrorRate).count(),
        1
    );

    let incidents = t.store.list_incidents(&IncidentFilter::default()).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].title, "High Error Rate for /orders");
    assert_eq!(incidents[0].severity, Severity::High);
    assert_eq!(incidents[0].status, IncidentStatus::Open);

    let error_rate = alerts
        .iter()
        .find(|a| a.alert_type == AlertType::ErrorRate)
        .unwrap();
    assert_eq!(error_rate.incident_id, Some(incidents[0].id));
    assert!((error_rate.value.unwrap() - 60.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_connection_failure_records_metric_and_one_incident() {
    let ep = endpoint(BASE, "/pay");
    let t = engine(vec![ep.clone()]);
    t.transport.script(&ep.target_url(), vec![Scripted::Refuse]);

    let report = perf(&t).await;
    assert_eq!(report.recorded, 1);
    assert_eq!(report.transport_failures, 1);
    assert_eq!(report.incidents, 1);

    let now = t.clock.now();
    let metrics = t
        .store
        .query_metrics(ep.id, now - Duration::hours(1), now)
        .await
        .unwrap();
    assert_eq!(metrics.len(), 1);
    assert!(!metrics[0].success);
    assert!(metrics[0].status_code.is_none());
    assert!(metrics[0].error_message.as_deref().unwrap().contains("refused"));

    let incidents = t.store.list_incidents(&IncidentFilter::default()).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].title, "Error detected for /pay");
    assert_eq!(incidents[0].severity, Severity::Medium);

    // A second failure while the incident is open adds a metric, not an incident.
    t.clock.advance(Duration::minutes(1));
    perf(&t).await;
    let incidents = t.store.list_incidents(&IncidentFilter::default()).await.unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(t.store.metric_count(), 2);
}

#[tokio::test]
async fn test_one_failing_endpoint_does_not_block_others() {
    let healthy = endpoint(BASE, "/a");
    let broken = endpoint(BASE, "/b");
    let erroring = endpoint(BASE, "/c");
    let t = engine(vec![healthy.clone(), broken.clone(), erroring.clone()]);
    t.transport.script(&broken.target_url(), vec![Scripted::Refuse]);
    t.transport.script(&erroring.target_url(), vec![Scripted::status(503)]);

    let report = perf(&t).await;
    assert_eq!(report.endpoints, 3);
    assert_eq!(report.recorded, 3);
    assert_eq!(report.transport_failures, 1);
    assert_eq!(report.errors, 0);

    let now = t.clock.now();
    for ep in [&healthy, &broken, &erroring] {
        let metrics = t
            .store
            .query_metrics(ep.id, now - Duration::minutes(5), now)
            .await
            .unwrap();
        assert_eq!(metrics.len(), 1, "one metric for {}", ep.path);
        assert_eq!(t.transport.calls_to(&ep.target_url()), 1);
    }

    let erroring_alerts = t
        .store
        .list_alerts(&AlertFilter {
            endpoint_id: Some(erroring.id),
            ..Default::default()
        })
        .await
        .unwrap();
    let status_alert = erroring_alerts
        .iter()
        .find(|a| a.alert_type == AlertType::StatusCode)
        .unwrap();
    assert_eq!(status_alert.value, Some(503.0));
    assert_eq!(status_alert.threshold, Some(400.0));
}

#[tokio::test]
async fn test_inactive_endpoints_drop_out_on_next_cycle() {
    let a = endpoint(BASE, "/a");
    let b = endpoint(BASE, "/b");
    let t = engine(vec![a.clone(), b.clone()]);

    perf(&t).await;
    assert_eq!(t.engine.active_endpoint_count(), 2);

    let mut paused = b.clone();
    paused.is_active = false;
    t.store.sync_endpoints(vec![a.clone(), paused]);

    let report = perf(&t).await;
    assert_eq!(report.endpoints, 1);
    assert_eq!(t.engine.active_endpoint_count(), 1);
    assert_eq!(t.transport.calls_to(&b.target_url()), 1);
}

#[tokio::test]
async fn test_resolving_incident_cascades_and_allows_a_new_one() {
    let ep = endpoint(BASE, "/pay");
    let t = engine(vec![ep.clone()]);
    t.transport.script(&ep.target_url(), vec![Scripted::Refuse]);
    perf(&t).await;

    let incident = t.store.find_open_incident(ep.id).await.unwrap().unwrap();
    let acked = t
        .engine
        .update_incident_status(incident.id, "ACKNOWLEDGED", Some("oncall"), None)
        .await
        .unwrap();
    assert_eq!(acked.status, IncidentStatus::Acknowledged);
    assert_eq!(acked.acknowledged_by.as_deref(), Some("oncall"));

    t.clock.advance(Duration::minutes(10));
    let resolved = t
        .engine
        .update_incident_status(incident.id, "RESOLVED", Some("oncall"), Some("restarted gateway"))
        .await
        .unwrap();
    assert_eq!(resolved.status, IncidentStatus::Resolved);
    assert_eq!(resolved.end_time, Some(t.clock.now()));
    assert_eq!(resolved.resolution.as_deref(), Some("restarted gateway"));
    assert_eq!(resolved.resolved_by.as_deref(), Some("oncall"));

    let linked = t.store.list_alerts_for_incident(incident.id).await.unwrap();
    assert!(!linked.is_empty());
    assert!(linked.iter().all(|a| a.status == AlertStatus::Resolved));

    // Resolved is terminal.
    let reopen = t
        .engine
        .update_incident_status(incident.id, "OPEN", None, None)
        .await;
    assert!(matches!(reopen, Err(MonitorError::Validation(_))));

    t.clock.advance(Duration::minutes(1));
    perf(&t).await;
    let incidents = t.store.list_incidents(&IncidentFilter::default()).await.unwrap();
    assert_eq!(incidents.len(), 2);
    assert_eq!(incidents.iter().filter(|i| !i.is_resolved()).count(), 1);
}

#[tokio::test]
async fn test_alert_status_updates_through_engine() {
    let mut ep = endpoint(BASE, "/slow");
    ep.response_time_threshold_ms = 10;
    let t = engine(vec![ep.clone()]);
    t.transport.script(
        &ep.target_url(),
        vec![Scripted::Slow(StdDuration::from_millis(40), hardened(200))],
    );
    perf(&t).await;

    let alert = t.store.list_alerts(&AlertFilter::default()).await.unwrap().remove(0);
    let acked = t
        .engine
        .update_alert_status(alert.id, "ACKNOWLEDGED", Some("alice"))
        .await
        .unwrap();
    assert_eq!(acked.status, AlertStatus::Acknowledged);
    assert_eq!(acked.acknowledged_by.as_deref(), Some("alice"));
    assert!(acked.acknowledged_at.is_some());

    // Performance alerts cannot be marked as false positives.
    let fp = t
        .engine
        .update_alert_status(alert.id, "FALSE_POSITIVE", Some("alice"))
        .await;
    assert!(matches!(fp, Err(MonitorError::Validation(_))));

    let bogus = t.engine.update_alert_status(alert.id, "SNOOZED", None).await;
    assert!(matches!(bogus, Err(MonitorError::Validation(_))));

    let missing = t
        .engine
        .update_alert_status(uuid::Uuid::new_v4(), "RESOLVED", None)
        .await;
    assert!(matches!(missing, Err(MonitorError::NotFound { .. })));
}

#[tokio::test]
async fn test_health_score_after_probes() {
    let healthy = endpoint(BASE, "/ok");
    let idle = endpoint(BASE, "/idle");
    let t = engine(vec![healthy.clone()]);
    // Known to the store but never probed.
    let mut idle_inactive = idle.clone();
    idle_inactive.is_active = false;
    t.store.upsert_endpoint(idle_inactive);

    for _ in 0..5 {
        perf(&t).await;
        t.clock.advance(Duration::minutes(1));
    }

    let score = t
        .engine
        .calculate_endpoint_health_score(healthy.id)
        .await
        .unwrap()
        .expect("metrics recorded");
    assert_eq!(score.endpoint_id, healthy.id);
    assert!(score.score <= 100);
    assert!(score.score >= 90, "all-success endpoint scored {}", score.score);

    assert!(t
        .engine
        .calculate_endpoint_health_score(idle.id)
        .await
        .unwrap()
        .is_none());

    let unknown = t
        .engine
        .calculate_endpoint_health_score(uuid::Uuid::new_v4())
        .await;
    assert!(matches!(unknown, Err(MonitorError::NotFound { entity: "endpoint", .. })));
}
