//! Engine-wide monitoring overview.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::MonitorResult;
use crate::model::{Endpoint, HttpMethod, IncidentStatus, Metric, SystemStatus};
use crate::monitor::WindowStats;
use crate::store::{AlertFilter, IncidentFilter, Store};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointUptime {
    pub endpoint_id: Uuid,
    pub path: String,
    pub method: HttpMethod,
    pub is_active: bool,
    pub checks: usize,
    /// `None` without checks in the window.
    pub uptime_percent: Option<f64>,
    pub avg_response_time_ms: Option<f64>,
    pub last_checked: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonitoringOverview {
    pub generated_at: DateTime<Utc>,
    pub is_running: bool,
    pub total_endpoints: usize,
    pub active_endpoints: usize,
    pub open_incidents: usize,
    /// NEW or ACKNOWLEDGED.
    pub active_alerts: usize,
    pub alerts_last_24h: usize,
    pub checks_last_24h: usize,
    pub system_status: Option<SystemStatus>,
    pub endpoints: Vec<EndpointUptime>,
}

pub fn summarize_uptime(endpoint: &Endpoint, metrics: &[Metric]) -> EndpointUptime {
    let stats = WindowStats::from_metrics(metrics);
    let times: Vec<f64> = metrics
        .iter()
        .filter_map(|m| m.response_time_ms)
        .map(|t| t as f64)
        .collect();

    EndpointUptime {
        endpoint_id: endpoint.id,
        path: endpoint.path.clone(),
        method: endpoint.method,
        is_active: endpoint.is_active,
        checks: metrics.len(),
        uptime_percent: stats.map(|s| s.availability()),
        avg_response_time_ms: (!times.is_empty())
            .then(|| times.iter().sum::<f64>() / times.len() as f64),
        last_checked: metrics.iter().map(|m| m.timestamp).max(),
    }
}

pub async fn build_overview(
    store: &dyn Store,
    now: DateTime<Utc>,
    is_running: bool,
) -> MonitorResult<MonitoringOverview> {
    let since = now - Duration::hours(24);
    let endpoints = store.list_endpoints().await?;

    let mut rows = Vec::with_capacity(endpoints.len());
    for endpoint in &endpoints {
        let metrics = store.query_metrics(endpoint.id, since, now).await?;
        rows.push(summarize_uptime(endpoint, &metrics));
    }

    let open_incidents = store
        .list_incidents(&IncidentFilter::default())
        .await?
        .iter()
        .filter(|i| i.status != IncidentStatus::Resolved)
        .count();
    let all_alerts = store.list_alerts(&AlertFilter::default()).await?;
    let active_alerts = all_alerts.iter().filter(|a| a.status.is_active()).count();
    let alerts_last_24h = all_alerts.iter().filter(|a| a.created_at >= since).count();

    Ok(MonitoringOverview {
        generated_at: now,
        is_running,
        total_endpoints: endpoints.len(),
        active_endpoints: endpoints.iter().filter(|e| e.is_active).count(),
        open_incidents,
        active_alerts,
        alerts_last_24h,
        checks_last_24h: rows.iter().map(|r| r.checks).sum(),
        system_status: store.latest_system_status().await?,
        endpoints: rows,
    })
}
