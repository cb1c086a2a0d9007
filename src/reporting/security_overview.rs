//! Security alert overview over the trailing 24 hours.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Severity};
use crate::store::{AlertFilter, Store};

const TOP_ENDPOINTS: usize = 5;
const RECENT_ALERTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointAlertCount {
    pub endpoint_id: Uuid,
    /// `None` when the endpoint no longer exists.
    pub path: Option<String>,
    pub alerts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityOverview {
    pub since: DateTime<Utc>,
    pub total_alerts: usize,
    pub active_alerts: usize,
    pub by_type: BTreeMap<AlertType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub top_endpoints: Vec<EndpointAlertCount>,
    pub recent: Vec<Alert>,
}

/// Endpoints with the most alerts, ties broken by id for stable output.
pub fn top_offenders(alerts: &[Alert], limit: usize) -> Vec<(Uuid, usize)> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for alert in alerts {
        *counts.entry(alert.endpoint_id).or_insert(0) += 1;
    }
    let mut ranked: Vec<(Uuid, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

pub async fn build_security_overview(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> MonitorResult<SecurityOverview> {
    let since = now - Duration::hours(24);
    let alerts = store
        .list_alerts(&AlertFilter {
            types: Some(AlertType::SECURITY.to_vec()),
            since: Some(since),
            ..Default::default()
        })
        .await?;

    let mut by_type = BTreeMap::new();
    let mut by_severity = BTreeMap::new();
    for alert in &alerts {
        *by_type.entry(alert.alert_type).or_insert(0) += 1;
        *by_severity.entry(alert.severity).or_insert(0) += 1;
    }

    let ranked = top_offenders(&alerts, TOP_ENDPOINTS);
    let mut top_endpoints = Vec::with_capacity(ranked.len());
    for (endpoint_id, count) in ranked {
        let path = store.get_endpoint(endpoint_id).await?.map(|e| e.path);
        top_endpoints.push(EndpointAlertCount {
            endpoint_id,
            path,
            alerts: count,
        });
    }

    Ok(SecurityOverview {
        since,
        total_alerts: alerts.len(),
        active_alerts: alerts.iter().filter(|a| a.status.is_active()).count(),
        by_type,
        by_severity,
        top_endpoints,
        recent: alerts.into_iter().take(RECENT_ALERTS).collect(),
    })
}
