//! In-process store backed by concurrent maps.
//!
//! # Responsibilities
//! - Implement the full [`Store`] contract without external services
//! - Keep per-endpoint metric series ordered by timestamp
//! - Let the host seed and re-sync endpoint definitions

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::{
    AlertFilter, IncidentFilter, MinuteCount, Store, StoreError, StoreResult,
};
use crate::model::{Alert, AlertType, Endpoint, Incident, Metric, SystemStatus};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    endpoints: DashMap<Uuid, Endpoint>,
    metrics: DashMap<Uuid, Vec<Metric>>,
    alerts: DashMap<Uuid, Alert>,
    incidents: DashMap<Uuid, Incident>,
    statuses: DashMap<Uuid, SystemStatus>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an endpoint definition.
    pub fn upsert_endpoint(&self, endpoint: Endpoint) {
        self.endpoints.insert(endpoint.id, endpoint);
    }

    /// Make `endpoints` the full endpoint set: upsert each, drop the rest.
    pub fn sync_endpoints(&self, endpoints: Vec<Endpoint>) {
        let keep: HashSet<Uuid> = endpoints.iter().map(|e| e.id).collect();
        self.endpoints.retain(|id, _| keep.contains(id));
        for endpoint in endpoints {
            self.endpoints.insert(endpoint.id, endpoint);
        }
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.iter().map(|series| series.value().len()).sum()
    }
}

fn minute_of(ts: DateTime<Utc>) -> DateTime<Utc> {
    let secs = ts.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(60), 0).unwrap_or(ts)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_active_endpoints(&self) -> StoreResult<Vec<Endpoint>> {
        let mut active: Vec<Endpoint> = self
            .endpoints
            .iter()
            .filter(|e| e.value().is_active)
            .map(|e| e.value().clone())
            .collect();
        active.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(active)
    }

    async fn list_endpoints(&self) -> StoreResult<Vec<Endpoint>> {
        let mut all: Vec<Endpoint> = self.endpoints.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(all)
    }

    async fn get_endpoint(&self, id: Uuid) -> StoreResult<Option<Endpoint>> {
        Ok(self.endpoints.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_metric(&self, metric: &Metric) -> StoreResult<()> {
        let mut series = self.metrics.entry(metric.endpoint_id).or_default();
        let pos = series.partition_point(|m| m.timestamp <= metric.timestamp);
        series.insert(pos, metric.clone());
        Ok(())
    }

    async fn query_metrics(
        &self,
        endpoint_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Metric>> {
        Ok(self
            .metrics
            .get(&endpoint_id)
            .map(|series| {
                series
                    .iter()
                    .filter(|m| m.timestamp >= since && m.timestamp <= until)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_metrics_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut removed = 0u64;
        for mut series in self.metrics.iter_mut() {
            let before = series.len();
            series.retain(|m| m.timestamp >= cutoff);
            removed += (before - series.len()) as u64;
        }
        Ok(removed)
    }

    async fn count_metrics_per_minute(
        &self,
        endpoint_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<MinuteCount>> {
        let mut buckets: BTreeMap<DateTime<Utc>, u64> = BTreeMap::new();
        if let Some(series) = self.metrics.get(&endpoint_id) {
            for m in series.iter().filter(|m| m.timestamp >= since) {
                *buckets.entry(minute_of(m.timestamp)).or_insert(0) += 1;
            }
        }
        Ok(buckets
            .into_iter()
            .map(|(minute, count)| MinuteCount { minute, count })
            .collect())
    }

    async fn find_open_alert(
        &self,
        endpoint_id: Uuid,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<Alert>> {
        Ok(self
            .alerts
            .iter()
            .filter(|a| {
                a.endpoint_id == endpoint_id
                    && a.alert_type == alert_type
                    && a.status.is_unresolved()
                    && a.created_at >= since
            })
            .max_by_key(|a| a.created_at)
            .map(|a| a.value().clone()))
    }

    async fn insert_alert(&self, alert: &Alert) -> StoreResult<()> {
        self.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn update_alert(&self, alert: &Alert) -> StoreResult<()> {
        match self.alerts.get_mut(&alert.id) {
            Some(mut existing) => {
                *existing = alert.clone();
                Ok(())
            }
            None => Err(StoreError::Missing {
                entity: "alert",
                id: alert.id,
            }),
        }
    }

    async fn get_alert(&self, id: Uuid) -> StoreResult<Option<Alert>> {
        Ok(self.alerts.get(&id).map(|a| a.value().clone()))
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> StoreResult<Vec<Alert>> {
        let mut alerts: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| filter.matches(a.value()))
            .map(|a| a.value().clone())
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    async fn list_alerts_for_incident(&self, incident_id: Uuid) -> StoreResult<Vec<Alert>> {
        Ok(self
            .alerts
            .iter()
            .filter(|a| a.incident_id == Some(incident_id))
            .map(|a| a.value().clone())
            .collect())
    }

    async fn find_open_incident(&self, endpoint_id: Uuid) -> StoreResult<Option<Incident>> {
        Ok(self
            .incidents
            .iter()
            .filter(|i| i.endpoint_id == endpoint_id && !i.is_resolved())
            .max_by_key(|i| i.start_time)
            .map(|i| i.value().clone()))
    }

    async fn insert_incident_with_alert(
        &self,
        incident: &Incident,
        alert: &Alert,
    ) -> StoreResult<()> {
        self.incidents.insert(incident.id, incident.clone());
        self.alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn update_incident(&self, incident: &Incident) -> StoreResult<()> {
        match self.incidents.get_mut(&incident.id) {
            Some(mut existing) => {
                *existing = incident.clone();
                Ok(())
            }
            None => Err(StoreError::Missing {
                entity: "incident",
                id: incident.id,
            }),
        }
    }

    async fn get_incident(&self, id: Uuid) -> StoreResult<Option<Incident>> {
        Ok(self.incidents.get(&id).map(|i| i.value().clone()))
    }

    async fn list_incidents(&self, filter: &IncidentFilter) -> StoreResult<Vec<Incident>> {
        let mut incidents: Vec<Incident> = self
            .incidents
            .iter()
            .filter(|i| filter.matches(i.value()))
            .map(|i| i.value().clone())
            .collect();
        incidents.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(incidents)
    }

    async fn insert_system_status(&self, status: &SystemStatus) -> StoreResult<()> {
        self.statuses.insert(status.id, status.clone());
        Ok(())
    }

    async fn latest_system_status(&self) -> StoreResult<Option<SystemStatus>> {
        Ok(self
            .statuses
            .iter()
            .max_by_key(|s| s.timestamp)
            .map(|s| s.value().clone()))
    }

    async fn delete_system_status_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let before = self.statuses.len();
        self.statuses.retain(|_, s| s.timestamp >= cutoff);
        Ok((before - self.statuses.len()) as u64)
    }
}
