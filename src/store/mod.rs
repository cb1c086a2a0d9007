//! Persistence boundary.
//!
//! # Data Flow
//! ```text
//! Registry refresh ──▶ list_active_endpoints
//! Prober ────────────▶ insert_metric
//! Evaluator/Scanner ─▶ query_metrics / count_metrics_per_minute
//! Dedup/Escalation ──▶ find_open_* → insert_* / update_*
//! Housekeeping ──────▶ insert_system_status / delete_*_before
//! Reporting ─────────▶ list_* / query_metrics
//! ```
//!
//! # Design Decisions
//! - The engine only sees the [`Store`] trait; storage is external
//! - Dedup is read-then-write; stores are not required to enforce uniqueness
//! - Metric queries return ascending timestamps
//! - `memory.rs` is the bundled implementation used by the binary and tests

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    Alert, AlertStatus, AlertType, Endpoint, Incident, IncidentStatus, Metric, SystemStatus,
};

pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{entity} {id} does not exist")]
    Missing { entity: &'static str, id: Uuid },

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Request count for one calendar minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinuteCount {
    pub minute: DateTime<Utc>,
    pub count: u64,
}

/// Alert listing filter. `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub endpoint_id: Option<Uuid>,
    pub status: Option<AlertStatus>,
    pub types: Option<Vec<AlertType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        self.endpoint_id.map_or(true, |id| alert.endpoint_id == id)
            && self.status.map_or(true, |s| alert.status == s)
            && self
                .types
                .as_ref()
                .map_or(true, |types| types.contains(&alert.alert_type))
            && self.since.map_or(true, |t| alert.created_at >= t)
            && self.until.map_or(true, |t| alert.created_at <= t)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub endpoint_id: Option<Uuid>,
    pub status: Option<IncidentStatus>,
    pub since: Option<DateTime<Utc>>,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        self.endpoint_id.map_or(true, |id| incident.endpoint_id == id)
            && self.status.map_or(true, |s| incident.status == s)
            && self.since.map_or(true, |t| {
                incident.start_time >= t || incident.end_time.map_or(true, |end| end >= t)
            })
    }
}

/// Storage operations the engine consumes.
#[async_trait]
pub trait Store: Send + Sync {
    // Endpoints
    async fn list_active_endpoints(&self) -> StoreResult<Vec<Endpoint>>;
    async fn list_endpoints(&self) -> StoreResult<Vec<Endpoint>>;
    async fn get_endpoint(&self, id: Uuid) -> StoreResult<Option<Endpoint>>;

    // Metrics
    async fn insert_metric(&self, metric: &Metric) -> StoreResult<()>;
    /// Metrics for one endpoint with `since <= timestamp <= until`, oldest first.
    async fn query_metrics(
        &self,
        endpoint_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StoreResult<Vec<Metric>>;
    /// Returns the number of metrics removed.
    async fn delete_metrics_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
    /// Metrics at or after `since`, grouped by calendar minute, oldest first.
    async fn count_metrics_per_minute(
        &self,
        endpoint_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<MinuteCount>>;

    // Alerts
    /// Most recent non-resolved alert of `alert_type` created at or after `since`.
    async fn find_open_alert(
        &self,
        endpoint_id: Uuid,
        alert_type: AlertType,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<Alert>>;
    async fn insert_alert(&self, alert: &Alert) -> StoreResult<()>;
    async fn update_alert(&self, alert: &Alert) -> StoreResult<()>;
    async fn get_alert(&self, id: Uuid) -> StoreResult<Option<Alert>>;
    /// Newest first.
    async fn list_alerts(&self, filter: &AlertFilter) -> StoreResult<Vec<Alert>>;
    async fn list_alerts_for_incident(&self, incident_id: Uuid) -> StoreResult<Vec<Alert>>;

    // Incidents
    async fn find_open_incident(&self, endpoint_id: Uuid) -> StoreResult<Option<Incident>>;
    /// Inserts the incident and writes the linked alert in one step.
    /// The alert is inserted, or replaced if its id already exists.
    async fn insert_incident_with_alert(
        &self,
        incident: &Incident,
        alert: &Alert,
    ) -> StoreResult<()>;
    async fn update_incident(&self, incident: &Incident) -> StoreResult<()>;
    async fn get_incident(&self, id: Uuid) -> StoreResult<Option<Incident>>;
    /// Newest first.
    async fn list_incidents(&self, filter: &IncidentFilter) -> StoreResult<Vec<Incident>>;

    // System status
    async fn insert_system_status(&self, status: &SystemStatus) -> StoreResult<()>;
    async fn latest_system_status(&self) -> StoreResult<Option<SystemStatus>>;
    /// Delete snapshots taken strictly before `cutoff`. Returns rows removed.
    async fn delete_system_status_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}
