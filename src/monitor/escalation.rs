//! Alert deduplication and incident escalation.
//!
//! # Responsibilities
//! - Suppress repeat alerts of one type per endpoint inside a window
//! - Open at most one unresolved incident per endpoint
//! - Drive alert and incident status changes, cascading resolution
//!
//! # Design Decisions
//! - Dedup is read-then-write against the store (best effort, no locking)
//! - A FALSE_POSITIVE alert keeps suppressing until its window passes
//! - A new incident adopts the open alert of its type instead of duplicating it

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::clock::{window_start, Clock};
use crate::error::{MonitorError, MonitorResult};
use crate::model::{
    Alert, AlertStatus, Incident, IncidentStatus, NewAlert, NewIncident,
};
use crate::observability::metrics;
use crate::store::Store;

pub struct AlertManager {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    dedup_window: Duration,
}

impl AlertManager {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, dedup_window: Duration) -> Self {
        Self {
            store,
            clock,
            dedup_window,
        }
    }

    /// Create an alert unless one is already open inside the default window.
    pub async fn create_alert(&self, data: NewAlert) -> MonitorResult<Alert> {
        self.create_alert_within(data, self.dedup_window).await
    }

    /// Create an alert unless one of the same (endpoint, type) is unresolved
    /// and was created within `window`. Returns the existing alert unchanged
    /// in that case.
    pub async fn create_alert_within(&self, data: NewAlert, window: Duration) -> MonitorResult<Alert> {
        let now = self.clock.now();
        if let Some(existing) = self
            .store
            .find_open_alert(data.endpoint_id, data.alert_type, window_start(now, window))
            .await?
        {
            tracing::debug!(
                endpoint_id = %data.endpoint_id,
                alert_type = %data.alert_type,
                alert_id = %existing.id,
                "Alert suppressed, open alert exists"
            );
            return Ok(existing);
        }

        let alert = Alert::open(data, now);
        self.store.insert_alert(&alert).await?;
        metrics::record_alert_created(alert.alert_type);
        tracing::warn!(
            endpoint_id = %alert.endpoint_id,
            alert_id = %alert.id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            message = %alert.message,
            "Alert raised"
        );
        Ok(alert)
    }

    /// Open an incident with a linked alert, or return the endpoint's
    /// unresolved incident unchanged.
    pub async fn create_incident(&self, data: NewIncident) -> MonitorResult<Incident> {
        let now = self.clock.now();
        if let Some(existing) = self.store.find_open_incident(data.endpoint_id).await? {
            tracing::debug!(
                endpoint_id = %data.endpoint_id,
                incident_id = %existing.id,
                "Incident already open"
            );
            return Ok(existing);
        }

        let incident = Incident::open(&data, now);
        let existing_alert = self
            .store
            .find_open_alert(data.endpoint_id, data.alert_type, window_start(now, self.dedup_window))
            .await?;
        let adopted = existing_alert.is_some();
        let mut alert = match existing_alert {
            Some(alert) => alert,
            None => Alert::open(
                NewAlert {
                    endpoint_id: data.endpoint_id,
                    alert_type: data.alert_type,
                    severity: data.severity,
                    message: data.message.clone(),
                    value: data.value,
                    threshold: data.threshold,
                },
                now,
            ),
        };
        alert.incident_id = Some(incident.id);
        alert.updated_at = now;

        self.store.insert_incident_with_alert(&incident, &alert).await?;

        if !adopted {
            metrics::record_alert_created(alert.alert_type);
        }
        metrics::record_incident_created(incident.severity);
        tracing::error!(
            endpoint_id = %incident.endpoint_id,
            incident_id = %incident.id,
            severity = %incident.severity,
            title = %incident.title,
            "Incident opened"
        );
        Ok(incident)
    }

    pub async fn update_alert_status(
        &self,
        id: Uuid,
        status: AlertStatus,
        actor: Option<&str>,
    ) -> MonitorResult<Alert> {
        let mut alert = self
            .store
            .get_alert(id)
            .await?
            .ok_or_else(|| MonitorError::not_found("alert", id))?;

        alert.transition(status, actor, self.clock.now())?;
        self.store.update_alert(&alert).await?;
        tracing::info!(alert_id = %id, status = %status, actor = ?actor, "Alert status updated");
        Ok(alert)
    }

    /// Move an incident along its status machine. Resolving it resolves every
    /// linked alert still NEW or ACKNOWLEDGED.
    pub async fn update_incident_status(
        &self,
        id: Uuid,
        status: IncidentStatus,
        actor: Option<&str>,
        resolution: Option<&str>,
    ) -> MonitorResult<Incident> {
        let mut incident = self
            .store
            .get_incident(id)
            .await?
            .ok_or_else(|| MonitorError::not_found("incident", id))?;

        let now = self.clock.now();
        incident.transition(status, actor, resolution, now)?;
        self.store.update_incident(&incident).await?;

        if status == IncidentStatus::Resolved {
            let linked = self.store.list_alerts_for_incident(id).await?;
            let mut resolved = 0usize;
            for mut alert in linked.into_iter().filter(|a| a.status.is_active()) {
                alert.transition(AlertStatus::Resolved, actor, now)?;
                self.store.update_alert(&alert).await?;
                resolved += 1;
            }
            tracing::info!(
                incident_id = %id,
                resolved_alerts = resolved,
                actor = ?actor,
                "Incident resolved"
            );
        } else {
            tracing::info!(incident_id = %id, status = %status, actor = ?actor, "Incident status updated");
        }
        Ok(incident)
    }
}
