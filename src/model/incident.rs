//! Incidents: per-endpoint aggregates of alerts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MonitorError;
use crate::model::alert::{AlertType, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncidentStatus {
    Open,
    Acknowledged,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "OPEN",
            IncidentStatus::Acknowledged => "ACKNOWLEDGED",
            IncidentStatus::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(IncidentStatus::Open),
            "ACKNOWLEDGED" => Ok(IncidentStatus::Acknowledged),
            "RESOLVED" => Ok(IncidentStatus::Resolved),
            other => Err(MonitorError::validation(format!("unknown incident status: {other}"))),
        }
    }
}

/// Request to open an incident together with its first linked alert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIncident {
    pub endpoint_id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    /// Type of the alert linked on creation.
    pub alert_type: AlertType,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
}

impl Incident {
    pub fn open(data: &NewIncident, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint_id: data.endpoint_id,
            title: data.title.clone(),
            message: data.message.clone(),
            severity: data.severity,
            status: IncidentStatus::Open,
            start_time: now,
            end_time: None,
            acknowledged_by: None,
            acknowledged_at: None,
            resolution: None,
            resolved_by: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == IncidentStatus::Resolved
    }

    pub fn transition(
        &mut self,
        to: IncidentStatus,
        actor: Option<&str>,
        resolution: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        use IncidentStatus::*;
        let allowed = matches!(
            (self.status, to),
            (Open, Acknowledged) | (Open, Resolved) | (Acknowledged, Resolved)
        );
        if !allowed {
            return Err(MonitorError::validation(format!(
                "incident {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        match to {
            Acknowledged => {
                self.acknowledged_by = actor.map(str::to_string);
                self.acknowledged_at = Some(now);
            }
            Resolved => {
                self.resolved_by = actor.map(str::to_string);
                self.resolution = resolution.map(str::to_string);
                self.end_time = Some(now);
            }
            Open => {}
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incident() -> Incident {
        Incident::open(
            &NewIncident {
                endpoint_id: Uuid::new_v4(),
                title: "High Error Rate for /orders".into(),
                message: "error rate 60%".into(),
                severity: Severity::High,
                alert_type: AlertType::ErrorRate,
                value: Some(60.0),
                threshold: Some(10.0),
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_resolve_sets_resolver_and_end_time() {
        let mut inc = incident();
        inc.transition(IncidentStatus::Acknowledged, Some("alice"), None, Utc::now())
            .unwrap();
        inc.transition(IncidentStatus::Resolved, Some("bob"), Some("rolled back"), Utc::now())
            .unwrap();
        assert!(inc.is_resolved());
        assert_eq!(inc.resolved_by.as_deref(), Some("bob"));
        assert_eq!(inc.resolution.as_deref(), Some("rolled back"));
        assert!(inc.end_time.is_some());
    }

    #[test]
    fn test_no_reopen() {
        let mut inc = incident();
        inc.transition(IncidentStatus::Resolved, None, None, Utc::now()).unwrap();
        assert!(inc.transition(IncidentStatus::Open, None, None, Utc::now()).is_err());
        assert!(inc
            .transition(IncidentStatus::Acknowledged, None, None, Utc::now())
            .is_err());
    }
}
