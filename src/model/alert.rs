//! Alerts and their status machine.
//!
//! ```text
//! NEW ──▶ ACKNOWLEDGED ──▶ RESOLVED
//!  │            │              ▲
//!  └────────────┼──────────────┘
//!               │
//!  (security types only, from NEW or ACKNOWLEDGED)
//!               └──▶ FALSE_POSITIVE
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    ResponseTime,
    ErrorRate,
    Availability,
    StatusCode,
    Other,
    Vulnerability,
    RateLimit,
    AuthFailure,
    SensitiveData,
}

impl AlertType {
    pub const SECURITY: [AlertType; 4] = [
        AlertType::Vulnerability,
        AlertType::RateLimit,
        AlertType::AuthFailure,
        AlertType::SensitiveData,
    ];

    pub fn is_security(&self) -> bool {
        Self::SECURITY.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::ResponseTime => "RESPONSE_TIME",
            AlertType::ErrorRate => "ERROR_RATE",
            AlertType::Availability => "AVAILABILITY",
            AlertType::StatusCode => "STATUS_CODE",
            AlertType::Other => "OTHER",
            AlertType::Vulnerability => "VULNERABILITY",
            AlertType::RateLimit => "RATE_LIMIT",
            AlertType::AuthFailure => "AUTH_FAILURE",
            AlertType::SensitiveData => "SENSITIVE_DATA",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    New,
    Acknowledged,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "NEW",
            AlertStatus::Acknowledged => "ACKNOWLEDGED",
            AlertStatus::Resolved => "RESOLVED",
            AlertStatus::FalsePositive => "FALSE_POSITIVE",
        }
    }

    /// Still counts against dedup. Only `RESOLVED` releases the slot.
    pub fn is_unresolved(&self) -> bool {
        *self != AlertStatus::Resolved
    }

    /// Still demands attention.
    pub fn is_active(&self) -> bool {
        matches!(self, AlertStatus::New | AlertStatus::Acknowledged)
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(AlertStatus::New),
            "ACKNOWLEDGED" => Ok(AlertStatus::Acknowledged),
            "RESOLVED" => Ok(AlertStatus::Resolved),
            "FALSE_POSITIVE" => Ok(AlertStatus::FalsePositive),
            other => Err(MonitorError::validation(format!("unknown alert status: {other}"))),
        }
    }
}

/// Fields of an alert the caller chooses; the rest are filled on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub endpoint_id: Uuid,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
}

impl NewAlert {
    pub fn new(
        endpoint_id: Uuid,
        alert_type: AlertType,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_id,
            alert_type,
            severity,
            message: message.into(),
            value: None,
            threshold: None,
        }
    }

    pub fn with_values(mut self, value: f64, threshold: f64) -> Self {
        self.value = Some(value);
        self.threshold = Some(threshold);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub incident_id: Option<Uuid>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn open(data: NewAlert, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint_id: data.endpoint_id,
            incident_id: None,
            alert_type: data.alert_type,
            severity: data.severity,
            message: data.message,
            value: data.value,
            threshold: data.threshold,
            status: AlertStatus::New,
            created_at: now,
            updated_at: now,
            acknowledged_by: None,
            acknowledged_at: None,
            resolved_at: None,
        }
    }

    pub fn can_transition(&self, to: AlertStatus) -> bool {
        use AlertStatus::*;
        match (self.status, to) {
            (New, Acknowledged) | (New, Resolved) | (Acknowledged, Resolved) => true,
            (New, FalsePositive) | (Acknowledged, FalsePositive) => self.alert_type.is_security(),
            _ => false,
        }
    }

    /// Apply a status change, stamping acknowledgement or resolution metadata.
    pub fn transition(
        &mut self,
        to: AlertStatus,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), MonitorError> {
        if !self.can_transition(to) {
            return Err(MonitorError::validation(format!(
                "alert {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }
        match to {
            AlertStatus::Acknowledged => {
                self.acknowledged_by = actor.map(str::to_string);
                self.acknowledged_at = Some(now);
            }
            AlertStatus::Resolved | AlertStatus::FalsePositive => {
                self.resolved_at = Some(now);
            }
            AlertStatus::New => {}
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(alert_type: AlertType) -> Alert {
        Alert::open(
            NewAlert::new(Uuid::new_v4(), alert_type, Severity::Medium, "test"),
            Utc::now(),
        )
    }

    #[test]
    fn test_acknowledge_then_resolve() {
        let mut a = alert(AlertType::ResponseTime);
        a.transition(AlertStatus::Acknowledged, Some("ops"), Utc::now()).unwrap();
        assert_eq!(a.acknowledged_by.as_deref(), Some("ops"));
        assert!(a.acknowledged_at.is_some());

        a.transition(AlertStatus::Resolved, None, Utc::now()).unwrap();
        assert_eq!(a.status, AlertStatus::Resolved);
        assert!(a.transition(AlertStatus::Acknowledged, None, Utc::now()).is_err());
    }

    #[test]
    fn test_false_positive_only_for_security() {
        let mut perf = alert(AlertType::ErrorRate);
        assert!(perf.transition(AlertStatus::FalsePositive, None, Utc::now()).is_err());

        let mut sec = alert(AlertType::SensitiveData);
        sec.transition(AlertStatus::Acknowledged, None, Utc::now()).unwrap();
        sec.transition(AlertStatus::FalsePositive, None, Utc::now()).unwrap();
        assert_eq!(sec.status, AlertStatus::FalsePositive);
        // Terminal, but still holds the dedup slot.
        assert!(sec.status.is_unresolved());
        assert!(!sec.status.is_active());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("acknowledged".parse::<AlertStatus>().unwrap(), AlertStatus::Acknowledged);
        assert_eq!("FALSE_POSITIVE".parse::<AlertStatus>().unwrap(), AlertStatus::FalsePositive);
        assert!(matches!(
            "closed".parse::<AlertStatus>(),
            Err(MonitorError::Validation(_))
        ));
    }
}
