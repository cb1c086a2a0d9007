//! Threshold evaluation of fresh metrics.
//!
//! # Responsibilities
//! - Check one metric against its endpoint's latency and status thresholds
//! - Check trailing-window error rate and availability
//! - Escalate severe window breaches to HIGH incidents
//!
//! # Design Decisions
//! - Checks run in a fixed order and independently of each other
//! - An empty window skips the window checks
//! - Escalation reuses the open alert of the same type via the dedup path

use std::sync::Arc;

use chrono::Duration;

use crate::clock::{window_start, Clock};
use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Endpoint, Incident, Metric, NewAlert, NewIncident, Severity};
use crate::monitor::escalation::AlertManager;
use crate::store::Store;

/// Success/failure counts over a window of metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStats {
    pub total: usize,
    pub failed: usize,
}

impl WindowStats {
    /// `None` for an empty window.
    pub fn from_metrics(metrics: &[Metric]) -> Option<Self> {
        if metrics.is_empty() {
            return None;
        }
        Some(Self {
            total: metrics.len(),
            failed: metrics.iter().filter(|m| !m.success).count(),
        })
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failed
    }

    /// Failed share in percent.
    pub fn error_rate(&self) -> f64 {
        self.failed as f64 / self.total as f64 * 100.0
    }

    /// Succeeded share in percent.
    pub fn availability(&self) -> f64 {
        self.succeeded() as f64 / self.total as f64 * 100.0
    }
}

/// Alerts and incidents touched by one evaluation. Entries may be
/// pre-existing ones returned by dedup.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub alerts: Vec<Alert>,
    pub incidents: Vec<Incident>,
}

impl Evaluation {
    pub fn alert_types(&self) -> Vec<AlertType> {
        self.alerts.iter().map(|a| a.alert_type).collect()
    }
}

pub struct ThresholdEvaluator {
    store: Arc<dyn Store>,
    alerts: Arc<AlertManager>,
    clock: Arc<dyn Clock>,
    window: Duration,
    status_code_threshold: u16,
}

impl ThresholdEvaluator {
    pub fn new(
        store: Arc<dyn Store>,
        alerts: Arc<AlertManager>,
        clock: Arc<dyn Clock>,
        window: Duration,
        status_code_threshold: u16,
    ) -> Self {
        Self {
            store,
            alerts,
            clock,
            window,
            status_code_threshold,
        }
    }

    pub async fn evaluate(&self, endpoint: &Endpoint, metric: &Metric) -> MonitorResult<Evaluation> {
        let mut outcome = Evaluation::default();

        if let Some(response_time) = metric.response_time_ms {
            if response_time > endpoint.response_time_threshold_ms {
                let alert = self
                    .alerts
                    .create_alert(
                        NewAlert::new(
                            endpoint.id,
                            AlertType::ResponseTime,
                            Severity::Medium,
                            format!(
                                "Response time {}ms exceeds threshold {}ms for {}",
                                response_time, endpoint.response_time_threshold_ms, endpoint.path
                            ),
                        )
                        .with_values(response_time as f64, endpoint.response_time_threshold_ms as f64),
                    )
                    .await?;
                outcome.alerts.push(alert);
            }
        }

        if !metric.success {
            let status = metric.status_code.unwrap_or(0);
            let severity = if status >= 500 { Severity::High } else { Severity::Medium };
            let alert = self
                .alerts
                .create_alert(
                    NewAlert::new(
                        endpoint.id,
                        AlertType::StatusCode,
                        severity,
                        format!("{} {} returned status {}", endpoint.method, endpoint.path, status),
                    )
                    .with_values(f64::from(status), f64::from(self.status_code_threshold)),
                )
                .await?;
            outcome.alerts.push(alert);
        }

        let now = self.clock.now();
        let window = self
            .store
            .query_metrics(endpoint.id, window_start(now, self.window), now)
            .await?;
        let Some(stats) = WindowStats::from_metrics(&window) else {
            return Ok(outcome);
        };

        let error_rate = stats.error_rate();
        if error_rate > endpoint.error_rate_threshold {
            let escalate = error_rate > endpoint.error_rate_threshold * 2.0;
            let message = format!(
                "Error rate {:.1}% exceeds threshold {:.1}% for {} ({} of {} requests failed)",
                error_rate, endpoint.error_rate_threshold, endpoint.path, stats.failed, stats.total
            );
            let alert = self
                .alerts
                .create_alert(
                    NewAlert::new(
                        endpoint.id,
                        AlertType::ErrorRate,
                        if escalate { Severity::High } else { Severity::Medium },
                        message.clone(),
                    )
                    .with_values(error_rate, endpoint.error_rate_threshold),
                )
                .await?;
            outcome.alerts.push(alert);

            if escalate {
                let incident = self
                    .alerts
                    .create_incident(NewIncident {
                        endpoint_id: endpoint.id,
                        title: format!("High Error Rate for {}", endpoint.path),
                        message,
                        severity: Severity::High,
                        alert_type: AlertType::ErrorRate,
                        value: Some(error_rate),
                        threshold: Some(endpoint.error_rate_threshold),
                    })
                    .await?;
                outcome.incidents.push(incident);
            }
        }

        let availability = stats.availability();
        if availability < endpoint.availability_threshold {
            let escalate = availability < endpoint.availability_threshold - 10.0;
            let message = format!(
                "Availability {:.1}% below threshold {:.1}% for {}",
                availability, endpoint.availability_threshold, endpoint.path
            );
            let alert = self
                .alerts
                .create_alert(
                    NewAlert::new(
                        endpoint.id,
                        AlertType::Availability,
                        if escalate { Severity::High } else { Severity::Medium },
                        message.clone(),
                    )
                    .with_values(availability, endpoint.availability_threshold),
                )
                .await?;
            outcome.alerts.push(alert);

            if escalate {
                let incident = self
                    .alerts
                    .create_incident(NewIncident {
                        endpoint_id: endpoint.id,
                        title: format!("Low Availability for {}", endpoint.path),
                        message,
                        severity: Severity::High,
                        alert_type: AlertType::Availability,
                        value: Some(availability),
                        threshold: Some(endpoint.availability_threshold),
                    })
                    .await?;
                outcome.incidents.push(incident);
            }
        }

        Ok(outcome)
    }
}
