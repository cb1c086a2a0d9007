//! Authentication-failure burst detection.

use async_trait::async_trait;

use super::{CheckContext, SecurityCheck};
use crate::clock::{seconds, window_start};
use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Endpoint, Metric, NewAlert, Severity};

pub fn is_auth_failure(metric: &Metric) -> bool {
    matches!(metric.status_code, Some(401) | Some(403))
}

pub struct AuthFailureCheck;

#[async_trait]
impl SecurityCheck for AuthFailureCheck {
    fn name(&self) -> &'static str {
        "auth_failure"
    }

    fn alert_type(&self) -> AlertType {
        AlertType::AuthFailure
    }

    async fn run(&self, ctx: &CheckContext, endpoint: &Endpoint) -> MonitorResult<Option<Alert>> {
        let cfg = &ctx.config;
        let now = ctx.clock.now();
        let since = window_start(now, seconds(cfg.auth_failure_window_secs));
        let metrics = ctx.store.query_metrics(endpoint.id, since, now).await?;

        let failures = metrics.iter().filter(|m| is_auth_failure(m)).count();
        if failures < cfg.auth_failure_threshold {
            return Ok(None);
        }

        let severity = if failures > cfg.auth_failure_high_threshold {
            Severity::High
        } else {
            Severity::Medium
        };
        let alert = ctx
            .alerts
            .create_alert_within(
                NewAlert::new(
                    endpoint.id,
                    AlertType::AuthFailure,
                    severity,
                    format!(
                        "{} authentication failures (401/403) on {} in the last {}h",
                        failures,
                        endpoint.path,
                        cfg.auth_failure_window_secs / 3600
                    ),
                )
                .with_values(failures as f64, cfg.auth_failure_threshold as f64),
                seconds(cfg.auth_failure_dedup_secs),
            )
            .await?;
        Ok(Some(alert))
    }
}
