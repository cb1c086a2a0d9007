//! Request-burst detection.
//!
//! Flags an endpoint when any calendar minute in the trailing window carries
//! more requests than the configured per-minute limit.

use async_trait::async_trait;

use super::{CheckContext, SecurityCheck};
use crate::clock::{seconds, window_start};
use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Endpoint, NewAlert, Severity};
use crate::store::MinuteCount;

/// Busiest minute in the series.
pub fn peak_minute(counts: &[MinuteCount]) -> Option<MinuteCount> {
    counts.iter().copied().max_by_key(|c| c.count)
}

pub struct RateLimitCheck;

#[async_trait]
impl SecurityCheck for RateLimitCheck {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn alert_type(&self) -> AlertType {
        AlertType::RateLimit
    }

    async fn run(&self, ctx: &CheckContext, endpoint: &Endpoint) -> MonitorResult<Option<Alert>> {
        let cfg = &ctx.config;
        let since = window_start(ctx.clock.now(), seconds(cfg.rate_limit_window_secs));
        let counts = ctx.store.count_metrics_per_minute(endpoint.id, since).await?;

        let Some(peak) = peak_minute(&counts).filter(|p| p.count > cfg.rate_limit_per_minute) else {
            return Ok(None);
        };

        let severity = if peak.count > cfg.rate_limit_high_per_minute {
            Severity::High
        } else {
            Severity::Medium
        };
        let alert = ctx
            .alerts
            .create_alert(
                NewAlert::new(
                    endpoint.id,
                    AlertType::RateLimit,
                    severity,
                    format!(
                        "Possible rate limit abuse on {}: {} requests in the minute starting {}",
                        endpoint.path,
                        peak.count,
                        peak.minute.format("%H:%M")
                    ),
                )
                .with_values(peak.count as f64, cfg.rate_limit_per_minute as f64),
            )
            .await?;
        Ok(Some(alert))
    }
}
