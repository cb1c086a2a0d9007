//! Security response header audit.
//!
//! # Responsibilities
//! - Check recent responses for the standard security headers
//! - Raise one VULNERABILITY alert at the first response missing too many
//!
//! # Design Decisions
//! - Header names compare case-insensitively
//! - Only responses that recorded headers are sampled
//! - Scanning stops at the first offending sample for the endpoint

use async_trait::async_trait;

use super::{CheckContext, SecurityCheck};
use crate::clock::{seconds, window_start};
use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Endpoint, NewAlert, ResponseMetadata, Severity};

pub const REQUIRED_HEADERS: [&str; 5] = [
    "Content-Security-Policy",
    "X-Content-Type-Options",
    "X-Frame-Options",
    "X-XSS-Protection",
    "Strict-Transport-Security",
];

pub fn missing_security_headers(metadata: &ResponseMetadata) -> Vec<&'static str> {
    REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|name| !metadata.has_header(name))
        .collect()
}

pub struct SecurityHeadersCheck;

#[async_trait]
impl SecurityCheck for SecurityHeadersCheck {
    fn name(&self) -> &'static str {
        "security_headers"
    }

    fn alert_type(&self) -> AlertType {
        AlertType::Vulnerability
    }

    async fn run(&self, ctx: &CheckContext, endpoint: &Endpoint) -> MonitorResult<Option<Alert>> {
        let cfg = &ctx.config;
        let now = ctx.clock.now();
        let since = window_start(now, seconds(cfg.scan_window_secs));
        let metrics = ctx.store.query_metrics(endpoint.id, since, now).await?;

        let samples = metrics
            .iter()
            .rev()
            .filter_map(|m| m.metadata.as_ref())
            .filter(|meta| !meta.headers.is_empty())
            .take(cfg.header_sample_size);

        for metadata in samples {
            let missing = missing_security_headers(metadata);
            if missing.len() < cfg.min_missing_headers {
                continue;
            }
            let alert = ctx
                .alerts
                .create_alert(
                    NewAlert::new(
                        endpoint.id,
                        AlertType::Vulnerability,
                        Severity::Medium,
                        format!(
                            "Missing security headers on {}: {}",
                            endpoint.path,
                            missing.join(", ")
                        ),
                    )
                    .with_values(missing.len() as f64, cfg.min_missing_headers as f64),
                )
                .await?;
            return Ok(Some(alert));
        }
        Ok(None)
    }
}
