//! Sensitive-data leakage detection.
//!
//! # Responsibilities
//! - Match recent response metadata (headers and body sample) against fixed
//!   detectors
//! - Raise one HIGH alert per endpoint listing what matched
//!
//! # Design Decisions
//! - Metadata is scanned in its JSON form, so quoted values arrive escaped
//!   (`\"`); the secret detector tolerates quotes and backslashes
//! - Match volume does not change the outcome: any match raises one alert

use std::collections::BTreeMap;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{CheckContext, SecurityCheck};
use crate::clock::{seconds, window_start};
use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Endpoint, Metric, NewAlert, Severity};

static DETECTORS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        (
            "email",
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex"),
        ),
        (
            "credit_card",
            Regex::new(r"\b(?:\d{4}[- ]){3}\d{4}\b|\b(?:4\d{15}|5[1-5]\d{14}|3[47]\d{13})\b")
                .expect("valid regex"),
        ),
        ("ssn", Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid regex")),
        (
            "secret",
            Regex::new(
                r#"(?i)(password|passwd|pwd|secret|token|api[_-]?key|access[_-]?key|private[_-]?key)["'\\]*\s*[:=]\s*["'\\]*[A-Za-z0-9_\-./+]{3,}"#,
            )
            .expect("valid regex"),
        ),
        (
            "jwt",
            Regex::new(r"\beyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+").expect("valid regex"),
        ),
        (
            "phone",
            Regex::new(r"(?:\+?1[-. ])?\(?\b\d{3}\)?[-. ]\d{3}[-. ]\d{4}\b").expect("valid regex"),
        ),
    ]
});

/// Match counts per detector name. Empty when nothing matched.
pub fn scan_text(text: &str) -> BTreeMap<&'static str, usize> {
    DETECTORS
        .iter()
        .filter_map(|(name, re)| {
            let hits = re.find_iter(text).count();
            (hits > 0).then_some((*name, hits))
        })
        .collect()
}

/// Scan a metric's metadata. `None` when the metric carries none.
pub fn scan_metric(metric: &Metric) -> Option<BTreeMap<&'static str, usize>> {
    let metadata = metric.metadata.as_ref()?;
    match serde_json::to_string(metadata) {
        Ok(text) => Some(scan_text(&text)),
        Err(e) => {
            tracing::debug!(metric_id = %metric.id, error = %e, "Metadata not serializable, skipping");
            None
        }
    }
}

pub struct SensitiveDataCheck;

#[async_trait]
impl SecurityCheck for SensitiveDataCheck {
    fn name(&self) -> &'static str {
        "sensitive_data"
    }

    fn alert_type(&self) -> AlertType {
        AlertType::SensitiveData
    }

    async fn run(&self, ctx: &CheckContext, endpoint: &Endpoint) -> MonitorResult<Option<Alert>> {
        let cfg = &ctx.config;
        let now = ctx.clock.now();
        let since = window_start(now, seconds(cfg.scan_window_secs));
        let metrics = ctx.store.query_metrics(endpoint.id, since, now).await?;

        let mut totals: BTreeMap<&'static str, usize> = BTreeMap::new();
        for metric in metrics
            .iter()
            .rev()
            .filter(|m| m.metadata.is_some())
            .take(cfg.sensitive_sample_size)
        {
            for (name, hits) in scan_metric(metric).unwrap_or_default() {
                *totals.entry(name).or_insert(0) += hits;
            }
        }
        if totals.is_empty() {
            return Ok(None);
        }

        let summary = totals
            .iter()
            .map(|(name, hits)| format!("{name} ({hits})"))
            .collect::<Vec<_>>()
            .join(", ");
        let total_hits: usize = totals.values().sum();

        let alert = ctx
            .alerts
            .create_alert(
                NewAlert::new(
                    endpoint.id,
                    AlertType::SensitiveData,
                    Severity::High,
                    format!("Sensitive data patterns in responses from {}: {}", endpoint.path, summary),
                )
                .with_values(total_hits as f64, 0.0),
            )
            .await?;
        Ok(Some(alert))
    }
}
