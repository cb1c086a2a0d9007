//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals within 1..=ten years, percentages within 0..=100)
//! - Check endpoint definitions (parseable base URL, unique ids)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;

/// Upper bound for every interval and window, in seconds (ten years).
pub const MAX_INTERVAL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Upper bound for metric retention, in days.
pub const MAX_RETENTION_DAYS: u32 = 10 * 365;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let intervals = [
        ("scheduler.performance_interval_secs", config.scheduler.performance_interval_secs),
        ("scheduler.security_interval_secs", config.scheduler.security_interval_secs),
        ("scheduler.snapshot_interval_secs", config.scheduler.snapshot_interval_secs),
        ("scheduler.purge_interval_secs", config.scheduler.purge_interval_secs),
        ("prober.timeout_secs", config.prober.timeout_secs),
        ("evaluation.window_secs", config.evaluation.window_secs),
        ("evaluation.dedup_window_secs", config.evaluation.dedup_window_secs),
        ("evaluation.health_window_secs", config.evaluation.health_window_secs),
        ("security.rate_limit_window_secs", config.security.rate_limit_window_secs),
        ("security.auth_failure_window_secs", config.security.auth_failure_window_secs),
        ("security.auth_failure_dedup_secs", config.security.auth_failure_dedup_secs),
        ("security.scan_window_secs", config.security.scan_window_secs),
    ];
    for (field, value) in intervals {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        } else if value > MAX_INTERVAL_SECS {
            errors.push(ValidationError::new(
                field,
                format!("must be at most {MAX_INTERVAL_SECS} seconds"),
            ));
        }
    }

    let retention_days = config.retention.metric_retention_days;
    if retention_days == 0 {
        errors.push(ValidationError::new(
            "retention.metric_retention_days",
            "must be greater than zero",
        ));
    } else if retention_days > MAX_RETENTION_DAYS {
        errors.push(ValidationError::new(
            "retention.metric_retention_days",
            format!("must be at most {MAX_RETENTION_DAYS} days"),
        ));
    }

    let sec = &config.security;
    if sec.rate_limit_high_per_minute < sec.rate_limit_per_minute {
        errors.push(ValidationError::new(
            "security.rate_limit_high_per_minute",
            "must not be lower than rate_limit_per_minute",
        ));
    }
    if sec.auth_failure_high_threshold < sec.auth_failure_threshold {
        errors.push(ValidationError::new(
            "security.auth_failure_high_threshold",
            "must not be lower than auth_failure_threshold",
        ));
    }
    if sec.min_missing_headers == 0 {
        errors.push(ValidationError::new(
            "security.min_missing_headers",
            "must be greater than zero",
        ));
    }

    let obs = &config.observability;
    if !matches!(obs.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}', expected 'pretty' or 'json'", obs.log_format),
        ));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    let mut seen = HashSet::new();
    for (i, ep) in config.endpoints.iter().enumerate() {
        let field = |name: &str| format!("endpoints[{i}].{name}");

        if ep.path.trim().is_empty() {
            errors.push(ValidationError::new(field("path"), "must not be empty"));
        }
        match &ep.base_url {
            Some(base) => {
                if let Err(e) = Url::parse(base) {
                    errors.push(ValidationError::new(field("base_url"), e.to_string()));
                }
            }
            None => {
                if Url::parse(&ep.path).is_err() {
                    errors.push(ValidationError::new(
                        field("path"),
                        "must be an absolute URL when base_url is not set",
                    ));
                }
            }
        }
        if ep.response_time_threshold_ms == 0 {
            errors.push(ValidationError::new(
                field("response_time_threshold_ms"),
                "must be greater than zero",
            ));
        }
        if !(0.0..=100.0).contains(&ep.error_rate_threshold) {
            errors.push(ValidationError::new(
                field("error_rate_threshold"),
                "must be within 0..=100",
            ));
        }
        if !(0.0..=100.0).contains(&ep.availability_threshold) {
            errors.push(ValidationError::new(
                field("availability_threshold"),
                "must be within 0..=100",
            ));
        }
        if !seen.insert(ep.endpoint_id()) {
            errors.push(ValidationError::new(field("id"), "duplicate endpoint"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
