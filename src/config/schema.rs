//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::endpoint::{
    DEFAULT_AVAILABILITY_THRESHOLD, DEFAULT_ERROR_RATE_THRESHOLD,
    DEFAULT_RESPONSE_TIME_THRESHOLD_MS,
};
use crate::model::{Endpoint, HttpMethod};

/// Root configuration for the monitoring engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Cycle cadences.
    pub scheduler: SchedulerConfig,

    /// Probe request settings.
    pub prober: ProberConfig,

    /// Threshold evaluation and dedup windows.
    pub evaluation: EvaluationConfig,

    /// Security heuristic thresholds.
    pub security: SecurityConfig,

    /// Metric retention.
    pub retention: RetentionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Endpoints seeded into the bundled store by the binary.
    pub endpoints: Vec<EndpointConfig>,
}

/// Scheduler intervals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub performance_interval_secs: u64,
    pub security_interval_secs: u64,
    pub snapshot_interval_secs: u64,
    pub purge_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            performance_interval_secs: 60,
            security_interval_secs: 120,
            snapshot_interval_secs: 300,
            purge_interval_secs: 86_400,
        }
    }
}

/// Probe request settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProberConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Bytes of response body kept for scanning. 0 disables body capture.
    pub body_sample_bytes: usize,
}

impl Default for ProberConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("api-monitor/{}", env!("CARGO_PKG_VERSION")),
            body_sample_bytes: 2048,
        }
    }
}

/// Windows used by the threshold evaluator, dedup and health scoring.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Trailing window for error-rate and availability checks.
    pub window_secs: u64,
    /// Suppression window for repeated alerts of the same type.
    pub dedup_window_secs: u64,
    /// Trailing window for the health score.
    pub health_window_secs: u64,
    /// Status code threshold recorded on STATUS_CODE alerts.
    pub status_code_threshold: u16,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            window_secs: 3600,
            dedup_window_secs: 3600,
            health_window_secs: 86_400,
            status_code_threshold: 400,
        }
    }
}

/// Security heuristic thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub rate_limit_window_secs: u64,
    /// Requests in one minute above which RATE_LIMIT fires.
    pub rate_limit_per_minute: u64,
    /// Above this the alert is HIGH.
    pub rate_limit_high_per_minute: u64,

    pub auth_failure_window_secs: u64,
    /// 401/403 count at or above which AUTH_FAILURE fires.
    pub auth_failure_threshold: usize,
    /// Above this the alert is HIGH.
    pub auth_failure_high_threshold: usize,
    pub auth_failure_dedup_secs: u64,

    /// Trailing window for content and header scans.
    pub scan_window_secs: u64,
    pub sensitive_sample_size: usize,
    pub header_sample_size: usize,
    /// Missing security headers on one response that raise VULNERABILITY.
    pub min_missing_headers: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            rate_limit_window_secs: 300,
            rate_limit_per_minute: 100,
            rate_limit_high_per_minute: 200,
            auth_failure_window_secs: 86_400,
            auth_failure_threshold: 5,
            auth_failure_high_threshold: 20,
            auth_failure_dedup_secs: 86_400,
            scan_window_secs: 3600,
            sensitive_sample_size: 100,
            header_sample_size: 10,
            min_missing_headers: 3,
        }
    }
}

/// Metric retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub metric_retention_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            metric_retention_days: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable Prometheus metrics.
    pub metrics_enabled: bool,

    /// Metrics endpoint address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Endpoint definition as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointConfig {
    /// Stable id. Derived from method, base URL and path when omitted.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub path: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_response_time_threshold")]
    pub response_time_threshold_ms: u64,
    #[serde(default = "default_error_rate_threshold")]
    pub error_rate_threshold: f64,
    #[serde(default = "default_availability_threshold")]
    pub availability_threshold: f64,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_response_time_threshold() -> u64 {
    DEFAULT_RESPONSE_TIME_THRESHOLD_MS
}

fn default_error_rate_threshold() -> f64 {
    DEFAULT_ERROR_RATE_THRESHOLD
}

fn default_availability_threshold() -> f64 {
    DEFAULT_AVAILABILITY_THRESHOLD
}

impl EndpointConfig {
    pub fn endpoint_id(&self) -> Uuid {
        self.id.unwrap_or_else(|| {
            let key = format!(
                "{} {}{}",
                self.method,
                self.base_url.as_deref().unwrap_or(""),
                self.path
            );
            Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes())
        })
    }

    pub fn to_endpoint(&self) -> Endpoint {
        Endpoint {
            id: self.endpoint_id(),
            path: self.path.clone(),
            method: self.method,
            base_url: self.base_url.clone(),
            is_active: self.active,
            response_time_threshold_ms: self.response_time_threshold_ms,
            error_rate_threshold: self.error_rate_threshold,
            availability_threshold: self.availability_threshold,
            tags: self.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [[endpoints]]
            path = "/health"
            base_url = "http://localhost:8080"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.performance_interval_secs, 60);
        assert_eq!(config.scheduler.security_interval_secs, 120);
        assert_eq!(config.prober.timeout_secs, 30);
        assert_eq!(config.retention.metric_retention_days, 30);

        let ep = config.endpoints[0].to_endpoint();
        assert_eq!(ep.method, HttpMethod::Get);
        assert!(ep.is_active);
        assert_eq!(ep.response_time_threshold_ms, 1000);
        assert_eq!(ep.error_rate_threshold, 5.0);
        assert_eq!(ep.availability_threshold, 99.0);
    }

    #[test]
    fn test_derived_endpoint_id_is_stable() {
        let parse = || -> EndpointConfig {
            toml::from_str(
                r#"
                path = "/orders"
                method = "POST"
                base_url = "https://shop.example.com"
                "#,
            )
            .unwrap()
        };
        assert_eq!(parse().endpoint_id(), parse().endpoint_id());
    }
}
