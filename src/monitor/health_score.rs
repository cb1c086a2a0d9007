//! Composite endpoint health score.
//!
//! # Responsibilities
//! - Score an endpoint 0..=100 from its trailing metrics
//! - Report each component in human units alongside its points
//!
//! # Scoring
//! ```text
//! availability   40 × success / total
//! response time  30 × min(1, threshold_ms / avg_ms)        avg 0 → 1
//! error rate     20 × min(1, threshold_pct / observed_pct) observed 0 → 0.1
//! stability      10 × min(1, 100 / std_dev_ms)             ≤1 sample → 1
//! ```

use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::{window_start, Clock};
use crate::error::{MonitorError, MonitorResult};
use crate::model::{Endpoint, Metric};
use crate::store::Store;

const AVAILABILITY_WEIGHT: f64 = 40.0;
const RESPONSE_TIME_WEIGHT: f64 = 30.0;
const ERROR_RATE_WEIGHT: f64 = 20.0;
const STABILITY_WEIGHT: f64 = 10.0;
const STABILITY_REFERENCE_MS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthBreakdown {
    pub sample_count: usize,
    pub availability_percent: f64,
    pub avg_response_time_ms: f64,
    pub error_rate_percent: f64,
    pub std_deviation_ms: f64,
    pub availability_points: f64,
    pub response_time_points: f64,
    pub error_rate_points: f64,
    pub stability_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthScore {
    pub endpoint_id: Uuid,
    pub score: u8,
    pub breakdown: HealthBreakdown,
}

/// Population standard deviation of the nonzero samples; 1 for ≤1 sample.
fn std_deviation(samples: &[f64]) -> f64 {
    let nonzero: Vec<f64> = samples.iter().copied().filter(|v| *v != 0.0).collect();
    if nonzero.len() <= 1 {
        return 1.0;
    }
    let n = nonzero.len() as f64;
    let mean = nonzero.iter().sum::<f64>() / n;
    let variance = nonzero.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Ratio capped at 1. A zero denominator counts as fully healthy.
fn capped_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        1.0
    } else {
        (numerator / denominator).min(1.0)
    }
}

/// Score a set of metrics. `None` when the set is empty.
pub fn score_metrics(endpoint: &Endpoint, metrics: &[Metric]) -> Option<HealthScore> {
    if metrics.is_empty() {
        return None;
    }
    let total = metrics.len() as f64;
    let succeeded = metrics.iter().filter(|m| m.success).count() as f64;

    let availability_percent = succeeded / total * 100.0;
    let availability_points = succeeded / total * AVAILABILITY_WEIGHT;

    let times: Vec<f64> = metrics
        .iter()
        .filter_map(|m| m.response_time_ms)
        .map(|t| t as f64)
        .collect();
    let avg_response_time_ms = if times.is_empty() {
        0.0
    } else {
        times.iter().sum::<f64>() / times.len() as f64
    };
    let effective_avg = if avg_response_time_ms == 0.0 { 1.0 } else { avg_response_time_ms };
    let response_time_points =
        capped_ratio(endpoint.response_time_threshold_ms as f64, effective_avg) * RESPONSE_TIME_WEIGHT;

    let error_rate_percent = (total - succeeded) / total * 100.0;
    let effective_error_rate = if error_rate_percent == 0.0 { 0.1 } else { error_rate_percent };
    let error_rate_points =
        capped_ratio(endpoint.error_rate_threshold, effective_error_rate) * ERROR_RATE_WEIGHT;

    let std_deviation_ms = std_deviation(&times);
    let stability_points = capped_ratio(STABILITY_REFERENCE_MS, std_deviation_ms) * STABILITY_WEIGHT;

    let total_points =
        availability_points + response_time_points + error_rate_points + stability_points;

    Some(HealthScore {
        endpoint_id: endpoint.id,
        score: total_points.round().clamp(0.0, 100.0) as u8,
        breakdown: HealthBreakdown {
            sample_count: metrics.len(),
            availability_percent,
            avg_response_time_ms,
            error_rate_percent,
            std_deviation_ms,
            availability_points,
            response_time_points,
            error_rate_points,
            stability_points,
        },
    })
}

pub struct HealthScorer {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl HealthScorer {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self { store, clock, window }
    }

    /// `Ok(None)` when the endpoint has no metrics in the window.
    pub async fn calculate(&self, endpoint_id: Uuid) -> MonitorResult<Option<HealthScore>> {
        let endpoint = self
            .store
            .get_endpoint(endpoint_id)
            .await?
            .ok_or_else(|| MonitorError::not_found("endpoint", endpoint_id))?;

        let now = self.clock.now();
        let metrics = self
            .store
            .query_metrics(endpoint_id, window_start(now, self.window), now)
            .await?;
        Ok(score_metrics(&endpoint, &metrics))
    }
}
