//! Time-bucketed metric series for one endpoint.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{MonitorError, MonitorResult};
use crate::model::{Alert, Endpoint, Incident, Metric};
use crate::reporting::time_range::{parse_time_range, TimeRange};
use crate::store::{AlertFilter, IncidentFilter, Store};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBucket {
    pub start: DateTime<Utc>,
    pub requests: usize,
    pub failures: usize,
    pub availability_percent: f64,
    pub avg_response_time_ms: Option<f64>,
    pub min_response_time_ms: Option<u64>,
    pub max_response_time_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub requests: usize,
    pub failures: usize,
    pub availability_percent: Option<f64>,
    pub avg_response_time_ms: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointMetricsReport {
    pub endpoint: Endpoint,
    pub range: TimeRange,
    pub summary: MetricSummary,
    /// Non-empty buckets only, oldest first.
    pub buckets: Vec<MetricBucket>,
    pub alerts: Vec<Alert>,
    pub incidents: Vec<Incident>,
}

#[derive(Default)]
struct Accumulator {
    requests: usize,
    failures: usize,
    times: Vec<u64>,
}

impl Accumulator {
    fn push(&mut self, metric: &Metric) {
        self.requests += 1;
        if !metric.success {
            self.failures += 1;
        }
        if let Some(t) = metric.response_time_ms {
            self.times.push(t);
        }
    }

    fn avg(&self) -> Option<f64> {
        (!self.times.is_empty())
            .then(|| self.times.iter().sum::<u64>() as f64 / self.times.len() as f64)
    }

    fn availability(&self) -> Option<f64> {
        (self.requests > 0)
            .then(|| (self.requests - self.failures) as f64 / self.requests as f64 * 100.0)
    }
}

/// Group metrics into fixed-width buckets aligned to `range.start`.
pub fn bucketize(metrics: &[Metric], range: &TimeRange) -> Vec<MetricBucket> {
    let width = range.bucket.num_seconds().max(1);
    let mut buckets: BTreeMap<i64, Accumulator> = BTreeMap::new();

    for metric in metrics
        .iter()
        .filter(|m| m.timestamp >= range.start && m.timestamp <= range.end)
    {
        let index = (metric.timestamp - range.start).num_seconds() / width;
        buckets.entry(index).or_default().push(metric);
    }

    buckets
        .into_iter()
        .map(|(index, acc)| MetricBucket {
            start: range.start + range.bucket * index as i32,
            requests: acc.requests,
            failures: acc.failures,
            availability_percent: acc.availability().unwrap_or(0.0),
            avg_response_time_ms: acc.avg(),
            min_response_time_ms: acc.times.iter().min().copied(),
            max_response_time_ms: acc.times.iter().max().copied(),
        })
        .collect()
}

pub fn summarize(metrics: &[Metric]) -> MetricSummary {
    let mut acc = Accumulator::default();
    metrics.iter().for_each(|m| acc.push(m));
    MetricSummary {
        requests: acc.requests,
        failures: acc.failures,
        availability_percent: acc.availability(),
        avg_response_time_ms: acc.avg(),
    }
}

pub async fn build_endpoint_metrics(
    store: &dyn Store,
    endpoint_id: Uuid,
    range: &str,
    now: DateTime<Utc>,
) -> MonitorResult<EndpointMetricsReport> {
    let range = parse_time_range(range, now)?;
    let endpoint = store
        .get_endpoint(endpoint_id)
        .await?
        .ok_or_else(|| MonitorError::not_found("endpoint", endpoint_id))?;

    let metrics = store.query_metrics(endpoint_id, range.start, range.end).await?;
    let alerts = store
        .list_alerts(&AlertFilter {
            endpoint_id: Some(endpoint_id),
            since: Some(range.start),
            until: Some(range.end),
            ..Default::default()
        })
        .await?;
    let incidents = store
        .list_incidents(&IncidentFilter {
            endpoint_id: Some(endpoint_id),
            since: Some(range.start),
            ..Default::default()
        })
        .await?;

    Ok(EndpointMetricsReport {
        endpoint,
        summary: summarize(&metrics),
        buckets: bucketize(&metrics, &range),
        range,
        alerts,
        incidents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_bucketize_one_hour() {
        let now = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let range = parse_time_range("1h", now).unwrap();
        let id = Uuid::new_v4();
        let at = |mins_ago: i64| now - Duration::minutes(mins_ago);

        let metrics = vec![
            Metric::from_response(id, at(59) + Duration::seconds(10), 100, 200, None),
            Metric::from_response(id, at(59) + Duration::seconds(50), 300, 500, None),
            Metric::from_response(id, at(10), 50, 200, None),
            // Outside the range.
            Metric::from_response(id, at(90), 50, 200, None),
        ];

        let buckets = bucketize(&metrics, &range);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, at(59));
        assert_eq!(buckets[0].requests, 2);
        assert_eq!(buckets[0].failures, 1);
        assert_eq!(buckets[0].availability_percent, 50.0);
        assert_eq!(buckets[0].avg_response_time_ms, Some(200.0));
        assert_eq!(buckets[0].min_response_time_ms, Some(100));
        assert_eq!(buckets[0].max_response_time_ms, Some(300));
        assert_eq!(buckets[1].start, at(10));

        let summary = summarize(&metrics[..3]);
        assert_eq!(summary.requests, 3);
        assert_eq!(summary.failures, 1);
    }
}
