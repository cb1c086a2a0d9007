//! Single-endpoint probing.
//!
//! # Responsibilities
//! - Issue one request per endpoint with the endpoint's method
//! - Measure wall-clock latency from dispatch to response or failure
//! - Turn every outcome into exactly one [`Metric`]

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::model::{Endpoint, Metric};
use crate::observability::metrics;
use crate::transport::{HttpTransport, TransportError};

/// Result of one probe. `failure` is set when no response arrived.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub metric: Metric,
    pub failure: Option<TransportError>,
}

pub struct Prober {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            transport,
            clock,
            timeout,
        }
    }

    pub async fn probe(&self, endpoint: &Endpoint) -> ProbeOutcome {
        let url = endpoint.target_url();
        let timestamp = self.clock.now();
        let start = Instant::now();

        let result = match tokio::time::timeout(
            self.timeout,
            self.transport.perform(endpoint.method, &url),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        };
        let elapsed = start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status;
                let metric = Metric::from_response(
                    endpoint.id,
                    timestamp,
                    elapsed_ms,
                    status,
                    Some(response.into_metadata()),
                );
                metrics::record_probe(
                    &endpoint.path,
                    if metric.success { "success" } else { "error_status" },
                    elapsed,
                );
                tracing::debug!(
                    endpoint_id = %endpoint.id,
                    url = %url,
                    status = status,
                    latency_ms = elapsed_ms,
                    "Probe completed"
                );
                ProbeOutcome {
                    metric,
                    failure: None,
                }
            }
            Err(e) => {
                metrics::record_probe(&endpoint.path, "transport_error", elapsed);
                tracing::warn!(
                    endpoint_id = %endpoint.id,
                    url = %url,
                    latency_ms = elapsed_ms,
                    error = %e,
                    "Probe failed"
                );
                ProbeOutcome {
                    metric: Metric::from_failure(endpoint.id, timestamp, Some(elapsed_ms), e.to_string()),
                    failure: Some(e),
                }
            }
        }
    }
}
