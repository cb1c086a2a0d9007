//! One performance cycle.
//!
//! # Responsibilities
//! - Refresh the endpoint registry
//! - Probe every active endpoint concurrently and join all results
//! - Persist one metric per probe, then evaluate or escalate it

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::Serialize;

use crate::model::{AlertType, Endpoint, NewIncident, Severity};
use crate::monitor::escalation::AlertManager;
use crate::monitor::evaluator::ThresholdEvaluator;
use crate::monitor::prober::Prober;
use crate::monitor::registry::EndpointRegistry;
use crate::observability::metrics;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceCycleReport {
    pub endpoints: usize,
    /// Probes whose metric was persisted.
    pub recorded: usize,
    pub transport_failures: usize,
    pub alerts: usize,
    pub incidents: usize,
    /// Endpoints whose step was abandoned on a store or task error.
    pub errors: usize,
}

#[derive(Debug, Default)]
struct EndpointCheck {
    recorded: bool,
    transport_failure: bool,
    alerts: usize,
    incidents: usize,
    error: bool,
}

pub struct PerformanceMonitor {
    store: Arc<dyn Store>,
    registry: Arc<EndpointRegistry>,
    prober: Prober,
    evaluator: ThresholdEvaluator,
    alerts: Arc<AlertManager>,
}

impl PerformanceMonitor {
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<EndpointRegistry>,
        prober: Prober,
        evaluator: ThresholdEvaluator,
        alerts: Arc<AlertManager>,
    ) -> Self {
        Self {
            store,
            registry,
            prober,
            evaluator,
            alerts,
        }
    }

    pub async fn run_cycle(self: &Arc<Self>) -> PerformanceCycleReport {
        let started = Instant::now();

        if let Err(e) = self.registry.refresh(self.store.as_ref()).await {
            tracing::warn!(error = %e, "Registry refresh failed, probing previous snapshot");
        }
        let endpoints = self.registry.snapshot();

        let tasks = endpoints.iter().cloned().map(|endpoint| {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.check_endpoint(&endpoint).await })
        });
        let results = join_all(tasks).await;

        let mut report = PerformanceCycleReport {
            endpoints: endpoints.len(),
            ..Default::default()
        };
        for result in results {
            match result {
                Ok(check) => {
                    report.recorded += usize::from(check.recorded);
                    report.transport_failures += usize::from(check.transport_failure);
                    report.alerts += check.alerts;
                    report.incidents += check.incidents;
                    report.errors += usize::from(check.error);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Endpoint check task failed");
                    report.errors += 1;
                }
            }
        }

        metrics::record_cycle("performance", started.elapsed());
        tracing::info!(
            endpoints = report.endpoints,
            recorded = report.recorded,
            transport_failures = report.transport_failures,
            alerts = report.alerts,
            incidents = report.incidents,
            errors = report.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Performance cycle complete"
        );
        report
    }

    async fn check_endpoint(&self, endpoint: &Endpoint) -> EndpointCheck {
        let mut check = EndpointCheck::default();
        let outcome = self.prober.probe(endpoint).await;

        if let Err(e) = self.store.insert_metric(&outcome.metric).await {
            tracing::error!(endpoint_id = %endpoint.id, error = %e, "Failed to persist metric");
            check.error = true;
            return check;
        }
        check.recorded = true;

        if let Some(failure) = outcome.failure {
            check.transport_failure = true;
            let incident = NewIncident {
                endpoint_id: endpoint.id,
                title: format!("Error detected for {}", endpoint.path),
                message: failure.to_string(),
                severity: Severity::Medium,
                alert_type: AlertType::Other,
                value: None,
                threshold: None,
            };
            match self.alerts.create_incident(incident).await {
                Ok(_) => check.incidents += 1,
                Err(e) => {
                    tracing::error!(endpoint_id = %endpoint.id, error = %e, "Failed to open incident");
                    check.error = true;
                }
            }
            return check;
        }

        match self.evaluator.evaluate(endpoint, &outcome.metric).await {
            Ok(evaluation) => {
                check.alerts = evaluation.alerts.len();
                check.incidents = evaluation.incidents.len();
            }
            Err(e) => {
                tracing::error!(endpoint_id = %endpoint.id, error = %e, "Threshold evaluation failed");
                check.error = true;
            }
        }
        check
    }
}
