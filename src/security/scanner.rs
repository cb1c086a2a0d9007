//! One security cycle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::Serialize;

use super::{default_checks, CheckContext, SecurityCheck};
use crate::model::{AlertType, Endpoint};
use crate::observability::metrics;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityCycleReport {
    pub endpoints: usize,
    /// Findings per alert type, counting deduplicated ones.
    pub findings: BTreeMap<AlertType, usize>,
    /// Check runs that failed with an error.
    pub errors: usize,
}

impl SecurityCycleReport {
    pub fn total_findings(&self) -> usize {
        self.findings.values().sum()
    }
}

pub struct SecurityScanner {
    ctx: CheckContext,
    checks: Vec<Box<dyn SecurityCheck>>,
}

impl SecurityScanner {
    pub fn new(ctx: CheckContext) -> Self {
        Self::with_checks(ctx, default_checks())
    }

    pub fn with_checks(ctx: CheckContext, checks: Vec<Box<dyn SecurityCheck>>) -> Self {
        Self { ctx, checks }
    }

    pub async fn run_cycle(self: &Arc<Self>) -> SecurityCycleReport {
        let started = Instant::now();
        let mut report = SecurityCycleReport::default();

        let endpoints = match self.ctx.store.list_active_endpoints().await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                tracing::error!(error = %e, "Security cycle skipped, endpoints unavailable");
                report.errors += 1;
                return report;
            }
        };
        report.endpoints = endpoints.len();

        let tasks = endpoints.into_iter().map(|endpoint| {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.scan_endpoint(&endpoint).await })
        });

        for result in join_all(tasks).await {
            match result {
                Ok((findings, errors)) => {
                    for alert_type in findings {
                        *report.findings.entry(alert_type).or_insert(0) += 1;
                    }
                    report.errors += errors;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Security scan task failed");
                    report.errors += 1;
                }
            }
        }

        metrics::record_cycle("security", started.elapsed());
        tracing::info!(
            endpoints = report.endpoints,
            findings = report.total_findings(),
            errors = report.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Security cycle complete"
        );
        report
    }

    /// Run every check for one endpoint. Returns finding types and error count.
    async fn scan_endpoint(&self, endpoint: &Endpoint) -> (Vec<AlertType>, usize) {
        let mut findings = Vec::new();
        let mut errors = 0;
        for check in &self.checks {
            match check.run(&self.ctx, endpoint).await {
                Ok(Some(_)) => findings.push(check.alert_type()),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        endpoint_id = %endpoint.id,
                        check = check.name(),
                        error = %e,
                        "Security check failed"
                    );
                    errors += 1;
                }
            }
        }
        (findings, errors)
    }
}
