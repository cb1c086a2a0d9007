//! The monitoring engine facade.
//!
//! # Responsibilities
//! - Wire store, transport and clock into every subsystem at construction
//! - Expose lifecycle control and read-side reports to the service layer
//!
//! # Design Decisions
//! - No globals: every collaborator is injected, so tests swap any of them
//! - Validation errors surface synchronously; cycle errors are only logged

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use uuid::Uuid;

use crate::clock::{seconds, Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::error::MonitorResult;
use crate::lifecycle::{CycleKind, CycleReport, CycleRunner, Housekeeper, Scheduler};
use crate::model::{Alert, AlertStatus, Incident, IncidentStatus, NewAlert, NewIncident};
use crate::monitor::{
    AlertManager, EndpointRegistry, HealthScore, HealthScorer, PerformanceMonitor, Prober,
    ThresholdEvaluator,
};
use crate::reporting::endpoint_metrics::build_endpoint_metrics;
use crate::reporting::overview::build_overview;
use crate::reporting::security_overview::build_security_overview;
use crate::reporting::{EndpointMetricsReport, MonitoringOverview, SecurityOverview};
use crate::security::{CheckContext, SecurityScanner};
use crate::store::Store;
use crate::transport::{HttpTransport, ReqwestTransport};

pub struct MonitoringEngine {
    config: MonitorConfig,
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    registry: Arc<EndpointRegistry>,
    alerts: Arc<AlertManager>,
    health: HealthScorer,
    scheduler: Scheduler,
}

impl MonitoringEngine {
    pub fn new(
        config: MonitorConfig,
        store: Arc<dyn Store>,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let registry = Arc::new(EndpointRegistry::new());
        let alerts = Arc::new(AlertManager::new(
            store.clone(),
            clock.clone(),
            seconds(config.evaluation.dedup_window_secs),
        ));

        let prober = Prober::new(
            transport,
            clock.clone(),
            StdDuration::from_secs(config.prober.timeout_secs),
        );
        let evaluator = ThresholdEvaluator::new(
            store.clone(),
            alerts.clone(),
            clock.clone(),
            seconds(config.evaluation.window_secs),
            config.evaluation.status_code_threshold,
        );
        let performance = Arc::new(PerformanceMonitor::new(
            store.clone(),
            registry.clone(),
            prober,
            evaluator,
            alerts.clone(),
        ));
        let security = Arc::new(SecurityScanner::new(CheckContext {
            store: store.clone(),
            alerts: alerts.clone(),
            clock: clock.clone(),
            config: config.security.clone(),
        }));
        let housekeeping = Housekeeper::new(
            store.clone(),
            registry.clone(),
            clock.clone(),
            Duration::days(i64::from(config.retention.metric_retention_days)),
        );
        let runner = Arc::new(CycleRunner::new(performance, security, housekeeping));
        let scheduler = Scheduler::new(runner, store.clone(), config.scheduler.clone());
        let health = HealthScorer::new(
            store.clone(),
            clock.clone(),
            seconds(config.evaluation.health_window_secs),
        );

        Self {
            config,
            store,
            clock,
            registry,
            alerts,
            health,
            scheduler,
        }
    }

    /// Engine with the reqwest transport and the wall clock.
    pub fn with_defaults(config: MonitorConfig, store: Arc<dyn Store>) -> MonitorResult<Self> {
        let transport = Arc::new(ReqwestTransport::from_config(&config.prober)?);
        Ok(Self::new(config, store, transport, Arc::new(SystemClock)))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub async fn start(&self) -> bool {
        self.scheduler.start().await
    }

    pub fn stop(&self) -> bool {
        self.scheduler.stop()
    }

    /// Stop and wait for in-flight cycles.
    pub async fn shutdown(&self) -> bool {
        self.scheduler.shutdown().await
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Endpoints in the registry as of the last performance cycle.
    pub fn active_endpoint_count(&self) -> usize {
        self.registry.len()
    }

    /// Run one cycle immediately, whether or not the scheduler is running.
    pub async fn tick(&self, kind: CycleKind) -> CycleReport {
        self.scheduler.tick(kind).await
    }

    pub async fn monitoring_overview(&self) -> MonitorResult<MonitoringOverview> {
        build_overview(self.store.as_ref(), self.clock.now(), self.is_running()).await
    }

    /// Bucketed metrics for `range` (`"24h"`, `"7d"`, ...).
    pub async fn endpoint_metrics(
        &self,
        endpoint_id: Uuid,
        range: &str,
    ) -> MonitorResult<EndpointMetricsReport> {
        build_endpoint_metrics(self.store.as_ref(), endpoint_id, range, self.clock.now()).await
    }

    pub async fn calculate_endpoint_health_score(
        &self,
        endpoint_id: Uuid,
    ) -> MonitorResult<Option<HealthScore>> {
        self.health.calculate(endpoint_id).await
    }

    pub async fn security_overview(&self) -> MonitorResult<SecurityOverview> {
        build_security_overview(self.store.as_ref(), self.clock.now()).await
    }

    pub async fn create_alert(&self, data: NewAlert) -> MonitorResult<Alert> {
        self.alerts.create_alert(data).await
    }

    pub async fn create_incident(&self, data: NewIncident) -> MonitorResult<Incident> {
        self.alerts.create_incident(data).await
    }

    /// `status` is the wire name, e.g. `"ACKNOWLEDGED"`.
    pub async fn update_alert_status(
        &self,
        alert_id: Uuid,
        status: &str,
        actor: Option<&str>,
    ) -> MonitorResult<Alert> {
        let status: AlertStatus = status.parse()?;
        self.alerts.update_alert_status(alert_id, status, actor).await
    }

    pub async fn update_incident_status(
        &self,
        incident_id: Uuid,
        status: &str,
        actor: Option<&str>,
        resolution: Option<&str>,
    ) -> MonitorResult<Incident> {
        let status: IncidentStatus = status.parse()?;
        self.alerts
            .update_incident_status(incident_id, status, actor, resolution)
            .await
    }
}
