//! Periodic cycle scheduling.
//!
//! # Responsibilities
//! - Run performance and security cycles on independent cadences
//! - Run snapshot and purge housekeeping on their own low-frequency timers
//! - Expose start/stop and a direct `tick` for one-off runs
//!
//! # Design Decisions
//! - Each loop is "run, then wait one interval"
//! - A per-kind lock serializes runs, so a restart or a `tick` waits for an
//!   in-flight cycle of the same kind instead of overlapping it
//! - Stop cancels future firings only; an in-flight cycle runs to completion
//! - Housekeeping first fires one interval after start

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use crate::config::SchedulerConfig;
use crate::lifecycle::housekeeping::{Housekeeper, PurgeReport};
use crate::lifecycle::shutdown::Shutdown;
use crate::model::SystemStatus;
use crate::monitor::{PerformanceCycleReport, PerformanceMonitor};
use crate::observability::metrics;
use crate::security::{SecurityCycleReport, SecurityScanner};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    Performance,
    Security,
    Snapshot,
    Purge,
}

impl CycleKind {
    pub const ALL: [CycleKind; 4] = [
        CycleKind::Performance,
        CycleKind::Security,
        CycleKind::Snapshot,
        CycleKind::Purge,
    ];

    fn index(&self) -> usize {
        match self {
            CycleKind::Performance => 0,
            CycleKind::Security => 1,
            CycleKind::Snapshot => 2,
            CycleKind::Purge => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleKind::Performance => "performance",
            CycleKind::Security => "security",
            CycleKind::Snapshot => "snapshot",
            CycleKind::Purge => "purge",
        }
    }
}

/// Outcome of a single cycle run. Housekeeping failures are `None`.
#[derive(Debug, Clone, Serialize)]
pub enum CycleReport {
    Performance(PerformanceCycleReport),
    Security(SecurityCycleReport),
    Snapshot(Option<SystemStatus>),
    Purge(Option<PurgeReport>),
}

/// Everything a cycle needs, shared by the loops and `tick`.
pub struct CycleRunner {
    performance: Arc<PerformanceMonitor>,
    security: Arc<SecurityScanner>,
    housekeeping: Housekeeper,
    /// One lock per [`CycleKind`], held for the whole run.
    running: [AsyncMutex<()>; 4],
}

impl CycleRunner {
    pub fn new(
        performance: Arc<PerformanceMonitor>,
        security: Arc<SecurityScanner>,
        housekeeping: Housekeeper,
    ) -> Self {
        Self {
            performance,
            security,
            housekeeping,
            running: Default::default(),
        }
    }

    /// Run one cycle of `kind`, waiting for any in-flight run of the same kind.
    pub async fn run(&self, kind: CycleKind) -> CycleReport {
        let _guard = self.running[kind.index()].lock().await;
        match kind {
            CycleKind::Performance => CycleReport::Performance(self.performance.run_cycle().await),
            CycleKind::Security => CycleReport::Security(self.security.run_cycle().await),
            CycleKind::Snapshot => {
                let started = Instant::now();
                let status = match self.housekeeping.snapshot().await {
                    Ok(status) => Some(status),
                    Err(e) => {
                        tracing::error!(error = %e, "System snapshot failed");
                        None
                    }
                };
                metrics::record_cycle(kind.as_str(), started.elapsed());
                CycleReport::Snapshot(status)
            }
            CycleKind::Purge => {
                let started = Instant::now();
                let removed = match self.housekeeping.purge().await {
                    Ok(removed) => Some(removed),
                    Err(e) => {
                        tracing::error!(error = %e, "Retention purge failed");
                        None
                    }
                };
                metrics::record_cycle(kind.as_str(), started.elapsed());
                CycleReport::Purge(removed)
            }
        }
    }
}

struct Running {
    shutdown: Shutdown,
    handles: Vec<JoinHandle<()>>,
}

pub struct Scheduler {
    runner: Arc<CycleRunner>,
    store: Arc<dyn Store>,
    intervals: SchedulerConfig,
    state: Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(runner: Arc<CycleRunner>, store: Arc<dyn Store>, intervals: SchedulerConfig) -> Self {
        Self {
            runner,
            store,
            intervals,
            state: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, Option<Running>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn interval(&self, kind: CycleKind) -> Duration {
        let secs = match kind {
            CycleKind::Performance => self.intervals.performance_interval_secs,
            CycleKind::Security => self.intervals.security_interval_secs,
            CycleKind::Snapshot => self.intervals.snapshot_interval_secs,
            CycleKind::Purge => self.intervals.purge_interval_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn is_running(&self) -> bool {
        self.state().is_some()
    }

    /// Start all loops. Returns `false` if already running, if the store is
    /// unreachable, or if there is nothing to monitor.
    pub async fn start(&self) -> bool {
        if self.is_running() {
            tracing::warn!("Scheduler already running");
            return false;
        }

        let active = match self.store.list_active_endpoints().await {
            Ok(endpoints) => endpoints.len(),
            Err(e) => {
                tracing::error!(error = %e, "Scheduler not started, store unavailable");
                return false;
            }
        };
        if active == 0 {
            tracing::warn!("Scheduler not started, no active endpoints");
            return false;
        }

        let mut state = self.state();
        if state.is_some() {
            return false;
        }

        let shutdown = Shutdown::new();
        let handles = CycleKind::ALL
            .iter()
            .map(|&kind| {
                let delay_first = matches!(kind, CycleKind::Snapshot | CycleKind::Purge);
                spawn_loop(
                    Arc::clone(&self.runner),
                    kind,
                    self.interval(kind),
                    delay_first,
                    shutdown.subscribe(),
                )
            })
            .collect();
        *state = Some(Running { shutdown, handles });

        tracing::info!(
            active_endpoints = active,
            performance_secs = self.intervals.performance_interval_secs,
            security_secs = self.intervals.security_interval_secs,
            "Scheduler started"
        );
        true
    }

    /// Cancel future cycles. Returns `false` if the scheduler was not running.
    pub fn stop(&self) -> bool {
        match self.state().take() {
            Some(running) => {
                running.shutdown.trigger();
                tracing::info!("Scheduler stopped");
                true
            }
            None => {
                tracing::debug!("Scheduler stop requested while not running");
                false
            }
        }
    }

    /// Stop and wait for in-flight cycles to finish.
    pub async fn shutdown(&self) -> bool {
        let Some(running) = self.state().take() else {
            return false;
        };
        running.shutdown.trigger();
        for handle in running.handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Cycle loop ended abnormally");
            }
        }
        tracing::info!("Scheduler shut down");
        true
    }

    /// Run one cycle now, independent of the loops.
    pub async fn tick(&self, kind: CycleKind) -> CycleReport {
        self.runner.run(kind).await
    }
}

fn spawn_loop(
    runner: Arc<CycleRunner>,
    kind: CycleKind,
    interval: Duration,
    delay_first: bool,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if delay_first {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => return,
            }
        }
        loop {
            runner.run(kind).await;
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.recv() => break,
            }
        }
        tracing::debug!(cycle = kind.as_str(), "Cycle loop exited");
    })
}
