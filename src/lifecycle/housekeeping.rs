//! Low-frequency maintenance: resource snapshots and metric retention.
//!
//! # Responsibilities
//! - Capture host and process resource usage as a [`SystemStatus`]
//! - Delete metrics and snapshots older than the retention period

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Duration;
use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};
use uuid::Uuid;

use crate::clock::{window_start, Clock};
use crate::error::MonitorResult;
use crate::model::SystemStatus;
use crate::monitor::EndpointRegistry;
use crate::observability::metrics;
use crate::store::Store;

/// Rows removed by one purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub metrics: u64,
    pub statuses: u64,
}

pub struct Housekeeper {
    store: Arc<dyn Store>,
    registry: Arc<EndpointRegistry>,
    clock: Arc<dyn Clock>,
    retention: Duration,
    system: Mutex<System>,
}

impl Housekeeper {
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<EndpointRegistry>,
        clock: Arc<dyn Clock>,
        retention: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
            retention,
            system: Mutex::new(System::new()),
        }
    }

    fn sample(&self) -> SystemStatus {
        let mut sys = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let (process_memory_bytes, uptime_secs) = match sysinfo::get_current_pid() {
            Ok(pid) => {
                sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                sys.process(pid)
                    .map(|p| (p.memory(), p.run_time()))
                    .unwrap_or((0, System::uptime()))
            }
            Err(_) => (0, System::uptime()),
        };

        SystemStatus {
            id: Uuid::new_v4(),
            timestamp: self.clock.now(),
            cpu_usage_percent: sys.global_cpu_usage(),
            memory_used_bytes: sys.used_memory(),
            memory_total_bytes: sys.total_memory(),
            process_memory_bytes,
            uptime_secs,
            active_endpoints: self.registry.len(),
        }
    }

    pub async fn snapshot(&self) -> MonitorResult<SystemStatus> {
        let status = self.sample();
        self.store.insert_system_status(&status).await?;
        tracing::debug!(
            cpu = status.cpu_usage_percent,
            memory_used = status.memory_used_bytes,
            process_memory = status.process_memory_bytes,
            active_endpoints = status.active_endpoints,
            "System status captured"
        );
        Ok(status)
    }

    /// Delete metrics and system snapshots older than the retention period.
    pub async fn purge(&self) -> MonitorResult<PurgeReport> {
        let cutoff = window_start(self.clock.now(), self.retention);
        let removed = self.store.delete_metrics_before(cutoff).await?;
        metrics::record_metrics_purged(removed);
        let statuses = self.store.delete_system_status_before(cutoff).await?;
        tracing::info!(
            cutoff = %cutoff,
            removed = removed,
            statuses = statuses,
            "Old metrics purged"
        );
        Ok(PurgeReport {
            metrics: removed,
            statuses,
        })
    }
}
