//! Security scanning subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler tick (scanner.rs)
//!     → store.list_active_endpoints
//!     → per endpoint, concurrently:
//!         rate_limit.rs      per-minute counts, trailing 5 min
//!         auth_failure.rs    401/403 count, trailing 24 h
//!         sensitive_data.rs  regex detectors over recent response metadata
//!         headers.rs         required security headers on recent responses
//!     → escalation create_alert (each check with its own dedup window)
//!     → SecurityCycleReport
//! ```
//!
//! # Design Decisions
//! - Each check is a [`SecurityCheck`]; the scanner owns the list
//! - Checks read metric history only; they never issue requests
//! - One check failing does not skip the remaining checks for that endpoint

pub mod auth_failure;
pub mod headers;
pub mod rate_limit;
pub mod scanner;
pub mod sensitive_data;

use std::sync::Arc;

use async_trait::async_trait;

use crate::clock::Clock;
use crate::config::SecurityConfig;
use crate::error::MonitorResult;
use crate::model::{Alert, AlertType, Endpoint};
use crate::monitor::AlertManager;
use crate::store::Store;

pub use scanner::{SecurityCycleReport, SecurityScanner};

/// Shared handles every check reads from.
pub struct CheckContext {
    pub store: Arc<dyn Store>,
    pub alerts: Arc<AlertManager>,
    pub clock: Arc<dyn Clock>,
    pub config: SecurityConfig,
}

/// One security heuristic run against one endpoint.
#[async_trait]
pub trait SecurityCheck: Send + Sync {
    fn name(&self) -> &'static str;

    fn alert_type(&self) -> AlertType;

    /// Returns the alert raised (or the open one it deduplicated into), if
    /// the check found something.
    async fn run(&self, ctx: &CheckContext, endpoint: &Endpoint) -> MonitorResult<Option<Alert>>;
}

/// The four built-in checks.
pub fn default_checks() -> Vec<Box<dyn SecurityCheck>> {
    vec![
        Box::new(rate_limit::RateLimitCheck),
        Box::new(auth_failure::AuthFailureCheck),
        Box::new(sensitive_data::SensitiveDataCheck),
        Box::new(headers::SecurityHeadersCheck),
    ]
}
