//! Domain records shared by every subsystem.
//!
//! # Data Flow
//! ```text
//! Endpoint (read-only, owned by the surrounding service)
//!     → Prober → Metric (append-only)
//!     → Evaluator / Scanner → Alert ──┐
//!                                     ├─▶ Incident (at most one unresolved per endpoint)
//!     → Escalation ───────────────────┘
//!
//! Housekeeping → SystemStatus
//! ```
//!
//! # Design Decisions
//! - Status machines live on the records themselves; callers cannot skip states
//! - Enum wire names are SCREAMING_SNAKE_CASE to match the external store
//! - `Metric::success` is derived from the status code, never set directly

pub mod alert;
pub mod endpoint;
pub mod incident;
pub mod metric;
pub mod system_status;

pub use alert::{Alert, AlertStatus, AlertType, NewAlert, Severity};
pub use endpoint::{Endpoint, HttpMethod};
pub use incident::{Incident, IncidentStatus, NewIncident};
pub use metric::{is_success_status, Metric, ResponseMetadata};
pub use system_status::SystemStatus;
