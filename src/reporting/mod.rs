//! Read-side reports for the surrounding service layer.
//!
//! # Data Flow
//! ```text
//! "7d" → time_range.rs → TimeRange { start, end, bucket }
//!
//! store ─┬─▶ overview.rs           counts + per-endpoint 24h uptime
//!        ├─▶ endpoint_metrics.rs   bucketed series + alerts/incidents in range
//!        └─▶ security_overview.rs  24h security alerts by type/severity/endpoint
//! ```
//!
//! # Design Decisions
//! - Reports are computed on demand from the store; nothing is cached
//! - Range strings are validated before any store access
//! - All report types are `Serialize` for direct use by an API layer

pub mod endpoint_metrics;
pub mod overview;
pub mod security_overview;
pub mod time_range;

pub use endpoint_metrics::{EndpointMetricsReport, MetricBucket, MetricSummary};
pub use overview::{EndpointUptime, MonitoringOverview};
pub use security_overview::{EndpointAlertCount, SecurityOverview};
pub use time_range::{parse_time_range, TimeRange};
