//! Performance monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Scheduler tick (performance.rs)
//!     → registry.rs refresh (store → ArcSwap snapshot)
//!     → fan-out, one task per endpoint:
//!         prober.rs      request → Metric (success or failure)
//!         store          insert_metric
//!         transport failure → escalation.rs create_incident (MEDIUM)
//!         response          → evaluator.rs
//!                               response time / status code
//!                               window error rate / availability
//!                               → escalation.rs create_alert / create_incident (HIGH)
//!     → join all, build PerformanceCycleReport
//!
//! On demand:
//!     health_score.rs  trailing metrics → 0..=100 score + breakdown
//! ```
//!
//! # Design Decisions
//! - Collect-all-settled: one endpoint's failure never aborts its siblings
//! - Exactly one metric per endpoint per cycle; no in-cycle retry
//! - Dedup lives in escalation.rs so every caller gets the same guarantees

pub mod escalation;
pub mod evaluator;
pub mod health_score;
pub mod performance;
pub mod prober;
pub mod registry;

pub use escalation::AlertManager;
pub use evaluator::{Evaluation, ThresholdEvaluator, WindowStats};
pub use health_score::{score_metrics, HealthBreakdown, HealthScore, HealthScorer};
pub use performance::{PerformanceCycleReport, PerformanceMonitor};
pub use prober::{ProbeOutcome, Prober};
pub use registry::EndpointRegistry;
