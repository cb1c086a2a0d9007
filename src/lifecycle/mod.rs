//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (scheduler.rs):
//!     store reachable? active endpoints? → spawn four loops
//!         performance  every 60s   (runs immediately)
//!         security     every 120s  (runs immediately)
//!         snapshot     every 5min  (housekeeping.rs)
//!         purge        every 24h   (housekeeping.rs)
//!
//! Stop (shutdown.rs):
//!     trigger → loops finish the in-flight cycle → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary stops the engine
//! ```
//!
//! # Design Decisions
//! - Loops are independent; no cross-cycle locking
//! - `tick` runs a cycle directly for tests and manual triggers
//! - Start failures are reported as `false`, never as panics

pub mod housekeeping;
pub mod scheduler;
pub mod shutdown;
pub mod signals;

pub use housekeeping::{Housekeeper, PurgeReport};
pub use scheduler::{CycleKind, CycleReport, CycleRunner, Scheduler};
pub use shutdown::Shutdown;
