//! API health and security monitoring engine.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod monitor;
pub mod observability;
pub mod reporting;
pub mod security;
pub mod store;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MonitorConfig;
pub use engine::MonitoringEngine;
pub use error::{MonitorError, MonitorResult};
pub use lifecycle::{CycleKind, CycleReport};
pub use store::{InMemoryStore, Store};
