//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//!     → handed to MonitoringEngine at construction
//!
//! On file change (binary only):
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → endpoint definitions re-synced into the store
//!     → registry observes them on the next performance cycle
//! ```
//!
//! # Design Decisions
//! - Cadences and thresholds are fixed for the engine's lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    EndpointConfig, EvaluationConfig, MonitorConfig, ObservabilityConfig, ProberConfig,
    RetentionConfig, SchedulerConfig, SecurityConfig,
};
pub use validation::ValidationError;
