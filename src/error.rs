//! Engine-level error type.
//!
//! # Design Decisions
//! - One enum at the engine boundary; subsystem errors convert via `#[from]`
//! - Validation and not-found are surfaced to the immediate caller, never retried
//! - Scheduled cycles log these errors and continue; they never propagate

use thiserror::Error;

use crate::store::StoreError;
use crate::transport::TransportError;

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Caller supplied an invalid argument (bad time range, unknown status, illegal transition).
    #[error("validation error: {0}")]
    Validation(String),

    /// A direct lookup found nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl MonitorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
