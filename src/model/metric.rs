//! Probe results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status codes in `[200, 400)` count as success.
pub fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// What the prober saw of the response besides its status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    /// Leading bytes of the body, lossily decoded. `None` when capture is off.
    pub body_sample: Option<String>,
}

impl ResponseMetadata {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// One immutable probe observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: Uuid,
    pub endpoint_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub response_time_ms: Option<u64>,
    pub status_code: Option<u16>,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Option<ResponseMetadata>,
}

impl Metric {
    /// A probe that got a response. `success` follows the status code.
    pub fn from_response(
        endpoint_id: Uuid,
        timestamp: DateTime<Utc>,
        response_time_ms: u64,
        status_code: u16,
        metadata: Option<ResponseMetadata>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint_id,
            timestamp,
            response_time_ms: Some(response_time_ms),
            status_code: Some(status_code),
            success: is_success_status(status_code),
            error_message: None,
            metadata,
        }
    }

    /// A probe that failed at the transport level.
    pub fn from_failure(
        endpoint_id: Uuid,
        timestamp: DateTime<Utc>,
        response_time_ms: Option<u64>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint_id,
            timestamp,
            response_time_ms,
            status_code: None,
            success: false,
            error_message: Some(error_message.into()),
            metadata: None,
        }
    }
}
