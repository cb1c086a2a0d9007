//! HTTP transport boundary.
//!
//! # Data Flow
//! ```text
//! Prober
//!     → HttpTransport::perform(method, url)
//!     → Ok(HttpResponse)       any status code, including 4xx/5xx
//!     → Err(TransportError)    DNS, connect, timeout, malformed URL
//! ```
//!
//! # Design Decisions
//! - Non-2xx is a response, not an error
//! - Headers are captured lower-cased for case-insensitive scanning
//! - Body capture is bounded; the cap is owned by the transport

pub mod client;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{HttpMethod, ResponseMetadata};

pub use client::ReqwestTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// What came back from a probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body_sample: Option<String>,
}

impl HttpResponse {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn into_metadata(self) -> ResponseMetadata {
        ResponseMetadata {
            headers: self.headers,
            content_length: self.content_length,
            content_type: self.content_type,
            body_sample: self.body_sample,
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn perform(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError>;
}
