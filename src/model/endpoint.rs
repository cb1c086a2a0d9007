//! Monitored endpoint definition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_RESPONSE_TIME_THRESHOLD_MS: u64 = 1000;
pub const DEFAULT_ERROR_RATE_THRESHOLD: f64 = 5.0;
pub const DEFAULT_AVAILABILITY_THRESHOLD: f64 = 99.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// An HTTP endpoint under observation.
///
/// Owned by the surrounding service; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Uuid,
    pub path: String,
    pub method: HttpMethod,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub response_time_threshold_ms: u64,
    /// Percent of failed probes tolerated in the evaluation window.
    pub error_rate_threshold: f64,
    /// Minimum percent of successful probes in the evaluation window.
    pub availability_threshold: f64,
    pub tags: Vec<String>,
}

impl Endpoint {
    /// Active endpoint with default thresholds and a fresh id.
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            method,
            base_url: None,
            is_active: true,
            response_time_threshold_ms: DEFAULT_RESPONSE_TIME_THRESHOLD_MS,
            error_rate_threshold: DEFAULT_ERROR_RATE_THRESHOLD,
            availability_threshold: DEFAULT_AVAILABILITY_THRESHOLD,
            tags: Vec::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// URL the prober requests: `base_url + path`, or the path alone.
    pub fn target_url(&self) -> String {
        match &self.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                if self.path.is_empty() || self.path.starts_with('/') {
                    format!("{}{}", base, self.path)
                } else {
                    format!("{}/{}", base, self.path)
                }
            }
            None => self.path.clone(),
        }
    }
}
