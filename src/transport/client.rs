//! reqwest-backed transport.
//!
//! # Responsibilities
//! - Issue one request per call with a hard client timeout
//! - Map reqwest failures onto [`TransportError`]
//! - Capture headers and a bounded body sample

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::{HttpResponse, HttpTransport, TransportError};
use crate::config::ProberConfig;
use crate::model::HttpMethod;

pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
    body_sample_bytes: usize,
}

impl ReqwestTransport {
    pub fn new(
        timeout: Duration,
        user_agent: &str,
        body_sample_bytes: usize,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            body_sample_bytes,
        })
    }

    pub fn from_config(config: &ProberConfig) -> Result<Self, TransportError> {
        Self::new(
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
            config.body_sample_bytes,
        )
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(&self, method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError> {
        let target = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let mut response = self
            .client
            .request(to_reqwest_method(method), target)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        let content_type = headers.get("content-type").cloned();
        let content_length = response.content_length();

        let body_sample = if self.body_sample_bytes == 0 {
            None
        } else {
            let mut buf: Vec<u8> = Vec::new();
            while buf.len() < self.body_sample_bytes {
                match response.chunk().await {
                    Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(url = %url, error = %e, "Body read interrupted, keeping partial sample");
                        break;
                    }
                }
            }
            buf.truncate(self.body_sample_bytes);
            Some(String::from_utf8_lossy(&buf).into_owned())
        };

        Ok(HttpResponse {
            status,
            headers,
            content_length,
            content_type,
            body_sample,
        })
    }
}
