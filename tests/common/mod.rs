//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use uuid::Uuid;

use api_monitor::clock::ManualClock;
use api_monitor::config::MonitorConfig;
use api_monitor::model::{
    Alert, AlertType, Endpoint, HttpMethod, Incident, Metric, SystemStatus,
};
use api_monitor::store::{
    AlertFilter, IncidentFilter, InMemoryStore, MinuteCount, Store, StoreError, StoreResult,
};
use api_monitor::transport::{HttpResponse, HttpTransport, TransportError};
use api_monitor::MonitoringEngine;

/// A canned reply from the mock backend.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Start a programmable backend on an ephemeral port and return its address.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        // Drain the request head; the backend ignores its contents.
                        let mut buf = [0u8; 4096];
                        let _ = socket.read(&mut buf).await;

                        let reply = f().await;
                        let mut head = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
                            reply.status,
                            reason(reply.status),
                            reply.body.len()
                        );
                        for (name, value) in &reply.headers {
                            head.push_str(&format!("{name}: {value}\r\n"));
                        }
                        head.push_str("\r\n");
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(reply.body.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that always returns the same reply.
pub async fn start_mock_backend(reply: MockReply) -> SocketAddr {
    start_programmable_backend(move || {
        let reply = reply.clone();
        async move { reply }
    })
    .await
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// One scripted transport outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(HttpResponse),
    /// Respond after sleeping, to push latency past a threshold.
    Slow(Duration, HttpResponse),
    Refuse,
}

impl Scripted {
    pub fn status(status: u16) -> Self {
        Scripted::Respond(HttpResponse::with_status(status))
    }
}

/// Transport answering from per-URL queues. The last entry of a queue
/// repeats once the queue is down to one; unknown URLs get a 200.
/// Tracks how many requests were in flight at once.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, url: &str, outcomes: Vec<Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), outcomes.into_iter().collect());
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }

    /// Highest number of requests that were ever in flight together.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next(&self, url: &str) -> Scripted {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap_or(Scripted::status(200)),
            None => Scripted::status(200),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn perform(&self, _method: HttpMethod, url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = match self.next(url) {
            Scripted::Respond(response) => Ok(response),
            Scripted::Slow(delay, response) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Scripted::Refuse => Err(TransportError::Connect(format!(
                "connection refused: {url}"
            ))),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// A store whose every operation fails, standing in for a lost database.
pub struct UnreachableStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection pool exhausted".into()))
}

#[async_trait]
impl Store for UnreachableStore {
    async fn list_active_endpoints(&self) -> StoreResult<Vec<Endpoint>> {
        down()
    }
    async fn list_endpoints(&self) -> StoreResult<Vec<Endpoint>> {
        down()
    }
    async fn get_endpoint(&self, _id: Uuid) -> StoreResult<Option<Endpoint>> {
        down()
    }
    async fn insert_metric(&self, _metric: &Metric) -> StoreResult<()> {
        down()
    }
    async fn query_metrics(
        &self,
        _endpoint_id: Uuid,
        _since: DateTime<Utc>,
        _until: DateTime<Utc>,
    ) -> StoreResult<Vec<Metric>> {
        down()
    }
    async fn delete_metrics_before(&self, _cutoff: DateTime<Utc>) -> StoreResult<u64> {
        down()
    }
    async fn count_metrics_per_minute(
        &self,
        _endpoint_id: Uuid,
        _since: DateTime<Utc>,
    ) -> StoreResult<Vec<MinuteCount>> {
        down()
    }
    async fn find_open_alert(
        &self,
        _endpoint_id: Uuid,
        _alert_type: AlertType,
        _since: DateTime<Utc>,
    ) -> StoreResult<Option<Alert>> {
        down()
    }
    async fn insert_alert(&self, _alert: &Alert) -> StoreResult<()> {
        down()
    }
    async fn update_alert(&self, _alert: &Alert) -> StoreResult<()> {
        down()
    }
    async fn get_alert(&self, _id: Uuid) -> StoreResult<Option<Alert>> {
        down()
    }
    async fn list_alerts(&self, _filter: &AlertFilter) -> StoreResult<Vec<Alert>> {
        down()
    }
    async fn list_alerts_for_incident(&self, _incident_id: Uuid) -> StoreResult<Vec<Alert>> {
        down()
    }
    async fn find_open_incident(&self, _endpoint_id: Uuid) -> StoreResult<Option<Incident>> {
        down()
    }
    async fn insert_incident_with_alert(
        &self,
        _incident: &Incident,
        _alert: &Alert,
    ) -> StoreResult<()> {
        down()
    }
    async fn update_incident(&self, _incident: &Incident) -> StoreResult<()> {
        down()
    }
    async fn get_incident(&self, _id: Uuid) -> StoreResult<Option<Incident>> {
        down()
    }
    async fn list_incidents(&self, _filter: &IncidentFilter) -> StoreResult<Vec<Incident>> {
        down()
    }
    async fn insert_system_status(&self, _status: &SystemStatus) -> StoreResult<()> {
        down()
    }
    async fn latest_system_status(&self) -> StoreResult<Option<SystemStatus>> {
        down()
    }
    async fn delete_system_status_before(&self, _cutoff: DateTime<Utc>) -> StoreResult<u64> {
        down()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

/// An endpoint on `base` that only trips the thresholds a test lowers.
pub fn endpoint(base: &str, path: &str) -> Endpoint {
    let mut ep = Endpoint::new(path, HttpMethod::Get).with_base_url(base);
    ep.response_time_threshold_ms = 60_000;
    ep.error_rate_threshold = 100.0;
    ep.availability_threshold = 0.0;
    ep
}

/// Response carrying every security header, so the header check stays quiet.
pub fn hardened(status: u16) -> HttpResponse {
    let mut response = HttpResponse::with_status(status);
    let headers: BTreeMap<String, String> = [
        ("content-security-policy", "default-src 'self'"),
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("x-xss-protection", "1; mode=block"),
        ("strict-transport-security", "max-age=63072000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    response.headers = headers;
    response
}

pub struct TestEngine {
    pub engine: MonitoringEngine,
    pub store: Arc<InMemoryStore>,
    pub transport: Arc<ScriptedTransport>,
    pub clock: Arc<ManualClock>,
}

pub fn engine_with(config: MonitorConfig, endpoints: Vec<Endpoint>) -> TestEngine {
    let store = Arc::new(InMemoryStore::new());
    store.sync_endpoints(endpoints);
    let transport = Arc::new(ScriptedTransport::new());
    let clock = Arc::new(ManualClock::new(t0()));
    let engine = MonitoringEngine::new(config, store.clone(), transport.clone(), clock.clone());
    TestEngine {
        engine,
        store,
        transport,
        clock,
    }
}

pub fn engine(endpoints: Vec<Endpoint>) -> TestEngine {
    engine_with(MonitorConfig::default(), endpoints)
}
