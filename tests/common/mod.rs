#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use endpoint_checker::error::StoreError;
use endpoint_checker::store::{ScanFilter, ScanPage};
use endpoint_checker::{build_app, Config, EndpointRecord, RecordStore, SharedStore};

// ---

/// A running test server over an arbitrary record store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn create(&self, target_url: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/urls/"))
            .json(&json!({ "target_url": target_url }))
            .send()
            .await
            .expect("create request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn list(&self) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url("/api/v1/urls/"))
            .send()
            .await
            .expect("list request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// List and return just the record array, asserting success.
    pub async fn records(&self) -> Vec<Value> {
        let (body, status) = self.list().await;
        assert_eq!(status, StatusCode::OK, "list failed: {body}");
        body["message"].as_array().cloned().expect("message is not an array")
    }

    pub async fn update(&self, id: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(&format!("/api/v1/urls/{id}")))
            .json(body)
            .send()
            .await
            .expect("update request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Send a raw body (possibly empty) with the given method and path.
    pub async fn send_raw(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &'static str,
    ) -> (Value, StatusCode) {
        let resp = self
            .client
            .request(method, self.url(path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("raw request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

/// Spawn the app on an ephemeral port.
pub async fn spawn_app(store: SharedStore, config: Config) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    let app = build_app(store, config);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
    }
}

/// Config for tests: in-memory defaults with the scheduler off.
pub fn test_config() -> Config {
    Config {
        check_interval_secs: 0,
        ..Config::default()
    }
}

// ---

/// A store whose every operation fails, for exercising the 418 paths.
#[derive(Default)]
pub struct FailingStore {
    pub calls: AtomicUsize,
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn put(&self, _record: &EndpointRecord) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused (db:5432)".into()))
    }

    async fn scan_page(
        &self,
        _filter: ScanFilter,
        _start_after: Option<&str>,
        _limit: usize,
    ) -> Result<ScanPage, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused (db:5432)".into()))
    }

    async fn set_active(&self, _id: &str, _is_active: bool) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused (db:5432)".into()))
    }
}

// ---

/// A mock probe target answering every request with an HTTP status line.
/// Returns its port and a counter of accepted connections.
pub async fn http_target(status_line: &'static str) -> (u16, Arc<AtomicUsize>) {
    delayed_target(status_line, Vec::new()).await
}

/// Like [`http_target`], but the n-th accepted connection waits `delays[n]`
/// before answering. Connections past the end of `delays` answer at once.
pub async fn delayed_target(
    status_line: &'static str,
    delays: Vec<Duration>,
) -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let nth = counter.fetch_add(1, Ordering::SeqCst);
            let delay = delays.get(nth).copied().unwrap_or_default();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;
                let response = format!("{status_line}\r\nContent-Length: 0\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    (port, hits)
}

/// A target that accepts connections and never answers.
pub async fn silent_target() -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    (port, hits)
}

/// A port with nothing listening on it.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

// ---

/// Formatted log output captured from the current thread.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Route this thread's events at INFO and above into the buffer until the
    /// returned guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
