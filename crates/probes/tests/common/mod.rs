//! Shared fixtures for the probe integration tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use probes::notification::{NotificationEnvelope, Notifier};
use probes::probe::{Clock, Watermark};
use probes::source::{ConnectionProvider, ConnectionSettings, Row, RowSource};
use probes::{NotifyError, SourceError};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn at(day: u32, hour: u32) -> Watermark {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap().into()
}

/// A request captured by [`HubStub`]
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Minimal notification hub: accepts one HTTP/1.1 request per connection,
/// records it and answers with a fixed status.
pub struct HubStub {
    base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl HubStub {
    pub async fn start() -> Self {
        Self::with_status(200).await
    }

    pub async fn with_status(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let captured = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else { break };
                let captured = captured.clone();
                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = BufReader::new(read_half);

                    let mut request_line = String::new();
                    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                        return;
                    }
                    let mut parts = request_line.split_whitespace();
                    let method = parts.next().unwrap_or_default().to_string();
                    let path = parts.next().unwrap_or_default().to_string();

                    let mut headers = HashMap::new();
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).await.unwrap();
                        let line = line.trim_end();
                        if line.is_empty() {
                            break;
                        }
                        if let Some((name, value)) = line.split_once(':') {
                            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                        }
                    }

                    let length: usize =
                        headers.get("content-length").and_then(|v| v.parse().ok()).unwrap_or(0);
                    let mut body = vec![0; length];
                    reader.read_exact(&mut body).await.unwrap();

                    captured.lock().unwrap().push(CapturedRequest {
                        method,
                        path,
                        content_type: headers.get("content-type").cloned(),
                        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
                    });

                    let response = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    );
                    let _ = write_half.write_all(response.as_bytes()).await;
                    let _ = write_half.shutdown().await;
                });
            }
        });

        Self { base_url: format!("http://{addr}"), requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// A base URL nothing listens on
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Notifier that keeps every envelope it is given
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<NotificationEnvelope>>,
}

impl RecordingNotifier {
    pub fn contents(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.content().to_string()).collect()
    }

    pub fn envelopes(&self) -> Vec<NotificationEnvelope> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, envelope: &NotificationEnvelope) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// Answer given by [`ScriptedSource`] for one query
#[derive(Clone)]
pub enum Script {
    Rows(Vec<Row>),
    Fail,
}

/// Provider whose handle answers queries from a fixed script and records
/// every call as `(query, bound parameter)`.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedProvider {
    pub fn answer(&self, query: &str, script: Script) {
        self.scripts.lock().unwrap().insert(query.to_string(), script);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionProvider for ScriptedProvider {
    async fn connect(
        &self,
        _settings: &ConnectionSettings,
    ) -> Result<Box<dyn RowSource>, SourceError> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl RowSource for ScriptedProvider {
    async fn fetch(&self, query: &str, param: &str) -> Result<Vec<Row>, SourceError> {
        self.calls.lock().unwrap().push((query.to_string(), param.to_string()));
        let script = self.scripts.lock().unwrap().get(query).cloned();
        match script {
            Some(Script::Rows(rows)) => Ok(rows),
            Some(Script::Fail) => Err(SourceError::Timeout(Duration::from_secs(30))),
            None => Ok(Vec::new()),
        }
    }
}

/// Clock returning queued instants, then repeating the last one
pub struct StepClock {
    times: Mutex<VecDeque<Watermark>>,
    last: Mutex<Watermark>,
}

impl StepClock {
    pub fn new(times: impl IntoIterator<Item = Watermark>) -> Arc<Self> {
        let times: VecDeque<Watermark> = times.into_iter().collect();
        let last = *times.back().expect("at least one instant");
        Arc::new(Self { times: Mutex::new(times), last: Mutex::new(last) })
    }
}

impl Clock for StepClock {
    fn now(&self) -> Watermark {
        match self.times.lock().unwrap().pop_front() {
            Some(time) => {
                *self.last.lock().unwrap() = time;
                time
            }
            None => *self.last.lock().unwrap(),
        }
    }
}
