//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use credit_gateway::clock::ManualClock;
use credit_gateway::credit::{CreditReport, CreditSource, FetchError, SubjectKey};
use credit_gateway::observability::NoopObserver;
use credit_gateway::{CreditGateway, GatewayConfig};

/// In-process bureau whose behavior tests can change between calls.
#[derive(Default)]
pub struct StubCreditSource {
    scores: Mutex<HashMap<String, u16>>,
    failing: AtomicBool,
    latency: Mutex<Duration>,
    calls: AtomicU32,
}

impl StubCreditSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_score(&self, subject: &str, score: u16) {
        self.scores.lock().unwrap().insert(subject.to_string(), score);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreditSource for StubCreditSource {
    async fn fetch(&self, subject: &SubjectKey, _deadline: Duration) -> Result<CreditReport, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Unavailable("stub bureau down".into()));
        }

        let score = self
            .scores
            .lock()
            .unwrap()
            .get(subject.as_str())
            .copied()
            .ok_or_else(|| FetchError::Unavailable("no file for subject".into()))?;

        Ok(CreditReport {
            subject_key: subject.clone(),
            score,
            retrieved_at: UNIX_EPOCH,
            bureau: "stub".into(),
            raw: BTreeMap::new(),
        })
    }

    fn name(&self) -> &str {
        "stub_bureau"
    }
}

/// Gateway over `source` with a manual clock at a fixed start.
pub fn gateway(config: &GatewayConfig, source: Arc<StubCreditSource>) -> (Arc<CreditGateway>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_secs(1_700_000_000));
    let gateway = CreditGateway::from_config(config, source, clock.clone(), Arc::new(NoopObserver));
    (Arc::new(gateway), clock)
}

/// Start a programmable HTTP bureau on an ephemeral port.
///
/// `f` receives the request path and returns a status code and body.
pub async fn start_programmable_bureau<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
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
                        let mut buf = vec![0u8; 4096];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let request = String::from_utf8_lossy(&buf[..n]).to_string();
                        let path = request
                            .lines()
                            .next()
                            .and_then(|line| line.split_whitespace().nth(1))
                            .unwrap_or("/")
                            .to_string();

                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}
