use async_trait::async_trait;
use clamav_client::Tcp;
use filegate_core::models::ScanOutcome;
use std::time::{Duration, Instant};

use super::engine::{ScanEngine, ScanError};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Scans through a running clamd daemon over TCP (PING / INSTREAM).
#[derive(Clone)]
pub struct ClamdEngine {
    host: String,
    port: u16,
    timeout: Duration,
}

impl ClamdEngine {
    /// # Arguments
    /// * `host` - clamd hostname
    /// * `port` - clamd port (typically 3310)
    /// * `timeout` - upper bound for one scan
    pub fn new(host: String, port: u16, timeout: Duration) -> Self {
        Self {
            host,
            port,
            timeout,
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Map a clamd reply (`stream: OK`, `stream: <sig> FOUND`, `... ERROR`) onto an outcome.
fn classify_reply(reply: &[u8]) -> Result<ScanOutcome, ScanError> {
    let text = String::from_utf8_lossy(reply);
    let text = text.trim_matches(char::from(0)).trim();

    if text.ends_with("FOUND") {
        return Ok(ScanOutcome::infected(text));
    }
    if text.ends_with("OK") {
        return Ok(ScanOutcome::clean(text));
    }
    Err(ScanError::Engine {
        exit_code: None,
        output: text.to_string(),
    })
}

#[async_trait]
impl ScanEngine for ClamdEngine {
    fn name(&self) -> &'static str {
        "clamd"
    }

    async fn is_available(&self) -> bool {
        let address = self.address();
        let probe = tokio::task::spawn_blocking(move || {
            clamav_client::ping(Tcp {
                host_address: address.as_str(),
            })
        });

        match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
            Ok(Ok(Ok(reply))) => reply == clamav_client::PONG,
            Ok(Ok(Err(e))) => {
                tracing::debug!(host = %self.host, port = self.port, error = %e, "clamd ping failed");
                false
            }
            _ => {
                tracing::debug!(host = %self.host, port = self.port, "clamd ping did not complete");
                false
            }
        }
    }

    /// Uses the sync client inside spawn_blocking to avoid !Send futures.
    async fn scan_buffer(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();
        let data = data.to_vec();
        let size = data.len();
        let address = self.address();

        let task = tokio::task::spawn_blocking(move || {
            clamav_client::scan_buffer(
                data.as_slice(),
                Tcp {
                    host_address: address.as_str(),
                },
                None,
            )
        });

        let reply = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(reply))) => reply,
            Ok(Ok(Err(e))) => {
                tracing::error!(host = %self.host, port = self.port, error = %e, "clamd scan failed");
                return Err(ScanError::Unavailable(format!("clamd at {}: {}", self.address(), e)));
            }
            Ok(Err(e)) => return Err(ScanError::Task(e.to_string())),
            Err(_) => {
                tracing::error!(
                    engine = "clamd",
                    timeout_secs = self.timeout.as_secs(),
                    "Scan timed out"
                );
                return Err(ScanError::Timeout(self.timeout.as_secs()));
            }
        };

        let result = classify_reply(&reply);
        if let Ok(outcome) = &result {
            tracing::info!(
                engine = "clamd",
                verdict = %outcome.verdict,
                size_bytes = size,
                duration_ms = start.elapsed().as_millis(),
                "Scan completed"
            );
        }
        result
    }
}
