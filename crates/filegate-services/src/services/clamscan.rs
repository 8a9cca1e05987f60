use async_trait::async_trait;
use filegate_core::models::ScanOutcome;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

use super::engine::{ScanEngine, ScanError};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const TEMP_PREFIX: &str = "upload-scan-";

/// Runs `clamscan` once per buffer against a private temporary file.
///
/// The temporary file is removed when the scan future completes or is dropped, and
/// the child process is killed if the future is dropped before it exits.
#[derive(Clone)]
pub struct ClamScanEngine {
    program: String,
    timeout: Duration,
}

impl ClamScanEngine {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

/// Map a `clamscan` termination onto an outcome.
///
/// Any output line ending in `FOUND` means infected, whatever the exit code. Exit 0
/// without one is clean. Everything else (exit 2, killed by a signal) is an engine
/// failure.
pub fn classify(
    exit_code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<ScanOutcome, ScanError> {
    let stdout = stdout.trim();
    let found = stdout
        .lines()
        .any(|line| line.trim_end().ends_with("FOUND"));

    if found {
        return Ok(ScanOutcome::infected(stdout));
    }

    if exit_code == Some(0) {
        let output = if stdout.is_empty() { "OK" } else { stdout };
        return Ok(ScanOutcome::clean(output));
    }

    let detail = if stderr.trim().is_empty() {
        stdout
    } else {
        stderr.trim()
    };
    Err(ScanError::Engine {
        exit_code,
        output: detail.to_string(),
    })
}

#[async_trait]
impl ScanEngine for ClamScanEngine {
    fn name(&self) -> &'static str {
        "clamscan"
    }

    async fn is_available(&self) -> bool {
        let probe = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(program = %self.program, error = %e, "clamscan probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(program = %self.program, "clamscan probe timed out");
                false
            }
        }
    }

    async fn scan_buffer(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        let start = Instant::now();

        // Random suffix keeps concurrent scans from sharing an input file.
        let temp = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile()?;
        tokio::fs::write(temp.path(), data).await?;

        tracing::debug!(
            engine = "clamscan",
            size_bytes = data.len(),
            temp_path = %temp.path().display(),
            "Starting scan"
        );

        let run = Command::new(&self.program)
            .arg("--no-summary")
            .arg(temp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(ScanError::Unavailable(format!(
                    "{} not found: {}",
                    self.program, e
                )));
            }
            Ok(Err(e)) => return Err(ScanError::Io(e)),
            Err(_) => {
                tracing::error!(
                    engine = "clamscan",
                    timeout_secs = self.timeout.as_secs(),
                    "Scan timed out; child killed"
                );
                return Err(ScanError::Timeout(self.timeout.as_secs()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let result = classify(output.status.code(), &stdout, &stderr);

        match &result {
            Ok(outcome) => tracing::info!(
                engine = "clamscan",
                verdict = %outcome.verdict,
                duration_ms = start.elapsed().as_millis(),
                "Scan completed"
            ),
            Err(e) => tracing::error!(
                engine = "clamscan",
                error = %e,
                duration_ms = start.elapsed().as_millis(),
                "Scan failed"
            ),
        }

        result
    }
}
