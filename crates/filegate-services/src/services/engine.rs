use async_trait::async_trait;
use filegate_core::models::ScanOutcome;
use filegate_core::AppError;
use thiserror::Error;

/// Failures of the engine itself. A detected match is not an error; it is an
/// infected [`ScanOutcome`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan engine unavailable: {0}")]
    Unavailable(String),

    #[error("scan timed out after {0} seconds")]
    Timeout(u64),

    #[error("scan engine failed (exit code {exit_code:?}): {output}")]
    Engine {
        exit_code: Option<i32>,
        output: String,
    },

    #[error("scan I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scan task failed: {0}")]
    Task(String),
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Unavailable(msg) => AppError::ScannerUnavailable(msg),
            other => AppError::ScanFailed(other.to_string()),
        }
    }
}

/// External malware scanning engine
#[async_trait]
pub trait ScanEngine: Send + Sync {
    /// Short engine name for logs and health output
    fn name(&self) -> &'static str;

    /// Probe whether the engine can be used right now. Never fails; any probe
    /// error means `false`.
    async fn is_available(&self) -> bool;

    /// Scan an in-memory buffer. Timeouts and abnormal terminations are errors,
    /// never a clean outcome.
    async fn scan_buffer(&self, data: &[u8]) -> Result<ScanOutcome, ScanError>;
}
