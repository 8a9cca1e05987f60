//! The scan step shared by intake and re-scan: availability policy plus the engine call.

use filegate_core::models::ScanOutcome;
use filegate_core::AppError;
use filegate_services::ScanEngine;

/// What to do when the engine cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailablePolicy {
    /// Fail with `ScannerUnavailable`
    FailClosed,
    /// Record a skipped scan and let the upload through
    RecordSkipped,
}

impl UnavailablePolicy {
    pub fn from_required(scan_required: bool) -> Self {
        if scan_required {
            UnavailablePolicy::FailClosed
        } else {
            UnavailablePolicy::RecordSkipped
        }
    }
}

/// Scan `data`, probing the engine first. The engine is never invoked when the probe fails.
pub async fn scan_with_policy(
    engine: &dyn ScanEngine,
    data: &[u8],
    policy: UnavailablePolicy,
) -> Result<ScanOutcome, AppError> {
    if !engine.is_available().await {
        return match policy {
            UnavailablePolicy::FailClosed => {
                tracing::error!(engine = engine.name(), "Scan engine unavailable and scanning is required");
                Err(AppError::ScannerUnavailable(format!(
                    "{} not available",
                    engine.name()
                )))
            }
            UnavailablePolicy::RecordSkipped => {
                tracing::warn!(
                    engine = engine.name(),
                    "Scan engine unavailable - skipping scan (configure the engine for real scanning)"
                );
                Ok(ScanOutcome::skipped(&format!("{} unavailable", engine.name())))
            }
        };
    }

    let outcome = engine.scan_buffer(data).await?;
    Ok(outcome)
}
