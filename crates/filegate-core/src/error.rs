//! Error types module
//!
//! All failures of the intake pipeline are unified under [`AppError`]. The variants
//! mirror the pipeline's terminal states: authentication, request validation,
//! infection rejection, missing records, scanner availability and downstream
//! (store, gateway, engine) failures.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;
use uuid::Uuid;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejections an operator may want to look at
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "FILE_INFECTED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The engine reported a match. The attempt is still persisted; `file_id`
    /// points at the audit record and `scan_output` carries the raw diagnostic.
    #[error("File infected - upload rejected (record {file_id})")]
    Infected { file_id: Uuid, scan_output: String },

    #[error("Scanner unavailable: {0}")]
    ScannerUnavailable(String),

    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

/// Presentation profile shared by a group of variants. `client_message` stays
/// per-variant because it may carry request-specific text.
struct Profile {
    status: u16,
    code: &'static str,
    recoverable: bool,
    action: Option<&'static str>,
    sensitive: bool,
    level: LogLevel,
}

const RETRY_LATER: Option<&str> = Some("Retry after a short delay");

/// Downstream failure whose details must not leak to callers
const fn downstream(code: &'static str) -> Profile {
    Profile {
        status: 500,
        code,
        recoverable: true,
        action: RETRY_LATER,
        sensitive: true,
        level: LogLevel::Error,
    }
}

/// Rejection caused by the caller
const fn rejected(status: u16, code: &'static str, action: &'static str) -> Profile {
    Profile {
        status,
        code,
        recoverable: false,
        action: Some(action),
        sensitive: false,
        level: LogLevel::Debug,
    }
}

fn profile(err: &AppError) -> Profile {
    match err {
        AppError::Database(_) => downstream("DATABASE_ERROR"),
        AppError::Storage(_) => downstream("STORAGE_ERROR"),
        AppError::ScanFailed(_) => downstream("SCAN_ENGINE_ERROR"),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            downstream("INTERNAL_ERROR")
        }
        AppError::InvalidInput(_) => rejected(
            400,
            "INVALID_INPUT",
            "Check request parameters and try again",
        ),
        AppError::BadRequest(_) => rejected(400, "BAD_REQUEST", "Check request format and parameters"),
        AppError::NotFound(_) => rejected(404, "NOT_FOUND", "Verify the resource ID exists"),
        AppError::Unauthorized(_) => rejected(401, "UNAUTHORIZED", "Check the bearer token"),
        AppError::Infected { .. } => Profile {
            level: LogLevel::Warn,
            ..rejected(
                400,
                "FILE_INFECTED",
                "Remove the file; contact an operator if this is a false positive",
            )
        },
        AppError::ScannerUnavailable(_) => Profile {
            status: 503,
            code: "SCANNER_UNAVAILABLE",
            recoverable: true,
            action: Some("Retry once the scanning engine is back"),
            sensitive: false,
            level: LogLevel::Error,
        },
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Infected { .. } => "Infected",
            AppError::ScannerUnavailable(_) => "ScannerUnavailable",
            AppError::ScanFailed(_) => "ScanFailed",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        profile(self).status
    }

    fn error_code(&self) -> &'static str {
        profile(self).code
    }

    fn is_recoverable(&self) -> bool {
        profile(self).recoverable
    }

    fn suggested_action(&self) -> Option<&'static str> {
        profile(self).action
    }

    fn is_sensitive(&self) -> bool {
        profile(self).sensitive
    }

    fn log_level(&self) -> LogLevel {
        profile(self).level
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Infected { .. } => "File infected - upload rejected".to_string(),
            AppError::ScannerUnavailable(_) => {
                "Malware scanner not available on server and scanning is required".to_string()
            }
            AppError::ScanFailed(_) => "Scan failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}
