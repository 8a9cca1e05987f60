use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::scan::{ScanOutcome, ScanVerdict};

/// Persisted metadata and scan audit trail for one uploaded object.
///
/// A record with `scanned = true` always carries `infected` and `scan_output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub subject_id: String,
    pub name: String,
    pub path: String,
    pub size: Option<i64>,
    pub content_type: Option<String>,
    pub uploaded_by: String,
    pub scanned: bool,
    pub infected: Option<bool>,
    pub scan_output: Option<String>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn is_infected(&self) -> bool {
        self.infected == Some(true)
    }
}

/// The four scan fields written at intake and overwritten by a re-scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFields {
    pub infected: bool,
    pub scan_output: String,
    /// Instant the scanned bytes were fetched; orders competing re-scans.
    pub scanned_at: DateTime<Utc>,
}

impl ScanFields {
    pub fn from_outcome(outcome: &ScanOutcome, scanned_at: DateTime<Utc>) -> Self {
        Self {
            infected: outcome.verdict == ScanVerdict::Infected,
            scan_output: outcome.output.clone(),
            scanned_at,
        }
    }
}

/// Insert payload for a new record; the store assigns `id` and `uploaded_at`.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub subject_id: String,
    pub name: String,
    pub path: String,
    pub size: Option<i64>,
    pub content_type: Option<String>,
    pub uploaded_by: String,
    pub scan: ScanFields,
}
