//! Repository trait abstractions
//!
//! The narrow interfaces the intake pipeline needs from the database, so the
//! orchestrator can run against in-memory doubles in tests.

use async_trait::async_trait;
use filegate_core::models::{FileRecord, NewFileRecord, ScanFields};
use filegate_core::AppError;
use uuid::Uuid;

use crate::db::{FileRecordRepository, SubjectRepository};

/// Result of a conditional scan-field update
#[derive(Debug, Clone, PartialEq)]
pub enum ScanUpdate {
    /// The new fields were written; carries the updated record
    Applied(FileRecord),
    /// A scan of a newer snapshot already landed; carries the record as stored
    Superseded(FileRecord),
    /// No record with that id
    Missing,
}

/// Confirms that a subject exists
#[async_trait]
pub trait SubjectRegistry: Send + Sync {
    async fn exists(&self, subject_id: &str) -> Result<bool, AppError>;
}

/// Persistent store of file records
#[async_trait]
pub trait FileRecordStore: Send + Sync {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Most recently uploaded record for a storage path
    async fn find_latest_by_path(&self, path: &str) -> Result<Option<FileRecord>, AppError>;

    /// Compare-and-set on `scanned_at`: only applies if the stored scan is older.
    async fn update_scan_fields(
        &self,
        id: Uuid,
        fields: &ScanFields,
    ) -> Result<ScanUpdate, AppError>;

    /// Newest first
    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<FileRecord>, AppError>;
}

// Implementations for concrete repository types

#[async_trait]
impl SubjectRegistry for SubjectRepository {
    async fn exists(&self, subject_id: &str) -> Result<bool, AppError> {
        SubjectRepository::exists(self, subject_id).await
    }
}

#[async_trait]
impl FileRecordStore for FileRecordRepository {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        FileRecordRepository::insert(self, record).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        FileRecordRepository::get(self, id).await
    }

    async fn find_latest_by_path(&self, path: &str) -> Result<Option<FileRecord>, AppError> {
        FileRecordRepository::find_latest_by_path(self, path).await
    }

    async fn update_scan_fields(
        &self,
        id: Uuid,
        fields: &ScanFields,
    ) -> Result<ScanUpdate, AppError> {
        FileRecordRepository::update_scan_fields(self, id, fields).await
    }

    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<FileRecord>, AppError> {
        FileRecordRepository::list_by_subject(self, subject_id).await
    }
}
