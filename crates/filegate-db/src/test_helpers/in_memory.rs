use async_trait::async_trait;
use chrono::Utc;
use filegate_core::models::{FileRecord, NewFileRecord, ScanFields};
use filegate_core::AppError;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::traits::{FileRecordStore, ScanUpdate, SubjectRegistry};

/// Subject registry backed by a set of ids
#[derive(Clone, Default)]
pub struct InMemorySubjectRegistry {
    subjects: Arc<Mutex<HashSet<String>>>,
    fail_lookups: Arc<AtomicBool>,
}

impl InMemorySubjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject(self, id: &str) -> Self {
        self.add_subject(id);
        self
    }

    pub fn add_subject(&self, id: &str) {
        self.subjects.lock().unwrap().insert(id.to_string());
    }

    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubjectRegistry for InMemorySubjectRegistry {
    async fn exists(&self, subject_id: &str) -> Result<bool, AppError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(AppError::Internal("subject registry offline".to_string()));
        }
        Ok(self.subjects.lock().unwrap().contains(subject_id))
    }
}

/// File record store kept in insertion order
#[derive(Clone, Default)]
pub struct InMemoryFileRecordStore {
    records: Arc<Mutex<Vec<FileRecord>>>,
    inserts: Arc<AtomicUsize>,
    fail_inserts: Arc<AtomicBool>,
}

impl InMemoryFileRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<FileRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }

    fn newest_first(records: impl Iterator<Item = FileRecord>) -> Vec<FileRecord> {
        // Reverse insertion order first so equal timestamps still list newest first.
        let mut list: Vec<FileRecord> = records.collect();
        list.reverse();
        list.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        list
    }
}

#[async_trait]
impl FileRecordStore for InMemoryFileRecordStore {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("record store write failed".to_string()));
        }

        let stored = FileRecord {
            id: Uuid::new_v4(),
            subject_id: record.subject_id,
            name: record.name,
            path: record.path,
            size: record.size,
            content_type: record.content_type,
            uploaded_by: record.uploaded_by,
            scanned: true,
            infected: Some(record.scan.infected),
            scan_output: Some(record.scan.scan_output),
            scanned_at: Some(record.scan.scanned_at),
            uploaded_at: Utc::now(),
        };
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_latest_by_path(&self, path: &str) -> Result<Option<FileRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let matching = records.iter().filter(|r| r.path == path).cloned();
        Ok(Self::newest_first(matching).into_iter().next())
    }

    async fn update_scan_fields(
        &self,
        id: Uuid,
        fields: &ScanFields,
    ) -> Result<ScanUpdate, AppError> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(ScanUpdate::Missing);
        };

        let newer = match record.scanned_at {
            None => true,
            Some(existing) => existing < fields.scanned_at,
        };
        if !newer {
            return Ok(ScanUpdate::Superseded(record.clone()));
        }

        record.scanned = true;
        record.infected = Some(fields.infected);
        record.scan_output = Some(fields.scan_output.clone());
        record.scanned_at = Some(fields.scanned_at);
        Ok(ScanUpdate::Applied(record.clone()))
    }

    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<FileRecord>, AppError> {
        let records = self.records.lock().unwrap();
        let matching = records
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned();
        Ok(Self::newest_first(matching))
    }
}
