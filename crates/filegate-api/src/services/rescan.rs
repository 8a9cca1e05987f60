//! Re-scan of an already stored object
//!
//! Re-runs fetch, scan and persist for an existing record and overwrites its scan fields.
//! The write is conditional on `scanned_at`, so a slow re-scan cannot clobber the result
//! of one that fetched a newer snapshot.
//!
//! An unavailable engine is handled like at intake, with one exception: a record flagged
//! infected is never downgraded to a skipped scan.

use chrono::Utc;
use filegate_core::models::{FileRecord, ScanFields, ScanOutcome};
use filegate_core::AppError;
use filegate_db::{FileRecordStore, ScanUpdate};
use filegate_services::ScanEngine;
use filegate_storage::Storage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

use super::scan_step::{scan_with_policy, UnavailablePolicy};

/// Target of a re-scan. `id` wins when both are given.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RescanRequest {
    pub id: Option<Uuid>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RescanResult {
    /// The record as persisted after this call
    pub data: FileRecord,
    /// Outcome of this scan
    pub scan: ScanOutcome,
    /// `false` when a scan of a newer snapshot had already been stored
    pub applied: bool,
}

#[derive(Clone)]
pub struct RescanService {
    files: Arc<dyn FileRecordStore>,
    storage: Arc<dyn Storage>,
    engine: Arc<dyn ScanEngine>,
    scan_required: bool,
}

impl RescanService {
    pub fn new(
        files: Arc<dyn FileRecordStore>,
        storage: Arc<dyn Storage>,
        engine: Arc<dyn ScanEngine>,
        scan_required: bool,
    ) -> Self {
        Self {
            files,
            storage,
            engine,
            scan_required,
        }
    }

    fn unavailable_policy(&self, record: &FileRecord) -> UnavailablePolicy {
        // A skip would clear the infected flag and reopen downloads.
        if record.is_infected() {
            UnavailablePolicy::FailClosed
        } else {
            UnavailablePolicy::from_required(self.scan_required)
        }
    }

    pub async fn rescan(&self, request: RescanRequest) -> Result<RescanResult, AppError> {
        let record = self.resolve(request).await?;
        let start = Instant::now();

        let fetched_at = Utc::now();
        let data = self.storage.download(&record.path).await.map_err(|e| {
            tracing::error!(file_id = %record.id, path = %record.path, error = %e, "Failed to fetch stored object");
            AppError::Storage(e.to_string())
        })?;

        let outcome =
            scan_with_policy(self.engine.as_ref(), &data, self.unavailable_policy(&record)).await?;

        let fields = ScanFields::from_outcome(&outcome, fetched_at);
        let (data, applied) = match self.files.update_scan_fields(record.id, &fields).await? {
            ScanUpdate::Applied(updated) => (updated, true),
            ScanUpdate::Superseded(current) => (current, false),
            ScanUpdate::Missing => {
                return Err(AppError::NotFound("File not found".to_string()));
            }
        };

        tracing::info!(
            file_id = %data.id,
            path = %data.path,
            verdict = %outcome.verdict,
            applied = applied,
            duration_ms = start.elapsed().as_millis(),
            "Re-scan completed"
        );

        Ok(RescanResult {
            data,
            scan: outcome,
            applied,
        })
    }

    async fn resolve(&self, request: RescanRequest) -> Result<FileRecord, AppError> {
        let found = match (request.id, request.path.filter(|p| !p.trim().is_empty())) {
            (Some(id), _) => self.files.get(id).await?,
            (None, Some(path)) => self.files.find_latest_by_path(&path).await?,
            (None, None) => {
                return Err(AppError::BadRequest("Provide file id or path".to_string()));
            }
        };

        found.ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_core::models::NewFileRecord;
    use filegate_db::test_helpers::InMemoryFileRecordStore;
    use filegate_services::test_helpers::FakeScanEngine;
    use filegate_storage::test_helpers::MockStorage;

    async fn seeded(store: &InMemoryFileRecordStore, path: &str) -> FileRecord {
        store
            .insert(NewFileRecord {
                subject_id: "s1".to_string(),
                name: "f.txt".to_string(),
                path: path.to_string(),
                size: Some(10),
                content_type: Some("text/plain".to_string()),
                uploaded_by: "user-1".to_string(),
                scan: ScanFields::from_outcome(
                    &ScanOutcome::clean("ok"),
                    Utc::now() - chrono::Duration::minutes(5),
                ),
            })
            .await
            .unwrap()
    }

    fn service(
        store: &InMemoryFileRecordStore,
        storage: &MockStorage,
        engine: &FakeScanEngine,
    ) -> RescanService {
        service_with(store, storage, engine, true)
    }

    fn service_with(
        store: &InMemoryFileRecordStore,
        storage: &MockStorage,
        engine: &FakeScanEngine,
        scan_required: bool,
    ) -> RescanService {
        RescanService::new(
            Arc::new(store.clone()),
            Arc::new(storage.clone()),
            Arc::new(engine.clone()),
            scan_required,
        )
    }

    #[tokio::test]
    async fn rescan_updates_the_existing_record() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"payload");
        let engine = FakeScanEngine::clean();
        let record = seeded(&store, "p").await;

        engine.report_infected("p: Eicar FOUND");
        let result = service(&store, &storage, &engine)
            .rescan(RescanRequest {
                id: Some(record.id),
                path: None,
            })
            .await
            .unwrap();

        assert!(result.applied);
        assert!(result.scan.is_infected());
        assert_eq!(result.data.id, record.id);
        assert!(result.data.is_infected());
        assert_eq!(store.len(), 1);
        assert_eq!(store.insert_count(), 1);
    }

    #[tokio::test]
    async fn path_resolves_to_latest_record() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"payload");
        let engine = FakeScanEngine::clean();
        seeded(&store, "p").await;
        let newest = seeded(&store, "p").await;

        let result = service(&store, &storage, &engine)
            .rescan(RescanRequest {
                id: None,
                path: Some("p".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(result.data.id, newest.id);
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new();
        let engine = FakeScanEngine::clean();
        let svc = service(&store, &storage, &engine);

        let err = svc
            .rescan(RescanRequest {
                id: Some(Uuid::new_v4()),
                path: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = svc.rescan(RescanRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(storage.download_count(), 0);
    }

    #[tokio::test]
    async fn stale_scan_does_not_overwrite_newer_result() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"payload");
        let engine = FakeScanEngine::clean();
        let record = seeded(&store, "p").await;

        // A concurrent scan of a later snapshot already landed.
        let future = Utc::now() + chrono::Duration::minutes(5);
        store
            .update_scan_fields(
                record.id,
                &ScanFields::from_outcome(&ScanOutcome::infected("p: Eicar FOUND"), future),
            )
            .await
            .unwrap();

        let result = service(&store, &storage, &engine)
            .rescan(RescanRequest {
                id: Some(record.id),
                path: None,
            })
            .await
            .unwrap();

        assert!(!result.applied);
        assert!(!result.scan.is_infected());
        assert!(result.data.is_infected());
        assert_eq!(result.data.scanned_at, Some(future));
    }

    #[tokio::test]
    async fn unavailable_engine_leaves_record_untouched() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"payload");
        let engine = FakeScanEngine::unavailable();
        let record = seeded(&store, "p").await;

        let err = service(&store, &storage, &engine)
            .rescan(RescanRequest {
                id: Some(record.id),
                path: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ScannerUnavailable(_)));
        assert_eq!(store.all(), vec![record]);
    }

    #[tokio::test]
    async fn optional_scanning_records_skip_on_clean_record() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"payload");
        let engine = FakeScanEngine::unavailable();
        let record = seeded(&store, "p").await;

        let result = service_with(&store, &storage, &engine, false)
            .rescan(RescanRequest {
                id: Some(record.id),
                path: None,
            })
            .await
            .unwrap();

        assert!(result.applied);
        assert_eq!(result.scan.verdict, filegate_core::models::ScanVerdict::Skipped);
        assert!(result.data.scan_output.unwrap().starts_with("skipped"));
        assert_eq!(engine.scan_count(), 0);
    }

    #[tokio::test]
    async fn optional_scanning_never_clears_infected_flag() {
        let store = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"payload");
        let engine = FakeScanEngine::unavailable();
        let record = seeded(&store, "p").await;
        store
            .update_scan_fields(
                record.id,
                &ScanFields::from_outcome(&ScanOutcome::infected("p: Eicar FOUND"), Utc::now()),
            )
            .await
            .unwrap();

        let err = service_with(&store, &storage, &engine, false)
            .rescan(RescanRequest {
                id: Some(record.id),
                path: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ScannerUnavailable(_)));
        assert!(store.all()[0].is_infected());
    }
}
