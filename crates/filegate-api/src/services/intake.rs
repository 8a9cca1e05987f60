//! Intake orchestrator
//!
//! One run per call, in a fixed order: authenticate, validate the request, confirm the
//! subject, fetch the stored bytes, scan them, persist the record. Everything before the
//! fetch short-circuits without side effects. Once bytes have been scanned, the outcome is
//! always persisted, including infected uploads, which are recorded and then rejected.

use chrono::Utc;
use filegate_core::models::{FileRecord, NewFileRecord, Principal, ScanFields, ScanOutcome};
use filegate_core::{AppError, ScanConfig};
use filegate_db::{FileRecordStore, SubjectRegistry};
use filegate_services::ScanEngine;
use filegate_storage::Storage;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

use super::scan_step::{scan_with_policy, UnavailablePolicy};
use crate::auth::Authenticator;

/// Reference to an object the client already uploaded, plus its declared metadata
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UploadRequest {
    pub subject_id: Option<String>,
    /// Storage path of the uploaded object
    pub path: Option<String>,
    /// Display name; defaults to the last path segment
    pub name: Option<String>,
    /// Declared size in bytes; defaults to the fetched length
    pub size: Option<i64>,
    pub content_type: Option<String>,
}

/// Request checks applied before any I/O
#[derive(Debug, Clone)]
pub struct IntakePolicy {
    pub scan_required: bool,
    pub max_file_size: usize,
    pub allowed_content_types: Option<Vec<String>>,
}

impl IntakePolicy {
    pub fn from_config(scan: &ScanConfig) -> Self {
        Self {
            scan_required: scan.require_scan,
            max_file_size: scan.max_file_size_bytes,
            allowed_content_types: scan.allowed_content_types.clone(),
        }
    }

    fn too_large(&self) -> AppError {
        AppError::BadRequest(format!(
            "File too large (max {} MB)",
            self.max_file_size / (1024 * 1024)
        ))
    }

    fn content_type_allowed(&self, content_type: Option<&str>) -> bool {
        let Some(allowed) = &self.allowed_content_types else {
            return true;
        };
        match content_type {
            Some(ct) => {
                // Parameters such as "; charset=utf-8" do not affect membership.
                let essence = ct.split(';').next().unwrap_or(ct).trim();
                allowed.iter().any(|a| a.eq_ignore_ascii_case(essence))
            }
            None => false,
        }
    }
}

/// Request that passed validation
struct ValidatedUpload {
    subject_id: String,
    path: String,
    name: Option<String>,
    size: Option<i64>,
    content_type: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn default_name(path: &str) -> String {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(path)
        .to_string()
}

#[derive(Clone)]
pub struct IntakeService {
    authenticator: Arc<dyn Authenticator>,
    subjects: Arc<dyn SubjectRegistry>,
    files: Arc<dyn FileRecordStore>,
    storage: Arc<dyn Storage>,
    engine: Arc<dyn ScanEngine>,
    policy: IntakePolicy,
}

impl IntakeService {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        subjects: Arc<dyn SubjectRegistry>,
        files: Arc<dyn FileRecordStore>,
        storage: Arc<dyn Storage>,
        engine: Arc<dyn ScanEngine>,
        policy: IntakePolicy,
    ) -> Self {
        Self {
            authenticator,
            subjects,
            files,
            storage,
            engine,
            policy,
        }
    }

    /// Run the whole pipeline for one request.
    ///
    /// Returns the persisted record for clean and skipped outcomes. An infected outcome
    /// is persisted and then returned as [`AppError::Infected`].
    pub async fn intake(
        &self,
        bearer: Result<&str, AppError>,
        request: UploadRequest,
    ) -> Result<FileRecord, AppError> {
        let principal = self.authenticate(bearer).await?;
        self.intake_as(&principal, request).await
    }

    /// Pipeline after authentication, for callers that resolved the principal themselves.
    pub async fn intake_as(
        &self,
        principal: &Principal,
        request: UploadRequest,
    ) -> Result<FileRecord, AppError> {
        let upload = self.validate(request)?;
        self.ensure_subject(&upload.subject_id).await?;

        let start = Instant::now();
        let (data, fetched_at) = self.fetch(&upload.path).await?;
        if data.len() > self.policy.max_file_size {
            tracing::warn!(
                path = %upload.path,
                size_bytes = data.len(),
                "Stored object exceeds maximum size"
            );
            return Err(self.policy.too_large());
        }

        let outcome = scan_with_policy(
            self.engine.as_ref(),
            &data,
            UnavailablePolicy::from_required(self.policy.scan_required),
        )
        .await?;

        let record = self
            .persist(principal, upload, data.len(), &outcome, fetched_at)
            .await?;

        tracing::info!(
            file_id = %record.id,
            subject_id = %record.subject_id,
            path = %record.path,
            verdict = %outcome.verdict,
            duration_ms = start.elapsed().as_millis(),
            "Intake completed"
        );

        if outcome.is_infected() {
            return Err(AppError::Infected {
                file_id: record.id,
                scan_output: outcome.output,
            });
        }

        Ok(record)
    }

    pub async fn authenticate(
        &self,
        bearer: Result<&str, AppError>,
    ) -> Result<Principal, AppError> {
        let token = bearer?;
        self.authenticator.authenticate(token).await
    }

    fn validate(&self, request: UploadRequest) -> Result<ValidatedUpload, AppError> {
        let (Some(subject_id), Some(path)) =
            (non_blank(request.subject_id), non_blank(request.path))
        else {
            return Err(AppError::BadRequest("Missing required fields".to_string()));
        };

        if let Some(size) = request.size {
            if size < 0 {
                return Err(AppError::BadRequest("Size must not be negative".to_string()));
            }
            if size as u64 > self.policy.max_file_size as u64 {
                return Err(self.policy.too_large());
            }
        }

        let content_type = non_blank(request.content_type);
        if !self.policy.content_type_allowed(content_type.as_deref()) {
            return Err(AppError::BadRequest(format!(
                "Content type not allowed: {}",
                content_type.as_deref().unwrap_or("(none)")
            )));
        }

        Ok(ValidatedUpload {
            subject_id,
            path,
            name: non_blank(request.name),
            size: request.size,
            content_type,
        })
    }

    async fn ensure_subject(&self, subject_id: &str) -> Result<(), AppError> {
        let exists = self.subjects.exists(subject_id).await.map_err(|e| {
            tracing::error!(subject_id = %subject_id, error = %e, "Subject lookup failed");
            e
        })?;

        if !exists {
            return Err(AppError::BadRequest("Subject not found".to_string()));
        }
        Ok(())
    }

    /// Fetch the stored bytes and the instant they were read.
    async fn fetch(&self, path: &str) -> Result<(Vec<u8>, chrono::DateTime<Utc>), AppError> {
        let fetched_at = Utc::now();
        let data = self.storage.download(path).await.map_err(|e| {
            tracing::error!(path = %path, error = %e, "Failed to fetch stored object");
            AppError::Storage(e.to_string())
        })?;
        Ok((data, fetched_at))
    }

    async fn persist(
        &self,
        principal: &Principal,
        upload: ValidatedUpload,
        fetched_len: usize,
        outcome: &ScanOutcome,
        scanned_at: chrono::DateTime<Utc>,
    ) -> Result<FileRecord, AppError> {
        let name = upload.name.unwrap_or_else(|| default_name(&upload.path));
        let record = NewFileRecord {
            subject_id: upload.subject_id,
            name,
            path: upload.path,
            size: Some(upload.size.unwrap_or(fetched_len as i64)),
            content_type: upload.content_type,
            uploaded_by: principal.id.clone(),
            scan: ScanFields::from_outcome(outcome, scanned_at),
        };

        self.files.insert(record).await.map_err(|e| {
            tracing::error!(error = %e, verdict = %outcome.verdict, "Failed to persist file record after scan");
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use filegate_db::test_helpers::{InMemoryFileRecordStore, InMemorySubjectRegistry};
    use filegate_services::test_helpers::FakeScanEngine;
    use filegate_storage::test_helpers::MockStorage;

    struct StaticAuth;

    #[async_trait]
    impl Authenticator for StaticAuth {
        async fn authenticate(&self, token: &str) -> Result<Principal, AppError> {
            if token == "good" {
                Ok(Principal::new("user-1"))
            } else {
                Err(AppError::Unauthorized("Invalid token".to_string()))
            }
        }
    }

    struct Fixture {
        service: IntakeService,
        subjects: InMemorySubjectRegistry,
        files: InMemoryFileRecordStore,
        storage: MockStorage,
        engine: FakeScanEngine,
    }

    fn fixture(engine: FakeScanEngine, policy: IntakePolicy) -> Fixture {
        let subjects = InMemorySubjectRegistry::new().with_subject("s1");
        let files = InMemoryFileRecordStore::new();
        let storage = MockStorage::new().with_object("p", b"0123456789");
        let service = IntakeService::new(
            Arc::new(StaticAuth),
            Arc::new(subjects.clone()),
            Arc::new(files.clone()),
            Arc::new(storage.clone()),
            Arc::new(engine.clone()),
            policy,
        );
        Fixture {
            service,
            subjects,
            files,
            storage,
            engine,
        }
    }

    fn policy() -> IntakePolicy {
        IntakePolicy {
            scan_required: false,
            max_file_size: 10 * 1024 * 1024,
            allowed_content_types: None,
        }
    }

    fn request() -> UploadRequest {
        UploadRequest {
            subject_id: Some("s1".to_string()),
            path: Some("p".to_string()),
            name: Some("f.txt".to_string()),
            size: Some(10),
            content_type: Some("text/plain".to_string()),
        }
    }

    #[tokio::test]
    async fn clean_upload_is_persisted_and_returned() {
        let f = fixture(FakeScanEngine::clean(), policy());
        let record = f.service.intake(Ok("good"), request()).await.unwrap();

        assert!(record.scanned);
        assert_eq!(record.infected, Some(false));
        assert_eq!(record.uploaded_by, "user-1");
        assert_eq!(f.files.all(), vec![record]);
    }

    #[tokio::test]
    async fn infected_upload_is_recorded_then_rejected() {
        let f = fixture(FakeScanEngine::infected("p: Eicar-Signature FOUND"), policy());
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();

        let (file_id, scan_output) = match err {
            AppError::Infected {
                file_id,
                scan_output,
            } => (file_id, scan_output),
            other => panic!("expected infection rejection, got {:?}", other),
        };
        assert!(scan_output.contains("FOUND"));

        let stored = f.files.all();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, file_id);
        assert!(stored[0].is_infected());
    }

    #[tokio::test]
    async fn unauthenticated_caller_cannot_probe_subjects() {
        let f = fixture(FakeScanEngine::clean(), policy());
        f.subjects.fail_lookups();

        let err = f.service.intake(Ok("bad"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let missing = Err(AppError::Unauthorized("Missing authorization header".to_string()));
        assert!(f.service.intake(missing, request()).await.is_err());
        assert_eq!(f.storage.download_count(), 0);
    }

    #[tokio::test]
    async fn validation_failures_have_no_side_effects() {
        let f = fixture(FakeScanEngine::clean(), policy());

        let missing_path = UploadRequest {
            path: Some("  ".to_string()),
            ..request()
        };
        let err = f.service.intake(Ok("good"), missing_path).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing required fields"));

        let oversized = UploadRequest {
            size: Some(10 * 1024 * 1024 + 1),
            ..request()
        };
        let err = f.service.intake(Ok("good"), oversized).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("too large")));

        assert!(f.files.is_empty());
        assert_eq!(f.storage.download_count(), 0);
        assert_eq!(f.engine.scan_count(), 0);
    }

    #[tokio::test]
    async fn content_type_allowlist_is_enforced() {
        let f = fixture(
            FakeScanEngine::clean(),
            IntakePolicy {
                allowed_content_types: Some(vec!["application/pdf".to_string()]),
                ..policy()
            },
        );
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let pdf = UploadRequest {
            content_type: Some("Application/PDF; name=x".to_string()),
            ..request()
        };
        assert!(f.service.intake(Ok("good"), pdf).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_subject_never_fetches_bytes() {
        let f = fixture(FakeScanEngine::clean(), policy());
        let req = UploadRequest {
            subject_id: Some("nope".to_string()),
            ..request()
        };
        let err = f.service.intake(Ok("good"), req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Subject not found"));
        assert_eq!(f.storage.download_count(), 0);
    }

    #[tokio::test]
    async fn registry_failure_is_internal() {
        let f = fixture(FakeScanEngine::clean(), policy());
        f.subjects.fail_lookups();
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(f.storage.download_count(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_is_internal_and_writes_nothing() {
        let f = fixture(FakeScanEngine::clean(), policy());
        f.storage.fail_downloads();
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(f.engine.scan_count(), 0);
        assert!(f.files.is_empty());
    }

    #[tokio::test]
    async fn oversized_object_is_rejected_before_scanning() {
        let f = fixture(
            FakeScanEngine::clean(),
            IntakePolicy {
                max_file_size: 4,
                ..policy()
            },
        );
        let req = UploadRequest {
            size: None,
            ..request()
        };
        let err = f.service.intake(Ok("good"), req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(f.engine.scan_count(), 0);
        assert!(f.files.is_empty());
    }

    #[tokio::test]
    async fn skipped_scan_is_recorded_when_optional() {
        let f = fixture(FakeScanEngine::unavailable(), policy());
        let record = f.service.intake(Ok("good"), request()).await.unwrap();
        assert_eq!(record.infected, Some(false));
        assert!(record.scan_output.unwrap().starts_with("skipped"));
        assert_eq!(f.engine.scan_count(), 0);
    }

    #[tokio::test]
    async fn required_scan_fails_closed_without_record() {
        let f = fixture(
            FakeScanEngine::unavailable(),
            IntakePolicy {
                scan_required: true,
                ..policy()
            },
        );
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::ScannerUnavailable(_)));
        assert!(f.files.is_empty());
    }

    #[tokio::test]
    async fn engine_crash_is_not_an_infection() {
        let f = fixture(FakeScanEngine::failing("LibClamAV Error"), policy());
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::ScanFailed(_)));
        assert!(f.files.is_empty());
    }

    #[tokio::test]
    async fn persist_failure_is_reported_after_clean_scan() {
        let f = fixture(FakeScanEngine::clean(), policy());
        f.files.fail_inserts();
        let err = f.service.intake(Ok("good"), request()).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(f.engine.scan_count(), 1);
    }

    #[tokio::test]
    async fn missing_name_and_size_are_derived() {
        let f = fixture(FakeScanEngine::clean(), policy());
        f.storage.put("subjects/s1/report.pdf", b"%PDF-1.7");
        let req = UploadRequest {
            subject_id: Some("s1".to_string()),
            path: Some("subjects/s1/report.pdf".to_string()),
            ..Default::default()
        };
        let record = f.service.intake(Ok("good"), req).await.unwrap();
        assert_eq!(record.name, "report.pdf");
        assert_eq!(record.size, Some(8));
    }
}
