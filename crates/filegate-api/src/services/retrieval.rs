//! Retrieval gate: issues short-lived download URLs for stored objects.

use filegate_core::{AppError, SignedUrlConfig};
use filegate_db::FileRecordStore;
use filegate_storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;

use crate::auth::Authenticator;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SignedUrlRequest {
    pub path: Option<String>,
    /// Lifetime in seconds
    pub expires: Option<u64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignedUrlResponse {
    pub url: String,
}

#[derive(Clone)]
pub struct RetrievalGate {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileRecordStore>,
    authenticator: Arc<dyn Authenticator>,
    config: SignedUrlConfig,
}

impl RetrievalGate {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRecordStore>,
        authenticator: Arc<dyn Authenticator>,
        config: SignedUrlConfig,
    ) -> Self {
        Self {
            storage,
            files,
            authenticator,
            config,
        }
    }

    /// Issue a download handle for `request.path`.
    ///
    /// `bearer` is only consulted when the gate is configured to require authentication.
    pub async fn issue(
        &self,
        bearer: Result<&str, AppError>,
        request: SignedUrlRequest,
    ) -> Result<SignedUrlResponse, AppError> {
        let path = request
            .path
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing path".to_string()))?;

        let ttl = request.expires.unwrap_or(self.config.default_ttl_secs);
        if ttl == 0 || ttl > self.config.max_ttl_secs {
            return Err(AppError::BadRequest(format!(
                "expires must be between 1 and {} seconds",
                self.config.max_ttl_secs
            )));
        }

        if self.config.require_auth {
            self.authorize(bearer, &path).await?;
        }

        let url = self
            .storage
            .get_presigned_url(&path, Duration::from_secs(ttl))
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Failed to issue signed URL");
                match e {
                    StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
                    other => AppError::Internal(other.to_string()),
                }
            })?;

        tracing::debug!(path = %path, ttl_secs = ttl, "Issued signed URL");
        Ok(SignedUrlResponse { url })
    }

    async fn authorize(&self, bearer: Result<&str, AppError>, path: &str) -> Result<(), AppError> {
        let principal = self.authenticator.authenticate(bearer?).await?;

        let record = self
            .files
            .find_latest_by_path(path)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if record.is_infected() {
            tracing::warn!(
                file_id = %record.id,
                principal = %principal.id,
                "Refused download handle for infected file"
            );
            return Err(AppError::BadRequest(
                "File is flagged as infected".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use filegate_core::models::{NewFileRecord, Principal, ScanFields, ScanOutcome};
    use filegate_db::test_helpers::InMemoryFileRecordStore;
    use filegate_storage::test_helpers::MockStorage;

    struct AnyToken;

    #[async_trait]
    impl Authenticator for AnyToken {
        async fn authenticate(&self, _token: &str) -> Result<Principal, AppError> {
            Ok(Principal::new("user-1"))
        }
    }

    fn config(require_auth: bool) -> SignedUrlConfig {
        SignedUrlConfig {
            default_ttl_secs: 60,
            max_ttl_secs: 3600,
            require_auth,
        }
    }

    fn gate(storage: MockStorage, files: InMemoryFileRecordStore, require_auth: bool) -> RetrievalGate {
        RetrievalGate::new(
            Arc::new(storage),
            Arc::new(files),
            Arc::new(AnyToken),
            config(require_auth),
        )
    }

    fn unauthenticated() -> Result<&'static str, AppError> {
        Err(AppError::Unauthorized("Missing authorization header".to_string()))
    }

    #[tokio::test]
    async fn issues_gateway_url_with_default_ttl() {
        let gate = gate(MockStorage::new(), InMemoryFileRecordStore::new(), false);
        let response = gate
            .issue(
                unauthenticated(),
                SignedUrlRequest {
                    path: Some("a".to_string()),
                    expires: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.url, "memory://a?expires_in=60");
    }

    #[tokio::test]
    async fn rejects_missing_path_and_bad_ttl() {
        let gate = gate(MockStorage::new(), InMemoryFileRecordStore::new(), false);
        let err = gate
            .issue(unauthenticated(), SignedUrlRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Missing path"));

        let err = gate
            .issue(
                unauthenticated(),
                SignedUrlRequest {
                    path: Some("a".to_string()),
                    expires: Some(3601),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn gateway_failure_is_internal() {
        let storage = MockStorage::new();
        storage.fail_signing();
        let gate = gate(storage, InMemoryFileRecordStore::new(), false);
        let err = gate
            .issue(
                unauthenticated(),
                SignedUrlRequest {
                    path: Some("a".to_string()),
                    expires: Some(60),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn authenticated_mode_checks_caller_and_record() {
        let files = InMemoryFileRecordStore::new();
        files
            .insert(NewFileRecord {
                subject_id: "s1".to_string(),
                name: "bad.exe".to_string(),
                path: "bad.exe".to_string(),
                size: Some(68),
                content_type: None,
                uploaded_by: "user-1".to_string(),
                scan: ScanFields::from_outcome(&ScanOutcome::infected("bad.exe: Eicar FOUND"), Utc::now()),
            })
            .await
            .unwrap();
        let gate = gate(MockStorage::new(), files, true);

        let request = |path: &str| SignedUrlRequest {
            path: Some(path.to_string()),
            expires: None,
        };

        let err = gate.issue(unauthenticated(), request("bad.exe")).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = gate.issue(Ok("token"), request("unknown")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = gate.issue(Ok("token"), request("bad.exe")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
