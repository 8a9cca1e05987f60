use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload};
use std::time::{Duration, Instant};

/// Object store gateway over S3 or an S3-compatible provider (MinIO, R2, ...).
///
/// Credentials come from the usual `AWS_*` environment variables.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    /// Custom endpoint for S3-compatible providers
    endpoint_url: Option<String>,
}

impl S3Storage {
    /// `endpoint_url` switches to path-style addressing, e.g. `http://localhost:9000`
    /// for a local MinIO.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = &endpoint_url {
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Invalid S3 configuration: {}", e)))?;

        tracing::info!(bucket = %bucket, region = %region, endpoint = ?endpoint_url, "S3 storage configured");

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn location(storage_key: &str) -> StorageResult<Path> {
        validate_key(storage_key)?;
        Ok(Path::from(storage_key))
    }

    fn object_url(&self, key: &str) -> String {
        object_url(&self.bucket, &self.region, self.endpoint_url.as_deref(), key)
    }
}

/// Unsigned URL of an object: path-style behind a custom endpoint, virtual-hosted on AWS.
fn object_url(bucket: &str, region: &str, endpoint: Option<&str>, key: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[async_trait]
impl Storage for S3Storage {
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let location = Self::location(storage_key)?;
        let start = Instant::now();

        let fetched = async {
            let object = self.store.get(&location).await?;
            object.bytes().await
        }
        .await;

        let bytes = match fetched {
            Ok(bytes) => bytes,
            Err(ObjectStoreError::NotFound { .. }) => {
                return Err(StorageError::NotFound(storage_key.to_string()));
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = elapsed_ms(start),
                    "S3 download failed"
                );
                return Err(StorageError::DownloadFailed(e.to_string()));
            }
        };

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len(),
            duration_ms = elapsed_ms(start),
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let location = Self::location(storage_key)?;
        let size = data.len();
        let start = Instant::now();

        self.store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    size_bytes = size,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(e.to_string())
            })?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = elapsed_ms(start),
            "S3 upload successful"
        );

        Ok(self.object_url(storage_key))
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let location = Self::location(storage_key)?;
        let url = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::BackendError(format!("Failed to presign URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let location = Self::location(storage_key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
