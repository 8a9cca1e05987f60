use crate::traits::{validate_key, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Download handles are `{base_url}/{key}?expires={unix}&signature={hex}` where the
/// signature is HMAC-SHA256 over `key` and `expires`. The API redeems them through
/// [`LocalStorage::verify_signature`].
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/filegate/objects")
    /// * `base_url` - Base URL files are served from (e.g., "http://localhost:4000/media")
    /// * `signing_secret` - Key for download handle signatures
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();
        let signing_secret = signing_secret.into();

        if signing_secret.is_empty() {
            return Err(StorageError::ConfigError(
                "Local storage signing secret must not be empty".to_string(),
            ));
        }

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            signing_secret,
        })
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Rejects keys whose resolved path would escape the base storage directory.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Generate plain URL for a key, percent-encoding each segment
    fn generate_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.base_url.trim_end_matches('/'), encoded.join("/"))
    }

    fn mac(&self, storage_key: &str, expires: u64) -> StorageResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::ConfigError(format!("Invalid signing secret: {}", e)))?;
        mac.update(storage_key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Hex signature for `storage_key` valid until the unix timestamp `expires`.
    pub fn sign(&self, storage_key: &str, expires: u64) -> StorageResult<String> {
        let tag = self.mac(storage_key, expires)?.finalize().into_bytes();
        Ok(hex::encode(tag))
    }

    /// Check a download handle's signature and expiry.
    pub fn verify_signature(
        &self,
        storage_key: &str,
        expires: u64,
        signature: &str,
    ) -> StorageResult<()> {
        let now = unix_now();
        if now > expires {
            return Err(StorageError::InvalidSignature(
                "Download link has expired".to_string(),
            ));
        }

        let provided = hex::decode(signature).map_err(|_| {
            StorageError::InvalidSignature("Malformed download signature".to_string())
        })?;

        self.mac(storage_key, expires)?
            .verify_slice(&provided)
            .map_err(|_| StorageError::InvalidSignature("Signature mismatch".to_string()))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[async_trait]
impl Storage for LocalStorage {
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }

        let data = fs::read(&path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage download successful"
        );

        Ok(data)
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload_with_key successful"
        );

        Ok(self.generate_url(storage_key))
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.key_to_path(storage_key)?;
        let expires = unix_now().saturating_add(expires_in.as_secs());
        let signature = self.sign(storage_key, expires)?;
        Ok(format!(
            "{}?expires={}&signature={}",
            self.generate_url(storage_key),
            expires,
            signature
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
