//! In-memory storage gateway for tests.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Object store double that records how often bytes were fetched.
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    downloads: Arc<AtomicUsize>,
    fail_downloads: Arc<AtomicBool>,
    fail_signing: Arc<AtomicBool>,
    signed_url: Arc<Mutex<Option<String>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, key: &str, data: &[u8]) -> Self {
        self.put(key, data);
        self
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    /// Make every presign call return `url` verbatim.
    pub fn with_signed_url(self, url: &str) -> Self {
        *self.signed_url.lock().unwrap() = Some(url.to_string());
        self
    }

    pub fn fail_downloads(&self) {
        self.fail_downloads.store(true, Ordering::SeqCst);
    }

    pub fn fail_signing(&self) {
        self.fail_signing.store(true, Ordering::SeqCst);
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed("simulated outage".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    async fn upload_with_key(
        &self,
        storage_key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(format!("memory://{}", storage_key))
    }

    async fn get_presigned_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if self.fail_signing.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("signer unavailable".to_string()));
        }
        if let Some(url) = self.signed_url.lock().unwrap().clone() {
            return Ok(url);
        }
        Ok(format!(
            "memory://{}?expires_in={}",
            storage_key,
            expires_in.as_secs()
        ))
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.objects.lock().unwrap().contains_key(storage_key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
