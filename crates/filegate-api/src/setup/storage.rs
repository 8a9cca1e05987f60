//! Object store setup

use anyhow::{Context, Result};
use filegate_core::{Config, StorageBackend};
use filegate_storage::{create_local_storage, create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Build the configured backend. With the local backend the concrete
/// [`LocalStorage`] is returned as well, to redeem signed media URLs.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, Option<LocalStorage>)> {
    let result = match config.storage.backend {
        StorageBackend::Local => {
            let local = create_local_storage(config)
                .await
                .context("Failed to initialize local storage")?;
            let storage: Arc<dyn Storage> = Arc::new(local.clone());
            (storage, Some(local))
        }
        StorageBackend::S3 => {
            let storage = create_storage(config)
                .await
                .context("Failed to initialize S3 storage")?;
            (storage, None)
        }
    };

    tracing::info!(backend = %config.storage.backend, "Storage initialized");
    Ok(result)
}
