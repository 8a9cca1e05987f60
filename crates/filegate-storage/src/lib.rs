//! Filegate Storage Library
//!
//! Object store gateway: the narrow interface the intake pipeline uses to read stored
//! objects and to issue time-limited download URLs. Implementations exist for S3
//! (and S3-compatible providers) through `object_store`, and for the local filesystem.
//!
//! # Storage keys
//!
//! Keys are the paths clients uploaded to, e.g. `subjects/s1/report.pdf`. They must not
//! contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use factory::create_local_storage;
pub use filegate_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
