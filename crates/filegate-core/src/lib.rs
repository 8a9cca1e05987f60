//! Filegate Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Filegate component: the storage gateway, the record store, the scan
//! engine adapter and the HTTP API.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, ScanConfig, ScanEngineKind, SignedUrlConfig, StorageConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
