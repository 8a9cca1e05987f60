//! Filegate database layer
//!
//! The scan record store and subject registry: narrow traits consumed by the intake
//! pipeline, their PostgreSQL repositories, and in-memory doubles for tests.

pub mod db;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

pub use db::{FileRecordRepository, SubjectRepository};
pub use traits::{FileRecordStore, ScanUpdate, SubjectRegistry};
