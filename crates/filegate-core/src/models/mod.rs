//! Data models for the application
//!
//! Persistent entities (`FileRecord`, `Subject`), the scan engine's value type
//! (`ScanOutcome`) and the authenticated caller (`Principal`).

mod file_record;
mod principal;
mod scan;
mod subject;

pub use file_record::*;
pub use principal::*;
pub use scan::*;
pub use subject::*;
