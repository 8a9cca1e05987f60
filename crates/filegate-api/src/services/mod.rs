//! Pipeline services behind the HTTP handlers

pub mod intake;
pub mod rescan;
pub mod retrieval;
pub mod scan_step;

pub use intake::{IntakePolicy, IntakeService, UploadRequest};
pub use rescan::{RescanRequest, RescanResult, RescanService};
pub use retrieval::{RetrievalGate, SignedUrlRequest, SignedUrlResponse};
