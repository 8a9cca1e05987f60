#[cfg(feature = "clamd")]
pub mod clamd;
pub mod clamscan;
pub mod engine;
pub mod factory;

#[cfg(feature = "clamd")]
pub use clamd::ClamdEngine;
pub use clamscan::ClamScanEngine;
pub use engine::{ScanEngine, ScanError};
pub use factory::create_scan_engine;
