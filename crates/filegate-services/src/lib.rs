//! Filegate Services Library
//!
//! The scan engine adapter: a capability interface over an external malware scanner,
//! with a `clamscan` subprocess implementation and an optional `clamd` one.

pub mod services;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use services::{create_scan_engine, ClamScanEngine, ScanEngine, ScanError};

#[cfg(feature = "clamd")]
pub use services::ClamdEngine;
