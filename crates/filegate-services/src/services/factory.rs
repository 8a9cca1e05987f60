use filegate_core::config::{ScanConfig, ScanEngineKind};
use std::sync::Arc;
use std::time::Duration;

use super::clamscan::ClamScanEngine;
use super::engine::{ScanEngine, ScanError};

/// Build the configured scan engine
pub fn create_scan_engine(config: &ScanConfig) -> Result<Arc<dyn ScanEngine>, ScanError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.engine {
        ScanEngineKind::ClamScan => Ok(Arc::new(ClamScanEngine::new(
            config.clamscan_path.clone(),
            timeout,
        ))),

        #[cfg(feature = "clamd")]
        ScanEngineKind::Clamd => Ok(Arc::new(super::clamd::ClamdEngine::new(
            config.clamav_host.clone(),
            config.clamav_port,
            timeout,
        ))),

        #[cfg(not(feature = "clamd"))]
        ScanEngineKind::Clamd => Err(ScanError::Unavailable(
            "clamd engine not available (clamd feature not enabled)".to_string(),
        )),
    }
}
