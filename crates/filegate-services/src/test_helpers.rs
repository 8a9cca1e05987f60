//! Scriptable scan engine for tests.

use async_trait::async_trait;
use filegate_core::models::ScanOutcome;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::services::{ScanEngine, ScanError};

#[derive(Clone, Debug)]
enum Script {
    Clean,
    Infected(String),
    Fail(String),
}

/// Engine double with a fixed answer and invocation counters.
/// Clones share state, so a test can keep one handle after moving another into the app.
#[derive(Clone)]
pub struct FakeScanEngine {
    available: Arc<AtomicBool>,
    script: Arc<Mutex<Script>>,
    probes: Arc<AtomicUsize>,
    scans: Arc<AtomicUsize>,
}

impl FakeScanEngine {
    fn with_script(script: Script) -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
            script: Arc::new(Mutex::new(script)),
            probes: Arc::new(AtomicUsize::new(0)),
            scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn clean() -> Self {
        Self::with_script(Script::Clean)
    }

    pub fn infected(output: &str) -> Self {
        Self::with_script(Script::Infected(output.to_string()))
    }

    /// Available, but every scan ends in an engine failure
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Fail(message.to_string()))
    }

    pub fn unavailable() -> Self {
        let engine = Self::clean();
        engine.set_available(false);
        engine
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn report_infected(&self, output: &str) {
        *self.script.lock().unwrap() = Script::Infected(output.to_string());
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanEngine for FakeScanEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available.load(Ordering::SeqCst)
    }

    async fn scan_buffer(&self, data: &[u8]) -> Result<ScanOutcome, ScanError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(ScanError::Unavailable("fake engine offline".to_string()));
        }
        let script = self.script.lock().unwrap().clone();
        match script {
            Script::Clean => Ok(ScanOutcome::clean(format!("buffer ({} bytes): OK", data.len()))),
            Script::Infected(output) => Ok(ScanOutcome::infected(output)),
            Script::Fail(message) => Err(ScanError::Engine {
                exit_code: Some(2),
                output: message,
            }),
        }
    }
}
