use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::SKIPPED_SCAN_MARKER;

/// Verdict tag of a malware scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScanVerdict {
    Clean,
    Infected,
    /// The engine was unavailable and scanning was not required. Treated as non-infected.
    Skipped,
}

impl Display for ScanVerdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ScanVerdict::Clean => write!(f, "clean"),
            ScanVerdict::Infected => write!(f, "infected"),
            ScanVerdict::Skipped => write!(f, "skipped"),
        }
    }
}

/// Normalized result of one scan: the verdict plus the engine's diagnostic text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanOutcome {
    pub verdict: ScanVerdict,
    pub output: String,
}

impl ScanOutcome {
    pub fn clean(output: impl Into<String>) -> Self {
        Self {
            verdict: ScanVerdict::Clean,
            output: output.into(),
        }
    }

    pub fn infected(output: impl Into<String>) -> Self {
        Self {
            verdict: ScanVerdict::Infected,
            output: output.into(),
        }
    }

    /// Synthesized outcome for a scan that never ran. The diagnostic always
    /// starts with the skip marker so the audit trail shows it.
    pub fn skipped(reason: &str) -> Self {
        let reason = reason.trim();
        let output = if reason.is_empty() {
            SKIPPED_SCAN_MARKER.to_string()
        } else {
            format!("{}: {}", SKIPPED_SCAN_MARKER, reason)
        };
        Self {
            verdict: ScanVerdict::Skipped,
            output,
        }
    }

    pub fn is_infected(&self) -> bool {
        self.verdict == ScanVerdict::Infected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skipped_outcome_is_never_blank() {
        let outcome = ScanOutcome::skipped("");
        assert_eq!(outcome.output, "skipped");
        assert!(!outcome.is_infected());

        let outcome = ScanOutcome::skipped("clamscan not found");
        assert!(outcome.output.starts_with("skipped"));
        assert!(outcome.output.contains("clamscan not found"));
    }

    #[test]
    fn verdict_serializes_lowercase() {
        let json = serde_json::to_string(&ScanOutcome::infected("x: Eicar FOUND")).unwrap();
        assert!(json.contains("\"verdict\":\"infected\""));
        assert_eq!(ScanVerdict::Skipped.to_string(), "skipped");
    }
}
