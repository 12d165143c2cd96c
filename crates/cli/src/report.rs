//! Results file written after a run

use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use attacomm::reporter::CaseResult;
use attacomm::{FallbackReason, RunSummary, SessionEvent, SessionOutcome};

/// Exit code when every assertion passed
pub const EXIT_PASSED: i32 = 0;
/// Exit code when at least one assertion failed
pub const EXIT_FAILED: i32 = 1;
/// Exit code when the test must be finished manually
pub const EXIT_MANUAL: i32 = 2;
/// Exit code when the session never got to run
pub const EXIT_LOAD_FAILED: i32 = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed { summary: RunSummary },
    Manual { reason: FallbackReason, message: String },
    LoadFailed { message: String },
    Aborted { message: String },
    NotReady,
}

impl From<SessionOutcome> for RunStatus {
    fn from(outcome: SessionOutcome) -> Self {
        match outcome {
            SessionOutcome::Completed(summary) => RunStatus::Completed { summary },
            SessionOutcome::Manual(reason) => RunStatus::Manual {
                message: reason.to_string(),
                reason,
            },
            SessionOutcome::LoadFailed(message) => RunStatus::LoadFailed { message },
            SessionOutcome::Aborted(message) => RunStatus::Aborted { message },
            SessionOutcome::NotReady => RunStatus::NotReady,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub adapter_uri: String,
    #[serde(flatten)]
    pub status: RunStatus,
    pub cases: Vec<CaseResult>,
    pub events: Vec<SessionEvent>,
}

impl RunReport {
    pub fn exit_code(&self) -> i32 {
        match &self.status {
            RunStatus::Completed { summary } if summary.success() => EXIT_PASSED,
            RunStatus::Completed { .. } => EXIT_FAILED,
            RunStatus::Manual { .. } => EXIT_MANUAL,
            RunStatus::LoadFailed { .. } | RunStatus::Aborted { .. } | RunStatus::NotReady => {
                EXIT_LOAD_FAILED
            }
        }
    }

    /// Write the report as JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        info!("Results written to: {}", path.display());
        Ok(())
    }
}
