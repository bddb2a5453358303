// src/types.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a remote test run as reported by the service.
///
/// Only `Queued` keeps the monitor waiting; every other status (including
/// ones this client does not know about yet) means the run has settled as
/// far as the wait loop is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Queued,
    Running,
    Passed,
    Failed,
    Errored,
    Canceled,
    ForceCanceled,
    Finished,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether a run in this status is still waiting to be picked up.
    pub fn is_queued(self) -> bool {
        self == RunStatus::Queued
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Queued => "queued",
            RunStatus::Running => "running",
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::Errored => "errored",
            RunStatus::Canceled => "canceled",
            RunStatus::ForceCanceled => "force_canceled",
            RunStatus::Finished => "finished",
            RunStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a `run` block in a test file is planned.
///
/// - `Normal`: a regular plan/apply.
/// - `RefreshOnly`: only refresh state, never propose changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestMode {
    Normal,
    RefreshOnly,
}

impl Default for TestMode {
    fn default() -> Self {
        TestMode::Normal
    }
}

/// Mode the renderer should use when presenting a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanMode {
    Normal,
    RefreshOnly,
}

impl From<TestMode> for PlanMode {
    fn from(mode: TestMode) -> Self {
        match mode {
            TestMode::Normal => PlanMode::Normal,
            TestMode::RefreshOnly => PlanMode::RefreshOnly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_statuses_decode_to_catch_all() {
        let status: RunStatus = serde_json::from_str("\"planned_and_saved\"").unwrap();
        assert_eq!(status, RunStatus::Unknown);
        assert!(!status.is_queued());
    }

    #[test]
    fn force_canceled_uses_snake_case_on_the_wire() {
        let status: RunStatus = serde_json::from_str("\"force_canceled\"").unwrap();
        assert_eq!(status, RunStatus::ForceCanceled);
        assert_eq!(status.to_string(), "force_canceled");
    }

    #[test]
    fn test_mode_uses_kebab_case() {
        let mode: TestMode = serde_json::from_str("\"refresh-only\"").unwrap();
        assert_eq!(mode, TestMode::RefreshOnly);
        assert_eq!(PlanMode::from(mode), PlanMode::RefreshOnly);
        assert!(serde_json::from_str::<TestMode>("\"destroy\"").is_err());
    }
}
