// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// What to do when a job's schedule fires while its previous run is still
/// active.
///
/// - `Skip`: drop the new trigger; the active run continues (default).
/// - `Allow`: start another run alongside the active one. Run ids and
///   workspace suffixes keep the two runs apart on disk and in the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    #[default]
    Skip,
    Allow,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(OverlapPolicy::Skip),
            "allow" => Ok(OverlapPolicy::Allow),
            other => Err(format!(
                "invalid overlap policy: {other} (expected \"skip\" or \"allow\")"
            )),
        }
    }
}

/// When a run's workspace directory survives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRetention {
    /// Always remove the workspace when the run ends.
    #[default]
    Never,
    /// Keep the workspace of failed runs for debugging.
    OnFailure,
    /// Never remove the workspace.
    Always,
}

impl WorkspaceRetention {
    /// Whether a run that ended with `succeeded` should keep its workspace.
    pub fn keeps(self, succeeded: bool) -> bool {
        match self {
            WorkspaceRetention::Never => false,
            WorkspaceRetention::OnFailure => !succeeded,
            WorkspaceRetention::Always => true,
        }
    }
}

impl FromStr for WorkspaceRetention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "never" => Ok(WorkspaceRetention::Never),
            "on_failure" | "on-failure" => Ok(WorkspaceRetention::OnFailure),
            "always" => Ok(WorkspaceRetention::Always),
            other => Err(format!(
                "invalid keep_workspace: {other} (expected \"never\", \"on_failure\" or \"always\")"
            )),
        }
    }
}
