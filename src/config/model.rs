// src/config/model.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::cron::CronSchedule;
use crate::types::{OverlapPolicy, WorkspaceRetention};

/// Jobs file exactly as deserialized from TOML or YAML, before validation.
///
/// ```toml
/// [config]
/// overlap = "skip"
/// keep_workspace = "on_failure"
///
/// [[jobs]]
/// name = "nightly"
/// schedule = "0 3 * * *"
/// script = ["pg_dump app > ${TEMP_DIR}/app.sql"]
/// filepath_to_upload = "${TEMP_DIR}/app.sql"
/// timeout = "2h"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All `[[jobs]]` entries, in file order.
    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// `"skip"` (default) or `"allow"`.
    #[serde(default)]
    pub overlap: OverlapPolicy,

    /// Default workspace retention for jobs that do not override it.
    #[serde(default)]
    pub keep_workspace: WorkspaceRetention,

    /// Directory under which run workspaces are created.
    ///
    /// `None` means the system temp directory.
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
}

impl ConfigSection {
    pub fn effective_temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// One `[[jobs]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,

    /// Cron expression, 5 fields (minute precision) or 6 fields (leading seconds).
    pub schedule: String,

    /// Shell statements run in one shell session, in order.
    #[serde(alias = "commands")]
    pub script: Vec<String>,

    /// Path the script is expected to produce. Placeholders are expanded.
    #[serde(alias = "artifact_path")]
    pub filepath_to_upload: String,

    /// Optional deadline for the script, e.g. `"90s"` or `"2h"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Per-job override of `[config].keep_workspace`.
    #[serde(default)]
    pub keep_workspace: Option<WorkspaceRetention>,
}

/// Validated configuration. Only constructed through
/// `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub jobs: Vec<Arc<TaskDefinition>>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, jobs: Vec<TaskDefinition>) -> Self {
        Self {
            config,
            jobs: jobs.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn job(&self, name: &str) -> Option<&Arc<TaskDefinition>> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// Immutable definition of a backup task.
///
/// Shared between every run of the task; runs expand the commands into
/// their own copies and never write back.
#[derive(Debug, Clone)]
pub struct TaskDefinition {
    pub name: String,
    pub schedule: CronSchedule,
    pub commands: Vec<String>,
    pub artifact_path: String,
    pub timeout: Option<Duration>,
    pub keep_workspace: Option<WorkspaceRetention>,
}

impl TaskDefinition {
    /// Retention for this task given the global default.
    pub fn effective_retention(&self, default: WorkspaceRetention) -> WorkspaceRetention {
        self.keep_workspace.unwrap_or(default)
    }
}
