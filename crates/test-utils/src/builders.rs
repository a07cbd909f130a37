#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use cronbackup::config::{ConfigFile, ConfigSection, JobConfig, RawConfigFile, TaskDefinition};
use cronbackup::pipeline::{Pipeline, PipelineOptions};
use cronbackup::types::{OverlapPolicy, WorkspaceRetention};

use crate::recording_store::RecordingStore;

/// Bucket name used by [`test_pipeline`].
pub const TEST_BUCKET: &str = "backups";

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                jobs: Vec::new(),
            },
        }
    }

    pub fn with_job(mut self, job: JobConfig) -> Self {
        self.config.jobs.push(job);
        self
    }

    pub fn overlap(mut self, policy: OverlapPolicy) -> Self {
        self.config.config.overlap = policy;
        self
    }

    pub fn keep_workspace(mut self, retention: WorkspaceRetention) -> Self {
        self.config.config.keep_workspace = retention;
        self
    }

    pub fn temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.config.temp_root = Some(root.into());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            job: JobConfig {
                name: name.to_string(),
                schedule: "0 3 * * *".to_string(),
                script: vec![],
                filepath_to_upload: "${TEMP_DIR}/out.txt".to_string(),
                timeout: None,
                keep_workspace: None,
            },
        }
    }

    pub fn schedule(mut self, expr: &str) -> Self {
        self.job.schedule = expr.to_string();
        self
    }

    pub fn command(mut self, line: &str) -> Self {
        self.job.script.push(line.to_string());
        self
    }

    pub fn artifact(mut self, path: &str) -> Self {
        self.job.filepath_to_upload = path.to_string();
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.job.timeout = Some(duration.to_string());
        self
    }

    pub fn keep_workspace(mut self, retention: WorkspaceRetention) -> Self {
        self.job.keep_workspace = Some(retention);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }

    /// Validate this single job into a shared `TaskDefinition`.
    pub fn task(self) -> Arc<TaskDefinition> {
        let cfg = ConfigFileBuilder::new().with_job(self.job).build();
        Arc::clone(&cfg.jobs[0])
    }
}

/// A pipeline over a `RecordingStore` with workspaces under `temp_root`.
pub fn test_pipeline(
    store: Arc<RecordingStore>,
    temp_root: &Path,
    keep_workspace: WorkspaceRetention,
) -> Pipeline<RecordingStore> {
    Pipeline::new(
        store,
        PipelineOptions {
            bucket: TEST_BUCKET.to_string(),
            temp_root: temp_root.to_path_buf(),
            keep_workspace,
        },
    )
}
