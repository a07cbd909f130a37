// src/pipeline/mod.rs

//! The per-run backup pipeline.
//!
//! One invocation of [`Pipeline::run`] walks a task through:
//!
//! 1. run id generation ([`id`])
//! 2. workspace provisioning ([`workspace`])
//! 3. placeholder expansion ([`template`])
//! 4. shell execution with log capture ([`crate::exec`])
//! 5. artifact existence check ([`validate`])
//! 6. destination naming ([`naming`])
//! 7. content type sniffing ([`content_type`])
//! 8. upload ([`upload`])
//!
//! The first failing step ends the run; [`orchestrator`] owns that
//! sequencing and the workspace cleanup.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub mod content_type;
pub mod id;
pub mod naming;
pub mod orchestrator;
pub mod template;
pub mod upload;
pub mod validate;
pub mod workspace;

pub use content_type::{detect_content_type, DetectionError};
pub use id::{generate_run_id, RunId};
pub use naming::artifact_name;
pub use orchestrator::{Pipeline, PipelineOptions, RunContext, RunFailure, RunReport};
pub use template::{expand, expand_commands, TemplateVars};
pub use upload::{dispatch_upload, UploadError};
pub use validate::{validate_artifact, ValidationError};
pub use workspace::{Workspace, WorkspaceError};

use crate::exec::ExecutionError;

/// Log fields identifying one run. Passed explicitly to every component
/// that logs.
#[derive(Debug, Clone)]
pub struct RunScope {
    pub task: Arc<str>,
    pub run_id: RunId,
}

impl RunScope {
    pub fn new(task: &str, run_id: RunId) -> Self {
        Self {
            task: Arc::from(task),
            run_id,
        }
    }
}

/// States of a run. `Uploaded` is the successful terminal state; failure
/// is reported as a [`RunFailure`] carrying the stage being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStage {
    Starting,
    WorkspaceReady,
    CommandsExpanded,
    Executed,
    Validated,
    Named,
    TypeDetected,
    Uploaded,
}

impl RunStage {
    /// Human name of the step that leads into this stage.
    pub fn step_name(self) -> &'static str {
        match self {
            RunStage::Starting => "start run",
            RunStage::WorkspaceReady => "provision workspace",
            RunStage::CommandsExpanded => "expand commands",
            RunStage::Executed => "execute commands",
            RunStage::Validated => "validate artifact",
            RunStage::Named => "name artifact",
            RunStage::TypeDetected => "detect content type",
            RunStage::Uploaded => "upload artifact",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything that can end a run early.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Reserved: expansion currently has no failure mode.
    #[error("template expansion failed: {0}")]
    Template(String),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("run cancelled")]
    Cancelled,
}
