// src/pipeline/orchestrator.rs

//! Sequencing of one run.
//!
//! ```text
//! Starting -> WorkspaceReady -> CommandsExpanded -> Executed
//!          -> Validated -> Named -> TypeDetected -> Uploaded
//! ```
//!
//! Any step failure ends the run with a [`RunFailure`] naming the stage that
//! was being attempted. Nothing is retried and nothing is rolled back,
//! except that the workspace is removed on every exit path unless the
//! retention policy keeps it.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigSection, TaskDefinition};
use crate::exec::{run_commands, ExecutionError, RunControl, TracingSink};
use crate::storage::ObjectStore;
use crate::types::WorkspaceRetention;

use super::content_type::detect_content_type;
use super::id::{generate_run_id, RunId};
use super::naming::artifact_name;
use super::template::{expand, expand_commands, TemplateVars};
use super::upload::dispatch_upload;
use super::validate::validate_artifact;
use super::workspace::Workspace;
use super::{PipelineError, RunScope, RunStage};

/// Process-wide settings shared by every run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub bucket: String,
    pub temp_root: PathBuf,
    pub keep_workspace: WorkspaceRetention,
}

impl PipelineOptions {
    pub fn from_config(config: &ConfigSection, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            temp_root: config.effective_temp_root(),
            keep_workspace: config.keep_workspace,
        }
    }
}

/// State owned by a single run. Never shared, never persisted.
#[derive(Debug)]
pub struct RunContext {
    pub scope: RunScope,
    pub workspace: Workspace,
    pub expanded_commands: Vec<String>,
    pub artifact_path: PathBuf,
    pub started_at: DateTime<Utc>,
}

/// Successful terminal state of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub task: Arc<str>,
    pub run_id: RunId,
    pub object_name: String,
    pub content_type: String,
    pub started_at: DateTime<Utc>,
    pub retained_workspace: Option<PathBuf>,
}

/// Failed terminal state of a run.
#[derive(Debug, Error)]
#[error("run {run_id} of '{task}' failed to {}: {error}", .stage.step_name())]
pub struct RunFailure {
    pub task: Arc<str>,
    pub run_id: RunId,
    /// The stage the run was trying to reach.
    pub stage: RunStage,
    #[source]
    pub error: PipelineError,
    pub retained_workspace: Option<PathBuf>,
}

struct Uploaded {
    object_name: String,
    content_type: String,
}

/// Runs backup tasks against one storage backend and bucket.
pub struct Pipeline<S: ObjectStore> {
    store: Arc<S>,
    options: PipelineOptions,
}

impl<S: ObjectStore> Pipeline<S> {
    pub fn new(store: Arc<S>, options: PipelineOptions) -> Self {
        Self { store, options }
    }

    /// Entry point for the scheduler: run the task now and report only
    /// through logs.
    pub async fn run_logged(&self, task: &TaskDefinition, cancel: CancellationToken) {
        // Both outcomes were already logged by `run`.
        let _ = self.run(task, cancel).await;
    }

    /// Run the task once.
    ///
    /// `task` is only read; expanded commands live in the run's own
    /// [`RunContext`].
    pub async fn run(
        &self,
        task: &TaskDefinition,
        cancel: CancellationToken,
    ) -> Result<RunReport, RunFailure> {
        let scope = RunScope::new(&task.name, generate_run_id());
        let started_at = Utc::now();
        info!(run_id = %scope.run_id, task = %scope.task, "backup task started");

        let workspace =
            match Workspace::provision(&self.options.temp_root, &task.name, &scope.run_id) {
                Ok(ws) => ws,
                Err(e) => {
                    return Err(failed(scope, RunStage::WorkspaceReady, e.into(), None));
                }
            };
        let mut stage = RunStage::WorkspaceReady;
        debug!(
            run_id = %scope.run_id,
            task = %scope.task,
            path = %workspace.path().display(),
            "workspace created"
        );
        transition(&scope, stage);

        let ctx = prepare(task, scope, workspace, started_at);
        stage = RunStage::CommandsExpanded;
        transition(&ctx.scope, stage);

        let outcome = self.drive(task, &ctx, &cancel, &mut stage).await;

        let retention = task.effective_retention(self.options.keep_workspace);
        let RunContext {
            scope, workspace, ..
        } = ctx;
        let retained = release_workspace(workspace, retention.keeps(outcome.is_ok()), &scope).await;

        match outcome {
            Ok(uploaded) => {
                info!(
                    run_id = %scope.run_id,
                    task = %scope.task,
                    object = %uploaded.object_name,
                    content_type = %uploaded.content_type,
                    "backup task completed"
                );
                Ok(RunReport {
                    task: scope.task,
                    run_id: scope.run_id,
                    object_name: uploaded.object_name,
                    content_type: uploaded.content_type,
                    started_at,
                    retained_workspace: retained,
                })
            }
            Err(error) => Err(failed(scope, next_stage(stage), error, retained)),
        }
    }

    /// Steps after expansion. `stage` tracks the last stage reached.
    async fn drive(
        &self,
        task: &TaskDefinition,
        ctx: &RunContext,
        cancel: &CancellationToken,
        stage: &mut RunStage,
    ) -> Result<Uploaded, PipelineError> {
        let sink = TracingSink::new(ctx.scope.clone());
        let control = RunControl::new(cancel.clone(), task.timeout);
        run_commands(&ctx.expanded_commands, &sink, &control)
            .await
            .map_err(|e| match e {
                ExecutionError::Cancelled => PipelineError::Cancelled,
                other => other.into(),
            })?;
        advance(stage, RunStage::Executed, &ctx.scope);

        guarded(cancel, validate_artifact(&ctx.artifact_path)).await?;
        advance(stage, RunStage::Validated, &ctx.scope);

        let object_name = artifact_name(
            &task.name,
            &ctx.scope.run_id,
            &ctx.artifact_path,
            ctx.started_at,
        );
        advance(stage, RunStage::Named, &ctx.scope);

        let content_type = guarded(cancel, detect_content_type(&ctx.artifact_path)).await?;
        advance(stage, RunStage::TypeDetected, &ctx.scope);

        guarded(
            cancel,
            dispatch_upload(
                self.store.as_ref(),
                &ctx.scope,
                &self.options.bucket,
                &object_name,
                &ctx.artifact_path,
                &content_type,
            ),
        )
        .await?;
        advance(stage, RunStage::Uploaded, &ctx.scope);

        Ok(Uploaded {
            object_name,
            content_type,
        })
    }
}

/// Build the run-local context: expanded commands and artifact path.
fn prepare(
    task: &TaskDefinition,
    scope: RunScope,
    workspace: Workspace,
    started_at: DateTime<Utc>,
) -> RunContext {
    let expanded_commands = expand_commands(&task.commands, &scope.run_id, workspace.path());
    let temp_dir = workspace.path().to_string_lossy().into_owned();
    let artifact_path = PathBuf::from(expand(
        &task.artifact_path,
        &TemplateVars {
            run_id: scope.run_id.as_str(),
            temp_dir: &temp_dir,
        },
    ));

    RunContext {
        scope,
        workspace,
        expanded_commands,
        artifact_path,
        started_at,
    }
}

fn transition(scope: &RunScope, stage: RunStage) {
    info!(run_id = %scope.run_id, task = %scope.task, %stage, "run stage reached");
}

fn advance(current: &mut RunStage, next: RunStage, scope: &RunScope) {
    *current = next;
    transition(scope, next);
}

fn next_stage(reached: RunStage) -> RunStage {
    match reached {
        RunStage::Starting => RunStage::WorkspaceReady,
        RunStage::WorkspaceReady => RunStage::CommandsExpanded,
        RunStage::CommandsExpanded => RunStage::Executed,
        RunStage::Executed => RunStage::Validated,
        RunStage::Validated => RunStage::Named,
        RunStage::Named => RunStage::TypeDetected,
        RunStage::TypeDetected | RunStage::Uploaded => RunStage::Uploaded,
    }
}

fn failed(
    scope: RunScope,
    stage: RunStage,
    error: PipelineError,
    retained_workspace: Option<PathBuf>,
) -> RunFailure {
    error!(
        run_id = %scope.run_id,
        task = %scope.task,
        failed_step = stage.step_name(),
        error = %error,
        "backup task failed"
    );
    RunFailure {
        task: scope.task,
        run_id: scope.run_id,
        stage,
        error,
        retained_workspace,
    }
}

/// Race a step against cancellation.
async fn guarded<T, E, F>(cancel: &CancellationToken, step: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, E>>,
    PipelineError: From<E>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = step => result.map_err(PipelineError::from),
    }
}

async fn release_workspace(workspace: Workspace, keep: bool, scope: &RunScope) -> Option<PathBuf> {
    if keep {
        let path = workspace.retain();
        info!(
            run_id = %scope.run_id,
            task = %scope.task,
            path = %path.display(),
            "workspace retained"
        );
        return Some(path);
    }

    let path = workspace.path().to_path_buf();
    match tokio::task::spawn_blocking(move || workspace.remove()).await {
        Ok(Ok(())) => debug!(
            run_id = %scope.run_id,
            task = %scope.task,
            path = %path.display(),
            "workspace removed"
        ),
        Ok(Err(e)) => warn!(
            run_id = %scope.run_id,
            task = %scope.task,
            path = %path.display(),
            error = %e,
            "failed to remove workspace"
        ),
        Err(e) => warn!(
            run_id = %scope.run_id,
            task = %scope.task,
            error = %e,
            "workspace cleanup task panicked"
        ),
    }
    None
}
