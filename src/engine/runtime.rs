// src/engine/runtime.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::TaskDefinition;
use crate::pipeline::{Pipeline, RunFailure, RunReport};
use crate::storage::ObjectStore;
use crate::types::OverlapPolicy;

use super::slot::{Dispatch, JobSlot};

/// Result of one job run triggered by [`Scheduler::run_once`].
pub type OnceOutcome = (String, Result<RunReport, RunFailure>);

/// Async shell that fires jobs on their cron schedules.
///
/// Every job gets its own loop, so a slow job never delays another job's
/// triggers. Each run is its own Tokio task with a child of the shutdown
/// token.
pub struct Scheduler<S: ObjectStore> {
    pipeline: Arc<Pipeline<S>>,
    jobs: Vec<Arc<TaskDefinition>>,
    overlap: OverlapPolicy,
}

impl<S: ObjectStore> Scheduler<S> {
    pub fn new(
        pipeline: Arc<Pipeline<S>>,
        jobs: Vec<Arc<TaskDefinition>>,
        overlap: OverlapPolicy,
    ) -> Self {
        Self {
            pipeline,
            jobs,
            overlap,
        }
    }

    /// Fire jobs until `shutdown` is cancelled, then wait for in-flight
    /// runs to finish their cleanup.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(jobs = self.jobs.len(), overlap = ?self.overlap, "scheduler has started");

        let mut loops = JoinSet::new();
        for job in self.jobs {
            loops.spawn(job_loop(
                Arc::clone(&self.pipeline),
                job,
                self.overlap,
                shutdown.clone(),
            ));
        }

        while let Some(res) = loops.join_next().await {
            if let Err(e) = res {
                error!(error = %e, "job loop terminated abnormally");
            }
        }

        info!("scheduler stopped");
    }

    /// Run the selected jobs (all when `only` is `None`) once, right now,
    /// concurrently, and wait for every outcome.
    pub async fn run_once(
        &self,
        only: Option<&str>,
        shutdown: CancellationToken,
    ) -> Vec<OnceOutcome> {
        let mut runs = JoinSet::new();
        for job in self.jobs.iter().filter(|j| only.is_none_or(|name| j.name == name)) {
            let pipeline = Arc::clone(&self.pipeline);
            let job = Arc::clone(job);
            let token = shutdown.child_token();
            runs.spawn(async move {
                let outcome = pipeline.run(&job, token).await;
                (job.name.clone(), outcome)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(res) = runs.join_next().await {
            match res {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "run task panicked"),
            }
        }
        outcomes
    }
}

async fn job_loop<S: ObjectStore>(
    pipeline: Arc<Pipeline<S>>,
    job: Arc<TaskDefinition>,
    policy: OverlapPolicy,
    shutdown: CancellationToken,
) {
    info!(task = %job.name, schedule = %job.schedule, "preparing to execute backup task");

    let mut slot = JobSlot::new(policy);
    let mut runs: JoinSet<()> = JoinSet::new();
    let mut last_fired: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let from = last_fired.map_or(now, |fired| fired.max(now));
        let Some(next) = job.schedule.next_after(from) else {
            warn!(task = %job.name, "schedule has no upcoming fire times; job loop ends");
            break;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        debug!(task = %job.name, next_fire = %next, "waiting for next fire time");

        tokio::select! {
            _ = shutdown.cancelled() => break,
            Some(res) = runs.join_next() => {
                reap(&mut slot, &job, res);
                continue;
            }
            _ = tokio::time::sleep(wait) => {}
        }

        last_fired = Some(next);
        while let Some(res) = runs.try_join_next() {
            reap(&mut slot, &job, res);
        }

        match slot.on_trigger() {
            Dispatch::Start => {
                let pipeline = Arc::clone(&pipeline);
                let job = Arc::clone(&job);
                let token = shutdown.child_token();
                runs.spawn(async move { pipeline.run_logged(&job, token).await });
            }
            Dispatch::Skip { active } => warn!(
                task = %job.name,
                active,
                skipped_total = slot.skipped(),
                "previous run still active; skipping this trigger"
            ),
        }
    }

    if slot.active() > 0 {
        info!(task = %job.name, active = slot.active(), "waiting for in-flight runs");
    }
    while let Some(res) = runs.join_next().await {
        reap(&mut slot, &job, res);
    }
}

fn reap(slot: &mut JobSlot, job: &TaskDefinition, res: Result<(), JoinError>) {
    slot.finish();
    if let Err(e) = res {
        error!(task = %job.name, error = %e, "run task panicked");
    }
}
