// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod storage;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, StorageSettings, load_and_validate};
use crate::engine::Scheduler;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::storage::{S3Store, ensure_bucket};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - jobs file loading
/// - storage client + bucket check
/// - the run pipeline
/// - the cron scheduler (or a single `--once` pass)
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)
        .with_context(|| format!("loading jobs file {}", args.config))?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    if let Some(name) = args.job.as_deref() {
        if cfg.job(name).is_none() {
            bail!("unknown job '{name}'");
        }
    }

    let settings = StorageSettings::from_args(&args)?;
    debug!(?settings, "storage settings");

    let store = Arc::new(S3Store::new(&settings));
    ensure_bucket(
        store.as_ref(),
        &settings.bucket,
        &settings.region,
        settings.create_if_missing,
    )
    .await
    .context("checking destination bucket")?;

    let options = PipelineOptions::from_config(&cfg.config, settings.bucket.clone());
    let pipeline = Arc::new(Pipeline::new(store, options));
    let scheduler = Scheduler::new(pipeline, cfg.jobs.clone(), cfg.config.overlap);

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone());

    if args.once {
        let outcomes = scheduler.run_once(args.job.as_deref(), shutdown).await;
        let failed: Vec<_> = outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_err())
            .map(|(name, _)| name.as_str())
            .collect();
        if !failed.is_empty() {
            bail!(
                "{} of {} jobs failed: {}",
                failed.len(),
                outcomes.len(),
                failed.join(", ")
            );
        }
        return Ok(());
    }

    scheduler.run(shutdown).await;
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C, or SIGTERM on unix.
fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_termination().await;
        info!("scheduler is stopping");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM; only Ctrl+C will stop the scheduler");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
                term.recv().await;
            }
        }
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Simple dry-run output: print jobs, scripts and next fire times.
fn print_dry_run(cfg: &ConfigFile) {
    let now = Utc::now();

    println!("cronbackup dry-run");
    println!("  config.overlap = {:?}", cfg.config.overlap);
    println!("  config.keep_workspace = {:?}", cfg.config.keep_workspace);
    println!(
        "  config.temp_root = {}",
        cfg.config.effective_temp_root().display()
    );
    println!();

    println!("jobs ({}):", cfg.jobs.len());
    for job in cfg.jobs.iter() {
        println!("  - {}", job.name);
        println!("      schedule: {}", job.schedule);
        match job.schedule.next_after(now) {
            Some(next) => println!("      next fire: {}", next.to_rfc3339()),
            None => println!("      next fire: never"),
        }
        for line in job.commands.iter() {
            println!("      script: {line}");
        }
        println!("      upload: {}", job.artifact_path);
        if let Some(timeout) = job.timeout {
            println!("      timeout: {timeout:?}");
        }
        if let Some(keep) = job.keep_workspace {
            println!("      keep_workspace: {keep:?}");
        }
    }

    debug!("dry-run complete (no execution)");
}
