// src/engine/mod.rs

//! Scheduling engine.
//!
//! - [`cron`] parses cron expressions and computes fire times.
//! - [`slot`] is the pure per-job overlap decision.
//! - [`runtime`] is the async shell: one loop per job, one Tokio task per
//!   run, shutdown through a `CancellationToken`.

pub mod cron;
pub mod runtime;
pub mod slot;

pub use cron::CronSchedule;
pub use runtime::{OnceOutcome, Scheduler};
pub use slot::{Dispatch, JobSlot};
pub use crate::types::OverlapPolicy;
