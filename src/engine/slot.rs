// src/engine/slot.rs

//! Pure per-job overlap bookkeeping.
//!
//! The async scheduler owns one `JobSlot` per job and asks it what to do
//! each time the job's schedule fires. No Tokio types live here so the
//! decision table can be tested directly.

use crate::types::OverlapPolicy;

/// What the scheduler should do with a fired trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Start a new run.
    Start,
    /// Drop the trigger; `active` runs of this job are still going.
    Skip { active: usize },
}

#[derive(Debug, Clone)]
pub struct JobSlot {
    policy: OverlapPolicy,
    active: usize,
    skipped: u64,
}

impl JobSlot {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            active: 0,
            skipped: 0,
        }
    }

    /// Decide what to do with a trigger. `Start` counts the run as active
    /// until [`JobSlot::finish`] is called for it.
    pub fn on_trigger(&mut self) -> Dispatch {
        match self.policy {
            OverlapPolicy::Skip if self.active > 0 => {
                self.skipped += 1;
                Dispatch::Skip {
                    active: self.active,
                }
            }
            _ => {
                self.active += 1;
                Dispatch::Start
            }
        }
    }

    /// Record that one previously started run has ended.
    pub fn finish(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Triggers dropped so far because of overlap.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
