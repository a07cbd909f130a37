// src/engine/cron.rs

//! Cron expressions.
//!
//! Standard crontab syntax (day-of-week 0-6, Sunday = 0 or 7) with an
//! optional leading seconds field, so both `"0 3 * * *"` and
//! `"*/10 * * * * *"` are accepted. Fire times are computed in UTC.

use std::fmt;

use chrono::{DateTime, Utc};
use croner::Cron;

/// A parsed, validated cron schedule.
#[derive(Clone)]
pub struct CronSchedule {
    source: String,
    cron: Cron,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, String> {
        let trimmed = expr.trim();
        let fields = trimmed.split_whitespace().count();
        if !(5..=6).contains(&fields) {
            return Err(format!("expected 5 or 6 fields, found {fields}"));
        }

        let cron = Cron::new(trimmed)
            .with_seconds_optional()
            .parse()
            .map_err(|e| e.to_string())?;

        Ok(Self {
            source: trimmed.to_string(),
            cron,
        })
    }

    /// The expression as the operator wrote it.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// First fire time strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.cron.find_next_occurrence(&now, false).ok()
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CronSchedule").field(&self.source).finish()
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
