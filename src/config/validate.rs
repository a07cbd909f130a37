// src/config/validate.rs

use std::collections::HashSet;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, JobConfig, RawConfigFile, TaskDefinition};
use crate::engine::cron::CronSchedule;
use crate::errors::{CronbackupError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CronbackupError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let jobs = validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, jobs))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<Vec<TaskDefinition>> {
    ensure_has_jobs(cfg)?;
    ensure_unique_names(cfg)?;
    cfg.jobs.iter().map(validate_job).collect()
}

fn ensure_has_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.jobs.is_empty() {
        return Err(CronbackupError::ConfigError(
            "config must contain at least one [[jobs]] entry".to_string(),
        ));
    }
    Ok(())
}

fn ensure_unique_names(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for job in cfg.jobs.iter() {
        if !seen.insert(job.name.as_str()) {
            return Err(CronbackupError::ConfigError(format!(
                "job name '{}' is used more than once",
                job.name
            )));
        }
    }
    Ok(())
}

fn validate_job(job: &JobConfig) -> Result<TaskDefinition> {
    if job.name.trim().is_empty() {
        return Err(CronbackupError::ConfigError(
            "every job needs a non-empty `name`".to_string(),
        ));
    }

    let schedule = CronSchedule::parse(&job.schedule).map_err(|e| {
        CronbackupError::ConfigError(format!(
            "job '{}' has an invalid schedule '{}': {}",
            job.name, job.schedule, e
        ))
    })?;

    if job.script.is_empty() {
        return Err(CronbackupError::ConfigError(format!(
            "job '{}' has an empty `script`",
            job.name
        )));
    }

    if job.filepath_to_upload.trim().is_empty() {
        return Err(CronbackupError::ConfigError(format!(
            "job '{}' has an empty `filepath_to_upload`",
            job.name
        )));
    }

    let timeout = match job.timeout.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = parse_duration(raw).map_err(|e| {
                CronbackupError::ConfigError(format!(
                    "job '{}' has an invalid timeout: {}",
                    job.name, e
                ))
            })?;
            if parsed.is_zero() {
                return Err(CronbackupError::ConfigError(format!(
                    "job '{}' has a zero timeout",
                    job.name
                )));
            }
            Some(parsed)
        }
    };

    Ok(TaskDefinition {
        name: job.name.clone(),
        schedule,
        commands: job.script.clone(),
        artifact_path: job.filepath_to_upload.clone(),
        timeout,
        keep_workspace: job.keep_workspace,
    })
}
