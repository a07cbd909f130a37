// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Run-scoped pipeline failures live in [`crate::pipeline::PipelineError`];
//! this type covers the jobs file and the storage settings.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CronbackupError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CronbackupError>;
