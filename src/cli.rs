// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every storage flag can also come from the environment, which is how the
//! tool is usually configured inside a container.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cronbackup`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cronbackup",
    version,
    about = "Run shell scripts on a cron schedule and upload what they produce to S3.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the jobs file (TOML, or YAML for `.yaml`/`.yml`).
    #[arg(long, env = "CONFIG_PATH", value_name = "PATH")]
    pub config: String,

    /// S3 endpoint, either `host[:port]` or a full URL.
    #[arg(long, env = "STORAGE_S3_ENDPOINT", value_name = "URL")]
    pub s3_endpoint: Option<String>,

    #[arg(long, env = "STORAGE_S3_REGION", value_name = "REGION")]
    pub s3_region: Option<String>,

    #[arg(long, env = "STORAGE_S3_BUCKET", value_name = "BUCKET")]
    pub s3_bucket: Option<String>,

    #[arg(long, env = "STORAGE_S3_ACCESS_KEY", value_name = "KEY", hide_env_values = true)]
    pub s3_access_key: Option<String>,

    #[arg(long, env = "STORAGE_S3_SECRET_KEY", value_name = "KEY", hide_env_values = true)]
    pub s3_secret_key: Option<String>,

    /// Create the bucket at startup if it does not exist.
    #[arg(long, env = "STORAGE_S3_AUTO_CREATE_BUCKET")]
    pub s3_auto_create_bucket: bool,

    /// Use plain HTTP when the endpoint has no scheme.
    #[arg(long, env = "STORAGE_S3_INSECURE")]
    pub s3_insecure: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CRONBACKUP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print jobs and their next fire times, run nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Run jobs once right now instead of waiting for their schedules.
    #[arg(long)]
    pub once: bool,

    /// With `--once`, only run this job.
    #[arg(long, value_name = "NAME", requires = "once")]
    pub job: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
