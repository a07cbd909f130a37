// src/config/storage.rs

use std::fmt;

use crate::cli::CliArgs;
use crate::errors::{CronbackupError, Result};

/// Connection details for the S3-compatible storage backend.
#[derive(Clone)]
pub struct StorageSettings {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub create_if_missing: bool,
    pub secure: bool,
}

// Keeps the secret key out of logs.
impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("create_if_missing", &self.create_if_missing)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl StorageSettings {
    /// Collect the storage flags (or their env fallbacks) from the CLI.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        Ok(Self {
            endpoint: required(&args.s3_endpoint, "--s3-endpoint / STORAGE_S3_ENDPOINT")?,
            region: required(&args.s3_region, "--s3-region / STORAGE_S3_REGION")?,
            bucket: required(&args.s3_bucket, "--s3-bucket / STORAGE_S3_BUCKET")?,
            access_key: required(&args.s3_access_key, "--s3-access-key / STORAGE_S3_ACCESS_KEY")?,
            secret_key: required(&args.s3_secret_key, "--s3-secret-key / STORAGE_S3_SECRET_KEY")?,
            create_if_missing: args.s3_auto_create_bucket,
            secure: !args.s3_insecure,
        })
    }

    /// Endpoint as a full URL. A bare `host[:port]` gets `https://`
    /// (or `http://` when `secure` is false).
    pub fn endpoint_url(&self) -> String {
        let endpoint = self.endpoint.trim().trim_end_matches('/');
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if self.secure {
            format!("https://{endpoint}")
        } else {
            format!("http://{endpoint}")
        }
    }
}

fn required(value: &Option<String>, what: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CronbackupError::ConfigError(format!(
            "missing storage setting {what}"
        ))),
    }
}
