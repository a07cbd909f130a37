// src/pipeline/validate.rs

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
#[error("artifact {path:?} is missing or inaccessible: {source}")]
pub struct ValidationError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Succeeds iff something (file or directory) exists at `path`.
///
/// Only existence is checked; size and content are not.
pub async fn validate_artifact(path: &Path) -> Result<(), ValidationError> {
    tokio::fs::metadata(path)
        .await
        .map(|_| ())
        .map_err(|source| ValidationError {
            path: path.to_path_buf(),
            source,
        })
}
