// src/pipeline/workspace.rs

//! Run-exclusive temporary directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use crate::pipeline::id::RunId;

#[derive(Debug, Error)]
#[error("creating workspace under {root:?}: {source}")]
pub struct WorkspaceError {
    pub root: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Temporary directory owned by exactly one run.
///
/// Dropping the workspace removes the directory and everything in it.
/// [`Workspace::retain`] opts out of that and hands back the path.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create `backup-<task>-<run_id>-<suffix>` under `temp_root`.
    ///
    /// The random suffix keeps overlapping runs apart even if a run id were
    /// ever reused.
    pub fn provision(
        temp_root: &Path,
        task_name: &str,
        run_id: &RunId,
    ) -> Result<Self, WorkspaceError> {
        let prefix = format!("backup-{}-{}-", sanitize_component(task_name), run_id);
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir_in(temp_root)
            .map_err(|source| WorkspaceError {
                root: temp_root.to_path_buf(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Keep the directory on disk after the run.
    pub fn retain(self) -> PathBuf {
        self.dir.keep()
    }

    /// Remove the directory now, reporting any IO error.
    pub fn remove(self) -> std::io::Result<()> {
        self.dir.close()
    }
}

/// Task names end up in a directory name; anything outside
/// `[A-Za-z0-9_-]` becomes `_`.
pub fn sanitize_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
