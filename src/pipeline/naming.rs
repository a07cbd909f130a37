// src/pipeline/naming.rs

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::pipeline::id::RunId;

/// `strftime` format of the timestamp part: 14 digits, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Destination object name: `<timestamp>-<task>-<run_id><ext>`.
///
/// `<ext>` is the source file's extension with its dot, or empty. Two runs
/// in the same second differ by run id.
pub fn artifact_name(
    task_name: &str,
    run_id: &RunId,
    source: &Path,
    started_at: DateTime<Utc>,
) -> String {
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!(
        "{}-{}-{}{}",
        started_at.format(TIMESTAMP_FORMAT),
        task_name,
        run_id,
        ext
    )
}
