// src/exec/sink.rs

//! Where script output lines go.

use tracing::{error, info};

use crate::pipeline::RunScope;

/// Prefix that marks a log record as script output rather than
/// orchestration narration.
pub const SCRIPT_PREFIX: &str = "SCRIPT> ";

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives every line the shell session prints.
///
/// Production code uses [`TracingSink`]; tests can collect lines instead.
pub trait OutputSink: Send + Sync {
    fn line(&self, stream: OutputStream, line: &str);
}

/// Logs stdout lines at `info` and stderr lines at `error`, tagged with the
/// run's `run_id` and `task`.
#[derive(Debug, Clone)]
pub struct TracingSink {
    scope: RunScope,
}

impl TracingSink {
    pub fn new(scope: RunScope) -> Self {
        Self { scope }
    }
}

impl OutputSink for TracingSink {
    fn line(&self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => info!(
                run_id = %self.scope.run_id,
                task = %self.scope.task,
                "{SCRIPT_PREFIX}{line}"
            ),
            OutputStream::Stderr => error!(
                run_id = %self.scope.run_id,
                task = %self.scope.task,
                "{SCRIPT_PREFIX}{line}"
            ),
        }
    }
}

/// Turn raw bytes read from a pipe into one log-safe line.
///
/// Trailing `\n` (and a `\r` before it) are dropped, any remaining newline
/// becomes the two characters `\n`, and invalid UTF-8 is replaced.
pub fn sanitize_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_end_matches('\n');
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    trimmed.replace('\n', "\\n")
}
