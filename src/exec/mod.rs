// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] runs a job's expanded commands in one shell session with
//!   cancellation and an optional deadline.
//! - [`sink`] defines where the session's output lines go; production code
//!   logs them through `tracing`.

pub mod runner;
pub mod sink;

pub use runner::{run_commands, ExecutionError, RunControl};
pub use sink::{sanitize_line, OutputSink, OutputStream, TracingSink, SCRIPT_PREFIX};
