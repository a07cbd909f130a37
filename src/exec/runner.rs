// src/exec/runner.rs

//! Runs a job's commands as one shell session.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::sink::{sanitize_line, OutputSink, OutputStream};

/// Ways a shell session can stop a run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("spawning shell: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("waiting for shell: {0}")]
    Wait(#[source] std::io::Error),

    #[error("script exited with {status}")]
    Failed { status: ExitStatus },

    #[error("script did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("script cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Exit code of the shell, when it exited on its own with one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecutionError::Failed { status } => status.code(),
            _ => None,
        }
    }
}

/// Cancellation and deadline for one shell session.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    pub cancel: CancellationToken,
    pub deadline: Option<Duration>,
}

impl RunControl {
    pub fn new(cancel: CancellationToken, deadline: Option<Duration>) -> Self {
        Self { cancel, deadline }
    }
}

enum Finish {
    Exited(std::io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

/// Join `commands` with newlines and run them in a single `sh -c`
/// (`cmd /C` on Windows), so later commands see the shell state left by
/// earlier ones.
///
/// Every stdout/stderr line goes to `sink`. Returns the exit status when it
/// is zero. On deadline or cancellation the shell and everything it
/// started are terminated (see [`terminate`]).
pub async fn run_commands<K: OutputSink + ?Sized>(
    commands: &[String],
    sink: &K,
    control: &RunControl,
) -> Result<ExitStatus, ExecutionError> {
    let script = commands.join("\n");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&script);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&script);
        c
    };

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // The shell leads its own process group so a deadline or cancellation
    // reaches the programs it started, not just `sh`.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(ExecutionError::Spawn)?;
    // Taken now: `id()` is gone once the shell has been reaped, while its
    // children may still hold the group.
    let pid = child.id();
    debug!(pid, lines = commands.len(), "shell session spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let finish = {
        // Exit status only counts once both pipes are drained, so no
        // trailing output is lost.
        let session = async {
            let (status, _, _) = tokio::join!(
                child.wait(),
                pump(stdout, OutputStream::Stdout, sink),
                pump(stderr, OutputStream::Stderr, sink),
            );
            status
        };

        let deadline = async {
            match control.deadline {
                Some(limit) => {
                    tokio::time::sleep(limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            status = session => Finish::Exited(status),
            limit = deadline => Finish::TimedOut(limit),
            _ = control.cancel.cancelled() => Finish::Cancelled,
        }
    };

    match finish {
        Finish::Exited(status) => {
            let status = status.map_err(ExecutionError::Wait)?;
            if status.success() {
                Ok(status)
            } else {
                Err(ExecutionError::Failed { status })
            }
        }
        Finish::TimedOut(limit) => {
            terminate(&mut child, pid).await;
            Err(ExecutionError::TimedOut(limit))
        }
        Finish::Cancelled => {
            terminate(&mut child, pid).await;
            Err(ExecutionError::Cancelled)
        }
    }
}

/// How long the session gets between SIGTERM and SIGKILL.
pub const KILL_GRACE: Duration = Duration::from_millis(500);

/// SIGTERM the session's process group, SIGKILL it after [`KILL_GRACE`]
/// (or as soon as the shell is gone), then reap the shell.
#[cfg(unix)]
async fn terminate(child: &mut Child, pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        kill(child).await;
        return;
    };

    signal_group(pgid, libc::SIGTERM);
    if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
        debug!(pgid, "shell ignored SIGTERM");
    }
    // Grandchildren may outlive the shell; the group id stays reserved
    // while any of them is alive.
    signal_group(pgid, libc::SIGKILL);
    kill(child).await;
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child, _pid: Option<u32>) {
    kill(child).await;
}

#[cfg(unix)]
fn signal_group(pgid: libc::pid_t, signal: libc::c_int) {
    // SAFETY: killpg has no memory-safety preconditions.
    let rc = unsafe { libc::killpg(pgid, signal) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: the whole group already exited.
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, signal, error = %err, "failed to signal shell process group");
        }
    }
}

/// SIGKILL the shell unless it already exited, and reap it.
async fn kill(child: &mut Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.kill().await {
        warn!(error = %e, "failed to kill shell session");
    }
}

async fn pump<R, K>(reader: Option<R>, stream: OutputStream, sink: &K)
where
    R: AsyncRead + Unpin,
    K: OutputSink + ?Sized,
{
    let Some(reader) = reader else {
        return;
    };

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => sink.line(stream, &sanitize_line(&buf)),
            Err(e) => {
                debug!(?stream, error = %e, "stopped reading script output");
                break;
            }
        }
    }
}
