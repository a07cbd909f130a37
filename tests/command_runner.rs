// tests/command_runner.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use tempfile::TempDir;

use cronbackup::exec::{run_commands, sanitize_line, ExecutionError, RunControl, TracingSink};
use cronbackup::pipeline::{RunId, RunScope};
use cronbackup_test_utils::{CapturingSink, LogCapture};

type TestResult = Result<(), Box<dyn Error>>;

fn script(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

#[tokio::test]
async fn echo_succeeds_and_logs_stdout() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();

        let status = run_commands(&script(&["echo hi"]), &sink, &RunControl::default()).await?;

        assert!(status.success());
        assert_eq!(sink.stdout(), vec!["hi".to_string()]);
        assert!(sink.stderr().is_empty());
        Ok(())
    })
    .await
}

#[tokio::test]
async fn non_zero_exit_is_an_execution_error() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();

        let err = run_commands(&script(&["exit 1"]), &sink, &RunControl::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Failed { .. }), "{err:?}");
        assert_eq!(err.exit_code(), Some(1));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn stderr_lines_are_kept_apart() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();

        run_commands(
            &script(&["echo out", "echo oops >&2"]),
            &sink,
            &RunControl::default(),
        )
        .await?;

        assert_eq!(sink.stdout(), vec!["out".to_string()]);
        assert_eq!(sink.stderr(), vec!["oops".to_string()]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn commands_share_one_shell_session() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();

        run_commands(
            &script(&["GREETING=hello", "cd /", "export GREETING", "echo \"$GREETING $(pwd)\""]),
            &sink,
            &RunControl::default(),
        )
        .await?;

        assert_eq!(sink.stdout(), vec!["hello /".to_string()]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn output_order_follows_command_order() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();

        run_commands(
            &script(&["echo one", "echo two", "printf 'three'"]),
            &sink,
            &RunControl::default(),
        )
        .await?;

        assert_eq!(sink.stdout(), vec!["one", "two", "three"]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn only_the_last_status_decides() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();

        // Same as any shell script without `set -e`.
        run_commands(&script(&["false", "echo after"]), &sink, &RunControl::default()).await?;
        assert_eq!(sink.stdout(), vec!["after".to_string()]);

        let err = run_commands(&script(&["set -e", "false", "echo never"]), &sink, &RunControl::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(1));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn deadline_kills_the_session() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();
        let control = RunControl::new(CancellationToken::new(), Some(Duration::from_millis(200)));

        let started = Instant::now();
        let err = run_commands(&script(&["sleep 10"]), &sink, &control)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::TimedOut(d) if d == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(3));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn cancellation_kills_the_session() -> TestResult {
    with_timeout(async {
        init_tracing();
        let sink = CapturingSink::new();
        let token = CancellationToken::new();
        let control = RunControl::new(token.clone(), None);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            token.cancel();
        });

        let started = Instant::now();
        let err = run_commands(&script(&["echo started", "sleep 10"]), &sink, &control)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Cancelled), "{err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));
        Ok(())
    })
    .await
}

#[tokio::test]
async fn deadline_stops_programs_the_script_started() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = TempDir::new()?;
        let late = dir.path().join("late.txt");
        let sink = CapturingSink::new();
        let control = RunControl::new(CancellationToken::new(), Some(Duration::from_millis(300)));

        let nested = format!("sh -c 'sleep 2; echo survived > {}'", late.display());
        let err = run_commands(&script(&["echo start", &nested, "echo end"]), &sink, &control)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::TimedOut(_)), "{err:?}");

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!late.exists(), "nested command kept running after the deadline");
        assert_eq!(sink.stdout(), vec!["start".to_string()]);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn cancellation_stops_background_jobs() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = TempDir::new()?;
        let late = dir.path().join("late.txt");
        let sink = CapturingSink::new();
        let token = CancellationToken::new();
        let control = RunControl::new(token.clone(), None);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });

        let background = format!("(sleep 1; echo survived > {}) &", late.display());
        let err = run_commands(&script(&[&background, "sleep 10"]), &sink, &control)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Cancelled), "{err:?}");

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!late.exists(), "background job kept running after cancellation");
        Ok(())
    })
    .await
}

#[tokio::test]
async fn tracing_sink_logs_script_output_with_run_fields() -> TestResult {
    let logs = LogCapture::new();
    let _guard = tracing::subscriber::set_default(logs.subscriber());

    let sink = TracingSink::new(RunScope::new("nightly", RunId::from("abcd1234")));
    run_commands(
        &script(&["echo hi", "echo oops >&2"]),
        &sink,
        &RunControl::default(),
    )
    .await?;

    let hi = logs
        .find(&["SCRIPT> hi"])
        .ok_or("no log line for stdout")?;
    assert!(hi.contains(" INFO "), "{hi}");
    assert!(hi.contains("run_id=abcd1234"), "{hi}");
    assert!(hi.contains("task=nightly"), "{hi}");

    let oops = logs
        .find(&["SCRIPT> oops"])
        .ok_or("no log line for stderr")?;
    assert!(oops.contains("ERROR"), "{oops}");
    assert!(oops.contains("run_id=abcd1234"), "{oops}");
    Ok(())
}

#[test]
fn lines_are_sanitized() {
    assert_eq!(sanitize_line(b"hello\n"), "hello");
    assert_eq!(sanitize_line(b"dos line\r\n"), "dos line");
    assert_eq!(sanitize_line(b"a\nb\n"), "a\\nb");
    assert_eq!(sanitize_line(b"no newline"), "no newline");
    assert!(sanitize_line(&[b'x', 0xff, b'\n']).contains('\u{FFFD}'));
}
