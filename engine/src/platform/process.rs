//! The [`CommandExecutor`] capability — subprocess execution with a
//! per-call timeout and safe handling of tools absent on the host.
//!
//! Grounded on the teacher's `discovery::get_changed_files`, which shells
//! out to `git` via `std::process::Command` and tolerates the tool being
//! unavailable by falling back rather than propagating an error.
//! Generalized here to arbitrary argv, any working directory, and an
//! enforced timeout with a kill-after-grace monitor.

use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use super::ExecContext;

/// Result of one subprocess invocation.
///
/// `error` is set only for start failures (tool not on `PATH`, permission
/// denied) and timeouts — a non-zero exit code is reported via
/// `exit_code` and is never itself an error, per spec §4.1.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

impl CommandOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none() && self.exit_code == Some(0)
    }

    fn start_failure(message: String) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            error: Some(message),
        }
    }

    fn timed_out() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            error: Some("canceled: checker-timeout".to_owned()),
        }
    }
}

/// Capability interface over subprocess execution (spec §4.1).
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, ctx: &ExecContext, argv: &[&str]) -> CommandOutcome;
    fn execute_in_dir(&self, ctx: &ExecContext, dir: &Path, argv: &[&str]) -> CommandOutcome;
}

/// Real subprocess executor. Safe to call with a tool absent on `PATH` —
/// that surfaces as a start failure in `error`, not a panic.
#[derive(Debug, Clone, Default)]
pub struct RealCommandExecutor;

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, ctx: &ExecContext, argv: &[&str]) -> CommandOutcome {
        run(ctx, None, argv)
    }

    fn execute_in_dir(&self, ctx: &ExecContext, dir: &Path, argv: &[&str]) -> CommandOutcome {
        run(ctx, Some(dir), argv)
    }
}

/// How long to wait after sending a kill signal before giving up on reaping
/// the child (spec §5: "send termination signal, then kill after a short
/// grace").
const KILL_GRACE: Duration = Duration::from_millis(200);

fn run(ctx: &ExecContext, dir: Option<&Path>, argv: &[&str]) -> CommandOutcome {
    let Some((program, args)) = argv.split_first() else {
        return CommandOutcome::start_failure("empty argv".to_owned());
    };

    if ctx.is_canceled() {
        return CommandOutcome::timed_out();
    }

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = dir {
        command.current_dir(dir);
    }

    let mut child: Child = match command.spawn() {
        Ok(c) => c,
        Err(e) => {
            return CommandOutcome::start_failure(format!("failed to start '{program}': {e}"));
        }
    };

    let deadline = Instant::now() + ctx.timeout;
    loop {
        if ctx.is_canceled() {
            let _ = child.kill();
            let _ = child.wait();
            return CommandOutcome::timed_out();
        }
        match child.try_wait() {
            Ok(Some(_status)) => break,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    std::thread::sleep(KILL_GRACE);
                    let _ = child.wait();
                    return CommandOutcome::timed_out();
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                return CommandOutcome::start_failure(format!("failed to poll child: {e}"));
            }
        }
    }

    match child.wait_with_output() {
        Ok(output) => CommandOutcome {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            error: None,
        },
        Err(e) => CommandOutcome::start_failure(format!("failed to collect output: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_missing_tool_is_start_failure_not_panic() {
        let ctx = ExecContext::new(Duration::from_secs(5));
        let executor = RealCommandExecutor;
        let outcome = executor.execute(&ctx, &["definitely-not-a-real-binary-xyz"]);
        assert!(outcome.error.is_some());
        assert!(outcome.exit_code.is_none());
    }

    #[test]
    fn execute_success_has_no_error() {
        let ctx = ExecContext::new(Duration::from_secs(5));
        let executor = RealCommandExecutor;
        let outcome = executor.execute(&ctx, &["true"]);
        assert!(outcome.success());
    }

    #[test]
    fn nonzero_exit_is_not_an_error() {
        let ctx = ExecContext::new(Duration::from_secs(5));
        let executor = RealCommandExecutor;
        let outcome = executor.execute(&ctx, &["false"]);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.exit_code, Some(1));
        assert!(!outcome.success());
    }

    #[test]
    fn timeout_kills_subprocess() {
        let ctx = ExecContext::new(Duration::from_millis(100));
        let executor = RealCommandExecutor;
        let outcome = executor.execute(&ctx, &["sleep", "5"]);
        assert!(outcome.error.is_some());
        assert!(outcome.error.unwrap().contains("checker-timeout"));
    }

    #[test]
    fn canceled_before_start_never_spawns() {
        let ctx = ExecContext::new(Duration::from_secs(5));
        ctx.canceled.store(true, std::sync::atomic::Ordering::Relaxed);
        let executor = RealCommandExecutor;
        let outcome = executor.execute(&ctx, &["true"]);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn execute_in_dir_uses_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let ctx = ExecContext::new(Duration::from_secs(5));
        let executor = RealCommandExecutor;
        let outcome = executor.execute_in_dir(&ctx, dir.path(), &["ls", "marker.txt"]);
        assert!(outcome.success());
        assert!(outcome.stdout.contains("marker.txt"));
    }
}
