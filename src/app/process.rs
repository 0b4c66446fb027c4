use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::app::error::AppError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Signature shared by the real executor and the stand-ins used in tests.
pub trait Executor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError>;
}

impl<F> Executor for F
where
    F: Fn(&str, &[String], Duration, &str) -> Result<CommandOutput, AppError>,
{
    fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        self(program, args, timeout, trace_id)
    }
}

/// Runs real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        run_command_with_timeout(program, args, timeout, trace_id)
    }
}

pub fn format_command_line(program: &str, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.to_string());
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

/// Pipe reader running on its own thread. Bytes land in `buffer` as they arrive so a
/// reader that never sees EOF still yields what it has read.
struct Drain {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: Receiver<()>,
}

impl Drain {
    fn spawn<R: Read + Send + 'static>(mut reader: R) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let (tx, done) = mpsc::channel();
        let sink = Arc::clone(&buffer);
        std::thread::spawn(move || {
            let mut temp = [0u8; 4096];
            loop {
                match reader.read(&mut temp) {
                    Ok(0) => break,
                    Ok(count) => match sink.lock() {
                        Ok(mut guard) => guard.extend_from_slice(&temp[..count]),
                        Err(poisoned) => poisoned.into_inner().extend_from_slice(&temp[..count]),
                    },
                    Err(_) => break,
                }
            }
            let _ = tx.send(());
        });
        Drain { buffer, done }
    }

    /// Waits for EOF until `deadline`, then takes whatever was read. A reader still
    /// blocked past the deadline is left detached.
    fn collect(self, deadline: Instant) -> Vec<u8> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let _ = self.done.recv_timeout(remaining);
        match self.buffer.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

pub fn run_command_with_timeout(
    program: &str,
    args: &[String],
    timeout: Duration,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    debug!(trace_id = %trace_id, command = %format_command_line(program, args), "Spawning child");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            let message = format!("Failed to spawn {program}: {err}");
            if err.kind() == ErrorKind::NotFound {
                AppError::dependency(message, trace_id)
            } else {
                AppError::system(message, trace_id)
            }
        })?;

    // Drain both pipes while polling; a full pipe buffer would otherwise stall the child
    // until the bound expires.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stdout", trace_id))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stderr", trace_id))?;
    let stdout_drain = Drain::spawn(stdout);
    let stderr_drain = Drain::spawn(stderr);

    let start = Instant::now();
    let deadline = start + timeout;
    let exit_code = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status.code(),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    // Readers are left detached: a grandchild may still hold the pipes open.
                    drop(stdout_drain);
                    drop(stderr_drain);
                    return Err(AppError::timeout(
                        format!("Command timed out after {} seconds", timeout.as_secs()),
                        trace_id,
                    ));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AppError::system(
                    format!("Failed to poll command: {err}"),
                    trace_id,
                ));
            }
        }
    };

    // The direct child is gone, but a background descendant can keep the pipes open.
    // Readers only get what is left of the bound.
    let stdout_bytes = stdout_drain.collect(deadline);
    let stderr_bytes = stderr_drain.collect(deadline);

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn run_command_with_timeout_does_not_deadlock_on_large_stdout() {
        // A child writing more than the pipe buffer must still finish well inside the bound.
        let args = sh("i=0; while [ $i -lt 100000 ]; do echo 1234567890; i=$((i+1)); done");
        let output = run_command_with_timeout("sh", &args, Duration::from_secs(10), "trace-large")
            .expect("expected large-output command to complete without timing out");

        assert_eq!(output.exit_code, Some(0));
        assert!(output.stdout.len() >= 1_000_000, "got {}", output.stdout.len());
    }

    #[test]
    fn captures_both_streams_and_exit_code() {
        let args = sh("printf 'out line'; printf 'err line' 1>&2; exit 3");
        let output = run_command_with_timeout("sh", &args, Duration::from_secs(10), "trace-streams")
            .expect("command should run");

        assert_eq!(output.stdout, "out line");
        assert_eq!(output.stderr, "err line");
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.succeeded());
    }

    #[test]
    fn kills_child_after_bound() {
        let start = Instant::now();
        let err = run_command_with_timeout(
            "sh",
            &sh("exec sleep 30"),
            Duration::from_secs(1),
            "trace-slow",
        )
        .expect_err("expected timeout");

        assert!(err.is_timeout());
        assert!(err.error.contains("timed out after 1 seconds"));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn bound_holds_when_background_descendant_keeps_pipes_open() {
        let start = Instant::now();
        let output = run_command_with_timeout(
            "sh",
            &sh("sleep 8 & echo started; exit 0"),
            Duration::from_secs(2),
            "trace-descendant",
        )
        .expect("direct child exited cleanly");

        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_secs(5), "bound exceeded: {elapsed:?}");
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout.trim(), "started");
    }

    #[test]
    fn missing_program_is_a_dependency_error() {
        let err = run_command_with_timeout(
            "/this/path/should/not/exist/objection",
            &[],
            Duration::from_secs(1),
            "trace-missing",
        )
        .expect_err("expected spawn failure");

        assert_eq!(err.code, crate::app::error::ERR_DEPENDENCY);
        assert!(err.error.starts_with("Failed to spawn"));
    }

    #[test]
    fn format_command_line_joins_with_spaces() {
        let args = vec!["-g".to_string(), "com.example.app".to_string()];
        assert_eq!(format_command_line("objection", &args), "objection -g com.example.app");
    }
}
