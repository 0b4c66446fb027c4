use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::app::config::DEFAULT_COMMAND_TIMEOUT_SECS;
use crate::app::error::AppError;
use crate::app::models::{Category, ExitStatus, InvocationOutcome, InvocationRecord};
use crate::app::objection::catalog::Invocation;
use crate::app::process::{format_command_line, Executor, SystemExecutor};
use crate::app::session::Session;
use crate::app::target::Target;

const RUN_VERB: &str = "run";

/// `[-S <device>] -g <package|pid> run <logical command>`
///
/// The logical command stays a single argument: no local shell and no local
/// globbing, so patterns such as `*.key` reach the tool untouched.
pub fn build_objection_args(target: &Target, logical_command: &str) -> Vec<String> {
    let mut args = Vec::with_capacity(6);
    if let Some(device) = &target.device_id {
        args.push("-S".to_string());
        args.push(device.clone());
    }
    args.push("-g".to_string());
    args.push(target.gadget());
    args.push(RUN_VERB.to_string());
    args.push(logical_command.to_string());
    args
}

/// Runs one instrumentation command per call and records it in the session.
pub struct CommandRunner<E: Executor = SystemExecutor> {
    program: String,
    session: Session,
    timeout: Duration,
    executor: E,
}

impl CommandRunner<SystemExecutor> {
    pub fn new(program: impl Into<String>, session: Session) -> Self {
        Self::with_executor(program, session, SystemExecutor)
    }
}

impl<E: Executor> CommandRunner<E> {
    pub fn with_executor(program: impl Into<String>, session: Session, executor: E) -> Self {
        Self {
            program: program.into(),
            session,
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            executor,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn composed_command(&self, logical_command: &str) -> String {
        format_command_line(
            &self.program,
            &build_objection_args(self.session.target(), logical_command),
        )
    }

    pub fn run(&self, invocation: &Invocation) -> InvocationOutcome {
        self.execute(
            &invocation.command,
            invocation.category,
            &invocation.test_name,
            &invocation.description,
        )
    }

    /// Single attempt. Every call, whatever the outcome, leaves one report behind.
    pub fn execute(
        &self,
        logical_command: &str,
        category: Category,
        test_name: &str,
        description: &str,
    ) -> InvocationOutcome {
        let trace_id = Uuid::new_v4().to_string();
        let started_at = Local::now();
        let args = build_objection_args(self.session.target(), logical_command);
        let full_command = format_command_line(&self.program, &args);

        info!(
            trace_id = %trace_id,
            test = %test_name,
            category = %category,
            command = %full_command,
            "Executing"
        );

        let (stdout, stderr, status) =
            match self
                .executor
                .execute(&self.program, &args, self.timeout, &trace_id)
            {
                Ok(output) => {
                    let status = match output.exit_code {
                        Some(code) => ExitStatus::Exited { code },
                        None => ExitStatus::Signaled,
                    };
                    (output.stdout, output.stderr, status)
                }
                Err(err) if err.is_timeout() => {
                    warn!(trace_id = %trace_id, test = %test_name, "Command timed out");
                    (
                        String::new(),
                        format!("Command timed out after {} seconds", self.timeout.as_secs()),
                        ExitStatus::TimedOut,
                    )
                }
                Err(err) => {
                    warn!(trace_id = %trace_id, test = %test_name, error = %err, "Command fault");
                    let message = format!("Error executing command: {}", err.error);
                    (
                        String::new(),
                        message.clone(),
                        ExitStatus::Fault { message },
                    )
                }
            };

        let record = InvocationRecord {
            test_name: test_name.to_string(),
            category,
            description: description.to_string(),
            command: logical_command.to_string(),
            full_command,
            started_at,
            stdout,
            stderr,
            status,
        };
        self.finish(record, trace_id)
    }

    fn finish(&self, record: InvocationRecord, trace_id: String) -> InvocationOutcome {
        let (output_file, report_error): (PathBuf, Option<AppError>) =
            match self.session.persist(&record, &trace_id) {
                Ok(path) => (path, None),
                Err(err) => {
                    error!(trace_id = %trace_id, error = %err, "Report write failed");
                    (self.session.report_path(&record), Some(err))
                }
            };

        info!(
            trace_id = %trace_id,
            test = %record.test_name,
            exit_code = record.return_code(),
            success = record.success(),
            "Finished"
        );

        InvocationOutcome {
            success: record.success(),
            output_file,
            return_code: record.return_code(),
            stdout: record.stdout,
            stderr: record.stderr,
            trace_id,
            report_error,
        }
    }
}
