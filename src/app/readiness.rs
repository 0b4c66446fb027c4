use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::app::adb::adb_args;
use crate::app::adb::parse::{contains_process, online_serials, parse_pidof, ps_lists_pid};
use crate::app::config::DEFAULT_READINESS_TIMEOUT_SECS;
use crate::app::models::CheckResult;
use crate::app::presentation::Palette;
use crate::app::process::{CommandOutput, Executor, SystemExecutor};
use crate::app::target::{Target, TargetId};

const FRIDA_SERVER: &str = "frida-server";

/// Liveness probes run before a testing pass. None of them are recorded as reports,
/// and none of them raise: every fault folds into a failed [`CheckResult`].
pub struct Readiness<E: Executor = SystemExecutor> {
    objection_program: String,
    adb_program: String,
    target: Option<TargetId>,
    device_id: Option<String>,
    timeout: Duration,
    executor: E,
}

impl Readiness<SystemExecutor> {
    pub fn new(objection_program: impl Into<String>, adb_program: impl Into<String>) -> Self {
        Self::with_executor(objection_program, adb_program, SystemExecutor)
    }
}

impl<E: Executor> Readiness<E> {
    pub fn with_executor(
        objection_program: impl Into<String>,
        adb_program: impl Into<String>,
        executor: E,
    ) -> Self {
        Self {
            objection_program: objection_program.into(),
            adb_program: adb_program.into(),
            target: None,
            device_id: None,
            timeout: Duration::from_secs(DEFAULT_READINESS_TIMEOUT_SECS),
            executor,
        }
    }

    pub fn with_target(mut self, target: &Target) -> Self {
        self.target = Some(target.id.clone());
        self.device_id = target.device_id.clone();
        self
    }

    pub fn with_device(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id.filter(|value| !value.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn adb(&self, rest: &[&str], trace_id: &str) -> Result<CommandOutput, String> {
        let args = adb_args(self.device_id.as_deref(), rest);
        self.executor
            .execute(&self.adb_program, &args, self.timeout, trace_id)
            .map_err(|err| err.error)
    }

    pub fn check_objection_available(&self, trace_id: &str) -> CheckResult {
        let args = vec!["version".to_string()];
        let result = match self
            .executor
            .execute(&self.objection_program, &args, self.timeout, trace_id)
        {
            Ok(output) if output.succeeded() => {
                CheckResult::pass("Objection is installed and available")
            }
            Ok(_) => CheckResult::fail("Objection not found or not working"),
            Err(err) => CheckResult::fail(format!("Error checking Objection: {}", err.error)),
        };
        log_check(trace_id, "objection", &result);
        result
    }

    pub fn check_device_connection(&self, trace_id: &str) -> CheckResult {
        // Enumeration is never scoped to one device: a missing serial must be reported.
        let args = vec!["devices".to_string()];
        let result = match self
            .executor
            .execute(&self.adb_program, &args, self.timeout, trace_id)
        {
            Ok(output) if output.succeeded() => self.judge_devices(&online_serials(&output.stdout)),
            Ok(_) => CheckResult::fail("ADB not working or no devices connected"),
            Err(err) => {
                CheckResult::fail(format!("Error checking device connection: {}", err.error))
            }
        };
        log_check(trace_id, "device", &result);
        result
    }

    fn judge_devices(&self, devices: &[String]) -> CheckResult {
        if devices.is_empty() {
            return CheckResult::fail("No Android devices connected");
        }
        let listed = devices.join(", ");
        match &self.device_id {
            Some(wanted) if !devices.iter().any(|serial| serial == wanted) => CheckResult::fail(
                format!("Specified device {wanted} not found. Available devices: {listed}"),
            ),
            _ => CheckResult::pass(format!("Device connection OK. Available devices: {listed}")),
        }
    }

    pub fn check_frida_server(&self, trace_id: &str) -> CheckResult {
        let result = match self.adb(&["shell", "ps | grep frida-server"], trace_id) {
            Ok(output) if output.succeeded() && contains_process(&output.stdout, FRIDA_SERVER) => {
                CheckResult::pass("Frida server is running on device")
            }
            Ok(_) => CheckResult::fail(
                "Frida server is not running on device. Please start Frida server first.",
            ),
            Err(message) => CheckResult::fail(format!("Error checking Frida server: {message}")),
        };
        log_check(trace_id, "frida_server", &result);
        result
    }

    /// Absence of the process is a normal negative answer.
    pub fn verify_target_running(&self, trace_id: &str) -> CheckResult {
        let result = match &self.target {
            None => CheckResult::fail("No target package or PID specified"),
            Some(TargetId::Package(name)) => {
                match self.adb(&["shell", "pidof", name.as_str()], trace_id) {
                    Ok(output) => {
                        let pids = parse_pidof(&output.stdout);
                        if output.succeeded() && !pids.is_empty() {
                            let listed: Vec<String> = pids.iter().map(u32::to_string).collect();
                            CheckResult::pass(format!(
                                "Package {name} is running (PID: {})",
                                listed.join(" ")
                            ))
                        } else {
                            CheckResult::fail(format!("Package {name} is not running"))
                        }
                    }
                    Err(message) => CheckResult::fail(format!("Error verifying target: {message}")),
                }
            }
            Some(TargetId::ProcessId(pid)) => {
                let pid_arg = pid.to_string();
                match self.adb(&["shell", "ps", "-p", pid_arg.as_str()], trace_id) {
                    Ok(output) if output.succeeded() && ps_lists_pid(&output.stdout, *pid) => {
                        CheckResult::pass(format!("Process {pid} is running"))
                    }
                    Ok(_) => CheckResult::fail(format!("Process {pid} is not running")),
                    Err(message) => CheckResult::fail(format!("Error verifying target: {message}")),
                }
            }
        };
        log_check(trace_id, "target", &result);
        result
    }

    pub fn diagnose(&self, output_dir: &Path, trace_id: &str) -> Diagnostics {
        info!(trace_id = %trace_id, "Running readiness diagnostics");
        let objection = self.check_objection_available(trace_id);
        let device = self.check_device_connection(trace_id);
        let frida = self.check_frida_server(trace_id);
        let target = if self.target.is_some() {
            self.verify_target_running(trace_id)
        } else {
            CheckResult::fail("No target specified (package name or PID)")
        };
        Diagnostics::new(vec![
            DiagnosticCheck::new(CheckKind::Objection, objection),
            DiagnosticCheck::new(CheckKind::Device, device),
            DiagnosticCheck::new(CheckKind::FridaServer, frida),
            DiagnosticCheck::new(CheckKind::Target, target),
            DiagnosticCheck::new(CheckKind::OutputDir, check_output_dir(output_dir)),
        ])
    }
}

fn log_check(trace_id: &str, check: &str, result: &CheckResult) {
    if result.ok {
        info!(trace_id = %trace_id, check, message = %result.message, "Readiness check passed");
    } else {
        warn!(trace_id = %trace_id, check, message = %result.message, "Readiness check failed");
    }
}

/// A missing directory is fine, it is created on session start. Only a non-directory
/// squatting on the path fails.
pub fn check_output_dir(path: &Path) -> CheckResult {
    if path.is_dir() {
        CheckResult::pass(format!("Output directory ready: {}", path.display()))
    } else if path.exists() {
        CheckResult::fail(format!(
            "Output directory error: {} exists and is not a directory",
            path.display()
        ))
    } else {
        CheckResult::pass(format!("Output directory will be created: {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Objection,
    Device,
    FridaServer,
    Target,
    OutputDir,
}

impl CheckKind {
    pub fn title(self) -> &'static str {
        match self {
            CheckKind::Objection => "Checking Objection installation",
            CheckKind::Device => "Checking device connection",
            CheckKind::FridaServer => "Checking Frida server status",
            CheckKind::Target => "Checking target application",
            CheckKind::OutputDir => "Checking output directories",
        }
    }

    pub fn remediation(self) -> &'static [&'static str] {
        match self {
            CheckKind::Objection => &["Install Objection: pip install objection"],
            CheckKind::Device => &[
                "Connect Android device/emulator and enable USB debugging",
                "Run: adb devices",
            ],
            CheckKind::FridaServer => &[
                "Start Frida server on device:",
                "  - Download frida-server for your device architecture",
                "  - Push to device: adb push frida-server /data/local/tmp/",
                "  - Make executable: adb shell chmod 755 /data/local/tmp/frida-server",
                "  - Run as root: adb shell su -c '/data/local/tmp/frida-server &'",
            ],
            CheckKind::Target => &[
                "Specify a valid package name or PID",
                "Make sure the target app is running",
            ],
            CheckKind::OutputDir => &["Point --output at a writable directory"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCheck {
    pub kind: CheckKind,
    pub ok: bool,
    pub message: String,
}

impl DiagnosticCheck {
    fn new(kind: CheckKind, result: CheckResult) -> Self {
        Self {
            kind,
            ok: result.ok,
            message: result.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub checks: Vec<DiagnosticCheck>,
    pub ready: bool,
    pub remediation: Vec<&'static str>,
}

impl Diagnostics {
    pub fn new(checks: Vec<DiagnosticCheck>) -> Self {
        let ready = checks.iter().all(|check| check.ok);
        let remediation = checks
            .iter()
            .filter(|check| !check.ok)
            .flat_map(|check| check.kind.remediation().iter().copied())
            .collect();
        Self {
            checks,
            ready,
            remediation,
        }
    }

    pub fn render(&self, palette: &Palette) -> String {
        let steps = self.checks.len() + 1;
        let mut out = String::new();
        out.push_str(&palette.heading("OBJECTION SYSTEM DIAGNOSTICS"));
        out.push('\n');
        for (index, check) in self.checks.iter().enumerate() {
            out.push_str(&format!("\n[{}/{steps}] {}...\n", index + 1, check.kind.title()));
            out.push_str(&format!(
                "    {} {}\n",
                palette.status_marker(check.ok),
                check.message
            ));
        }
        out.push_str(&format!("\n[{steps}/{steps}] Overall system readiness...\n"));
        if self.ready {
            out.push_str(&format!(
                "    {}\n",
                palette.ok("All systems ready for Objection testing!")
            ));
            return out;
        }
        out.push_str(&format!(
            "    {}\n",
            palette.fail("Some issues found. Please resolve them before testing.")
        ));
        out.push_str(&format!("\n{}\n", palette.warn("SOLUTIONS:")));
        for hint in &self.remediation {
            out.push_str(&format!("    * {hint}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::error::AppError;
    use tempfile::TempDir;

    fn exited(code: i32, stdout: &str) -> Result<CommandOutput, AppError> {
        Ok(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(code),
        })
    }

    fn responder(
        respond: impl Fn(&str, &[String]) -> Result<CommandOutput, AppError>,
    ) -> impl Fn(&str, &[String], Duration, &str) -> Result<CommandOutput, AppError> {
        move |program: &str, args: &[String], _timeout: Duration, _trace_id: &str| {
            respond(program, args)
        }
    }

    fn pid_target(pid: u32) -> Target {
        Target::process(pid, None, "t").expect("pid")
    }

    #[test]
    fn pid_probe_reads_process_table() {
        let readiness = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, args| {
                assert_eq!(args, ["shell", "ps", "-p", "1234"]);
                exited(
                    0,
                    "USER PID PPID VSZ RSS WCHAN ADDR S NAME\n\
                     u0_a123 1234 612 0 0 0 0 S com.example.app\n",
                )
            }),
        )
        .with_target(&pid_target(1234));

        let result = readiness.verify_target_running("t");
        assert!(result.ok);
        assert_eq!(result.message, "Process 1234 is running");
    }

    #[test]
    fn empty_process_table_is_a_negative_answer() {
        let readiness =
            Readiness::with_executor("objection", "adb", responder(|_, _| exited(0, "")))
                .with_target(&pid_target(1234));

        let result = readiness.verify_target_running("t");
        assert!(!result.ok);
        assert_eq!(result.message, "Process 1234 is not running");
    }

    #[test]
    fn pid_only_in_another_column_does_not_count() {
        let readiness = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, _| exited(0, "USER PID PPID NAME\nroot 1 0 init\nshell 77 1234 sh\n")),
        )
        .with_target(&pid_target(1234));

        assert!(!readiness.verify_target_running("t").ok);
    }

    #[test]
    fn package_probe_uses_pidof_with_device_selector() {
        let target = Target::package("com.example.app", Some("emulator-5554".into()), "t")
            .expect("target");
        let readiness = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, args| {
                assert_eq!(args, ["-s", "emulator-5554", "shell", "pidof", "com.example.app"]);
                exited(0, "4321\n")
            }),
        )
        .with_target(&target);

        let result = readiness.verify_target_running("t");
        assert!(result.ok);
        assert_eq!(result.message, "Package com.example.app is running (PID: 4321)");
    }

    #[test]
    fn pidof_miss_and_adb_fault_never_raise() {
        let target = Target::package("com.example.app", None, "t").expect("target");
        let miss = Readiness::with_executor("objection", "adb", responder(|_, _| exited(1, "")))
            .with_target(&target);
        assert_eq!(
            miss.verify_target_running("t").message,
            "Package com.example.app is not running"
        );

        let fault = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, _| Err(AppError::timeout("Command timed out after 10 seconds", "t"))),
        )
        .with_target(&target);
        let result = fault.verify_target_running("t");
        assert!(!result.ok);
        assert!(result.message.starts_with("Error verifying target: Command timed out"));
    }

    #[test]
    fn no_target_is_reported() {
        let readiness =
            Readiness::with_executor("objection", "adb", responder(|_, _| exited(0, "")));
        assert_eq!(
            readiness.verify_target_running("t").message,
            "No target package or PID specified"
        );
    }

    #[test]
    fn device_check_lists_available_devices_when_requested_one_is_missing() {
        let devices =
            "List of devices attached\nemulator-5554\tdevice\nR58M\toffline\nZX1\tdevice\n";
        let readiness = Readiness::with_executor(
            "objection",
            "adb",
            responder(move |_, args| {
                assert_eq!(args, ["devices"]);
                exited(0, devices)
            }),
        )
        .with_device(Some("R58M".into()));

        let result = readiness.check_device_connection("t");
        assert!(!result.ok);
        assert_eq!(
            result.message,
            "Specified device R58M not found. Available devices: emulator-5554, ZX1"
        );

        let any = Readiness::with_executor(
            "objection",
            "adb",
            responder(move |_, _| exited(0, devices)),
        );
        assert!(any.check_device_connection("t").ok);

        let none = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, _| exited(0, "List of devices attached\n\n")),
        );
        assert_eq!(none.check_device_connection("t").message, "No Android devices connected");
    }

    #[test]
    fn objection_check_runs_version() {
        let ok = Readiness::with_executor(
            "objection",
            "adb",
            responder(|program, args| {
                assert_eq!(program, "objection");
                assert_eq!(args, ["version"]);
                exited(0, "objection: 1.11.0")
            }),
        );
        assert!(ok.check_objection_available("t").ok);

        let missing = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, _| {
                Err(AppError::dependency(
                    "Failed to spawn objection: not found",
                    "t",
                ))
            }),
        );
        let result = missing.check_objection_available("t");
        assert!(!result.ok);
        assert_eq!(
            result.message,
            "Error checking Objection: Failed to spawn objection: not found"
        );
    }

    #[test]
    fn frida_check_ignores_the_grep_line() {
        let only_grep = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, args| {
                assert_eq!(args, ["shell", "ps | grep frida-server"]);
                exited(0, "shell 9999 1 grep frida-server\n")
            }),
        );
        assert!(!only_grep.check_frida_server("t").ok);

        let running = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, _| exited(0, "root 812 1 /data/local/tmp/frida-server\n")),
        );
        assert!(running.check_frida_server("t").ok);
    }

    #[test]
    fn output_dir_check_only_fails_on_a_file() {
        let dir = TempDir::new().expect("tmp");
        assert!(check_output_dir(dir.path()).ok);
        let pending = check_output_dir(&dir.path().join("later"));
        assert!(pending.ok);
        assert!(pending.message.starts_with("Output directory will be created"));

        let file = dir.path().join("blocked");
        std::fs::write(&file, b"x").expect("write");
        assert!(!check_output_dir(&file).ok);
    }

    #[test]
    fn diagnostics_collect_hints_for_failed_checks() {
        let dir = TempDir::new().expect("tmp");
        let readiness = Readiness::with_executor(
            "objection",
            "adb",
            responder(|program, args| {
                if program == "objection" {
                    return exited(0, "1.11.0");
                }
                match args.first().map(String::as_str) {
                    Some("devices") => {
                        exited(0, "List of devices attached\nemulator-5554\tdevice\n")
                    }
                    _ => exited(1, ""),
                }
            }),
        )
        .with_target(&pid_target(42));

        let report = readiness.diagnose(dir.path(), "t");
        assert_eq!(report.checks.len(), 5);
        assert!(!report.ready);
        let failed: Vec<CheckKind> = report
            .checks
            .iter()
            .filter(|check| !check.ok)
            .map(|check| check.kind)
            .collect();
        assert_eq!(failed, vec![CheckKind::FridaServer, CheckKind::Target]);
        assert!(report
            .remediation
            .contains(&"Make sure the target app is running"));
        assert!(!report.remediation.contains(&"Run: adb devices"));

        let text = report.render(&Palette::plain());
        assert!(text.contains("[1/6] Checking Objection installation..."));
        assert!(text.contains("[6/6] Overall system readiness..."));
        assert!(text.contains("SOLUTIONS:"));
    }

    #[test]
    fn untargeted_diagnostics_never_probe_processes() {
        let dir = TempDir::new().expect("tmp");
        let readiness = Readiness::with_executor(
            "objection",
            "adb",
            responder(|_, args| {
                assert!(!args.iter().any(|arg| arg == "pidof" || arg == "-p"));
                exited(0, "")
            }),
        );
        let report = readiness.diagnose(dir.path(), "t");
        let target = &report.checks[3];
        assert_eq!(target.kind, CheckKind::Target);
        assert_eq!(target.message, "No target specified (package name or PID)");
    }
}
