use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app::error::AppError;

/// Sentinel return code for runs that timed out or never produced an exit status.
pub const FAULT_RETURN_CODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SecurityBypasses,
    DataExploration,
    RuntimeAnalysis,
    NetworkMonitoring,
    ApplicationInfo,
    DynamicManipulation,
    AdvancedTesting,
    QuickTests,
    SessionLogs,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::SecurityBypasses,
        Category::DataExploration,
        Category::RuntimeAnalysis,
        Category::NetworkMonitoring,
        Category::ApplicationInfo,
        Category::DynamicManipulation,
        Category::AdvancedTesting,
        Category::QuickTests,
        Category::SessionLogs,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Category::SecurityBypasses => "security_bypasses",
            Category::DataExploration => "data_exploration",
            Category::RuntimeAnalysis => "runtime_analysis",
            Category::NetworkMonitoring => "network_monitoring",
            Category::ApplicationInfo => "application_info",
            Category::DynamicManipulation => "dynamic_manipulation",
            Category::AdvancedTesting => "advanced_testing",
            Category::QuickTests => "quick_tests",
            Category::SessionLogs => "session_logs",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Category::SecurityBypasses => "Security Bypasses",
            Category::DataExploration => "Data Exploration",
            Category::RuntimeAnalysis => "Runtime Analysis",
            Category::NetworkMonitoring => "Network Monitoring",
            Category::ApplicationInfo => "Application Information",
            Category::DynamicManipulation => "Dynamic Manipulation",
            Category::AdvancedTesting => "Advanced Testing",
            Category::QuickTests => "Quick Tests",
            Category::SessionLogs => "Session Logs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().replace('-', "_").to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.dir_name() == wanted)
            .ok_or_else(|| AppError::validation(format!("Unknown category: {value}"), ""))
    }
}

/// How a single execution ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitStatus {
    Exited { code: i32 },
    /// The child ended without an exit code (killed by a signal).
    Signaled,
    TimedOut,
    Fault { message: String },
}

impl ExitStatus {
    pub fn return_code(&self) -> i32 {
        match self {
            ExitStatus::Exited { code } => *code,
            ExitStatus::Signaled | ExitStatus::TimedOut | ExitStatus::Fault { .. } => {
                FAULT_RETURN_CODE
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Exited { code: 0 })
    }
}

/// One execution, as persisted. Never mutated after it is written.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRecord {
    pub test_name: String,
    pub category: Category,
    pub description: String,
    pub command: String,
    pub full_command: String,
    pub started_at: DateTime<Local>,
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

impl InvocationRecord {
    pub fn return_code(&self) -> i32 {
        self.status.return_code()
    }

    pub fn success(&self) -> bool {
        self.status.is_success()
    }
}

/// The normalized tuple handed back to callers.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationOutcome {
    pub success: bool,
    pub output_file: PathBuf,
    pub stdout: String,
    pub stderr: String,
    pub return_code: i32,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_error: Option<AppError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub ok: bool,
    pub message: String,
}

impl CheckResult {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSummary {
    pub serial: String,
    pub state: String,
}
