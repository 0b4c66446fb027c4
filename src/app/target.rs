use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::app::error::AppError;

pub const UNKNOWN_TARGET_DIR: &str = "unknown_app";
pub const UNKNOWN_TARGET_LABEL: &str = "Unknown";
pub const DEFAULT_DEVICE_LABEL: &str = "Default";

/// What is under test. Exactly one identifier, enforced by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TargetId {
    Package(String),
    ProcessId(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub device_id: Option<String>,
}

fn package_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)+$").expect("package pattern")
    })
}

pub fn is_valid_package_name(value: &str) -> bool {
    package_pattern().is_match(value.trim())
}

fn normalize_device(device_id: Option<String>) -> Option<String> {
    device_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Target {
    pub fn package(
        name: impl Into<String>,
        device_id: Option<String>,
        trace_id: &str,
    ) -> Result<Self, AppError> {
        let name = name.into().trim().to_string();
        if !is_valid_package_name(&name) {
            return Err(AppError::validation(
                format!("Invalid package name: {name:?}"),
                trace_id,
            ));
        }
        Ok(Self {
            id: TargetId::Package(name),
            device_id: normalize_device(device_id),
        })
    }

    pub fn process(pid: u32, device_id: Option<String>, trace_id: &str) -> Result<Self, AppError> {
        if pid == 0 {
            return Err(AppError::validation("Process id must be positive", trace_id));
        }
        Ok(Self {
            id: TargetId::ProcessId(pid),
            device_id: normalize_device(device_id),
        })
    }

    pub fn package_name(&self) -> Option<&str> {
        match &self.id {
            TargetId::Package(name) => Some(name),
            TargetId::ProcessId(_) => None,
        }
    }

    /// Value passed to the instrumentation CLI's `-g` flag.
    pub fn gadget(&self) -> String {
        match &self.id {
            TargetId::Package(name) => name.clone(),
            TargetId::ProcessId(pid) => pid.to_string(),
        }
    }

    pub fn session_dir_name(&self) -> String {
        session_dir_name(Some(&self.id))
    }

    pub fn device_label(&self) -> &str {
        self.device_id.as_deref().unwrap_or(DEFAULT_DEVICE_LABEL)
    }
}

/// Root directory name for a session; the placeholder covers runs without a target.
pub fn session_dir_name(id: Option<&TargetId>) -> String {
    match id {
        Some(TargetId::Package(name)) => name.clone(),
        Some(TargetId::ProcessId(pid)) => format!("pid_{pid}"),
        None => UNKNOWN_TARGET_DIR.to_string(),
    }
}

pub fn target_label(id: Option<&TargetId>) -> String {
    match id {
        Some(TargetId::Package(name)) => name.clone(),
        Some(TargetId::ProcessId(pid)) => format!("PID {pid}"),
        None => UNKNOWN_TARGET_LABEL.to_string(),
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", target_label(Some(&self.id)))?;
        if let Some(device) = &self.device_id {
            write!(f, " on {device}")?;
        }
        Ok(())
    }
}
