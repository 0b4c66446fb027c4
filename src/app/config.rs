use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app::adb::locator::{resolve_program, DEFAULT_ADB_PROGRAM, DEFAULT_OBJECTION_PROGRAM};
use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "DROID_ORCHESTRATOR_CONFIG_PATH";
const CONFIG_FILE_NAME: &str = ".droid_orchestrator_config.json";
const BACKUP_FILE_NAME: &str = ".droid_orchestrator_config.backup.json";

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolSettings {
    #[serde(default)]
    pub objection_path: String,
    #[serde(default)]
    pub adb_path: String,
}

impl ToolSettings {
    pub fn objection_program(&self) -> String {
        resolve_program(&self.objection_path, DEFAULT_OBJECTION_PROGRAM)
    }

    pub fn adb_program(&self) -> String {
        resolve_program(&self.adb_path, DEFAULT_ADB_PROGRAM)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSettings {
    pub command_timeout_secs: u64,
    pub readiness_timeout_secs: u64,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            readiness_timeout_secs: DEFAULT_READINESS_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputSettings {
    pub base_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            base_dir: "./output/objection".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiSettings {
    pub color: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self { color: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub tools: ToolSettings,
    #[serde(default)]
    pub command: CommandSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    home_dir().join(CONFIG_FILE_NAME)
}

pub fn backup_config_path() -> PathBuf {
    home_dir().join(BACKUP_FILE_NAME)
}

pub fn load_config(trace_id: &str) -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn save_config(config: &AppConfig, trace_id: &str) -> Result<(), AppError> {
    save_config_to_path(config, &config_path(), &backup_config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::system(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    backup_path: &Path,
    trace_id: &str,
) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_path);
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), trace_id))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), trace_id))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    if config.command.command_timeout_secs == 0 {
        config.command.command_timeout_secs = DEFAULT_COMMAND_TIMEOUT_SECS;
    }
    if config.command.readiness_timeout_secs == 0 {
        config.command.readiness_timeout_secs = DEFAULT_READINESS_TIMEOUT_SECS;
    }
    if config.output.base_dir.trim().is_empty() {
        config.output.base_dir = OutputSettings::default().base_dir;
    }
    if config.logging.log_level.trim().is_empty() {
        config.logging.log_level = LoggingSettings::default().log_level;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().expect("tmp");
        let config = load_config_from_path(&dir.path().join("absent.json"), "t").expect("load");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.command.command_timeout_secs, 60);
        assert_eq!(config.command.readiness_timeout_secs, 10);
        assert_eq!(config.tools.objection_program(), "objection");
        assert_eq!(config.tools.adb_program(), "adb");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            serde_json::json!({
                "tools": { "objection_path": "\"/opt/objection/bin/objection\"" },
                "output": { "base_dir": "/tmp/reports" }
            })
            .to_string(),
        )
        .expect("write");

        let config = load_config_from_path(&path, "t").expect("load");
        assert_eq!(config.tools.objection_program(), "/opt/objection/bin/objection");
        assert_eq!(config.output.base_dir, "/tmp/reports");
        assert_eq!(config.command, CommandSettings::default());
        assert!(config.ui.color);
    }

    #[test]
    fn clamps_invalid_values() {
        let mut config = AppConfig::default();
        config.command.command_timeout_secs = 0;
        config.command.readiness_timeout_secs = 0;
        config.output.base_dir = "  ".to_string();
        let validated = validate_config(config);
        assert_eq!(validated.command.command_timeout_secs, 60);
        assert_eq!(validated.command.readiness_timeout_secs, 10);
        assert_eq!(validated.output.base_dir, "./output/objection");
    }

    #[test]
    fn unparseable_file_is_a_system_error() {
        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").expect("write");
        let err = load_config_from_path(&path, "trace-cfg").unwrap_err();
        assert_eq!(err.code, "ERR_SYSTEM");
        assert_eq!(err.trace_id, "trace-cfg");
    }

    #[test]
    fn save_keeps_backup_of_previous_file() {
        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("config.json");
        let backup = dir.path().join("config.backup.json");

        let mut config = AppConfig::default();
        save_config_to_path(&config, &path, &backup, "t").expect("first save");
        assert!(!backup.exists());

        config.command.command_timeout_secs = 120;
        save_config_to_path(&config, &path, &backup, "t").expect("second save");
        let previous = load_config_from_path(&backup, "t").expect("backup");
        assert_eq!(previous.command.command_timeout_secs, 60);
        let current = load_config_from_path(&path, "t").expect("current");
        assert_eq!(current.command.command_timeout_secs, 120);
    }

    #[test]
    fn env_var_overrides_config_location() {
        static LOCK: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
        let _guard = LOCK
            .get_or_init(|| std::sync::Mutex::new(()))
            .lock()
            .expect("env lock");

        let dir = TempDir::new().expect("tmp");
        let path = dir.path().join("custom.json");
        std::env::set_var(CONFIG_PATH_ENV, &path);
        assert_eq!(config_path(), path);

        std::env::set_var(CONFIG_PATH_ENV, "   ");
        assert!(config_path().ends_with(CONFIG_FILE_NAME));

        std::env::remove_var(CONFIG_PATH_ENV);
    }
}
