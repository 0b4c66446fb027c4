use std::path::Path;

pub const DEFAULT_ADB_PROGRAM: &str = "adb";
pub const DEFAULT_OBJECTION_PROGRAM: &str = "objection";

pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    if let Some(inner) = trimmed
        .strip_prefix('"')
        .and_then(|candidate| candidate.strip_suffix('"'))
    {
        return inner.trim().to_string();
    }
    if let Some(inner) = trimmed
        .strip_prefix('\'')
        .and_then(|candidate| candidate.strip_suffix('\''))
    {
        return inner.trim().to_string();
    }
    trimmed.to_string()
}

/// Configured path, or the bare program name when nothing is configured.
pub fn resolve_program(configured: &str, default_name: &str) -> String {
    let normalized = normalize_command_path(configured);
    if normalized.is_empty() {
        default_name.to_string()
    } else {
        normalized
    }
}

/// Bare names are left to `PATH` lookup at spawn time; explicit paths must exist.
pub fn validate_program(program: &str, label: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err(format!("{label} command is empty"));
    }
    if !program.contains('/') && !program.contains('\\') {
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err(format!("{label} path must point to an executable file"));
    }
    if !path.exists() {
        return Err(format!("{label} executable not found at the configured path"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_wrapping_quotes() {
        assert_eq!(
            normalize_command_path("  \"/opt/android/platform-tools/adb\"  "),
            "/opt/android/platform-tools/adb"
        );
        assert_eq!(
            normalize_command_path("  '/home/me/.local/bin/objection'  "),
            "/home/me/.local/bin/objection"
        );
    }

    #[test]
    fn resolves_empty_to_default_name() {
        assert_eq!(resolve_program("", DEFAULT_ADB_PROGRAM), "adb");
        assert_eq!(resolve_program("   ", DEFAULT_OBJECTION_PROGRAM), "objection");
        assert_eq!(resolve_program("/usr/bin/adb", DEFAULT_ADB_PROGRAM), "/usr/bin/adb");
    }

    #[test]
    fn validates_paths_but_not_bare_names() {
        assert!(validate_program("objection", "Objection").is_ok());
        let err = validate_program("/this/path/should/not/exist/adb", "ADB").unwrap_err();
        assert!(err.to_lowercase().contains("not found"));
        let dir = std::env::temp_dir();
        let err = validate_program(&dir.to_string_lossy(), "ADB").unwrap_err();
        assert!(err.contains("executable file"));
        assert!(validate_program(" ", "ADB").is_err());
    }
}
