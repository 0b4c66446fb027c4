use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use serde::Serialize;
use tracing::info;
use zip::write::FileOptions;

use crate::app::error::AppError;
use crate::app::report::FILE_TIMESTAMP_FORMAT;
use crate::app::session::Session;
use crate::app::target::Target;

const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Serialize)]
struct ExportManifest<'a> {
    app_version: &'static str,
    target: &'a Target,
    session_root: String,
    timestamp_utc: String,
    trace_id: &'a str,
    files: Vec<String>,
}

/// Archive path relative to the session root, always `/` separated.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}

fn root_name(session: &Session) -> String {
    session
        .root()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| session.target().session_dir_name())
}

/// Zips every report of `session` plus a manifest. Without `output_dir` the archive
/// lands next to the session root, never inside it.
pub fn export_session_bundle(
    session: &Session,
    output_dir: Option<&Path>,
    trace_id: &str,
) -> Result<PathBuf, AppError> {
    let resolved_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => session
            .root()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&resolved_dir).map_err(|err| {
        AppError::system(format!("Failed to create output dir: {err}"), trace_id)
    })?;

    let timestamp = Local::now().format(FILE_TIMESTAMP_FORMAT).to_string();
    let bundle_path = resolved_dir.join(format!("session_{}_{timestamp}.zip", root_name(session)));

    let reports = session.list_reports(trace_id)?;
    let mut entries = Vec::with_capacity(reports.len());
    for path in reports {
        if let Some(name) = entry_name(session.root(), &path) {
            entries.push((name, path));
        }
    }

    let manifest = ExportManifest {
        app_version: env!("CARGO_PKG_VERSION"),
        target: session.target(),
        session_root: session.root().display().to_string(),
        timestamp_utc: Utc::now().to_rfc3339(),
        trace_id,
        files: entries.iter().map(|(name, _)| name.clone()).collect(),
    };
    let json = serde_json::to_vec_pretty(&manifest).map_err(|err| {
        AppError::system(format!("Failed to serialize export manifest: {err}"), trace_id)
    })?;

    let write_err = |err: &dyn std::fmt::Display| {
        AppError::system(format!("Failed to write bundle: {err}"), trace_id)
    };

    let file = fs::File::create(&bundle_path)
        .map_err(|err| AppError::system(format!("Failed to create bundle: {err}"), trace_id))?;
    let mut zip = zip::ZipWriter::new(file);
    zip.start_file(MANIFEST_NAME, FileOptions::<()>::default())
        .map_err(|err| write_err(&err))?;
    zip.write_all(&json).map_err(|err| write_err(&err))?;

    for (name, path) in &entries {
        let bytes = fs::read(path).map_err(|err| {
            AppError::system(format!("Failed to read {}: {err}", path.display()), trace_id)
        })?;
        zip.start_file(name.as_str(), FileOptions::<()>::default())
            .map_err(|err| write_err(&err))?;
        zip.write_all(&bytes).map_err(|err| write_err(&err))?;
    }
    zip.finish()
        .map_err(|err| AppError::system(format!("Failed to finalize bundle: {err}"), trace_id))?;

    info!(
        trace_id = %trace_id,
        path = %bundle_path.display(),
        files = entries.len(),
        "Session exported"
    );
    Ok(bundle_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::Category;
    use std::io::{Cursor, Read};
    use tempfile::TempDir;

    fn read_entry(bundle: &Path, name: &str) -> String {
        let bytes = fs::read(bundle).expect("read bundle");
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let mut file = archive.by_name(name).expect("entry");
        let mut content = String::new();
        file.read_to_string(&mut content).expect("read");
        content
    }

    #[test]
    fn bundles_reports_with_manifest() {
        let dir = TempDir::new().expect("tmp");
        let target = Target::process(1234, None, "t").expect("target");
        let session = Session::initialize(&dir.path().join("out"), target, "t").expect("session");
        let bypasses = session.category_dir(Category::SecurityBypasses);
        fs::write(
            bypasses.join("root_detection_bypass_20260102_030405.txt"),
            "Return Code: 0\n",
        )
        .expect("report");
        fs::write(
            session.category_dir(Category::QuickTests).join("environment_info_20260102_030406.txt"),
            "Return Code: 1\n",
        )
        .expect("report");

        let bundle = export_session_bundle(&session, None, "trace-export").expect("bundle");

        assert_eq!(bundle.parent(), Some(dir.path().join("out").as_path()));
        let file_name = bundle.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(file_name.starts_with("session_pid_1234_"));
        assert!(file_name.ends_with(".zip"));

        let manifest: serde_json::Value =
            serde_json::from_str(&read_entry(&bundle, MANIFEST_NAME)).expect("manifest json");
        assert_eq!(manifest["trace_id"], "trace-export");
        assert_eq!(manifest["target"]["id"]["kind"], "process_id");
        assert_eq!(
            manifest["files"],
            serde_json::json!([
                "security_bypasses/root_detection_bypass_20260102_030405.txt",
                "quick_tests/environment_info_20260102_030406.txt"
            ])
        );
        assert_eq!(
            read_entry(&bundle, "quick_tests/environment_info_20260102_030406.txt"),
            "Return Code: 1\n"
        );
    }

    #[test]
    fn empty_session_still_exports_a_manifest() {
        let dir = TempDir::new().expect("tmp");
        let target = Target::package("com.example.app", None, "t").expect("target");
        let session = Session::initialize(dir.path(), target, "t").expect("session");
        let out = dir.path().join("exports");

        let bundle = export_session_bundle(&session, Some(&out), "t").expect("bundle");

        assert!(bundle.starts_with(&out));
        let manifest: serde_json::Value =
            serde_json::from_str(&read_entry(&bundle, MANIFEST_NAME)).expect("manifest json");
        assert_eq!(manifest["files"], serde_json::json!([]));
    }
}
