use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{info, warn};

use crate::app::error::AppError;
use crate::app::models::{Category, InvocationRecord};
use crate::app::report::{render_report, report_file_name};
use crate::app::target::Target;

/// Creates `<base>/<dir_name>/<category>` for every category. Safe to repeat.
pub fn initialize_tree(
    base_dir: &Path,
    dir_name: &str,
    trace_id: &str,
) -> Result<PathBuf, AppError> {
    let root = base_dir.join(dir_name);
    for category in Category::ALL {
        let dir = root.join(category.dir_name());
        fs::create_dir_all(&dir).map_err(|err| {
            AppError::system(
                format!("Failed to create output dir {}: {err}", dir.display()),
                trace_id,
            )
        })?;
    }
    Ok(root)
}

/// Output tree bound to one target.
#[derive(Debug, Clone)]
pub struct Session {
    target: Target,
    root: PathBuf,
}

impl Session {
    pub fn initialize(base_dir: &Path, target: Target, trace_id: &str) -> Result<Self, AppError> {
        let root = initialize_tree(base_dir, &target.session_dir_name(), trace_id)?;
        info!(trace_id = %trace_id, root = %root.display(), target = %target, "Session ready");
        Ok(Self { target, root })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    pub fn report_path(&self, record: &InvocationRecord) -> PathBuf {
        self.category_dir(record.category)
            .join(report_file_name(&record.test_name, &record.started_at))
    }

    /// Writes the record's envelope. A failed write is retried once after the
    /// category directory is recreated.
    pub fn persist(&self, record: &InvocationRecord, trace_id: &str) -> Result<PathBuf, AppError> {
        let path = self.report_path(record);
        let content = render_report(record, &self.target, &Local::now());

        if let Err(first) = fs::write(&path, &content) {
            warn!(
                trace_id = %trace_id,
                path = %path.display(),
                error = %first,
                "Report write failed, recreating category dir"
            );
            let retry = fs::create_dir_all(self.category_dir(record.category))
                .and_then(|_| fs::write(&path, &content));
            if let Err(err) = retry {
                return Err(AppError::report_write(
                    format!("Failed to write report {}: {err}", path.display()),
                    trace_id,
                ));
            }
        }

        info!(
            trace_id = %trace_id,
            path = %path.display(),
            category = %record.category,
            "Report written"
        );
        Ok(path)
    }

    /// All report files in the session, sorted by category then name.
    pub fn list_reports(&self, trace_id: &str) -> Result<Vec<PathBuf>, AppError> {
        let mut reports = Vec::new();
        for category in Category::ALL {
            let dir = self.category_dir(category);
            if !dir.is_dir() {
                continue;
            }
            let entries = fs::read_dir(&dir).map_err(|err| {
                AppError::system(format!("Failed to read {}: {err}", dir.display()), trace_id)
            })?;
            let mut files = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .collect::<Vec<_>>();
            files.sort();
            reports.extend(files);
        }
        Ok(reports)
    }
}
