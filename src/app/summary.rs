use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::app::presentation::Palette;

/// One line of a multi-test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteEntry {
    pub name: String,
    pub success: bool,
    /// Report path, or an `Error: ...` note when the step never reached the runner.
    pub output: String,
}

impl SuiteEntry {
    pub fn recorded(name: impl Into<String>, success: bool, output_file: &Path) -> Self {
        Self {
            name: name.into(),
            success,
            output: output_file.display().to_string(),
        }
    }

    pub fn rejected(name: impl Into<String>, message: &str) -> Self {
        Self {
            name: name.into(),
            success: false,
            output: format!("Error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub output_dir: PathBuf,
    pub entries: Vec<SuiteEntry>,
}

impl TestSummary {
    pub fn new(entries: Vec<SuiteEntry>, output_dir: &Path) -> Self {
        let total = entries.len();
        let successful = entries.iter().filter(|entry| entry.success).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        };
        Self {
            total,
            successful,
            failed: total - successful,
            success_rate,
            output_dir: output_dir.to_path_buf(),
            entries,
        }
    }

    pub fn render(&self, palette: &Palette) -> String {
        let mut out = String::new();
        out.push_str(&palette.heading("TEST SUMMARY"));
        out.push_str("\n\n");
        out.push_str(&format!("Total Tests Run: {}\n", self.total));
        out.push_str(&format!("Successful: {}\n", self.successful));
        out.push_str(&format!("Failed: {}\n", self.failed));
        out.push_str(&format!("Success Rate: {:.1}%\n\n", self.success_rate));
        out.push_str(&format!("Output Directory: {}\n\n", self.output_dir.display()));
        out.push_str("Test Results:\n");
        for entry in &self.entries {
            out.push_str(&format!(
                "{} {:<30} -> {}\n",
                palette.status_marker(entry.success),
                entry.name,
                entry.output
            ));
        }
        out
    }
}
