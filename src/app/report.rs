use chrono::{DateTime, Local};

use crate::app::models::InvocationRecord;
use crate::app::target::{target_label, Target};

/// Sortable, second resolution. Used in file names and the report header.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const COMPLETED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BANNER_WIDTH: usize = 80;
const SECTION_RULE_WIDTH: usize = 40;
const REPORT_TITLE: &str = "OBJECTION TESTING OUTPUT";

pub fn file_timestamp(at: &DateTime<Local>) -> String {
    at.format(FILE_TIMESTAMP_FORMAT).to_string()
}

pub fn report_file_name(test_name: &str, at: &DateTime<Local>) -> String {
    format!("{test_name}_{}.txt", file_timestamp(at))
}

fn push_section(content: &mut String, label: &str, body: &str) {
    if body.is_empty() {
        return;
    }
    content.push_str(label);
    content.push_str(":\n");
    content.push_str(&"-".repeat(SECTION_RULE_WIDTH));
    content.push('\n');
    content.push_str(body);
    content.push_str("\n\n");
}

/// Renders the plaintext envelope written for every execution.
pub fn render_report(
    record: &InvocationRecord,
    target: &Target,
    completed_at: &DateTime<Local>,
) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let mut content = String::with_capacity(
        512 + record.stdout.len() + record.stderr.len() + record.command.len(),
    );

    content.push_str(&format!("{banner}\n{REPORT_TITLE}\n{banner}\n"));
    content.push_str(&format!("Timestamp: {}\n", file_timestamp(&record.started_at)));
    content.push_str(&format!("Target: {}\n", target_label(Some(&target.id))));
    content.push_str(&format!("Device: {}\n", target.device_label()));
    content.push_str(&format!("Command: {}\n", record.command));
    content.push_str(&format!("Description: {}\n", record.description));
    content.push_str(&format!("Return Code: {}\n", record.return_code()));
    content.push_str(&format!("{banner}\n\n"));

    push_section(&mut content, "STDOUT", &record.stdout);
    push_section(&mut content, "STDERR", &record.stderr);

    content.push_str(&format!(
        "{banner}\nTest completed at: {}\n{banner}\n",
        completed_at.format(COMPLETED_AT_FORMAT)
    ));
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{Category, ExitStatus};
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 3, 14, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    fn record(stdout: &str, stderr: &str, status: ExitStatus) -> InvocationRecord {
        InvocationRecord {
            test_name: "ssl_pinning_bypass".to_string(),
            category: Category::SecurityBypasses,
            description: "Disable SSL certificate pinning".to_string(),
            command: "android sslpinning disable".to_string(),
            full_command: "objection -g com.example.app run android sslpinning disable"
                .to_string(),
            started_at: at(9, 5, 7),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            status,
        }
    }

    #[test]
    fn file_names_embed_sortable_timestamp() {
        assert_eq!(
            report_file_name("ssl_pinning_bypass", &at(9, 5, 7)),
            "ssl_pinning_bypass_20260314_090507.txt"
        );
    }

    #[test]
    fn renders_full_envelope() {
        let target = Target::package("com.example.app", None, "t").expect("target");
        let rendered = render_report(
            &record("SSL pinning disabled", "", ExitStatus::Exited { code: 0 }),
            &target,
            &at(9, 5, 9),
        );
        let banner = "=".repeat(80);
        let expected = format!(
            "{banner}\nOBJECTION TESTING OUTPUT\n{banner}\n\
             Timestamp: 20260314_090507\n\
             Target: com.example.app\n\
             Device: Default\n\
             Command: android sslpinning disable\n\
             Description: Disable SSL certificate pinning\n\
             Return Code: 0\n\
             {banner}\n\n\
             STDOUT:\n{}\nSSL pinning disabled\n\n\
             {banner}\nTest completed at: 2026-03-14 09:05:09\n{banner}\n",
            "-".repeat(40)
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn omits_empty_sections_and_prints_sentinel() {
        let target = Target::process(1234, Some("emulator-5554".to_string()), "t").expect("pid");
        let rendered = render_report(
            &record("", "Command timed out after 60 seconds", ExitStatus::TimedOut),
            &target,
            &at(9, 6, 7),
        );
        assert!(!rendered.contains("STDOUT:"));
        let expected = "STDERR:\n----------------------------------------\n\
                        Command timed out after 60 seconds\n";
        assert!(rendered.contains(expected));
        assert!(rendered.contains("Target: PID 1234\n"));
        assert!(rendered.contains("Device: emulator-5554\n"));
        assert!(rendered.contains("Return Code: -1\n"));
    }
}
