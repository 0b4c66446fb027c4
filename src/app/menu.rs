//! Interactive menu model.
//!
//! Menus are data: each level owns a static table of choices, and moving between
//! levels is a pure function of the current level and the typed input. The binary
//! only reads lines, calls [`transition`], and carries out the resulting [`Step`].

use std::collections::HashSet;

use serde::Serialize;

use crate::app::error::AppError;
use crate::app::objection::catalog::{self, ACTIONS};
use crate::app::objection::suites::Suite;
use crate::app::presentation::Palette;

pub const BACK_CHOICE: &str = "b";
pub const QUIT_CHOICE: &str = "q";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuLevel {
    Main,
    SecurityBypasses,
    DataExploration,
    RuntimeAnalysis,
    NetworkMonitoring,
    ApplicationInfo,
    DynamicManipulation,
    AdvancedTesting,
    QuickTests,
}

impl MenuLevel {
    pub const ALL: [MenuLevel; 9] = [
        MenuLevel::Main,
        MenuLevel::SecurityBypasses,
        MenuLevel::DataExploration,
        MenuLevel::RuntimeAnalysis,
        MenuLevel::NetworkMonitoring,
        MenuLevel::ApplicationInfo,
        MenuLevel::DynamicManipulation,
        MenuLevel::AdvancedTesting,
        MenuLevel::QuickTests,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MenuLevel::Main => "OBJECTION TESTING",
            MenuLevel::SecurityBypasses => "SECURITY BYPASSES",
            MenuLevel::DataExploration => "DATA EXPLORATION",
            MenuLevel::RuntimeAnalysis => "RUNTIME ANALYSIS",
            MenuLevel::NetworkMonitoring => "NETWORK MONITORING",
            MenuLevel::ApplicationInfo => "APPLICATION INFORMATION",
            MenuLevel::DynamicManipulation => "DYNAMIC MANIPULATION",
            MenuLevel::AdvancedTesting => "ADVANCED TESTING",
            MenuLevel::QuickTests => "QUICK COMMON TESTS",
        }
    }

    /// Where `b` leads. `None` leaves the menu.
    pub fn parent(self) -> Option<MenuLevel> {
        match self {
            MenuLevel::Main => None,
            _ => Some(MenuLevel::Main),
        }
    }

    pub fn entries(self) -> &'static [MenuEntry] {
        match self {
            MenuLevel::Main => MAIN,
            MenuLevel::SecurityBypasses => SECURITY_BYPASSES,
            MenuLevel::DataExploration => DATA_EXPLORATION,
            MenuLevel::RuntimeAnalysis => RUNTIME_ANALYSIS,
            MenuLevel::NetworkMonitoring => NETWORK_MONITORING,
            MenuLevel::ApplicationInfo => APPLICATION_INFO,
            MenuLevel::DynamicManipulation => DYNAMIC_MANIPULATION,
            MenuLevel::AdvancedTesting => ADVANCED_TESTING,
            MenuLevel::QuickTests => QUICK_TESTS,
        }
    }
}

/// Work a menu choice asks for, outside of navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Catalog action. An empty preset means the parameters are prompted for.
    Run {
        action: &'static str,
        preset: &'static [&'static str],
    },
    Suite { suite: Suite },
    VerifyTarget,
    Diagnostics,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Enter(MenuLevel),
    Do(Command),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub choice: &'static str,
    pub section: &'static str,
    pub label: &'static str,
    pub action: MenuAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Navigate(MenuLevel),
    Perform(Command),
    Exit,
    Invalid(String),
}

const fn enter(choice: &'static str, label: &'static str, level: MenuLevel) -> MenuEntry {
    MenuEntry {
        choice,
        section: "",
        label,
        action: MenuAction::Enter(level),
    }
}

const fn run(
    choice: &'static str,
    section: &'static str,
    label: &'static str,
    action: &'static str,
) -> MenuEntry {
    MenuEntry {
        choice,
        section,
        label,
        action: MenuAction::Do(Command::Run { action, preset: &[] }),
    }
}

const fn preset(
    choice: &'static str,
    section: &'static str,
    label: &'static str,
    action: &'static str,
    preset: &'static [&'static str],
) -> MenuEntry {
    MenuEntry {
        choice,
        section,
        label,
        action: MenuAction::Do(Command::Run { action, preset }),
    }
}

const fn command(
    choice: &'static str,
    section: &'static str,
    label: &'static str,
    command: Command,
) -> MenuEntry {
    MenuEntry {
        choice,
        section,
        label,
        action: MenuAction::Do(command),
    }
}

const fn suite(
    choice: &'static str,
    section: &'static str,
    label: &'static str,
    suite: Suite,
) -> MenuEntry {
    command(choice, section, label, Command::Suite { suite })
}

const PASSWORD_PATTERN: &[&str] = &["password"];
const TOKEN_PATTERN: &[&str] = &["token"];
const CRYPTO_PATTERN: &[&str] = &["crypto"];
const AUTH_PATTERN: &[&str] = &["auth"];
const NETWORK_PATTERN: &[&str] = &["network"];
const BURP_PROXY: &[&str] = &["127.0.0.1", "8080"];

const MAIN: &[MenuEntry] = &[
    enter("1", "Security Bypasses", MenuLevel::SecurityBypasses),
    enter("2", "Data Exploration", MenuLevel::DataExploration),
    enter("3", "Runtime Analysis", MenuLevel::RuntimeAnalysis),
    enter("4", "Network Monitoring", MenuLevel::NetworkMonitoring),
    enter("5", "Application Information", MenuLevel::ApplicationInfo),
    enter("6", "Dynamic Manipulation", MenuLevel::DynamicManipulation),
    enter("7", "Advanced Testing", MenuLevel::AdvancedTesting),
    enter("8", "Quick Common Tests", MenuLevel::QuickTests),
    command("9", "", "Verify Target & Setup", Command::VerifyTarget),
    command("10", "", "System Diagnostics", Command::Diagnostics),
    command("11", "", "Export Session", Command::Export),
];

const SECURITY_BYPASSES: &[MenuEntry] = &[
    run("1", "ROOT DETECTION", "Check Root Status", "root-detection-check"),
    run("2", "ROOT DETECTION", "Root Detection Bypass", "root-detection-bypass"),
    run("3", "ROOT DETECTION", "Simulate Root Environment", "root-simulate"),
    run("4", "SSL/TLS SECURITY", "Check SSL Pinning", "ssl-pinning-check"),
    run("5", "SSL/TLS SECURITY", "SSL Pinning Bypass", "ssl-pinning-bypass"),
    run("6", "SSL/TLS SECURITY", "SSL Kill Switch", "ssl-kill-switch"),
    run("7", "SSL/TLS SECURITY", "Certificate Transparency Bypass", "cert-transparency-bypass"),
    run("8", "ANTI-DEBUGGING", "Check Debugger Detection", "debugger-detection-check"),
    run("9", "ANTI-DEBUGGING", "Anti-Debugging Bypass", "anti-debugging-bypass"),
    run("10", "ANTI-DEBUGGING", "Frida Detection Bypass", "frida-detection-bypass"),
    run("11", "ANTI-DEBUGGING", "Hook Detection Bypass", "hook-detection-bypass"),
    run("12", "OTHER SECURITY", "Emulator Detection Check", "emulator-detection-check"),
    run("13", "OTHER SECURITY", "Biometric Authentication Bypass", "biometric-bypass"),
    suite("14", "OTHER SECURITY", "Run All Security Bypasses", Suite::SecurityBypasses),
];

const DATA_EXPLORATION: &[MenuEntry] = &[
    run("1", "FILE SYSTEM", "File System Scan", "filesystem-scan"),
    run("2", "FILE SYSTEM", "Detailed File Listing", "file-listing"),
    run("3", "FILE SYSTEM", "Find Sensitive Files", "find-sensitive-files"),
    run("4", "FILE SYSTEM", "Download Files", "file-download"),
    run("5", "FILE SYSTEM", "Search File Contents", "grep-search"),
    run("6", "DATABASES", "Database Analysis", "database-analysis"),
    run("7", "DATABASES", "Dump All Databases", "database-dump"),
    run("8", "PREFERENCES & STORAGE", "Shared Preferences Scan", "shared-preferences-scan"),
    run("9", "PREFERENCES & STORAGE", "Dump Shared Preferences", "shared-preferences-dump"),
    run("10", "PREFERENCES & STORAGE", "Keystore Analysis", "keystore-analysis"),
    run("11", "PREFERENCES & STORAGE", "Dump Keystore Entries", "keystore-dump"),
    suite("12", "QUICK ACTIONS", "Data Leakage Check", Suite::DataLeakage),
    preset("13", "QUICK ACTIONS", "Search for Passwords", "grep-search", PASSWORD_PATTERN),
    preset("14", "QUICK ACTIONS", "Search for Tokens", "grep-search", TOKEN_PATTERN),
];

const RUNTIME_ANALYSIS: &[MenuEntry] = &[
    run("1", "CLASS & METHOD EXPLORATION", "Class Enumeration", "class-enumeration"),
    run("2", "CLASS & METHOD EXPLORATION", "Method Enumeration", "method-enumeration"),
    run("3", "CLASS & METHOD EXPLORATION", "Search Classes", "class-search"),
    run("4", "CLASS & METHOD EXPLORATION", "Search Methods", "method-search"),
    run("5", "HOOKING & MONITORING", "Hook Class Methods", "hook-class"),
    run("6", "HOOKING & MONITORING", "Hook Specific Method", "hook-method"),
    run("7", "HOOKING & MONITORING", "Intent Monitoring", "intent-monitoring"),
    run("8", "HOOKING & MONITORING", "Thread List", "thread-list"),
    run("9", "MEMORY ANALYSIS", "Memory Analysis", "memory-analysis"),
    run("10", "MEMORY ANALYSIS", "Loaded Libraries", "loaded-libraries"),
    run("11", "MEMORY ANALYSIS", "Heap Search", "heap-search"),
    run("12", "MEMORY ANALYSIS", "Memory Dump", "memory-dump"),
    preset("13", "QUICK SEARCHES", "Search Crypto Classes", "class-search", CRYPTO_PATTERN),
    preset("14", "QUICK SEARCHES", "Search Auth Methods", "method-search", AUTH_PATTERN),
    preset("15", "QUICK SEARCHES", "Search Network Classes", "class-search", NETWORK_PATTERN),
];

const NETWORK_MONITORING: &[MenuEntry] = &[
    run("1", "TRAFFIC MONITORING", "HTTP/HTTPS Monitoring", "http-monitoring"),
    run("2", "TRAFFIC MONITORING", "Start HTTP Capture", "http-capture-start"),
    run("3", "TRAFFIC MONITORING", "Stop HTTP Capture", "http-capture-stop"),
    run("4", "TRAFFIC MONITORING", "Network Monitor", "network-monitor"),
    run("5", "PROXY CONFIGURATION", "Check Proxy Configuration", "proxy-status"),
    preset("6", "PROXY CONFIGURATION", "Set Proxy (Burp)", "proxy-set", BURP_PROXY),
    run("7", "PROXY CONFIGURATION", "Set Custom Proxy", "proxy-set"),
    run("8", "PROXY CONFIGURATION", "Clear Proxy", "proxy-clear"),
    run("9", "NETWORK INFORMATION", "Network Interfaces", "network-interfaces"),
];

const APPLICATION_INFO: &[MenuEntry] = &[
    run("1", "COMPONENTS", "Activities Enumeration", "activities"),
    run("2", "COMPONENTS", "Services Enumeration", "services"),
    run("3", "COMPONENTS", "Content Providers", "providers"),
    run("4", "COMPONENTS", "Broadcast Receivers", "receivers"),
    run("5", "COMPONENTS", "Intent Filters", "intent-filters"),
    run("6", "PERMISSIONS & SECURITY", "Permissions Analysis", "permissions"),
    run("7", "PERMISSIONS & SECURITY", "Package Information", "package-info"),
    run("8", "PERMISSIONS & SECURITY", "Application Signature", "app-signature"),
    run("9", "ENVIRONMENT", "Application Environment", "app-environment"),
    run("10", "ENVIRONMENT", "Device Information", "device-info"),
    run("11", "ENVIRONMENT", "Loaded Libraries", "loaded-libraries"),
];

const DYNAMIC_MANIPULATION: &[MenuEntry] = &[
    run("1", "METHOD MANIPULATION", "Override Method Return", "method-override"),
    run("2", "APPLICATION CONTROL", "Spawn Application", "spawn-app"),
    run("3", "APPLICATION CONTROL", "Kill Application", "kill-app"),
    run("4", "MEMORY MANIPULATION", "Memory Dump", "memory-dump"),
    run("5", "ADVANCED", "Custom Script Execution", "import-script"),
];

const ADVANCED_TESTING: &[MenuEntry] = &[
    suite("1", "SPECIALIZED TESTS", "Cryptography Analysis", Suite::CryptoAnalysis),
    run("2", "CUSTOM SCRIPTS", "Load Custom Frida Script", "import-script"),
    run("3", "CUSTOM SCRIPTS", "Execute Objection Command", "custom-command"),
    command("4", "AUTOMATION", "Export Test Results", Command::Export),
];

const QUICK_TESTS: &[MenuEntry] = &[
    suite("1", "ESSENTIAL SECURITY CHECKS", "Basic Security Assessment", Suite::BasicAssessment),
    suite("2", "ESSENTIAL SECURITY CHECKS", "Data Leakage Check", Suite::DataLeakage),
    run("3", "INFORMATION GATHERING", "Environment Information", "environment-info"),
    run("4", "INFORMATION GATHERING", "Root Status", "root-status"),
    run("5", "INFORMATION GATHERING", "SSL Pinning Status", "ssl-pinning-status"),
    suite("6", "PENETRATION TESTING QUICK WINS", "All Security Bypasses", Suite::SecurityBypasses),
    command("7", "REPORTING", "Export Findings", Command::Export),
];

/// Pure menu step: what `input` means at `level`.
pub fn transition(level: MenuLevel, input: &str) -> Step {
    let choice = input.trim().to_lowercase();
    if choice == QUIT_CHOICE {
        return Step::Exit;
    }
    if choice == BACK_CHOICE {
        return match level.parent() {
            Some(parent) => Step::Navigate(parent),
            None => Step::Exit,
        };
    }
    match level.entries().iter().find(|entry| entry.choice == choice) {
        Some(entry) => match entry.action {
            MenuAction::Enter(next) => Step::Navigate(next),
            MenuAction::Do(command) => Step::Perform(command),
        },
        None => Step::Invalid(format!("Invalid option: {}", input.trim())),
    }
}

/// Checks the tables against the catalog. Run once at startup.
pub fn validate_menu_tables(trace_id: &str) -> Result<(), AppError> {
    let mut problems = Vec::new();
    let mut reached_actions = HashSet::new();
    let mut reached_levels = HashSet::from([MenuLevel::Main]);

    for level in MenuLevel::ALL {
        let mut choices = HashSet::new();
        for entry in level.entries() {
            if !choices.insert(entry.choice) {
                problems.push(format!("{level:?}: duplicate choice {}", entry.choice));
            }
            if entry.choice == BACK_CHOICE || entry.choice == QUIT_CHOICE {
                problems.push(format!("{level:?}: choice {} is reserved", entry.choice));
            }
            match entry.action {
                MenuAction::Enter(next) => {
                    reached_levels.insert(next);
                }
                MenuAction::Do(Command::Run { action, preset }) => {
                    match catalog::find_action(action) {
                        Some(def) => {
                            reached_actions.insert(def.key);
                            if preset.len() > def.params.len() {
                                problems.push(format!(
                                    "{level:?}/{}: {action} takes {} argument(s)",
                                    entry.choice,
                                    def.params.len()
                                ));
                            }
                        }
                        None => problems.push(format!(
                            "{level:?}/{}: unknown action {action}",
                            entry.choice
                        )),
                    }
                }
                MenuAction::Do(_) => {}
            }
        }
    }

    for level in MenuLevel::ALL {
        if !reached_levels.contains(&level) {
            problems.push(format!("{level:?} is not reachable"));
        }
    }
    for action in ACTIONS {
        if !reached_actions.contains(action.key) {
            problems.push(format!("action {} has no menu entry", action.key));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(
            format!("Menu tables are inconsistent: {}", problems.join("; ")),
            trace_id,
        ))
    }
}

pub fn render_menu(level: MenuLevel, target_label: &str, palette: &Palette) -> String {
    let mut out = String::new();
    out.push_str(&palette.heading(level.title()));
    out.push('\n');
    out.push_str(&palette.dim(&format!("Target: {target_label}")));
    out.push('\n');

    let mut section = "";
    for entry in level.entries() {
        if entry.section != section {
            section = entry.section;
            out.push('\n');
            out.push_str(section);
            out.push_str(":\n");
        }
        out.push_str(&format!("[{:>3}]  {}\n", entry.choice, entry.label));
    }
    let back = if level.parent().is_some() {
        "Back to Objection menu"
    } else {
        "Exit"
    };
    out.push_str(&format!("\n[{BACK_CHOICE:>3}]  {back}\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_complete_and_consistent() {
        validate_menu_tables("t").expect("menu tables");
    }

    #[test]
    fn main_menu_navigates_and_back_exits() {
        assert_eq!(
            transition(MenuLevel::Main, " 2 "),
            Step::Navigate(MenuLevel::DataExploration)
        );
        assert_eq!(transition(MenuLevel::Main, "b"), Step::Exit);
        assert_eq!(transition(MenuLevel::DataExploration, "B"), Step::Navigate(MenuLevel::Main));
        assert_eq!(transition(MenuLevel::RuntimeAnalysis, "q"), Step::Exit);
    }

    #[test]
    fn choices_map_to_commands() {
        assert_eq!(
            transition(MenuLevel::SecurityBypasses, "5"),
            Step::Perform(Command::Run {
                action: "ssl-pinning-bypass",
                preset: &[]
            })
        );
        assert_eq!(
            transition(MenuLevel::SecurityBypasses, "14"),
            Step::Perform(Command::Suite {
                suite: Suite::SecurityBypasses
            })
        );
        assert_eq!(
            transition(MenuLevel::DataExploration, "13"),
            Step::Perform(Command::Run {
                action: "grep-search",
                preset: &["password"]
            })
        );
        assert_eq!(transition(MenuLevel::Main, "9"), Step::Perform(Command::VerifyTarget));
    }

    #[test]
    fn unknown_choice_is_invalid_not_fatal() {
        assert_eq!(
            transition(MenuLevel::Main, "42"),
            Step::Invalid("Invalid option: 42".to_string())
        );
    }

    #[test]
    fn rendering_groups_entries_by_section() {
        let text = render_menu(MenuLevel::NetworkMonitoring, "com.example.app", &Palette::plain());
        assert!(text.starts_with("NETWORK MONITORING\nTarget: com.example.app\n"));
        assert!(text.contains("\nPROXY CONFIGURATION:\n[  5]  Check Proxy Configuration\n"));
        assert!(text.ends_with("[  b]  Back to Objection menu\n"));
        let main = render_menu(MenuLevel::Main, "PID 7", &Palette::plain());
        assert!(main.ends_with("[  b]  Exit\n"));
    }
}
