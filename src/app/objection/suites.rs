use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

use crate::app::error::AppError;
use crate::app::objection::catalog;
use crate::app::objection::runner::CommandRunner;
use crate::app::process::Executor;
use crate::app::summary::SuiteEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SuiteStep {
    pub name: &'static str,
    pub action: &'static str,
    pub args: &'static [&'static str],
}

const fn step(name: &'static str, action: &'static str) -> SuiteStep {
    SuiteStep {
        name,
        action,
        args: &[],
    }
}

const fn step_with(
    name: &'static str,
    action: &'static str,
    args: &'static [&'static str],
) -> SuiteStep {
    SuiteStep { name, action, args }
}

const SECURITY_BYPASSES: &[SuiteStep] = &[
    step("Root Detection", "root-detection-bypass"),
    step("SSL Pinning", "ssl-pinning-bypass"),
    step("Anti-Debugging", "anti-debugging-bypass"),
    step("Biometric Auth", "biometric-bypass"),
];

const DATA_LEAKAGE: &[SuiteStep] = &[
    step("Shared Preferences", "shared-preferences-scan"),
    step("Database Analysis", "database-analysis"),
    step("Filesystem Scan", "filesystem-scan"),
    step("Keystore Analysis", "keystore-analysis"),
];

const BASIC_ASSESSMENT: &[SuiteStep] = &[
    step("Environment Info", "environment-info"),
    step("Root Status", "root-status"),
    step("SSL Pinning Status", "ssl-pinning-status"),
    step("Activities", "activities"),
    step("Permissions", "permissions"),
    step("Readable Directories", "filesystem-scan"),
];

const CRYPTO_ANALYSIS: &[SuiteStep] = &[
    step_with("Crypto Classes", "class-search", &["crypto"]),
    step_with("Encrypt Methods", "method-search", &["encrypt"]),
    step_with("Auth Methods", "method-search", &["auth"]),
    step_with("Network Classes", "class-search", &["network"]),
];

/// Fixed multi-test sequences. Steps run serially, one attempt each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Suite {
    SecurityBypasses,
    DataLeakage,
    BasicAssessment,
    CryptoAnalysis,
}

impl Suite {
    pub const ALL: [Suite; 4] = [
        Suite::SecurityBypasses,
        Suite::DataLeakage,
        Suite::BasicAssessment,
        Suite::CryptoAnalysis,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Suite::SecurityBypasses => "security-bypasses",
            Suite::DataLeakage => "data-leakage",
            Suite::BasicAssessment => "basic-assessment",
            Suite::CryptoAnalysis => "crypto-analysis",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Suite::SecurityBypasses => "Run All Security Bypasses",
            Suite::DataLeakage => "Data Leakage Check",
            Suite::BasicAssessment => "Basic Security Assessment",
            Suite::CryptoAnalysis => "Cryptography Analysis",
        }
    }

    pub fn steps(self) -> &'static [SuiteStep] {
        match self {
            Suite::SecurityBypasses => SECURITY_BYPASSES,
            Suite::DataLeakage => DATA_LEAKAGE,
            Suite::BasicAssessment => BASIC_ASSESSMENT,
            Suite::CryptoAnalysis => CRYPTO_ANALYSIS,
        }
    }
}

impl FromStr for Suite {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().replace('_', "-").to_lowercase();
        Suite::ALL
            .into_iter()
            .find(|suite| suite.key() == wanted)
            .ok_or_else(|| AppError::validation(format!("Unknown suite: {value}"), ""))
    }
}

/// Runs every step of `suite` in order. `on_step` fires before each step starts.
pub fn run_suite<E: Executor>(
    runner: &CommandRunner<E>,
    suite: Suite,
    trace_id: &str,
    mut on_step: impl FnMut(&SuiteStep),
) -> Vec<SuiteEntry> {
    info!(trace_id = %trace_id, suite = suite.key(), "Running suite");
    let target = runner.session().target();
    let mut entries = Vec::with_capacity(suite.steps().len());

    for step in suite.steps() {
        on_step(step);
        let args: Vec<String> = step.args.iter().map(|value| value.to_string()).collect();
        match catalog::resolve(step.action, target, &args, trace_id) {
            Ok(invocation) => {
                let outcome = runner.run(&invocation);
                entries.push(SuiteEntry::recorded(
                    step.name,
                    outcome.success,
                    &outcome.output_file,
                ));
            }
            Err(err) => {
                warn!(trace_id = %trace_id, step = step.name, error = %err, "Suite step rejected");
                entries.push(SuiteEntry::rejected(step.name, &err.error));
            }
        }
    }
    entries
}
