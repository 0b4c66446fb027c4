//! Named objection operations.
//!
//! Each entry maps a stable key to the command text, category, test name and
//! description it runs with. Parameterized entries build those from
//! positional arguments; missing optional arguments fall back to defaults.

use serde::Serialize;

use crate::app::error::AppError;
use crate::app::models::Category;
use crate::app::models::Category::{
    AdvancedTesting, ApplicationInfo, DataExploration, DynamicManipulation, NetworkMonitoring,
    QuickTests, RuntimeAnalysis, SecurityBypasses,
};
use crate::app::target::Target;

/// One concrete thing to hand to the command runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    pub command: String,
    pub category: Category,
    pub test_name: String,
    pub description: String,
}

impl Invocation {
    pub fn new(
        command: impl Into<String>,
        category: Category,
        test_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            category,
            test_name: test_name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: &'static str,
    pub prompt: &'static str,
    pub default: Option<&'static str>,
    pub required: bool,
}

const fn optional(name: &'static str, prompt: &'static str) -> Param {
    Param {
        name,
        prompt,
        default: None,
        required: false,
    }
}

const fn with_default(name: &'static str, prompt: &'static str, default: &'static str) -> Param {
    Param {
        name,
        prompt,
        default: Some(default),
        required: false,
    }
}

const fn required(name: &'static str, prompt: &'static str) -> Param {
    Param {
        name,
        prompt,
        default: None,
        required: true,
    }
}

/// Positional values after defaults have been applied.
#[derive(Debug, Clone, Default)]
pub struct ActionArgs {
    values: Vec<Option<String>>,
}

impl ActionArgs {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(|value| value.as_deref())
    }

    fn value(&self, index: usize) -> &str {
        self.get(index).unwrap_or_default()
    }
}

type Builder = fn(&ActionArgs, &Target, &str) -> Result<Invocation, AppError>;

#[derive(Clone, Copy)]
enum Template {
    Fixed {
        command: &'static str,
        test_name: &'static str,
        description: &'static str,
    },
    Built(Builder),
}

#[derive(Clone, Copy)]
pub struct ActionDef {
    pub key: &'static str,
    pub title: &'static str,
    pub category: Category,
    pub params: &'static [Param],
    template: Template,
}

impl std::fmt::Debug for ActionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDef")
            .field("key", &self.key)
            .field("category", &self.category)
            .finish()
    }
}

impl ActionDef {
    /// Listing text. Parameterized entries only know their description once built.
    pub fn summary(&self) -> &'static str {
        match self.template {
            Template::Fixed { description, .. } => description,
            Template::Built(_) => self.title,
        }
    }

    pub fn resolve_args(&self, raw: &[String], trace_id: &str) -> Result<ActionArgs, AppError> {
        if raw.len() > self.params.len() {
            return Err(AppError::validation(
                format!(
                    "{} takes at most {} argument(s), got {}",
                    self.key,
                    self.params.len(),
                    raw.len()
                ),
                trace_id,
            ));
        }
        let mut values = Vec::with_capacity(self.params.len());
        for (index, param) in self.params.iter().enumerate() {
            let given = raw
                .get(index)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            let value = given.or_else(|| param.default.map(str::to_string));
            if param.required && value.is_none() {
                return Err(AppError::validation(
                    format!("{} requires {}", self.key, param.name),
                    trace_id,
                ));
            }
            values.push(value);
        }
        Ok(ActionArgs { values })
    }

    pub fn invocation(
        &self,
        target: &Target,
        raw: &[String],
        trace_id: &str,
    ) -> Result<Invocation, AppError> {
        let args = self.resolve_args(raw, trace_id)?;
        match self.template {
            Template::Fixed {
                command,
                test_name,
                description,
            } => Ok(Invocation::new(command, self.category, test_name, description)),
            Template::Built(build) => {
                let mut invocation = build(&args, target, trace_id)?;
                invocation.category = self.category;
                Ok(invocation)
            }
        }
    }
}

/// Keeps parameter text usable inside a file name.
pub fn sanitize_name_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

fn require_package<'a>(target: &'a Target, key: &str, trace_id: &str) -> Result<&'a str, AppError> {
    target.package_name().ok_or_else(|| {
        AppError::validation(format!("{key} requires a package name target"), trace_id)
    })
}

const fn fixed(
    key: &'static str,
    title: &'static str,
    category: Category,
    command: &'static str,
    test_name: &'static str,
    description: &'static str,
) -> ActionDef {
    ActionDef {
        key,
        title,
        category,
        params: &[],
        template: Template::Fixed {
            command,
            test_name,
            description,
        },
    }
}

const fn built(
    key: &'static str,
    title: &'static str,
    category: Category,
    params: &'static [Param],
    build: Builder,
) -> ActionDef {
    ActionDef {
        key,
        title,
        category,
        params,
        template: Template::Built(build),
    }
}

fn method_enumeration(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    Ok(match args.get(0) {
        Some(class) => Invocation::new(
            format!("android hooking list methods {class}"),
            Category::RuntimeAnalysis,
            "method_enumeration",
            format!("List methods for class: {class}"),
        ),
        None => Invocation::new(
            "android hooking list methods",
            Category::RuntimeAnalysis,
            "method_enumeration",
            "List methods for all classes",
        ),
    })
}

fn class_search(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let pattern = args.value(0);
    Ok(Invocation::new(
        format!("android hooking search classes {pattern}"),
        Category::RuntimeAnalysis,
        format!("class_search_{}", sanitize_name_component(pattern)),
        format!("Search classes containing: {pattern}"),
    ))
}

fn method_search(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let pattern = args.value(0);
    Ok(Invocation::new(
        format!("android hooking search methods {pattern}"),
        Category::RuntimeAnalysis,
        format!("method_search_{}", sanitize_name_component(pattern)),
        format!("Search methods containing: {pattern}"),
    ))
}

fn hook_class(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let class = args.value(0);
    Ok(Invocation::new(
        format!("android hooking watch class {class}"),
        Category::RuntimeAnalysis,
        format!("hook_class_{}", sanitize_name_component(class)),
        format!("Hook all methods in class: {class}"),
    ))
}

fn hook_method(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let (class, method) = (args.value(0), args.value(1));
    Ok(Invocation::new(
        format!("android hooking watch method {class}.{method}"),
        Category::RuntimeAnalysis,
        format!(
            "hook_method_{}_{}",
            sanitize_name_component(class),
            sanitize_name_component(method)
        ),
        format!("Hook method: {class}.{method}"),
    ))
}

fn heap_search(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let pattern = args.value(0);
    Ok(Invocation::new(
        format!("android heap search instances {pattern}"),
        Category::RuntimeAnalysis,
        format!("heap_search_{}", sanitize_name_component(pattern)),
        format!("Search heap for instances of: {pattern}"),
    ))
}

fn file_download(args: &ActionArgs, target: &Target, _: &str) -> Result<Invocation, AppError> {
    let path = match args.get(0) {
        Some(path) => path.to_string(),
        None => format!(
            "/data/data/{}/shared_prefs",
            target.package_name().unwrap_or("unknown")
        ),
    };
    Ok(Invocation::new(
        format!("file download {path}"),
        Category::DataExploration,
        "file_download",
        format!("Download file: {path}"),
    ))
}

fn grep_search(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let pattern = args.value(0);
    Ok(Invocation::new(
        format!("file grep {pattern}"),
        Category::DataExploration,
        format!("grep_search_{}", sanitize_name_component(pattern)),
        format!("Search for pattern: {pattern}"),
    ))
}

fn proxy_set(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let (host, port) = (args.value(0), args.value(1));
    Ok(Invocation::new(
        format!("android proxy set {host} {port}"),
        Category::NetworkMonitoring,
        "proxy_set",
        format!("Set proxy to {host}:{port}"),
    ))
}

fn package_info(_: &ActionArgs, target: &Target, _: &str) -> Result<Invocation, AppError> {
    let command = match target.package_name() {
        Some(package) => format!("android package info {package}"),
        None => "android package info".to_string(),
    };
    Ok(Invocation::new(
        command,
        Category::ApplicationInfo,
        "package_information",
        "Get detailed package information and metadata",
    ))
}

fn method_override(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let (class, method, value) = (args.value(0), args.value(1), args.value(2));
    Ok(Invocation::new(
        format!("android hooking set return_value {class}.{method} {value}"),
        Category::DynamicManipulation,
        format!(
            "method_override_{}_{}",
            sanitize_name_component(class),
            sanitize_name_component(method)
        ),
        format!("Override {class}.{method} to return {value}"),
    ))
}

fn spawn_app(_: &ActionArgs, target: &Target, trace_id: &str) -> Result<Invocation, AppError> {
    let package = require_package(target, "spawn-app", trace_id)?;
    Ok(Invocation::new(
        format!("android spawn {package}"),
        Category::DynamicManipulation,
        "spawn_app",
        format!("Spawn application: {package}"),
    ))
}

fn kill_app(_: &ActionArgs, target: &Target, trace_id: &str) -> Result<Invocation, AppError> {
    let package = require_package(target, "kill-app", trace_id)?;
    Ok(Invocation::new(
        format!("android kill {package}"),
        Category::DynamicManipulation,
        "kill_app",
        format!("Kill application: {package}"),
    ))
}

fn memory_dump(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    Ok(match args.get(0) {
        Some(module) => Invocation::new(
            format!("memory dump {module}"),
            Category::DynamicManipulation,
            "memory_dump",
            format!("Dump memory for module: {module}"),
        ),
        None => Invocation::new(
            "memory dump all",
            Category::DynamicManipulation,
            "memory_dump",
            "Dump all accessible memory",
        ),
    })
}

fn custom_command(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let command = args.value(0);
    Ok(Invocation::new(
        command,
        Category::AdvancedTesting,
        "custom_command",
        format!("Custom command: {command}"),
    ))
}

fn import_script(args: &ActionArgs, _: &Target, _: &str) -> Result<Invocation, AppError> {
    let path = args.value(0);
    let stem = std::path::Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    Ok(Invocation::new(
        format!("import {path}"),
        Category::AdvancedTesting,
        format!("import_script_{}", sanitize_name_component(&stem)),
        format!("Load custom Frida script: {path}"),
    ))
}

const FILE_DOWNLOAD_PARAMS: &[Param] = &[optional(
    "path",
    "File path to download (Enter for the app's shared_prefs)",
)];
const GREP_PARAMS: &[Param] = &[with_default("pattern", "Search pattern", "password")];
const METHOD_LIST_PARAMS: &[Param] = &[optional("class", "Class name (Enter for all)")];
const CLASS_SEARCH_PARAMS: &[Param] = &[with_default("pattern", "Class search pattern", "crypto")];
const METHOD_SEARCH_PARAMS: &[Param] =
    &[with_default("pattern", "Method search pattern", "encrypt")];
const HOOK_CLASS_PARAMS: &[Param] = &[required("class", "Class name to hook")];
const HOOK_METHOD_PARAMS: &[Param] = &[
    required("class", "Class name"),
    required("method", "Method name"),
];
const HEAP_SEARCH_PARAMS: &[Param] = &[with_default("pattern", "Heap search pattern", "String")];
const PROXY_PARAMS: &[Param] = &[
    with_default("host", "Proxy host", "127.0.0.1"),
    with_default("port", "Proxy port", "8080"),
];
const OVERRIDE_PARAMS: &[Param] = &[
    required("class", "Class name"),
    required("method", "Method name"),
    with_default("value", "Return value", "true"),
];
const MEMORY_DUMP_PARAMS: &[Param] = &[optional("module", "Module name (Enter for all)")];
const CUSTOM_COMMAND_PARAMS: &[Param] = &[required("command", "Objection command to run")];
const SCRIPT_PARAMS: &[Param] = &[required("path", "Script path")];

pub static ACTIONS: &[ActionDef] = &[
    // Security bypasses
    fixed(
        "root-detection-check",
        "Check Root Status",
        SecurityBypasses,
        "android root status",
        "root_detection_check",
        "Check current root detection status",
    ),
    fixed(
        "root-detection-bypass",
        "Root Detection Bypass",
        SecurityBypasses,
        "android root disable",
        "root_detection_bypass",
        "Disable root detection mechanisms in the application",
    ),
    fixed(
        "root-simulate",
        "Simulate Root Environment",
        SecurityBypasses,
        "android root simulate",
        "root_simulation",
        "Simulate root environment for testing",
    ),
    fixed(
        "ssl-pinning-check",
        "Check SSL Pinning",
        SecurityBypasses,
        "android sslpinning list",
        "ssl_pinning_check",
        "Check current SSL pinning implementation",
    ),
    fixed(
        "ssl-pinning-bypass",
        "SSL Pinning Bypass",
        SecurityBypasses,
        "android sslpinning disable",
        "ssl_pinning_bypass",
        "Disable SSL certificate pinning to allow traffic interception",
    ),
    fixed(
        "ssl-kill-switch",
        "SSL Kill Switch",
        SecurityBypasses,
        "android sslpinning disable --all",
        "ssl_kill_switch",
        "Disable all SSL pinning mechanisms",
    ),
    fixed(
        "cert-transparency-bypass",
        "Certificate Transparency Bypass",
        SecurityBypasses,
        "android certificate_transparency disable",
        "cert_transparency_bypass",
        "Bypass certificate transparency validation",
    ),
    fixed(
        "debugger-detection-check",
        "Check Debugger Detection",
        SecurityBypasses,
        "android anti_debugging list",
        "debugger_detection_check",
        "Check anti-debugging mechanisms in place",
    ),
    fixed(
        "anti-debugging-bypass",
        "Anti-Debugging Bypass",
        SecurityBypasses,
        "android hooking disable",
        "anti_debugging_bypass",
        "Disable anti-debugging protection mechanisms",
    ),
    fixed(
        "frida-detection-bypass",
        "Frida Detection Bypass",
        SecurityBypasses,
        "android frida_detection disable",
        "frida_detection_bypass",
        "Bypass Frida detection mechanisms",
    ),
    fixed(
        "hook-detection-bypass",
        "Hook Detection Bypass",
        SecurityBypasses,
        "android hook_detection disable",
        "hook_detection_bypass",
        "Bypass runtime hook detection",
    ),
    fixed(
        "emulator-detection-check",
        "Emulator Detection Check",
        SecurityBypasses,
        "android emulator status",
        "emulator_detection_check",
        "Check emulator detection mechanisms",
    ),
    fixed(
        "biometric-bypass",
        "Biometric Authentication Bypass",
        SecurityBypasses,
        "android biometrics disable",
        "biometric_bypass",
        "Bypass fingerprint and face authentication",
    ),
    // Data exploration
    fixed(
        "filesystem-scan",
        "File System Scan",
        DataExploration,
        "android filesystem readable",
        "filesystem_scan",
        "Scan for readable and writable directories in the application",
    ),
    fixed(
        "file-listing",
        "Detailed File Listing",
        DataExploration,
        "file ls -la",
        "file_listing_detailed",
        "Detailed file system listing with permissions",
    ),
    fixed(
        "find-sensitive-files",
        "Find Sensitive Files",
        DataExploration,
        "file find . -name '*.key' -o -name '*.p12' -o -name '*.jks' -o -name '*.keystore'",
        "find_sensitive_files",
        "Find sensitive files (keys, certificates, keystores)",
    ),
    built("file-download", "Download File", DataExploration, FILE_DOWNLOAD_PARAMS, file_download),
    built("grep-search", "Search File Contents", DataExploration, GREP_PARAMS, grep_search),
    fixed(
        "database-analysis",
        "Database Analysis",
        DataExploration,
        "sqlite list",
        "database_analysis",
        "List and analyze SQLite databases used by the application",
    ),
    fixed(
        "database-dump",
        "Database Dump",
        DataExploration,
        "sqlite sync",
        "database_dump_all",
        "Synchronize and dump all database contents",
    ),
    fixed(
        "shared-preferences-scan",
        "Shared Preferences Scan",
        DataExploration,
        "android preferences list",
        "shared_preferences_scan",
        "List all shared preference files and their contents",
    ),
    fixed(
        "shared-preferences-dump",
        "Shared Preferences Dump",
        DataExploration,
        "android preferences list --verbose",
        "shared_prefs_dump",
        "Dump all shared preferences with values",
    ),
    fixed(
        "keystore-analysis",
        "Keystore Analysis",
        DataExploration,
        "android keystore list",
        "keystore_analysis",
        "Analyze Android keystore entries and certificates",
    ),
    fixed(
        "keystore-dump",
        "Keystore Dump",
        DataExploration,
        "android keystore list --verbose",
        "keystore_dump",
        "Dump keystore entries and certificates",
    ),
    // Runtime analysis
    fixed(
        "class-enumeration",
        "Class Enumeration",
        RuntimeAnalysis,
        "android hooking list classes",
        "class_enumeration",
        "List all loaded classes in the application",
    ),
    built(
        "method-enumeration",
        "Method Enumeration",
        RuntimeAnalysis,
        METHOD_LIST_PARAMS,
        method_enumeration,
    ),
    built("class-search", "Class Search", RuntimeAnalysis, CLASS_SEARCH_PARAMS, class_search),
    built("method-search", "Method Search", RuntimeAnalysis, METHOD_SEARCH_PARAMS, method_search),
    built("hook-class", "Hook Class", RuntimeAnalysis, HOOK_CLASS_PARAMS, hook_class),
    built("hook-method", "Hook Method", RuntimeAnalysis, HOOK_METHOD_PARAMS, hook_method),
    fixed(
        "intent-monitoring",
        "Intent Monitoring",
        RuntimeAnalysis,
        "android intent monitor start",
        "intent_monitoring",
        "Monitor and log application intents",
    ),
    fixed(
        "thread-list",
        "Thread List",
        RuntimeAnalysis,
        "jobs list",
        "thread_list",
        "List active threads and jobs",
    ),
    fixed(
        "memory-analysis",
        "Memory Analysis",
        RuntimeAnalysis,
        "memory list modules",
        "memory_analysis",
        "List loaded modules and analyze memory usage",
    ),
    fixed(
        "loaded-libraries",
        "Loaded Libraries",
        RuntimeAnalysis,
        "memory list modules",
        "loaded_libraries",
        "List all loaded libraries and modules",
    ),
    built("heap-search", "Heap Search", RuntimeAnalysis, HEAP_SEARCH_PARAMS, heap_search),
    // Network monitoring
    fixed(
        "http-monitoring",
        "HTTP/HTTPS Monitoring",
        NetworkMonitoring,
        "android http start",
        "http_monitoring",
        "Start monitoring HTTP/HTTPS traffic",
    ),
    fixed(
        "http-capture-start",
        "Start HTTP Capture",
        NetworkMonitoring,
        "android http capture start",
        "http_capture_start",
        "Start capturing HTTP/HTTPS traffic",
    ),
    fixed(
        "http-capture-stop",
        "Stop HTTP Capture",
        NetworkMonitoring,
        "android http capture stop",
        "http_capture_stop",
        "Stop capturing HTTP/HTTPS traffic",
    ),
    fixed(
        "network-monitor",
        "Network Monitor",
        NetworkMonitoring,
        "android network monitor",
        "network_monitor",
        "Monitor active network connections",
    ),
    fixed(
        "proxy-status",
        "Check Proxy Configuration",
        NetworkMonitoring,
        "android proxy status",
        "proxy_configuration",
        "Check current proxy configuration and settings",
    ),
    built("proxy-set", "Set Proxy", NetworkMonitoring, PROXY_PARAMS, proxy_set),
    fixed(
        "proxy-clear",
        "Clear Proxy",
        NetworkMonitoring,
        "android proxy clear",
        "proxy_clear",
        "Clear proxy configuration",
    ),
    fixed(
        "network-interfaces",
        "Network Interfaces",
        NetworkMonitoring,
        "android network interfaces",
        "network_interfaces",
        "List network interfaces and configuration",
    ),
    // Application information
    fixed(
        "activities",
        "Activities Enumeration",
        ApplicationInfo,
        "android activities list",
        "activities_enumeration",
        "List all application activities and their properties",
    ),
    fixed(
        "services",
        "Services Enumeration",
        ApplicationInfo,
        "android services list",
        "services_enumeration",
        "List all application services and their status",
    ),
    fixed(
        "providers",
        "Content Providers",
        ApplicationInfo,
        "android providers list",
        "providers_list",
        "List content providers",
    ),
    fixed(
        "receivers",
        "Broadcast Receivers",
        ApplicationInfo,
        "android receivers list",
        "receivers_list",
        "List broadcast receivers",
    ),
    fixed(
        "intent-filters",
        "Intent Filters",
        ApplicationInfo,
        "android intent filters",
        "intent_filters",
        "List intent filters",
    ),
    fixed(
        "permissions",
        "Permissions Analysis",
        ApplicationInfo,
        "android permissions list",
        "permissions_analysis",
        "Analyze application permissions and their usage",
    ),
    built("package-info", "Package Information", ApplicationInfo, &[], package_info),
    fixed(
        "app-signature",
        "Application Signature",
        ApplicationInfo,
        "android signature info",
        "app_signature",
        "Get application signature information",
    ),
    fixed(
        "app-environment",
        "Application Environment",
        ApplicationInfo,
        "env",
        "app_environment",
        "Get application environment variables",
    ),
    fixed(
        "device-info",
        "Device Information",
        ApplicationInfo,
        "android device info",
        "device_info",
        "Get detailed device information",
    ),
    // Dynamic manipulation
    built(
        "method-override",
        "Override Method Return",
        DynamicManipulation,
        OVERRIDE_PARAMS,
        method_override,
    ),
    built("spawn-app", "Spawn Application", DynamicManipulation, &[], spawn_app),
    built("kill-app", "Kill Application", DynamicManipulation, &[], kill_app),
    built("memory-dump", "Memory Dump", DynamicManipulation, MEMORY_DUMP_PARAMS, memory_dump),
    // Advanced testing
    built(
        "custom-command",
        "Custom Objection Command",
        AdvancedTesting,
        CUSTOM_COMMAND_PARAMS,
        custom_command,
    ),
    built(
        "import-script",
        "Load Custom Frida Script",
        AdvancedTesting,
        SCRIPT_PARAMS,
        import_script,
    ),
    // Quick tests
    fixed(
        "environment-info",
        "Environment Info",
        QuickTests,
        "env",
        "environment_info",
        "Get environment information",
    ),
    fixed(
        "root-status",
        "Root Status",
        QuickTests,
        "android root status",
        "root_status",
        "Check root status",
    ),
    fixed(
        "ssl-pinning-status",
        "SSL Pinning Status",
        QuickTests,
        "android sslpinning list",
        "ssl_pinning_status",
        "Check SSL pinning implementation",
    ),
];

pub fn find_action(key: &str) -> Option<&'static ActionDef> {
    let wanted = key.trim().replace('_', "-").to_lowercase();
    ACTIONS.iter().find(|action| action.key == wanted)
}

pub fn lookup(key: &str, trace_id: &str) -> Result<&'static ActionDef, AppError> {
    find_action(key)
        .ok_or_else(|| AppError::validation(format!("Unknown action: {key}"), trace_id))
}

/// Resolves a key plus positional arguments into an invocation for `target`.
pub fn resolve(
    key: &str,
    target: &Target,
    args: &[String],
    trace_id: &str,
) -> Result<Invocation, AppError> {
    lookup(key, trace_id)?.invocation(target, args, trace_id)
}

pub fn actions_in(category: Category) -> impl Iterator<Item = &'static ActionDef> {
    ACTIONS.iter().filter(move |action| action.category == category)
}
