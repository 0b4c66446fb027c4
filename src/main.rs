use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use droid_orchestrator::app::adb::locator::validate_program;
use droid_orchestrator::app::config::{
    load_config, load_config_from_path, save_config, save_config_to_path, AppConfig,
};
use droid_orchestrator::app::export::export_session_bundle;
use droid_orchestrator::app::logging::init_logging;
use droid_orchestrator::app::menu::{
    render_menu, transition, validate_menu_tables, Command, MenuLevel, Step,
};
use droid_orchestrator::app::models::{Category, InvocationOutcome};
use droid_orchestrator::app::objection::catalog::{self, Param, ACTIONS};
use droid_orchestrator::app::objection::runner::CommandRunner;
use droid_orchestrator::app::objection::suites::{run_suite, Suite};
use droid_orchestrator::app::presentation::Palette;
use droid_orchestrator::app::readiness::Readiness;
use droid_orchestrator::app::session::Session;
use droid_orchestrator::app::summary::TestSummary;
use droid_orchestrator::app::target::{session_dir_name, target_label, Target};

#[derive(Parser, Debug)]
#[command(name = "droid-orchestrator")]
#[command(about = "Drive objection against an Android app and keep every result on disk")]
#[command(version)]
struct Cli {
    /// Target package name
    #[arg(short = 'p', long, global = true, conflicts_with = "pid")]
    package: Option<String>,

    /// Target process id
    #[arg(long, global = true)]
    pid: Option<u32>,

    /// Device serial, for when more than one device is attached
    #[arg(short = 'S', long, global = true)]
    device: Option<String>,

    /// Base directory for session reports
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Per-command timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[arg(long, global = true)]
    no_color: bool,

    /// Machine readable output
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Full readiness diagnostics
    Check,
    /// Is the target process running
    Verify,
    /// List catalog actions
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Run one catalog action
    Run {
        action: String,
        /// Positional parameters; empty strings take the default
        args: Vec<String>,
    },
    /// Run a fixed sequence of actions
    Suite { name: String },
    /// Zip the session's reports
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the effective config, optionally writing it back
    Config {
        #[arg(long)]
        write: bool,
    },
    /// Interactive menus (default)
    Menu,
}

#[derive(Serialize)]
struct ListedAction {
    key: &'static str,
    title: &'static str,
    category: Category,
    summary: &'static str,
    params: &'static [Param],
}

struct App {
    trace_id: String,
    palette: Palette,
    json: bool,
    config: AppConfig,
    config_path: Option<PathBuf>,
    objection: String,
    adb: String,
    base_dir: PathBuf,
    target: Option<Target>,
    device: Option<String>,
    command_timeout: Duration,
    readiness_timeout: Duration,
}

impl App {
    fn from_cli(cli: &Cli, trace_id: String) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from_path(path, &trace_id)?,
            None => load_config(&trace_id)?,
        };
        init_logging(&config.logging.log_level);

        let device = cli.device.clone().filter(|value| !value.trim().is_empty());
        let target = match (&cli.package, cli.pid) {
            (Some(package), _) => Some(Target::package(
                package.as_str(),
                device.clone(),
                &trace_id,
            )?),
            (None, Some(pid)) => Some(Target::process(pid, device.clone(), &trace_id)?),
            (None, None) => None,
        };

        let objection = config.tools.objection_program();
        let adb = config.tools.adb_program();
        for (program, label) in [(&objection, "objection"), (&adb, "adb")] {
            if let Err(message) = validate_program(program, label) {
                warn!(
                    trace_id = %trace_id,
                    program = %program,
                    error = %message,
                    "Program validation failed"
                );
            }
        }

        let command_timeout = cli
            .timeout
            .filter(|secs| *secs > 0)
            .unwrap_or(config.command.command_timeout_secs);
        let readiness_timeout = config.command.readiness_timeout_secs;
        let base_dir = cli
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&config.output.base_dir));

        Ok(Self {
            trace_id,
            palette: Palette::new(config.ui.color && !cli.no_color),
            json: cli.json,
            config_path: cli.config.clone(),
            config,
            objection,
            adb,
            base_dir,
            target,
            device,
            command_timeout: Duration::from_secs(command_timeout),
            readiness_timeout: Duration::from_secs(readiness_timeout),
        })
    }

    fn target(&self) -> Result<&Target> {
        self.target
            .as_ref()
            .ok_or_else(|| anyhow!("--package or --pid is required for this command"))
    }

    fn readiness(&self) -> Readiness {
        let readiness = Readiness::new(self.objection.as_str(), self.adb.as_str())
            .with_device(self.device.clone())
            .with_timeout(self.readiness_timeout);
        match &self.target {
            Some(target) => readiness.with_target(target),
            None => readiness,
        }
    }

    fn runner(&self) -> Result<CommandRunner> {
        let session = Session::initialize(&self.base_dir, self.target()?.clone(), &self.trace_id)?;
        Ok(CommandRunner::new(self.objection.as_str(), session).with_timeout(self.command_timeout))
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print!("{}", text());
        }
        Ok(())
    }

    fn outcome_line(&self, title: &str, outcome: &InvocationOutcome) -> String {
        let mut line = format!(
            "{} {title} finished (return code {}). Output: {}\n",
            self.palette.status_marker(outcome.success),
            outcome.return_code,
            outcome.output_file.display()
        );
        if let Some(err) = &outcome.report_error {
            line.push_str(&self.palette.warn(&format!("Report was not written: {err}")));
            line.push('\n');
        }
        line
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let app = App::from_cli(&cli, Uuid::new_v4().to_string())?;
    validate_menu_tables(&app.trace_id)?;
    info!(trace_id = %app.trace_id, "droid-orchestrator starting");

    match cli.command.unwrap_or(CliCommand::Menu) {
        CliCommand::Check => {
            let dir = app
                .base_dir
                .join(session_dir_name(app.target.as_ref().map(|target| &target.id)));
            let report = app.readiness().diagnose(&dir, &app.trace_id);
            app.emit(&report, || report.render(&app.palette))?;
            Ok(exit_for(report.ready))
        }
        CliCommand::Verify => {
            app.target()?;
            let result = app.readiness().verify_target_running(&app.trace_id);
            app.emit(&result, || {
                format!("{} {}\n", app.palette.status_marker(result.ok), result.message)
            })?;
            Ok(exit_for(result.ok))
        }
        CliCommand::List { category } => {
            let filter = category.as_deref().map(Category::from_str).transpose()?;
            let listed: Vec<ListedAction> = ACTIONS
                .iter()
                .filter(|action| filter.map_or(true, |wanted| action.category == wanted))
                .map(|action| ListedAction {
                    key: action.key,
                    title: action.title,
                    category: action.category,
                    summary: action.summary(),
                    params: action.params,
                })
                .collect();
            app.emit(&listed, || render_listing(&listed, &app.palette))?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Run { action, args } => {
            let runner = app.runner()?;
            let invocation =
                catalog::resolve(&action, runner.session().target(), &args, &app.trace_id)?;
            let outcome = runner.run(&invocation);
            app.emit(&outcome, || app.outcome_line(&invocation.test_name, &outcome))?;
            Ok(exit_for(outcome.success))
        }
        CliCommand::Suite { name } => {
            let suite = Suite::from_str(&name)?;
            let runner = app.runner()?;
            let summary = run_suite_with_progress(&app, &runner, suite);
            app.emit(&summary, || summary.render(&app.palette))?;
            Ok(exit_for(summary.failed == 0))
        }
        CliCommand::Export { out } => {
            let session = Session::initialize(&app.base_dir, app.target()?.clone(), &app.trace_id)?;
            let bundle = export_session_bundle(&session, out.as_deref(), &app.trace_id)?;
            app.emit(&bundle, || format!("Session exported to {}\n", bundle.display()))?;
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Config { write } => {
            if write {
                match &app.config_path {
                    Some(path) => save_config_to_path(
                        &app.config,
                        path,
                        &path.with_extension("backup.json"),
                        &app.trace_id,
                    )?,
                    None => save_config(&app.config, &app.trace_id)?,
                }
            }
            let text = serde_json::to_string_pretty(&app.config)?;
            println!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        CliCommand::Menu => {
            let runner = app.runner()?;
            run_menu(&app, &runner)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn render_listing(listed: &[ListedAction], palette: &Palette) -> String {
    let mut out = String::new();
    let mut current: Option<Category> = None;
    for action in listed {
        if current != Some(action.category) {
            current = Some(action.category);
            out.push_str(&format!("\n{}\n", palette.heading(action.category.title())));
        }
        let params: Vec<String> = action
            .params
            .iter()
            .map(|param| {
                if param.required {
                    format!("<{}>", param.name)
                } else {
                    format!("[{}]", param.name)
                }
            })
            .collect();
        out.push_str(&format!(
            "  {:<28} {:<22} {}\n",
            action.key,
            params.join(" "),
            palette.dim(action.summary)
        ));
    }
    out
}

fn run_suite_with_progress(app: &App, runner: &CommandRunner, suite: Suite) -> TestSummary {
    if !app.json {
        println!("{}", app.palette.heading(suite.title()));
    }
    let entries = run_suite(runner, suite, &app.trace_id, |step| {
        eprintln!("Running {}...", step.name);
    });
    TestSummary::new(entries, runner.session().root())
}

/// `None` on end of input.
fn prompt(text: &str) -> Result<Option<String>> {
    print!("{text}");
    io::stdout().flush().context("flush stdout")?;
    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line).context("read stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt_params(params: &[Param]) -> Result<Option<Vec<String>>> {
    let mut values = Vec::with_capacity(params.len());
    for param in params {
        let text = match param.default {
            Some(default) => format!("{} (default: {default}): ", param.prompt),
            None => format!("{}: ", param.prompt),
        };
        match prompt(&text)? {
            Some(value) => values.push(value),
            None => return Ok(None),
        }
    }
    Ok(Some(values))
}

fn run_menu(app: &App, runner: &CommandRunner) -> Result<()> {
    let label = target_label(Some(&runner.session().target().id));
    let mut level = MenuLevel::Main;
    loop {
        println!("\n{}", render_menu(level, &label, &app.palette));
        let Some(input) = prompt("Select option: ")? else {
            return Ok(());
        };
        match transition(level, &input) {
            Step::Navigate(next) => level = next,
            Step::Exit => return Ok(()),
            Step::Invalid(message) => println!("{}", app.palette.fail(&message)),
            Step::Perform(command) => {
                if !perform(app, runner, command)? {
                    return Ok(());
                }
            }
        }
    }
}

/// Returns `false` when input ended mid-prompt.
fn perform(app: &App, runner: &CommandRunner, command: Command) -> Result<bool> {
    match command {
        Command::Run { action, preset } => {
            let def = catalog::lookup(action, &app.trace_id)?;
            let raw = if preset.is_empty() {
                match prompt_params(def.params)? {
                    Some(values) => values,
                    None => return Ok(false),
                }
            } else {
                preset.iter().map(|value| value.to_string()).collect()
            };
            match def.invocation(runner.session().target(), &raw, &app.trace_id) {
                Ok(invocation) => {
                    let outcome = runner.run(&invocation);
                    print!("{}", app.outcome_line(def.title, &outcome));
                }
                Err(err) => println!("{}", app.palette.fail(&err.error)),
            }
        }
        Command::Suite { suite } => {
            let summary = run_suite_with_progress(app, runner, suite);
            print!("{}", summary.render(&app.palette));
        }
        Command::VerifyTarget => {
            let result = app.readiness().verify_target_running(&app.trace_id);
            println!(
                "Target verification: {} {}",
                app.palette.status_marker(result.ok),
                result.message
            );
        }
        Command::Diagnostics => {
            let report = app.readiness().diagnose(runner.session().root(), &app.trace_id);
            print!("{}", report.render(&app.palette));
        }
        Command::Export => match export_session_bundle(runner.session(), None, &app.trace_id) {
            Ok(bundle) => println!("Session exported to {}", bundle.display()),
            Err(err) => println!("{}", app.palette.fail(&err.to_string())),
        },
    }
    Ok(prompt("\nPress Enter to continue...")?.is_some())
}
