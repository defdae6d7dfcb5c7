// crates/pramana-cli/src/main.rs
// ============================================================================
// Module: Pramana CLI Entry Point
// Description: Command dispatcher for eval runs and submission workflows.
// Purpose: Provide the operator surface over suites, providers, and results.
// Dependencies: clap, pramana-config, pramana-core, pramana-providers, tokio
// ============================================================================

//! ## Overview
//! The Pramana CLI resolves a model to a provider, executes a content-hashed
//! suite against it, and prints or submits the sealed run record. Commands
//! that touch credentials (`login`, `logout`, `whoami`) operate on the user
//! config file; the suite and record paths never carry secrets.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod submit;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use pramana_config::UserConfig;
use pramana_core::CancelToken;
use pramana_core::EvalRunner;
use pramana_core::ProviderMode;
use pramana_core::RunResult;
use pramana_core::RunnerConfig;
use pramana_core::SuiteStore;
use pramana_core::SuiteTier;
use pramana_providers::EnvSnapshot;
use pramana_providers::ExplicitKeyProbe;
use pramana_providers::ModeSelection;
use pramana_providers::ProviderRegistry;
use pramana_providers::SystemProbe;
use pramana_providers::known_models;
use pramana_providers::resolve_model;
use thiserror::Error;

use crate::submit::SubmissionClient;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default suite version loaded when none is requested.
const DEFAULT_SUITE_VERSION: &str = "v1";

/// Default suite store root when neither flag nor config provides one.
const DEFAULT_SUITES_DIR: &str = "suites";

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Top-level argument parser.
#[derive(Parser, Debug)]
#[command(name = "pramana", version, disable_help_subcommand = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a suite against a model and print the sealed record.
    Run(RunCommand),
    /// List known model identifiers and current provider availability.
    Models(ConfigPathArg),
    /// Submit a previously saved run record.
    Submit(SubmitCommand),
    /// Store a submission token in the user config.
    Login(LoginCommand),
    /// Remove the stored submission token.
    Logout(ConfigPathArg),
    /// Show the active submission identity.
    Whoami(ConfigPathArg),
    /// Show or update the effective user config.
    Config(ConfigCommand),
}

/// Arguments for the `run` command.
#[derive(Args, Debug)]
struct RunCommand {
    /// Model identifier (e.g. `claude-sonnet-4-5`, `gpt-4o`).
    #[arg(value_name = "MODEL")]
    model: String,
    /// Suite tier to execute.
    #[arg(long, value_name = "TIER", default_value = "cheap", value_parser = parse_tier)]
    suite: SuiteTier,
    /// Suite version directory to load.
    #[arg(long, value_name = "VERSION", default_value = DEFAULT_SUITE_VERSION)]
    suite_version: String,
    /// Suite store root (overrides the config `suites_dir`).
    #[arg(long, value_name = "DIR")]
    suites_dir: Option<PathBuf>,
    /// Output file for the sealed record JSON.
    #[arg(long, value_name = "PATH", default_value = "results.json")]
    output: PathBuf,
    /// Force api mode.
    #[arg(long, action = ArgAction::SetTrue)]
    api: bool,
    /// Force subscription mode.
    #[arg(long, action = ArgAction::SetTrue)]
    subscription: bool,
    /// Explicit API key (implies api mode).
    #[arg(long, value_name = "KEY", conflicts_with = "subscription")]
    api_key: Option<String>,
    /// Sampling temperature.
    #[arg(long, value_name = "TEMP", default_value_t = 0.0)]
    temperature: f64,
    /// Sampling seed.
    #[arg(long, value_name = "SEED", default_value_t = 42)]
    seed: u64,
    /// Maximum concurrent provider calls.
    #[arg(long, value_name = "N", default_value_t = 4)]
    concurrency: usize,
    /// Per-case provider call deadline, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 60_000)]
    case_timeout_ms: u64,
    /// Whole-run deadline, in milliseconds.
    #[arg(long, value_name = "MS")]
    run_timeout_ms: Option<u64>,
    /// Submit the record after the run completes.
    #[arg(long, action = ArgAction::SetTrue)]
    submit: bool,
    /// Save locally without submitting.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "submit")]
    offline: bool,
    /// Print the full record as JSON instead of a summary.
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Config file path override.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `config` command.
#[derive(Args, Debug)]
struct ConfigCommand {
    /// Persist api as the preferred provider mode.
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "prefer_subscription")]
    prefer_api: bool,
    /// Persist subscription as the preferred provider mode.
    #[arg(long, action = ArgAction::SetTrue)]
    prefer_subscription: bool,
    /// Print the effective config (the default when no setter is given).
    #[arg(long, action = ArgAction::SetTrue)]
    show: bool,
    /// Config file path override.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `submit` command.
#[derive(Args, Debug)]
struct SubmitCommand {
    /// Path to a saved run record JSON file.
    #[arg(value_name = "RECORD")]
    record: PathBuf,
    /// Config file path override.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `login` command.
#[derive(Args, Debug)]
struct LoginCommand {
    /// Submission bearer token.
    #[arg(long, value_name = "TOKEN")]
    token: String,
    /// Config file path override.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Shared config-path argument for credential and listing commands.
#[derive(Args, Debug)]
struct ConfigPathArg {
    /// Config file path override.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Parses a suite tier label for clap.
fn parse_tier(value: &str) -> Result<SuiteTier, String> {
    SuiteTier::parse(value)
        .ok_or_else(|| format!("unknown tier `{value}` (expected cheap, moderate, comprehensive)"))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }

    /// Wraps any displayable error.
    fn from_err(err: impl std::fmt::Display) -> Self {
        Self::new(err.to_string())
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(command) => command_run(command).await,
        Commands::Models(command) => command_models(&command),
        Commands::Submit(command) => command_submit(command).await,
        Commands::Login(command) => command_login(&command),
        Commands::Logout(command) => command_logout(&command),
        Commands::Whoami(command) => command_whoami(&command),
        Commands::Config(command) => command_config(&command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;

    // An explicit key forces api mode, mirroring the mode flags.
    let selection = if command.api_key.is_some() {
        ModeSelection::ForceApi
    } else {
        ModeSelection::from_flags(command.api, command.subscription).map_err(CliError::from_err)?
    };
    let registry = ProviderRegistry::with_builtin_providers().map_err(CliError::from_err)?;
    let system = SystemProbe::new(EnvSnapshot::capture());
    let resolution = match command.api_key.clone() {
        Some(key) => {
            let probe = ExplicitKeyProbe::new(key, &system);
            resolve_model(
                &registry,
                &command.model,
                selection,
                config.preferred_mode,
                &probe,
            )
        }
        None => resolve_model(
            &registry,
            &command.model,
            selection,
            config.preferred_mode,
            &system,
        ),
    }
    .map_err(CliError::from_err)?;
    let entry = registry
        .get(resolution.provider, resolution.mode)
        .ok_or_else(|| CliError::new("resolved entry vanished from the registry".to_string()))?;
    let provider = entry
        .build(&resolution.build_context())
        .map_err(CliError::from_err)?;

    let suites_dir = command
        .suites_dir
        .clone()
        .or_else(|| config.suites_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SUITES_DIR));
    let store = SuiteStore::new(suites_dir);
    let suite = store
        .load(command.suite, &command.suite_version)
        .map_err(CliError::from_err)?;

    write_stderr_line(&format!(
        "running {} ({} cases) against {} via {} mode",
        suite.hash,
        suite.cases.len(),
        resolution.model,
        resolution.mode
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))?;

    let runner_config = RunnerConfig {
        temperature: command.temperature,
        seed: Some(command.seed),
        max_concurrency: command.concurrency,
        case_timeout_ms: command.case_timeout_ms,
        run_timeout_ms: command.run_timeout_ms,
        ..RunnerConfig::default()
    };
    let cancel = CancelToken::new();
    let signal_cancel = cancel.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let runner = EvalRunner::new(provider, runner_config);
    let result = runner
        .execute(&suite, resolution.mode, &cancel)
        .await
        .map_err(CliError::from_err)?;
    signal.abort();

    let rendered = serde_json::to_string_pretty(&result).map_err(CliError::from_err)?;
    fs::write(&command.output, &rendered).map_err(|err| {
        CliError::new(format!(
            "cannot write record {}: {err}",
            command.output.display()
        ))
    })?;

    if command.json {
        write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    } else {
        print_summary(&result)?;
        write_stdout_line(&format!("record saved to {}", command.output.display()))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }

    if command.submit {
        submit_record(&config, &result).await?;
    } else if !command.offline {
        write_stdout_line(&format!(
            "submit with: pramana submit {}",
            command.output.display()
        ))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Prints the human-readable run summary.
fn print_summary(result: &RunResult) -> CliResult<()> {
    let emit = |line: String| {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))
    };
    emit(format!(
        "model: {} ({} mode)",
        result.model, result.provider_mode
    ))?;
    emit(format!(
        "suite: {} {}",
        result.suite_version, result.suite_hash
    ))?;
    let total = u64::try_from(result.cases.len()).unwrap_or(u64::MAX);
    let failed = total
        .saturating_sub(result.passed_count)
        .saturating_sub(result.error_count);
    emit(format!(
        "cases: {} passed, {failed} failed, {} errored",
        result.passed_count, result.error_count
    ))?;
    emit(format!("pass rate: {:.1}%", result.pass_rate * 100.0))?;
    emit(format!(
        "reproducible: {}",
        if result.reproducible { "yes" } else { "no" }
    ))?;
    for outcome in &result.cases {
        if outcome.passed {
            continue;
        }
        match &outcome.error {
            Some(error) => emit(format!(
                "  {} errored ({}): {}",
                outcome.case_id, error.kind, error.message
            ))?,
            None => emit(format!("  {} failed", outcome.case_id))?,
        }
    }
    emit(format!("result hash: {}", result.result_hash))?;
    Ok(())
}

/// Submits a sealed record using the configured auth context.
async fn submit_record(config: &UserConfig, result: &RunResult) -> CliResult<()> {
    let client = SubmissionClient::new(config.auth_context()).map_err(CliError::from_err)?;
    let receipt = client.submit(result).await.map_err(CliError::from_err)?;
    let line = if receipt.duplicate {
        format!("submission: duplicate of an existing record ({})", result.result_hash)
    } else if receipt.accepted {
        format!("submission: accepted ({})", result.result_hash)
    } else {
        let detail = receipt.message.unwrap_or_else(|| "no detail".to_string());
        format!("submission: not stored ({detail})")
    };
    write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))
}

// ============================================================================
// SECTION: Models Command
// ============================================================================

/// Executes the `models` command.
fn command_models(command: &ConfigPathArg) -> CliResult<ExitCode> {
    let config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;
    let registry = ProviderRegistry::with_builtin_providers().map_err(CliError::from_err)?;
    let probe = SystemProbe::new(EnvSnapshot::capture());

    let emit = |line: String| {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))
    };
    emit(format!("preferred mode: {}", config.preferred_mode))?;
    for (model, provider_label) in known_models() {
        let availability = match resolve_model(
            &registry,
            model,
            ModeSelection::Auto,
            config.preferred_mode,
            &probe,
        ) {
            Ok(resolution) => format!("available via {} mode", resolution.mode),
            Err(_) => "unavailable".to_string(),
        };
        emit(format!("{model}  ({provider_label}, {availability})"))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Submission Commands
// ============================================================================

/// Executes the `submit` command for a saved record file.
async fn command_submit(command: SubmitCommand) -> CliResult<ExitCode> {
    let config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;
    let text = fs::read_to_string(&command.record).map_err(|err| {
        CliError::new(format!("cannot read record {}: {err}", command.record.display()))
    })?;
    let result: RunResult = serde_json::from_str(&text)
        .map_err(|err| CliError::new(format!("invalid record file: {err}")))?;
    submit_record(&config, &result).await?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `login` command.
fn command_login(command: &LoginCommand) -> CliResult<ExitCode> {
    let mut config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;
    config.token = Some(command.token.clone());
    config.save(command.config.as_deref()).map_err(CliError::from_err)?;
    write_stdout_line("token stored").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `logout` command.
fn command_logout(command: &ConfigPathArg) -> CliResult<ExitCode> {
    let mut config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;
    if config.token.take().is_none() {
        write_stdout_line("no token stored")
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    config.save(command.config.as_deref()).map_err(CliError::from_err)?;
    write_stdout_line("token removed").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `whoami` command.
fn command_whoami(command: &ConfigPathArg) -> CliResult<ExitCode> {
    let config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;
    let emit = |line: String| {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))
    };
    emit(format!("submission url: {}", config.submission_url()))?;
    match config.token.as_deref() {
        Some(token) => emit(format!("token: {}", mask_token(token)))?,
        None => emit("token: none (anonymous submission)".to_string())?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config` command.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    let mut config = UserConfig::load(command.config.as_deref()).map_err(CliError::from_err)?;
    let setter = if command.prefer_api {
        Some(ProviderMode::Api)
    } else if command.prefer_subscription {
        Some(ProviderMode::Subscription)
    } else {
        None
    };
    if let Some(mode) = setter {
        config.preferred_mode = mode;
        config.save(command.config.as_deref()).map_err(CliError::from_err)?;
        write_stdout_line(&format!("preferred mode set to {mode}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        if !command.show {
            return Ok(ExitCode::SUCCESS);
        }
    }
    // Render through a masked copy so tokens never reach the terminal.
    let mut masked = config;
    masked.token = masked.token.as_deref().map(mask_token);
    let rendered = toml::to_string_pretty(&masked).map_err(CliError::from_err)?;
    write_stdout_line(rendered.trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Masks a token for display, keeping only the edges.
fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}****{tail}")
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout without the print macros.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr without the print macros.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output-stream failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
