// crates/repost-conformance-cli/src/main.rs
// ============================================================================
// Module: Repost Conformance CLI Entry Point
// Description: Command-line front end for single and repeated conformance runs.
// Purpose: Resolve configuration, drive the runner, and report timings.
// Dependencies: clap, repost-conformance-runner, serde, serde_jcs, thiserror
// ============================================================================

//! ## Overview
//! `repost-conformance <URL>` runs the full conformance scenario once and
//! prints the executed test count and elapsed time. With `--runs N` the
//! scenario is repeated N times with progress logging off by default, and
//! the total, mean, and median timings are reported. Flags override the
//! `REPOST_CONFORMANCE_*` environment variables.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::ArgAction;
use clap::Parser;
use clap::ValueEnum;
use repost_conformance_runner::HarnessConfig;
use repost_conformance_runner::LogFormat;
use repost_conformance_runner::MultiRunSummary;
use repost_conformance_runner::RunSummary;
use repost_conformance_runner::TrailingSlashPolicy;
use repost_conformance_runner::config::validate_base_url;
use repost_conformance_runner::run::http_transport;
use repost_conformance_runner::run::run_log_for;
use repost_conformance_runner::run_many;
use repost_conformance_runner::run_once;
use serde_jcs::to_vec as canonical_json;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "repost-conformance", version, about = "Run a full conformance test of a Repost API.")]
struct Cli {
    /// Base URL of the API (overrides `REPOST_CONFORMANCE_BASE_URL`).
    #[arg(value_name = "URL")]
    url: Option<String>,
    /// Number of full test runs.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1 ..))]
    runs: u32,
    /// Base seed for generated usernames and content.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Per-request timeout in seconds.
    #[arg(long = "timeout-sec", value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1 ..))]
    timeout_sec: Option<u64>,
    /// Path prefix of the API below the base URL.
    #[arg(long, value_name = "PREFIX")]
    api_prefix: Option<String>,
    /// Trailing slash convention for collection paths.
    #[arg(long, value_enum, value_name = "POLICY")]
    trailing_slash: Option<TrailingSlashArg>,
    /// Report redirects as statuses instead of following them.
    #[arg(long = "no-follow-redirects", action = ArgAction::SetTrue)]
    no_follow_redirects: bool,
    /// Progress log format on stderr.
    #[arg(long, value_enum, value_name = "FORMAT")]
    log_format: Option<LogFormatArg>,
    /// Result output format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Trailing slash policy selection.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum TrailingSlashArg {
    /// Slash on collection paths only.
    Declared,
    /// Never append a slash.
    Never,
}

impl From<TrailingSlashArg> for TrailingSlashPolicy {
    fn from(value: TrailingSlashArg) -> Self {
        match value {
            TrailingSlashArg::Declared => Self::Declared,
            TrailingSlashArg::Never => Self::Never,
        }
    }
}

/// Progress log format selection.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum LogFormatArg {
    /// Human-readable progress lines.
    Text,
    /// One JSON event per line.
    Json,
    /// No progress output.
    Off,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
            LogFormatArg::Off => Self::Off,
        }
    }
}

/// Result output format.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Canonical JSON output.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying the operator-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Resolves configuration and dispatches to single or repeated runs.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let loaded = HarnessConfig::load().map_err(|err| CliError::new(err.to_string()))?;
    let config = resolve_config(&cli, loaded)?;
    let base_url = config.require_base_url().map_err(|err| CliError::new(err.to_string()))?;
    if cli.runs > 1 {
        run_repeated(&config, base_url, cli.runs, cli.format)
    } else {
        run_single(&config, base_url, cli.format)
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Applies command-line overrides on top of environment configuration.
fn resolve_config(cli: &Cli, mut config: HarnessConfig) -> CliResult<HarnessConfig> {
    if let Some(url) = &cli.url {
        config.base_url =
            Some(validate_base_url(url).map_err(|err| CliError::new(err.to_string()))?);
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(seconds) = cli.timeout_sec {
        config.timeout = Duration::from_secs(seconds);
    }
    if let Some(prefix) = &cli.api_prefix {
        config.api_prefix.clone_from(prefix);
    }
    if let Some(policy) = cli.trailing_slash {
        config.trailing_slash = policy.into();
    }
    if cli.no_follow_redirects {
        config.follow_redirects = false;
    }
    config.log_format = match cli.log_format {
        Some(format) => format.into(),
        None if cli.runs > 1 => LogFormat::Off,
        None => config.log_format,
    };
    Ok(config)
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes one run and reports its summary.
fn run_single(config: &HarnessConfig, base_url: &str, format: OutputFormat) -> CliResult<ExitCode> {
    if format == OutputFormat::Text {
        write_stdout(&format!("Starting complete API test on base URL {base_url}"))?;
    }
    let transport = http_transport(config).map_err(|err| CliError::new(err.to_string()))?;
    let summary = run_once(config, transport, run_log_for(config.log_format), 0)
        .map_err(|err| CliError::new(err.to_string()))?;
    match format {
        OutputFormat::Text => {
            for line in single_run_lines(&summary) {
                write_stdout(&line)?;
            }
        }
        OutputFormat::Json => write_json(&summary)?,
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `runs` runs back to back and reports aggregate timings.
fn run_repeated(
    config: &HarnessConfig,
    base_url: &str,
    runs: u32,
    format: OutputFormat,
) -> CliResult<ExitCode> {
    let text = format == OutputFormat::Text;
    if text {
        write_stdout(&format!("Starting {runs} runs for complete API test on {base_url}"))?;
    }
    let log = run_log_for(config.log_format);
    let mut progress = Ok(());
    let summaries = run_many(config, runs, &log, || http_transport(config), |run, summary| {
        if text && progress.is_ok() {
            progress = write_stdout(&run_passed_line(run, summary));
        }
    })
    .map_err(|err| CliError::new(err.to_string()))?;
    progress?;
    let aggregate = MultiRunSummary::from_runs(&summaries)
        .ok_or_else(|| CliError::new("no runs were executed".to_string()))?;
    if text {
        for line in multi_run_lines(&aggregate) {
            write_stdout(&line)?;
        }
    } else {
        write_json(&aggregate)?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Text report for one run.
fn single_run_lines(summary: &RunSummary) -> Vec<String> {
    vec![
        String::new(),
        format!("Executed {} tests", summary.test_count),
        format!("Passed in {} seconds", summary.elapsed_seconds),
    ]
}

/// Progress line for one passing run of a repeated session.
fn run_passed_line(run: u32, summary: &RunSummary) -> String {
    format!("Run {} passed in {} seconds", run + 1, summary.elapsed_seconds)
}

/// Text report for repeated runs.
fn multi_run_lines(summary: &MultiRunSummary) -> Vec<String> {
    vec![
        format!("Executed {} runs in {} seconds", summary.runs, summary.total_elapsed_seconds),
        format!("Performed a total of {} tests", summary.test_count),
        String::new(),
        "Stats:".to_string(),
        format!("\tmean: {}", summary.mean_elapsed_seconds),
        format!("\tmedian: {}", summary.median_elapsed_seconds),
    ]
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Writes a serializable value as one canonical JSON line.
fn write_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = canonical_json(value)
        .map_err(|err| CliError::new(format!("failed to encode output: {err}")))?;
    bytes.push(b'\n');
    std::io::stdout().write_all(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout, mapping failures to [`CliError`].
fn write_stdout(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output stream failure.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
