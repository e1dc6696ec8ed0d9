//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use linelog::core::clock::{format_partition_date, parse_partition_date};
use linelog::core::config::Config;
use linelog::core::errors::LinelogError;
use linelog::hook::{Recorder, read_stdin_event};
use linelog::logger::aggregate::{
    Aggregate, DateSummary, Dimension, HistorySummary, aggregate_by, aggregate_by_date, history,
    recent, top_by_operations,
};
use linelog::logger::reader::PartitionReader;
use linelog::logger::record::Record;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "LINELOG_LOG";
/// Environment variable selecting `human`, `json` or `auto` output.
const OUTPUT_FORMAT_ENV: &str = "LINELOG_OUTPUT_FORMAT";

/// linelog: line-change statistics for AI-assisted edits.
#[derive(Debug, Parser)]
#[command(
    name = "linelog",
    author,
    version,
    about = "linelog - Line-change statistics for AI-assisted edits",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Record one tool-invocation event read from stdin (always exits 0).
    Hook,
    /// Summarize recorded line changes.
    Report(ReportArgs),
    /// Show configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
#[command(group(
    ArgGroup::new("view")
        .args(["date", "history", "recent", "list"])
        .multiple(false)
))]
struct ReportArgs {
    /// Summarize a specific day instead of today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<String>,
    /// Summarize every recorded day.
    #[arg(long)]
    history: bool,
    /// Show today's most recent records (count defaults to config).
    #[arg(long, value_name = "N", num_args = 0..=1)]
    recent: Option<Option<usize>>,
    /// List the days that have a partition.
    #[arg(long)]
    list: bool,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<LinelogError> for CliError {
    fn from(value: LinelogError) -> Self {
        if value.is_user_error() {
            Self::User(value.to_string())
        } else {
            Self::Runtime(value.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }
    setup_logging(cli);

    match &cli.command {
        Command::Hook => run_hook(cli),
        Command::Report(args) => run_report(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn setup_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

/// The hook logs each event's outcome at info level unless told otherwise.
fn default_log_filter(cli: &Cli) -> &'static str {
    if cli.verbose {
        "linelog=debug"
    } else if cli.quiet {
        "linelog=error"
    } else if matches!(cli.command, Command::Hook) {
        "linelog=info"
    } else {
        "linelog=warn"
    }
}

// ---------------------------------------------------------------------------
// Hook
// ---------------------------------------------------------------------------

fn run_hook(cli: &Cli) -> Result<(), CliError> {
    let config = Config::load_for_hook(cli.config.as_deref());

    let recorder = match Recorder::from_config(&config) {
        Ok(recorder) => recorder,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "cannot set up recorder");
            return Ok(());
        }
    };

    let outcome = recorder.handle_raw(&read_stdin_event());
    tracing::debug!(outcome = outcome.label(), "hook finished");
    Ok(())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SessionRow<'a> {
    session_id: &'a str,
    #[serde(flatten)]
    aggregate: &'a Aggregate,
}

fn run_report(cli: &Cli, args: &ReportArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let reader = PartitionReader::new(&config.paths.log_root);
    if !reader.exists() {
        return Err(CliError::User(format!(
            "log directory {} does not exist; nothing has been recorded yet",
            reader.root().display()
        )));
    }
    let mode = output_mode(cli);

    if args.list {
        return report_list(&reader, mode);
    }
    if args.history {
        return report_history(&history(&reader)?, mode);
    }

    let today = config.clock()?.today();
    if let Some(count) = args.recent {
        let records = reader.read(today)?;
        let count = count.unwrap_or(config.report.recent_default);
        return report_recent(&format_partition_date(today), recent(&records, count), mode);
    }

    let date = match &args.date {
        Some(raw) => parse_partition_date(raw)?,
        None => today,
    };
    let records = reader.read(date)?;
    let summary = aggregate_by_date(date, &records);
    report_date(
        &format_partition_date(date),
        summary.as_ref(),
        &records,
        config.report.top_sessions,
        mode,
    )
}

fn report_date(
    date: &str,
    summary: Option<&DateSummary>,
    records: &[Record],
    top_sessions: usize,
    mode: OutputMode,
) -> Result<(), CliError> {
    let by_user = aggregate_by(Dimension::User, records);
    let by_tool = aggregate_by(Dimension::Tool, records);
    let by_session = aggregate_by(Dimension::Session, records);
    let top: Vec<SessionRow<'_>> = top_by_operations(&by_session, top_sessions)
        .into_iter()
        .map(|(session_id, aggregate)| SessionRow {
            session_id,
            aggregate,
        })
        .collect();

    match mode {
        OutputMode::Json => {
            let payload = json!({
                "command": "report",
                "view": "date",
                "date": date,
                "summary": summary,
                "by_user": by_user,
                "by_tool": by_tool,
                "top_sessions": top,
            });
            write_json_line(&payload)?;
        }
        OutputMode::Human => {
            let Some(summary) = summary else {
                println!("No line changes recorded for {date}.");
                return Ok(());
            };
            println!("{}", format!("Line changes for {date}").bold());
            println!("  Additions:   {}", format!("+{}", summary.total_additions).green());
            println!("  Deletions:   {}", format!("-{}", summary.total_deletions).red());
            println!("  Net change:  {}", format_net(summary.net_change));
            println!("  Operations:  {}", summary.total_operations);
            println!(
                "  Active:      {} .. {}",
                time_of_day(&summary.first_time),
                time_of_day(&summary.last_time)
            );

            println!();
            println!("{}", "By user:".bold());
            for (email, agg) in &by_user {
                println!("  {:<32} {}", email, format_aggregate(agg));
            }

            println!();
            println!("{}", "By tool:".bold());
            for (tool, agg) in &by_tool {
                println!("  {:<32} {}", tool, format_aggregate(agg));
            }

            println!();
            println!("{}", "Top sessions:".bold());
            for row in &top {
                let tools: Vec<&str> = row.aggregate.tools.iter().map(String::as_str).collect();
                println!(
                    "  {:<32} {}  [{}]",
                    truncate(row.session_id, 32),
                    format_aggregate(row.aggregate),
                    tools.join(", ")
                );
            }
        }
    }
    Ok(())
}

fn report_history(summary: &HistorySummary, mode: OutputMode) -> Result<(), CliError> {
    match mode {
        OutputMode::Json => {
            let payload = json!({
                "command": "report",
                "view": "history",
                "history": summary,
            });
            write_json_line(&payload)?;
        }
        OutputMode::Human => {
            if summary.days.is_empty() {
                println!("No line changes recorded.");
                return Ok(());
            }
            println!("{}", "Line change history".bold());
            println!(
                "  {:<12} {:>10} {:>10} {:>10} {:>8}",
                "Date", "Added", "Removed", "Net", "Ops"
            );
            for day in &summary.days {
                println!(
                    "  {:<12} {:>10} {:>10} {:>10} {:>8}",
                    day.date,
                    format!("+{}", day.total_additions),
                    format!("-{}", day.total_deletions),
                    format!("{:+}", day.net_change),
                    day.total_operations
                );
            }
            println!(
                "  {:<12} {:>10} {:>10} {:>10} {:>8}",
                "Total",
                format!("+{}", summary.total_additions),
                format!("-{}", summary.total_deletions),
                format!("{:+}", summary.net_change),
                summary.total_operations
            );
            if let (Some(first), Some(last)) = (&summary.first_date, &summary.last_date) {
                println!("  Range:       {first} .. {last}");
            }
        }
    }
    Ok(())
}

fn report_recent(date: &str, records: &[Record], mode: OutputMode) -> Result<(), CliError> {
    match mode {
        OutputMode::Json => {
            let payload = json!({
                "command": "report",
                "view": "recent",
                "date": date,
                "records": records,
            });
            write_json_line(&payload)?;
        }
        OutputMode::Human => {
            if records.is_empty() {
                println!("No line changes recorded for {date}.");
                return Ok(());
            }
            println!("{}", format!("Recent line changes for {date}").bold());
            for record in records {
                println!(
                    "  {}  {:<14} {:>8} {:>8}  {}  {}",
                    time_of_day(&record.timestamp),
                    record.tool,
                    format!("+{}", record.additions),
                    format!("-{}", record.deletions),
                    record.email,
                    truncate(&record.session_id, 24)
                );
            }
        }
    }
    Ok(())
}

fn report_list(reader: &PartitionReader, mode: OutputMode) -> Result<(), CliError> {
    let dates: Vec<String> = reader
        .list_dates()?
        .into_iter()
        .map(format_partition_date)
        .collect();

    match mode {
        OutputMode::Json => {
            let payload = json!({
                "command": "report",
                "view": "list",
                "dates": dates,
            });
            write_json_line(&payload)?;
        }
        OutputMode::Human => {
            if dates.is_empty() {
                println!("No partitions found in {}.", reader.root().display());
            }
            for date in &dates {
                println!("{date}");
            }
        }
    }
    Ok(())
}

fn format_aggregate(agg: &Aggregate) -> String {
    format!(
        "{:>4} ops  +{} -{}  net {:+}",
        agg.operations, agg.additions, agg.deletions, agg.net_change
    )
}

fn format_net(net: i64) -> String {
    let text = format!("{net:+}");
    match net.signum() {
        1 => text.green().to_string(),
        -1 => text.red().to_string(),
        _ => text,
    }
}

/// `HH:MM:SS` part of an RFC 3339 timestamp.
fn time_of_day(timestamp: &str) -> &str {
    timestamp.get(11..19).unwrap_or(timestamp)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => println!("{}", config.to_toml()?),
                OutputMode::Json => {
                    let value = serde_json::to_value(&config)?;
                    let payload = json!({
                        "command": "config show",
                        "config": value,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var(OUTPUT_FORMAT_ENV).ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
