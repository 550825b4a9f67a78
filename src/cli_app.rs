//! Top-level CLI definition and dispatch.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use tokio_util::sync::CancellationToken;

use singlish_translit_harness::core::config::Config;
use singlish_translit_harness::core::errors::{Result, SthError};
use singlish_translit_harness::fixtures::Catalog;
use singlish_translit_harness::report::jsonl::{self, JsonlWriter};
use singlish_translit_harness::report::summary::Summary;
use singlish_translit_harness::runner::{Outcome, RunReport, ScenarioRunner};
use singlish_translit_harness::surface::SessionFactory;
use singlish_translit_harness::surface::sim::SimFactory;

const EXIT_OK: i32 = 0;
const EXIT_SCENARIO_FAILURES: i32 = 1;
const EXIT_ENVIRONMENT: i32 = 2;

/// Exit code for errors that escaped to `main`.
#[must_use]
pub fn fatal_exit_code(err: &SthError) -> i32 {
    match err {
        SthError::Session { .. } | SthError::Interrupted => EXIT_ENVIRONMENT,
        _ => EXIT_SCENARIO_FAILURES,
    }
}

/// Singlish Transliteration Harness — replay scenario tables against the
/// translator UI and verify rendered output.
#[derive(Debug, Parser)]
#[command(
    name = "sth",
    author,
    version,
    about = "Singlish Transliteration Harness - UI scenario replay",
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
    /// Quiet mode (summary only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Replay scenario tables and verify output.
    Run(RunArgs),
    /// Inspect and validate fixture tables.
    Fixtures(FixturesArgs),
    /// Summarize a JSONL result log from previous runs.
    Report(ReportArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Target implementation the runner drives.
///
/// Real browser adapters implement `TargetSession` via the library crate and
/// are wired in by the embedding test suite; the CLI ships the deterministic
/// simulated page.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Target {
    /// In-process translator page scripted from the fixture tables.
    Sim,
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Fixture files to replay (default: the shipped tables).
    #[arg(long = "fixtures", value_name = "PATH")]
    fixtures: Vec<PathBuf>,
    /// Target implementation.
    #[arg(long, value_enum, default_value_t = Target::Sim)]
    target: Target,
    /// Parallel independent sessions (each replays sequentially).
    #[arg(long, value_name = "N")]
    sessions: Option<usize>,
    /// Attempts per scenario; only resolution/timeout failures retry.
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,
    /// JSONL result log path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Disable the JSONL result log.
    #[arg(long)]
    no_report: bool,
}

#[derive(Debug, Clone, Args)]
struct FixturesArgs {
    /// Fixture files to inspect (default: the shipped tables).
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ReportArgs {
    /// Result log to summarize (default: report.jsonl_path from config).
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

/// Dispatch. Returns the process exit code.
pub async fn run(cli: &Cli) -> Result<i32> {
    if cli.no_color {
        control::set_override(false);
    }
    match &cli.command {
        Command::Run(args) => cmd_run(cli, args).await,
        Command::Fixtures(args) => cmd_fixtures(cli, args),
        Command::Report(args) => cmd_report(cli, args),
        Command::Completions(args) => {
            generate(args.shell, &mut Cli::command(), "sth", &mut io::stdout());
            Ok(EXIT_OK)
        }
    }
}

fn load_catalog(paths: &[PathBuf]) -> Result<Catalog> {
    if paths.is_empty() {
        return Catalog::builtin();
    }
    let mut merged = Catalog::default();
    for path in paths {
        merged.extend(Catalog::from_path(path)?)?;
    }
    Ok(merged)
}

async fn cmd_run(cli: &Cli, args: &RunArgs) -> Result<i32> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(sessions) = args.sessions {
        config.run.sessions = sessions;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.run.max_attempts = max_attempts;
    }
    if let Some(report) = &args.report {
        config.report.jsonl_path.clone_from(report);
    }
    if args.no_report {
        config.report.jsonl_enabled = false;
    }
    config.validate()?;

    let catalog = load_catalog(&args.fixtures)?;
    if !cli.quiet && !cli.json {
        println!(
            "Replaying {} scenario(s) across {} session(s)…",
            catalog.len(),
            config.run.sessions
        );
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let factory: Arc<dyn SessionFactory> = match args.target {
        Target::Sim => Arc::new(SimFactory::scripted(catalog.lexicon())),
    };

    let runner = ScenarioRunner::new(config.clone(), factory, cancel);
    let report = runner.run(&catalog).await?;

    if config.report.jsonl_enabled {
        let writer = JsonlWriter::new(&config.report.jsonl_path);
        for result in &report.results {
            writer.append(result);
        }
    }

    let summary = Summary::from_results(&report.results);
    if cli.json {
        let envelope = serde_json::json!({
            "summary": summary,
            "total_elapsed_ms": report.total_elapsed_ms,
            "results": report.results,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        if !cli.quiet {
            echo_results(cli, &report);
        }
        print!("{}", summary.render_text());
    }

    Ok(if summary.has_failures() {
        EXIT_SCENARIO_FAILURES
    } else {
        EXIT_OK
    })
}

fn echo_results(cli: &Cli, report: &RunReport) {
    for result in &report.results {
        let verdict = match result.outcome {
            Outcome::Pass => "PASS ".green(),
            Outcome::Mismatch => "FAIL ".red(),
            Outcome::Error => "ERROR".yellow(),
        };
        if cli.verbose {
            println!(
                "{verdict} {} ({} ms, {} attempt(s)) — {}",
                result.id, result.elapsed_ms, result.attempts, result.name
            );
        } else {
            println!("{verdict} {} ({} ms)", result.id, result.elapsed_ms);
        }
        match result.outcome {
            Outcome::Mismatch => {
                println!("        expected: {:?}", result.expected);
                if let Some(actual) = &result.actual {
                    println!("        actual:   {actual:?}");
                }
            }
            Outcome::Error => {
                if let Some(message) = &result.error_message {
                    println!("        {message}");
                }
            }
            Outcome::Pass => {}
        }
    }
}

fn cmd_fixtures(cli: &Cli, args: &FixturesArgs) -> Result<i32> {
    let catalog = load_catalog(&args.paths)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(catalog.scenarios())?);
        return Ok(EXIT_OK);
    }
    for scenario in catalog.scenarios() {
        let length = scenario.metadata.length.as_deref().unwrap_or("-");
        let category = scenario.metadata.category.as_deref().unwrap_or("-");
        println!("{}\t{length}\t{category}\t{}", scenario.id, scenario.name);
    }
    println!("{} scenario(s), ids unique", catalog.len());
    Ok(EXIT_OK)
}

fn cmd_report(cli: &Cli, args: &ReportArgs) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;
    let path = args
        .input
        .clone()
        .unwrap_or_else(|| config.report.jsonl_path.clone());
    let (results, skipped) = jsonl::load(&path)?;
    let summary = Summary::from_results(&results);
    if cli.json {
        let envelope = serde_json::json!({
            "summary": summary,
            "skipped_lines": skipped,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print!("{}", summary.render_text());
        if skipped > 0 {
            println!("({skipped} unparsable line(s) skipped)");
        }
    }
    Ok(EXIT_OK)
}
