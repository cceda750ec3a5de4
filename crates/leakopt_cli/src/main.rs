//! Leakopt CLI: the command-line front end of the leakage optimizer.
//!
//! Provides `leakopt run` to trade timing slack for leakage by swapping
//! cells to higher threshold-voltage variants, and `leakopt report` to
//! summarize a netlist without touching it.

#![warn(missing_docs)]

mod pipeline;
mod report;
mod run;

use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

/// Leakopt: post-route leakage recovery by threshold-voltage swapping.
#[derive(Parser, Debug)]
#[command(name = "leakopt", version, about = "Leakage optimizer")]
pub struct Cli {
    /// Suppress all output except warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a `leakopt.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Optimize a netlist for leakage within its timing budget.
    Run(RunArgs),
    /// Print cell count, leakage, and worst slack of a netlist.
    Report(ReportArgs),
}

/// Arguments for the `leakopt run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Netlist JSON file.
    pub netlist: String,

    /// Where to write the optimized netlist.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override the configured time budget (e.g. "90", "90s", "5m").
    #[arg(long, value_parser = pipeline::parse_duration_arg)]
    pub max_duration: Option<Duration>,

    /// Output format for the report and diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `leakopt report` subcommand.
#[derive(Parser, Debug)]
pub struct ReportArgs {
    /// Netlist JSON file.
    pub netlist: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report and diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-warning output.
    pub quiet: bool,
    /// Whether to print debug diagnostics.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var("TERM").is_ok_and(|t| t != "dumb"),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Run(ref args) => run::run(args, &global),
        Command::Report(ref args) => report::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
