//! Command-line parsing for the `outlook` binary.
//!
//! Parsing is kept apart from dispatch (`app`) and from the engine itself.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "outlook",
    version,
    about = "Renewable energy outlook: trend forecasts, regional estimates and solar investment payback"
)]
pub struct Cli {
    /// TOML configuration file (defaults to $OUTLOOK_CONFIG, then built-in defaults).
    #[arg(long, global = true, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `energy_outlook=debug` (defaults to $OUTLOOK_LOG, then `warn`).
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Train and persist one trend model per configured target.
    Train(OutputArgs),
    /// Forecast a national metric with its trained model.
    Trend(TrendArgs),
    /// Sub-region estimates for one target year.
    Regional(RegionalArgs),
    /// Solar investment capacity, savings and payback for a budget.
    Recommend(RecommendArgs),
}

/// Where results go besides the terminal table.
#[derive(Debug, Args, Clone, Default)]
pub struct OutputArgs {
    /// Print results as JSON on stdout instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also write results to a file (`.csv` for CSV, anything else for JSON).
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TrendArgs {
    /// Metric key, e.g. `solar` (required unless --all).
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub metric: Option<String>,

    /// Forecast every configured target.
    #[arg(long)]
    pub all: bool,

    /// First year (inclusive); defaults to `trend.default_start_year`.
    #[arg(long)]
    pub start: Option<i32>,

    /// Last year (inclusive); defaults to `trend.default_end_year`.
    #[arg(long)]
    pub end: Option<i32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RegionalArgs {
    /// Target year; defaults to `regional.default_target_year`.
    #[arg(long)]
    pub year: Option<i32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RecommendArgs {
    /// Investment budget (PHP).
    #[arg(long, allow_negative_numbers = true)]
    pub budget: f64,

    /// Year of investment.
    #[arg(long)]
    pub year: i32,

    /// Print the raw result instead of the projections/cost-benefit summary (with --json).
    #[arg(long)]
    pub raw: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}
