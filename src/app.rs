//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and the TOML configuration
//! - installs the log subscriber
//! - builds the [`pipeline::Pipeline`] and dispatches the subcommand
//! - prints tables or JSON and writes optional exports

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, OutputArgs, RecommendArgs, RegionalArgs, TrendArgs};
use crate::config::Config;
use crate::domain::{FittedTrendModel, ForecastPoint, Provenance};
use crate::error::AppError;
use crate::io::export::write_records;
use crate::report::RecommendationSummary;

pub mod pipeline;

use pipeline::Pipeline;

/// Names the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "OUTLOOK_CONFIG";
/// Log filter when `--log-level` is absent.
pub const LOG_ENV: &str = "OUTLOOK_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

/// Entry point for the `outlook` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    debug!(config = ?config_path, "loading configuration");
    let config = Config::load(config_path.as_deref())?;
    let pipeline = Pipeline::from_config(config)?;

    match cli.command {
        Command::Train(output) => handle_train(&pipeline, &output),
        Command::Trend(args) => handle_trend(&pipeline, &args),
        Command::Regional(args) => handle_regional(&pipeline, &args),
        Command::Recommend(args) => handle_recommend(&pipeline, &args),
    }
}

/// Install a stderr `fmt` subscriber. A second call is a no-op.
pub fn init_logging(level: Option<&str>) {
    let filter = level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_ENV).ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Flat training summary, one row per metric (exportable as CSV).
#[derive(Debug, Serialize)]
struct TrainingRow<'a> {
    metric: &'a str,
    target_column: &'a str,
    n_rows: usize,
    mae: Option<f64>,
    mse: Option<f64>,
}

impl<'a> From<&'a FittedTrendModel> for TrainingRow<'a> {
    fn from(m: &'a FittedTrendModel) -> Self {
        Self {
            metric: &m.metric,
            target_column: &m.target_column,
            n_rows: m.n_rows,
            mae: m.evaluation.as_ref().map(|e| e.mae),
            mse: m.evaluation.as_ref().map(|e| e.mse),
        }
    }
}

fn handle_train(pipeline: &Pipeline, output: &OutputArgs) -> Result<(), AppError> {
    let models = pipeline.train_all()?;
    let rows: Vec<TrainingRow<'_>> = models.iter().map(TrainingRow::from).collect();

    if output.json {
        print_json(&rows)?;
    } else {
        println!("{}", crate::report::format_training(&models));
        println!("Models written to {}", pipeline.store().blobs().dir().display());
    }
    if let Some(path) = &output.export {
        write_records(path, &rows)?;
    }
    Ok(())
}

/// Forecast point tagged with its metric (exportable as CSV).
#[derive(Debug, Serialize)]
struct TrendRow<'a> {
    metric: &'a str,
    year: i32,
    value: f64,
    provenance: Provenance,
}

fn handle_trend(pipeline: &Pipeline, args: &TrendArgs) -> Result<(), AppError> {
    let trend_cfg = &pipeline.config().trend;
    let start = args.start.unwrap_or(trend_cfg.default_start_year);
    let end = args.end.unwrap_or(trend_cfg.default_end_year);

    let metrics: Vec<String> = if args.all {
        trend_cfg.targets.iter().map(|t| t.key.clone()).collect()
    } else {
        args.metric.iter().cloned().collect()
    };

    let mut forecasts: Vec<(String, Vec<ForecastPoint>)> = Vec::with_capacity(metrics.len());
    for metric in metrics {
        let points = pipeline.forecast_trend(&metric, start, end)?;
        forecasts.push((metric, points));
    }

    let rows: Vec<TrendRow<'_>> = forecasts
        .iter()
        .flat_map(|(metric, points)| {
            points.iter().map(move |p| TrendRow {
                metric,
                year: p.year,
                value: p.value,
                provenance: p.provenance,
            })
        })
        .collect();

    if args.output.json {
        print_json(&rows)?;
    } else {
        for (metric, points) in &forecasts {
            println!("{}", crate::report::format_trend(metric, points));
        }
    }
    if let Some(path) = &args.output.export {
        write_records(path, &rows)?;
    }
    Ok(())
}

fn handle_regional(pipeline: &Pipeline, args: &RegionalArgs) -> Result<(), AppError> {
    let year = args
        .year
        .unwrap_or(pipeline.config().regional.default_target_year);
    let forecast = pipeline.forecast_regional(year)?;
    for d in &forecast.diagnostics {
        warn!(subject = %d.subject, "{}", d.message);
    }

    if args.output.json {
        print_json(&forecast)?;
    } else {
        println!("{}", crate::report::format_regional(&forecast));
    }
    if let Some(path) = &args.output.export {
        write_records(path, &forecast.rows)?;
    }
    Ok(())
}

fn handle_recommend(pipeline: &Pipeline, args: &RecommendArgs) -> Result<(), AppError> {
    let result = pipeline.recommend_investment(args.budget, args.year)?;

    if args.output.json {
        if args.raw {
            print_json(&result)?;
        } else {
            print_json(&RecommendationSummary::from_result(&result))?;
        }
    } else {
        println!("{}", crate::report::format_recommendation(&result));
    }
    if let Some(path) = &args.output.export {
        write_records(path, std::slice::from_ref(&result))?;
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Io(std::io::Error::other(format!("failed to encode JSON: {e}"))))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::domain::Evaluation;
    use crate::io::export::write_json;

    #[test]
    fn training_row_flattens_evaluation() {
        let model = FittedTrendModel {
            metric: "solar_gwh".into(),
            target_column: "Solar (GWh)".into(),
            feature_names: Vec::new(),
            intercept: 0.0,
            coefficients: Vec::new(),
            n_rows: 9,
            split_seed: 42,
            evaluation: Some(Evaluation {
                mae: 1.5,
                mse: 2.25,
                n_train: 7,
                n_test: 2,
            }),
            trained_at: Utc::now(),
        };
        let row = TrainingRow::from(&model);
        assert_eq!(row.metric, "solar_gwh");
        assert_eq!(row.mae, Some(1.5));
    }

    #[test]
    fn json_export_of_trend_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend.json");
        let rows = vec![TrendRow {
            metric: "solar",
            year: 2024,
            value: 12.0,
            provenance: Provenance::Predicted,
        }];
        write_json(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"predicted\""));
    }
}
