//! TOML configuration.
//!
//! Every section and field has a default matching the deployed system, so an
//! empty file (or no file at all) yields a usable configuration. Column names,
//! sub-regions and metrics are decided here, once, rather than discovered by
//! string search at forecast time.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

/// Top-level configuration parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// National historical dataset.
    pub dataset: DatasetConfig,
    /// Trend Forecaster settings.
    pub trend: TrendConfig,
    /// Regional Disaggregator settings.
    pub regional: RegionalConfig,
    /// Investment Recommender settings.
    pub investment: InvestmentConfig,
}

/// Where a table of historical rows comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    /// Static CSV snapshot.
    Csv(PathBuf),
    /// Live store returning all rows as a JSON array of objects.
    Http(String),
}

/// Resolve a `path`/`url` pair; `None` when neither is set.
fn resolve_source(path: &Option<PathBuf>, url: &Option<String>) -> Option<SourceConfig> {
    match (path, url) {
        (_, Some(url)) => Some(SourceConfig::Http(url.clone())),
        (Some(path), None) => Some(SourceConfig::Csv(path.clone())),
        (None, None) => None,
    }
}

/// A composite column computed after forward-fill as the sum of its parts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedColumn {
    pub name: String,
    pub sum_of: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetConfig {
    /// CSV snapshot; defaults to `data/national.csv` when neither this nor `url` is set.
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub year_column: String,
    /// Optional per-row provenance flag exposed by the store.
    pub predicted_column: String,
    pub derived: Vec<DerivedColumn>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            year_column: "Year".to_string(),
            predicted_column: "isPredicted".to_string(),
            derived: vec![DerivedColumn {
                name: "Total Renewable Energy (GWh)".to_string(),
                sum_of: SOURCE_TYPES.iter().map(|s| format!("{s} (GWh)")).collect(),
            }],
        }
    }
}

impl DatasetConfig {
    pub fn source(&self) -> SourceConfig {
        resolve_source(&self.path, &self.url)
            .unwrap_or_else(|| SourceConfig::Csv(PathBuf::from("data/national.csv")))
    }
}

const SOURCE_TYPES: [&str; 5] = ["Geothermal", "Hydro", "Biomass", "Solar", "Wind"];

/// One forecastable metric: a short request key and the dataset column it targets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    pub key: String,
    pub column: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrendConfig {
    pub model_dir: PathBuf,
    pub population_column: String,
    pub baseline_column: String,
    /// Share of rows held out for MAE/MSE diagnostics.
    pub test_fraction: f64,
    pub split_seed: u64,
    pub default_start_year: i32,
    pub default_end_year: i32,
    pub targets: Vec<TargetConfig>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            population_column: "Population (in millions)".to_string(),
            baseline_column: "Non-Renewable Energy (GWh)".to_string(),
            test_fraction: 0.2,
            split_seed: 42,
            default_start_year: 2024,
            default_end_year: 2040,
            targets: SOURCE_TYPES
                .iter()
                .map(|s| TargetConfig {
                    key: s.to_ascii_lowercase(),
                    column: format!("{s} (GWh)"),
                })
                .collect(),
        }
    }
}

impl TrendConfig {
    /// Resolve a request key (case-insensitive) to its target.
    pub fn target(&self, key: &str) -> Option<&TargetConfig> {
        let key = key.trim();
        self.targets
            .iter()
            .find(|t| t.key.eq_ignore_ascii_case(key))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegionalConfig {
    /// Defaults to the national dataset when neither `path` nor `url` is set.
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    /// Region whose generation and consumption totals are split across `sub_regions`.
    pub aggregate_region: String,
    /// Sub-region metric used as the numerator of the generation share.
    pub generation_metric: String,
    pub consumption_metric: String,
    pub sub_regions: Vec<String>,
    pub metrics: Vec<String>,
    pub default_target_year: i32,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            aggregate_region: "Visayas".to_string(),
            generation_metric: "Total Power Generation (GWh)".to_string(),
            consumption_metric: "Total Power Consumption (GWh)".to_string(),
            sub_regions: ["Bohol", "Cebu", "Negros", "Panay", "Leyte-Samar"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            metrics: [
                "Total Power Generation (GWh)",
                "Total Non-Renewable Energy (GWh)",
                "Total Renewable Energy (GWh)",
                "Geothermal (GWh)",
                "Hydro (GWh)",
                "Biomass (GWh)",
                "Solar (GWh)",
                "Wind (GWh)",
                "Visayas Total Power Consumption (GWh)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            default_target_year: 2026,
        }
    }
}

impl RegionalConfig {
    pub fn aggregate_generation_column(&self) -> String {
        format!("{} {}", self.aggregate_region, self.generation_metric)
    }

    pub fn aggregate_consumption_column(&self) -> String {
        format!("{} {}", self.aggregate_region, self.consumption_metric)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InvestmentConfig {
    /// CSV snapshot; defaults to `data/costs.csv` when neither this nor `url` is set.
    pub path: Option<PathBuf>,
    pub url: Option<String>,
    pub year_column: String,
    pub cost_column: String,
    pub price_column: String,
    /// Multiplier applied to raw cost values (PHP/W -> PHP/kW).
    pub cost_scale: f64,
    /// Predicted unit cost never drops below this value.
    pub cost_floor: f64,
    /// Energy produced per unit of capacity per day (kWh per kW).
    pub daily_yield_per_unit: f64,
    /// Evaluation budget for the non-linear refinement.
    pub max_evaluations: usize,
}

impl Default for InvestmentConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            year_column: "Year".to_string(),
            cost_column: "Solar Cost (PHP/W)".to_string(),
            price_column: "MERALCO Rate (PHP/kWh)".to_string(),
            cost_scale: 1000.0,
            cost_floor: 20_000.0,
            daily_yield_per_unit: 4.0,
            max_evaluations: 5000,
        }
    }
}

impl InvestmentConfig {
    pub fn source(&self) -> SourceConfig {
        resolve_source(&self.path, &self.url)
            .unwrap_or_else(|| SourceConfig::Csv(PathBuf::from("data/costs.csv")))
    }
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Config {
    /// Load from a TOML file and validate. A missing file yields the defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, AppError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found; using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::DataUnavailable(format!(
                    "failed to read config '{}': {e}",
                    path.display()
                )));
            }
        };
        Self::from_toml_str(&text)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, AppError> {
        let config: Config = toml::from_str(s)
            .map_err(|e| AppError::Config(vec![ConfigError::new("<toml>", e.to_string())]))?;
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(AppError::Config(errors))
        }
    }

    /// Load `path` if given, else the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        match path {
            Some(p) => Self::from_toml_file(p),
            None => Ok(Self::default()),
        }
    }

    /// The source of the regional dataset, falling back to the national one.
    pub fn regional_source(&self) -> SourceConfig {
        resolve_source(&self.regional.path, &self.regional.url)
            .unwrap_or_else(|| self.dataset.source())
    }

    /// Check semantic constraints. Returns all problems found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        check_source(&self.dataset.path, &self.dataset.url, "dataset", &mut errors);
        check_source(&self.regional.path, &self.regional.url, "regional", &mut errors);
        check_source(&self.investment.path, &self.investment.url, "investment", &mut errors);

        if self.dataset.year_column.trim().is_empty() {
            errors.push(ConfigError::new("dataset.year_column", "must not be empty"));
        }
        for (i, d) in self.dataset.derived.iter().enumerate() {
            if d.sum_of.is_empty() {
                errors.push(ConfigError::new(
                    format!("dataset.derived[{i}].sum_of"),
                    "must list at least one column",
                ));
            }
        }

        let trend = &self.trend;
        if !(trend.test_fraction > 0.0 && trend.test_fraction < 1.0) {
            errors.push(ConfigError::new("trend.test_fraction", "must be in (0.0, 1.0)"));
        }
        if trend.targets.is_empty() {
            errors.push(ConfigError::new("trend.targets", "must not be empty"));
        }
        let mut seen = HashSet::new();
        for t in &trend.targets {
            if !seen.insert(t.key.to_ascii_lowercase()) {
                errors.push(ConfigError::new(
                    "trend.targets",
                    format!("duplicate key `{}`", t.key),
                ));
            }
        }

        let regional = &self.regional;
        if regional.aggregate_region.trim().is_empty() {
            errors.push(ConfigError::new("regional.aggregate_region", "must not be empty"));
        }
        if regional.sub_regions.is_empty() {
            errors.push(ConfigError::new("regional.sub_regions", "must not be empty"));
        }
        if regional.metrics.is_empty() {
            errors.push(ConfigError::new("regional.metrics", "must not be empty"));
        }

        let inv = &self.investment;
        if !(inv.cost_scale.is_finite() && inv.cost_scale > 0.0) {
            errors.push(ConfigError::new("investment.cost_scale", "must be finite and > 0"));
        }
        if !(inv.cost_floor.is_finite() && inv.cost_floor > 0.0) {
            errors.push(ConfigError::new("investment.cost_floor", "must be finite and > 0"));
        }
        if !(inv.daily_yield_per_unit.is_finite() && inv.daily_yield_per_unit > 0.0) {
            errors.push(ConfigError::new(
                "investment.daily_yield_per_unit",
                "must be finite and > 0",
            ));
        }
        if inv.max_evaluations == 0 {
            errors.push(ConfigError::new("investment.max_evaluations", "must be > 0"));
        }

        errors
    }
}

fn check_source(
    path: &Option<PathBuf>,
    url: &Option<String>,
    section: &str,
    errors: &mut Vec<ConfigError>,
) {
    if path.is_some() && url.is_some() {
        errors.push(ConfigError::new(section, "set either `path` or `url`, not both"));
    }
    if let Some(url) = url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::new(
                format!("{section}.url"),
                "must start with http:// or https://",
            ));
        }
    }
}
