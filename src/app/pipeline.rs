//! The engine facade shared by the CLI and any embedding caller.
//!
//! A `Pipeline` owns the configured dataset sources, the model store and the
//! curve cache. Every call reads its dataset afresh from the source, so callers
//! always see the most recent forward-filled snapshot. Fitted cost/price curves
//! are reused while the cost dataset fingerprint is unchanged;
//! [`Pipeline::reload`] drops them explicitly.

use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::domain::{FittedTrendModel, ForecastPoint, InvestmentResult, RegionalForecast};
use crate::error::AppError;
use crate::forecast::{regional, trend};
use crate::io::{DatasetSource, LoadOptions, LoadedDataset, load_dataset, open_source};
use crate::recommend::{CurveCache, recommend, validate_budget};
use crate::store::{BlobStore, DirBlobStore, ModelStore};

/// A dataset source paired with how to load it.
struct DatasetHandle {
    source: Box<dyn DatasetSource>,
    options: LoadOptions,
}

impl DatasetHandle {
    fn new(source: Box<dyn DatasetSource>, options: LoadOptions) -> Self {
        Self { source, options }
    }

    fn load(&self) -> Result<Arc<LoadedDataset>, AppError> {
        load_dataset(self.source.as_ref(), &self.options).map(Arc::new)
    }
}

/// Sources the pipeline reads from.
pub struct Sources {
    pub national: Box<dyn DatasetSource>,
    /// `None` when the regional columns live in the national dataset.
    pub regional: Option<Box<dyn DatasetSource>>,
    pub costs: Box<dyn DatasetSource>,
}

pub struct Pipeline<B: BlobStore = DirBlobStore> {
    config: Config,
    national: DatasetHandle,
    regional: Option<DatasetHandle>,
    costs: DatasetHandle,
    store: ModelStore<B>,
    curves: CurveCache,
}

impl Pipeline<DirBlobStore> {
    /// Open every source named by `config`; models live under `trend.model_dir`.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let national_cfg = config.dataset.source();
        let regional_cfg = config.regional_source();
        let sources = Sources {
            national: open_source(&national_cfg)?,
            regional: if regional_cfg == national_cfg {
                None
            } else {
                Some(open_source(&regional_cfg)?)
            },
            costs: open_source(&config.investment.source())?,
        };
        let blobs = DirBlobStore::new(config.trend.model_dir.clone());
        Ok(Self::with_parts(config, sources, blobs))
    }
}

impl<B: BlobStore> Pipeline<B> {
    pub fn with_parts(config: Config, sources: Sources, blobs: B) -> Self {
        let national_opts = LoadOptions {
            year_column: config.dataset.year_column.clone(),
            predicted_column: Some(config.dataset.predicted_column.clone()),
            derived: config.dataset.derived.clone(),
        };
        let cost_opts = LoadOptions::new(config.investment.year_column.clone());

        Self {
            regional: sources
                .regional
                .map(|s| DatasetHandle::new(s, national_opts.clone())),
            national: DatasetHandle::new(sources.national, national_opts),
            costs: DatasetHandle::new(sources.costs, cost_opts),
            store: ModelStore::new(blobs),
            curves: CurveCache::new(),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ModelStore<B> {
        &self.store
    }

    pub fn national_dataset(&self) -> Result<Arc<LoadedDataset>, AppError> {
        self.national.load()
    }

    pub fn regional_dataset(&self) -> Result<Arc<LoadedDataset>, AppError> {
        match &self.regional {
            Some(handle) => handle.load(),
            None => self.national.load(),
        }
    }

    pub fn cost_dataset(&self) -> Result<Arc<LoadedDataset>, AppError> {
        self.costs.load()
    }

    /// Predict `metric` for every year in `[start_year, end_year]` with its stored model.
    ///
    /// `start_year > end_year` yields an empty sequence.
    pub fn forecast_trend(
        &self,
        metric: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<ForecastPoint>, AppError> {
        let target = self
            .config
            .trend
            .target(metric)
            .ok_or_else(|| AppError::NotFound(metric.to_string()))?;
        let model = self.store.load(&target.key)?;
        let dataset = self.national_dataset()?;
        trend::forecast(&model, &dataset.filled, &self.config.trend, start_year, end_year)
    }

    /// Sub-region estimates for `target_year`; missing sub-regions become diagnostics.
    pub fn forecast_regional(&self, target_year: i32) -> Result<RegionalForecast, AppError> {
        let dataset = self.regional_dataset()?;
        regional::disaggregate(&dataset.raw, &self.config.regional, target_year)
    }

    /// Capacity, savings and payback for `budget` invested in `target_year`.
    pub fn recommend_investment(&self, budget: f64, target_year: i32) -> Result<InvestmentResult, AppError> {
        validate_budget(budget)?;
        let dataset = self.cost_dataset()?;
        let curves = self.curves.get_or_fit(&dataset.raw, &self.config.investment)?;
        recommend(&curves, &self.config.investment, budget, target_year)
    }

    /// Train and persist the model for one configured metric.
    pub fn train(&self, metric: &str) -> Result<FittedTrendModel, AppError> {
        let target = self
            .config
            .trend
            .target(metric)
            .ok_or_else(|| AppError::NotFound(metric.to_string()))?;
        let dataset = self.national_dataset()?;
        let model = trend::train(&dataset.filled, target, &self.config.trend)?;
        self.store.save(&model)?;
        Ok(model)
    }

    /// Offline training pass: one model per configured target, each persisted.
    pub fn train_all(&self) -> Result<Vec<FittedTrendModel>, AppError> {
        let models = self
            .config
            .trend
            .targets
            .iter()
            .map(|t| self.train(&t.key))
            .collect::<Result<Vec<_>, _>>()?;
        info!(models = models.len(), "training pass complete");
        Ok(models)
    }

    /// Drop the fitted cost/price curves so the next recommendation refits.
    pub fn reload(&self) {
        self.curves.invalidate();
        info!("curve cache cleared");
    }

    pub fn curves_cached(&self) -> bool {
        self.curves.is_cached()
    }
}
