//! Dataset Loader: turns an untyped table into an ordered-by-year `HistoricalDataset`.
//!
//! Responsibilities:
//! - locate the year column and the optional provenance flag column
//! - coerce every other cell to a number (thousands separators stripped,
//!   failures become missing rather than errors)
//! - skip rows with an unusable or duplicate year, reporting them as row errors
//! - produce both the raw table and a forward-filled copy with derived columns
//!
//! No fitting logic lives here.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::DerivedColumn;
use crate::domain::{HistoricalDataset, HistoricalRecord, Provenance, RowError, normalize_column_name};
use crate::error::AppError;
use crate::io::source::{DatasetSource, RawTable};

/// How to interpret a raw table.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub year_column: String,
    /// Column carrying the store's predicted flag, if the store exposes one.
    pub predicted_column: Option<String>,
    /// Composite columns added to the forward-filled table.
    pub derived: Vec<DerivedColumn>,
}

impl LoadOptions {
    pub fn new(year_column: impl Into<String>) -> Self {
        Self {
            year_column: year_column.into(),
            predicted_column: None,
            derived: Vec::new(),
        }
    }
}

/// Loader output.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    /// Values exactly as parsed (missing stays missing).
    pub raw: HistoricalDataset,
    /// Forward-filled values plus derived columns.
    pub filled: HistoricalDataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub source: String,
}

/// Fetch all rows from `source` and build the dataset.
pub fn load_dataset(source: &dyn DatasetSource, opts: &LoadOptions) -> Result<LoadedDataset, AppError> {
    let location = source.describe();
    let table = source.fetch_all()?;
    let mut loaded = build_dataset(table, opts)?;
    loaded.source = location;

    info!(
        source = %loaded.source,
        rows = loaded.raw.len(),
        columns = loaded.raw.columns().len(),
        skipped = loaded.row_errors.len(),
        "dataset loaded"
    );
    for e in &loaded.row_errors {
        warn!(source = %loaded.source, line = e.line, "{}", e.message);
    }

    Ok(loaded)
}

/// Build the dataset from an already-fetched table.
pub fn build_dataset(table: RawTable, opts: &LoadOptions) -> Result<LoadedDataset, AppError> {
    let year_key = normalize_column_name(&opts.year_column);
    let year_idx = table
        .headers
        .iter()
        .position(|h| normalize_column_name(h) == year_key)
        .ok_or_else(|| {
            AppError::DataUnavailable(format!("missing required column `{}`", opts.year_column))
        })?;

    let flag_idx = opts.predicted_column.as_ref().and_then(|name| {
        let key = normalize_column_name(name);
        table
            .headers
            .iter()
            .position(|h| normalize_column_name(h) == key)
    });

    // Value columns: everything except year/flag, first occurrence of a name wins.
    let mut seen = HashSet::new();
    let value_cols: Vec<(usize, String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != year_idx && Some(*i) != flag_idx)
        .filter(|(_, h)| !h.trim().is_empty() && seen.insert(normalize_column_name(h)))
        .map(|(i, h)| (i, h.trim().to_string()))
        .collect();

    let mut row_errors = table.row_errors;
    let rows_read = table.rows.len() + row_errors.len();
    let mut years_seen = HashSet::new();
    let mut records = Vec::with_capacity(table.rows.len());

    for row in table.rows {
        let cell = |i: usize| row.cells.get(i).and_then(|c| c.as_deref());

        let year = match cell(year_idx).map(parse_year) {
            Some(Ok(y)) => y,
            Some(Err(msg)) => {
                row_errors.push(RowError { line: row.line, message: msg });
                continue;
            }
            None => {
                row_errors.push(RowError {
                    line: row.line,
                    message: format!("missing `{}` value", opts.year_column),
                });
                continue;
            }
        };

        if !years_seen.insert(year) {
            row_errors.push(RowError {
                line: row.line,
                message: format!("duplicate year {year}; keeping the first occurrence"),
            });
            continue;
        }

        let provenance = match flag_idx.and_then(cell) {
            Some(text) => match parse_flag(text) {
                Some(true) => Provenance::Predicted,
                Some(false) => Provenance::Actual,
                None => {
                    debug!(line = row.line, value = text, "unrecognized predicted flag; treating as actual");
                    Provenance::Actual
                }
            },
            None => Provenance::Actual,
        };

        let values = value_cols
            .iter()
            .map(|(i, _)| cell(*i).and_then(parse_number))
            .collect();

        records.push(HistoricalRecord {
            year,
            provenance,
            values,
        });
    }

    if records.is_empty() {
        return Err(AppError::DataUnavailable(
            "no usable rows (every row lacked a valid year)".to_string(),
        ));
    }

    let columns = value_cols.into_iter().map(|(_, h)| h).collect();
    let raw = HistoricalDataset::new(columns, records);
    let filled = add_derived_columns(raw.forward_filled(), &opts.derived);

    Ok(LoadedDataset {
        raw,
        filled,
        row_errors,
        rows_read,
        source: String::new(),
    })
}

/// Add composite columns as the row-wise sum of their components.
///
/// A column already present in the source is left untouched; a row sum is
/// missing if any component is missing.
pub fn add_derived_columns(mut dataset: HistoricalDataset, derived: &[DerivedColumn]) -> HistoricalDataset {
    for d in derived {
        if dataset.has_column(&d.name) {
            debug!(column = %d.name, "derived column supplied by source; keeping source values");
            continue;
        }

        let mut parts = Vec::with_capacity(d.sum_of.len());
        for name in &d.sum_of {
            match dataset.series(name) {
                Some(s) => parts.push(s),
                None => {
                    warn!(column = %d.name, missing = %name, "cannot derive column; component absent");
                    break;
                }
            }
        }
        if parts.len() != d.sum_of.len() {
            continue;
        }

        let sums = (0..dataset.len())
            .map(|row| parts.iter().map(|p| p[row]).sum::<Option<f64>>())
            .collect();
        dataset = dataset.with_column(&d.name, sums);
    }
    dataset
}

/// Parse a numeric cell. Thousands separators and inner spaces are stripped;
/// anything unparseable or non-finite is missing.
pub fn parse_number(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '_'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let v = cleaned.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn parse_year(s: &str) -> Result<i32, String> {
    let v = parse_number(s).ok_or_else(|| format!("invalid year '{s}'"))?;
    if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
        return Err(format!("invalid year '{s}' (must be a whole number)"));
    }
    Ok(v as i32)
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "predicted" => Some(true),
        "false" | "0" | "no" | "n" | "actual" => Some(false),
        _ => None,
    }
}
