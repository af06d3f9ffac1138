//! Export results to CSV or JSON.
//!
//! The format is picked from the file extension: `.csv` writes one row per
//! record, anything else writes pretty-printed JSON.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// Write a sequence of flat records (forecast points, regional rows).
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AppError> {
    match ExportFormat::from_path(path) {
        ExportFormat::Csv => write_csv(path, records),
        ExportFormat::Json => write_json(path, &records),
    }
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(|e| {
        AppError::Io(std::io::Error::other(format!(
            "failed to write JSON '{}': {e}",
            path.display()
        )))
    })
}

fn write_csv<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for r in records {
        writer.serialize(r).map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_error(path: &Path, e: csv::Error) -> AppError {
    AppError::Io(std::io::Error::other(format!(
        "failed to write CSV '{}': {e}",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ForecastPoint, Provenance, RegionalEstimate, RegionalKind};

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("out.CSV")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Json);
    }

    #[test]
    fn csv_export_writes_header_and_blank_for_undefined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regional.csv");
        let rows = vec![RegionalEstimate {
            year: 2030,
            region: "Cebu".into(),
            label: "Cebu Estimated Consumption (GWh)".into(),
            kind: RegionalKind::EstimatedConsumption,
            value: None,
        }];
        write_records(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("year,region,label,kind,value"));
        assert_eq!(
            lines.next(),
            Some("2030,Cebu,Cebu Estimated Consumption (GWh),estimated_consumption,")
        );
    }

    #[test]
    fn json_export_round_trips_forecast_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trend.json");
        let points = vec![ForecastPoint {
            year: 2024,
            value: 12.5,
            provenance: Provenance::Predicted,
        }];
        write_records(&path, &points).unwrap();
        let back: Vec<ForecastPoint> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, points);
    }
}
