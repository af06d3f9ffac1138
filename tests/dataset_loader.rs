use std::fs;

use energy_outlook::config::DerivedColumn;
use energy_outlook::domain::Provenance;
use energy_outlook::io::{CsvFileSource, LoadOptions, load_dataset};

const GAPPY: &str = "\
Year,isPredicted,Population (in millions),Solar (GWh),Wind (GWh)
2018,false,,\"1,200\",5
2019,false,101,,abc
2020,no,102,1300,
2021,true,103,\" 1 400 \",8
bad,false,104,1500,9
2021,false,999,999,999
";

fn options() -> LoadOptions {
    LoadOptions {
        year_column: "Year".to_string(),
        predicted_column: Some("isPredicted".to_string()),
        derived: vec![DerivedColumn {
            name: "Total (GWh)".to_string(),
            sum_of: vec!["Solar (GWh)".to_string(), "Wind (GWh)".to_string()],
        }],
    }
}

fn load() -> energy_outlook::io::LoadedDataset {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gappy.csv");
    fs::write(&path, GAPPY).unwrap();
    load_dataset(&CsvFileSource::new(&path), &options()).unwrap()
}

#[test]
fn forward_fill_keeps_leading_gap_and_carries_values() {
    let ds = load();
    assert_eq!(ds.raw.years(), vec![2018, 2019, 2020, 2021]);

    let pop = ds.filled.series("Population (in millions)").unwrap();
    assert_eq!(pop, vec![None, Some(101.0), Some(102.0), Some(103.0)]);

    let solar = ds.filled.series("Solar (GWh)").unwrap();
    assert_eq!(solar, vec![Some(1200.0), Some(1200.0), Some(1300.0), Some(1400.0)]);

    // Non-numeric text is missing, then carried forward like any gap.
    let wind_raw = ds.raw.series("Wind (GWh)").unwrap();
    assert_eq!(wind_raw, vec![Some(5.0), None, None, Some(8.0)]);
    let wind = ds.filled.series("Wind (GWh)").unwrap();
    assert_eq!(wind, vec![Some(5.0), Some(5.0), Some(5.0), Some(8.0)]);
}

#[test]
fn forward_fill_is_idempotent() {
    let ds = load();
    let once = ds.raw.forward_filled();
    let twice = once.forward_filled();
    assert_eq!(once.records(), twice.records());
}

#[test]
fn derived_total_uses_filled_values() {
    let ds = load();
    let total = ds.filled.series("Total (GWh)").unwrap();
    assert_eq!(total, vec![Some(1205.0), Some(1205.0), Some(1305.0), Some(1408.0)]);
    assert!(!ds.raw.has_column("Total (GWh)"));
}

#[test]
fn predicted_flag_is_preserved() {
    let ds = load();
    let flags: Vec<Provenance> = ds.raw.records().iter().map(|r| r.provenance).collect();
    assert_eq!(
        flags,
        vec![Provenance::Actual, Provenance::Actual, Provenance::Actual, Provenance::Predicted]
    );
}

#[test]
fn bad_and_duplicate_years_are_row_errors() {
    let ds = load();
    assert_eq!(ds.rows_read, 6);
    assert_eq!(ds.row_errors.len(), 2);
    assert!(ds.row_errors[0].message.contains("invalid year"));
    assert!(ds.row_errors[1].message.contains("duplicate year 2021"));
    // The first 2021 row wins.
    let r = ds.raw.record_for_year(2021).unwrap();
    assert_eq!(r.values[0], Some(103.0));
}

#[test]
fn missing_file_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(&CsvFileSource::new(dir.path().join("nope.csv")), &options()).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}
