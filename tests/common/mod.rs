//! Shared fixtures for integration tests: on-disk CSV datasets and a config
//! pointing at them.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use energy_outlook::app::pipeline::Pipeline;
use energy_outlook::config::Config;
use energy_outlook::store::DirBlobStore;
use tempfile::TempDir;

pub const SOURCES: [&str; 5] = ["Geothermal", "Hydro", "Biomass", "Solar", "Wind"];

/// Sub-regions present in the national fixture (Negros deliberately absent).
pub const PRESENT_REGIONS: [&str; 4] = ["Bohol", "Cebu", "Panay", "Leyte-Samar"];

/// Years 2015..=2023, population +2%/yr, flat non-renewable baseline,
/// linear source outputs, Visayas aggregates and four sub-regions.
pub fn national_csv() -> String {
    let mut header = vec![
        "Year".to_string(),
        "isPredicted".to_string(),
        "Population (in millions)".to_string(),
        "Non-Renewable Energy (GWh)".to_string(),
    ];
    header.extend(SOURCES.iter().map(|s| format!("{s} (GWh)")));
    header.push("Visayas Total Power Generation (GWh)".to_string());
    header.push("Visayas Total Power Consumption (GWh)".to_string());
    for region in PRESENT_REGIONS {
        header.push(format!("{region} Total Power Generation (GWh)"));
        header.push(format!("{region} Solar (GWh)"));
    }

    let mut out = String::new();
    let quoted: Vec<String> = header.iter().map(|h| format!("\"{h}\"")).collect();
    writeln!(out, "{}", quoted.join(",")).unwrap();

    for (i, year) in (2015..=2023).enumerate() {
        let t = i as f64;
        let mut row = vec![
            year.to_string(),
            "false".to_string(),
            format!("{:.6}", 100.0 * 1.02f64.powi(i as i32)),
            "\"12,000\"".to_string(),
        ];
        for (k, _) in SOURCES.iter().enumerate() {
            row.push(format!("{}", 1000.0 + 100.0 * k as f64 + (10.0 + k as f64) * t));
        }
        row.push(format!("{}", 4000.0 + 100.0 * t));
        row.push(format!("{}", 3600.0 + 80.0 * t));
        for (r, _) in PRESENT_REGIONS.iter().enumerate() {
            row.push(format!("{}", 1000.0 + 25.0 * t + r as f64));
            row.push(format!("{}", 10.0 + t));
        }
        writeln!(out, "{}", row.join(",")).unwrap();
    }
    out
}

/// Cost (PHP/W) decaying exponentially and a gently rising utility rate.
pub fn costs_csv() -> String {
    costs_csv_with_rate(|t| 9.0 + 0.35 * t + 0.01 * t * t)
}

pub fn costs_csv_with_rate(rate: impl Fn(f64) -> f64) -> String {
    let mut out = String::from("Year,Solar Cost (PHP/W),MERALCO Rate (PHP/kWh)\n");
    for (i, year) in (2012..=2023).enumerate() {
        let t = i as f64;
        let cost = 90.0 * (-0.22 * t).exp() + 35.0;
        writeln!(out, "{year},{cost:.6},{:.6}", rate(t)).unwrap();
    }
    out
}

pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
}

impl Fixture {
    pub fn new(national: &str, costs: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let national_path = dir.path().join("national.csv");
        let costs_path = dir.path().join("costs.csv");
        fs::write(&national_path, national).unwrap();
        fs::write(&costs_path, costs).unwrap();

        let mut config = Config::default();
        config.dataset.path = Some(national_path);
        config.investment.path = Some(costs_path);
        config.trend.model_dir = dir.path().join("models");
        assert!(config.validate().is_empty());

        Self { dir, config }
    }

    pub fn standard() -> Self {
        Self::new(&national_csv(), &costs_csv())
    }

    pub fn pipeline(&self) -> Pipeline<DirBlobStore> {
        Pipeline::from_config(self.config.clone()).unwrap()
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    pub fn model_dir(&self) -> &Path {
        &self.config.trend.model_dir
    }
}
