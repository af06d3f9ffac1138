//! In-memory historical table: one record per year, one value per column.
//!
//! Values are `Option<f64>`; `None` means "missing" and is never coerced to zero.
//! Records are kept sorted by year and years are unique.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Whether a value was observed or extrapolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Actual,
    Predicted,
}

impl Provenance {
    pub fn is_predicted(self) -> bool {
        self == Provenance::Predicted
    }
}

/// One row of the historical dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalRecord {
    pub year: i32,
    pub provenance: Provenance,
    /// Indexed like `HistoricalDataset::columns`.
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<HistoricalRecord>,
}

impl HistoricalDataset {
    /// Build a dataset; records are sorted by year.
    ///
    /// # Panics
    /// Panics if a record's value count differs from the column count.
    pub fn new(columns: Vec<String>, mut records: Vec<HistoricalRecord>) -> Self {
        for r in &records {
            assert_eq!(
                r.values.len(),
                columns.len(),
                "record for {} has {} values, expected {}",
                r.year,
                r.values.len(),
                columns.len()
            );
        }
        records.sort_by_key(|r| r.year);
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_column_name(name), i))
            .collect();
        Self {
            columns,
            index,
            records,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column position, matched case-insensitively and ignoring surrounding whitespace.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_column_name(name)).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn years(&self) -> Vec<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.records.last().map(|r| r.year)
    }

    pub fn record_for_year(&self, year: i32) -> Option<&HistoricalRecord> {
        self.records
            .binary_search_by_key(&year, |r| r.year)
            .ok()
            .map(|i| &self.records[i])
    }

    /// Full column as stored (including missing values), ordered by year.
    pub fn series(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.records.iter().map(|r| r.values[idx]).collect())
    }

    /// `(year, value)` pairs of a column with missing values dropped.
    pub fn observed(&self, name: &str) -> Option<Vec<(i32, f64)>> {
        let idx = self.column_index(name)?;
        Some(
            self.records
                .iter()
                .filter_map(|r| r.values[idx].map(|v| (r.year, v)))
                .collect(),
        )
    }

    /// Carry the last observed value of every column forward into missing cells.
    ///
    /// Leading missing values stay missing (no backward fill).
    pub fn forward_filled(&self) -> Self {
        let mut out = self.clone();
        let mut last: Vec<Option<f64>> = vec![None; self.columns.len()];
        for record in &mut out.records {
            for (slot, carried) in record.values.iter_mut().zip(last.iter_mut()) {
                match slot {
                    Some(v) => *carried = Some(*v),
                    None => *slot = *carried,
                }
            }
        }
        out
    }

    /// Append a column (replacing one of the same name).
    pub fn with_column(mut self, name: &str, values: Vec<Option<f64>>) -> Self {
        assert_eq!(values.len(), self.records.len(), "column length mismatch");
        match self.column_index(name) {
            Some(idx) => {
                for (r, v) in self.records.iter_mut().zip(values) {
                    r.values[idx] = v;
                }
            }
            None => {
                self.index
                    .insert(normalize_column_name(name), self.columns.len());
                self.columns.push(name.to_string());
                for (r, v) in self.records.iter_mut().zip(values) {
                    r.values.push(v);
                }
            }
        }
        self
    }

    /// Stable fingerprint of the table contents (columns, years, flags and value bits).
    pub fn fingerprint(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut h = DefaultHasher::new();
        self.columns.hash(&mut h);
        for r in &self.records {
            r.year.hash(&mut h);
            r.provenance.hash(&mut h);
            for v in &r.values {
                v.map(f64::to_bits).hash(&mut h);
            }
        }
        h.finish()
    }
}

pub fn normalize_column_name(name: &str) -> String {
    // Spreadsheet exports sometimes carry a BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, values: &[Option<f64>]) -> HistoricalRecord {
        HistoricalRecord {
            year,
            provenance: Provenance::Actual,
            values: values.to_vec(),
        }
    }

    fn sample() -> HistoricalDataset {
        HistoricalDataset::new(
            vec!["Solar (GWh)".into(), "Wind (GWh)".into()],
            vec![
                record(2021, &[Some(2.0), None]),
                record(2020, &[None, None]),
                record(2022, &[None, Some(5.0)]),
                record(2023, &[Some(4.0), None]),
            ],
        )
    }

    #[test]
    fn records_are_sorted_by_year() {
        assert_eq!(sample().years(), vec![2020, 2021, 2022, 2023]);
    }

    #[test]
    fn forward_fill_carries_values_but_not_backwards() {
        let filled = sample().forward_filled();
        assert_eq!(
            filled.series("Solar (GWh)").unwrap(),
            vec![None, Some(2.0), Some(2.0), Some(4.0)]
        );
        assert_eq!(
            filled.series("wind (gwh)").unwrap(),
            vec![None, None, Some(5.0), Some(5.0)]
        );
    }

    #[test]
    fn forward_fill_is_idempotent() {
        let once = sample().forward_filled();
        let twice = once.forward_filled();
        assert_eq!(once.records(), twice.records());
    }

    #[test]
    fn observed_drops_missing_values() {
        assert_eq!(
            sample().observed("Solar (GWh)").unwrap(),
            vec![(2021, 2.0), (2023, 4.0)]
        );
        assert!(sample().observed("Hydro (GWh)").is_none());
    }

    #[test]
    fn fingerprint_changes_with_values() {
        let a = sample();
        let b = sample().with_column("Solar (GWh)", vec![None, Some(2.5), None, Some(4.0)]);
        assert_eq!(a.fingerprint(), sample().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
