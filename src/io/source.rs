//! Backing stores for historical tables.
//!
//! The loader only needs "fetch all rows". Two sources are supported:
//!
//! - a static CSV snapshot on disk
//! - a live record store exposing every row as a JSON array of objects over HTTP
//!
//! Both produce a `RawTable` of untyped cells; typing, gap-filling and derived
//! columns happen in `ingest`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::domain::RowError;
use crate::error::AppError;

/// Environment variable holding an optional bearer token for the live store.
pub const STORE_TOKEN_ENV: &str = "OUTLOOK_STORE_TOKEN";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One untyped row. Empty cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<Option<String>>,
}

/// Untyped table as delivered by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Rows the source itself could not decode.
    pub row_errors: Vec<RowError>,
}

pub trait DatasetSource: Send + Sync {
    /// Fetch every row of the table.
    fn fetch_all(&self) -> Result<RawTable, AppError>;

    /// Human-readable location for logs and errors.
    fn describe(&self) -> String;
}

/// Build the source named by configuration.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn DatasetSource>, AppError> {
    match config {
        SourceConfig::Csv(path) => Ok(Box::new(CsvFileSource::new(path))),
        SourceConfig::Http(url) => Ok(Box::new(HttpJsonSource::from_env(url)?)),
    }
}

pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetSource for CsvFileSource {
    fn fetch_all(&self) -> Result<RawTable, AppError> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::DataUnavailable(format!("failed to open '{}': {e}", self.path.display()))
        })?;
        read_csv(file)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read CSV from any reader (used by `CsvFileSource` and tests).
pub fn read_csv<R: std::io::Read>(reader: R) -> Result<RawTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::DataUnavailable(format!("failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut table = RawTable {
        headers,
        ..RawTable::default()
    };

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; lines are 1-based.
        let line = idx + 2;
        match result {
            Ok(record) => {
                let mut cells: Vec<Option<String>> = record
                    .iter()
                    .map(|c| (!c.is_empty()).then(|| c.to_string()))
                    .collect();
                cells.resize(table.headers.len(), None);
                table.rows.push(RawRow { line, cells });
            }
            Err(e) => table.row_errors.push(RowError {
                line,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(table)
}

pub struct HttpJsonSource {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpJsonSource {
    /// Build a client for `url`, picking up an optional bearer token from `.env`/environment.
    pub fn from_env(url: &str) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let token = std::env::var(STORE_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::DataUnavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
            token,
        })
    }
}

impl DatasetSource for HttpJsonSource {
    fn fetch_all(&self) -> Result<RawTable, AppError> {
        let mut req = self.client.get(&self.url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .map_err(|e| AppError::DataUnavailable(format!("request to {} failed: {e}", self.url)))?;

        if !resp.status().is_success() {
            return Err(AppError::DataUnavailable(format!(
                "request to {} failed with status {}",
                self.url,
                resp.status()
            )));
        }

        let body: Value = resp.json().map_err(|e| {
            AppError::DataUnavailable(format!("failed to parse response from {}: {e}", self.url))
        })?;

        table_from_json(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Convert a store response into a `RawTable`.
///
/// Accepts either a bare array of row objects or an envelope `{"data": [...]}`.
/// Headers are the union of keys in first-seen order.
pub fn table_from_json(body: &Value) -> Result<RawTable, AppError> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(AppError::DataUnavailable(
                    "store response has no `data` array".to_string(),
                ));
            }
        },
        _ => {
            return Err(AppError::DataUnavailable(
                "store response is not an array of rows".to_string(),
            ));
        }
    };

    let mut table = RawTable::default();
    for row in rows {
        if let Value::Object(obj) = row {
            for key in obj.keys() {
                if !table.headers.iter().any(|h| h == key) {
                    table.headers.push(key.clone());
                }
            }
        }
    }

    for (idx, row) in rows.iter().enumerate() {
        let line = idx + 1;
        let Value::Object(obj) = row else {
            table.row_errors.push(RowError {
                line,
                message: "row is not a JSON object".to_string(),
            });
            continue;
        };
        let cells = table
            .headers
            .iter()
            .map(|h| obj.get(h).and_then(cell_text))
            .collect();
        table.rows.push(RawRow { line, cells });
    }

    Ok(table)
}

fn cell_text(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn csv_empty_cells_become_none_and_short_rows_are_padded() {
        let data = "Year,Solar (GWh),Wind (GWh)\n2020,1,\n2021,\"1,250\"\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].cells[2], None);
        assert_eq!(table.rows[1].cells[1].as_deref(), Some("1,250"));
        assert_eq!(table.rows[1].cells[2], None);
        assert_eq!(table.rows[1].line, 3);
    }

    #[test]
    fn json_rows_union_headers_and_keep_flags() {
        let body = json!([
            {"Year": 2020, "Solar (GWh)": "1,200", "isPredicted": false},
            {"Year": 2021, "Wind (GWh)": 3.5, "isPredicted": true},
            "garbage"
        ]);
        let table = table_from_json(&body).unwrap();
        assert!(table.headers.contains(&"Wind (GWh)".to_string()));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.row_errors.len(), 1);
        assert_eq!(table.row_errors[0].line, 3);

        let flag_idx = table.headers.iter().position(|h| h == "isPredicted").unwrap();
        assert_eq!(table.rows[1].cells[flag_idx].as_deref(), Some("true"));
    }

    #[test]
    fn json_envelope_is_accepted() {
        let body = json!({"data": [{"Year": 2020}]});
        assert_eq!(table_from_json(&body).unwrap().rows.len(), 1);
        assert!(table_from_json(&json!({"rows": []})).is_err());
    }
}
