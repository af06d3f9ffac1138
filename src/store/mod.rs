//! Model Store: one persisted trend model per target metric.
//!
//! Storage is a key -> bytes abstraction ([`BlobStore`]); the encoding of a
//! model into bytes lives in [`ModelStore`]. Blobs are a small JSON envelope:
//!
//! ```json
//! { "format_version": 1, "model": { ... } }
//! ```
//!
//! A missing key, an unknown `format_version` or an undecodable blob all
//! surface as `ModelUnavailable`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::FittedTrendModel;
use crate::error::AppError;

pub const FORMAT_VERSION: u32 = 1;

const BLOB_SUFFIX: &str = ".model.json";

/// Normalized store key for a metric name: lowercase, whitespace to `_`,
/// other punctuation dropped, with a `_gwh` suffix.
///
/// `"solar"`, `"Solar"` and `"Solar (GWh)"` all map to `"solar_gwh"`.
pub fn normalize_metric_key(metric: &str) -> String {
    let mut key = String::with_capacity(metric.len() + 4);
    for word in metric.split_whitespace() {
        let word: String = word
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if word.is_empty() {
            continue;
        }
        if !key.is_empty() {
            key.push('_');
        }
        key.push_str(&word);
    }
    if !key.ends_with("_gwh") {
        key.push_str("_gwh");
    }
    key
}

/// Opaque key -> bytes storage.
pub trait BlobStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError>;
    fn keys(&self) -> Result<Vec<String>, AppError>;
}

/// One `<key>.model.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct DirBlobStore {
    dir: PathBuf,
}

impl DirBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}{BLOB_SUFFIX}"))
    }
}

impl BlobStore for DirBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::DataUnavailable(format!(
                "failed to read '{}': {e}",
                path.display()
            ))),
        }
    }

    /// Write to a temp file in the same directory, then rename over the target.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}{BLOB_SUFFIX}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "blob written");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, AppError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(BLOB_SUFFIX) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.blobs.read().get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        self.blobs.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, AppError> {
        Ok(self.blobs.read().keys().cloned().collect())
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    format_version: u32,
    model: &'a FittedTrendModel,
}

#[derive(Deserialize)]
struct RawEnvelope {
    format_version: u32,
    model: serde_json::Value,
}

/// Encode/decode trend models over a blob store.
#[derive(Debug)]
pub struct ModelStore<B: BlobStore> {
    blobs: B,
}

impl<B: BlobStore> ModelStore<B> {
    pub fn new(blobs: B) -> Self {
        Self { blobs }
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Load the model for `metric` (any spelling that normalizes to its key).
    pub fn load(&self, metric: &str) -> Result<FittedTrendModel, AppError> {
        let key = normalize_metric_key(metric);
        let bytes = self
            .blobs
            .get(&key)?
            .ok_or_else(|| AppError::model_unavailable(&key, "no trained model"))?;
        let model = decode(&key, &bytes)?;
        info!(metric = %key, "trend model loaded");
        Ok(model)
    }

    /// Persist `model`, replacing any previous model for the same metric.
    pub fn save(&self, model: &FittedTrendModel) -> Result<(), AppError> {
        let key = normalize_metric_key(&model.metric);
        let bytes = serde_json::to_vec_pretty(&Envelope {
            format_version: FORMAT_VERSION,
            model,
        })
        .map_err(|e| AppError::NumericalFailure(format!("failed to encode model `{key}`: {e}")))?;
        self.blobs.put(&key, &bytes)?;
        info!(metric = %key, "trend model saved");
        Ok(())
    }

    pub fn keys(&self) -> Result<Vec<String>, AppError> {
        self.blobs.keys()
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<FittedTrendModel, AppError> {
    let raw: RawEnvelope = serde_json::from_slice(bytes)
        .map_err(|e| AppError::model_unavailable(key, format!("corrupt model blob: {e}")))?;
    if raw.format_version != FORMAT_VERSION {
        return Err(AppError::model_unavailable(
            key,
            format!("unsupported format_version {}", raw.format_version),
        ));
    }
    serde_json::from_value(raw.model)
        .map_err(|e| AppError::model_unavailable(key, format!("corrupt model blob: {e}")))
}
