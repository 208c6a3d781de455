//! Preference Store
//!
//! A JSON object mapping judge id or label to a non-negative multiplier.
//! Reads are scoped: the file is read once and the weights are returned by
//! value, so nothing is held across an evaluation run. Every write is a
//! read-modify-write under a [`StoreLock`] and lands through a temp file
//! rename.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::lockfile::StoreLock;
use super::StorageError;
use crate::types::JudgeProfile;

/// Weight applied when a judge has no stored preference.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// How long a writer waits for another writer.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Snapshot of stored weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceWeights {
    weights: BTreeMap<String, f64>,
}

impl PreferenceWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(key.into(), sanitize(weight));
        self
    }

    /// Weight for a judge: by id, then by label, else [`DEFAULT_WEIGHT`].
    pub fn weight_for(&self, judge: &JudgeProfile) -> f64 {
        self.weights
            .get(&judge.id)
            .or_else(|| self.weights.get(&judge.label))
            .copied()
            .unwrap_or(DEFAULT_WEIGHT)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.weights.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn from_json(value: &Value) -> Self {
        let mut weights = BTreeMap::new();
        if let Value::Object(map) = value {
            for (key, v) in map {
                match v.as_f64() {
                    Some(w) => {
                        weights.insert(key.clone(), sanitize(w));
                    }
                    None => warn!(key = %key, "Ignoring non-numeric preference weight"),
                }
            }
        } else {
            warn!("Preference file is not a JSON object, ignoring contents");
        }
        Self { weights }
    }

    fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .weights
            .iter()
            .map(|(k, v)| (k.clone(), Value::from(*v)))
            .collect();
        Value::Object(map)
    }
}

/// Negative and non-finite weights collapse to 0.
fn sanitize(weight: f64) -> f64 {
    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

/// File-backed preference store.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current weights. A missing file is an empty store.
    pub fn load(&self) -> Result<PreferenceWeights, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No preference file, using default weights");
                return Ok(PreferenceWeights::new());
            }
            Err(e) => return Err(StorageError::Io(self.path.clone(), e)),
        };
        if contents.trim().is_empty() {
            return Ok(PreferenceWeights::new());
        }
        let value: Value = serde_json::from_str(&contents)
            .map_err(|e| StorageError::Parse(self.path.clone(), e))?;
        Ok(PreferenceWeights::from_json(&value))
    }

    /// Add `delta` to a key's weight (starting from the default), clamped at 0.
    /// Returns the stored weight.
    pub fn adjust(&self, key: &str, delta: f64) -> Result<f64, StorageError> {
        self.update(key, |current| current + delta)
    }

    /// Overwrite a key's weight, clamped at 0.
    pub fn set(&self, key: &str, weight: f64) -> Result<f64, StorageError> {
        self.update(key, |_| weight)
    }

    fn update(&self, key: &str, f: impl FnOnce(f64) -> f64) -> Result<f64, StorageError> {
        if key.trim().is_empty() {
            return Err(StorageError::InvalidKey);
        }
        let _lock = StoreLock::acquire(&self.path, LOCK_TIMEOUT)?;

        let mut weights = self.load()?;
        let current = weights.get(key).unwrap_or(DEFAULT_WEIGHT);
        let updated = sanitize(f(current));
        weights.weights.insert(key.to_string(), updated);
        self.write(&weights)?;

        info!(key, previous = current, weight = updated, "Preference weight updated");
        Ok(updated)
    }

    fn write(&self, weights: &PreferenceWeights) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&weights.to_json())
            .map_err(|e| StorageError::Parse(self.path.clone(), e))?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json).map_err(|e| StorageError::Io(tmp.clone(), e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(self.path.clone(), e))?;
        Ok(())
    }
}
