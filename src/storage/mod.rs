//! Persistent Storage
//!
//! File-backed state shared across runs: the preference store and the lock
//! file that serializes its writers.

pub mod lockfile;
pub mod preferences;

pub use lockfile::StoreLock;
pub use preferences::{PreferenceStore, PreferenceWeights, DEFAULT_WEIGHT};

use std::path::PathBuf;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("store is locked ({}), holder PID {holder:?}", .path.display())]
    Locked { path: PathBuf, holder: Option<u32> },
    #[error("preference key must not be empty")]
    InvalidKey,
}
