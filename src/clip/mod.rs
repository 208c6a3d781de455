//! Clip Loader / Normalizer
//!
//! Turns landmark payloads of unknown shape into the canonical [`Clip`].
//! Parsing is lenient: producers emit several shapes and malformed output must
//! degrade to "no data" rather than stop the panel.
//!
//! ## Accepted shapes
//!
//! - `{"landmarks": <any accepted shape>}`
//! - `[[{x,y,z,visibility}, ...], ...]` (one or more frames)
//! - `[{x,y,z,visibility}, ...]` (a single flat frame)
//!
//! Anything else normalizes to an empty clip with a warning.

pub mod discovery;
pub mod ingest;
pub mod synth;

pub use discovery::{discover_reference_files, load_reference_clips};
pub use ingest::IngestContext;

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::{Clip, Frame, Landmark, DEFAULT_VISIBILITY, LANDMARK_COUNT};

/// Errors writing clip artifacts. Reading never fails, it degrades to empty.
#[derive(Debug, thiserror::Error)]
pub enum ClipError {
    #[error("clip I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("clip serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Normalize any accepted payload shape into a clip.
pub fn normalize(payload: &Value) -> Clip {
    let data = match payload {
        Value::Object(map) if map.contains_key("landmarks") => &map["landmarks"],
        other => other,
    };

    let Value::Array(items) = data else {
        warn!(kind = value_kind(data), "Unknown landmark payload structure, returning empty clip");
        return Vec::new();
    };

    let Some(first) = items.first() else {
        return Vec::new();
    };

    match first {
        // List of frames
        Value::Array(_) => items
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| {
                let frame = item.as_array().and_then(|points| frame_from_points(points));
                if frame.is_none() {
                    warn!(frame = idx, "Skipping malformed frame");
                }
                frame
            })
            .collect(),
        // Single flat frame
        Value::Object(obj) if obj.contains_key("x") => match frame_from_points(items) {
            Some(frame) => vec![frame],
            None => {
                warn!(points = items.len(), "Flat landmark list is not a complete frame, returning empty clip");
                Vec::new()
            }
        },
        other => {
            warn!(kind = value_kind(other), "Unknown landmark payload structure, returning empty clip");
            Vec::new()
        }
    }
}

/// Build a frame from landmark records, requiring exactly 33 valid points.
fn frame_from_points(points: &[Value]) -> Option<Frame> {
    if points.len() != LANDMARK_COUNT {
        debug!(points = points.len(), "Frame does not have 33 landmarks");
        return None;
    }
    let landmarks = points
        .iter()
        .map(landmark_from_value)
        .collect::<Option<Vec<_>>>()?;
    Frame::new(landmarks)
}

/// Read one landmark record. `x` and `y` are required, `z` defaults to 0.
fn landmark_from_value(value: &Value) -> Option<Landmark> {
    let obj = value.as_object()?;
    let num = |key: &str| obj.get(key).and_then(Value::as_f64).filter(|v| v.is_finite());
    Some(Landmark {
        x: num("x")?,
        y: num("y")?,
        z: num("z").unwrap_or(0.0),
        visibility: num("visibility").unwrap_or(DEFAULT_VISIBILITY),
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Load a JSON document, returning `None` (with a warning) on any failure.
pub fn load_json_safely(path: &Path) -> Option<Value> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read landmark file");
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse landmark file");
            None
        }
    }
}

/// Load and normalize a clip artifact. Missing or corrupt files yield an empty clip.
pub fn load_clip(path: &Path) -> Clip {
    load_json_safely(path).map(|v| normalize(&v)).unwrap_or_default()
}

/// Write a clip as the canonical JSON artifact (array of frames).
pub fn write_clip(path: &Path, clip: &Clip) -> Result<(), ClipError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ClipError::Io(parent.to_path_buf(), e))?;
    }
    let json = serde_json::to_vec(clip)?;
    std::fs::write(path, json).map_err(|e| ClipError::Io(path.to_path_buf(), e))?;
    debug!(path = %path.display(), frames = clip.len(), "Clip written");
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn points(n: usize, with_visibility: bool) -> Value {
        let pts: Vec<Value> = (0..n)
            .map(|i| {
                let v = i as f64 / 100.0;
                if with_visibility {
                    json!({"x": v, "y": v, "z": 0.0, "visibility": 0.5})
                } else {
                    json!({"x": v, "y": v, "z": 0.0})
                }
            })
            .collect();
        Value::Array(pts)
    }

    #[test]
    fn test_wrapper_object_normalizes_to_one_frame() {
        let payload = json!({"landmarks": [points(33, true)]});
        let clip = normalize(&payload);
        assert_eq!(clip.len(), 1);
        assert_eq!(clip[0].landmarks().len(), 33);
        assert_eq!(clip[0].landmarks()[0].visibility, 0.5);
    }

    #[test]
    fn test_flat_list_defaults_visibility() {
        let clip = normalize(&points(33, false));
        assert_eq!(clip.len(), 1);
        assert!(clip[0].landmarks().iter().all(|lm| lm.visibility == DEFAULT_VISIBILITY));
    }

    #[test]
    fn test_unknown_shape_is_empty() {
        assert!(normalize(&json!({"foo": 1})).is_empty());
        assert!(normalize(&json!("landmarks")).is_empty());
        assert!(normalize(&json!([1, 2, 3])).is_empty());
        assert!(normalize(&json!([])).is_empty());
    }

    #[test]
    fn test_list_of_frames_skips_incomplete_frames() {
        let payload = json!([points(33, true), points(12, true), points(33, false)]);
        let clip = normalize(&payload);
        assert_eq!(clip.len(), 2);
    }

    #[test]
    fn test_missing_file_is_empty_clip() {
        assert!(load_clip(Path::new("/definitely/not/here.json")).is_empty());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/landmarks.json");
        let clip = normalize(&json!([points(33, true), points(33, true)]));
        write_clip(&path, &clip).unwrap();
        assert_eq!(load_clip(&path), clip);
    }
}
