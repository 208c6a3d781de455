//! Frame ingestion
//!
//! Captured frames arrive as independent landmarker payloads tagged with their
//! capture index. Each payload is normalized on the rayon pool; completion is
//! tracked by an atomic counter owned by a per-run [`IngestContext`], so two
//! concurrent runs never share state.

use rayon::prelude::*;
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use super::{load_json_safely, normalize, ClipError};
use crate::types::{Clip, Frame};

/// Per-run ingestion state.
#[derive(Debug, Default)]
pub struct IngestContext {
    submitted: AtomicUsize,
    completed: AtomicUsize,
}

impl IngestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads handed to workers so far.
    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Acquire)
    }

    /// Payloads fully processed so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.submitted()
    }

    /// Normalize payloads in parallel and assemble the clip in capture order.
    ///
    /// A payload may hold zero frames (nothing detected) or several poses;
    /// each detected pose becomes one frame.
    pub fn ingest(&self, payloads: Vec<(usize, Value)>) -> Clip {
        self.submitted.fetch_add(payloads.len(), Ordering::AcqRel);

        let mut per_capture: Vec<(usize, Vec<Frame>)> = payloads
            .into_par_iter()
            .map(|(index, payload)| {
                let frames = frames_from_detection(&payload);
                self.completed.fetch_add(1, Ordering::AcqRel);
                if frames.is_empty() {
                    debug!(capture = index, "No pose detected in capture");
                }
                (index, frames)
            })
            .collect();

        per_capture.sort_by_key(|(index, _)| *index);
        let clip: Clip = per_capture.into_iter().flat_map(|(_, frames)| frames).collect();

        info!(
            captures = self.submitted(),
            completed = self.completed(),
            frames = clip.len(),
            "Frame ingestion complete"
        );
        clip
    }
}

/// Unwrap a landmarker result (`{"pose_landmarks": [...]}`) or accept any
/// shape the clip normalizer understands.
fn frames_from_detection(payload: &Value) -> Vec<Frame> {
    match payload.get("pose_landmarks") {
        Some(poses) => normalize(poses),
        None => normalize(payload),
    }
}

/// Capture index encoded in a file name such as `frame_12.json`.
fn capture_index(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

/// Read per-frame payload files from a capture directory.
///
/// Files without a numeric suffix are ordered after numbered ones, by name.
pub fn load_frame_payloads(dir: &Path) -> Result<Vec<(usize, Value)>, ClipError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| ClipError::Io(dir.to_path_buf(), e))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut numbered: Vec<(usize, &Path)> = Vec::new();
    let mut unnumbered: Vec<&Path> = Vec::new();
    for path in &paths {
        match capture_index(path) {
            Some(idx) => numbered.push((idx, path.as_path())),
            None => unnumbered.push(path.as_path()),
        }
    }
    numbered.sort_by_key(|(idx, _)| *idx);
    let next = numbered.last().map_or(0, |(idx, _)| idx + 1);
    let ordered = numbered
        .into_iter()
        .chain(unnumbered.into_iter().enumerate().map(|(i, p)| (next + i, p)));

    let mut payloads = Vec::new();
    for (idx, path) in ordered {
        match load_json_safely(path) {
            Some(value) => payloads.push((idx, value)),
            None => warn!(path = %path.display(), "Skipping unreadable capture"),
        }
    }
    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::tests::points;
    use serde_json::json;

    fn marked_frame(x: f64) -> Value {
        let mut pts = points(33, true);
        pts[0]["x"] = json!(x);
        pts
    }

    #[test]
    fn test_ingest_orders_by_capture_index() {
        let ctx = IngestContext::new();
        let payloads: Vec<(usize, Value)> = (0..20)
            .rev()
            .map(|i| (i, json!({"pose_landmarks": [marked_frame(i as f64)]})))
            .collect();

        let clip = ctx.ingest(payloads);
        assert_eq!(clip.len(), 20);
        assert!(ctx.is_complete());
        assert_eq!(ctx.completed(), 20);
        for (i, frame) in clip.iter().enumerate() {
            assert_eq!(frame.landmarks()[0].x, i as f64);
        }
    }

    #[test]
    fn test_empty_detections_are_skipped_but_counted() {
        let ctx = IngestContext::new();
        let clip = ctx.ingest(vec![
            (0, json!({"pose_landmarks": []})),
            (1, marked_frame(1.0)),
            (2, json!({"unexpected": true})),
        ]);
        assert_eq!(clip.len(), 1);
        assert_eq!(ctx.completed(), 3);
    }

    #[test]
    fn test_contexts_are_independent() {
        let a = IngestContext::new();
        let b = IngestContext::new();
        a.ingest(vec![(0, marked_frame(0.0))]);
        assert_eq!(a.completed(), 1);
        assert_eq!(b.completed(), 0);
    }

    #[test]
    fn test_capture_index() {
        assert_eq!(capture_index(Path::new("captures/frame_12.json")), Some(12));
        assert_eq!(capture_index(Path::new("frame.json")), None);
    }

    #[test]
    fn test_load_frame_payloads_orders_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for i in [10, 2, 1] {
            std::fs::write(
                dir.path().join(format!("frame_{i}.json")),
                serde_json::to_vec(&marked_frame(i as f64)).unwrap(),
            )
            .unwrap();
        }
        let payloads = load_frame_payloads(dir.path()).unwrap();
        let order: Vec<usize> = payloads.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 10]);
    }
}
