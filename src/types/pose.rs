//! Pose types: Landmark, Frame, Clip and the fixed landmark index table

use serde::{Deserialize, Serialize};

/// Number of landmarks in every normalized frame.
pub const LANDMARK_COUNT: usize = 33;

/// Visibility assigned when a producer omits the field.
pub const DEFAULT_VISIBILITY: f64 = 0.95;

/// Anatomical name for each landmark index (0..=32).
pub const LANDMARK_NAMES: [&str; LANDMARK_COUNT] = [
    "nose",
    "left eye (inner)",
    "left eye",
    "left eye (outer)",
    "right eye (inner)",
    "right eye",
    "right eye (outer)",
    "left ear",
    "right ear",
    "mouth (left)",
    "mouth (right)",
    "left shoulder",
    "right shoulder",
    "left elbow",
    "right elbow",
    "left wrist",
    "right wrist",
    "left pinky",
    "right pinky",
    "left index",
    "right index",
    "left thumb",
    "right thumb",
    "left hip",
    "right hip",
    "left knee",
    "right knee",
    "left ankle",
    "right ankle",
    "left heel",
    "right heel",
    "left foot index",
    "right foot index",
];

/// Named landmark indices used by the metric catalog.
pub mod joint {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_INDEX: usize = 19;
    pub const RIGHT_INDEX: usize = 20;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
}

/// Render the landmark index table as the plain-text reference handed to judges.
pub fn landmark_reference() -> String {
    LANDMARK_NAMES
        .iter()
        .enumerate()
        .map(|(idx, name)| format!("{idx} - {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single pose landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default = "default_visibility")]
    pub visibility: f64,
}

fn default_visibility() -> f64 {
    DEFAULT_VISIBILITY
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, visibility: DEFAULT_VISIBILITY }
    }

    /// Planar (x, y) distance to another landmark.
    pub fn distance_2d(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One captured pose: exactly [`LANDMARK_COUNT`] landmarks in anatomical order.
///
/// Only constructed through [`Frame::new`]; deserialization goes through the
/// clip loader so the length invariant cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Frame {
    landmarks: Vec<Landmark>,
}

impl Frame {
    /// Build a frame, rejecting anything that is not exactly 33 landmarks.
    pub fn new(landmarks: Vec<Landmark>) -> Option<Self> {
        (landmarks.len() == LANDMARK_COUNT).then_some(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Landmark at `idx`, or `None` when its visibility is below `min_visibility`.
    pub fn visible(&self, idx: usize, min_visibility: f64) -> Option<&Landmark> {
        self.landmarks
            .get(idx)
            .filter(|lm| lm.visibility >= min_visibility)
    }

    pub fn get(&self, idx: usize) -> Option<&Landmark> {
        self.landmarks.get(idx)
    }
}

/// Time-ordered frames from one source. Empty means missing or corrupt input.
pub type Clip = Vec<Frame>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_requires_33_landmarks() {
        assert!(Frame::new(vec![Landmark::new(0.5, 0.5, 0.0); 32]).is_none());
        assert!(Frame::new(vec![Landmark::new(0.5, 0.5, 0.0); 33]).is_some());
    }

    #[test]
    fn test_visibility_defaults_when_absent() {
        let lm: Landmark = serde_json::from_str(r#"{"x": 0.1, "y": 0.2, "z": 0.0}"#).unwrap();
        assert_eq!(lm.visibility, DEFAULT_VISIBILITY);
    }

    #[test]
    fn test_landmark_reference_covers_all_indices() {
        let text = landmark_reference();
        assert!(text.starts_with("0 - nose"));
        assert!(text.contains("11 - left shoulder"));
        assert!(text.ends_with("32 - right foot index"));
        assert_eq!(text.lines().count(), LANDMARK_COUNT);
    }
}
