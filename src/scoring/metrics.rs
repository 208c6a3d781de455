//! Per-frame pose metrics
//!
//! Each metric reads a handful of landmarks from one frame and returns `None`
//! when a landmark is hidden or the geometry is degenerate. Coordinates are
//! normalized image coordinates, so `y` grows downward.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::defaults::MIN_LANDMARK_VISIBILITY;
use crate::types::joint;
use crate::types::{Frame, Landmark};

/// Widths below this are treated as a collapsed body and yield no value.
const MIN_BODY_WIDTH: f64 = 1e-3;

/// The fixed metric catalog available to the metric engineer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HandSpread,
    IndexFingerGap,
    WristHeight,
    ShoulderTilt,
    HeadOffset,
    ElbowFlare,
    StanceWidth,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::HandSpread,
        Metric::IndexFingerGap,
        Metric::WristHeight,
        Metric::ShoulderTilt,
        Metric::HeadOffset,
        Metric::ElbowFlare,
        Metric::StanceWidth,
    ];

    pub fn all() -> &'static [Metric] {
        &Self::ALL
    }

    pub fn name(&self) -> &'static str {
        match self {
            Metric::HandSpread => "hand_spread",
            Metric::IndexFingerGap => "index_finger_gap",
            Metric::WristHeight => "wrist_height",
            Metric::ShoulderTilt => "shoulder_tilt",
            Metric::HeadOffset => "head_offset",
            Metric::ElbowFlare => "elbow_flare",
            Metric::StanceWidth => "stance_width",
        }
    }

    /// Look up a metric by catalog name. Case and `-`/space separators are ignored.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|m| m.name() == wanted)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Metric::HandSpread => "distance between the wrists (15, 16)",
            Metric::IndexFingerGap => "distance between the index fingertips (19, 20)",
            Metric::WristHeight => "mean wrist height above the shoulder line (11, 12, 15, 16)",
            Metric::ShoulderTilt => "vertical offset between the shoulders (11, 12)",
            Metric::HeadOffset => "horizontal offset of the nose from the shoulder midpoint (0, 11, 12)",
            Metric::ElbowFlare => "elbow distance from the torso relative to shoulder width (11-14)",
            Metric::StanceWidth => "ankle spacing relative to hip width (23, 24, 27, 28)",
        }
    }

    /// Compute this metric on one frame.
    pub fn evaluate(&self, frame: &Frame) -> Option<f64> {
        let value = match self {
            Metric::HandSpread => {
                let (l, r) = pair(frame, joint::LEFT_WRIST, joint::RIGHT_WRIST)?;
                l.distance_2d(r)
            }
            Metric::IndexFingerGap => {
                let (l, r) = pair(frame, joint::LEFT_INDEX, joint::RIGHT_INDEX)?;
                l.distance_2d(r)
            }
            Metric::WristHeight => {
                let (ls, rs) = pair(frame, joint::LEFT_SHOULDER, joint::RIGHT_SHOULDER)?;
                let (lw, rw) = pair(frame, joint::LEFT_WRIST, joint::RIGHT_WRIST)?;
                (ls.y + rs.y) / 2.0 - (lw.y + rw.y) / 2.0
            }
            Metric::ShoulderTilt => {
                let (ls, rs) = pair(frame, joint::LEFT_SHOULDER, joint::RIGHT_SHOULDER)?;
                (ls.y - rs.y).abs()
            }
            Metric::HeadOffset => {
                let nose = visible(frame, joint::NOSE)?;
                let (ls, rs) = pair(frame, joint::LEFT_SHOULDER, joint::RIGHT_SHOULDER)?;
                nose.x - (ls.x + rs.x) / 2.0
            }
            Metric::ElbowFlare => {
                let (ls, rs) = pair(frame, joint::LEFT_SHOULDER, joint::RIGHT_SHOULDER)?;
                let (le, re) = pair(frame, joint::LEFT_ELBOW, joint::RIGHT_ELBOW)?;
                let width = ls.distance_2d(rs);
                if width < MIN_BODY_WIDTH {
                    return None;
                }
                ((le.x - ls.x).abs() + (re.x - rs.x).abs()) / 2.0 / width
            }
            Metric::StanceWidth => {
                let (lh, rh) = pair(frame, joint::LEFT_HIP, joint::RIGHT_HIP)?;
                let (la, ra) = pair(frame, joint::LEFT_ANKLE, joint::RIGHT_ANKLE)?;
                let width = lh.distance_2d(rh);
                if width < MIN_BODY_WIDTH {
                    return None;
                }
                la.distance_2d(ra) / width
            }
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn visible(frame: &Frame, idx: usize) -> Option<&Landmark> {
    frame.visible(idx, MIN_LANDMARK_VISIBILITY)
}

fn pair(frame: &Frame, left: usize, right: usize) -> Option<(&Landmark, &Landmark)> {
    Some((visible(frame, left)?, visible(frame, right)?))
}

/// Plain-text catalog listing, one `name: description` per line.
pub fn catalog() -> String {
    Metric::ALL
        .iter()
        .map(|m| format!("{}: {}", m.name(), m.description()))
        .collect::<Vec<_>>()
        .join("\n")
}
