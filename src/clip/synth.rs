//! Synthetic reference clips
//!
//! Produces reference samples for a judge's characteristic gesture when no
//! recorded footage is available. Every landmark sits on a neutral base pose
//! at the frame center; the behavior moves the hands, and each coordinate gets
//! uniform jitter to simulate movement.

use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::config::defaults::SYNTHETIC_JITTER;
use crate::types::joint;
use crate::types::{Clip, Frame, Landmark, DEFAULT_VISIBILITY, LANDMARK_COUNT};

const LEFT_HAND: [usize; 3] = [joint::LEFT_WRIST, 17, 21];
const RIGHT_HAND: [usize; 3] = [joint::RIGHT_WRIST, 18, 22];

/// Characteristic gesture encoded in a synthetic reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Every landmark on the neutral base.
    Neutral,
    /// Index fingers together in front of the chest.
    Steeple,
    /// Hands held wide apart.
    Accordion,
}

impl Behavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Steeple => "steeple",
            Self::Accordion => "accordion",
        }
    }

    /// Base `(x, y)` for a landmark under this behavior.
    fn base(&self, idx: usize) -> (f64, f64) {
        match self {
            Self::Neutral => (0.5, 0.5),
            Self::Steeple => match idx {
                joint::LEFT_INDEX => (0.48, 0.4),
                joint::RIGHT_INDEX => (0.52, 0.4),
                i if LEFT_HAND.contains(&i) => (0.45, 0.45),
                i if RIGHT_HAND.contains(&i) => (0.55, 0.45),
                _ => (0.5, 0.5),
            },
            Self::Accordion => match idx {
                joint::LEFT_INDEX => (0.3, 0.5),
                joint::RIGHT_INDEX => (0.7, 0.5),
                i if LEFT_HAND.contains(&i) => (0.25, 0.5),
                i if RIGHT_HAND.contains(&i) => (0.75, 0.5),
                _ => (0.5, 0.5),
            },
        }
    }
}

impl fmt::Display for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Behavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "steeple" => Ok(Self::Steeple),
            "accordion" => Ok(Self::Accordion),
            other => Err(format!(
                "unknown behavior '{other}' (expected neutral, steeple or accordion)"
            )),
        }
    }
}

/// Generate `frames` jittered frames for a behavior.
pub fn generate_reference<R: Rng + ?Sized>(behavior: Behavior, frames: usize, rng: &mut R) -> Clip {
    (0..frames)
        .filter_map(|_| {
            let landmarks = (0..LANDMARK_COUNT)
                .map(|idx| {
                    let (x, y) = behavior.base(idx);
                    Landmark {
                        x: x + rng.gen_range(-SYNTHETIC_JITTER..=SYNTHETIC_JITTER),
                        y: y + rng.gen_range(-SYNTHETIC_JITTER..=SYNTHETIC_JITTER),
                        z: 0.0,
                        visibility: DEFAULT_VISIBILITY,
                    }
                })
                .collect();
            Frame::new(landmarks)
        })
        .collect()
}

/// File name for the `n`th reference of a judge, e.g. `Judge_Steve_Jobs_01.json`.
pub fn reference_file_name(judge_id: &str, n: usize) -> String {
    format!("{}_{n:02}.json", judge_id.replace(' ', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_frames_are_complete() {
        let mut rng = StdRng::seed_from_u64(7);
        let clip = generate_reference(Behavior::Neutral, 30, &mut rng);
        assert_eq!(clip.len(), 30);
        for frame in &clip {
            assert_eq!(frame.landmarks().len(), LANDMARK_COUNT);
            for lm in frame.landmarks() {
                assert!((lm.x - 0.5).abs() <= SYNTHETIC_JITTER + 1e-12);
                assert_eq!(lm.visibility, DEFAULT_VISIBILITY);
            }
        }
    }

    #[test]
    fn test_steeple_brings_index_fingers_together() {
        let mut rng = StdRng::seed_from_u64(1);
        let steeple = generate_reference(Behavior::Steeple, 5, &mut rng);
        let accordion = generate_reference(Behavior::Accordion, 5, &mut rng);
        let gap = |f: &Frame| {
            let lms = f.landmarks();
            lms[joint::LEFT_INDEX].distance_2d(&lms[joint::RIGHT_INDEX])
        };
        assert!(steeple.iter().all(|f| gap(f) < 0.1));
        assert!(accordion.iter().all(|f| gap(f) > 0.3));
    }

    #[test]
    fn test_behavior_parse() {
        assert_eq!("Steeple".parse::<Behavior>().unwrap(), Behavior::Steeple);
        assert!("wave".parse::<Behavior>().is_err());
    }

    #[test]
    fn test_reference_file_name() {
        assert_eq!(reference_file_name("Judge_Steve_Jobs", 1), "Judge_Steve_Jobs_01.json");
        assert_eq!(reference_file_name("Steve Jobs", 12), "Steve_Jobs_12.json");
    }
}
