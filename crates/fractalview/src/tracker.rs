//! Face trackers for headless runs.
//!
//! Neither talks to a camera. [`SimulatedTracker`] sways a synthetic head
//! with seeded jitter and periodic dropouts; [`ReplayTracker`] plays back
//! recorded eye positions from a JSON file.
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use glam::DVec3;
use rand::prelude::*;
use serde::Deserialize;
use tracing::debug;
use viewer::stereo::LandmarkPair;
use viewconfig::FACE_MESH_POINTS;
use viewer::{FaceLandmarks, FaceTracker, TrackerError};

const PAIRS: [LandmarkPair; 2] = [LandmarkPair::OUTER_EYE_CORNERS, LandmarkPair::IRIS_CENTERS];

/// Fills both eye pairs plus `extra` in a full-size mesh. Indices outside the
/// mesh are skipped; configured pairs are validated against it on load.
fn mesh_with_eyes(left: DVec3, right: DVec3, extra: Option<LandmarkPair>) -> FaceLandmarks {
    let mut points = vec![DVec3::ZERO; FACE_MESH_POINTS];
    for pair in PAIRS.into_iter().chain(extra) {
        if pair.left.max(pair.right) >= FACE_MESH_POINTS {
            debug!(left = pair.left, right = pair.right, "landmark pair outside face mesh");
            continue;
        }
        points[pair.left] = left;
        points[pair.right] = right;
    }
    FaceLandmarks { points }
}

#[derive(Debug)]
pub struct SimulatedTracker {
    rng: StdRng,
    landmarks: LandmarkPair,
    jitter: f64,
    dropout_every: u64,
    dropout_len: u64,
    samples: u64,
}

impl SimulatedTracker {
    pub fn new(seed: u64, landmarks: LandmarkPair) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            landmarks,
            jitter: 0.002,
            dropout_every: 240,
            dropout_len: 12,
            samples: 0,
        }
    }

    fn in_dropout(&self) -> bool {
        self.dropout_every > 0
            && self.samples % self.dropout_every >= self.dropout_every - self.dropout_len
    }
}

impl FaceTracker for SimulatedTracker {
    fn initialize(&mut self) -> Result<(), TrackerError> {
        debug!(landmarks = ?self.landmarks, "simulated tracker ready");
        Ok(())
    }

    fn sample_nearest(&mut self, timestamp: f64) -> Option<FaceLandmarks> {
        let dropped = self.in_dropout();
        self.samples += 1;
        if dropped || !timestamp.is_finite() {
            return None;
        }

        let t = timestamp;
        let mut wobble = || self.rng.gen_range(-self.jitter..=self.jitter);
        let x = 0.5 + 0.12 * (0.7 * t).sin() + wobble();
        let y = 0.5 + 0.06 * (1.1 * t).sin() + wobble();
        let distance = 0.18 + 0.03 * (0.4 * t).sin() + wobble();
        let roll = 0.08 * (0.5 * t).sin();

        let half = DVec3::new(roll.cos(), roll.sin(), 0.0) * (distance * 0.5);
        let mid = DVec3::new(x, y, 0.0);
        Some(mesh_with_eyes(mid - half, mid + half, Some(self.landmarks)))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RecordedFace {
    left: [f64; 3],
    right: [f64; 3],
}

#[derive(Debug, Clone, Deserialize)]
struct RecordedFrame {
    time: f64,
    #[serde(default)]
    face: Option<RecordedFace>,
}

/// Plays back `[{ "time": 0.0, "face": { "left": [x, y, z], "right": [x, y, z] } }, ...]`.
/// A `null` face is a frame with no detection.
#[derive(Debug, Clone)]
pub struct ReplayTracker {
    frames: Vec<RecordedFrame>,
    landmarks: LandmarkPair,
}

impl ReplayTracker {
    pub fn load(path: &Path, landmarks: LandmarkPair) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read face recording {}", path.display()))?;
        Self::from_json_str(&raw, landmarks)
            .with_context(|| format!("invalid face recording {}", path.display()))
    }

    pub fn from_json_str(input: &str, landmarks: LandmarkPair) -> Result<Self> {
        let mut frames: Vec<RecordedFrame> = serde_json::from_str(input)?;
        if frames.is_empty() {
            bail!("recording contains no frames");
        }
        if let Some(frame) = frames.iter().find(|frame| !frame.time.is_finite()) {
            bail!("recording has a non-finite timestamp ({})", frame.time);
        }
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { frames, landmarks })
    }

    fn nearest(&self, timestamp: f64) -> Option<&RecordedFrame> {
        let after = self.frames.partition_point(|frame| frame.time < timestamp);
        [after.checked_sub(1), Some(after)]
            .into_iter()
            .flatten()
            .filter_map(|index| self.frames.get(index))
            .min_by(|a, b| {
                (a.time - timestamp)
                    .abs()
                    .total_cmp(&(b.time - timestamp).abs())
            })
    }
}

impl FaceTracker for ReplayTracker {
    fn initialize(&mut self) -> Result<(), TrackerError> {
        debug!(frames = self.frames.len(), "replay tracker ready");
        Ok(())
    }

    fn sample_nearest(&mut self, timestamp: f64) -> Option<FaceLandmarks> {
        let face = self.nearest(timestamp)?.face.as_ref()?;
        Some(mesh_with_eyes(
            DVec3::from_array(face.left),
            DVec3::from_array(face.right),
            Some(self.landmarks),
        ))
    }
}
