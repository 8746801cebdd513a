//! Face-tracking collaborator boundary and the sample adapter.
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use glam::DVec3;
use thiserror::Error;
use tracing::debug;

const MIN_EYE_DISTANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("face landmark model failed to load: {0}")]
    ModelLoad(String),
    #[error("no face tracker is available")]
    Unavailable,
    #[error("tracker initialization ended without reporting a result")]
    Disconnected,
    #[error("failed to spawn tracker initialization: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Landmarks of one detected face, in normalized image coordinates (`x`, `y`
/// in `[0, 1]`, `y` growing downward).
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    pub points: Vec<DVec3>,
}

/// External landmark detector.
pub trait FaceTracker: Send {
    /// Acquires the camera and loads the model. Called once, off the frame
    /// loop thread.
    fn initialize(&mut self) -> Result<(), TrackerError>;

    /// The detection closest to `timestamp` (seconds), or `None` when no face
    /// is visible.
    fn sample_nearest(&mut self, timestamp: f64) -> Option<FaceLandmarks>;
}

/// Per-frame head measurement derived from two eye landmarks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceTrackingSample {
    pub x: f64,
    pub y: f64,
    /// Inter-eye distance in normalized units; grows as the head approaches.
    pub distance: f64,
    pub roll: f64,
    pub detected: bool,
}

impl FaceTrackingSample {
    pub const MISSING: FaceTrackingSample = FaceTrackingSample {
        x: 0.5,
        y: 0.5,
        distance: 0.0,
        roll: 0.0,
        detected: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkPair {
    pub left: usize,
    pub right: usize,
}

impl LandmarkPair {
    pub const OUTER_EYE_CORNERS: LandmarkPair = LandmarkPair {
        left: 33,
        right: 263,
    };
    pub const IRIS_CENTERS: LandmarkPair = LandmarkPair {
        left: 468,
        right: 473,
    };

    pub fn new([left, right]: [usize; 2]) -> Self {
        Self { left, right }
    }

    /// Midpoint, distance and roll between the two landmarks. Missing
    /// indices or coincident points count as no detection.
    pub fn sample(&self, landmarks: Option<&FaceLandmarks>) -> FaceTrackingSample {
        let Some(landmarks) = landmarks else {
            return FaceTrackingSample::MISSING;
        };
        let (Some(left), Some(right)) = (
            landmarks.points.get(self.left),
            landmarks.points.get(self.right),
        ) else {
            debug!(
                points = landmarks.points.len(),
                left = self.left,
                right = self.right,
                "landmark indices out of range"
            );
            return FaceTrackingSample::MISSING;
        };

        let delta = right.truncate() - left.truncate();
        let distance = delta.length();
        let mid = (*left + *right) * 0.5;
        if !(distance.is_finite() && distance > MIN_EYE_DISTANCE && mid.is_finite()) {
            return FaceTrackingSample::MISSING;
        }
        FaceTrackingSample {
            x: mid.x,
            y: mid.y,
            distance,
            roll: delta.y.atan2(delta.x),
            detected: true,
        }
    }
}

/// Smoothed head position plus the latched distance baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedFace {
    pub x: f64,
    pub y: f64,
    pub distance: f64,
    pub roll: f64,
    pub baseline: f64,
}

impl SmoothedFace {
    /// Signed zoom relative to the baseline; positive when the head moved
    /// closer.
    pub fn zoom(&self) -> f64 {
        self.distance - self.baseline
    }
}

/// Exponential smoothing with a fixed blend factor.
#[derive(Debug, Clone)]
pub struct FaceSmoother {
    blend: f64,
    current: Option<SmoothedFace>,
}

impl FaceSmoother {
    pub fn new(blend: f64) -> Self {
        Self {
            blend: blend.clamp(f64::EPSILON, 1.0),
            current: None,
        }
    }

    /// Folds in a sample. Undetected samples leave the state frozen and
    /// yield `None`; the first detected sample latches the baseline.
    pub fn update(&mut self, sample: &FaceTrackingSample) -> Option<SmoothedFace> {
        if !sample.detected {
            return None;
        }
        let next = match self.current {
            None => SmoothedFace {
                x: sample.x,
                y: sample.y,
                distance: sample.distance,
                roll: sample.roll,
                baseline: sample.distance,
            },
            Some(previous) => SmoothedFace {
                x: lerp(previous.x, sample.x, self.blend),
                y: lerp(previous.y, sample.y, self.blend),
                distance: lerp(previous.distance, sample.distance, self.blend),
                roll: lerp(previous.roll, sample.roll, self.blend),
                baseline: previous.baseline,
            },
        };
        self.current = Some(next);
        Some(next)
    }

    pub fn current(&self) -> Option<SmoothedFace> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

fn lerp(from: f64, to: f64, blend: f64) -> f64 {
    from + (to - from) * blend
}

pub type InitOutcome = (Box<dyn FaceTracker>, Result<(), TrackerError>);

/// A tracker initialization running on its own thread.
pub struct PendingTracker {
    receiver: Receiver<InitOutcome>,
}

impl std::fmt::Debug for PendingTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTracker").finish_non_exhaustive()
    }
}

impl PendingTracker {
    /// Non-blocking check. `Err(Disconnected)` means the worker died and
    /// took the tracker with it.
    pub fn poll(&self) -> Option<Result<InitOutcome, TrackerError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(Ok(outcome)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(TrackerError::Disconnected)),
        }
    }
}

/// Runs `tracker.initialize()` on a background thread. The tracker is handed
/// back with the result so a failed attempt can be retried later.
pub fn spawn_initialization(mut tracker: Box<dyn FaceTracker>) -> Result<PendingTracker, TrackerError> {
    let (sender, receiver) = bounded(1);
    thread::Builder::new()
        .name("face-tracker-init".into())
        .spawn(move || {
            let result = tracker.initialize();
            let _ = sender.send((tracker, result));
        })
        .map_err(TrackerError::Spawn)?;
    Ok(PendingTracker { receiver })
}
