//! Head-tracked stereo rendering.
//!
//! The controller never touches the stored camera. Each frame it derives a
//! [`RenderPose`] from the base pose and the latest tracked face; the frame
//! loop hands that derived pose to the renderer and drops it afterwards.
//!
//! Lifecycle: `Idle -> Initializing -> Tracking <-> Lost`. Tracker start-up
//! runs on a background thread and is polled once per frame.
mod orbit;
mod parallax;
mod tracking;

pub use orbit::OrbitParallax;
pub use parallax::HeadParallax;
pub use tracking::{
    spawn_initialization, FaceLandmarks, FaceSmoother, FaceTracker, FaceTrackingSample,
    InitOutcome, LandmarkPair, PendingTracker, SmoothedFace, TrackerError,
};

use std::fmt;

use tracing::{debug, info, warn};
use viewconfig::{StereoSection, StereoStrategyKind};

use crate::camera::CameraPose;
use crate::state::EyeOffsets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoState {
    Idle,
    Initializing,
    Tracking,
    Lost,
}

impl fmt::Display for StereoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StereoState::Idle => "idle",
            StereoState::Initializing => "initializing",
            StereoState::Tracking => "tracking",
            StereoState::Lost => "lost",
        };
        f.write_str(name)
    }
}

/// The pose actually rendered this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPose {
    pub pose: CameraPose,
    pub eyes: Option<EyeOffsets>,
}

impl RenderPose {
    /// The base pose rendered as-is.
    pub fn base(pose: CameraPose) -> Self {
        Self { pose, eyes: None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StereoStrategy {
    HeadParallax(HeadParallax),
    Orbit(OrbitParallax),
}

impl StereoStrategy {
    pub fn from_config(section: &StereoSection) -> Self {
        match section.strategy {
            StereoStrategyKind::HeadParallax => {
                StereoStrategy::HeadParallax(HeadParallax::from_config(&section.parallax))
            }
            StereoStrategyKind::Orbit => {
                StereoStrategy::Orbit(OrbitParallax::from_config(&section.orbit))
            }
        }
    }

    pub fn landmarks(&self) -> LandmarkPair {
        match self {
            StereoStrategy::HeadParallax(strategy) => strategy.landmarks,
            StereoStrategy::Orbit(strategy) => strategy.landmarks,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StereoStrategy::HeadParallax(_) => "head-parallax",
            StereoStrategy::Orbit(_) => "orbit",
        }
    }

    fn render_pose(&self, base: &CameraPose, face: &SmoothedFace) -> Option<RenderPose> {
        match self {
            StereoStrategy::HeadParallax(strategy) => strategy.render_pose(base, face),
            StereoStrategy::Orbit(strategy) => strategy.render_pose(base, face),
        }
    }
}

pub struct StereoPoseController {
    state: StereoState,
    strategy: StereoStrategy,
    tracker: Option<Box<dyn FaceTracker>>,
    pending: Option<PendingTracker>,
    smoother: FaceSmoother,
}

impl fmt::Debug for StereoPoseController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StereoPoseController")
            .field("state", &self.state)
            .field("strategy", &self.strategy)
            .field("has_tracker", &self.tracker.is_some())
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl StereoPoseController {
    pub fn new(section: &StereoSection, tracker: Option<Box<dyn FaceTracker>>) -> Self {
        Self {
            state: StereoState::Idle,
            strategy: StereoStrategy::from_config(section),
            tracker,
            pending: None,
            smoother: FaceSmoother::new(section.smoothing),
        }
    }

    pub fn state(&self) -> StereoState {
        self.state
    }

    pub fn strategy(&self) -> &StereoStrategy {
        &self.strategy
    }

    /// Starts tracker initialization. Already-active controllers are left
    /// alone; an initialization still running from an earlier enable is
    /// reused rather than started twice.
    pub fn enable(&mut self) -> Result<(), TrackerError> {
        if self.state != StereoState::Idle {
            return Ok(());
        }
        if self.pending.is_some() {
            self.state = StereoState::Initializing;
            return Ok(());
        }
        let tracker = self.tracker.take().ok_or(TrackerError::Unavailable)?;
        self.pending = Some(spawn_initialization(tracker)?);
        self.state = StereoState::Initializing;
        info!(strategy = self.strategy.name(), "initializing face tracker");
        Ok(())
    }

    /// Drops the tracking session. A running initialization keeps going so
    /// the tracker comes back for the next enable.
    pub fn disable(&mut self) {
        if self.state != StereoState::Idle {
            info!(from = %self.state, "stereo disabled");
        }
        self.state = StereoState::Idle;
        self.smoother.reset();
    }

    /// Collects a finished initialization, if any.
    ///
    /// Returns the outcome only when the controller was waiting for it;
    /// results arriving after `disable` just return the tracker.
    pub fn poll_initialization(&mut self) -> Option<Result<(), TrackerError>> {
        let outcome = self.pending.as_ref()?.poll()?;
        self.pending = None;
        let waiting = self.state == StereoState::Initializing;

        let result = match outcome {
            Ok((tracker, result)) => {
                self.tracker = Some(tracker);
                result
            }
            Err(err) => Err(err),
        };

        if !waiting {
            debug!("tracker initialization finished after stereo was disabled");
            return None;
        }
        match &result {
            Ok(()) => {
                self.smoother.reset();
                self.state = StereoState::Tracking;
                info!(strategy = self.strategy.name(), "face tracking active");
            }
            Err(err) => {
                self.state = StereoState::Idle;
                warn!(error = %err, "face tracker unavailable; stereo disabled");
            }
        }
        Some(result)
    }

    /// Derives this frame's render pose. The base pose is only read.
    ///
    /// Outside `Tracking`/`Lost`, on a lost face, or when the strategy cannot
    /// produce a pose, the base pose renders unchanged.
    pub fn render_pose(&mut self, base: &CameraPose, timestamp: f64) -> RenderPose {
        if !matches!(self.state, StereoState::Tracking | StereoState::Lost) {
            return RenderPose::base(*base);
        }
        let Some(tracker) = self.tracker.as_mut() else {
            return RenderPose::base(*base);
        };

        let landmarks = tracker.sample_nearest(timestamp);
        let sample = self.strategy.landmarks().sample(landmarks.as_ref());
        let Some(face) = self.smoother.update(&sample) else {
            if self.state == StereoState::Tracking {
                debug!("face lost");
                self.state = StereoState::Lost;
            }
            return RenderPose::base(*base);
        };
        if self.state == StereoState::Lost {
            debug!("face reacquired");
            self.state = StereoState::Tracking;
        }

        self.strategy
            .render_pose(base, &face)
            .unwrap_or_else(|| RenderPose::base(*base))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::thread;
    use std::time::{Duration, Instant};

    use glam::DVec3;

    use super::*;

    struct ScriptedTracker {
        init: Option<TrackerError>,
        frames: VecDeque<Option<FaceLandmarks>>,
    }

    impl FaceTracker for ScriptedTracker {
        fn initialize(&mut self) -> Result<(), TrackerError> {
            match self.init.take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        fn sample_nearest(&mut self, _timestamp: f64) -> Option<FaceLandmarks> {
            self.frames.pop_front().flatten()
        }
    }

    fn face_at(x: f64) -> Option<FaceLandmarks> {
        let mut points = vec![DVec3::ZERO; 300];
        points[33] = DVec3::new(x - 0.1, 0.5, 0.0);
        points[263] = DVec3::new(x + 0.1, 0.5, 0.0);
        Some(FaceLandmarks { points })
    }

    fn controller(init: Option<TrackerError>, frames: Vec<Option<FaceLandmarks>>) -> StereoPoseController {
        let tracker = ScriptedTracker {
            init,
            frames: frames.into(),
        };
        StereoPoseController::new(&StereoSection::default(), Some(Box::new(tracker)))
    }

    fn settle(controller: &mut StereoPoseController) -> Option<Result<(), TrackerError>> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = controller.poll_initialization() {
                return Some(result);
            }
            if controller.state() != StereoState::Initializing && controller.pending.is_none() {
                return None;
            }
            assert!(Instant::now() < deadline, "initialization never finished");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn tracking_frame_leaves_base_pose_untouched() {
        let mut controller = controller(None, vec![face_at(0.5), face_at(0.3)]);
        controller.enable().unwrap();
        assert_eq!(controller.state(), StereoState::Initializing);
        assert!(settle(&mut controller).unwrap().is_ok());
        assert_eq!(controller.state(), StereoState::Tracking);

        let base = CameraPose::default();
        let before = base;
        controller.render_pose(&base, 0.0);
        let render = controller.render_pose(&base, 0.016);
        assert_eq!(base, before);
        assert_ne!(render.pose.position, base.position);
        assert!(render.eyes.is_some());
    }

    #[test]
    fn lost_face_renders_base_and_recovers() {
        let mut controller = controller(None, vec![face_at(0.5), None, face_at(0.4)]);
        controller.enable().unwrap();
        settle(&mut controller);

        let base = CameraPose::default();
        controller.render_pose(&base, 0.0);
        let lost = controller.render_pose(&base, 0.1);
        assert_eq!(controller.state(), StereoState::Lost);
        assert_eq!(lost, RenderPose::base(base));

        controller.render_pose(&base, 0.2);
        assert_eq!(controller.state(), StereoState::Tracking);
    }

    #[test]
    fn failed_initialization_returns_to_idle_and_can_retry() {
        let mut controller = controller(Some(TrackerError::PermissionDenied), vec![]);
        controller.enable().unwrap();
        assert!(matches!(
            settle(&mut controller),
            Some(Err(TrackerError::PermissionDenied))
        ));
        assert_eq!(controller.state(), StereoState::Idle);

        controller.enable().unwrap();
        assert!(settle(&mut controller).unwrap().is_ok());
        assert_eq!(controller.state(), StereoState::Tracking);
    }

    #[test]
    fn enable_without_tracker_is_an_error() {
        let mut controller = StereoPoseController::new(&StereoSection::default(), None);
        assert!(matches!(controller.enable(), Err(TrackerError::Unavailable)));
        assert_eq!(controller.state(), StereoState::Idle);
        let base = CameraPose::default();
        assert_eq!(controller.render_pose(&base, 0.0), RenderPose::base(base));
    }

    #[test]
    fn disable_returns_to_idle() {
        let mut controller = controller(None, vec![face_at(0.2)]);
        controller.enable().unwrap();
        settle(&mut controller);
        controller.disable();
        assert_eq!(controller.state(), StereoState::Idle);
        let base = CameraPose::default();
        assert_eq!(controller.render_pose(&base, 0.0), RenderPose::base(base));
    }

    #[test]
    fn strategies_carry_their_own_landmarks() {
        let mut section = StereoSection::default();
        assert_eq!(
            StereoStrategy::from_config(&section).landmarks(),
            LandmarkPair::OUTER_EYE_CORNERS
        );
        section.strategy = StereoStrategyKind::Orbit;
        assert_eq!(
            StereoStrategy::from_config(&section).landmarks(),
            LandmarkPair::IRIS_CENTERS
        );
    }
}
