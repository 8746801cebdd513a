//! The frame loop.
//!
//! One [`Viewer`] owns the whole mutable state. Per frame it commits queued
//! edits, advances the clock, applies input to the camera, animates the
//! fractal parameters, derives the render pose and hands everything to the
//! render collaborator. The stored camera is only ever changed by input and
//! variant restores.
use anyhow::Context;
use composer::{ComposeError, FragmentKind, Selection, ShaderLibrary};
use glam::DVec2;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use viewconfig::ViewerConfig;

use crate::animator::ParameterAnimator;
use crate::controls::{ControlId, ControlSurface};
use crate::input::{InputState, KeyBindings, MOUSE_RADIANS_PER_PIXEL, MOVEMENT_SCALE};
use crate::pipeline::ShaderPipeline;
use crate::state::{Edit, FractalUniforms, SessionConfig, ViewerState};
use crate::stereo::{FaceTracker, RenderPose, StereoPoseController, StereoState};
use crate::uniforms::UniformBundle;
use crate::variants::{RestorePolicy, VariantStateStore};

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("no {0} fragments are registered")]
    MissingFragments(FragmentKind),
    #[error("configured camera cannot form an orthonormal basis")]
    InvalidCamera,
}

/// Everything the render collaborator needs for one frame.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub index: u64,
    pub fractal_source: &'a str,
    pub vertex_source: Option<&'a str>,
    pub effect_source: &'a str,
    /// Changes exactly when `fractal_source` does.
    pub shader_revision: u64,
    /// Changes exactly when the active effect does.
    pub effect_revision: u64,
    pub uniforms: UniformBundle,
}

/// External rasterization backend.
pub trait RenderTarget {
    fn render(&mut self, frame: &Frame<'_>) -> anyhow::Result<()>;

    fn resize(&mut self, _width: u32, _height: u32) {}
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub index: u64,
    pub shader_revision: u64,
    pub stereo: StereoState,
    pub render_pose: RenderPose,
    pub failed_edits: usize,
}

pub struct Viewer {
    state: ViewerState,
    pipeline: ShaderPipeline,
    variants: VariantStateStore,
    restore_policy: RestorePolicy,
    stereo: StereoPoseController,
    input: InputState,
    bindings: KeyBindings,
    controls: ControlSurface,
    pending: Vec<Edit>,
    effect_revision: u64,
    rendered_effect: String,
    frame_index: u64,
    clock: f64,
}

impl Viewer {
    /// Resolves the configured fragment keys, composes the first shader and
    /// seeds one variant snapshot per registered fractal.
    ///
    /// A configured default fractal that is not registered falls back to the
    /// first fractal in display order. Explicitly configured coloring, effect
    /// or render mode keys must exist.
    pub fn new(
        library: ShaderLibrary,
        config: &ViewerConfig,
        tracker: Option<Box<dyn FaceTracker>>,
    ) -> Result<Self, ViewerError> {
        let registry = library.registry();
        let fractal = match config.default_fractal.as_deref() {
            Some(key) if registry.contains(FragmentKind::Fractal, key) => key.to_string(),
            requested => {
                let first = first_key(&library, FragmentKind::Fractal)?;
                if let Some(key) = requested {
                    info!(requested = key, fallback = %first, "default fractal not registered");
                }
                first
            }
        };
        let session = &config.session;
        let coloring = configured_key(&library, FragmentKind::Coloring, session.coloring.as_deref())?;
        let effect = configured_key(&library, FragmentKind::Effect, session.effect.as_deref())?;
        let render_mode =
            configured_key(&library, FragmentKind::RenderMode, session.render_mode.as_deref())?;

        let selection = Selection::new(fractal, coloring, render_mode);
        let uniforms = FractalUniforms::from_config(config).ok_or(ViewerError::InvalidCamera)?;
        let mut session_config = SessionConfig::from_config(config, &selection, effect);
        let variants = VariantStateStore::initialize(
            library.registry().keys(FragmentKind::Fractal),
            &session_config,
            &uniforms,
        );

        let pipeline = ShaderPipeline::new(library, selection)?;
        let mut stereo = StereoPoseController::new(&config.stereo, tracker);
        if session_config.stereo {
            if let Err(err) = stereo.enable() {
                warn!(error = %err, "stereo requested but unavailable");
                session_config.stereo = false;
            }
        }

        info!(
            selection = %pipeline.active_selection(),
            effect = %session_config.effect,
            variants = variants.len(),
            "viewer ready"
        );

        let rendered_effect = session_config.effect.clone();
        Ok(Self {
            state: ViewerState::new(session_config, uniforms),
            pipeline,
            variants,
            restore_policy: RestorePolicy {
                restore_camera: config.variants.restore_camera,
            },
            stereo,
            input: InputState::new(),
            bindings: KeyBindings::from_config(&config.keys),
            controls: ControlSurface::new(),
            pending: Vec::new(),
            effect_revision: 1,
            rendered_effect,
            frame_index: 0,
            clock: 0.0,
        })
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn pipeline(&self) -> &ShaderPipeline {
        &self.pipeline
    }

    pub fn variants(&self) -> &VariantStateStore {
        &self.variants
    }

    pub fn stereo_state(&self) -> StereoState {
        self.stereo.state()
    }

    pub fn controls(&self) -> &ControlSurface {
        &self.controls
    }

    pub fn effect_revision(&self) -> u64 {
        self.effect_revision
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn key_down(&mut self, key: &str) {
        if self.input.key_down(&self.bindings, key).is_none() {
            debug!(key, "unbound key");
        }
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.key_up(&self.bindings, key);
    }

    pub fn pointer_moved(&mut self, dx: f64, dy: f64) {
        self.input.pointer_moved(dx, dy);
    }

    pub fn set_pointer_captured(&mut self, captured: bool) {
        self.input.set_captured(captured);
    }

    /// Queues a whole-field write for the next commit.
    pub fn queue_edit(&mut self, edit: Edit) {
        self.pending.push(edit);
    }

    /// Runs a committed slider value through its range control and queues
    /// the resulting edit.
    pub fn commit_control(&mut self, id: ControlId, value: f64) -> bool {
        match self.controls.commit(id, value) {
            Some(edit) => {
                self.queue_edit(edit);
                true
            }
            None => false,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32, target: &mut dyn RenderTarget) {
        let width = width.max(1);
        let height = height.max(1);
        self.state.resolution = DVec2::new(f64::from(width), f64::from(height));
        target.resize(width, height);
    }

    /// Applies queued edits in order. Failed edits leave their field (and the
    /// active shader) as they were and are returned.
    pub fn commit_edits(&mut self) -> Vec<ViewerError> {
        let mut failures = Vec::new();
        for edit in std::mem::take(&mut self.pending) {
            if let Err(err) = self.apply_edit(edit) {
                failures.push(err);
            }
        }
        failures
    }

    fn apply_edit(&mut self, edit: Edit) -> Result<(), ViewerError> {
        match edit {
            Edit::SelectFractal(key) => self.switch_fractal(&key).map(|_| ()),
            Edit::SelectColoring(key) => self.select_fragment(FragmentKind::Coloring, key),
            Edit::SelectRenderMode(key) => self.select_fragment(FragmentKind::RenderMode, key),
            Edit::SelectEffect(key) => {
                self.pipeline.effect_source(&key).map_err(|err| {
                    error!(effect = %key, error = %err, "unknown effect; keeping active effect");
                    err
                })?;
                self.state.config.effect = key;
                Ok(())
            }
            Edit::Stereo(enabled) => {
                self.set_stereo(enabled);
                Ok(())
            }
            other => {
                self.state.apply_field(other);
                Ok(())
            }
        }
    }

    fn select_fragment(&mut self, kind: FragmentKind, key: String) -> Result<(), ViewerError> {
        let previous = std::mem::replace(self.state.config.key_mut(kind), key);
        if let Err(err) = self.pipeline.select(&self.state.config.selection()) {
            *self.state.config.key_mut(kind) = previous;
            return Err(err.into());
        }
        Ok(())
    }

    fn set_stereo(&mut self, enabled: bool) {
        if enabled {
            match self.stereo.enable() {
                Ok(()) => self.state.config.stereo = true,
                Err(err) => {
                    warn!(error = %err, "stereo unavailable");
                    self.state.config.stereo = false;
                }
            }
        } else {
            self.stereo.disable();
            self.state.config.stereo = false;
            self.state.uniforms.eye_offsets = None;
        }
    }

    /// Saves the live parameters under the current fractal and restores the
    /// snapshot stored for `key`. Nothing changes if the new shader fails to
    /// compose. Returns whether the active fractal changed.
    pub fn switch_fractal(&mut self, key: &str) -> Result<bool, ViewerError> {
        let current = self.state.config.fractal.clone();
        if current == key {
            return Ok(false);
        }

        let mut config = self.state.config.clone();
        let mut uniforms = self.state.uniforms;
        config.fractal = key.to_string();
        match self.variants.load(key) {
            Some(saved) => saved.apply(&mut config, &mut uniforms, self.restore_policy),
            None => debug!(variant = key, "no stored state for variant"),
        }
        self.pipeline.select(&config.selection())?;

        self.variants
            .save(&current, &self.state.config, &self.state.uniforms);
        self.state.config = config;
        self.state.uniforms = uniforms;
        info!(from = %current, to = key, "switched fractal");
        Ok(true)
    }

    /// Advances one frame by `dt` seconds and renders it.
    pub fn frame(&mut self, dt: f64, target: &mut dyn RenderTarget) -> anyhow::Result<FrameReport> {
        let failed_edits = self.commit_edits().len();

        if let Some(Err(_)) = self.stereo.poll_initialization() {
            self.state.config.stereo = false;
        }

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock += dt;
        self.state.time += dt * self.state.config.time_speed;

        self.apply_input(dt);

        if self.state.config.animate {
            ParameterAnimator::animate(
                self.state.time,
                &self.state.config.animation,
                &mut self.state.uniforms,
            );
        }

        let render_pose = if self.state.config.stereo {
            self.stereo.render_pose(&self.state.uniforms.camera, self.clock)
        } else {
            RenderPose::base(self.state.uniforms.camera)
        };
        self.state.uniforms.eye_offsets = render_pose.eyes;

        // covers effect edits and variant restores alike
        if self.rendered_effect != self.state.config.effect {
            self.rendered_effect.clone_from(&self.state.config.effect);
            self.effect_revision += 1;
            debug!(effect = %self.rendered_effect, revision = self.effect_revision, "effect changed");
        }
        let effect_source = self
            .pipeline
            .effect_source(&self.state.config.effect)
            .context("active effect is not registered")?;
        let frame = Frame {
            index: self.frame_index,
            fractal_source: self.pipeline.active_source(),
            vertex_source: self.pipeline.library().vertex_source(),
            effect_source,
            shader_revision: self.pipeline.revision(),
            effect_revision: self.effect_revision,
            uniforms: UniformBundle::from_state(&self.state, &render_pose),
        };
        target
            .render(&frame)
            .with_context(|| format!("failed to render frame {}", self.frame_index))?;

        let report = FrameReport {
            index: self.frame_index,
            shader_revision: self.pipeline.revision(),
            stereo: self.stereo.state(),
            render_pose,
            failed_edits,
        };
        self.frame_index += 1;
        Ok(report)
    }

    fn apply_input(&mut self, dt: f64) {
        let look = self.input.take_look();
        if !self.input.captured() {
            return;
        }

        let config = &self.state.config;
        let camera = &mut self.state.uniforms.camera;
        if look != DVec2::ZERO {
            camera.apply_angular_delta(
                look.x,
                look.y,
                MOUSE_RADIANS_PER_PIXEL * config.mouse_sensitivity,
            );
        }

        let step = dt * config.movement_speed / MOVEMENT_SCALE;
        if step != 0.0 {
            for action in self.input.pressed() {
                let (axis, sign) = action.movement();
                camera.translate(axis, sign * step);
            }
        }
    }
}

fn first_key(library: &ShaderLibrary, kind: FragmentKind) -> Result<String, ViewerError> {
    library
        .registry()
        .first_key(kind)
        .map(str::to_string)
        .ok_or(ViewerError::MissingFragments(kind))
}

fn configured_key(
    library: &ShaderLibrary,
    kind: FragmentKind,
    configured: Option<&str>,
) -> Result<String, ViewerError> {
    match configured {
        Some(key) => {
            library.registry().source(kind, key)?;
            Ok(key.to_string())
        }
        None => first_key(library, kind),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::thread;
    use std::time::{Duration, Instant};

    use composer::{FragmentRegistry, ShaderTemplate};
    use glam::DVec3;

    use super::*;
    use crate::animator::AnimationChannel;
    use crate::stereo::{FaceLandmarks, TrackerError};

    #[derive(Default)]
    struct Recording {
        frames: Vec<(u64, String, UniformBundle)>,
        effects: Vec<(u64, String)>,
        sizes: Vec<(u32, u32)>,
    }

    impl RenderTarget for Recording {
        fn render(&mut self, frame: &Frame<'_>) -> anyhow::Result<()> {
            self.frames.push((
                frame.shader_revision,
                frame.fractal_source.to_string(),
                frame.uniforms,
            ));
            self.effects
                .push((frame.effect_revision, frame.effect_source.to_string()));
            Ok(())
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.sizes.push((width, height));
        }
    }

    fn library() -> ShaderLibrary {
        let template = ShaderTemplate::parse(
            "precision highp float;\n#pragma fractal\n#pragma coloring\nvoid main() {\n#pragma render_mode\n}\n",
        )
        .unwrap();
        let mut registry = FragmentRegistry::new();
        for (kind, key) in [
            (FragmentKind::Fractal, "example-fractal"),
            (FragmentKind::Fractal, "mandelbulb"),
            (FragmentKind::Coloring, "flat"),
            (FragmentKind::Coloring, "neon"),
            (FragmentKind::RenderMode, "shaded"),
            (FragmentKind::Effect, "none"),
            (FragmentKind::Effect, "vignette"),
        ] {
            registry.register(kind, key, format!("// {kind}: {key}")).unwrap();
        }
        ShaderLibrary::new(template, registry)
    }

    fn viewer() -> Viewer {
        Viewer::new(library(), &ViewerConfig::default(), None).unwrap()
    }

    #[test]
    fn starts_on_default_fractal_and_first_fragments() {
        let viewer = viewer();
        let config = &viewer.state().config;
        assert_eq!(config.fractal, "example-fractal");
        assert_eq!(config.coloring, "flat");
        assert_eq!(config.effect, "none");
        assert_eq!(viewer.variants().len(), 2);
    }

    #[test]
    fn missing_kind_is_rejected() {
        let template =
            ShaderTemplate::parse("#pragma fractal\n#pragma coloring\n#pragma render_mode\n")
                .unwrap();
        let mut registry = FragmentRegistry::new();
        registry.register(FragmentKind::Fractal, "example-fractal", "x").unwrap();
        let err = Viewer::new(
            ShaderLibrary::new(template, registry),
            &ViewerConfig::default(),
            None,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ViewerError::MissingFragments(FragmentKind::Coloring)));
    }

    #[test]
    fn mouse_delta_turns_default_camera_by_scaled_yaw() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        let before = viewer.state().uniforms.camera.yaw();

        viewer.set_pointer_captured(true);
        viewer.pointer_moved(100.0, 0.0);
        viewer.frame(0.0, &mut target).unwrap();

        let camera = viewer.state().uniforms.camera;
        assert!((camera.yaw() - before - 0.2).abs() < 1e-6);
        assert!(camera.orthonormality_error() < 1e-6);
    }

    #[test]
    fn input_is_ignored_until_pointer_is_captured() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        let before = viewer.state().uniforms.camera;

        viewer.pointer_moved(50.0, 10.0);
        viewer.key_down("w");
        viewer.frame(0.5, &mut target).unwrap();
        assert_eq!(viewer.state().uniforms.camera, before);

        viewer.set_pointer_captured(true);
        viewer.frame(0.6, &mut target).unwrap();
        let moved = viewer.state().uniforms.camera.position - before.position;
        assert!((moved - DVec3::new(0.2, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn switching_back_restores_whitelisted_fields() {
        let mut viewer = viewer();
        let mut target = Recording::default();

        viewer.queue_edit(Edit::SelectColoring("neon".into()));
        viewer.queue_edit(Edit::EffectIntensity(0.6));
        viewer.queue_edit(Edit::AnimationMax(AnimationChannel::ConstantY, 1.75));
        viewer.queue_edit(Edit::Power(6.0));
        viewer.frame(0.016, &mut target).unwrap();
        let before = viewer.state().clone();

        viewer.queue_edit(Edit::SelectFractal("mandelbulb".into()));
        viewer.frame(0.016, &mut target).unwrap();
        assert_eq!(viewer.state().config.coloring, "flat");
        assert_eq!(viewer.state().uniforms.power, 10.0);

        viewer.queue_edit(Edit::SelectColoring("neon".into()));
        viewer.queue_edit(Edit::EffectIntensity(0.1));
        viewer.frame(0.016, &mut target).unwrap();

        viewer.queue_edit(Edit::SelectFractal("example-fractal".into()));
        viewer.frame(0.016, &mut target).unwrap();
        let after = viewer.state();
        assert_eq!(after.config.coloring, before.config.coloring);
        assert_eq!(after.config.effect_intensity, 0.6);
        assert_eq!(after.config.animation, before.config.animation);
        assert_eq!(after.uniforms.power, 6.0);
        assert_eq!(viewer.pipeline().active_selection(), &before.config.selection());
    }

    #[test]
    fn failed_selection_keeps_active_shader() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        viewer.frame(0.016, &mut target).unwrap();

        viewer.queue_edit(Edit::SelectRenderMode("wireframe".into()));
        viewer.queue_edit(Edit::SelectEffect("bloom".into()));
        viewer.queue_edit(Edit::SelectFractal("julia".into()));
        let report = viewer.frame(0.016, &mut target).unwrap();
        assert_eq!(report.failed_edits, 3);
        assert_eq!(viewer.state().config.render_mode, "shaded");
        assert_eq!(viewer.state().config.effect, "none");
        assert_eq!(viewer.state().config.fractal, "example-fractal");
        assert_eq!(target.frames[0].1, target.frames[1].1);
        assert_eq!(target.frames[0].0, target.frames[1].0);
    }

    #[test]
    fn shader_revision_changes_only_with_selection() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        viewer.frame(0.016, &mut target).unwrap();
        viewer.queue_edit(Edit::Bailout(8.0));
        viewer.frame(0.016, &mut target).unwrap();
        viewer.queue_edit(Edit::SelectColoring("neon".into()));
        viewer.frame(0.016, &mut target).unwrap();

        let revisions: Vec<_> = target.frames.iter().map(|(rev, _, _)| *rev).collect();
        assert_eq!(revisions[0], revisions[1]);
        assert!(revisions[2] > revisions[1]);
        assert!(target.frames[2].1.contains("// coloring: neon"));
    }

    #[test]
    fn effect_revision_changes_only_with_effect() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        viewer.frame(0.016, &mut target).unwrap();
        viewer.queue_edit(Edit::EffectIntensity(0.4));
        viewer.frame(0.016, &mut target).unwrap();
        viewer.queue_edit(Edit::SelectEffect("vignette".into()));
        viewer.frame(0.016, &mut target).unwrap();
        viewer.queue_edit(Edit::SelectEffect("bloom".into()));
        viewer.frame(0.016, &mut target).unwrap();

        let revisions: Vec<_> = target.effects.iter().map(|(rev, _)| *rev).collect();
        assert_eq!(revisions, vec![1, 1, 2, 2]);
        assert_eq!(target.effects[2].1, "// effect: vignette");
        assert_eq!(target.frames[1].0, target.frames[2].0);
        assert_eq!(viewer.effect_revision(), 2);
    }

    #[test]
    fn steep_configured_forward_starts_within_pitch_limit() {
        let config =
            ViewerConfig::from_toml_str("version = 1\n[camera]\nforward = [0.00001, 1.0, 0.0]")
                .unwrap();
        let mut viewer = Viewer::new(library(), &config, None).unwrap();
        let mut target = Recording::default();
        viewer.set_pointer_captured(true);
        viewer.key_down("w");
        viewer.frame(0.016, &mut target).unwrap();

        let camera = viewer.state().uniforms.camera;
        assert!(camera.pitch() <= crate::camera::PITCH_LIMIT + 1e-9);
        assert!(camera.orthonormality_error() < 1e-6);
    }

    #[test]
    fn clock_and_animation_follow_time_speed() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        viewer.queue_edit(Edit::TimeSpeed(2.0));
        viewer.queue_edit(Edit::Animate(true));
        viewer.frame(0.25, &mut target).unwrap();

        let state = viewer.state();
        assert!((state.time - 0.5).abs() < 1e-12);
        let wave = ParameterAnimator::tick(0.5);
        assert!((state.uniforms.power - (4.0 + 6.0 * wave)).abs() < 1e-9);
        assert_eq!(target.frames[0].2.time, state.time);
    }

    #[test]
    fn resize_updates_resolution_uniform() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        viewer.resize(800, 0, &mut target);
        viewer.frame(0.0, &mut target).unwrap();
        assert_eq!(target.sizes, vec![(800, 1)]);
        assert_eq!(target.frames[0].2.resolution, DVec2::new(800.0, 1.0));
    }

    #[test]
    fn control_commit_queues_snapped_edit() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        assert!(viewer.commit_control(ControlId::Iterations, 74.4));
        assert!(!viewer.commit_control(ControlId::Power, f64::NAN));
        viewer.frame(0.0, &mut target).unwrap();
        assert_eq!(viewer.state().uniforms.iterations, 74);
        let (min, max) = viewer.controls().range(ControlId::Iterations).unwrap().bounds();
        assert_eq!(min, 1.0);
        assert!((max - 111.6).abs() < 1e-9);
    }

    struct SwayingTracker {
        frames: VecDeque<f64>,
    }

    impl FaceTracker for SwayingTracker {
        fn initialize(&mut self) -> Result<(), TrackerError> {
            Ok(())
        }

        fn sample_nearest(&mut self, _timestamp: f64) -> Option<FaceLandmarks> {
            let x = self.frames.pop_front()?;
            let mut points = vec![DVec3::ZERO; 264];
            points[33] = DVec3::new(x - 0.1, 0.45, 0.0);
            points[263] = DVec3::new(x + 0.1, 0.45, 0.0);
            Some(FaceLandmarks { points })
        }
    }

    #[test]
    fn stereo_frames_never_move_the_stored_camera() {
        let tracker = SwayingTracker {
            frames: (0..200).map(|i| 0.3 + 0.002 * i as f64).collect(),
        };
        let mut config = ViewerConfig::default();
        config.session.stereo = true;
        let mut viewer = Viewer::new(library(), &config, Some(Box::new(tracker))).unwrap();
        let mut target = Recording::default();

        let deadline = Instant::now() + Duration::from_secs(5);
        while viewer.stereo_state() != StereoState::Tracking {
            assert!(Instant::now() < deadline, "tracker never became ready");
            viewer.frame(0.016, &mut target).unwrap();
            thread::sleep(Duration::from_millis(1));
        }

        let base = viewer.state().uniforms.camera;
        let mut overridden = 0;
        for _ in 0..5 {
            let report = viewer.frame(0.016, &mut target).unwrap();
            assert_eq!(viewer.state().uniforms.camera, base);
            if report.render_pose.pose.position != base.position {
                overridden += 1;
            }
        }
        assert!(overridden > 0);
        let last = &target.frames.last().unwrap().2;
        assert!(last.stereo);
        assert!(viewer.state().uniforms.eye_offsets.is_some());

        viewer.queue_edit(Edit::Stereo(false));
        let report = viewer.frame(0.016, &mut target).unwrap();
        assert_eq!(report.stereo, StereoState::Idle);
        assert_eq!(report.render_pose, RenderPose::base(base));
        assert!(viewer.state().uniforms.eye_offsets.is_none());
    }

    #[test]
    fn stereo_without_tracker_turns_toggle_off() {
        let mut viewer = viewer();
        let mut target = Recording::default();
        viewer.queue_edit(Edit::Stereo(true));
        let report = viewer.frame(0.016, &mut target).unwrap();
        assert!(!viewer.state().config.stereo);
        assert_eq!(report.stereo, StereoState::Idle);
    }
}
