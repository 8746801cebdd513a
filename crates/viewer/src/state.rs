//! The single mutable record owned by the viewer.
//!
//! Controls never write into it directly; they queue [`Edit`]s which the
//! viewer applies in one commit step at the start of each frame.
use composer::{FragmentKind, Selection};
use glam::{DVec2, DVec3, DVec4};
use tracing::debug;
use viewconfig::ViewerConfig;

use crate::animator::{AnimationChannel, AnimationRanges};
use crate::camera::CameraPose;

/// Session tunables and fragment selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub time_speed: f64,
    pub movement_speed: f64,
    pub mouse_sensitivity: f64,
    pub effect_intensity: f64,
    pub fractal: String,
    pub coloring: String,
    pub effect: String,
    pub render_mode: String,
    pub animation: AnimationRanges,
    pub animate: bool,
    pub stereo: bool,
}

impl SessionConfig {
    /// Builds the session record from configuration once fragment keys have
    /// been resolved against the registry.
    pub fn from_config(config: &ViewerConfig, selection: &Selection, effect: String) -> Self {
        let session = &config.session;
        Self {
            time_speed: session.time_speed,
            movement_speed: session.movement_speed,
            mouse_sensitivity: session.mouse_sensitivity,
            effect_intensity: session.effect_intensity,
            fractal: selection.fractal.clone(),
            coloring: selection.coloring.clone(),
            effect,
            render_mode: selection.render_mode.clone(),
            animation: AnimationRanges::from_config(&config.animation),
            animate: session.animate,
            stereo: session.stereo,
        }
    }

    pub fn selection(&self) -> Selection {
        Selection::new(&self.fractal, &self.coloring, &self.render_mode)
    }

    /// The selected key for `kind`.
    pub fn key(&self, kind: FragmentKind) -> &str {
        match kind {
            FragmentKind::Fractal => &self.fractal,
            FragmentKind::Coloring => &self.coloring,
            FragmentKind::Effect => &self.effect,
            FragmentKind::RenderMode => &self.render_mode,
        }
    }

    pub(crate) fn key_mut(&mut self, kind: FragmentKind) -> &mut String {
        match kind {
            FragmentKind::Fractal => &mut self.fractal,
            FragmentKind::Coloring => &mut self.coloring,
            FragmentKind::Effect => &mut self.effect,
            FragmentKind::RenderMode => &mut self.render_mode,
        }
    }
}

/// Eye positions relative to the rendered camera position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeOffsets {
    pub left: DVec3,
    pub right: DVec3,
}

impl EyeOffsets {
    /// Symmetric offsets `∓ right * separation / 2`.
    pub fn symmetric(right: DVec3, separation: f64) -> Self {
        let half = right * (separation * 0.5);
        Self {
            left: -half,
            right: half,
        }
    }
}

/// Camera and fractal parameters forwarded to the shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalUniforms {
    pub camera: CameraPose,
    pub power: f64,
    pub constant: DVec4,
    pub iterations: u32,
    pub steps: u32,
    pub accuracy: u32,
    pub bailout: f64,
    pub threshold: f64,
    /// Offsets emitted by the last stereo frame, cleared when stereo is off.
    pub eye_offsets: Option<EyeOffsets>,
}

impl Default for FractalUniforms {
    fn default() -> Self {
        Self {
            camera: CameraPose::default(),
            power: 10.0,
            constant: DVec4::ZERO,
            iterations: 10,
            steps: 150,
            accuracy: 1,
            bailout: 5.0,
            threshold: 0.001,
            eye_offsets: None,
        }
    }
}

impl FractalUniforms {
    /// Returns `None` when the configured camera cannot form a basis.
    pub fn from_config(config: &ViewerConfig) -> Option<Self> {
        let camera = CameraPose::looking(
            DVec3::from_array(config.camera.position),
            DVec3::from_array(config.camera.forward),
            config.camera.fov,
        )?;
        let fractal = &config.fractal;
        Some(Self {
            camera,
            power: fractal.power,
            constant: DVec4::from_array(fractal.constant),
            iterations: fractal.iterations.max(1),
            steps: fractal.steps.max(1),
            accuracy: fractal.accuracy.max(1),
            bailout: fractal.bailout,
            threshold: fractal.threshold,
            eye_offsets: None,
        })
    }
}

/// One whole-field write queued by a control.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    TimeSpeed(f64),
    MovementSpeed(f64),
    MouseSensitivity(f64),
    EffectIntensity(f64),
    Fov(f64),
    Power(f64),
    Constant(usize, f64),
    Iterations(u32),
    Steps(u32),
    Accuracy(u32),
    Bailout(f64),
    Threshold(f64),
    AnimationMin(AnimationChannel, f64),
    AnimationMax(AnimationChannel, f64),
    Animate(bool),
    Stereo(bool),
    SelectFractal(String),
    SelectColoring(String),
    SelectEffect(String),
    SelectRenderMode(String),
}

impl Edit {
    /// Fragment kind whose selection this edit changes, if any.
    pub fn selects(&self) -> Option<FragmentKind> {
        match self {
            Edit::SelectFractal(_) => Some(FragmentKind::Fractal),
            Edit::SelectColoring(_) => Some(FragmentKind::Coloring),
            Edit::SelectEffect(_) => Some(FragmentKind::Effect),
            Edit::SelectRenderMode(_) => Some(FragmentKind::RenderMode),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerState {
    pub config: SessionConfig,
    pub uniforms: FractalUniforms,
    /// Session clock, advanced by `dt * time_speed`.
    pub time: f64,
    pub resolution: DVec2,
}

impl ViewerState {
    pub fn new(config: SessionConfig, uniforms: FractalUniforms) -> Self {
        Self {
            config,
            uniforms,
            time: 0.0,
            resolution: DVec2::new(1.0, 1.0),
        }
    }

    /// Writes a single field. Non-finite values and out-of-range component
    /// indices are dropped; returns whether anything was written.
    ///
    /// Selection edits only overwrite the key here; composing the new shader
    /// and switching variants is the viewer's job.
    pub fn apply_field(&mut self, edit: Edit) -> bool {
        let config = &mut self.config;
        let uniforms = &mut self.uniforms;
        let applied = match edit {
            Edit::TimeSpeed(value) => write_finite(&mut config.time_speed, value),
            Edit::MovementSpeed(value) => write_finite(&mut config.movement_speed, value),
            Edit::MouseSensitivity(value) => write_finite(&mut config.mouse_sensitivity, value),
            Edit::EffectIntensity(value) => {
                write_finite(&mut config.effect_intensity, value.clamp(0.0, 1.0))
            }
            Edit::Fov(value) => write_finite(&mut uniforms.camera.fov, value),
            Edit::Power(value) => write_finite(&mut uniforms.power, value),
            Edit::Constant(component, value) => match component {
                0..=3 => write_finite(&mut uniforms.constant[component], value),
                _ => false,
            },
            Edit::Iterations(value) => {
                uniforms.iterations = value.max(1);
                true
            }
            Edit::Steps(value) => {
                uniforms.steps = value.max(1);
                true
            }
            Edit::Accuracy(value) => {
                uniforms.accuracy = value.max(1);
                true
            }
            Edit::Bailout(value) => write_finite(&mut uniforms.bailout, value),
            Edit::Threshold(value) => write_finite(&mut uniforms.threshold, value),
            Edit::AnimationMin(channel, value) => {
                config.animation.get_mut(channel).set_min(value);
                value.is_finite()
            }
            Edit::AnimationMax(channel, value) => {
                config.animation.get_mut(channel).set_max(value);
                value.is_finite()
            }
            Edit::Animate(enabled) => {
                config.animate = enabled;
                true
            }
            Edit::Stereo(enabled) => {
                config.stereo = enabled;
                true
            }
            Edit::SelectFractal(key) => {
                config.fractal = key;
                true
            }
            Edit::SelectColoring(key) => {
                config.coloring = key;
                true
            }
            Edit::SelectEffect(key) => {
                config.effect = key;
                true
            }
            Edit::SelectRenderMode(key) => {
                config.render_mode = key;
                true
            }
        };
        if !applied {
            debug!("dropped non-finite or out-of-range edit");
        }
        applied
    }
}

fn write_finite(slot: &mut f64, value: f64) -> bool {
    if value.is_finite() {
        *slot = value;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ViewerState {
        let config = ViewerConfig::default();
        let selection = Selection::new("example-fractal", "flat", "shaded");
        ViewerState::new(
            SessionConfig::from_config(&config, &selection, "none".into()),
            FractalUniforms::from_config(&config).unwrap(),
        )
    }

    #[test]
    fn defaults_mirror_config() {
        let state = state();
        assert_eq!(state.uniforms, FractalUniforms::default());
        assert_eq!(state.config.time_speed, 1.0);
        assert_eq!(state.config.selection().to_string(), "example-fractal/flat/shaded");
        assert_eq!(state.config.key(FragmentKind::Effect), "none");
    }

    #[test]
    fn edits_write_whole_fields() {
        let mut state = state();
        assert!(state.apply_field(Edit::Power(7.5)));
        assert!(state.apply_field(Edit::Constant(2, -0.25)));
        assert!(state.apply_field(Edit::Iterations(0)));
        assert!(state.apply_field(Edit::EffectIntensity(4.0)));
        assert!(state.apply_field(Edit::AnimationMin(AnimationChannel::Power, 12.0)));

        assert_eq!(state.uniforms.power, 7.5);
        assert_eq!(state.uniforms.constant.z, -0.25);
        assert_eq!(state.uniforms.iterations, 1);
        assert_eq!(state.config.effect_intensity, 1.0);
        let power = state.config.animation.get(AnimationChannel::Power);
        assert_eq!((power.min(), power.max()), (12.0, 12.0));
    }

    #[test]
    fn rejects_non_finite_and_bad_components() {
        let mut state = state();
        let before = state.clone();
        assert!(!state.apply_field(Edit::Bailout(f64::NAN)));
        assert!(!state.apply_field(Edit::Constant(4, 1.0)));
        assert!(!state.apply_field(Edit::AnimationMax(AnimationChannel::ConstantW, f64::INFINITY)));
        assert_eq!(state, before);
    }

    #[test]
    fn eye_offsets_are_symmetric_along_right() {
        let offsets = EyeOffsets::symmetric(DVec3::NEG_Z, 0.064);
        assert_eq!(offsets.left, DVec3::new(0.0, 0.0, 0.032));
        assert_eq!(offsets.right, DVec3::new(0.0, 0.0, -0.032));
    }
}
