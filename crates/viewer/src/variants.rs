//! Per-fractal snapshots of the tunable parameter set.
//!
//! Every registered fractal gets its own copy of the defaults at startup.
//! Switching away from a fractal saves the live values under its key;
//! switching back applies the stored copy through a fixed whitelist. Stored
//! values are plain clones, so the store and the live state never alias.
use std::collections::BTreeMap;

use tracing::debug;

use crate::state::{FractalUniforms, SessionConfig};

/// Whether a restore also brings back the saved camera pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestorePolicy {
    pub restore_camera: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantState {
    pub config: SessionConfig,
    pub uniforms: FractalUniforms,
}

impl VariantState {
    /// Copies whitelisted fields onto the live state.
    ///
    /// The active fractal key and the stereo toggle always stay live; the
    /// camera pose is copied only when `policy.restore_camera` is set.
    pub fn apply(
        &self,
        config: &mut SessionConfig,
        uniforms: &mut FractalUniforms,
        policy: RestorePolicy,
    ) {
        let saved = &self.config;
        config.time_speed = saved.time_speed;
        config.movement_speed = saved.movement_speed;
        config.mouse_sensitivity = saved.mouse_sensitivity;
        config.effect_intensity = saved.effect_intensity;
        config.coloring.clone_from(&saved.coloring);
        config.effect.clone_from(&saved.effect);
        config.render_mode.clone_from(&saved.render_mode);
        config.animation = saved.animation;
        config.animate = saved.animate;

        let stored = &self.uniforms;
        uniforms.power = stored.power;
        uniforms.constant = stored.constant;
        uniforms.iterations = stored.iterations;
        uniforms.steps = stored.steps;
        uniforms.accuracy = stored.accuracy;
        uniforms.bailout = stored.bailout;
        uniforms.threshold = stored.threshold;
        uniforms.eye_offsets = stored.eye_offsets;
        if policy.restore_camera {
            uniforms.camera = stored.camera;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VariantStateStore {
    states: BTreeMap<String, VariantState>,
}

impl VariantStateStore {
    /// One independent copy of the defaults per id. The id set is closed
    /// from here on.
    pub fn initialize<I, S>(ids: I, config: &SessionConfig, uniforms: &FractalUniforms) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let states = ids
            .into_iter()
            .map(|id| {
                let mut config = config.clone();
                let id = id.into();
                config.fractal.clone_from(&id);
                (
                    id,
                    VariantState {
                        config,
                        uniforms: *uniforms,
                    },
                )
            })
            .collect();
        Self { states }
    }

    /// Stores a copy of the live values. Unknown ids are ignored.
    pub fn save(&mut self, id: &str, config: &SessionConfig, uniforms: &FractalUniforms) -> bool {
        match self.states.get_mut(id) {
            Some(state) => {
                state.config.clone_from(config);
                state.uniforms = *uniforms;
                debug!(variant = id, "saved variant state");
                true
            }
            None => {
                debug!(variant = id, "ignoring save for unknown variant");
                false
            }
        }
    }

    /// A copy of the stored state, or `None` for an unknown id.
    pub fn load(&self, id: &str) -> Option<VariantState> {
        self.states.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.states.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
