//! Numeric range controls with auto-expanding bounds.
//!
//! The widget toolkit lives outside this crate; what lives here is the range
//! bookkeeping each slider needs and the translation from a committed value
//! into a queued [`Edit`].
//!
//! Types:
//!
//! - `RangeMode` picks how a control's bounds react to a commit.
//! - `ControlId` names every tunable; parses from the names used in scripts.
//! - `ControlSurface` owns one `RangeControl` per id.
//!
//! Functions:
//!
//! - `ControlSurface::commit` expands the range, snaps the value, and returns
//!   the edit to queue.
//! - `ControlSurface::visible_groups` applies the toggle dependencies.
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::animator::AnimationChannel;
use crate::state::{Edit, SessionConfig};

/// Ranges never grow past this multiple of their initial bound.
pub const EXPANSION_LIMIT: f64 = 20.0;

/// Headroom added above a committed value.
pub const EXPANSION_HEADROOM: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeMode {
    /// Only the upper bound follows the committed value.
    Magnitude,
    /// Both bounds follow `|value|`, mirrored around zero.
    Signed,
    /// Bounds never change.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeControl {
    initial: (f64, f64),
    min: f64,
    max: f64,
    mode: RangeMode,
    integer: bool,
}

impl RangeControl {
    pub fn new(min: f64, max: f64, mode: RangeMode) -> Self {
        Self {
            initial: (min, max),
            min,
            max,
            mode,
            integer: false,
        }
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn mode(&self) -> RangeMode {
        self.mode
    }

    /// Recomputes the bounds for a committed value and returns the value
    /// snapped into them. Non-finite values are rejected.
    pub fn commit(&mut self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let (initial_min, initial_max) = self.initial;
        match self.mode {
            RangeMode::Magnitude => {
                self.max = (value * EXPANSION_HEADROOM)
                    .max(initial_max)
                    .min(initial_max * EXPANSION_LIMIT);
            }
            RangeMode::Signed => {
                let magnitude = value.abs() * EXPANSION_HEADROOM;
                self.max = initial_max.max((initial_max * EXPANSION_LIMIT).min(magnitude));
                self.min = initial_min.min((initial_min * EXPANSION_LIMIT).max(-magnitude));
            }
            RangeMode::Fixed => {}
        }

        let mut snapped = value.clamp(self.min, self.max);
        if self.integer {
            snapped = snapped.round().clamp(self.min.ceil(), self.max.floor());
        }
        Some(snapped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlGroup {
    Camera,
    Fractal,
    Animation,
    Effect,
    Stereo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ControlId {
    Fov,
    TimeSpeed,
    MouseSensitivity,
    MovementSpeed,
    Power,
    Constant(usize),
    Iterations,
    Steps,
    Accuracy,
    Bailout,
    Threshold,
    EffectIntensity,
    AnimationMin(AnimationChannel),
    AnimationMax(AnimationChannel),
}

const CONSTANT_AXES: [&str; 4] = ["x", "y", "z", "w"];

impl ControlId {
    pub fn all() -> Vec<ControlId> {
        let mut ids = vec![
            ControlId::Fov,
            ControlId::TimeSpeed,
            ControlId::MouseSensitivity,
            ControlId::MovementSpeed,
            ControlId::Power,
        ];
        ids.extend((0..4).map(ControlId::Constant));
        ids.extend([
            ControlId::Iterations,
            ControlId::Steps,
            ControlId::Accuracy,
            ControlId::Bailout,
            ControlId::Threshold,
            ControlId::EffectIntensity,
        ]);
        for channel in AnimationChannel::ALL {
            ids.push(ControlId::AnimationMin(channel));
            ids.push(ControlId::AnimationMax(channel));
        }
        ids
    }

    pub fn group(self) -> ControlGroup {
        match self {
            ControlId::Fov
            | ControlId::TimeSpeed
            | ControlId::MouseSensitivity
            | ControlId::MovementSpeed => ControlGroup::Camera,
            ControlId::EffectIntensity => ControlGroup::Effect,
            ControlId::AnimationMin(_) | ControlId::AnimationMax(_) => ControlGroup::Animation,
            _ => ControlGroup::Fractal,
        }
    }

    fn default_range(self) -> RangeControl {
        match self {
            ControlId::Fov | ControlId::TimeSpeed => RangeControl::new(0.0, 5.0, RangeMode::Magnitude),
            ControlId::MouseSensitivity | ControlId::MovementSpeed => {
                RangeControl::new(1.0, 5.0, RangeMode::Magnitude)
            }
            ControlId::Power => RangeControl::new(-5.0, 5.0, RangeMode::Signed),
            ControlId::Constant(_) => RangeControl::new(-2.0, 2.0, RangeMode::Signed),
            ControlId::Iterations => RangeControl::new(1.0, 50.0, RangeMode::Magnitude).integer(),
            ControlId::Steps => RangeControl::new(1.0, 300.0, RangeMode::Magnitude).integer(),
            ControlId::Accuracy => RangeControl::new(1.0, 10.0, RangeMode::Magnitude).integer(),
            ControlId::Bailout => RangeControl::new(1.0, 10.0, RangeMode::Magnitude),
            ControlId::Threshold => RangeControl::new(0.0001, 0.01, RangeMode::Magnitude),
            ControlId::EffectIntensity => RangeControl::new(0.0, 1.0, RangeMode::Fixed),
            ControlId::AnimationMin(channel) | ControlId::AnimationMax(channel) => match channel {
                AnimationChannel::Power => RangeControl::new(-5.0, 5.0, RangeMode::Signed),
                _ => RangeControl::new(-2.0, 2.0, RangeMode::Signed),
            },
        }
    }

    fn edit(self, value: f64) -> Edit {
        match self {
            ControlId::Fov => Edit::Fov(value),
            ControlId::TimeSpeed => Edit::TimeSpeed(value),
            ControlId::MouseSensitivity => Edit::MouseSensitivity(value),
            ControlId::MovementSpeed => Edit::MovementSpeed(value),
            ControlId::Power => Edit::Power(value),
            ControlId::Constant(component) => Edit::Constant(component, value),
            ControlId::Iterations => Edit::Iterations(to_count(value)),
            ControlId::Steps => Edit::Steps(to_count(value)),
            ControlId::Accuracy => Edit::Accuracy(to_count(value)),
            ControlId::Bailout => Edit::Bailout(value),
            ControlId::Threshold => Edit::Threshold(value),
            ControlId::EffectIntensity => Edit::EffectIntensity(value),
            ControlId::AnimationMin(channel) => Edit::AnimationMin(channel, value),
            ControlId::AnimationMax(channel) => Edit::AnimationMax(channel, value),
        }
    }
}

fn to_count(value: f64) -> u32 {
    value.round().clamp(1.0, u32::MAX as f64) as u32
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlId::Fov => f.write_str("fov"),
            ControlId::TimeSpeed => f.write_str("time_speed"),
            ControlId::MouseSensitivity => f.write_str("mouse_sensitivity"),
            ControlId::MovementSpeed => f.write_str("movement_speed"),
            ControlId::Power => f.write_str("power"),
            ControlId::Constant(component) => {
                let axis = CONSTANT_AXES.get(*component).copied().unwrap_or("?");
                write!(f, "constant_{axis}")
            }
            ControlId::Iterations => f.write_str("iterations"),
            ControlId::Steps => f.write_str("steps"),
            ControlId::Accuracy => f.write_str("accuracy"),
            ControlId::Bailout => f.write_str("bailout"),
            ControlId::Threshold => f.write_str("threshold"),
            ControlId::EffectIntensity => f.write_str("effect_intensity"),
            ControlId::AnimationMin(channel) => write!(f, "animation.{}.min", channel.as_str()),
            ControlId::AnimationMax(channel) => write!(f, "animation.{}.max", channel.as_str()),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown control '{0}'")]
pub struct UnknownControl(pub String);

impl FromStr for ControlId {
    type Err = UnknownControl;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let trimmed = name.trim();
        if let Some(rest) = trimmed.strip_prefix("animation.") {
            let parsed = rest.rsplit_once('.').and_then(|(channel, bound)| {
                let channel = AnimationChannel::from_name(channel)?;
                match bound {
                    "min" => Some(ControlId::AnimationMin(channel)),
                    "max" => Some(ControlId::AnimationMax(channel)),
                    _ => None,
                }
            });
            return parsed.ok_or_else(|| UnknownControl(name.to_string()));
        }
        if let Some(axis) = trimmed.strip_prefix("constant_") {
            return CONSTANT_AXES
                .iter()
                .position(|candidate| *candidate == axis)
                .map(ControlId::Constant)
                .ok_or_else(|| UnknownControl(name.to_string()));
        }
        let id = match trimmed {
            "fov" => ControlId::Fov,
            "time_speed" => ControlId::TimeSpeed,
            "mouse_sensitivity" => ControlId::MouseSensitivity,
            "movement_speed" => ControlId::MovementSpeed,
            "power" => ControlId::Power,
            "iterations" => ControlId::Iterations,
            "steps" => ControlId::Steps,
            "accuracy" => ControlId::Accuracy,
            "bailout" => ControlId::Bailout,
            "threshold" => ControlId::Threshold,
            "effect_intensity" => ControlId::EffectIntensity,
            _ => return Err(UnknownControl(name.to_string())),
        };
        Ok(id)
    }
}

#[derive(Debug, Clone)]
pub struct ControlSurface {
    controls: BTreeMap<ControlId, RangeControl>,
}

impl Default for ControlSurface {
    fn default() -> Self {
        let controls = ControlId::all()
            .into_iter()
            .map(|id| (id, id.default_range()))
            .collect();
        Self { controls }
    }
}

impl ControlSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self, id: ControlId) -> Option<&RangeControl> {
        self.controls.get(&id)
    }

    /// Returns the edit for a committed value, or `None` when the value is
    /// not finite.
    pub fn commit(&mut self, id: ControlId, value: f64) -> Option<Edit> {
        let control = self.controls.entry(id).or_insert_with(|| id.default_range());
        control.commit(value).map(|snapped| id.edit(snapped))
    }

    /// Groups shown for the current toggles; animation and stereo tuning
    /// only appear while their feature is on.
    pub fn visible_groups(config: &SessionConfig) -> Vec<ControlGroup> {
        let mut groups = vec![ControlGroup::Camera, ControlGroup::Fractal];
        if config.animate {
            groups.push(ControlGroup::Animation);
        }
        groups.push(ControlGroup::Effect);
        if config.stereo {
            groups.push(ControlGroup::Stereo);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use composer::Selection;
    use viewconfig::ViewerConfig;

    use super::*;

    #[test]
    fn magnitude_range_grows_with_headroom_and_cap() {
        let mut control = RangeControl::new(1.0, 10.0, RangeMode::Magnitude);
        assert_eq!(control.commit(4.0), Some(4.0));
        assert_eq!(control.bounds(), (1.0, 10.0));

        assert_eq!(control.commit(30.0), Some(30.0));
        assert_eq!(control.bounds(), (1.0, 45.0));

        assert_eq!(control.commit(1000.0), Some(200.0));
        assert_eq!(control.bounds(), (1.0, 200.0));

        control.commit(2.0);
        assert_eq!(control.bounds(), (1.0, 10.0));
    }

    #[test]
    fn signed_range_expands_symmetrically_on_magnitude() {
        let mut control = RangeControl::new(-5.0, 5.0, RangeMode::Signed);
        assert_eq!(control.commit(-8.0), Some(-8.0));
        assert_eq!(control.bounds(), (-12.0, 12.0));

        control.commit(1.0);
        assert_eq!(control.bounds(), (-5.0, 5.0));

        control.commit(500.0);
        assert_eq!(control.bounds(), (-100.0, 100.0));
    }

    #[test]
    fn fixed_range_clamps_without_expanding() {
        let mut control = RangeControl::new(0.0, 1.0, RangeMode::Fixed);
        assert_eq!(control.commit(3.0), Some(1.0));
        assert_eq!(control.bounds(), (0.0, 1.0));
        assert_eq!(control.commit(f64::NAN), None);
    }

    #[test]
    fn integer_controls_round_to_counts() {
        let mut surface = ControlSurface::new();
        assert_eq!(surface.commit(ControlId::Steps, 412.6), Some(Edit::Steps(413)));
        assert!((surface.range(ControlId::Steps).unwrap().bounds().1 - 618.9).abs() < 1e-9);
        assert_eq!(surface.commit(ControlId::Iterations, 0.2), Some(Edit::Iterations(1)));
    }

    #[test]
    fn control_names_parse() {
        for id in ControlId::all() {
            assert_eq!(id.to_string().parse::<ControlId>().unwrap(), id);
        }
        assert_eq!(
            "animation.constant_z.max".parse::<ControlId>().unwrap(),
            ControlId::AnimationMax(AnimationChannel::ConstantZ)
        );
        assert!("constant_q".parse::<ControlId>().is_err());
        assert!("animation.power.mid".parse::<ControlId>().is_err());
    }

    #[test]
    fn toggles_reveal_dependent_groups() {
        let config = ViewerConfig::default();
        let selection = Selection::new("example-fractal", "flat", "shaded");
        let mut session = SessionConfig::from_config(&config, &selection, "none".into());
        assert!(!ControlSurface::visible_groups(&session).contains(&ControlGroup::Animation));

        session.animate = true;
        session.stereo = true;
        let groups = ControlSurface::visible_groups(&session);
        assert!(groups.contains(&ControlGroup::Animation));
        assert!(groups.contains(&ControlGroup::Stereo));
    }
}
