//! Phase-locked oscillation of the fractal parameters.
//!
//! Types:
//!
//! - `AnimationRange` holds one channel's `[min, max]`; editing one bound
//!   pushes the other so `min <= max` always holds.
//! - `AnimationRanges` groups the power channel and the four constant
//!   components.
//!
//! Functions:
//!
//! - `ParameterAnimator::tick` maps elapsed time to the shared wave.
//! - `ParameterAnimator::animate` writes every channel from one wave sample.
use viewconfig::AnimationSection;

use crate::state::FractalUniforms;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationRange {
    min: f64,
    max: f64,
}

impl AnimationRange {
    /// Builds a range, swapping the bounds if they arrive inverted.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sets the lower bound, raising the upper bound to match if needed.
    pub fn set_min(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.min = value;
        if self.max < value {
            self.max = value;
        }
    }

    /// Sets the upper bound, lowering the lower bound to match if needed.
    pub fn set_max(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.max = value;
        if self.min > value {
            self.min = value;
        }
    }

    /// Interpolates with a wave in `[0, 1]`; the result is clamped so float
    /// error cannot leave the range.
    pub fn sample(&self, wave: f64) -> f64 {
        (self.min + (self.max - self.min) * wave).clamp(self.min, self.max)
    }
}

impl From<[f64; 2]> for AnimationRange {
    fn from([a, b]: [f64; 2]) -> Self {
        Self::new(a, b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AnimationChannel {
    Power,
    ConstantX,
    ConstantY,
    ConstantZ,
    ConstantW,
}

impl AnimationChannel {
    pub const ALL: [AnimationChannel; 5] = [
        AnimationChannel::Power,
        AnimationChannel::ConstantX,
        AnimationChannel::ConstantY,
        AnimationChannel::ConstantZ,
        AnimationChannel::ConstantW,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnimationChannel::Power => "power",
            AnimationChannel::ConstantX => "constant_x",
            AnimationChannel::ConstantY => "constant_y",
            AnimationChannel::ConstantZ => "constant_z",
            AnimationChannel::ConstantW => "constant_w",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationRanges {
    pub power: AnimationRange,
    pub constant: [AnimationRange; 4],
}

impl AnimationRanges {
    pub fn from_config(section: &AnimationSection) -> Self {
        Self {
            power: section.power.into(),
            constant: [
                section.constant_x.into(),
                section.constant_y.into(),
                section.constant_z.into(),
                section.constant_w.into(),
            ],
        }
    }

    pub fn get(&self, channel: AnimationChannel) -> &AnimationRange {
        match channel {
            AnimationChannel::Power => &self.power,
            AnimationChannel::ConstantX => &self.constant[0],
            AnimationChannel::ConstantY => &self.constant[1],
            AnimationChannel::ConstantZ => &self.constant[2],
            AnimationChannel::ConstantW => &self.constant[3],
        }
    }

    pub fn get_mut(&mut self, channel: AnimationChannel) -> &mut AnimationRange {
        match channel {
            AnimationChannel::Power => &mut self.power,
            AnimationChannel::ConstantX => &mut self.constant[0],
            AnimationChannel::ConstantY => &mut self.constant[1],
            AnimationChannel::ConstantZ => &mut self.constant[2],
            AnimationChannel::ConstantW => &mut self.constant[3],
        }
    }
}

impl Default for AnimationRanges {
    fn default() -> Self {
        Self::from_config(&AnimationSection::default())
    }
}

/// Stateless oscillator shared by every animated channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterAnimator;

impl ParameterAnimator {
    /// `(sin(elapsed) + 1) / 2`, always within `[0, 1]`.
    pub fn tick(elapsed: f64) -> f64 {
        ((elapsed.sin() + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Overwrites power and the four constant components from one wave
    /// sample. Non-finite time leaves the uniforms untouched.
    pub fn animate(elapsed: f64, ranges: &AnimationRanges, uniforms: &mut FractalUniforms) {
        if !elapsed.is_finite() {
            return;
        }
        let wave = Self::tick(elapsed);
        uniforms.power = ranges.power.sample(wave);
        for (component, range) in ranges.constant.iter().enumerate() {
            uniforms.constant[component] = range.sample(wave);
        }
    }
}
