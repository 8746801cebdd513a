//! Flat uniform set handed to the render collaborator each frame.
//!
//! [`UniformBundle`] is the name/value view a generic renderer binds by name;
//! [`UniformBlock`] is the same data packed into a std140 block for a single
//! buffer upload.
use bytemuck::{Pod, Zeroable};
use glam::{DVec2, DVec3, DVec4};

use crate::stereo::RenderPose;
use crate::state::ViewerState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f64),
    Int(i32),
    Bool(bool),
    Vec2([f64; 2]),
    Vec3([f64; 3]),
    Vec4([f64; 4]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformBundle {
    pub time: f64,
    pub resolution: DVec2,
    pub position: DVec3,
    pub fov: f64,
    pub forward: DVec3,
    pub up: DVec3,
    pub right: DVec3,
    pub power: f64,
    pub constant: DVec4,
    pub iterations: u32,
    pub steps: u32,
    pub accuracy: u32,
    pub bailout: f64,
    pub threshold: f64,
    pub intensity: f64,
    pub eye_left: DVec3,
    pub eye_right: DVec3,
    pub stereo: bool,
}

impl UniformBundle {
    /// Camera fields come from `render`, never from the stored base pose.
    /// Without stereo offsets both eyes sit at the render position.
    pub fn from_state(state: &ViewerState, render: &RenderPose) -> Self {
        let pose = &render.pose;
        let uniforms = &state.uniforms;
        let (eye_left, eye_right) = match render.eyes {
            Some(eyes) => (pose.position + eyes.left, pose.position + eyes.right),
            None => (pose.position, pose.position),
        };
        Self {
            time: state.time,
            resolution: state.resolution,
            position: pose.position,
            fov: pose.fov,
            forward: pose.forward,
            up: pose.up,
            right: pose.right,
            power: uniforms.power,
            constant: uniforms.constant,
            iterations: uniforms.iterations,
            steps: uniforms.steps,
            accuracy: uniforms.accuracy,
            bailout: uniforms.bailout,
            threshold: uniforms.threshold,
            intensity: state.config.effect_intensity,
            eye_left,
            eye_right,
            stereo: render.eyes.is_some(),
        }
    }

    pub fn entries(&self) -> Vec<(&'static str, UniformValue)> {
        vec![
            ("u_time", UniformValue::Float(self.time)),
            ("u_resolution", UniformValue::Vec2(self.resolution.to_array())),
            ("u_pos", UniformValue::Vec3(self.position.to_array())),
            ("u_fov", UniformValue::Float(self.fov)),
            ("u_forward", UniformValue::Vec3(self.forward.to_array())),
            ("u_up", UniformValue::Vec3(self.up.to_array())),
            ("u_right", UniformValue::Vec3(self.right.to_array())),
            ("u_power", UniformValue::Float(self.power)),
            ("u_constant", UniformValue::Vec4(self.constant.to_array())),
            ("u_iterations", UniformValue::Int(saturating_i32(self.iterations))),
            ("u_steps", UniformValue::Int(saturating_i32(self.steps))),
            ("u_accuracy", UniformValue::Int(saturating_i32(self.accuracy))),
            ("u_bailout", UniformValue::Float(self.bailout)),
            ("u_threshold", UniformValue::Float(self.threshold)),
            ("u_intensity", UniformValue::Float(self.intensity)),
            ("u_eye_left", UniformValue::Vec3(self.eye_left.to_array())),
            ("u_eye_right", UniformValue::Vec3(self.eye_right.to_array())),
            ("u_stereo", UniformValue::Bool(self.stereo)),
        ]
    }

    pub fn block(&self) -> UniformBlock {
        UniformBlock {
            resolution_time_fov: [
                self.resolution.x as f32,
                self.resolution.y as f32,
                self.time as f32,
                self.fov as f32,
            ],
            position_intensity: extend(self.position, self.intensity),
            forward_power: extend(self.forward, self.power),
            up_bailout: extend(self.up, self.bailout),
            right_threshold: extend(self.right, self.threshold),
            constant: self.constant.as_vec4().to_array(),
            eye_left_stereo: extend(self.eye_left, if self.stereo { 1.0 } else { 0.0 }),
            eye_right: extend(self.eye_right, 0.0),
            counts: [
                saturating_i32(self.iterations),
                saturating_i32(self.steps),
                saturating_i32(self.accuracy),
                0,
            ],
        }
    }
}

/// std140 mirror of [`UniformBundle`]. Scalars ride in the `w` lane of the
/// vec3 slots so every member is a full 16-byte row.
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformBlock {
    pub resolution_time_fov: [f32; 4],
    pub position_intensity: [f32; 4],
    pub forward_power: [f32; 4],
    pub up_bailout: [f32; 4],
    pub right_threshold: [f32; 4],
    pub constant: [f32; 4],
    pub eye_left_stereo: [f32; 4],
    pub eye_right: [f32; 4],
    pub counts: [i32; 4],
}

unsafe impl Zeroable for UniformBlock {}
unsafe impl Pod for UniformBlock {}

fn extend(vector: DVec3, w: f64) -> [f32; 4] {
    [vector.x as f32, vector.y as f32, vector.z as f32, w as f32]
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
