//! Free-flying camera pose.
//!
//! Orientation is stored only as the `forward`/`up`/`right` vectors. Yaw and
//! pitch are reconstructed from `forward` on every pointer update instead of
//! being accumulated, so repeated updates cannot drift away from an
//! orthonormal basis.
use std::f64::consts::FRAC_PI_2;

use glam::DVec3;
use tracing::debug;

/// Reference up axis used to rebuild `right` and `up`.
pub const WORLD_UP: DVec3 = DVec3::Y;

/// Largest absolute pitch the camera may reach (radians).
pub const PITCH_LIMIT: f64 = FRAC_PI_2 - 0.1;

const DEGENERATE_EPSILON: f64 = 1e-9;

/// Axis a translation is applied along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAxis {
    Forward,
    Right,
    WorldUp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: DVec3,
    pub forward: DVec3,
    pub up: DVec3,
    pub right: DVec3,
    /// Field of view scalar passed straight through to the ray marcher.
    pub fov: f64,
}

impl CameraPose {
    /// Builds a pose looking along `forward`, deriving `right` and `up` from
    /// [`WORLD_UP`]. Returns `None` when `forward` is degenerate or vertical.
    /// A steeper forward is pulled back to ±[`PITCH_LIMIT`] keeping its yaw.
    pub fn looking(position: DVec3, forward: DVec3, fov: f64) -> Option<Self> {
        let (mut forward, mut right, mut up) = basis_from_forward(forward)?;
        let pitch = forward.y.clamp(-1.0, 1.0).asin();
        if pitch.abs() > PITCH_LIMIT {
            let yaw = forward.x.atan2(forward.z);
            (forward, right, up) =
                basis_from_forward(direction(yaw, pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT)))?;
            debug!(?forward, "clamped steep starting pitch");
        }
        Some(Self {
            position,
            forward,
            up,
            right,
            fov,
        })
    }

    pub fn yaw(&self) -> f64 {
        self.forward.x.atan2(self.forward.z)
    }

    pub fn pitch(&self) -> f64 {
        self.forward.y.clamp(-1.0, 1.0).asin()
    }

    /// Rotates the camera by a pointer delta scaled by `sensitivity`
    /// (radians per unit of delta).
    ///
    /// Positive `dx` turns right, positive `dy` looks down. Pitch is clamped
    /// to ±[`PITCH_LIMIT`]. Returns `false`, leaving the basis untouched, when
    /// the inputs or the resulting basis are degenerate.
    pub fn apply_angular_delta(&mut self, dx: f64, dy: f64, sensitivity: f64) -> bool {
        if !(dx.is_finite() && dy.is_finite() && sensitivity.is_finite()) {
            debug!(dx, dy, sensitivity, "ignoring non-finite angular delta");
            return false;
        }
        if normalized(self.forward).is_none() {
            debug!(forward = ?self.forward, "current forward is degenerate; keeping basis");
            return false;
        }

        let yaw = self.yaw() + dx * sensitivity;
        let pitch = (self.pitch() - dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let candidate = direction(yaw, pitch);

        match basis_from_forward(candidate) {
            Some((forward, right, up)) => {
                self.forward = forward;
                self.right = right;
                self.up = up;
                true
            }
            None => {
                debug!(?candidate, "rejected degenerate camera basis");
                false
            }
        }
    }

    pub fn axis(&self, axis: MoveAxis) -> DVec3 {
        match axis {
            MoveAxis::Forward => self.forward,
            MoveAxis::Right => self.right,
            MoveAxis::WorldUp => WORLD_UP,
        }
    }

    pub fn translate(&mut self, axis: MoveAxis, distance: f64) {
        if distance.is_finite() {
            self.position += self.axis(axis) * distance;
        }
    }

    pub fn snapshot(&self) -> Self {
        *self
    }

    pub fn restore(&mut self, pose: Self) {
        *self = pose;
    }

    /// Largest absolute pairwise dot product / unit-length error of the basis.
    pub fn orthonormality_error(&self) -> f64 {
        [
            self.forward.dot(self.up).abs(),
            self.forward.dot(self.right).abs(),
            self.up.dot(self.right).abs(),
            (self.forward.length() - 1.0).abs(),
            (self.up.length() - 1.0).abs(),
            (self.right.length() - 1.0).abs(),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

impl Default for CameraPose {
    /// Three units back from the origin, looking down +X.
    fn default() -> Self {
        Self {
            position: DVec3::new(-3.0, 0.0, 0.0),
            forward: DVec3::X,
            up: DVec3::Y,
            right: DVec3::NEG_Z,
            fov: 1.5,
        }
    }
}

fn direction(yaw: f64, pitch: f64) -> DVec3 {
    DVec3::new(yaw.sin() * pitch.cos(), pitch.sin(), yaw.cos() * pitch.cos())
}

/// `right = normalize(WORLD_UP × forward)`, `up = normalize(forward × right)`.
fn basis_from_forward(forward: DVec3) -> Option<(DVec3, DVec3, DVec3)> {
    let forward = normalized(forward)?;
    let right = normalized(WORLD_UP.cross(forward))?;
    let up = normalized(forward.cross(right))?;
    Some((forward, right, up))
}

pub(crate) fn normalized(vector: DVec3) -> Option<DVec3> {
    let length = vector.length();
    if length.is_finite() && length > DEGENERATE_EPSILON {
        Some(vector / length)
    } else {
        None
    }
}
