use glam::{DQuat, DVec3};
use viewconfig::OrbitSection;

use super::tracking::{LandmarkPair, SmoothedFace};
use super::RenderPose;
use crate::camera::{normalized, CameraPose, PITCH_LIMIT, WORLD_UP};

/// Up guide used instead of [`WORLD_UP`] once the view nears the pole.
const POLE_GUIDE: DVec3 = DVec3::Z;

/// Orbit parallax: the head position swings the camera around the origin.
///
/// The base distance from the origin is the orbit radius, shortened as the
/// head approaches. Screen offsets rotate the base direction by a yaw about
/// world up and a pitch about the base right axis, the camera looks back at
/// the origin, and forward picks up a small keystone skew toward the offset.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitParallax {
    pub yaw_range: f64,
    pub pitch_range: f64,
    pub zoom_sensitivity: f64,
    pub keystone: f64,
    pub min_radius: f64,
    pub landmarks: LandmarkPair,
}

impl OrbitParallax {
    pub fn from_config(section: &OrbitSection) -> Self {
        Self {
            yaw_range: section.yaw_range,
            pitch_range: section.pitch_range,
            zoom_sensitivity: section.zoom_sensitivity,
            keystone: section.keystone,
            min_radius: section.min_radius,
            landmarks: LandmarkPair::new(section.landmarks),
        }
    }

    pub fn render_pose(&self, base: &CameraPose, face: &SmoothedFace) -> Option<RenderPose> {
        let offset_x = (face.x - 0.5) * 2.0;
        let offset_y = (face.y - 0.5) * 2.0;

        let base_radius = base.position.length();
        let axis = normalized(base.position).unwrap_or(-base.forward);
        let radius = (base_radius.max(self.min_radius) - face.zoom() * self.zoom_sensitivity)
            .max(self.min_radius);

        let yaw = -offset_x * self.yaw_range;
        let pitch = (offset_y * self.pitch_range).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let rotation =
            DQuat::from_axis_angle(WORLD_UP, yaw) * DQuat::from_axis_angle(base.right, pitch);
        let direction = normalized(rotation * axis)?;
        let position = direction * radius;

        let look = -direction;
        let guide = if look.y.abs() > PITCH_LIMIT.sin() {
            POLE_GUIDE
        } else {
            WORLD_UP
        };
        let right = normalized(guide.cross(look))?;
        let up = normalized(look.cross(right))?;
        let forward =
            normalized(look + right * (offset_x * self.keystone) - up * (offset_y * self.keystone))?;

        Some(RenderPose {
            pose: CameraPose {
                position,
                forward,
                up,
                right,
                fov: base.fov,
            },
            eyes: None,
        })
    }
}

impl Default for OrbitParallax {
    fn default() -> Self {
        Self::from_config(&OrbitSection::default())
    }
}
