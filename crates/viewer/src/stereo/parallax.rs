use glam::DVec3;
use viewconfig::ParallaxSection;

use super::tracking::{LandmarkPair, SmoothedFace};
use super::RenderPose;
use crate::camera::{normalized, CameraPose};
use crate::state::EyeOffsets;

/// Head-coupled parallax: the eye slides with the viewer's head while the
/// view stays fixated on a point in front of the base camera.
///
/// Only position and forward change; right and up keep the base values so
/// the horizon does not tilt with the head.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadParallax {
    pub sensitivity: f64,
    pub depth_sensitivity: f64,
    pub focus_distance: f64,
    pub eye_separation: f64,
    pub landmarks: LandmarkPair,
}

impl HeadParallax {
    pub fn from_config(section: &ParallaxSection) -> Self {
        Self {
            sensitivity: section.sensitivity,
            depth_sensitivity: section.depth_sensitivity,
            focus_distance: section.focus_distance,
            eye_separation: section.eye_separation,
            landmarks: LandmarkPair::new(section.landmarks),
        }
    }

    /// `None` when the eye lands on the focus point.
    pub fn render_pose(&self, base: &CameraPose, face: &SmoothedFace) -> Option<RenderPose> {
        let dx = (0.5 - face.x) * self.sensitivity;
        let dy = (0.5 - face.y) * self.sensitivity;
        let dz = face.zoom() * self.depth_sensitivity;

        let eye: DVec3 = base.position + base.right * dx + base.up * dy + base.forward * dz;
        let focus = base.position + base.forward * self.focus_distance;
        let forward = normalized(focus - eye)?;

        Some(RenderPose {
            pose: CameraPose {
                position: eye,
                forward,
                ..*base
            },
            eyes: Some(EyeOffsets::symmetric(base.right, self.eye_separation)),
        })
    }
}

impl Default for HeadParallax {
    fn default() -> Self {
        Self::from_config(&ParallaxSection::default())
    }
}
