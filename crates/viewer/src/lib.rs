//! Real-time core of the ray-marched fractal viewer.
//!
//! Rendering, widgets and face-landmark inference live outside this crate
//! behind [`RenderTarget`] and [`FaceTracker`]. What lives here is the state
//! they operate on: a drift-free camera, per-fractal parameter snapshots, a
//! cached shader pipeline over the `composer` crate, the parameter animator,
//! and the head-tracked stereo pose controller.
pub mod animator;
pub mod camera;
pub mod controls;
pub mod input;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod stereo;
pub mod uniforms;
pub mod variants;

pub use animator::{AnimationChannel, AnimationRange, AnimationRanges, ParameterAnimator};
pub use camera::{CameraPose, MoveAxis, PITCH_LIMIT, WORLD_UP};
pub use controls::{ControlGroup, ControlId, ControlSurface, RangeControl, RangeMode};
pub use input::{InputAction, InputState, KeyBindings};
pub use pipeline::ShaderPipeline;
pub use session::{Frame, FrameReport, RenderTarget, Viewer, ViewerError};
pub use state::{Edit, EyeOffsets, FractalUniforms, SessionConfig, ViewerState};
pub use stereo::{
    FaceLandmarks, FaceTracker, RenderPose, StereoPoseController, StereoState, TrackerError,
};
pub use uniforms::{UniformBlock, UniformBundle, UniformValue};
pub use variants::{RestorePolicy, VariantState, VariantStateStore};
