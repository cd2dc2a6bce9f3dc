//! Per-frame mutable state: camera, model spin, and the time-driven light.

pub mod animation;
pub mod camera;
pub mod light;

pub use animation::ModelAnimation;
pub use camera::{Camera, CameraInput};
pub use light::{frustum_rh, LightState};

use crate::config::ViewerConfig;

/// State carried from one frame to the next.
///
/// The light is not part of it; it is recomputed from elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub camera: Camera,
    pub animation: ModelAnimation,
}

impl FrameState {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            camera: Camera::new(&config.camera),
            animation: ModelAnimation::new(&config.model),
        }
    }
}
