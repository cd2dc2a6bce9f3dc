//! Viewer constants grouped by concern.

use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub shadow: ShadowConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub model: ModelConfig,
    /// Clear colour of the on-screen framebuffer.
    pub clear_color: [f64; 4],
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shadow: ShadowConfig::default(),
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            model: ModelConfig::default(),
            clear_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Shadow Lab".to_string(),
            width: 1024,
            height: 768,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    /// Width and height of the square depth texture.
    pub map_size: u32,
    /// When false the depth pass still runs but the scene ignores it.
    pub enabled: bool,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: 1024,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    /// Horizontal angle in degrees; 90° looks down -Z.
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub pitch_limit_deg: f32,
    /// Units per second.
    pub speed: f32,
    /// Speed multiplier while Shift is held.
    pub fast_multiplier: f32,
    /// Degrees per second per pixel of cursor motion.
    pub angular_speed: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.6, 1.0, 2.0),
            yaw_deg: 90.0,
            pitch_deg: 0.0,
            pitch_limit_deg: 85.0,
            speed: 1.0,
            fast_multiplier: 3.0,
            angular_speed: 60.0,
            fov_y_deg: 70.0,
            near: 0.01,
            far: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Point the light looks at.
    pub focus: Vec3,
    pub near: f32,
    pub far: f32,
    /// Half extent of the light frustum at the near plane.
    pub frustum_half_extent: f32,
    pub inner_angle_deg: f32,
    pub outer_angle_deg: f32,
    pub color: Vec3,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            focus: Vec3::new(0.0, 0.0, -1.0),
            near: 1.0,
            far: 180.0,
            frustum_half_extent: 1.0,
            inner_angle_deg: 20.0,
            outer_angle_deg: 30.0,
            color: Vec3::ONE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub translation: Vec3,
    /// Fixed rotation about X applied before the spin.
    pub base_pitch_deg: f32,
    pub scale: f32,
    /// Spin about Y in degrees per second.
    pub spin_rate_deg: f32,
    pub color: Vec3,
    /// Upload with an index buffer (default) or as plain triangle corners.
    pub indexed: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/models/heracles.obj"),
            translation: Vec3::new(0.0, 1.0, -3.0),
            base_pitch_deg: -90.0,
            scale: 0.1,
            spin_rate_deg: 45.0,
            color: Vec3::ONE,
            indexed: true,
        }
    }
}
