use glam::{Mat4, Quat};

use crate::config::ModelConfig;

/// Spin of the displayed model about the world Y axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAnimation {
    spin_deg: f32,
    config: ModelConfig,
}

impl ModelAnimation {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            spin_deg: 0.0,
            config: config.clone(),
        }
    }

    /// Accumulated spin in degrees. Never decreases.
    pub fn spin_deg(&self) -> f32 {
        self.spin_deg
    }

    /// Advances the spin by `rate * dt` and returns the new angle.
    /// Negative deltas are treated as zero.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.spin_deg += self.config.spin_rate_deg * dt.max(0.0);
        self.spin_deg
    }

    /// `translate * spin_y * base_pitch_x * scale`.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(self.config.translation)
            * Mat4::from_quat(Quat::from_rotation_y(self.spin_deg.to_radians()))
            * Mat4::from_quat(Quat::from_rotation_x(self.config.base_pitch_deg.to_radians()))
            * Mat4::from_scale(glam::Vec3::splat(self.config.scale))
    }
}
