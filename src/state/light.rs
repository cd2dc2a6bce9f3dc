use std::f64::consts::PI;

use glam::{Mat4, Vec3, Vec4};

use crate::config::LightConfig;

/// Spot light pose and its light-space transform at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightState {
    pub position: Vec3,
    /// Unit vector from the light towards its focus.
    pub direction: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
    /// `projection * view`, shared by the depth and scene passes.
    pub light_space: Mat4,
    pub near: f32,
    pub far: f32,
}

impl LightState {
    /// Evaluates the light at `elapsed` seconds. Depends on nothing else.
    pub fn at(elapsed: f64, config: &LightConfig) -> Self {
        let position = orbit_position(elapsed);
        let direction = (config.focus - position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);
        let view = Mat4::look_to_rh(position, direction, Vec3::Y);
        let extent = config.frustum_half_extent;
        let projection = frustum_rh(-extent, extent, -extent, extent, config.near, config.far);
        Self {
            position,
            direction,
            view,
            projection,
            light_space: projection * view,
            near: config.near,
            far: config.far,
        }
    }
}

/// Light path: `(sin 6πt, sin πt, cos πt)`.
pub fn orbit_position(elapsed: f64) -> Vec3 {
    Vec3::new(
        (6.0 * PI * elapsed).sin() as f32,
        (PI * elapsed).sin() as f32,
        (PI * elapsed).cos() as f32,
    )
}

/// Off-axis perspective frustum, right handed, depth mapped to `[0, 1]`.
pub fn frustum_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = near - far;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            far / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, near * far / depth, 0.0),
    )
}
