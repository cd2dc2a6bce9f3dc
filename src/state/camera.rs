use glam::{Mat4, Vec3};

use crate::config::CameraConfig;

/// Camera controls sampled for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub fast: bool,
    /// Cursor movement in pixels since the previous frame.
    pub cursor_delta: (f64, f64),
}

/// First-person camera driven by yaw and pitch angles.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    yaw_deg: f32,
    pitch_deg: f32,
    forward: Vec3,
    config: CameraConfig,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        let pitch_deg = config
            .pitch_deg
            .clamp(-config.pitch_limit_deg, config.pitch_limit_deg);
        Self {
            position: config.position,
            yaw_deg: config.yaw_deg,
            pitch_deg,
            forward: forward_from_angles(config.yaw_deg, pitch_deg),
            config: config.clone(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn yaw_deg(&self) -> f32 {
        self.yaw_deg
    }

    pub fn pitch_deg(&self) -> f32 {
        self.pitch_deg
    }

    /// Applies one frame of cursor look and key movement.
    pub fn update(&mut self, input: &CameraInput, dt: f32) {
        let (dx, dy) = input.cursor_delta;
        let turn = self.config.angular_speed * dt;
        self.yaw_deg -= dx as f32 * turn;
        self.pitch_deg -= dy as f32 * turn;
        self.pitch_deg = self
            .pitch_deg
            .clamp(-self.config.pitch_limit_deg, self.config.pitch_limit_deg);
        self.forward = forward_from_angles(self.yaw_deg, self.pitch_deg);

        let side = self.forward.cross(Vec3::Y).normalize_or_zero();
        let speed = if input.fast {
            self.config.speed * self.config.fast_multiplier
        } else {
            self.config.speed
        };
        let step = speed * dt;

        if input.forward {
            self.position += self.forward * step;
        }
        if input.back {
            self.position -= self.forward * step;
        }
        if input.left {
            self.position -= side * step;
        }
        if input.right {
            self.position += side * step;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, Vec3::Y)
    }

    /// Perspective projection with a zero-to-one depth range.
    pub fn projection_matrix(&self, framebuffer_size: (u32, u32)) -> Mat4 {
        let (width, height) = framebuffer_size;
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(
            self.config.fov_y_deg.to_radians(),
            aspect,
            self.config.near,
            self.config.far,
        )
    }
}

fn forward_from_angles(yaw_deg: f32, pitch_deg: f32) -> Vec3 {
    let (yaw, pitch) = (yaw_deg.to_radians(), pitch_deg.to_radians());
    Vec3::new(
        pitch.cos() * yaw.cos(),
        pitch.sin(),
        -pitch.cos() * yaw.sin(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&CameraConfig::default())
    }

    #[test]
    fn starts_looking_down_negative_z() {
        let camera = camera();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert_eq!(camera.position(), Vec3::new(0.6, 1.0, 2.0));
    }

    #[test]
    fn pitch_never_leaves_limit() {
        let mut camera = camera();
        let input = CameraInput {
            cursor_delta: (0.0, -10_000.0),
            ..Default::default()
        };
        camera.update(&input, 1.0);
        assert_eq!(camera.pitch_deg(), 85.0);

        let input = CameraInput {
            cursor_delta: (0.0, 50_000.0),
            ..Default::default()
        };
        camera.update(&input, 1.0);
        assert_eq!(camera.pitch_deg(), -85.0);
        assert!((camera.forward().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cursor_right_turns_yaw_down() {
        let mut camera = camera();
        let input = CameraInput {
            cursor_delta: (2.0, 0.0),
            ..Default::default()
        };
        camera.update(&input, 0.5);
        assert!((camera.yaw_deg() - 30.0).abs() < 1e-4);
    }

    #[test]
    fn forward_key_moves_one_unit_per_second() {
        let mut camera = camera();
        let before = camera.position();
        let forward = camera.forward();
        let input = CameraInput {
            forward: true,
            ..Default::default()
        };
        camera.update(&input, 1.0);
        assert!((camera.position() - before).abs_diff_eq(forward, 1e-5));
    }

    #[test]
    fn shift_triples_speed() {
        let mut camera = camera();
        let before = camera.position();
        let forward = camera.forward();
        let input = CameraInput {
            forward: true,
            fast: true,
            ..Default::default()
        };
        camera.update(&input, 1.0);
        assert!((camera.position() - before).abs_diff_eq(forward * 3.0, 1e-5));
    }

    #[test]
    fn strafe_is_unit_length_when_pitched() {
        let mut config = CameraConfig::default();
        config.pitch_deg = 60.0;
        let mut camera = Camera::new(&config);
        let before = camera.position();
        let input = CameraInput {
            right: true,
            ..Default::default()
        };
        camera.update(&input, 1.0);
        let moved = camera.position() - before;
        assert!((moved.length() - 1.0).abs() < 1e-5);
        assert!(moved.abs_diff_eq(Vec3::X, 1e-5));
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut camera = camera();
        let before = camera.position();
        let input = CameraInput {
            forward: true,
            back: true,
            left: true,
            right: true,
            ..Default::default()
        };
        camera.update(&input, 0.25);
        assert!(camera.position().abs_diff_eq(before, 1e-6));
    }

    #[test]
    fn view_matrix_maps_target_onto_negative_z() {
        let camera = camera();
        let target = camera.position() + camera.forward() * 5.0;
        let in_view = camera.view_matrix().transform_point3(target);
        assert!(in_view.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-4));
    }
}
