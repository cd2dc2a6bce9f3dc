//! Fixed per-frame sequence: derive state, push uniforms, record passes.

use std::fmt;

use glam::{Mat4, Vec3};
use log::trace;

use crate::config::ViewerConfig;
use crate::geometry::GeometryHandle;
use crate::render::commands::{CommandList, CommandRecorder};
use crate::render::scene_pass::record_scene_pass;
use crate::render::shadow_pass::record_shadow_pass;
use crate::render::uniforms::{names, Uniforms};
use crate::state::{CameraInput, FrameState, LightState};
use crate::time::FrameTime;

/// Values derived for one frame, ready to push into the programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    pub light: LightState,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
}

impl FrameUniforms {
    /// Pushes the frame's transforms. The light-space matrix and model matrix
    /// go to both programs; everything camera related only to the scene.
    pub fn apply(&self, scene: &mut impl Uniforms, shadow: &mut impl Uniforms) {
        shadow.set_mat4(names::LIGHT_VIEW_PROJ_MATRIX, self.light.light_space);
        scene.set_mat4(names::LIGHT_VIEW_PROJ_MATRIX, self.light.light_space);

        scene.set_float(names::LIGHT_NEAR_PLANE, self.light.near);
        scene.set_float(names::LIGHT_FAR_PLANE, self.light.far);
        scene.set_vec3(names::LIGHT_POSITION, self.light.position);
        scene.set_vec3(names::LIGHT_DIRECTION, self.light.direction);

        shadow.set_mat4(names::MODEL_MATRIX, self.model);
        scene.set_mat4(names::MODEL_MATRIX, self.model);

        scene.set_mat4(names::VIEW_MATRIX, self.view);
        scene.set_vec3(names::VIEW_POSITION, self.camera_position);
        scene.set_mat4(names::PROJECTION_MATRIX, self.projection);
    }
}

/// Pushes the uniforms that never change during a run.
pub fn apply_static_uniforms(config: &ViewerConfig, scene: &mut impl Uniforms) {
    scene.set_vec3(names::LIGHT_COLOR, config.light.color);
    scene.set_vec3(names::OBJECT_COLOR, config.model.color);
    scene.set_float(
        names::LIGHT_CUTOFF_INNER,
        config.light.inner_angle_deg.to_radians().cos(),
    );
    scene.set_float(
        names::LIGHT_CUTOFF_OUTER,
        config.light.outer_angle_deg.to_radians().cos(),
    );
    scene.set_int(names::SHADOWS_ENABLED, i32::from(config.shadow.enabled));
}

/// End-of-run snapshot printed by the binary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSummary {
    pub frames: u64,
    pub camera_position: Vec3,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub spin_deg: f32,
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.camera_position;
        writeln!(f, "Rendered {} frame(s)", self.frames)?;
        writeln!(
            f,
            "Camera pos=({:.2}, {:.2}, {:.2}) yaw={:.2} pitch={:.2}",
            p.x, p.y, p.z, self.yaw_deg, self.pitch_deg
        )?;
        write!(f, "Model spin={:.2} deg", self.spin_deg)
    }
}

/// Owns the state carried between frames.
#[derive(Debug, Clone)]
pub struct FrameDriver {
    config: ViewerConfig,
    state: FrameState,
    frames: u64,
}

impl FrameDriver {
    pub fn new(config: ViewerConfig) -> Self {
        let state = FrameState::new(&config);
        Self {
            config,
            state,
            frames: 0,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &FrameState {
        &self.state
    }

    /// Number of frames advanced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn summary(&self) -> FrameSummary {
        let camera = &self.state.camera;
        FrameSummary {
            frames: self.frames,
            camera_position: camera.position(),
            yaw_deg: camera.yaw_deg(),
            pitch_deg: camera.pitch_deg(),
            spin_deg: self.state.animation.spin_deg(),
        }
    }

    /// Steps the light, model and camera, in that order.
    ///
    /// `framebuffer_size` is only used for the projection aspect ratio.
    pub fn advance(
        &mut self,
        time: FrameTime,
        input: &CameraInput,
        framebuffer_size: (u32, u32),
    ) -> FrameUniforms {
        let light = LightState::at(time.elapsed, &self.config.light);
        self.state.animation.advance(time.dt);
        self.state.camera.update(input, time.dt);
        self.frames += 1;

        let camera = &self.state.camera;
        trace!(
            "frame {}: spin {:.2}°, camera {:?}",
            time.frame_index,
            self.state.animation.spin_deg(),
            camera.position()
        );

        FrameUniforms {
            light,
            model: self.state.animation.transform(),
            view: camera.view_matrix(),
            projection: camera.projection_matrix(framebuffer_size),
            camera_position: camera.position(),
        }
    }

    /// Records the shadow pass followed by the scene pass.
    pub fn record(&self, geometry: GeometryHandle, framebuffer_size: (u32, u32)) -> CommandList {
        let mut recorder = CommandRecorder::new();
        record_shadow_pass(&mut recorder, geometry, self.config.shadow.map_size);
        record_scene_pass(
            &mut recorder,
            geometry,
            framebuffer_size,
            self.config.clear_color,
        );
        recorder.finish()
    }

    /// One whole frame: advance, push uniforms, record.
    pub fn frame(
        &mut self,
        time: FrameTime,
        input: &CameraInput,
        geometry: GeometryHandle,
        framebuffer_size: (u32, u32),
        scene: &mut impl Uniforms,
        shadow: &mut impl Uniforms,
    ) -> CommandList {
        let uniforms = self.advance(time, input, framebuffer_size);
        uniforms.apply(scene, shadow);
        self.record(geometry, framebuffer_size)
    }
}
