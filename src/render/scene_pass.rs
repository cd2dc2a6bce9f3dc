//! Lit pass rendered from the camera into the window.

use crate::geometry::GeometryHandle;

use super::commands::{ClearOps, CommandRecorder, FramebufferTarget, ProgramKind, Viewport};

/// Records the scene pass into `recorder`.
///
/// `framebuffer_size` must be the drawable size queried this frame, which can
/// differ from the requested window size on scaled displays. The shadow map
/// stays bound to the scene program for the whole run, so nothing here binds
/// it.
pub fn record_scene_pass(
    recorder: &mut CommandRecorder,
    geometry: GeometryHandle,
    framebuffer_size: (u32, u32),
    clear_color: [f64; 4],
) {
    let (width, height) = framebuffer_size;
    recorder.use_program(ProgramKind::Scene);
    recorder.set_viewport(Viewport::new(width, height));
    recorder.bind_framebuffer(FramebufferTarget::Screen);
    recorder.clear(ClearOps::color_and_depth(clear_color));
    let mut binding = recorder.bind_geometry(geometry);
    binding.draw();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DrawMode, DryRunAllocator, GeometryStore};
    use crate::mesh::Mesh;
    use crate::render::commands::RenderCommand;

    #[test]
    fn follows_scene_pass_protocol() {
        let alloc = DryRunAllocator::new();
        let mut store = GeometryStore::new();
        let geometry = store.upload_indexed(&alloc, &Mesh::cube(), "cube").unwrap();
        let grey = [0.8, 0.8, 0.8, 1.0];

        let mut recorder = CommandRecorder::new();
        record_scene_pass(&mut recorder, geometry, (2048, 1536), grey);
        assert_eq!(
            recorder.commands(),
            &[
                RenderCommand::UseProgram(ProgramKind::Scene),
                RenderCommand::SetViewport(Viewport::new(2048, 1536)),
                RenderCommand::BindFramebuffer(FramebufferTarget::Screen),
                RenderCommand::Clear(ClearOps::color_and_depth(grey)),
                RenderCommand::BindGeometry(geometry),
                RenderCommand::Draw {
                    mode: DrawMode::Indexed,
                    count: 36
                },
                RenderCommand::UnbindGeometry,
            ]
        );
    }
}
