//! Depth-only pass rendered from the light.

use crate::geometry::GeometryHandle;

use super::commands::{ClearOps, CommandRecorder, FramebufferTarget, ProgramKind, Viewport};

/// Records the shadow pass into `recorder`.
///
/// The shadow map framebuffer has no colour attachment, so the only effect of
/// this pass is the depth texture later sampled by the scene pass.
pub fn record_shadow_pass(
    recorder: &mut CommandRecorder,
    geometry: GeometryHandle,
    resolution: u32,
) {
    recorder.use_program(ProgramKind::Shadow);
    recorder.set_viewport(Viewport::new(resolution, resolution));
    recorder.bind_framebuffer(FramebufferTarget::ShadowMap);
    recorder.clear(ClearOps::depth_only());
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
    fn follows_depth_pass_protocol() {
        let alloc = DryRunAllocator::new();
        let mut store = GeometryStore::new();
        let geometry = store.upload_indexed(&alloc, &Mesh::cube(), "cube").unwrap();

        let mut recorder = CommandRecorder::new();
        record_shadow_pass(&mut recorder, geometry, 1024);
        assert_eq!(
            recorder.commands(),
            &[
                RenderCommand::UseProgram(ProgramKind::Shadow),
                RenderCommand::SetViewport(Viewport::new(1024, 1024)),
                RenderCommand::BindFramebuffer(FramebufferTarget::ShadowMap),
                RenderCommand::Clear(ClearOps::depth_only()),
                RenderCommand::BindGeometry(geometry),
                RenderCommand::Draw {
                    mode: DrawMode::Indexed,
                    count: 36
                },
                RenderCommand::UnbindGeometry,
            ]
        );
    }

    #[test]
    fn never_clears_color() {
        let alloc = DryRunAllocator::new();
        let mut store = GeometryStore::new();
        let geometry = store.upload_nonindexed(&alloc, &Mesh::cube(), "cube").unwrap();

        let mut recorder = CommandRecorder::new();
        record_shadow_pass(&mut recorder, geometry, 512);
        let passes = recorder.finish().passes();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].clear.color, None);
        assert_eq!(passes[0].draws[0].mode, DrawMode::Arrays);
    }

    #[test]
    fn empty_geometry_records_zero_element_draw() {
        let alloc = DryRunAllocator::new();
        let mut store = GeometryStore::new();
        let mut mesh = Mesh::cube();
        mesh.indices = Some(Vec::new());
        let geometry = store.upload_indexed(&alloc, &mesh, "empty").unwrap();

        let mut recorder = CommandRecorder::new();
        record_shadow_pass(&mut recorder, geometry, 1024);
        let list = recorder.finish();
        let draws: Vec<_> = list.draw_calls().collect();
        assert_eq!(draws, vec![(DrawMode::Indexed, 0)]);
        assert_eq!(list.commands().last(), Some(&RenderCommand::UnbindGeometry));
    }
}
