//! Turns recorded draws into buffer binds and draw calls.

use log::warn;

use crate::geometry::{DrawMode, GeometryStore, NORMAL_SLOT, POSITION_SLOT, UV_SLOT};

use super::commands::PassDraw;

/// The subset of a render pass the draw encoder needs.
pub trait DrawTarget<B> {
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &B);
    fn set_index_buffer(&mut self, buffer: &B);
    fn draw(&mut self, vertex_count: u32);
    fn draw_indexed(&mut self, index_count: u32);
}

impl DrawTarget<wgpu::Buffer> for wgpu::RenderPass<'_> {
    fn set_vertex_buffer(&mut self, slot: u32, buffer: &wgpu::Buffer) {
        wgpu::RenderPass::set_vertex_buffer(self, slot, buffer.slice(..));
    }

    fn set_index_buffer(&mut self, buffer: &wgpu::Buffer) {
        wgpu::RenderPass::set_index_buffer(self, buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    fn draw(&mut self, vertex_count: u32) {
        wgpu::RenderPass::draw(self, 0..vertex_count, 0..1);
    }

    fn draw_indexed(&mut self, index_count: u32) {
        wgpu::RenderPass::draw_indexed(self, 0..index_count, 0, 0..1);
    }
}

/// Encodes every draw of a pass. Zero-element draws bind nothing.
pub fn encode_draws<B, T>(target: &mut T, store: &GeometryStore<B>, draws: &[PassDraw])
where
    T: DrawTarget<B>,
{
    for draw in draws {
        if draw.count == 0 {
            continue;
        }
        let Some(buffers) = store.get(&draw.geometry) else {
            warn!("skipping draw of released geometry {:?}", draw.geometry.id);
            continue;
        };
        target.set_vertex_buffer(POSITION_SLOT, &buffers.positions);
        target.set_vertex_buffer(NORMAL_SLOT, &buffers.normals);
        target.set_vertex_buffer(UV_SLOT, &buffers.uvs);
        match (draw.mode, &buffers.indices) {
            (DrawMode::Indexed, Some(indices)) => {
                target.set_index_buffer(indices);
                target.draw_indexed(draw.count);
            }
            (DrawMode::Indexed, None) => {
                warn!("geometry {:?} has no index buffer", draw.geometry.id);
            }
            (DrawMode::Arrays, _) => target.draw(draw.count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DryRunAllocator, DryRunBuffer};
    use crate::mesh::Mesh;

    #[derive(Debug, PartialEq)]
    enum Call {
        Vertex(u32, String),
        Index(String),
        Draw(u32),
        DrawIndexed(u32),
    }

    #[derive(Default)]
    struct Recording(Vec<Call>);

    impl DrawTarget<DryRunBuffer> for Recording {
        fn set_vertex_buffer(&mut self, slot: u32, buffer: &DryRunBuffer) {
            self.0.push(Call::Vertex(slot, buffer.label.clone()));
        }

        fn set_index_buffer(&mut self, buffer: &DryRunBuffer) {
            self.0.push(Call::Index(buffer.label.clone()));
        }

        fn draw(&mut self, vertex_count: u32) {
            self.0.push(Call::Draw(vertex_count));
        }

        fn draw_indexed(&mut self, index_count: u32) {
            self.0.push(Call::DrawIndexed(index_count));
        }
    }

    fn draw_of(store: &mut GeometryStore<DryRunBuffer>, mesh: &Mesh, indexed: bool) -> PassDraw {
        let alloc = DryRunAllocator::new();
        let geometry = if indexed {
            store.upload_indexed(&alloc, mesh, "m").unwrap()
        } else {
            store.upload_nonindexed(&alloc, mesh, "m").unwrap()
        };
        PassDraw {
            geometry,
            mode: geometry.mode,
            count: geometry.draw_count,
        }
    }

    #[test]
    fn indexed_draw_binds_all_slots() {
        let mut store = GeometryStore::new();
        let draw = draw_of(&mut store, &Mesh::cube(), true);
        let mut target = Recording::default();
        encode_draws(&mut target, &store, &[draw]);
        assert_eq!(
            target.0,
            vec![
                Call::Vertex(0, "m-positions".into()),
                Call::Vertex(1, "m-normals".into()),
                Call::Vertex(2, "m-uvs".into()),
                Call::Index("m-indices".into()),
                Call::DrawIndexed(36),
            ]
        );
    }

    #[test]
    fn array_draw_has_no_index_buffer() {
        let mut store = GeometryStore::new();
        let draw = draw_of(&mut store, &Mesh::cube(), false);
        let mut target = Recording::default();
        encode_draws(&mut target, &store, &[draw]);
        assert_eq!(target.0.last(), Some(&Call::Draw(36)));
        assert!(!target.0.iter().any(|call| matches!(call, Call::Index(_))));
    }

    #[test]
    fn empty_draw_touches_no_buffers() {
        let mut store = GeometryStore::new();
        let mut mesh = Mesh::cube();
        mesh.indices = Some(Vec::new());
        let draw = draw_of(&mut store, &mesh, true);
        assert_eq!(draw.count, 0);
        let mut target = Recording::default();
        encode_draws(&mut target, &store, &[draw]);
        assert!(target.0.is_empty());
    }

    #[test]
    fn released_geometry_is_skipped() {
        let alloc = DryRunAllocator::new();
        let mut store = GeometryStore::new();
        let draw = draw_of(&mut store, &Mesh::cube(), true);
        store.release(&alloc, &draw.geometry);
        let mut target = Recording::default();
        encode_draws(&mut target, &store, &[draw]);
        assert!(target.0.is_empty());
    }
}
