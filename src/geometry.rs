//! GPU-resident static geometry.
//!
//! Meshes are validated, split into one buffer per attribute (positions in
//! slot 0, normals in slot 1, UVs in slot 2) and, for indexed meshes, an index
//! buffer. Callers keep a small [`GeometryHandle`]; the buffers stay owned by
//! the [`GeometryStore`] until they are released.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::debug;
use wgpu::util::DeviceExt;

use crate::error::InvalidMeshError;
use crate::mesh::Mesh;

/// Attribute slot of vertex positions (`Float32x3`).
pub const POSITION_SLOT: u32 = 0;
/// Attribute slot of vertex normals (`Float32x3`).
pub const NORMAL_SLOT: u32 = 1;
/// Attribute slot of texture coordinates (`Float32x2`).
pub const UV_SLOT: u32 = 2;

/// How a geometry's draw count is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    /// `draw_count` indices are read from the index buffer.
    Indexed,
    /// `draw_count` vertices are read in order.
    Arrays,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

/// Cheap reference to uploaded geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHandle {
    pub id: GeometryId,
    pub draw_count: u32,
    pub mode: DrawMode,
}

/// What a buffer is going to be bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRole {
    Vertex,
    Index,
}

/// Source of GPU buffers for the geometry store.
pub trait BufferAllocator {
    type Buffer;

    fn allocate(&self, label: &str, contents: &[u8], role: BufferRole) -> Self::Buffer;

    fn free(&self, buffer: Self::Buffer);
}

impl BufferAllocator for wgpu::Device {
    type Buffer = wgpu::Buffer;

    fn allocate(&self, label: &str, contents: &[u8], role: BufferRole) -> wgpu::Buffer {
        let usage = match role {
            BufferRole::Vertex => wgpu::BufferUsages::VERTEX,
            BufferRole::Index => wgpu::BufferUsages::INDEX,
        };
        // Zero-sized buffers cannot be sliced; keep at least one aligned word.
        let padding = [0u8; wgpu::COPY_BUFFER_ALIGNMENT as usize];
        let contents = if contents.is_empty() {
            &padding[..]
        } else {
            contents
        };
        self.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage,
        })
    }

    fn free(&self, buffer: wgpu::Buffer) {
        buffer.destroy();
    }
}

/// Allocator that only records what would have been uploaded.
///
/// Used for headless runs, where the frame driver still needs geometry handles
/// but no device exists.
#[derive(Debug, Default)]
pub struct DryRunAllocator {
    allocations: RefCell<Vec<DryRunBuffer>>,
    freed: Cell<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunBuffer {
    pub label: String,
    pub size: usize,
    pub role: BufferRole,
}

impl DryRunAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocations(&self) -> Vec<DryRunBuffer> {
        self.allocations.borrow().clone()
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocations.borrow().iter().map(|b| b.size).sum()
    }

    pub fn freed(&self) -> usize {
        self.freed.get()
    }
}

impl BufferAllocator for DryRunAllocator {
    type Buffer = DryRunBuffer;

    fn allocate(&self, label: &str, contents: &[u8], role: BufferRole) -> DryRunBuffer {
        let buffer = DryRunBuffer {
            label: label.to_string(),
            size: contents.len(),
            role,
        };
        self.allocations.borrow_mut().push(buffer.clone());
        buffer
    }

    fn free(&self, _buffer: DryRunBuffer) {
        self.freed.set(self.freed.get() + 1);
    }
}

/// Buffers behind one geometry handle.
#[derive(Debug)]
pub struct GeometryBuffers<B> {
    pub positions: B,
    pub normals: B,
    pub uvs: B,
    pub indices: Option<B>,
    pub draw_count: u32,
}

impl<B> GeometryBuffers<B> {
    fn into_buffers(self) -> impl Iterator<Item = B> {
        [Some(self.positions), Some(self.normals), Some(self.uvs), self.indices]
            .into_iter()
            .flatten()
    }
}

/// Owner of every uploaded mesh.
#[derive(Debug)]
pub struct GeometryStore<B> {
    next_id: u64,
    entries: HashMap<GeometryId, GeometryBuffers<B>>,
}

impl<B> Default for GeometryStore<B> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: HashMap::new(),
        }
    }
}

impl<B> GeometryStore<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads positions, normals, UVs and the index list.
    ///
    /// The draw count of the returned handle is the number of indices. A mesh
    /// without indices gets the sequential list `0..vertex_count`.
    pub fn upload_indexed<A>(
        &mut self,
        allocator: &A,
        mesh: &Mesh,
        label: &str,
    ) -> Result<GeometryHandle, InvalidMeshError>
    where
        A: BufferAllocator<Buffer = B>,
    {
        mesh.validate()?;
        let sequential: Vec<u32>;
        let indices = match mesh.indices.as_deref() {
            Some(indices) => indices,
            None => {
                sequential = (0..element_count(mesh.positions.len())?).collect();
                &sequential
            }
        };
        let draw_count = element_count(indices.len())?;
        let mut buffers = upload_attributes(allocator, mesh, label);
        buffers.indices = Some(allocator.allocate(
            &format!("{label}-indices"),
            bytemuck::cast_slice(indices),
            BufferRole::Index,
        ));
        buffers.draw_count = draw_count;
        Ok(self.insert(buffers, DrawMode::Indexed, label))
    }

    /// Uploads positions, normals and UVs without an index buffer.
    ///
    /// Meshes that carry indices are expanded first, so the draw count is the
    /// number of triangle corners.
    pub fn upload_nonindexed<A>(
        &mut self,
        allocator: &A,
        mesh: &Mesh,
        label: &str,
    ) -> Result<GeometryHandle, InvalidMeshError>
    where
        A: BufferAllocator<Buffer = B>,
    {
        mesh.validate()?;
        let expanded;
        let mesh = if mesh.is_indexed() {
            expanded = mesh.deindexed();
            &expanded
        } else {
            mesh
        };
        let draw_count = element_count(mesh.positions.len())?;
        let mut buffers = upload_attributes(allocator, mesh, label);
        buffers.draw_count = draw_count;
        Ok(self.insert(buffers, DrawMode::Arrays, label))
    }

    pub fn get(&self, handle: &GeometryHandle) -> Option<&GeometryBuffers<B>> {
        self.entries.get(&handle.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frees the buffers of one handle. Returns `false` if it was already released.
    pub fn release<A>(&mut self, allocator: &A, handle: &GeometryHandle) -> bool
    where
        A: BufferAllocator<Buffer = B>,
    {
        let Some(buffers) = self.entries.remove(&handle.id) else {
            return false;
        };
        buffers.into_buffers().for_each(|b| allocator.free(b));
        debug!("released geometry {:?}", handle.id);
        true
    }

    pub fn release_all<A>(&mut self, allocator: &A)
    where
        A: BufferAllocator<Buffer = B>,
    {
        let mut entries: Vec<_> = self.entries.drain().collect();
        entries.sort_by_key(|(id, _)| *id);
        for (id, buffers) in entries {
            buffers.into_buffers().for_each(|b| allocator.free(b));
            debug!("released geometry {id:?}");
        }
    }

    fn insert(&mut self, buffers: GeometryBuffers<B>, mode: DrawMode, label: &str) -> GeometryHandle {
        let id = GeometryId(self.next_id);
        self.next_id += 1;
        let handle = GeometryHandle {
            id,
            draw_count: buffers.draw_count,
            mode,
        };
        debug!(
            "uploaded geometry {label} as {id:?}: {:?} draw of {} elements",
            mode, handle.draw_count
        );
        self.entries.insert(id, buffers);
        handle
    }
}

fn element_count(len: usize) -> Result<u32, InvalidMeshError> {
    u32::try_from(len).map_err(|_| InvalidMeshError::TooLarge { count: len })
}

fn upload_attributes<A: BufferAllocator>(
    allocator: &A,
    mesh: &Mesh,
    label: &str,
) -> GeometryBuffers<A::Buffer> {
    GeometryBuffers {
        positions: allocator.allocate(
            &format!("{label}-positions"),
            bytemuck::cast_slice(&mesh.positions),
            BufferRole::Vertex,
        ),
        normals: allocator.allocate(
            &format!("{label}-normals"),
            bytemuck::cast_slice(&mesh.normals),
            BufferRole::Vertex,
        ),
        uvs: allocator.allocate(
            &format!("{label}-uvs"),
            bytemuck::cast_slice(&mesh.uvs),
            BufferRole::Vertex,
        ),
        indices: None,
        draw_count: 0,
    }
}

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![POSITION_SLOT => Float32x3];
const NORMAL_ATTRIBUTES: [wgpu::VertexAttribute; 1] =
    wgpu::vertex_attr_array![NORMAL_SLOT => Float32x3];
const UV_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![UV_SLOT => Float32x2];

/// One tightly packed buffer per attribute, in slot order.
pub fn vertex_buffer_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    let layout = |stride: usize, attributes: &'static [wgpu::VertexAttribute]| {
        wgpu::VertexBufferLayout {
            array_stride: stride as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    };
    [
        layout(3 * std::mem::size_of::<f32>(), &POSITION_ATTRIBUTES),
        layout(3 * std::mem::size_of::<f32>(), &NORMAL_ATTRIBUTES),
        layout(2 * std::mem::size_of::<f32>(), &UV_ATTRIBUTES),
    ]
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec3};

    use super::*;

    fn store() -> (DryRunAllocator, GeometryStore<DryRunBuffer>) {
        (DryRunAllocator::new(), GeometryStore::new())
    }

    #[test]
    fn indexed_upload_allocates_four_buffers() {
        let (alloc, mut store) = store();
        let cube = Mesh::cube();
        let handle = store.upload_indexed(&alloc, &cube, "cube").unwrap();
        assert_eq!(handle.mode, DrawMode::Indexed);
        assert_eq!(handle.draw_count, 36);

        let allocations = alloc.allocations();
        assert_eq!(allocations.len(), 4);
        assert_eq!(allocations[0].label, "cube-positions");
        assert_eq!(allocations[0].size, 24 * 12);
        assert_eq!(allocations[2].size, 24 * 8);
        assert_eq!(allocations[3].role, BufferRole::Index);
        assert_eq!(allocations[3].size, 36 * 4);
    }

    #[test]
    fn nonindexed_upload_counts_vertices() {
        let (alloc, mut store) = store();
        let handle = store
            .upload_nonindexed(&alloc, &Mesh::cube(), "cube")
            .unwrap();
        assert_eq!(handle.mode, DrawMode::Arrays);
        assert_eq!(handle.draw_count, 36);
        assert_eq!(alloc.allocations().len(), 3);
        assert!(store.get(&handle).unwrap().indices.is_none());
    }

    #[test]
    fn invalid_mesh_is_rejected_before_allocation() {
        let (alloc, mut store) = store();
        let mesh = Mesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 2],
            uvs: vec![Vec2::ZERO; 3],
            indices: None,
        };
        assert!(matches!(
            store.upload_indexed(&alloc, &mesh, "bad"),
            Err(InvalidMeshError::LengthMismatch { .. })
        ));
        assert!(matches!(
            store.upload_nonindexed(&alloc, &mesh, "bad"),
            Err(InvalidMeshError::LengthMismatch { .. })
        ));
        assert!(alloc.allocations().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn element_count_refuses_what_u32_cannot_hold() {
        assert_eq!(element_count(36), Ok(36));
        assert_eq!(element_count(u32::MAX as usize), Ok(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(
            element_count(u32::MAX as usize + 1),
            Err(InvalidMeshError::TooLarge {
                count: u32::MAX as usize + 1
            })
        );
    }

    #[test]
    fn empty_index_list_gives_zero_draw_count() {
        let (alloc, mut store) = store();
        let mut mesh = Mesh::cube();
        mesh.indices = Some(Vec::new());
        let handle = store.upload_indexed(&alloc, &mesh, "empty").unwrap();
        assert_eq!(handle.draw_count, 0);
    }

    #[test]
    fn unindexed_mesh_gets_sequential_indices() {
        let (alloc, mut store) = store();
        let flat = Mesh::cube().deindexed();
        let handle = store.upload_indexed(&alloc, &flat, "flat").unwrap();
        assert_eq!(handle.draw_count, 36);
        assert_eq!(alloc.allocations()[3].size, 36 * 4);
    }

    #[test]
    fn release_frees_every_buffer_once() {
        let (alloc, mut store) = store();
        let indexed = store.upload_indexed(&alloc, &Mesh::cube(), "a").unwrap();
        let flat = store.upload_nonindexed(&alloc, &Mesh::cube(), "b").unwrap();
        assert_ne!(indexed.id, flat.id);

        assert!(store.release(&alloc, &indexed));
        assert!(!store.release(&alloc, &indexed));
        assert_eq!(alloc.freed(), 4);

        store.release_all(&alloc);
        assert_eq!(alloc.freed(), 7);
        assert!(store.get(&flat).is_none());
    }

    #[test]
    fn layouts_cover_three_slots() {
        let layouts = vertex_buffer_layouts();
        let slots: Vec<u32> = layouts
            .iter()
            .map(|l| l.attributes[0].shader_location)
            .collect();
        assert_eq!(slots, vec![POSITION_SLOT, NORMAL_SLOT, UV_SLOT]);
        assert_eq!(layouts[2].array_stride, 8);
    }
}
