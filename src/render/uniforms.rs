//! Named uniform storage.
//!
//! A [`UniformLayout`] mirrors a WGSL `var<uniform>` struct: fields are
//! declared in struct order and placed at the offsets the uniform address
//! space requires. A [`UniformBlock`] is the CPU-side copy of that struct that
//! the typed setters write into.

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use log::trace;

/// Uniform names shared by the WGSL sources and the frame driver.
pub mod names {
    pub const PROJECTION_MATRIX: &str = "projection_matrix";
    pub const VIEW_MATRIX: &str = "view_matrix";
    pub const MODEL_MATRIX: &str = "model_matrix";
    pub const LIGHT_VIEW_PROJ_MATRIX: &str = "light_view_proj_matrix";
    pub const LIGHT_POSITION: &str = "light_position";
    pub const LIGHT_DIRECTION: &str = "light_direction";
    pub const LIGHT_COLOR: &str = "light_color";
    pub const LIGHT_CUTOFF_INNER: &str = "light_cutoff_inner";
    pub const LIGHT_CUTOFF_OUTER: &str = "light_cutoff_outer";
    pub const LIGHT_NEAR_PLANE: &str = "light_near_plane";
    pub const LIGHT_FAR_PLANE: &str = "light_far_plane";
    pub const OBJECT_COLOR: &str = "object_color";
    pub const VIEW_POSITION: &str = "view_position";
    pub const SHADOWS_ENABLED: &str = "shadows_enabled";
}

/// Closed set of typed uniform setters.
///
/// Setting a name the program does not declare is a silent no-op.
pub trait Uniforms {
    fn set_mat4(&mut self, name: &str, value: Mat4);
    fn set_vec3(&mut self, name: &str, value: Vec3);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_int(&mut self, name: &str, value: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Mat4,
    Vec3,
    Float,
    Int,
}

impl UniformKind {
    fn align(self) -> usize {
        match self {
            UniformKind::Mat4 | UniformKind::Vec3 => 16,
            UniformKind::Float | UniformKind::Int => 4,
        }
    }

    fn size(self) -> usize {
        match self {
            UniformKind::Mat4 => 64,
            UniformKind::Vec3 => 12,
            UniformKind::Float | UniformKind::Int => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    pub offset: usize,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    slots: HashMap<String, UniformSlot>,
    cursor: usize,
}

impl UniformLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, aligning it like WGSL does.
    pub fn field(mut self, name: &str, kind: UniformKind) -> Self {
        let offset = align_up(self.cursor, kind.align());
        self.cursor = offset + kind.size();
        self.slots
            .insert(name.to_string(), UniformSlot { offset, kind });
        self
    }

    pub fn mat4(self, name: &str) -> Self {
        self.field(name, UniformKind::Mat4)
    }

    pub fn vec3(self, name: &str) -> Self {
        self.field(name, UniformKind::Vec3)
    }

    pub fn float(self, name: &str) -> Self {
        self.field(name, UniformKind::Float)
    }

    pub fn int(self, name: &str) -> Self {
        self.field(name, UniformKind::Int)
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    /// Size of the struct, rounded to its 16 byte alignment.
    pub fn size(&self) -> usize {
        align_up(self.cursor.max(16), 16)
    }
}

fn align_up(value: usize, align: usize) -> usize {
    value.div_ceil(align) * align
}

/// CPU-side copy of one program's uniform struct.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    data: Vec<u8>,
    dirty: bool,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let data = vec![0; layout.size()];
        Self {
            layout,
            data,
            dirty: true,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the bytes if they changed since the last call.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(&self.data)
    }

    pub fn read_mat4(&self, name: &str) -> Option<Mat4> {
        let cols: [f32; 16] = bytemuck::pod_read_unaligned(self.read(name, UniformKind::Mat4)?);
        Some(Mat4::from_cols_array(&cols))
    }

    pub fn read_vec3(&self, name: &str) -> Option<Vec3> {
        let xyz: [f32; 3] = bytemuck::pod_read_unaligned(self.read(name, UniformKind::Vec3)?);
        Some(Vec3::from_array(xyz))
    }

    pub fn read_float(&self, name: &str) -> Option<f32> {
        let bytes = self.read(name, UniformKind::Float)?;
        Some(f32::from_ne_bytes(bytes.try_into().ok()?))
    }

    pub fn read_int(&self, name: &str) -> Option<i32> {
        let bytes = self.read(name, UniformKind::Int)?;
        Some(i32::from_ne_bytes(bytes.try_into().ok()?))
    }

    fn read(&self, name: &str, kind: UniformKind) -> Option<&[u8]> {
        let slot = self.layout.slot(name).filter(|slot| slot.kind == kind)?;
        Some(&self.data[slot.offset..slot.offset + kind.size()])
    }

    fn write(&mut self, name: &str, kind: UniformKind, bytes: &[u8]) {
        match self.layout.slot(name) {
            Some(slot) if slot.kind == kind => {
                self.data[slot.offset..slot.offset + bytes.len()].copy_from_slice(bytes);
                self.dirty = true;
            }
            Some(slot) => trace!(
                "uniform {name} is declared as {:?}, ignoring {kind:?} value",
                slot.kind
            ),
            None => trace!("uniform {name} is not declared, ignoring"),
        }
    }
}

impl Uniforms for UniformBlock {
    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.write(name, UniformKind::Mat4, bytemuck::bytes_of(&value.to_cols_array()));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformKind::Vec3, bytemuck::bytes_of(&value.to_array()));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformKind::Float, &value.to_ne_bytes());
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.write(name, UniformKind::Int, &value.to_ne_bytes());
    }
}
