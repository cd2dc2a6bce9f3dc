use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::InvalidMeshError;

/// Static mesh data in the split-attribute layout consumed by the geometry store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<u32>>,
}

impl Mesh {
    /// Checks the attribute lengths and index range.
    pub fn validate(&self) -> Result<(), InvalidMeshError> {
        if self.positions.is_empty() {
            return Err(InvalidMeshError::Empty);
        }
        if self.normals.len() != self.positions.len() || self.uvs.len() != self.positions.len() {
            return Err(InvalidMeshError::LengthMismatch {
                positions: self.positions.len(),
                normals: self.normals.len(),
                uvs: self.uvs.len(),
            });
        }
        if let Some(indices) = &self.indices {
            let vertex_count = self.positions.len();
            if let Some((slot, &index)) = indices
                .iter()
                .enumerate()
                .find(|(_, index)| **index as usize >= vertex_count)
            {
                return Err(InvalidMeshError::IndexOutOfRange {
                    slot,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of vertices the draw call submits: indices when indexed, vertices otherwise.
    pub fn draw_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.positions.len(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.draw_count() / 3
    }

    /// Expands the index list so every triangle corner owns its vertex.
    ///
    /// Meshes without indices are returned unchanged.
    pub fn deindexed(&self) -> Mesh {
        let Some(indices) = &self.indices else {
            return self.clone();
        };
        let pick = |i: &u32| *i as usize;
        Mesh {
            positions: indices.iter().map(|i| self.positions[pick(i)]).collect(),
            normals: indices.iter().map(|i| self.normals[pick(i)]).collect(),
            uvs: indices.iter().map(|i| self.uvs[pick(i)]).collect(),
            indices: None,
        }
    }

    /// Unit cube centred on the origin with per-face normals and UVs.
    pub fn cube() -> Mesh {
        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut uvs = Vec::with_capacity(24);
        for chunk in CUBE_VERTICES.chunks_exact(6) {
            positions.push(Vec3::new(chunk[0], chunk[1], chunk[2]));
            normals.push(Vec3::new(chunk[3], chunk[4], chunk[5]));
        }
        for _face in 0..6 {
            uvs.extend_from_slice(&CUBE_FACE_UVS);
        }
        Mesh {
            positions,
            normals,
            uvs,
            indices: Some(CUBE_INDICES.to_vec()),
        }
    }
}

const CUBE_VERTICES: &[f32] = &[
    // positions        // normals
    -0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5, 0.5, 0.0, 0.0, 1.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0,
    -0.5, 0.5, 0.5, 0.0, 0.0, 1.0, -0.5, -0.5, -0.5, 0.0, 0.0, -1.0, 0.5, -0.5, -0.5, 0.0, 0.0,
    -1.0, 0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, 0.5, -0.5, 0.0, 0.0, -1.0, -0.5, -0.5, -0.5, -1.0,
    0.0, 0.0, -0.5, -0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, 0.5, -1.0, 0.0, 0.0, -0.5, 0.5, -0.5,
    -1.0, 0.0, 0.0, 0.5, -0.5, -0.5, 1.0, 0.0, 0.0, 0.5, -0.5, 0.5, 1.0, 0.0, 0.0, 0.5, 0.5, 0.5,
    1.0, 0.0, 0.0, 0.5, 0.5, -0.5, 1.0, 0.0, 0.0, -0.5, -0.5, -0.5, 0.0, -1.0, 0.0, 0.5, -0.5,
    -0.5, 0.0, -1.0, 0.0, 0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5, -0.5, 0.5, 0.0, -1.0, 0.0, -0.5,
    0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, -0.5, 0.0, 1.0, 0.0, 0.5, 0.5, 0.5, 0.0, 1.0, 0.0, -0.5,
    0.5, 0.5, 0.0, 1.0, 0.0,
];

const CUBE_FACE_UVS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

const CUBE_INDICES: &[u32] = &[
    0, 1, 2, 0, 2, 3, // front
    4, 6, 5, 4, 7, 6, // back
    8, 9, 10, 8, 10, 11, // left
    12, 14, 13, 12, 15, 14, // right
    16, 18, 17, 16, 19, 18, // bottom
    20, 21, 22, 20, 22, 23, // top
];

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            uvs: vec![Vec2::ZERO; 3],
            indices: None,
        }
    }

    #[test]
    fn cube_is_valid() {
        let cube = Mesh::cube();
        assert_eq!(cube.validate(), Ok(()));
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn rejects_empty_positions() {
        assert_eq!(Mesh::default().validate(), Err(InvalidMeshError::Empty));
    }

    #[test]
    fn rejects_mismatched_uvs() {
        let mut mesh = triangle();
        mesh.uvs.pop();
        assert_eq!(
            mesh.validate(),
            Err(InvalidMeshError::LengthMismatch {
                positions: 3,
                normals: 3,
                uvs: 2
            })
        );
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut mesh = triangle();
        mesh.indices = Some(vec![0, 1, 3]);
        assert_eq!(
            mesh.validate(),
            Err(InvalidMeshError::IndexOutOfRange {
                slot: 2,
                index: 3,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn draw_count_follows_indices() {
        let mut mesh = triangle();
        assert_eq!(mesh.draw_count(), 3);
        mesh.indices = Some(vec![0, 1, 2, 2, 1, 0]);
        assert_eq!(mesh.draw_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn deindexing_expands_corners() {
        let flat = Mesh::cube().deindexed();
        assert!(!flat.is_indexed());
        assert_eq!(flat.vertex_count(), 36);
        assert_eq!(flat.positions[3], Mesh::cube().positions[0]);
        assert_eq!(flat.validate(), Ok(()));
    }
}
