use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::error::ObjError;
use crate::mesh::Mesh;

/// Reads an OBJ file and returns one vertex per triangle corner (no index list).
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh, ObjError> {
    let data = read(path.as_ref())?;
    load_mesh_from_str(&data)
}

/// Reads an OBJ file and returns deduplicated vertices plus a triangle index list.
pub fn load_mesh_indexed(path: impl AsRef<Path>) -> Result<Mesh, ObjError> {
    let data = read(path.as_ref())?;
    load_mesh_indexed_from_str(&data)
}

pub fn load_mesh_from_str(data: &str) -> Result<Mesh, ObjError> {
    Ok(load_mesh_indexed_from_str(data)?.deindexed())
}

/// Parses an OBJ file from memory.
///
/// Polygons are fan-triangulated. Vertices are keyed by their
/// `position/uv/normal` triple, so corners that share all three share an
/// index. Missing UVs become zero and missing normals are rebuilt from the
/// face geometry.
pub fn load_mesh_indexed_from_str(data: &str) -> Result<Mesh, ObjError> {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut faces: Vec<[FaceIndex; 3]> = Vec::new();

    for (line_no, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let Some(tag) = parts.next() else {
            continue;
        };
        let parse_error = |message: String| ObjError::Parse {
            line: line_no + 1,
            message,
        };
        match tag {
            "v" => positions.push(
                parse_vec3(parts).map_err(|err| parse_error(format!("invalid vertex: {err}")))?,
            ),
            "vn" => normals.push(
                parse_vec3(parts).map_err(|err| parse_error(format!("invalid normal: {err}")))?,
            ),
            "vt" => uvs.push(
                parse_vec2(parts)
                    .map_err(|err| parse_error(format!("invalid texture coordinate: {err}")))?,
            ),
            "f" => {
                let polygon =
                    parse_face(parts).map_err(|err| parse_error(format!("invalid face: {err}")))?;
                triangulate_face(&polygon, &mut faces);
            }
            _ => {}
        }
    }

    if positions.is_empty() {
        return Err(ObjError::NoVertices);
    }

    let (mut mesh, complete_normals) = build_mesh(&positions, &normals, &uvs, &faces)?;
    if !complete_normals {
        compute_normals(&mut mesh);
    }
    Ok(mesh)
}

fn read(path: &Path) -> Result<String, ObjError> {
    fs::read_to_string(path).map_err(|source| ObjError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn next_f32<'a>(parts: &mut impl Iterator<Item = &'a str>) -> Result<f32, String> {
    let raw = parts.next().ok_or("missing vector component")?;
    raw.parse::<f32>().map_err(|err| format!("{raw:?}: {err}"))
}

fn parse_vec3<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec3, String> {
    let x = next_f32(&mut parts)?;
    let y = next_f32(&mut parts)?;
    let z = next_f32(&mut parts)?;
    Ok(Vec3::new(x, y, z))
}

fn parse_vec2<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<Vec2, String> {
    let u = next_f32(&mut parts)?;
    let v = next_f32(&mut parts)?;
    Ok(Vec2::new(u, v))
}

fn parse_face<'a>(parts: impl Iterator<Item = &'a str>) -> Result<Vec<FaceIndex>, String> {
    let mut indices = Vec::new();
    for part in parts {
        let mut segments = part.split('/');
        let v = segments
            .next()
            .ok_or("missing vertex index")?
            .parse::<i64>()
            .map_err(|err| format!("{part:?}: {err}"))?;
        let vt = optional_index(segments.next());
        let vn = optional_index(segments.next());
        indices.push(FaceIndex { v, vt, vn });
    }
    if indices.len() < 3 {
        return Err("faces must reference at least 3 vertices".into());
    }
    Ok(indices)
}

fn optional_index(segment: Option<&str>) -> i64 {
    segment
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(0)
}

fn triangulate_face(polygon: &[FaceIndex], faces: &mut Vec<[FaceIndex; 3]>) {
    for i in 1..(polygon.len() - 1) {
        faces.push([polygon[0], polygon[i], polygon[i + 1]]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Key {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FaceIndex {
    v: i64,
    vt: i64,
    vn: i64,
}

fn build_mesh(
    positions: &[Vec3],
    normals: &[Vec3],
    uvs: &[Vec2],
    faces: &[[FaceIndex; 3]],
) -> Result<(Mesh, bool), ObjError> {
    let mut lookup: HashMap<Key, u32> = HashMap::new();
    let mut mesh = Mesh::default();
    let mut indices = Vec::with_capacity(faces.len() * 3);
    let mut complete_normals = true;

    for face in faces {
        for idx in face {
            let position = fix_index(idx.v, positions.len()).ok_or(ObjError::BadIndex {
                element: "vertex",
                index: idx.v,
                count: positions.len(),
            })?;
            let key = Key {
                position,
                uv: attribute_index("texture coordinate", idx.vt, uvs.len())?,
                normal: attribute_index("normal", idx.vn, normals.len())?,
            };
            complete_normals &= key.normal.is_some();
            let next_index = mesh.positions.len() as u32;
            let entry = lookup.entry(key).or_insert_with(|| {
                mesh.positions.push(positions[key.position]);
                mesh.uvs.push(key.uv.map(|i| uvs[i]).unwrap_or(Vec2::ZERO));
                mesh.normals
                    .push(key.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO));
                next_index
            });
            indices.push(*entry);
        }
    }

    mesh.indices = Some(indices);
    Ok((mesh, complete_normals))
}

/// Resolves an optional `vt`/`vn` reference; 0 means the face left it out.
fn attribute_index(
    element: &'static str,
    index: i64,
    len: usize,
) -> Result<Option<usize>, ObjError> {
    if index == 0 {
        return Ok(None);
    }
    fix_index(index, len).map(Some).ok_or(ObjError::BadIndex {
        element,
        index,
        count: len,
    })
}

fn fix_index(index: i64, len: usize) -> Option<usize> {
    if index > 0 {
        let zero_based = index as usize - 1;
        (zero_based < len).then_some(zero_based)
    } else if index < 0 {
        let abs = index.unsigned_abs() as usize;
        (abs <= len).then_some(len - abs)
    } else {
        None
    }
}

fn compute_normals(mesh: &mut Mesh) {
    let mut accum = vec![Vec3::ZERO; mesh.positions.len()];
    let Some(indices) = &mesh.indices else {
        return;
    };

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let p0 = mesh.positions[i0];
        let normal = (mesh.positions[i1] - p0).cross(mesh.positions[i2] - p0);
        if normal.length_squared() > f32::EPSILON {
            let normal = normal.normalize();
            accum[i0] += normal;
            accum[i1] += normal;
            accum[i2] += normal;
        }
    }

    for (slot, normal) in mesh.normals.iter_mut().zip(accum) {
        if *slot == Vec3::ZERO {
            *slot = normal.normalize_or_zero();
        }
    }
}
