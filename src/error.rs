use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a mesh is refused before any buffer is allocated for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMeshError {
    #[error("mesh has no vertex positions")]
    Empty,
    #[error(
        "mesh attribute lengths differ: {positions} positions, {normals} normals, {uvs} uvs"
    )]
    LengthMismatch {
        positions: usize,
        normals: usize,
        uvs: usize,
    },
    #[error("mesh needs {count} draw elements, more than one draw call can address")]
    TooLarge { count: usize },
    #[error("index {index} at slot {slot} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        slot: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Failure to read or parse a Wavefront OBJ model.
#[derive(Debug, Error)]
pub enum ObjError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("OBJ file does not define any vertices")]
    NoVertices,
    #[error("face references {element} {index} but only {count} are defined")]
    BadIndex {
        element: &'static str,
        index: i64,
        count: usize,
    },
}

/// Failure to produce a shader program from its two WGSL sources.
#[derive(Debug, Error)]
pub enum ShaderCompileError {
    #[error("failed to read shader source {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to build the {program} program:\n{log}")]
    Compile { program: String, log: String },
}

/// Window or event loop creation failed.
#[derive(Debug, Error)]
#[error("failed to initialize {stage}: {message}")]
pub struct PlatformInitError {
    pub stage: &'static str,
    pub message: String,
}

impl PlatformInitError {
    pub fn new(stage: &'static str, err: impl std::fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

/// The GPU binding layer could not be brought up for the window.
#[derive(Debug, Error)]
pub enum GraphicsInitError {
    #[error("window has zero area")]
    ZeroSizedWindow,
    #[error("failed to create rendering surface")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to acquire GPU adapter")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
    #[error(transparent)]
    Shader(#[from] ShaderCompileError),
    #[error(transparent)]
    Mesh(#[from] InvalidMeshError),
}
