//! Shadow mapping viewer.
//!
//! A spinning model under a moving spot light is drawn twice per frame:
//! first from the light into a depth texture, then from a free-flying camera
//! into the window, where the depth texture decides what lies in shadow.
//! Frame state, pass recording and uniform layouts are plain data so they can
//! be driven and checked without a GPU; [`render::Renderer`] turns the recorded
//! passes into wgpu submissions.

pub mod app;
pub mod config;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod mesh;
pub mod obj;
pub mod render;
pub mod state;
pub mod time;

pub use app::run_viewer;
pub use config::ViewerConfig;
pub use driver::{apply_static_uniforms, FrameDriver, FrameSummary, FrameUniforms};
pub use error::{
    GraphicsInitError, InvalidMeshError, ObjError, PlatformInitError, ShaderCompileError,
};
pub use geometry::{
    BufferAllocator, DrawMode, DryRunAllocator, GeometryHandle, GeometryStore,
};
pub use input::{InputState, KeyCode, NamedKey};
pub use logging::init_logging;
pub use mesh::Mesh;
pub use obj::{load_mesh, load_mesh_from_str, load_mesh_indexed, load_mesh_indexed_from_str};
pub use render::{
    CommandList, ProgramKind, ProgramSource, Renderer, RendererOptions, UniformBlock, Uniforms,
};
pub use state::{Camera, CameraInput, LightState, ModelAnimation};
pub use time::{FrameClock, FrameTime};
