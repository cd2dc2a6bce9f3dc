pub mod commands;
pub mod depth;
pub mod encode;
pub mod native;
pub mod program;
pub mod scene_pass;
pub mod shadow_pass;
pub mod uniforms;

pub use commands::{CommandList, CommandRecorder, FramebufferTarget, ProgramKind, RenderCommand};
pub use native::{Renderer, RendererOptions};
pub use program::{ProgramSource, ShaderProgram};
pub use uniforms::{UniformBlock, UniformLayout, Uniforms};
