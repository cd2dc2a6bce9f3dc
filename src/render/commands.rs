//! Ordered render commands for one frame.
//!
//! Passes are recorded as a flat list of bind/clear/draw steps and only then
//! encoded for the GPU, so the protocol of each pass can be checked without a
//! device.

use crate::geometry::{DrawMode, GeometryHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    /// Depth-only program rendering from the light.
    Shadow,
    /// Lit program rendering from the camera.
    Scene,
}

/// Where a pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferTarget {
    /// Off-screen framebuffer whose only attachment is the shadow depth texture.
    ShadowMap,
    /// The window surface plus its depth buffer.
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Buffers to clear when a framebuffer is bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearOps {
    pub color: Option<[f64; 4]>,
    pub depth: Option<f32>,
}

impl ClearOps {
    pub fn depth_only() -> Self {
        Self {
            color: None,
            depth: Some(1.0),
        }
    }

    pub fn color_and_depth(color: [f64; 4]) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderCommand {
    UseProgram(ProgramKind),
    SetViewport(Viewport),
    BindFramebuffer(FramebufferTarget),
    Clear(ClearOps),
    BindGeometry(GeometryHandle),
    Draw { mode: DrawMode, count: u32 },
    UnbindGeometry,
}

#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<RenderCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn use_program(&mut self, program: ProgramKind) {
        self.commands.push(RenderCommand::UseProgram(program));
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(RenderCommand::SetViewport(viewport));
    }

    pub fn bind_framebuffer(&mut self, target: FramebufferTarget) {
        self.commands.push(RenderCommand::BindFramebuffer(target));
    }

    pub fn clear(&mut self, ops: ClearOps) {
        self.commands.push(RenderCommand::Clear(ops));
    }

    /// Binds geometry until the returned guard is dropped.
    pub fn bind_geometry(&mut self, geometry: GeometryHandle) -> GeometryBinding<'_> {
        self.commands.push(RenderCommand::BindGeometry(geometry));
        GeometryBinding {
            recorder: self,
            geometry,
        }
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn finish(self) -> CommandList {
        CommandList {
            commands: self.commands,
        }
    }
}

/// Scoped geometry binding; records the unbind when dropped.
pub struct GeometryBinding<'a> {
    recorder: &'a mut CommandRecorder,
    geometry: GeometryHandle,
}

impl GeometryBinding<'_> {
    /// Draws the whole geometry.
    pub fn draw(&mut self) {
        self.recorder.commands.push(RenderCommand::Draw {
            mode: self.geometry.mode,
            count: self.geometry.draw_count,
        });
    }
}

impl Drop for GeometryBinding<'_> {
    fn drop(&mut self) {
        self.recorder.commands.push(RenderCommand::UnbindGeometry);
    }
}

/// A finished frame, ready to be encoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandList {
    commands: Vec<RenderCommand>,
}

/// One draw inside a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassDraw {
    pub geometry: GeometryHandle,
    pub mode: DrawMode,
    pub count: u32,
}

/// Everything recorded between two framebuffer binds.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSegment {
    pub target: FramebufferTarget,
    pub program: Option<ProgramKind>,
    pub viewport: Option<Viewport>,
    pub clear: ClearOps,
    pub draws: Vec<PassDraw>,
}

impl CommandList {
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn draw_calls(&self) -> impl Iterator<Item = (DrawMode, u32)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            RenderCommand::Draw { mode, count } => Some((*mode, *count)),
            _ => None,
        })
    }

    /// Groups the commands into GPU passes.
    ///
    /// A pass starts with the program and viewport current at its framebuffer
    /// bind and takes whatever is current at each of its draws. Commands
    /// issued after the last draw belong to the next pass. Draws outside any
    /// bound framebuffer or geometry are dropped.
    pub fn passes(&self) -> Vec<PassSegment> {
        let mut passes: Vec<PassSegment> = Vec::new();
        let mut program = None;
        let mut viewport = None;
        let mut geometry = None;

        for command in &self.commands {
            match *command {
                RenderCommand::UseProgram(kind) => program = Some(kind),
                RenderCommand::SetViewport(vp) => viewport = Some(vp),
                RenderCommand::BindFramebuffer(target) => passes.push(PassSegment {
                    target,
                    program,
                    viewport,
                    clear: ClearOps {
                        color: None,
                        depth: None,
                    },
                    draws: Vec::new(),
                }),
                RenderCommand::Clear(ops) => {
                    if let Some(pass) = passes.last_mut() {
                        pass.clear.color = ops.color.or(pass.clear.color);
                        pass.clear.depth = ops.depth.or(pass.clear.depth);
                    }
                }
                RenderCommand::BindGeometry(handle) => geometry = Some(handle),
                RenderCommand::UnbindGeometry => geometry = None,
                RenderCommand::Draw { mode, count } => {
                    if let (Some(pass), Some(geometry)) = (passes.last_mut(), geometry) {
                        pass.program = program;
                        pass.viewport = viewport;
                        pass.draws.push(PassDraw {
                            geometry,
                            mode,
                            count,
                        });
                    }
                }
            }
        }
        passes
    }
}
