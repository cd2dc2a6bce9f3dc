use std::sync::Arc;

use log::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::window::{Window, WindowId};

use crate::error::GraphicsInitError;
use crate::geometry::{GeometryHandle, GeometryStore};
use crate::mesh::Mesh;

use super::commands::{CommandList, FramebufferTarget, PassSegment, ProgramKind, Viewport};
use super::depth::{DepthBuffer, DepthTarget};
use super::encode::encode_draws;
use super::program::{ProgramSource, ShaderProgram};

/// Start-up options for [`Renderer::new`].
#[derive(Debug, Clone)]
pub struct RendererOptions {
    pub shadow_map_size: u32,
    /// Upload the model with an index buffer.
    pub indexed: bool,
    pub scene_source: ProgramSource,
    pub shadow_source: ProgramSource,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            shadow_map_size: 1024,
            indexed: true,
            scene_source: ProgramSource::builtin_scene(),
            shadow_source: ProgramSource::builtin_shadow(),
        }
    }
}

/// wgpu renderer owning every GPU resource of the viewer.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    depth: DepthBuffer,
    shadow_map: DepthTarget,
    scene: ShaderProgram,
    shadow: ShaderProgram,
    geometry: GeometryStore<wgpu::Buffer>,
    model: GeometryHandle,
}

impl Renderer {
    /// Creates the device, both programs and the shadow map, and uploads `mesh`.
    pub async fn new(
        window: Arc<Window>,
        mesh: &Mesh,
        options: &RendererOptions,
    ) -> Result<Self, GraphicsInitError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(GraphicsInitError::ZeroSizedWindow);
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: Default::default(),
            backend_options: Default::default(),
        });
        let surface = instance.create_surface(Arc::clone(&window))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        info!("using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("shadow-lab-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: Default::default(),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|format| format.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GraphicsInitError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, config.width, config.height);
        let shadow_map = DepthTarget::new(&device, options.shadow_map_size);
        let shadow = ShaderProgram::compile_shadow(&device, &options.shadow_source)?;
        let scene =
            ShaderProgram::compile_scene(&device, &options.scene_source, surface_format, &shadow_map)?;

        let mut geometry = GeometryStore::new();
        let model = if options.indexed {
            geometry.upload_indexed(&device, mesh, "model")?
        } else {
            geometry.upload_nonindexed(&device, mesh, "model")?
        };

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            size,
            depth,
            shadow_map,
            scene,
            shadow,
            geometry,
            model,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window.id()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Handle of the uploaded model.
    pub fn model(&self) -> GeometryHandle {
        self.model
    }

    pub fn shadow_map_resolution(&self) -> u32 {
        self.shadow_map.resolution()
    }

    /// Drawable size of the window, queried from the platform.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    /// The scene and shadow programs, in that order.
    pub fn programs_mut(&mut self) -> (&mut ShaderProgram, &mut ShaderProgram) {
        (&mut self.scene, &mut self.shadow)
    }

    /// Resizes the swap chain to match the new dimensions.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, new_size.width, new_size.height);
        debug!("resized surface to {}x{}", new_size.width, new_size.height);
    }

    /// Reconfigures the surface if the window changed size since the last frame.
    pub fn sync_size(&mut self) {
        let size = self.window.inner_size();
        if size != self.size {
            self.resize(size);
        }
    }

    /// Commits uniforms, encodes every recorded pass and presents.
    pub fn submit(&mut self, commands: &CommandList) -> Result<(), wgpu::SurfaceError> {
        self.shadow.flush(&self.queue);
        self.scene.flush(&self.queue);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame-encoder"),
            });

        for segment in commands.passes() {
            let program = match program_for(&segment) {
                Some(ProgramKind::Shadow) => &self.shadow,
                Some(ProgramKind::Scene) => &self.scene,
                None => {
                    warn!(
                        "skipping pass: {:?} cannot render into {:?}",
                        segment.program, segment.target
                    );
                    continue;
                }
            };
            let extent = match segment.target {
                FramebufferTarget::ShadowMap => {
                    (self.shadow_map.resolution(), self.shadow_map.resolution())
                }
                FramebufferTarget::Screen => (self.config.width, self.config.height),
            };

            let colors = match segment.target {
                FramebufferTarget::ShadowMap => Vec::new(),
                FramebufferTarget::Screen => vec![Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: segment
                            .clear
                            .color
                            .map(|[r, g, b, a]| wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }))
                            .unwrap_or(wgpu::LoadOp::Load),
                        store: wgpu::StoreOp::Store,
                    },
                })],
            };
            let depth_view = match segment.target {
                FramebufferTarget::ShadowMap => self.shadow_map.view(),
                FramebufferTarget::Screen => self.depth.view(),
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(pass_label(&segment)),
                color_attachments: &colors,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: segment
                            .clear
                            .depth
                            .map(wgpu::LoadOp::Clear)
                            .unwrap_or(wgpu::LoadOp::Load),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            program.bind(&mut pass);
            if let Some(viewport) = segment.viewport.and_then(|vp| clamp_viewport(vp, extent)) {
                pass.set_viewport(
                    viewport.x as f32,
                    viewport.y as f32,
                    viewport.width as f32,
                    viewport.height as f32,
                    0.0,
                    1.0,
                );
            }
            encode_draws(&mut pass, &self.geometry, &segment.draws);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Releases geometry and GPU textures. The renderer is consumed.
    pub fn shutdown(mut self) {
        self.geometry.release_all(&self.device);
        self.scene.destroy();
        self.shadow.destroy();
        self.shadow_map.destroy();
        info!("renderer shut down");
    }
}

/// The program a segment renders with, if it fits the segment's target.
fn program_for(segment: &PassSegment) -> Option<ProgramKind> {
    match (segment.target, segment.program) {
        (FramebufferTarget::ShadowMap, Some(ProgramKind::Shadow)) => Some(ProgramKind::Shadow),
        (FramebufferTarget::Screen, Some(ProgramKind::Scene)) => Some(ProgramKind::Scene),
        _ => None,
    }
}

fn pass_label(segment: &PassSegment) -> &'static str {
    match segment.target {
        FramebufferTarget::ShadowMap => "shadow-pass",
        FramebufferTarget::Screen => "scene-pass",
    }
}

/// Fits a viewport inside the attachment; `None` if nothing is left.
fn clamp_viewport(viewport: Viewport, extent: (u32, u32)) -> Option<Viewport> {
    let (width, height) = extent;
    if viewport.x >= width || viewport.y >= height {
        return None;
    }
    let clamped = Viewport {
        x: viewport.x,
        y: viewport.y,
        width: viewport.width.min(width - viewport.x),
        height: viewport.height.min(height - viewport.y),
    };
    (clamped.width > 0 && clamped.height > 0).then_some(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::driver::FrameDriver;
    use crate::geometry::DryRunAllocator;
    use crate::render::commands::ClearOps;
    use crate::render::program::{scene_uniform_layout, shadow_uniform_layout};
    use crate::render::uniforms::UniformBlock;
    use crate::state::CameraInput;
    use crate::time::FrameTime;

    #[test]
    fn every_recorded_pass_has_a_matching_program() {
        let alloc = DryRunAllocator::new();
        let mut store = GeometryStore::new();
        let geometry = store.upload_indexed(&alloc, &Mesh::cube(), "cube").unwrap();
        let mut driver = FrameDriver::new(ViewerConfig::default());
        let mut scene = UniformBlock::new(scene_uniform_layout());
        let mut shadow = UniformBlock::new(shadow_uniform_layout());

        for index in 0..3 {
            let commands = driver.frame(
                FrameTime::fixed(index, 1.0 / 60.0),
                &CameraInput::default(),
                geometry,
                (1280, 720),
                &mut scene,
                &mut shadow,
            );
            let programs: Vec<_> = commands.passes().iter().map(program_for).collect();
            assert_eq!(
                programs,
                vec![Some(ProgramKind::Shadow), Some(ProgramKind::Scene)]
            );
        }
    }

    #[test]
    fn mismatched_program_is_rejected() {
        let segment = PassSegment {
            target: FramebufferTarget::ShadowMap,
            program: Some(ProgramKind::Scene),
            viewport: None,
            clear: ClearOps::depth_only(),
            draws: Vec::new(),
        };
        assert_eq!(program_for(&segment), None);
        let segment = PassSegment {
            target: FramebufferTarget::Screen,
            program: None,
            ..segment
        };
        assert_eq!(program_for(&segment), None);
    }

    #[test]
    fn viewport_is_clamped_to_attachment() {
        let clamped = clamp_viewport(Viewport::new(2048, 1536), (1024, 768));
        assert_eq!(clamped, Some(Viewport::new(1024, 768)));
    }

    #[test]
    fn viewport_inside_attachment_is_kept() {
        let viewport = Viewport::new(1024, 1024);
        assert_eq!(clamp_viewport(viewport, (1024, 1024)), Some(viewport));
    }

    #[test]
    fn empty_viewport_is_dropped() {
        assert_eq!(clamp_viewport(Viewport::new(0, 10), (64, 64)), None);
        let outside = Viewport {
            x: 64,
            y: 0,
            width: 8,
            height: 8,
        };
        assert_eq!(clamp_viewport(outside, (64, 64)), None);
    }
}
