//! Windowed run loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::ViewerConfig;
use crate::driver::{apply_static_uniforms, FrameDriver, FrameSummary};
use crate::error::PlatformInitError;
use crate::input::{InputState, KeyCode};
use crate::mesh::Mesh;
use crate::render::{Renderer, RendererOptions};
use crate::time::FrameClock;

/// Opens the window and renders until it is closed or Escape is pressed.
///
/// Fails with [`PlatformInitError`] when no window can be created, so the
/// caller can fall back to a headless run.
pub fn run_viewer(config: ViewerConfig, mesh: Mesh, options: RendererOptions) -> Result<FrameSummary> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| PlatformInitError::new("event loop", panic_message(panic)))?
        .map_err(|err| PlatformInitError::new("event loop", err))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(config, mesh, options);
    event_loop
        .run_app(&mut viewer)
        .context("event loop terminated with error")?;

    if let Some(err) = viewer.last_error.take() {
        return Err(err);
    }
    Ok(viewer.driver.summary())
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct Viewer {
    options: RendererOptions,
    mesh: Option<Mesh>,
    renderer: Option<Renderer>,
    driver: FrameDriver,
    input: InputState,
    clock: FrameClock,
    close_requested: bool,
    last_error: Option<anyhow::Error>,
}

impl Viewer {
    fn new(config: ViewerConfig, mesh: Mesh, options: RendererOptions) -> Self {
        Self {
            options,
            mesh: Some(mesh),
            renderer: None,
            driver: FrameDriver::new(config),
            input: InputState::new(),
            clock: FrameClock::new(),
            close_requested: false,
            last_error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let config = self.driver.config();
        let attributes = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| PlatformInitError::new("window", err))?,
        );
        grab_cursor(&window);

        let mesh = self.mesh.take().ok_or_else(|| anyhow!("model was already uploaded"))?;
        let mut renderer = pollster::block_on(Renderer::new(window, &mesh, &self.options))
            .context("failed to initialize renderer")?;
        let (scene, _) = renderer.programs_mut();
        apply_static_uniforms(self.driver.config(), scene);
        info!(
            "renderer ready: {:?} draw of {} elements, {}px shadow map",
            renderer.model().mode,
            renderer.model().draw_count,
            renderer.shadow_map_resolution()
        );

        self.renderer = Some(renderer);
        self.clock.reset();
        Ok(())
    }

    fn render_frame(&mut self) -> Result<()> {
        let Some(renderer) = self.renderer.as_mut() else {
            return Ok(());
        };
        renderer.sync_size();
        let size = renderer.framebuffer_size();
        let time = self.clock.tick();
        let input = self.input.camera_input();
        let model = renderer.model();

        let (scene, shadow) = renderer.programs_mut();
        let commands = self.driver.frame(time, &input, model, size, scene, shadow);

        if let Err(err) = renderer.submit(&commands) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = renderer.window().inner_size();
                    renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                wgpu::SurfaceError::Timeout => {
                    info!("surface timeout; retrying next frame");
                }
                wgpu::SurfaceError::Other => {
                    warn!("surface error; skipping frame");
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: PhysicalKey, state: ElementState) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(key) = KeyCode::from_winit(code) else {
            return;
        };
        match state {
            ElementState::Pressed => self.input.set_key_down(key),
            ElementState::Released => self.input.set_key_up(key),
        }
    }
}

fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("could not grab the cursor: {err}");
    }
    window.set_cursor_visible(false);
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if self.renderer.as_ref().map(Renderer::window_id) != Some(id) {
            return;
        }
        match event {
            WindowEvent::CloseRequested => self.close_requested = true,
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(event.physical_key, event.state);
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.render_frame() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.input.add_cursor_delta(dx, dy);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.close_requested || self.input.should_exit() {
            event_loop.exit();
            return;
        }
        if let Some(renderer) = self.renderer.as_ref() {
            renderer.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.take() {
            renderer.shutdown();
        }
    }
}
