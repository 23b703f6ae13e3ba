//! Platform layer: decode the asset, open a window, drive the renderer (winit 0.30).
//!
//! Decoding finishes before the event loop starts. Upload happens once the GPU
//! device exists; after that each redraw drains queued input and draws.

pub mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use asset::{AssetModel, PrimitiveData};
use corelib::camera::Camera;
use corelib::orbit::{DEFAULT_SENSITIVITY, InputEvent};
use renderer::{FrameDriver, GpuState, RunState, TextureId, WgpuResources, upload_scene};
use wgpu::SurfaceError;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

use crate::input::{FpsCounter, InputTranslator};

/// Everything the viewer needs from the command line.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub model_path: PathBuf,
    pub backends: wgpu::Backends,
    pub show_fps: bool,
    pub width: u32,
    pub height: u32,
    pub texture: bool,
    pub rotation: bool,
    pub sensitivity: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/model.glb"),
            backends: wgpu::Backends::all(),
            show_fps: false,
            width: 1280,
            height: 720,
            texture: true,
            rotation: true,
            sensitivity: DEFAULT_SENSITIVITY,
        }
    }
}

/// Decoded asset plus its drawable primitives.
pub struct Scene {
    pub model: AssetModel,
    pub primitives: Vec<PrimitiveData>,
}

pub fn load_scene(path: &Path) -> Result<Scene> {
    let model = asset::container::load_from_path(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let primitives = asset::assemble_model(&model)
        .with_context(|| format!("no drawable geometry in {}", path.display()))?;
    log::info!(
        "Assembled {} of {} primitives ({} vertices)",
        primitives.len(),
        model.primitive_count(),
        primitives.iter().map(|p| p.vertices.len()).sum::<usize>()
    );
    Ok(Scene { model, primitives })
}

/// Decode `config.model_path`, then open a window and render until quit.
pub fn run(config: ViewerConfig) -> Result<()> {
    let scene = load_scene(&config.model_path)?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(config, scene);
    event_loop
        .run_app(&mut viewer)
        .map_err(|e| anyhow::anyhow!("Event loop error: {e:?}"))?;

    match viewer.fatal.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Window-bound state, created on first resume.
struct Session {
    window: Arc<Window>,
    gpu: GpuState,
    resources: WgpuResources,
    texture: Option<TextureId>,
}

struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    session: Option<Session>,
    driver: FrameDriver,
    pending: Vec<InputEvent>,
    input: InputTranslator,
    fps: FpsCounter,
    fatal: Option<anyhow::Error>,
}

impl Viewer {
    fn new(config: ViewerConfig, scene: Scene) -> Self {
        let driver = FrameDriver::new(config.sensitivity, config.rotation);
        Self {
            config,
            scene,
            session: None,
            driver,
            pending: Vec::new(),
            input: InputTranslator::default(),
            fps: FpsCounter::new(Instant::now()),
            fatal: None,
        }
    }

    fn start_session(&self, event_loop: &ActiveEventLoop) -> Result<Session> {
        let attrs = Window::default_attributes()
            .with_title("GLB Viewer")
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(event_loop.create_window(attrs).context("Failed to create window")?);
        log::info!(
            "Window created: {}x{}",
            window.inner_size().width,
            window.inner_size().height
        );

        let gpu = pollster::block_on(GpuState::new(window.clone(), self.config.backends))?;

        let mut resources = WgpuResources::new();
        let mut device = gpu.uploader();
        let texture = match upload_scene(
            &mut resources,
            &mut device,
            &self.scene.model,
            &self.scene.primitives,
            self.config.texture,
        ) {
            Ok(texture) => texture,
            Err(err) => {
                resources.release(&mut device);
                return Err(err).context("GPU upload failed");
            }
        };
        drop(device);

        Ok(Session {
            window,
            gpu,
            resources,
            texture,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        if self.fatal.is_none() {
            self.fatal = Some(err);
        }
        event_loop.exit();
    }

    /// One frame: drain input, then draw unless a quit arrived.
    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.driver.drain(self.pending.drain(..)) == RunState::Terminated {
            event_loop.exit();
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let camera = Camera::viewer(session.gpu.aspect());
        let Some(frame) = self.driver.prepare(&session.resources, session.texture, &camera) else {
            return;
        };
        match session.gpu.render(&frame, &session.resources) {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => session.gpu.recreate_surface(),
            Err(SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow::anyhow!("GPU out of memory while rendering"));
                return;
            }
            Err(err) => log::warn!("Skipped frame: {err:?}"),
        }

        if self.config.show_fps {
            if let Some(fps) = self.fps.tick(Instant::now()) {
                log::info!("FPS: {fps:.1}");
            }
        }
    }

    fn release(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.resources.release(&mut session.gpu.uploader());
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() || self.fatal.is_some() {
            return;
        }
        match self.start_session(event_loop) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.pending.push(InputEvent::Quit);
                self.frame(event_loop);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(quit) = self.input.key(code, event.state) {
                        self.pending.push(quit);
                        self.frame(event_loop);
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let ev = self.input.cursor_moved(position.x, position.y);
                self.pending.push(ev);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(ev) = self.input.mouse_button(state, button) {
                    self.pending.push(ev);
                }
            }
            WindowEvent::Resized(size) => {
                log::debug!("Resized: {}x{}", size.width, size.height);
                session.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("Exiting after {} frames", self.driver.frames());
        self.release();
    }
}
