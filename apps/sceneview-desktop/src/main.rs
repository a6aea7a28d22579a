mod devices;
mod keymap;
mod panel;

use anyhow::{Context, Result};
use clap::Parser;
use devices::{KEYBOARD, MOUSE, WinitDevices};
use glam::Vec2;
use panel::{PanelOverlay, SharedSummary};
use sceneview_common::{Key, Viewport};
use sceneview_input::{CaptureMode, InputRouter, SharedDeviceSource};
use sceneview_render_wgpu::WgpuGraphics;
use sceneview_scene::{LoadingScene, SceneRegistry, ViewerConfig, ViewerScene};
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "sceneview-desktop", about = "Free-fly 3D scene viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log filter, overrides --verbose (e.g. "sceneview_scene=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Viewer configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Window and GPU resources, created once the event loop is running.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    gfx: WgpuGraphics,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct App {
    config: ViewerConfig,
    router: InputRouter,
    registry: SceneRegistry,
    summary: SharedSummary,
    gpu: Option<Gpu>,
    egui_ctx: egui::Context,
    /// Accumulated pointer position; raw motion feeds it while captured.
    cursor: Vec2,
    last_frame: Instant,
    show_panel: bool,
}

impl App {
    fn new(config: ViewerConfig) -> Result<Self> {
        let summary: SharedSummary = Rc::new(RefCell::new(None));
        let mut registry = SceneRegistry::new(config.clone());
        registry.register_passive("loading", LoadingScene::new("loading", "viewer"))?;
        registry.register(
            "viewer",
            ViewerScene::demo("viewer").with_overlay(Box::new(PanelOverlay::new(summary.clone()))),
        )?;
        Ok(Self {
            config,
            router: InputRouter::new(),
            registry,
            summary,
            gpu: None,
            egui_ctx: egui::Context::default(),
            cursor: Vec2::ZERO,
            last_frame: Instant::now(),
            show_panel: true,
        })
    }

    fn init_gpu(&self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let win = &self.config.window;
        let attrs = Window::default_attributes()
            .with_title(win.title.clone())
            .with_inner_size(PhysicalSize::new(win.width, win.height));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("sceneview_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .context("surface reports no texture formats")?;
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);
        let gfx = WgpuGraphics::new(
            device,
            queue,
            surface_format,
            surface_config.width,
            surface_config.height,
        );

        tracing::info!(backend = adapter.get_info().backend.to_str(), "GPU initialized");
        Ok(Gpu {
            window,
            surface,
            surface_config,
            gfx,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };
        gpu.surface_config.width = size.width.max(1);
        gpu.surface_config.height = size.height.max(1);
        gpu.surface.configure(gpu.gfx.device(), &gpu.surface_config);
        gpu.gfx.resize(gpu.surface_config.width, gpu.surface_config.height);
        self.registry.resize(Viewport::new(
            gpu.surface_config.width,
            gpu.surface_config.height,
        ));
    }

    fn handle_key(&mut self, key: Key, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if key == Key::F2 && !repeat {
                    self.show_panel = !self.show_panel;
                }
                self.router.key_down(KEYBOARD, key, 0);
            }
            ElementState::Released => {
                self.router.key_up(KEYBOARD, key, 0);
            }
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f64().min(0.1);
        self.last_frame = now;

        let Some(gpu) = &mut self.gpu else {
            return;
        };
        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(gpu.gfx.device(), &gpu.surface_config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        gpu.gfx
            .set_target(output.texture.create_view(&wgpu::TextureViewDescriptor::default()));
        if let Err(e) = self.registry.frame(dt, &mut self.router, &mut gpu.gfx) {
            tracing::error!("scene frame failed: {e}");
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let show_panel = self.show_panel;
        let full_output = {
            let data = self.summary.borrow();
            self.egui_ctx.run(raw_input, |ctx| {
                if show_panel {
                    panel::draw(ctx, data.as_ref());
                }
            })
        };
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.surface_config.width, gpu.surface_config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        let device = gpu.gfx.device();
        let queue = gpu.gfx.queue();
        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        gpu.egui_renderer
            .update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        let gpu = match self.init_gpu(event_loop) {
            Ok(gpu) => gpu,
            Err(e) => {
                tracing::error!("failed to initialise graphics: {e:#}");
                event_loop.exit();
                return;
            }
        };

        let devices: SharedDeviceSource = Rc::new(RefCell::new(WinitDevices::new(gpu.window.clone())));
        self.router.attach(Some(devices));
        self.registry.resize(Viewport::new(
            gpu.surface_config.width,
            gpu.surface_config.height,
        ));
        self.gpu = Some(gpu);

        if let Err(e) = self.registry.start(&mut self.router) {
            tracing::error!("failed to start scene: {e}");
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let captured = self.router.capture_mode().is_captured();
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            // While captured the panel gets no input; keys belong to the scene.
            if response.consumed && !captured {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.resize(size);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => {
                self.handle_key(keymap::key_from_winit(code), state, repeat);
            }
            WindowEvent::CursorMoved { position, .. } => {
                if !captured {
                    self.cursor = Vec2::new(position.x as f32, position.y as f32);
                    self.router.mouse_move(MOUSE, self.cursor);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = keymap::button_from_winit(button);
                match state {
                    ElementState::Pressed => self.router.button_down(MOUSE, button),
                    ElementState::Released => self.router.button_up(MOUSE, button),
                };
            }
            WindowEvent::Focused(false) => {
                // Key-ups for anything held are lost once focus goes elsewhere.
                self.router.input_state().borrow_mut().release_all();
                if captured {
                    self.router.set_capture_mode(CaptureMode::Uncaptured);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }

        if self.registry.close_requested() {
            tracing::info!("closing viewer");
            event_loop.exit();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.router.capture_mode().is_captured() {
                self.cursor += Vec2::new(delta.0 as f32, delta.1 as f32);
                self.router.mouse_move(MOUSE, self.cursor);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = cli
        .log_level
        .clone()
        .unwrap_or_else(|| (if cli.verbose { "debug" } else { "info" }).to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("sceneview-desktop starting");
    let config = ViewerConfig::load_or_default(cli.config.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
