use anyhow::Result;
use clap::Parser;
use egui::Context as EguiContext;
use glam::{Quat, Vec3};
use lumen_mesh::{MeshBuffers, ObjMesh};
use lumen_raytrace::{Camera, EnvironmentMap, MAX_BOUNCES, Scene};
use lumen_render::{MeshDrawState, OrbitView, Texture};
use lumen_render_wgpu::{MeshDrawer, RayTracePass, SurfaceFormats, choose_alpha_mode};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "lumen-viewer", about = "Interactive mesh and ray tracing viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Wavefront OBJ file for mesh mode
    #[arg(long)]
    obj: Option<PathBuf>,

    /// Texture image for the mesh
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Scene file for ray tracing mode; the built-in scene if omitted
    #[arg(long)]
    scene: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Mesh,
    RayTrace,
}

impl Mode {
    fn toggled(self) -> Self {
        match self {
            Mode::Mesh => Mode::RayTrace,
            Mode::RayTrace => Mode::Mesh,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Mode::Mesh => "Mesh",
            Mode::RayTrace => "Ray Tracing",
        }
    }
}

/// Swing a light direction with a pointer drag; a drag across the full
/// viewport turns it half way round.
fn drag_light(light: Vec3, dx: f32, dy: f32, width: f32, height: f32) -> Vec3 {
    let yaw = dx / width.max(1.0) * std::f32::consts::PI;
    let pitch = dy / height.max(1.0) * std::f32::consts::PI;
    Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch) * light
}

/// Assets loaded before the window exists, uploaded once the GPU is up.
struct Assets {
    mesh: Option<MeshBuffers>,
    texture: Option<Texture>,
    scene: Scene,
    environment: EnvironmentMap,
}

impl Assets {
    fn load(cli: &Cli) -> Result<Self> {
        let mesh = match &cli.obj {
            Some(path) => {
                let mut obj = ObjMesh::load(path)?;
                obj.normalize_to_unit_box();
                Some(obj.to_buffers())
            }
            None => None,
        };
        let texture = cli.texture.as_ref().map(Texture::load).transpose()?;

        let (scene, base_dir) = match &cli.scene {
            Some(path) => (
                Scene::load(path)?,
                path.parent().map(PathBuf::from).unwrap_or_default(),
            ),
            None => (Scene::default_scene(), PathBuf::new()),
        };
        let environment = scene.environment.resolve(&base_dir)?;

        Ok(Self {
            mesh,
            texture,
            scene,
            environment,
        })
    }
}

/// Application state.
struct AppState {
    mode: Mode,
    view: OrbitView,
    draw_state: MeshDrawState,
    triangle_count: usize,
    has_texture: bool,
    camera: Camera,
    bounce_limit: u32,
    sphere_count: usize,
    light_count: usize,
    show_panel: bool,
    // Input state
    left_down: bool,
    right_down: bool,
    cursor: Option<(f32, f32)>,
    viewport: (f32, f32),
    last_frame: Instant,
    frame_ms: f32,
}

impl AppState {
    fn new(assets: &Assets) -> Self {
        let mode = if assets.mesh.is_some() {
            Mode::Mesh
        } else {
            Mode::RayTrace
        };
        Self {
            mode,
            view: OrbitView::default(),
            draw_state: MeshDrawState::default(),
            triangle_count: assets.mesh.as_ref().map_or(0, MeshBuffers::triangle_count),
            has_texture: assets.texture.is_some(),
            camera: assets.scene.camera,
            bounce_limit: assets.scene.bounce_limit.min(MAX_BOUNCES),
            sphere_count: assets.scene.spheres.len(),
            light_count: assets.scene.lights.len(),
            show_panel: true,
            left_down: false,
            right_down: false,
            cursor: None,
            viewport: (1.0, 1.0),
            last_frame: Instant::now(),
            frame_ms: 0.0,
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Tab => {
                self.mode = self.mode.toggled();
                tracing::info!("switched to {} mode", self.mode.label());
            }
            KeyCode::F1 => {
                self.show_panel = !self.show_panel;
            }
            _ => {}
        }
    }

    fn cursor_moved(&mut self, x: f32, y: f32) {
        if let Some((px, py)) = self.cursor {
            let (dx, dy) = (x - px, y - py);
            let (w, h) = self.viewport;
            match self.mode {
                Mode::Mesh if self.left_down => self.view.drag(dx, dy, w, h),
                Mode::Mesh if self.right_down => {
                    self.draw_state.light_dir = drag_light(self.draw_state.light_dir, dx, dy, w, h);
                }
                Mode::RayTrace if self.left_down => {
                    self.camera.orbit(-dx / w * 5.0, dy / h * 5.0);
                }
                _ => {}
            }
        }
        self.cursor = Some((x, y));
    }

    /// `delta` is in pixels; positive moves away from the subject.
    fn wheel(&mut self, delta: f32) {
        match self.mode {
            Mode::Mesh => self.view.zoom(delta),
            Mode::RayTrace => self.camera.dolly(1.0 + delta / 1000.0),
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_panel {
            return;
        }

        egui::SidePanel::left("controls")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Lumen");
                ui.label(format!("Mode: {}", self.mode.label()));
                ui.label(format!("Frame: {:.1} ms", self.frame_ms));
                ui.separator();

                match self.mode {
                    Mode::Mesh => {
                        if self.triangle_count == 0 {
                            ui.label("No mesh loaded (--obj)");
                        } else {
                            ui.label(format!("Triangles: {}", self.triangle_count));
                        }
                        ui.add_enabled(
                            self.has_texture,
                            egui::Checkbox::new(&mut self.draw_state.show_texture, "Show Texture"),
                        );
                        ui.checkbox(&mut self.draw_state.swap_yz, "Swap Y-Z Axes");
                        ui.add(
                            egui::Slider::new(&mut self.draw_state.shininess, 1.0..=200.0)
                                .text("Shininess"),
                        );
                        ui.label("Light direction:");
                        ui.horizontal(|ui| {
                            let light = &mut self.draw_state.light_dir;
                            ui.add(egui::DragValue::new(&mut light.x).prefix("X: ").speed(0.05));
                            ui.add(egui::DragValue::new(&mut light.y).prefix("Y: ").speed(0.05));
                            ui.add(egui::DragValue::new(&mut light.z).prefix("Z: ").speed(0.05));
                        });
                        ui.label(format!("Distance: {:.2}", self.view.translation_z));
                        ui.separator();
                        ui.small("LMB: Rotate | RMB: Light | Wheel: Zoom");
                    }
                    Mode::RayTrace => {
                        ui.label(format!(
                            "Spheres: {}  Lights: {}",
                            self.sphere_count, self.light_count
                        ));
                        ui.add(
                            egui::Slider::new(&mut self.bounce_limit, 0..=MAX_BOUNCES)
                                .text("Bounce Limit"),
                        );
                        let p = self.camera.position;
                        ui.label(format!("Camera: ({:.1}, {:.1}, {:.1})", p.x, p.y, p.z));
                        ui.separator();
                        ui.small("LMB: Orbit | Wheel: Zoom");
                    }
                }

                ui.separator();
                ui.small("Tab: Switch Mode | F1: Toggle Panel");
            });
    }
}

struct GpuApp {
    state: AppState,
    assets: Assets,
    window: Option<Arc<Window>>,
    surface: Option<wgpu::Surface<'static>>,
    device: Option<wgpu::Device>,
    queue: Option<wgpu::Queue>,
    config: Option<wgpu::SurfaceConfiguration>,
    mesh_drawer: Option<MeshDrawer>,
    ray_pass: Option<RayTracePass>,
    egui_ctx: EguiContext,
    egui_winit: Option<egui_winit::State>,
    egui_renderer: Option<egui_wgpu::Renderer>,
}

impl GpuApp {
    fn new(assets: Assets) -> Self {
        Self {
            state: AppState::new(&assets),
            assets,
            window: None,
            surface: None,
            device: None,
            queue: None,
            config: None,
            mesh_drawer: None,
            ray_pass: None,
            egui_ctx: EguiContext::default(),
            egui_winit: None,
            egui_renderer: None,
        }
    }

    fn render_frame(&mut self) {
        let now = Instant::now();
        self.state.frame_ms = (now - self.state.last_frame).as_secs_f32() * 1000.0;
        self.state.last_frame = now;

        let (
            Some(window),
            Some(surface),
            Some(device),
            Some(queue),
            Some(config),
            Some(egui_winit),
            Some(egui_renderer),
        ) = (
            &self.window,
            &self.surface,
            &self.device,
            &self.queue,
            &self.config,
            &mut self.egui_winit,
            &mut self.egui_renderer,
        )
        else {
            return;
        };

        let output = match surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                surface.configure(device, config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: config.view_formats.first().copied(),
            ..Default::default()
        });
        let aspect = config.width as f32 / config.height.max(1) as f32;

        match self.state.mode {
            Mode::Mesh => {
                if let Some(drawer) = &mut self.mesh_drawer {
                    let s = self.state.draw_state;
                    drawer.swap_yz(s.swap_yz);
                    drawer.show_texture(s.show_texture);
                    drawer.set_light_dir(s.light_dir.x, s.light_dir.y, s.light_dir.z);
                    drawer.set_shininess(s.shininess);
                    drawer.draw(device, queue, &view, &self.state.view.matrices(aspect));
                }
            }
            Mode::RayTrace => {
                if let Some(pass) = &mut self.ray_pass {
                    pass.set_bounce_limit(self.state.bounce_limit);
                    pass.draw(device, queue, &view, &self.state.camera, aspect);
                }
            }
        }

        let raw_input = egui_winit.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            self.state.draw_ui(ctx);
        });
        egui_winit.handle_platform_output(window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [config.width, config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            egui_renderer.update_texture(device, queue, *id, image_delta);
        }
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("egui_encoder"),
        });
        egui_renderer.update_buffers(device, queue, &mut encoder, &paint_jobs, &screen_descriptor);
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
            egui_renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            egui_renderer.free_texture(id);
        }

        output.present();
        window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Lumen")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .expect("create surface");

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .expect("find adapter");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lumen_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .expect("create device");

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let offered = &surface_caps.formats;
        let formats = SurfaceFormats::choose(offered).expect("surface format");
        let target_format = formats.view;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: formats.surface,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: choose_alpha_mode(&surface_caps.alpha_modes),
            view_formats: formats.extra_view_formats(),
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        self.state.viewport = (config.width as f32, config.height as f32);

        let mut mesh_drawer =
            MeshDrawer::new(&device, &queue, target_format, config.width, config.height);
        if let Some(mesh) = &self.assets.mesh {
            if let Err(e) = mesh_drawer.set_mesh(&device, mesh) {
                tracing::error!("failed to upload mesh: {e}");
            }
        }
        if let Some(texture) = &self.assets.texture {
            mesh_drawer.set_texture(&device, &queue, texture);
        }

        let mut ray_pass = RayTracePass::new(&device, target_format);
        ray_pass.set_scene(&device, &queue, &self.assets.scene, &self.assets.environment);

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, target_format, None, 1, false);

        self.window = Some(window);
        self.surface = Some(surface);
        self.device = Some(device);
        self.queue = Some(queue);
        self.config = Some(config);
        self.mesh_drawer = Some(mesh_drawer);
        self.ray_pass = Some(ray_pass);
        self.egui_winit = Some(egui_winit);
        self.egui_renderer = Some(egui_renderer);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(egui_winit), Some(window)) = (&mut self.egui_winit, &self.window) {
            let response = egui_winit.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(surface), Some(device), Some(config)) =
                    (&self.surface, &self.device, &mut self.config)
                {
                    config.width = new_size.width.max(1);
                    config.height = new_size.height.max(1);
                    surface.configure(device, config);
                    self.state.viewport = (config.width as f32, config.height as f32);
                    if let Some(drawer) = &mut self.mesh_drawer {
                        drawer.resize(device, config.width, config.height);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key);
            }
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.state.left_down = pressed,
                    MouseButton::Right => self.state.right_down = pressed,
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.state.cursor = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let pixels = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                self.state.wheel(pixels);
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("lumen-viewer starting");
    let assets = Assets::load(&cli)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(assets);
    event_loop.run_app(&mut app)?;

    Ok(())
}
