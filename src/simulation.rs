//! Simulation builder and runner

use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::agent::AgentStore;
use crate::error::SimulationError;
use crate::gpu::{FlockingSimulator, GpuState};
use crate::input::{Input, KeyCode};
use crate::interaction::DEFAULT_PICK_RADIUS;
use crate::minimap::DEFAULT_FRACTION;
use crate::scene::{Scene, SceneConfig};
use crate::time::FrameClock;
use crate::uniforms::{Control, SimulationUniforms, DEFAULT_MAX_SPEED, DEFAULT_VIEW_DISTANCE};

/// A flocking simulation builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
///
/// ```ignore
/// Simulation::new()
///     .with_agent_count(5000)
///     .with_world_multiplier(4.0)
///     .run()?;
/// ```
#[derive(Clone, Debug)]
pub struct Simulation {
    agent_count: usize,
    world_multiplier: f32,
    screen_size: Vec2,
    view_distance: f32,
    weights: Option<[f32; 3]>,
    radii: Option<[f32; 3]>,
    max_speed: f32,
    initial_speed: f32,
    pick_radius: f32,
    seed: Option<u64>,
}

impl Simulation {
    /// Create a new simulation with default settings.
    pub fn new() -> Self {
        Self {
            agent_count: 3000,
            world_multiplier: 4.0,
            screen_size: Vec2::new(1024.0, 768.0),
            view_distance: DEFAULT_VIEW_DISTANCE,
            weights: None,
            radii: None,
            max_speed: DEFAULT_MAX_SPEED,
            initial_speed: 60.0,
            pick_radius: DEFAULT_PICK_RADIUS,
            seed: None,
        }
    }

    /// Set the number of agents. Fixed for the whole run.
    pub fn with_agent_count(mut self, count: usize) -> Self {
        self.agent_count = count;
        self
    }

    /// World size as a multiple of the screen size.
    pub fn with_world_multiplier(mut self, multiplier: f32) -> Self {
        self.world_multiplier = multiplier;
        self
    }

    /// Window size in physical pixels.
    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_size = Vec2::new(width as f32, height as f32);
        self
    }

    /// Neighbor radius for alignment and cohesion; separation uses two
    /// thirds of it. Overridden by [`Simulation::with_radii`].
    pub fn with_view_distance(mut self, distance: f32) -> Self {
        self.view_distance = distance;
        self
    }

    /// Alignment, cohesion and separation weights.
    pub fn with_weights(mut self, alignment: f32, cohesion: f32, separation: f32) -> Self {
        self.weights = Some([alignment, cohesion, separation]);
        self
    }

    /// Alignment, cohesion and separation radii.
    pub fn with_radii(mut self, alignment: f32, cohesion: f32, separation: f32) -> Self {
        self.radii = Some([alignment, cohesion, separation]);
        self
    }

    /// Speed cap in world units per second; zero disables it.
    pub fn with_max_speed(mut self, speed: f32) -> Self {
        self.max_speed = speed;
        self
    }

    /// Speed of every agent at spawn.
    pub fn with_initial_speed(mut self, speed: f32) -> Self {
        self.initial_speed = speed;
        self
    }

    /// Hit radius for picking, in world units.
    pub fn with_pick_radius(mut self, radius: f32) -> Self {
        self.pick_radius = radius;
        self
    }

    /// Seed the spawn positions for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn world_size(&self) -> Vec2 {
        self.screen_size * self.world_multiplier
    }

    /// Validate the settings and build the host scene.
    pub fn build_scene(&self) -> Result<Scene, SimulationError> {
        if self.agent_count == 0 {
            return Err(SimulationError::InvalidConfig("agent count must be at least 1".into()));
        }
        // The device is requested with default limits.
        FlockingSimulator::check_limits(self.agent_count, &wgpu::Limits::default())
            .map_err(|e| SimulationError::InvalidConfig(e.to_string()))?;
        if !self.world_multiplier.is_finite() || self.world_multiplier < 1.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "world multiplier must be at least 1, got {}",
                self.world_multiplier
            )));
        }
        if self.screen_size.x < 1.0 || self.screen_size.y < 1.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "screen size must be positive, got {}x{}",
                self.screen_size.x, self.screen_size.y
            )));
        }

        let world_size = self.world_size();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = AgentStore::randomized(self.agent_count, world_size, self.initial_speed, &mut rng);

        let mut uniforms = SimulationUniforms::new(world_size, self.view_distance);
        uniforms.set(Control::MaxSpeed, self.max_speed);
        if let Some([a, c, s]) = self.weights {
            uniforms.set(Control::AlignmentWeight, a);
            uniforms.set(Control::CohesionWeight, c);
            uniforms.set(Control::SeparationWeight, s);
        }
        if let Some([a, c, s]) = self.radii {
            uniforms.set(Control::AlignmentRadius, a);
            uniforms.set(Control::CohesionRadius, c);
            uniforms.set(Control::SeparationRadius, s);
        }

        let config = SceneConfig {
            screen_size: self.screen_size,
            world_multiplier: self.world_multiplier,
            minimap_fraction: DEFAULT_FRACTION,
            pick_radius: self.pick_radius,
        };
        Ok(Scene::new(&config, store, uniforms))
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        let scene = self.build_scene()?;
        log::info!(
            "Starting flockview: {} agents in a {}x{} world",
            scene.store.len(),
            self.world_size().x,
            self.world_size().y
        );

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(scene, self.screen_size);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    gpu_state: Option<GpuState>,
    scene: Scene,
    input: Input,
    clock: FrameClock,
    screen_size: Vec2,
    error: Option<SimulationError>,
}

impl App {
    fn new(scene: Scene, screen_size: Vec2) -> Self {
        Self {
            gpu_state: None,
            scene,
            input: Input::new(),
            clock: FrameClock::new(),
            screen_size,
            error: None,
        }
    }

    fn create_gpu_state(&mut self, event_loop: &ActiveEventLoop) -> Result<GpuState, SimulationError> {
        let window_attrs = Window::default_attributes()
            .with_title("flockview")
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.screen_size.x as u32,
                self.screen_size.y as u32,
            ));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        pollster::block_on(GpuState::new(window, &mut self.scene)).map_err(SimulationError::from)
    }

    fn update_title(&self, window: &Window) {
        let mut title = format!(
            "flockview | {:.0} fps | {} agents",
            self.clock.fps(),
            self.scene.store.len()
        );
        if let Some(index) = self.scene.interaction.selection().index() {
            title.push_str(&format!(" | agent #{}", index));
        }
        if self.clock.is_paused() {
            title.push_str(" | paused");
        }
        window.set_title(&title);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };

        self.clock.tick();
        if self.input.key_pressed(KeyCode::Space) {
            self.clock.toggle_pause();
        }

        let result = gpu_state.frame(
            &mut self.scene,
            &self.input,
            self.clock.frame_delta(),
            self.clock.delta(),
        );
        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("Surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::error!("Render error: {:?}", e),
        }
        self.input.begin_frame();

        let window = gpu_state.window().clone();
        if self.clock.frame() % 30 == 0 {
            self.update_title(&window);
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu_state.is_some() {
            return;
        }
        match self.create_gpu_state(event_loop) {
            Ok(gpu_state) => {
                gpu_state.window().request_redraw();
                self.gpu_state = Some(gpu_state);
            }
            Err(e) => {
                log::error!("{}", e);
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        {
            if let Some(gpu_state) = &mut self.gpu_state {
                if gpu_state.on_window_event(&event) {
                    return;
                }
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(&mut self.scene, physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => {
                self.input.handle_event(&other);
                if self.input.key_pressed(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
        }
    }
}
