//! Device setup and the per-frame GPU work.
//!
//! [`GpuState::frame`] runs one frame in a fixed order: collect the last
//! readback, update the host scene, upload host edits and uniforms, run
//! the four compute stages, copy the agents for drawing and readback,
//! render the minimap and the main view, then submit and start mapping.

mod boids;
mod camera;
mod compute;
#[cfg(feature = "egui")]
mod egui_integration;
mod primitives;
mod readback;
mod surface;

use std::sync::Arc;

use winit::window::Window;

use crate::error::GpuError;
use crate::input::Input;
use crate::scene::Scene;

pub use boids::BoidRenderer;
pub use camera::CameraBinding;
pub use compute::{FlockingSimulator, COMPUTE_SHADER};
pub use primitives::PrimitiveRenderer;
pub use readback::{AgentReadback, ReadbackRing, SlotState};
pub use surface::OffscreenSurface;

/// Threads per compute workgroup; must match `@workgroup_size` in the
/// flocking shader.
pub const WORKGROUP_SIZE: u32 = 256;

/// Main view clear colour.
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.02,
    g: 0.02,
    b: 0.05,
    a: 1.0,
};

/// Minimap background, a darker shade of the main one.
pub const MINIMAP_BACKGROUND: wgpu::Color = wgpu::Color {
    r: BACKGROUND.r * 0.75,
    g: BACKGROUND.g * 0.75,
    b: BACKGROUND.b * 0.75,
    a: 1.0,
};

pub struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    simulator: FlockingSimulator,
    readback: AgentReadback,
    boids: BoidRenderer,
    main_camera: CameraBinding,
    minimap_camera: CameraBinding,
    points: PrimitiveRenderer,
    lines: PrimitiveRenderer,
    minimap_surface: OffscreenSurface,
    #[cfg(feature = "egui")]
    egui: egui_integration::EguiIntegration,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, scene: &mut Scene) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        if !adapter
            .get_downlevel_capabilities()
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(GpuError::ComputeUnsupported(info.name));
        }
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        FlockingSimulator::check_limits(scene.store.len(), &device.limits())?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::NoAdapter)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        // The window may not have the size that was asked for.
        scene.resize(config.width, config.height);

        let simulator = FlockingSimulator::new(&device, &scene.store, &scene.uniforms);
        let readback = AgentReadback::new(&device, scene.store.byte_len() as u64);

        let camera_layout = CameraBinding::layout(&device);
        let main_camera = CameraBinding::new(&device, &camera_layout, &scene.camera, "Main Camera");
        let minimap_camera = CameraBinding::new(&device, &camera_layout, scene.minimap.camera(), "Minimap Camera");

        let boids = BoidRenderer::new(&device, &camera_layout, surface_format, simulator.num_agents());
        let points = PrimitiveRenderer::points(&device, &camera_layout, surface_format, scene.points.capacity());
        let lines = PrimitiveRenderer::lines(
            &device,
            &camera_layout,
            surface_format,
            crate::batch::DEFAULT_LINE_CAPACITY,
        );

        let minimap_surface = OffscreenSurface::new(
            &device,
            surface_format,
            scene.minimap.target_size(),
            scene.minimap.overlay_transform(),
            MINIMAP_BACKGROUND,
        );

        #[cfg(feature = "egui")]
        let egui = egui_integration::EguiIntegration::new(&device, surface_format, &window);

        log::info!(
            "GPU ready: {} agents, {}x{} surface",
            simulator.num_agents(),
            config.width,
            config.height
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            simulator,
            readback,
            boids,
            main_camera,
            minimap_camera,
            points,
            lines,
            minimap_surface,
            #[cfg(feature = "egui")]
            egui,
        })
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn resize(&mut self, scene: &mut Scene, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            scene.resize(new_size.width, new_size.height);
        }
    }

    /// Reconfigure after the surface was lost or outdated.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Route a window event to the panel first.
    ///
    /// Returns true if the panel consumed it.
    #[cfg(feature = "egui")]
    pub fn on_window_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.egui.on_window_event(&self.window, event)
    }

    /// Run one frame.
    pub fn frame(&mut self, scene: &mut Scene, input: &Input, frame_dt: f32, sim_dt: f32) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Host copy, at most a frame or two behind the device.
        if let Some((bytes, revision)) = self.readback.poll(&self.device) {
            match scene.store.apply_readback(&bytes, revision) {
                Ok(0) => {}
                Ok(kept) => log::debug!(
                    "Kept {} host edits over readback from revision {}",
                    kept,
                    revision
                ),
                Err(e) => log::warn!("{}", e),
            }
        }

        #[cfg(feature = "egui")]
        let panel_input;
        #[cfg(feature = "egui")]
        let input = if self.egui.wants_pointer() {
            // Clicks on the panel never pick agents.
            let mut masked = input.clone();
            masked.release_mouse(crate::input::MouseButton::Left);
            panel_input = masked;
            &panel_input
        } else {
            input
        };

        scene.update(input, frame_dt, sim_dt);

        #[cfg(feature = "egui")]
        let egui_output = {
            let stats = crate::ui::PanelStats {
                agents: scene.store.len(),
                visible: scene.visible_count(),
                fps: if frame_dt > 0.0 { 1.0 / frame_dt } else { 0.0 },
                zoom: scene.camera.zoom(),
                paused: sim_dt == 0.0,
            };
            let selected = scene.selected().map(|(i, agent)| (i, *agent));
            let mut panel = crate::ui::PanelOutput::default();
            let uniforms = &mut scene.uniforms;
            let frame = self.egui.run(&self.window, |ctx| {
                panel = crate::ui::control_panel(ctx, uniforms, stats, selected.as_ref().map(|(i, a)| (*i, a)));
            });
            if panel.uniforms_changed {
                log::debug!("Controls changed: weights {:?}, radii {:?}", scene.uniforms.weights(), scene.uniforms.radii());
            }
            if let Some(color) = panel.color {
                if let Err(e) = scene.set_selected_color(color) {
                    log::warn!("{}", e);
                }
            }
            if panel.clear_selection {
                scene.interaction.clear();
            }
            frame
        };

        // Host edits land before this frame's dispatch.
        for write in scene.store.take_uploads() {
            self.queue
                .write_buffer(self.simulator.agent_buffer(), write.offset, &write.bytes);
        }
        self.simulator.write_uniforms(&self.queue, &scene.uniforms);
        self.main_camera.write(&self.queue, &scene.camera);
        self.minimap_camera.write(&self.queue, scene.minimap.camera());
        self.points.prepare(&self.queue, scene.points.take_vertices());
        self.lines.prepare(&self.queue, scene.lines.take_vertices());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flocking Pass"),
                timestamp_writes: None,
            });
            self.simulator.advance(&mut compute_pass);
        }

        self.boids
            .copy_instances(&mut encoder, self.simulator.agent_buffer());
        self.readback
            .encode_copy(&mut encoder, self.simulator.agent_buffer(), scene.store.revision());

        {
            let mut pass = self.minimap_surface.begin_pass(&mut encoder);
            self.points.draw(&mut pass, self.minimap_camera.bind_group());
            self.lines.draw(&mut pass, self.minimap_camera.bind_group());
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.boids.draw(&mut pass, self.main_camera.bind_group());
            self.minimap_surface.composite(&mut pass);
        }

        #[cfg(feature = "egui")]
        let mut command_buffers = self.egui.render(
            &self.device,
            &self.queue,
            &mut encoder,
            &view,
            [self.config.width, self.config.height],
            egui_output,
        );
        #[cfg(not(feature = "egui"))]
        let mut command_buffers = Vec::new();

        command_buffers.push(encoder.finish());
        self.queue.submit(command_buffers);
        output.present();

        self.readback.begin_map();
        Ok(())
    }
}

/// Parse and validate WGSL with naga.
#[cfg(test)]
pub(crate) fn validate_wgsl(code: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimap_background_is_darker() {
        assert!(MINIMAP_BACKGROUND.b < BACKGROUND.b);
        assert_eq!(MINIMAP_BACKGROUND.a, 1.0);
    }
}
