//! Host-side state of the viewer and its per-frame update.
//!
//! Everything here is plain data: the agent shadow copy, the simulation
//! parameters, both cameras, the primitive batches and the selection. The
//! GPU layer reads it to fill buffers; nothing in this module touches the
//! device, so whole frames can be driven from tests.

use glam::{Vec2, Vec4};

use crate::agent::{Agent, AgentStore};
use crate::batch::{LineBatch, PointBatch, DEFAULT_LINE_CAPACITY};
use crate::camera::Camera;
use crate::error::StoreError;
use crate::input::Input;
use crate::interaction::InteractionController;
use crate::minimap::Minimap;
use crate::uniforms::SimulationUniforms;

/// Startup parameters of a scene.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    pub screen_size: Vec2,
    pub world_multiplier: f32,
    pub minimap_fraction: f32,
    pub pick_radius: f32,
}

pub struct Scene {
    pub store: AgentStore,
    pub uniforms: SimulationUniforms,
    pub camera: Camera,
    pub minimap: Minimap,
    pub points: PointBatch,
    pub lines: LineBatch,
    pub interaction: InteractionController,
}

impl Scene {
    pub fn new(config: &SceneConfig, store: AgentStore, uniforms: SimulationUniforms) -> Self {
        let points = PointBatch::new(store.len());
        Self {
            camera: Camera::main(config.screen_size, config.world_multiplier),
            minimap: Minimap::new(config.screen_size, config.world_multiplier, config.minimap_fraction),
            points,
            lines: LineBatch::new(DEFAULT_LINE_CAPACITY),
            interaction: InteractionController::new(config.pick_radius),
            store,
            uniforms,
        }
    }

    /// Camera, minimap and picking for one frame.
    ///
    /// `frame_dt` is wall time and drives panning; `sim_dt` is the
    /// simulation step (zero while paused). Returns a newly picked agent.
    pub fn update(&mut self, input: &Input, frame_dt: f32, sim_dt: f32) -> Option<usize> {
        self.uniforms.set_delta_time(sim_dt);
        self.camera.update(input, frame_dt);
        self.minimap
            .update(&self.camera, &self.store, &mut self.points, &mut self.lines);
        self.interaction.update(input, &self.camera, &self.store)
    }

    /// Match the main camera to the window's actual size in pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera
            .set_viewport(Vec2::new(width as f32, height as f32));
    }

    /// Agents inside the main camera's view.
    pub fn visible_count(&self) -> usize {
        self.camera
            .rect()
            .count_contained(self.store.iter().map(Agent::position))
    }

    pub fn selected(&self) -> Option<(usize, &Agent)> {
        let index = self.interaction.selection().index()?;
        self.store.at(index).map(|agent| (index, agent))
    }

    pub fn set_selected_color(&mut self, color: Vec4) -> Result<(), StoreError> {
        self.interaction.set_selected_color(&mut self.store, color)
    }
}
