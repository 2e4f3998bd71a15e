//! # flockview
//!
//! GPU flocking ("boids") simulation with a bounded, zoomable camera, a
//! minimap and agent picking.
//!
//! Agents live in a device storage buffer and are advanced every frame by
//! four compute stages. A non-blocking readback keeps a host copy of the
//! agents at most a frame or two behind, which the host uses for picking,
//! the minimap and the control panel. Host edits (recolouring the selected
//! agent) are uploaded before the next dispatch.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flockview::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new()
//!         .with_agent_count(3000)
//!         .with_world_multiplier(4.0)
//!         .with_weights(1.0, 1.0, 1.5)
//!         .run()
//! }
//! ```
//!
//! ## Frame
//!
//! | Step | Where |
//! |------|-------|
//! | Apply the latest readback | [`agent::AgentStore::apply_readback`] |
//! | Camera, minimap, picking | [`scene::Scene::update`] |
//! | Upload edits and uniforms | [`agent::AgentStore::take_uploads`] |
//! | Alignment, cohesion, separation, update | [`gpu::FlockingSimulator::advance`] |
//! | Minimap and main view | [`gpu::GpuState::frame`] |
//!
//! ## Controls
//!
//! - `W`/`A`/`S`/`D` or arrow keys: pan
//! - Mouse wheel: zoom
//! - Left click: select an agent
//! - `Space`: pause
//! - `Escape`: quit
//!
//! Build with `--features egui` for the control panel.

pub mod agent;
pub mod batch;
pub mod camera;
pub mod error;
pub mod flocking;
pub mod gpu;
pub mod input;
pub mod interaction;
pub mod minimap;
pub mod scene;
mod simulation;
pub mod time;
#[cfg(feature = "egui")]
pub mod ui;
pub mod uniforms;

pub use bytemuck;
pub use agent::{Agent, AgentStore};
pub use camera::{Camera, CameraPolicy, Rect};
pub use error::{GpuError, SimulationError, StoreError};
pub use flocking::{HostFlock, Stage};
pub use glam::{Vec2, Vec3, Vec4};
pub use interaction::{InteractionController, Selection};
pub use minimap::Minimap;
pub use simulation::Simulation;
pub use uniforms::{Control, SimulationUniforms};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use flockview::prelude::*;
/// ```
pub mod prelude {
    pub use crate::agent::{Agent, AgentStore};
    pub use crate::camera::{Camera, CameraPolicy, Rect};
    pub use crate::error::{GpuError, SimulationError, StoreError};
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::interaction::InteractionController;
    pub use crate::simulation::Simulation;
    pub use crate::time::FrameClock;
    pub use crate::uniforms::{Control, SimulationUniforms};
    pub use crate::{Vec2, Vec3, Vec4};
}
