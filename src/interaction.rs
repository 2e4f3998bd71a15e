//! Agent picking and selection.
//!
//! Picking runs against the host shadow copy of the agents, which is at
//! most one frame behind the device. Hit-testing uses the same camera
//! transform as rendering, so what is under the pointer is what gets
//! selected.

use glam::{Vec2, Vec4};

use crate::agent::{Agent, AgentStore};
use crate::camera::Camera;
use crate::error::StoreError;
use crate::input::{Input, MouseButton};

/// Default hit radius in world units.
pub const DEFAULT_PICK_RADIUS: f32 = 10.0;

/// Index of the selected agent, if any.
///
/// Persists until another pick replaces it or it is cleared.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection(Option<usize>);

impl Selection {
    pub fn index(&self) -> Option<usize> {
        self.0
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }
}

/// Maps pointer input to agent selection and colour edits.
#[derive(Clone, Debug)]
pub struct InteractionController {
    pick_radius: f32,
    selection: Selection,
}

impl InteractionController {
    pub fn new(pick_radius: f32) -> Self {
        Self {
            pick_radius: pick_radius.max(0.0),
            selection: Selection::default(),
        }
    }

    pub fn pick_radius(&self) -> f32 {
        self.pick_radius
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Pointer position (window pixels) in world space.
    pub fn pointer_to_world(pointer: Vec2, camera: &Camera) -> Vec2 {
        (pointer - camera.viewport() / 2.0) * camera.zoom() + camera.rect().center()
    }

    /// Nearest agent strictly inside the pick radius of `world`; ties go
    /// to the lower index.
    pub fn pick(&self, world: Vec2, store: &AgentStore) -> Option<usize> {
        let radius_sq = self.pick_radius * self.pick_radius;
        let mut best: Option<(usize, f32)> = None;
        for (index, agent) in store.iter().enumerate() {
            let d = agent.position().distance_squared(world);
            if d >= radius_sq {
                continue;
            }
            match best {
                Some((_, best_d)) if best_d <= d => {}
                _ => best = Some((index, d)),
            }
        }
        best.map(|(index, _)| index)
    }

    /// Pick under the pointer while the primary button is held.
    ///
    /// Returns the index when the selection changed this frame.
    pub fn update(&mut self, input: &Input, camera: &Camera, store: &AgentStore) -> Option<usize> {
        if !input.mouse_held(MouseButton::Left) {
            return None;
        }
        let world = Self::pointer_to_world(input.mouse_position(), camera);
        let picked = self.pick(world, store)?;
        if self.selection.0 == Some(picked) {
            return None;
        }
        log::debug!("Selected agent {} at {:?}", picked, world);
        self.selection = Selection(Some(picked));
        Some(picked)
    }

    pub fn clear(&mut self) {
        self.selection = Selection::default();
    }

    pub fn selected_agent<'a>(&self, store: &'a AgentStore) -> Option<&'a Agent> {
        self.selection.0.and_then(|index| store.at(index))
    }

    /// Recolour the selected agent through the store's edit path.
    ///
    /// Does nothing without a selection.
    pub fn set_selected_color(&self, store: &mut AgentStore, color: Vec4) -> Result<(), StoreError> {
        match self.selection.0 {
            Some(index) => store.set_color(index, color),
            None => Ok(()),
        }
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(DEFAULT_PICK_RADIUS)
    }
}
