//! Shared simulation parameters read by every compute stage.
//!
//! The block is host-writable and GPU-readable. The control panel edits it
//! through [`Control`]; the frame loop writes the elapsed time.
//!
//! ```wgsl
//! struct SimUniforms {
//!     world: vec4<f32>,   // [width, height, delta_time, max_speed]
//!     weights: vec4<f32>, // [alignment, cohesion, separation, _]
//!     radii: vec4<f32>,   // [alignment, cohesion, separation, _]
//! }
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// Default neighbor radius for alignment and cohesion.
pub const DEFAULT_VIEW_DISTANCE: f32 = 50.0;
/// Default speed cap in world units per second.
pub const DEFAULT_MAX_SPEED: f32 = 120.0;

/// GPU layout of the simulation parameters.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SimulationUniforms {
    world: [f32; 4],
    weights: [f32; 4],
    radii: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<SimulationUniforms>() == 48);

/// A named numeric setting exposed to the control panel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    AlignmentWeight,
    CohesionWeight,
    SeparationWeight,
    AlignmentRadius,
    CohesionRadius,
    SeparationRadius,
    /// Speed cap; zero disables it.
    MaxSpeed,
}

impl Control {
    pub const ALL: [Control; 7] = [
        Control::AlignmentWeight,
        Control::CohesionWeight,
        Control::SeparationWeight,
        Control::AlignmentRadius,
        Control::CohesionRadius,
        Control::SeparationRadius,
        Control::MaxSpeed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Control::AlignmentWeight => "Alignment",
            Control::CohesionWeight => "Cohesion",
            Control::SeparationWeight => "Separation",
            Control::AlignmentRadius => "Alignment radius",
            Control::CohesionRadius => "Cohesion radius",
            Control::SeparationRadius => "Separation radius",
            Control::MaxSpeed => "Max speed",
        }
    }

    /// Suggested slider range.
    pub fn range(self) -> std::ops::RangeInclusive<f32> {
        match self {
            Control::AlignmentWeight | Control::CohesionWeight | Control::SeparationWeight => 0.0..=10.0,
            Control::AlignmentRadius | Control::CohesionRadius | Control::SeparationRadius => 0.0..=300.0,
            Control::MaxSpeed => 0.0..=600.0,
        }
    }
}

impl SimulationUniforms {
    /// Parameters for a world of `world_size` with every rule weighted 1
    /// and the separation radius at two thirds of `view_distance`.
    pub fn new(world_size: Vec2, view_distance: f32) -> Self {
        Self {
            world: [world_size.x, world_size.y, 0.0, DEFAULT_MAX_SPEED],
            weights: [1.0, 1.0, 1.0, 0.0],
            radii: [view_distance, view_distance, view_distance / 1.5, 0.0],
        }
    }

    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.world[0], self.world[1])
    }

    pub fn set_world_size(&mut self, size: Vec2) {
        self.world[0] = size.x;
        self.world[1] = size.y;
    }

    pub fn delta_time(&self) -> f32 {
        self.world[2]
    }

    pub fn set_delta_time(&mut self, dt: f32) {
        self.world[2] = dt.max(0.0);
    }

    /// Weights as `[alignment, cohesion, separation]`.
    pub fn weights(&self) -> [f32; 3] {
        [self.weights[0], self.weights[1], self.weights[2]]
    }

    /// Neighbor radii as `[alignment, cohesion, separation]`.
    pub fn radii(&self) -> [f32; 3] {
        [self.radii[0], self.radii[1], self.radii[2]]
    }

    pub fn max_speed(&self) -> f32 {
        self.world[3]
    }

    pub fn get(&self, control: Control) -> f32 {
        *self.slot(control)
    }

    /// Apply a control value. Non-finite values are ignored and negative
    /// values clamp to zero. Returns whether the stored value changed.
    pub fn set(&mut self, control: Control, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        let value = value.max(0.0);
        let slot = self.slot_mut(control);
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    fn slot(&self, control: Control) -> &f32 {
        match control {
            Control::AlignmentWeight => &self.weights[0],
            Control::CohesionWeight => &self.weights[1],
            Control::SeparationWeight => &self.weights[2],
            Control::AlignmentRadius => &self.radii[0],
            Control::CohesionRadius => &self.radii[1],
            Control::SeparationRadius => &self.radii[2],
            Control::MaxSpeed => &self.world[3],
        }
    }

    fn slot_mut(&mut self, control: Control) -> &mut f32 {
        match control {
            Control::AlignmentWeight => &mut self.weights[0],
            Control::CohesionWeight => &mut self.weights[1],
            Control::SeparationWeight => &mut self.weights[2],
            Control::AlignmentRadius => &mut self.radii[0],
            Control::CohesionRadius => &mut self.radii[1],
            Control::SeparationRadius => &mut self.radii[2],
            Control::MaxSpeed => &mut self.world[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let u = SimulationUniforms::new(Vec2::new(4096.0, 3072.0), 50.0);
        assert_eq!(u.world_size(), Vec2::new(4096.0, 3072.0));
        assert_eq!(u.weights(), [1.0, 1.0, 1.0]);
        let r = u.radii();
        assert_eq!(r[0], 50.0);
        assert_eq!(r[1], 50.0);
        assert!((r[2] - 33.333_332).abs() < 1e-4);
    }

    #[test]
    fn test_controls_map_onto_fields() {
        let mut u = SimulationUniforms::new(Vec2::splat(100.0), 50.0);
        for (i, control) in Control::ALL.iter().enumerate() {
            assert!(u.set(*control, 2.0 + i as f32));
        }
        assert_eq!(u.weights(), [2.0, 3.0, 4.0]);
        assert_eq!(u.radii(), [5.0, 6.0, 7.0]);
        assert_eq!(u.max_speed(), 8.0);
    }

    #[test]
    fn test_controls_clamp_bad_input() {
        let mut u = SimulationUniforms::new(Vec2::splat(100.0), 50.0);
        assert!(!u.set(Control::CohesionWeight, f32::NAN));
        assert_eq!(u.get(Control::CohesionWeight), 1.0);
        assert!(u.set(Control::CohesionWeight, -3.0));
        assert_eq!(u.get(Control::CohesionWeight), 0.0);
        assert!(!u.set(Control::CohesionWeight, 0.0));
    }

    #[test]
    fn test_delta_time_never_negative() {
        let mut u = SimulationUniforms::new(Vec2::splat(100.0), 50.0);
        u.set_delta_time(-1.0);
        assert_eq!(u.delta_time(), 0.0);
    }
}
