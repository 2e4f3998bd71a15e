//! The flocking rules and their stage order.
//!
//! Each frame runs four stages over every agent: three neighbor stages that
//! each write one steering force per agent, then an update stage that
//! combines the forces and integrates. The GPU kernels live in
//! [`crate::gpu::compute`]; [`HostFlock`] runs the same math on the CPU for
//! tests and benchmarks.
//!
//! Neighbor search is brute force: every agent looks at every other agent.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::agent::{heading_of, Agent};
use crate::uniforms::SimulationUniforms;

/// One compute stage of the flocking frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Alignment,
    Cohesion,
    Separation,
    Update,
}

impl Stage {
    /// Dispatch order within a frame. Update must come last.
    pub const ORDER: [Stage; 4] = [Stage::Alignment, Stage::Cohesion, Stage::Separation, Stage::Update];

    /// WGSL entry point implementing this stage.
    pub fn entry_point(self) -> &'static str {
        match self {
            Stage::Alignment => "alignment",
            Stage::Cohesion => "cohesion",
            Stage::Separation => "separation",
            Stage::Update => "update",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Alignment => "Alignment Pipeline",
            Stage::Cohesion => "Cohesion Pipeline",
            Stage::Separation => "Separation Pipeline",
            Stage::Update => "Update Pipeline",
        }
    }
}

/// Per-agent steering forces, one slot per neighbor rule.
///
/// Each neighbor stage overwrites only its own field, so the slot never
/// needs clearing between frames.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Forces {
    pub alignment: [f32; 2],
    pub cohesion: [f32; 2],
    pub separation: [f32; 2],
    pub _pad: [f32; 2],
}

const _: () = assert!(std::mem::size_of::<Forces>() == 32);

impl Forces {
    pub const SIZE: usize = std::mem::size_of::<Forces>();
}

/// Forces produced by the neighbor stages for one frame.
///
/// Only [`HostFlock::neighbor_forces`] creates these, so integrating always
/// follows a full neighbor pass.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborForces {
    forces: Vec<Forces>,
}

impl NeighborForces {
    pub fn as_slice(&self) -> &[Forces] {
        &self.forces
    }

    pub fn get(&self, index: usize) -> Option<&Forces> {
        self.forces.get(index)
    }
}

/// CPU implementation of the flocking stages.
pub struct HostFlock;

impl HostFlock {
    /// Run the alignment, cohesion and separation stages.
    pub fn neighbor_forces(agents: &[Agent], uniforms: &SimulationUniforms) -> NeighborForces {
        let [r_align, r_cohesion, r_sep] = uniforms.radii();
        let mut forces = vec![Forces::default(); agents.len()];

        for (i, slot) in forces.iter_mut().enumerate() {
            slot.alignment = alignment(agents, i, r_align).to_array();
        }
        for (i, slot) in forces.iter_mut().enumerate() {
            slot.cohesion = cohesion(agents, i, r_cohesion).to_array();
        }
        for (i, slot) in forces.iter_mut().enumerate() {
            slot.separation = separation(agents, i, r_sep).to_array();
        }

        NeighborForces { forces }
    }

    /// Run the update stage with forces from the same frame.
    pub fn integrate(agents: &mut [Agent], forces: &NeighborForces, uniforms: &SimulationUniforms) {
        let [w_a, w_c, w_s] = uniforms.weights();
        let dt = uniforms.delta_time();
        let max_speed = uniforms.max_speed();
        let world = uniforms.world_size();

        for (agent, f) in agents.iter_mut().zip(forces.forces.iter()) {
            let steer = Vec2::from_array(f.alignment) * w_a
                + Vec2::from_array(f.cohesion) * w_c
                + Vec2::from_array(f.separation) * w_s;

            let mut v = agent.velocity() + steer * dt;
            let speed = v.length();
            if max_speed > 0.0 && speed > max_speed {
                v *= max_speed / speed;
            }

            let p = wrap(agent.position() + v * dt, world);
            agent.set_velocity(v);
            agent.set_position(p);
            if let Some(heading) = heading_of(v) {
                agent.data[0] = heading;
            }
        }
    }

    /// One full frame: all four stages in order.
    pub fn step(agents: &mut [Agent], uniforms: &SimulationUniforms) {
        let forces = Self::neighbor_forces(agents, uniforms);
        Self::integrate(agents, &forces, uniforms);
    }
}

fn alignment(agents: &[Agent], i: usize, radius: f32) -> Vec2 {
    let p = agents[i].position();
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for (j, other) in agents.iter().enumerate() {
        if j != i && p.distance(other.position()) < radius {
            sum += other.velocity();
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    sum / count as f32 - agents[i].velocity()
}

fn cohesion(agents: &[Agent], i: usize, radius: f32) -> Vec2 {
    let p = agents[i].position();
    let mut sum = Vec2::ZERO;
    let mut count = 0u32;
    for (j, other) in agents.iter().enumerate() {
        if j != i && p.distance(other.position()) < radius {
            sum += other.position();
            count += 1;
        }
    }
    if count == 0 {
        return Vec2::ZERO;
    }
    sum / count as f32 - p
}

fn separation(agents: &[Agent], i: usize, radius: f32) -> Vec2 {
    let p = agents[i].position();
    let mut force = Vec2::ZERO;
    for (j, other) in agents.iter().enumerate() {
        if j == i {
            continue;
        }
        let away = p - other.position();
        let d = away.length();
        if d > 0.0 && d < radius {
            force += away / d * ((radius - d) / radius);
        }
    }
    force
}

/// Wrap a position into `[-w/2, w/2) x [-h/2, h/2)`.
pub fn wrap(position: Vec2, world: Vec2) -> Vec2 {
    Vec2::new(wrap_axis(position.x, world.x), wrap_axis(position.y, world.y))
}

fn wrap_axis(x: f32, size: f32) -> f32 {
    if size <= 0.0 {
        return x;
    }
    let half = size / 2.0;
    let shifted = x + half;
    let r = shifted - size * (shifted / size).floor() - half;
    // Rounding can land exactly on the open edge.
    if r >= half {
        -half
    } else {
        r
    }
}
