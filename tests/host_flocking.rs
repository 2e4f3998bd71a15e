//! Integration tests for the CPU flocking stages over many frames.

use flockview::agent::{Agent, AgentStore};
use flockview::flocking::{wrap, HostFlock, Stage};
use flockview::uniforms::{Control, SimulationUniforms};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const WORLD: Vec2 = Vec2::new(800.0, 600.0);

fn uniforms() -> SimulationUniforms {
    let mut u = SimulationUniforms::new(WORLD, 50.0);
    u.set_delta_time(1.0 / 60.0);
    u
}

fn flock(count: usize, seed: u64) -> Vec<Agent> {
    let mut rng = StdRng::seed_from_u64(seed);
    AgentStore::randomized(count, WORLD, 60.0, &mut rng).agents().to_vec()
}

#[test]
fn test_stage_entry_points_are_unique() {
    let mut names: Vec<_> = Stage::ORDER.iter().map(|s| s.entry_point()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 4);
}

#[test]
fn test_agents_stay_inside_world() {
    let mut agents = flock(200, 1);
    let u = uniforms();
    for _ in 0..300 {
        HostFlock::step(&mut agents, &u);
    }
    for agent in &agents {
        let p = agent.position();
        assert!(p.x >= -WORLD.x / 2.0 && p.x < WORLD.x / 2.0, "x out of world: {}", p.x);
        assert!(p.y >= -WORLD.y / 2.0 && p.y < WORLD.y / 2.0, "y out of world: {}", p.y);
    }
}

#[test]
fn test_speed_never_exceeds_cap() {
    let mut agents = flock(200, 2);
    let mut u = uniforms();
    u.set(Control::CohesionWeight, 8.0);
    u.set(Control::MaxSpeed, 90.0);
    for _ in 0..120 {
        HostFlock::step(&mut agents, &u);
        for agent in &agents {
            assert!(agent.velocity().length() <= 90.0 + 1e-3);
        }
    }
}

#[test]
fn test_heading_tracks_velocity() {
    let mut agents = flock(50, 3);
    HostFlock::step(&mut agents, &uniforms());
    for agent in &agents {
        let v = agent.velocity();
        if v.length() > 1e-3 {
            let facing = Vec2::new(agent.heading().sin(), agent.heading().cos());
            assert!((facing - v.normalize()).length() < 1e-3);
        }
    }
}

#[test]
fn test_paused_frame_changes_nothing() {
    let mut agents = flock(100, 4);
    let before = agents.clone();
    let mut u = uniforms();
    u.set_delta_time(0.0);
    HostFlock::step(&mut agents, &u);
    for (a, b) in agents.iter().zip(&before) {
        assert_eq!(a.position(), b.position());
        assert_eq!(a.velocity(), b.velocity());
    }
}

#[test]
fn test_zero_weights_give_straight_lines() {
    let mut agents = flock(100, 5);
    let mut u = uniforms();
    for control in [Control::AlignmentWeight, Control::CohesionWeight, Control::SeparationWeight] {
        u.set(control, 0.0);
    }
    let before = agents.clone();
    HostFlock::step(&mut agents, &u);
    for (a, b) in agents.iter().zip(&before) {
        assert_eq!(a.velocity(), b.velocity());
        let expected = wrap(b.position() + b.velocity() * u.delta_time(), WORLD);
        assert!((a.position() - expected).length() < 1e-3);
    }
}

#[test]
fn test_alignment_converges_headings() {
    // Two close agents with perpendicular velocities and only alignment on.
    let mut agents = vec![
        Agent::new(Vec2::ZERO, Vec2::new(40.0, 0.0)),
        Agent::new(Vec2::new(10.0, 0.0), Vec2::new(0.0, 40.0)),
    ];
    let mut u = uniforms();
    u.set(Control::CohesionWeight, 0.0);
    u.set(Control::SeparationWeight, 0.0);
    u.set(Control::AlignmentWeight, 4.0);

    let spread = |agents: &[Agent]| agents[0].velocity().angle_to(agents[1].velocity()).abs();
    let start = spread(&agents);
    for _ in 0..30 {
        HostFlock::step(&mut agents, &u);
    }
    assert!(spread(&agents) < start);
}
