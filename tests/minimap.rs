//! Integration tests for the minimap projection and its frame batches.

use flockview::agent::{Agent, AgentStore};
use flockview::batch::{LineBatch, PointBatch};
use flockview::camera::{Camera, Rect};
use flockview::minimap::{Minimap, OUTLINE_COLOR};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

const SCREEN: Vec2 = Vec2::new(1024.0, 768.0);

#[test]
fn test_every_agent_lands_inside_minimap_view() {
    let mut rng = StdRng::seed_from_u64(9);
    let store = AgentStore::randomized(500, SCREEN * 4.0, 60.0, &mut rng);
    let minimap = Minimap::new(SCREEN, 4.0, 0.25);
    let view = minimap.camera().rect();

    let inside = view.count_contained(store.iter().map(|a| minimap.to_minimap(a.position())));
    assert_eq!(inside, store.len());
}

#[test]
fn test_outline_follows_main_camera() {
    let minimap = Minimap::new(SCREEN, 4.0, 0.25);
    let store = AgentStore::from_agents(vec![Agent::new(Vec2::ZERO, Vec2::X)]);
    let mut camera = Camera::main(SCREEN, 4.0);
    camera.set_zoom(2.0);
    camera.set_position(Vec2::new(500.0, 250.0));

    let mut points = PointBatch::new(store.len());
    let mut lines = LineBatch::default();
    minimap.update(&camera, &store, &mut points, &mut lines);

    let outline = lines.take_vertices().unwrap();
    assert_eq!(outline.len(), 8);
    assert!(outline.iter().all(|v| v.color == OUTLINE_COLOR.to_array()));

    let expected = minimap.rect_to_minimap(&camera.rect());
    let xs: Vec<f32> = outline.iter().map(|v| v.position[0]).collect();
    let ys: Vec<f32> = outline.iter().map(|v| v.position[1]).collect();
    let min = Vec2::new(xs.iter().cloned().fold(f32::MAX, f32::min), ys.iter().cloned().fold(f32::MAX, f32::min));
    let max = Vec2::new(xs.iter().cloned().fold(f32::MIN, f32::max), ys.iter().cloned().fold(f32::MIN, f32::max));
    assert!((min - expected.min()).length() < 1e-3);
    assert!((max - expected.max()).length() < 1e-3);
}

#[test]
fn test_whole_world_outline_matches_minimap_view() {
    let minimap = Minimap::new(SCREEN, 4.0, 0.25);
    let mut camera = Camera::main(SCREEN, 4.0);
    camera.set_zoom(4.0);

    let outline = minimap.rect_to_minimap(&camera.rect());
    let view: Rect = minimap.camera().rect();
    assert!(view.contains_rect(&outline, 1e-3));
    assert!((outline.size() - view.size()).length() < 1e-3);
}

#[test]
fn test_batches_are_taken_once_per_frame() {
    let minimap = Minimap::new(SCREEN, 4.0, 0.25);
    let store = AgentStore::from_agents(vec![Agent::new(Vec2::ZERO, Vec2::X); 3]);
    let camera = Camera::main(SCREEN, 4.0);
    let mut points = PointBatch::new(store.len());
    let mut lines = LineBatch::default();

    minimap.update(&camera, &store, &mut points, &mut lines);
    assert_eq!(points.take_vertices().map(|v| v.len()), Some(3));
    assert!(points.take_vertices().is_none());
    assert!(lines.take_vertices().is_some());
    assert!(lines.take_vertices().is_none());
}

#[test]
fn test_minimap_ndc_round_trip() {
    let minimap = Minimap::new(SCREEN, 4.0, 0.25);
    let camera = minimap.camera();
    let half_world = SCREEN * 4.0 / 2.0;

    let mut rng = StdRng::seed_from_u64(11);
    let store = AgentStore::randomized(200, SCREEN * 4.0, 1.0, &mut rng);
    let corners = [half_world, -half_world, Vec2::new(half_world.x, -half_world.y)];
    let points = store.iter().map(|a| a.position()).chain(corners).chain([Vec2::ZERO]);

    for p in points {
        let ndc = camera.world_to_ndc(minimap.to_minimap(p));
        assert!(ndc.abs().max_element() <= 1.0 + 1e-4, "{p} left the minimap: {ndc}");
        let back = minimap.to_world(camera.ndc_to_world(ndc));
        assert!((back - p).length() < 1e-2, "{p} came back as {back}");
    }

    // World corners sit on the minimap's clip-space corners (+y down).
    let corner = camera.world_to_ndc(minimap.to_minimap(half_world));
    assert!((corner - Vec2::new(1.0, -1.0)).length() < 1e-4);
}
