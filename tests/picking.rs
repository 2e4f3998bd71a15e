//! Integration tests for picking and recolouring through a whole scene.

use flockview::agent::{Agent, AgentStore};
use flockview::input::{Input, MouseButton};
use flockview::scene::{Scene, SceneConfig};
use flockview::uniforms::SimulationUniforms;
use glam::{Vec2, Vec4};

const SCREEN: Vec2 = Vec2::new(800.0, 600.0);

fn scene(points: &[Vec2]) -> Scene {
    let config = SceneConfig {
        screen_size: SCREEN,
        world_multiplier: 4.0,
        minimap_fraction: 0.25,
        pick_radius: 10.0,
    };
    let store = AgentStore::from_agents(points.iter().map(|p| Agent::new(*p, Vec2::X)).collect());
    let uniforms = SimulationUniforms::new(SCREEN * 4.0, 50.0);
    Scene::new(&config, store, uniforms)
}

fn click_at(pointer: Vec2) -> Input {
    let mut input = Input::new();
    input.set_mouse_position(pointer);
    input.press_mouse(MouseButton::Left);
    input
}

#[test]
fn test_click_selects_nearest_agent() {
    let mut scene = scene(&[Vec2::new(6.0, 0.0), Vec2::new(2.0, 1.0), Vec2::new(-300.0, 0.0)]);
    // Screen centre is the world origin at zoom 1.
    let picked = scene.update(&click_at(SCREEN / 2.0), 0.016, 0.016);
    assert_eq!(picked, Some(1));
    assert_eq!(scene.interaction.selection().index(), Some(1));
}

#[test]
fn test_click_on_empty_space_keeps_selection() {
    let mut scene = scene(&[Vec2::ZERO]);
    scene.update(&click_at(SCREEN / 2.0), 0.016, 0.016);
    assert_eq!(scene.interaction.selection().index(), Some(0));

    let picked = scene.update(&click_at(Vec2::new(10.0, 10.0)), 0.016, 0.016);
    assert_eq!(picked, None);
    assert_eq!(scene.interaction.selection().index(), Some(0));
}

#[test]
fn test_equidistant_agents_pick_lower_index() {
    let mut scene = scene(&[Vec2::new(5.0, 0.0), Vec2::new(-5.0, 0.0)]);
    assert_eq!(scene.update(&click_at(SCREEN / 2.0), 0.016, 0.016), Some(0));
}

#[test]
fn test_pick_follows_zoom() {
    let mut scene = scene(&[Vec2::new(400.0, 0.0)]);
    scene.camera.set_zoom(2.0);
    // At zoom 2 one pixel covers two world units.
    let pointer = SCREEN / 2.0 + Vec2::new(200.0, 0.0);
    assert_eq!(scene.update(&click_at(pointer), 0.016, 0.016), Some(0));
}

#[test]
fn test_held_button_does_not_repeat_selection() {
    let mut scene = scene(&[Vec2::ZERO]);
    let mut input = click_at(SCREEN / 2.0);
    assert_eq!(scene.update(&input, 0.016, 0.016), Some(0));
    input.begin_frame();
    assert_eq!(scene.update(&input, 0.016, 0.016), None);
}

#[test]
fn test_recolor_uploads_color_only() {
    let mut scene = scene(&[Vec2::new(40.0, 0.0), Vec2::ZERO]);
    scene.update(&click_at(SCREEN / 2.0), 0.016, 0.016);
    scene.points.take_vertices();
    scene.set_selected_color(Vec4::new(0.1, 0.8, 0.2, 1.0)).unwrap();

    let writes = scene.store.take_uploads();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].offset, (Agent::SIZE + 48) as u64);
    assert_eq!(writes[0].bytes.len(), 16);

    // The new colour reaches the minimap on the next frame.
    scene.update(&Input::new(), 0.016, 0.016);
    let points = scene.points.take_vertices().unwrap();
    assert_eq!(points[1].color, [0.1, 0.8, 0.2]);
}

#[test]
fn test_recolor_without_selection_is_noop() {
    let mut scene = scene(&[Vec2::ZERO]);
    scene.set_selected_color(Vec4::ONE).unwrap();
    assert!(!scene.store.has_pending_uploads());
}
