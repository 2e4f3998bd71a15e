//! Minimap: the whole world scaled down into screen-sized space.
//!
//! The minimap is drawn by its own fixed camera into an offscreen texture
//! of `screen_size * fraction` pixels, then composited into the top-right
//! corner of the main view.

use glam::{Mat4, Vec2, Vec3};

use crate::agent::AgentStore;
use crate::batch::{LineBatch, PointBatch};
use crate::camera::{Camera, CameraPolicy, Rect};

/// Fraction of the screen the minimap covers on each axis.
pub const DEFAULT_FRACTION: f32 = 0.25;
/// Gap between the minimap and the screen edges, in NDC units.
pub const MARGIN: f32 = 0.025;
/// Outline colour of the main view.
pub const OUTLINE_COLOR: Vec3 = Vec3::new(1.0, 1.0, 0.0);

#[derive(Clone, Debug)]
pub struct Minimap {
    scale: f32,
    fraction: f32,
    screen_size: Vec2,
    camera: Camera,
}

impl Minimap {
    /// Minimap for a world `world_multiplier` times the screen size.
    pub fn new(screen_size: Vec2, world_multiplier: f32, fraction: f32) -> Self {
        let camera = Camera::new(screen_size, screen_size, 1.0, 1.0, CameraPolicy::fixed());
        Self {
            scale: 1.0 / world_multiplier,
            fraction: fraction.clamp(0.0, 1.0),
            screen_size,
            camera,
        }
    }

    /// World-to-minimap scale factor.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn to_minimap(&self, world: Vec2) -> Vec2 {
        world * self.scale
    }

    pub fn to_world(&self, minimap: Vec2) -> Vec2 {
        minimap / self.scale
    }

    pub fn rect_to_minimap(&self, rect: &Rect) -> Rect {
        Rect::new(
            rect.x * self.scale,
            rect.y * self.scale,
            rect.w * self.scale,
            rect.h * self.scale,
        )
    }

    /// Offscreen texture size in pixels, never zero.
    pub fn target_size(&self) -> (u32, u32) {
        let size = self.screen_size * self.fraction;
        ((size.x as u32).max(1), (size.y as u32).max(1))
    }

    /// Model matrix for the composite quad (unit quad in NDC).
    pub fn overlay_transform(&self) -> Mat4 {
        let f = self.fraction;
        let offset = 1.0 - f - MARGIN;
        Mat4::from_translation(Vec3::new(offset, offset, 0.0)) * Mat4::from_scale(Vec3::new(f, f, 1.0))
    }

    /// Queue this frame's minimap primitives: one point per agent and the
    /// outline of the main camera's view.
    pub fn update(
        &self,
        main: &Camera,
        store: &AgentStore,
        points: &mut PointBatch,
        lines: &mut LineBatch,
    ) {
        for agent in store.iter() {
            let color = agent.color().truncate();
            if !points.point(self.to_minimap(agent.position()), color) {
                break;
            }
        }
        lines.rect(&self.rect_to_minimap(&main.rect()), OUTLINE_COLOR);
    }
}
