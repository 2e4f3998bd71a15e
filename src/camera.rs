//! 2D orthographic camera with clamped zoom and bounded panning.
//!
//! World space is centred on the origin with +y pointing down the screen.
//! A camera frames a world-space rectangle whose size is the viewport size
//! scaled by the zoom factor, so larger zoom values show more of the world.
//! The same transform feeds rendering, visibility culling and picking.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::input::Input;

/// Zoom change per wheel notch.
pub const ZOOM_STEP: f32 = 0.125;
/// Smallest zoom the main camera accepts.
pub const MIN_ZOOM: f32 = 0.0625;
/// Pan speed in screen pixels per second at zoom 1.
pub const PAN_SPEED: f32 = 240.0;

/// Axis-aligned rectangle in world space, `(x, y)` being the minimum corner.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.w, self.y + self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    /// Whether `other` lies fully inside, allowing `eps` of float slack.
    pub fn contains_rect(&self, other: &Rect, eps: f32) -> bool {
        other.x >= self.x - eps
            && other.y >= self.y - eps
            && other.x + other.w <= self.x + self.w + eps
            && other.y + other.h <= self.y + self.h + eps
    }

    /// How many of `points` fall inside.
    pub fn count_contained(&self, points: impl IntoIterator<Item = Vec2>) -> usize {
        points.into_iter().filter(|p| self.contains_point(*p)).count()
    }
}

/// What a camera instance is allowed to do.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CameraPolicy {
    pub zoom: bool,
    pub pan: bool,
    /// Keep the visible rectangle inside the world.
    pub bounded: bool,
}

impl CameraPolicy {
    /// Main view: wheel zoom, keyboard pan, bounded by the world.
    pub fn interactive() -> Self {
        Self {
            zoom: true,
            pan: true,
            bounded: true,
        }
    }

    /// Fixed projection, ignores input.
    pub fn fixed() -> Self {
        Self {
            zoom: false,
            pan: false,
            bounded: false,
        }
    }
}

/// Camera matrices as laid out in the shaders' `Camera` uniform.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    /// `[zoom, 0, 0, 0]`
    pub zoom: [f32; 4],
}

/// Orthographic camera over a world of fixed half-extent.
#[derive(Clone, Debug)]
pub struct Camera {
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    /// Requested ceiling before fitting to the world.
    zoom_limit: f32,
    position: Vec2,
    viewport: Vec2,
    world_half_extent: Vec2,
    speed: f32,
    policy: CameraPolicy,
    rect: Rect,
}

impl Camera {
    /// Create a camera centred on the origin at zoom 1.
    ///
    /// For a bounded camera `max_zoom` is lowered so the visible
    /// rectangle can never outgrow the world.
    pub fn new(viewport: Vec2, world_size: Vec2, min_zoom: f32, max_zoom: f32, policy: CameraPolicy) -> Self {
        let mut camera = Self {
            zoom: 1.0,
            min_zoom,
            max_zoom: max_zoom.max(min_zoom),
            zoom_limit: max_zoom.max(min_zoom),
            position: Vec2::ZERO,
            viewport,
            world_half_extent: world_size / 2.0,
            speed: PAN_SPEED,
            policy,
            rect: Rect::default(),
        };
        camera.fit_zoom_range();
        camera.zoom = camera.clamp_zoom(1.0);
        camera.refresh();
        camera
    }

    /// Interactive main camera for a `world_multiplier`× world.
    pub fn main(viewport: Vec2, world_multiplier: f32) -> Self {
        Self::new(
            viewport,
            viewport * world_multiplier,
            MIN_ZOOM,
            world_multiplier,
            CameraPolicy::interactive(),
        )
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Effective zoom; always 1 when zoom is disabled.
    pub fn zoom(&self) -> f32 {
        if self.policy.zoom {
            self.zoom
        } else {
            1.0
        }
    }

    pub fn zoom_range(&self) -> (f32, f32) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn world_half_extent(&self) -> Vec2 {
        self.world_half_extent
    }

    pub fn policy(&self) -> CameraPolicy {
        self.policy
    }

    /// World-space rectangle currently framed by the camera.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Set the zoom, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            return;
        }
        self.zoom = self.clamp_zoom(zoom);
        // Zooming out near an edge can push the rect past the world.
        self.refresh();
    }

    /// Move the camera centre, edge-clamped when bounded.
    pub fn set_position(&mut self, position: Vec2) {
        if !position.is_finite() {
            return;
        }
        self.position = position;
        self.refresh();
    }

    /// Apply one frame of wheel zoom and keyboard panning.
    pub fn update(&mut self, input: &Input, dt: f32) {
        if self.policy.zoom {
            let notches = input.scroll_delta();
            if notches != 0.0 {
                // Wheel up zooms in.
                self.set_zoom(self.zoom - notches.signum() * ZOOM_STEP);
            }
        }
        if self.policy.pan {
            let dir = input.pan_direction();
            if dir != Vec2::ZERO {
                let step = dir * self.speed * self.zoom() * dt;
                self.set_position(self.position + step);
            }
        }
    }

    /// `inverse(translate(position) * scale(zoom))`
    pub fn view_matrix(&self) -> Mat4 {
        let zoom = self.zoom();
        let model = Mat4::from_translation(Vec3::new(self.position.x, self.position.y, 0.0))
            * Mat4::from_scale(Vec3::new(zoom, zoom, 1.0));
        model.inverse()
    }

    /// Orthographic projection over the viewport, +y down, depth 0..1.
    pub fn projection(&self) -> Mat4 {
        let half = self.viewport / 2.0;
        Mat4::orthographic_rh(-half.x, half.x, half.y, -half.y, 0.0, 1000.0)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view_matrix()
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view: self.view_matrix().to_cols_array_2d(),
            proj: self.projection().to_cols_array_2d(),
            zoom: [self.zoom(), 0.0, 0.0, 0.0],
        }
    }

    /// Map a window pixel (origin top-left) to world space.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.viewport / 2.0) * self.zoom() + self.rect.center()
    }

    /// Map a world point to window pixels.
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        (world - self.rect.center()) / self.zoom() + self.viewport / 2.0
    }

    /// Map a world point to normalized device coordinates.
    pub fn world_to_ndc(&self, world: Vec2) -> Vec2 {
        let clip = self.view_projection() * Vec4::new(world.x, world.y, 0.0, 1.0);
        Vec2::new(clip.x, clip.y) / clip.w
    }

    /// Inverse of [`Camera::world_to_ndc`].
    pub fn ndc_to_world(&self, ndc: Vec2) -> Vec2 {
        let world = self.view_projection().inverse() * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        Vec2::new(world.x, world.y) / world.w
    }

    /// Change the viewport size (window resize), keeping the centre.
    pub fn set_viewport(&mut self, viewport: Vec2) {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return;
        }
        self.viewport = viewport;
        self.fit_zoom_range();
        self.zoom = self.clamp_zoom(self.zoom);
        self.refresh();
    }

    fn fit_zoom_range(&mut self) {
        self.max_zoom = self.zoom_limit;
        if self.policy.bounded && self.viewport.x > 0.0 && self.viewport.y > 0.0 {
            let world = self.world_half_extent * 2.0;
            let fit = (world.x / self.viewport.x).min(world.y / self.viewport.y);
            self.max_zoom = self.max_zoom.min(fit).max(self.min_zoom);
        }
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Recompute the visible rectangle, pushing the camera back inside the
    /// world by exactly the overshoot on each axis.
    fn refresh(&mut self) {
        if self.policy.bounded {
            let size = self.viewport * self.zoom();
            self.position.x = clamp_axis(self.position.x, size.x, self.world_half_extent.x);
            self.position.y = clamp_axis(self.position.y, size.y, self.world_half_extent.y);
        }
        let size = self.viewport * self.zoom();
        self.rect = Rect::new(
            self.position.x - size.x / 2.0,
            self.position.y - size.y / 2.0,
            size.x,
            size.y,
        );
    }
}

fn clamp_axis(center: f32, size: f32, half_extent: f32) -> f32 {
    if size >= 2.0 * half_extent {
        return 0.0;
    }
    let min = center - size / 2.0;
    let max = center + size / 2.0;
    if min < -half_extent {
        center + (-half_extent - min)
    } else if max > half_extent {
        center - (max - half_extent)
    } else {
        center
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeyCode;

    fn main_camera() -> Camera {
        Camera::main(Vec2::new(1024.0, 768.0), 4.0)
    }

    #[test]
    fn test_count_contained() {
        let rect = Rect::new(-10.0, -10.0, 20.0, 20.0);
        let points = [Vec2::ZERO, Vec2::new(10.0, 10.0), Vec2::new(11.0, 0.0)];
        assert_eq!(rect.count_contained(points), 2);
    }

    #[test]
    fn test_zoom_clamps_to_floor() {
        let mut camera = main_camera();
        camera.set_zoom(0.01);
        assert_eq!(camera.zoom(), 0.0625);
        camera.set_zoom(100.0);
        assert_eq!(camera.zoom(), 4.0);
    }

    #[test]
    fn test_rect_from_zoom_and_position() {
        let mut camera = main_camera();
        camera.set_zoom(2.0);
        camera.set_position(Vec2::new(100.0, -50.0));
        let rect = camera.rect();
        assert_eq!(rect, Rect::new(100.0 - 1024.0, -50.0 - 768.0, 2048.0, 1536.0));
    }

    #[test]
    fn test_edge_clamp_adds_exact_overshoot() {
        let mut camera = main_camera();
        // World half extent is 2048 x 1536, rect half size is 512 x 384.
        camera.set_position(Vec2::new(1600.0, 0.0));
        assert_eq!(camera.position().x, 2048.0 - 512.0);
        camera.set_position(Vec2::new(1500.0, -1400.0));
        assert_eq!(camera.position(), Vec2::new(1500.0, -1536.0 + 384.0));
    }

    #[test]
    fn test_zoom_out_near_edge_stays_bounded() {
        let mut camera = main_camera();
        camera.set_position(Vec2::new(1536.0, 1152.0));
        camera.set_zoom(3.0);
        let world = Rect::new(-2048.0, -1536.0, 4096.0, 3072.0);
        assert!(world.contains_rect(&camera.rect(), 1e-3));
    }

    #[test]
    fn test_viewport_resize_refits_zoom() {
        let mut camera = main_camera();
        camera.set_zoom(4.0);
        camera.set_viewport(Vec2::new(2048.0, 768.0));
        assert_eq!(camera.zoom_range().1, 2.0);
        assert_eq!(camera.zoom(), 2.0);
        let world = Rect::new(-2048.0, -1536.0, 4096.0, 3072.0);
        assert!(world.contains_rect(&camera.rect(), 1e-3));
    }

    #[test]
    fn test_fixed_camera_ignores_input() {
        let mut camera = Camera::new(
            Vec2::new(1024.0, 768.0),
            Vec2::new(1024.0, 768.0),
            1.0,
            1.0,
            CameraPolicy::fixed(),
        );
        let mut input = Input::new();
        input.press_key(KeyCode::D);
        input.scroll(3.0);
        camera.update(&input, 1.0);
        assert_eq!(camera.position(), Vec2::ZERO);
        assert_eq!(camera.zoom(), 1.0);
    }

    #[test]
    fn test_pan_speed_scales_with_zoom() {
        let mut camera = main_camera().with_speed(100.0);
        camera.set_zoom(2.0);
        let mut input = Input::new();
        input.press_key(KeyCode::D);
        camera.update(&input, 0.5);
        assert!((camera.position().x - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_wheel_up_zooms_in() {
        let mut camera = main_camera();
        let mut input = Input::new();
        input.scroll(1.0);
        camera.update(&input, 0.0);
        assert_eq!(camera.zoom(), 1.0 - ZOOM_STEP);
    }

    #[test]
    fn test_screen_world_round_trip() {
        let mut camera = main_camera();
        camera.set_zoom(1.5);
        camera.set_position(Vec2::new(-300.0, 200.0));
        let world = Vec2::new(-120.0, 410.0);
        let back = camera.screen_to_world(camera.world_to_screen(world));
        assert!((back - world).length() < 1e-3);

        // The window centre is the camera centre.
        assert_eq!(camera.screen_to_world(camera.viewport() / 2.0), camera.position());
    }

    #[test]
    fn test_matrices_agree_with_screen_mapping() {
        let mut camera = main_camera();
        camera.set_zoom(0.5);
        camera.set_position(Vec2::new(40.0, 80.0));
        let rect = camera.rect();
        // Top-left corner of the rect lands on NDC (-1, 1).
        let ndc = camera.world_to_ndc(rect.min());
        assert!((ndc - Vec2::new(-1.0, 1.0)).length() < 1e-4);
        let ndc = camera.world_to_ndc(rect.max());
        assert!((ndc - Vec2::new(1.0, -1.0)).length() < 1e-4);
    }
}
