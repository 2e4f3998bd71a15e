//! Per-frame input state.
//!
//! [`Input`] is passed explicitly to the camera and the interaction
//! controller each frame instead of being captured by event listeners, so a
//! frame's input can be built by hand and replayed in tests:
//!
//! ```ignore
//! let mut input = Input::new();
//! input.press_key(KeyCode::D);
//! camera.update(&input, 1.0 / 60.0);
//! ```

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    fn from_winit(btn: WinitMouseButton) -> Option<Self> {
        match btn {
            WinitMouseButton::Left => Some(MouseButton::Left),
            WinitMouseButton::Right => Some(MouseButton::Right),
            WinitMouseButton::Middle => Some(MouseButton::Middle),
            _ => None,
        }
    }
}

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyW => KeyCode::W,
            WinitKeyCode::KeyA => KeyCode::A,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyD => KeyCode::D,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Keyboard and mouse state for one frame.
///
/// Tracks both edges (pressed this frame) and levels (currently held).
#[derive(Debug, Default, Clone)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,

    mouse_position: Vec2,
    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a key went down this frame.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Pointer position in window pixels, origin top-left.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Wheel notches this frame; positive scrolls up.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Unit-less pan direction from WASD and the arrow keys, +y down.
    pub fn pan_direction(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.key_held(KeyCode::W) || self.key_held(KeyCode::Up) {
            dir.y -= 1.0;
        }
        if self.key_held(KeyCode::S) || self.key_held(KeyCode::Down) {
            dir.y += 1.0;
        }
        if self.key_held(KeyCode::A) || self.key_held(KeyCode::Left) {
            dir.x -= 1.0;
        }
        if self.key_held(KeyCode::D) || self.key_held(KeyCode::Right) {
            dir.x += 1.0;
        }
        dir
    }

    pub fn press_key(&mut self, key: KeyCode) {
        // No repeat edges while held.
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        if self.mouse_held.insert(button) {
            self.mouse_pressed.insert(button);
        }
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
    }

    pub fn set_mouse_position(&mut self, position: Vec2) {
        self.mouse_position = position;
    }

    pub fn scroll(&mut self, notches: f32) {
        self.scroll_delta += notches;
    }

    /// Clear per-frame edges and the wheel delta. Call after the frame has
    /// consumed its input.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
        self.scroll_delta = 0.0;
    }

    /// Fold a winit window event into the state.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    let key = KeyCode::from(keycode);
                    match event.state {
                        ElementState::Pressed => self.press_key(key),
                        ElementState::Released => self.release_key(key),
                    }
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = MouseButton::from_winit(*button) {
                    match state {
                        ElementState::Pressed => self.press_mouse(btn),
                        ElementState::Released => self.release_mouse(btn),
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.set_mouse_position(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let notches = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                self.scroll(notches);
            }

            WindowEvent::Focused(false) => {
                self.keys_held.clear();
                self.mouse_held.clear();
            }

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(!input.key_held(KeyCode::Space));

        input.press_key(KeyCode::Space);
        assert!(input.key_held(KeyCode::Space));
        assert!(input.key_pressed(KeyCode::Space));

        // After begin_frame, pressed is cleared but held remains
        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));

        // Holding does not re-fire the edge
        input.press_key(KeyCode::Space);
        assert!(!input.key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_pan_direction() {
        let mut input = Input::new();
        input.press_key(KeyCode::W);
        input.press_key(KeyCode::D);
        assert_eq!(input.pan_direction(), Vec2::new(1.0, -1.0));

        input.press_key(KeyCode::S);
        assert_eq!(input.pan_direction(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_scroll_resets_each_frame() {
        let mut input = Input::new();
        input.scroll(1.0);
        input.scroll(2.0);
        assert_eq!(input.scroll_delta(), 3.0);
        input.begin_frame();
        assert_eq!(input.scroll_delta(), 0.0);
    }
}
