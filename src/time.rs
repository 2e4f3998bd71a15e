//! Frame timing.
//!
//! [`FrameClock`] measures the wall time between frames and turns it into
//! the simulation's delta time. Long stalls (window drags, debugger breaks)
//! are clamped so a single frame never integrates more than
//! [`MAX_DELTA`] seconds.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // Once per frame:
//! let dt = clock.tick();
//! uniforms.set_delta_time(dt);
//! ```

use std::time::{Duration, Instant};

/// Largest delta time handed to the simulation, in seconds.
pub const MAX_DELTA: f32 = 0.1;

/// Delta time, fps and pause state for the frame loop.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    frame_secs: f32,
    delta_secs: f32,
    elapsed_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            frame_secs: 0.0,
            delta_secs: 0.0,
            elapsed_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
        }
    }

    /// Advance to a new frame and return its simulation delta time.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.advance(raw)
    }

    /// Fold a measured frame duration into the clock.
    fn advance(&mut self, raw_delta: f32) -> f32 {
        self.frame_secs = raw_delta.clamp(0.0, MAX_DELTA);
        self.delta_secs = if self.paused { 0.0 } else { self.frame_secs };
        self.elapsed_secs += self.delta_secs;
        self.delta_secs
    }

    /// Simulation delta of the current frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Wall time of the current frame, clamped but unaffected by pause.
    #[inline]
    pub fn frame_delta(&self) -> f32 {
        self.frame_secs
    }

    /// Simulated seconds, excluding paused time.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// While paused every frame reports a delta of 0, which freezes the
    /// agents but keeps rendering and input live.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
