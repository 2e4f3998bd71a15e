//! CPU-side vertex batches for the point and line renderers.
//!
//! Submissions accumulate during a frame and are taken exactly once by the
//! renderer. Taking an empty batch yields `None`, so a second draw in the
//! same frame issues nothing.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::camera::Rect;

/// Default line capacity, in segments.
pub const DEFAULT_LINE_CAPACITY: usize = 1000;

/// Position and colour of one primitive vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl ColorVertex {
    pub fn new(position: Vec2, color: Vec3) -> Self {
        Self {
            position: position.to_array(),
            color: color.to_array(),
        }
    }
}

/// Shared storage for both batch kinds. `capacity` counts vertices.
#[derive(Debug)]
struct VertexBatch {
    vertices: Vec<ColorVertex>,
    capacity: usize,
    overflowed: bool,
    label: &'static str,
}

impl VertexBatch {
    fn new(label: &'static str, capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
            capacity,
            overflowed: false,
            label,
        }
    }

    fn push(&mut self, vertices: &[ColorVertex]) -> bool {
        if self.vertices.len() + vertices.len() > self.capacity {
            if !self.overflowed {
                log::warn!(
                    "{} batch is full ({} vertices), dropping submissions",
                    self.label,
                    self.capacity
                );
                self.overflowed = true;
            }
            return false;
        }
        self.vertices.extend_from_slice(vertices);
        true
    }

    fn take(&mut self) -> Option<Vec<ColorVertex>> {
        if self.vertices.is_empty() {
            return None;
        }
        let taken = std::mem::replace(&mut self.vertices, Vec::with_capacity(self.capacity));
        Some(taken)
    }
}

/// Points drawn as `PointList` vertices.
#[derive(Debug)]
pub struct PointBatch {
    inner: VertexBatch,
}

impl PointBatch {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: VertexBatch::new("point", capacity),
        }
    }

    /// Queue a point. Returns `false` when the batch is full.
    pub fn point(&mut self, position: Vec2, color: Vec3) -> bool {
        self.inner.push(&[ColorVertex::new(position, color)])
    }

    /// Pending vertices, leaving the batch empty.
    pub fn take_vertices(&mut self) -> Option<Vec<ColorVertex>> {
        self.inner.take()
    }

    pub fn len(&self) -> usize {
        self.inner.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.vertices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

/// Line segments drawn as `LineList` vertex pairs.
#[derive(Debug)]
pub struct LineBatch {
    inner: VertexBatch,
}

impl LineBatch {
    /// `capacity` is in segments.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: VertexBatch::new("line", capacity * 2),
        }
    }

    pub fn line(&mut self, from: Vec2, to: Vec2, color: Vec3) -> bool {
        self.inner
            .push(&[ColorVertex::new(from, color), ColorVertex::new(to, color)])
    }

    /// Queue the outline of `rect` as four segments, all or nothing.
    pub fn rect(&mut self, rect: &Rect, color: Vec3) -> bool {
        let a = rect.min();
        let c = rect.max();
        let b = Vec2::new(c.x, a.y);
        let d = Vec2::new(a.x, c.y);
        let v = |p| ColorVertex::new(p, color);
        self.inner
            .push(&[v(a), v(b), v(b), v(c), v(c), v(d), v(d), v(a)])
    }

    pub fn take_vertices(&mut self) -> Option<Vec<ColorVertex>> {
        self.inner.take()
    }

    /// Pending segments.
    pub fn len(&self) -> usize {
        self.inner.vertices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.inner.vertices.is_empty()
    }
}

impl Default for LineBatch {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_take_is_empty() {
        let mut points = PointBatch::new(4);
        points.point(Vec2::ZERO, Vec3::ONE);
        points.point(Vec2::X, Vec3::ONE);
        assert_eq!(points.take_vertices().map(|v| v.len()), Some(2));
        assert!(points.take_vertices().is_none());
        assert!(points.is_empty());
    }

    #[test]
    fn test_overflow_drops_submissions() {
        let mut points = PointBatch::new(2);
        assert!(points.point(Vec2::ZERO, Vec3::ONE));
        assert!(points.point(Vec2::ZERO, Vec3::ONE));
        assert!(!points.point(Vec2::ZERO, Vec3::ONE));
        assert_eq!(points.len(), 2);

        // Capacity frees up again once taken.
        points.take_vertices();
        assert!(points.point(Vec2::ZERO, Vec3::ONE));
    }

    #[test]
    fn test_rect_outline_is_closed() {
        let mut lines = LineBatch::new(8);
        let rect = Rect::new(0.0, 0.0, 4.0, 2.0);
        assert!(lines.rect(&rect, Vec3::new(1.0, 1.0, 0.0)));
        assert_eq!(lines.len(), 4);

        let v = lines.take_vertices().unwrap();
        assert_eq!(v.first().unwrap().position, [0.0, 0.0]);
        assert_eq!(v.last().unwrap().position, [0.0, 0.0]);
        assert_eq!(v[3].position, [4.0, 2.0]);
    }

    #[test]
    fn test_rect_is_all_or_nothing() {
        let mut lines = LineBatch::new(5);
        assert!(lines.rect(&Rect::new(0.0, 0.0, 1.0, 1.0), Vec3::ONE));
        assert!(!lines.rect(&Rect::new(0.0, 0.0, 1.0, 1.0), Vec3::ONE));
        assert_eq!(lines.len(), 4);
    }
}
