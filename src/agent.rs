//! Agent records and the host shadow copy of the agent buffer.
//!
//! The [`AgentStore`] mirrors the device-resident agent buffer byte for byte.
//! It is refreshed from the device once per frame (always one frame stale)
//! and collects host-side edits that must be uploaded before the next
//! compute dispatch.

use std::collections::BTreeMap;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec4};
use rand::Rng;

use crate::error::StoreError;

/// One simulated boid, laid out exactly as the WGSL `Agent` struct.
///
/// ```wgsl
/// struct Agent {
///     position: vec4<f32>, // [x, y, _, _]
///     velocity: vec4<f32>, // [x, y, _, _]
///     data: vec4<f32>,     // [heading, scale, _, _]
///     color: vec4<f32>,    // [r, g, b, a]
/// }
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Agent {
    pub position: [f32; 4],
    pub velocity: [f32; 4],
    pub data: [f32; 4],
    pub color: [f32; 4],
}

const _: () = assert!(std::mem::size_of::<Agent>() == 64, "size of Agent does not match WGSL");
const _: () = assert!(std::mem::offset_of!(Agent, velocity) == 16);
const _: () = assert!(std::mem::offset_of!(Agent, data) == 32);
const _: () = assert!(std::mem::offset_of!(Agent, color) == 48);

impl Agent {
    /// Size of one record in bytes.
    pub const SIZE: usize = std::mem::size_of::<Agent>();
    pub const DEFAULT_COLOR: [f32; 4] = [0.94, 0.015, 0.13, 1.0];
    pub const DEFAULT_SCALE: f32 = 16.0;

    /// Create an agent facing along its velocity.
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: [position.x, position.y, 0.0, 0.0],
            velocity: [velocity.x, velocity.y, 0.0, 0.0],
            data: [heading_of(velocity).unwrap_or(0.0), Self::DEFAULT_SCALE, 0.0, 0.0],
            color: Self::DEFAULT_COLOR,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.position[0], self.position[1])
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::new(self.velocity[0], self.velocity[1])
    }

    /// Orientation in radians; the facing direction is `(sin, cos)`.
    pub fn heading(&self) -> f32 {
        self.data[0]
    }

    pub fn scale(&self) -> f32 {
        self.data[1]
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.color)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position[0] = position.x;
        self.position[1] = position.y;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity[0] = velocity.x;
        self.velocity[1] = velocity.y;
    }
}

/// Heading for a velocity, or `None` for a zero vector.
pub fn heading_of(velocity: Vec2) -> Option<f32> {
    if velocity.length_squared() > 0.0 {
        Some(velocity.x.atan2(velocity.y))
    } else {
        None
    }
}

/// A region of an agent record that can be uploaded on its own.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AgentField {
    Color,
    /// The whole 64-byte record.
    Record,
}

impl AgentField {
    /// Byte offset within the record.
    pub const fn offset(self) -> usize {
        match self {
            AgentField::Color => std::mem::offset_of!(Agent, color),
            AgentField::Record => 0,
        }
    }

    /// Byte length of the region.
    pub const fn size(self) -> usize {
        match self {
            AgentField::Color => 16,
            AgentField::Record => Agent::SIZE,
        }
    }

    fn merge(self, other: AgentField) -> AgentField {
        if self == other {
            self
        } else {
            AgentField::Record
        }
    }
}

/// A pending host→device write into the agent buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct BufferWrite {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

/// Index-addressed arena of agents shared by picking, the minimap and the
/// edit upload path.
#[derive(Debug, Clone)]
pub struct AgentStore {
    agents: Vec<Agent>,
    pending: BTreeMap<usize, AgentField>,
    revision: u64,
    /// Writes already uploaded, tagged with the revision they created.
    /// Kept until a readback taken after them lands.
    uploaded: Vec<(u64, BufferWrite)>,
}

impl AgentStore {
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        Self {
            agents,
            pending: BTreeMap::new(),
            revision: 0,
            uploaded: Vec::new(),
        }
    }

    /// Scatter `count` agents uniformly over a world of `world_size`
    /// centred on the origin, each moving at `speed` in a random direction.
    pub fn randomized<R: Rng + ?Sized>(count: usize, world_size: Vec2, speed: f32, rng: &mut R) -> Self {
        let agents = (0..count)
            .map(|_| {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let dir = Vec2::new(angle.sin(), angle.cos());
                let position = Vec2::new(
                    rng.gen::<f32>() * world_size.x - world_size.x / 2.0,
                    rng.gen::<f32>() * world_size.y - world_size.y / 2.0,
                );
                let mut agent = Agent::new(position, dir * speed);
                agent.data[0] = angle;
                agent
            })
            .collect();
        Self::from_agents(agents)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Size of the device buffer backing this store.
    pub fn byte_len(&self) -> usize {
        self.agents.len() * Agent::SIZE
    }

    pub fn at(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter()
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.agents)
    }

    /// Incremented every time queued edits are drained for upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn has_pending_uploads(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Recolor one agent. Only the color field is queued for upload, so
    /// the simulated position and velocity on the device are left alone.
    pub fn set_color(&mut self, index: usize, color: Vec4) -> Result<(), StoreError> {
        let agent = self.get_mut(index)?;
        agent.color = color.to_array();
        self.mark(index, AgentField::Color);
        Ok(())
    }

    /// Edit a whole record. The full record is re-uploaded, which replaces
    /// the device state with this (one frame stale) copy.
    pub fn edit<F: FnOnce(&mut Agent)>(&mut self, index: usize, f: F) -> Result<(), StoreError> {
        f(self.get_mut(index)?);
        self.mark(index, AgentField::Record);
        Ok(())
    }

    /// Drain queued edits into buffer writes, ordered by offset.
    pub fn take_uploads(&mut self) -> Vec<BufferWrite> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let pending = std::mem::take(&mut self.pending);
        let writes: Vec<BufferWrite> = pending
            .into_iter()
            .map(|(index, field)| self.field_write(index, field))
            .collect();
        self.revision += 1;
        let revision = self.revision;
        self.uploaded
            .extend(writes.iter().cloned().map(|w| (revision, w)));
        writes
    }

    /// Replace the shadow copy with bytes read back from the device.
    ///
    /// `issued_at` is the store revision when the readback copy was encoded.
    /// Uploads made after that revision and edits still queued are laid back
    /// over the device bytes, so a late copy never rewinds a host edit while
    /// the simulated fields still advance. Returns how many such edits were
    /// re-applied.
    pub fn apply_readback(&mut self, bytes: &[u8], issued_at: u64) -> Result<usize, StoreError> {
        let expected = self.byte_len();
        if bytes.len() != expected {
            return Err(StoreError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        self.uploaded.retain(|(revision, _)| *revision > issued_at);

        let mut incoming = bytes.to_vec();
        for (_, write) in &self.uploaded {
            let start = write.offset as usize;
            incoming[start..start + write.bytes.len()].copy_from_slice(&write.bytes);
        }
        let queued: Vec<BufferWrite> = self
            .pending
            .iter()
            .map(|(&index, &field)| self.field_write(index, field))
            .collect();
        for write in &queued {
            let start = write.offset as usize;
            incoming[start..start + write.bytes.len()].copy_from_slice(&write.bytes);
        }

        bytemuck::cast_slice_mut::<Agent, u8>(&mut self.agents).copy_from_slice(&incoming);
        Ok(self.uploaded.len() + queued.len())
    }

    fn field_write(&self, index: usize, field: AgentField) -> BufferWrite {
        let record = bytemuck::bytes_of(&self.agents[index]);
        let start = field.offset();
        BufferWrite {
            offset: (index * Agent::SIZE + start) as u64,
            bytes: record[start..start + field.size()].to_vec(),
        }
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Agent, StoreError> {
        let len = self.agents.len();
        self.agents
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { index, len })
    }

    fn mark(&mut self, index: usize, field: AgentField) {
        self.pending
            .entry(index)
            .and_modify(|existing| *existing = existing.merge(field))
            .or_insert(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store(n: usize) -> AgentStore {
        let mut rng = StdRng::seed_from_u64(7);
        AgentStore::randomized(n, Vec2::new(400.0, 300.0), 10.0, &mut rng)
    }

    #[test]
    fn test_randomized_agents_inside_world() {
        let store = store(500);
        assert_eq!(store.len(), 500);
        for agent in store.iter() {
            let p = agent.position();
            assert!(p.x >= -200.0 && p.x <= 200.0);
            assert!(p.y >= -150.0 && p.y <= 150.0);
            assert!((agent.velocity().length() - 10.0).abs() < 1e-3);
            assert_eq!(agent.scale(), Agent::DEFAULT_SCALE);
        }
    }

    #[test]
    fn test_heading_matches_velocity() {
        let agent = Agent::new(Vec2::ZERO, Vec2::new(1.0, 0.0));
        assert!((agent.heading() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(heading_of(Vec2::ZERO), None);
    }

    #[test]
    fn test_color_edit_uploads_only_color_field() {
        let mut store = store(4);
        store.set_color(2, Vec4::new(0.0, 1.0, 0.0, 1.0)).unwrap();
        let writes = store.take_uploads();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].offset, (2 * Agent::SIZE + 48) as u64);
        let color: &[f32] = bytemuck::cast_slice(&writes[0].bytes);
        assert_eq!(color, &[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(store.revision(), 1);
        assert!(store.take_uploads().is_empty());
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_mixed_edits_merge_into_record() {
        let mut store = store(3);
        store.set_color(1, Vec4::ONE).unwrap();
        store.edit(1, |a| a.set_velocity(Vec2::ZERO)).unwrap();
        store.set_color(0, Vec4::ONE).unwrap();
        let writes = store.take_uploads();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].offset, 48);
        assert_eq!(writes[1].offset, Agent::SIZE as u64);
        assert_eq!(writes[1].bytes.len(), Agent::SIZE);
    }

    #[test]
    fn test_out_of_range_edit() {
        let mut store = store(2);
        assert_eq!(
            store.set_color(5, Vec4::ONE),
            Err(StoreError::IndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_readback_size_mismatch() {
        let mut store = store(2);
        let err = store.apply_readback(&[0u8; 64], 0).unwrap_err();
        assert_eq!(err, StoreError::SizeMismatch { expected: 128, actual: 64 });
    }

    /// Device bytes for `store` with every position moved by `by`.
    fn moved(store: &AgentStore, by: Vec2) -> Vec<u8> {
        let mut agents = store.agents().to_vec();
        for agent in &mut agents {
            agent.set_position(agent.position() + by);
        }
        bytemuck::cast_slice(&agents[..]).to_vec()
    }

    #[test]
    fn test_stale_readback_does_not_erase_edit() {
        let mut store = store(2);
        let issued_at = store.revision();
        let start = store.at(0).unwrap().position();
        let blue = [0.0, 0.0, 1.0, 1.0];

        store.set_color(0, Vec4::from_array(blue)).unwrap();
        // Still queued: colour kept, position follows the device.
        let device_bytes = moved(&store, Vec2::X);
        assert_eq!(store.apply_readback(&device_bytes, issued_at), Ok(1));
        assert_eq!(store.at(0).unwrap().color, blue);
        assert_eq!(store.at(0).unwrap().position(), start + Vec2::X);
        assert!(store.has_pending_uploads());

        store.take_uploads();
        // Uploaded after the copy was issued: same outcome.
        let device_bytes = moved(&store, Vec2::X);
        assert_eq!(store.apply_readback(&device_bytes, issued_at), Ok(1));
        assert_eq!(store.at(0).unwrap().color, blue);
        assert!((store.at(0).unwrap().position() - (start + Vec2::X * 2.0)).length() < 1e-3);

        // A copy taken after the upload needs nothing re-applied.
        let fresh = store.as_bytes().to_vec();
        assert_eq!(store.apply_readback(&fresh, store.revision()), Ok(0));
    }

    #[test]
    fn test_dragged_color_keeps_shadow_moving() {
        let mut store = store(1);
        let mut issued_at = store.revision();
        let start = store.at(0).unwrap().position();

        // Every frame uploads a new colour while an older copy lands.
        for frame in 1..=5u32 {
            let shade = frame as f32 / 5.0;
            store.set_color(0, Vec4::new(shade, 0.0, 0.0, 1.0)).unwrap();
            store.take_uploads();
            let device_bytes = moved(&store, Vec2::Y);
            store.apply_readback(&device_bytes, issued_at).unwrap();
            issued_at = store.revision();

            assert_eq!(store.at(0).unwrap().color, [shade, 0.0, 0.0, 1.0]);
            let expected = start + Vec2::Y * frame as f32;
            assert!((store.at(0).unwrap().position() - expected).length() < 1e-3);
        }
    }
}
