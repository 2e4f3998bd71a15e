//! Non-blocking device-to-host readback of the agent buffer.
//!
//! Two staging buffers take turns: while one is being mapped by the driver,
//! the next frame copies into the other. Completion is observed with a
//! non-blocking poll, so the frame loop never waits on the GPU. Results are
//! therefore one or two frames old.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::error::GpuError;

/// Number of staging slots.
pub const SLOTS: usize = 2;

/// Lifecycle of one staging slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SlotState {
    Idle,
    /// A copy has been encoded but not yet submitted for mapping.
    Copied { serial: u64, revision: u64 },
    /// `map_async` is in flight.
    Mapping { serial: u64, revision: u64 },
}

/// Slot bookkeeping without any GPU objects.
///
/// `serial` numbers copies in encode order so a late completion of an older
/// copy never replaces a newer one. `revision` is the agent store revision
/// the copy was taken at.
#[derive(Debug)]
pub struct ReadbackRing {
    slots: [SlotState; SLOTS],
    next: usize,
    next_serial: u64,
    delivered: Option<u64>,
}

impl ReadbackRing {
    pub fn new() -> Self {
        Self {
            slots: [SlotState::Idle; SLOTS],
            next: 0,
            next_serial: 0,
            delivered: None,
        }
    }

    pub fn state(&self, slot: usize) -> SlotState {
        self.slots[slot]
    }

    /// Reserve an idle slot for a copy taken at `revision`.
    ///
    /// Returns `None` when every slot is busy; the copy is then skipped.
    pub fn acquire(&mut self, revision: u64) -> Option<usize> {
        let slot = (0..SLOTS)
            .map(|i| (self.next + i) % SLOTS)
            .find(|&i| self.slots[i] == SlotState::Idle)?;
        self.slots[slot] = SlotState::Copied {
            serial: self.next_serial,
            revision,
        };
        self.next_serial += 1;
        self.next = (slot + 1) % SLOTS;
        Some(slot)
    }

    /// Move every copied slot to mapping and return their indices.
    pub fn start_mapping(&mut self) -> Vec<usize> {
        let mut started = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let SlotState::Copied { serial, revision } = *slot {
                *slot = SlotState::Mapping { serial, revision };
                started.push(i);
            }
        }
        started
    }

    /// Finish a mapping. The slot becomes idle either way.
    ///
    /// Returns the revision to apply, or `None` when the map failed or a
    /// newer copy was already delivered.
    pub fn complete(&mut self, slot: usize, ok: bool) -> Option<u64> {
        let SlotState::Mapping { serial, revision } = self.slots[slot] else {
            return None;
        };
        self.slots[slot] = SlotState::Idle;
        if !ok || self.delivered.is_some_and(|d| d >= serial) {
            return None;
        }
        self.delivered = Some(serial);
        Some(revision)
    }

    pub fn is_mapping(&self, slot: usize) -> bool {
        matches!(self.slots[slot], SlotState::Mapping { .. })
    }
}

impl Default for ReadbackRing {
    fn default() -> Self {
        Self::new()
    }
}

type MapResult = Result<(), wgpu::BufferAsyncError>;

/// Staging buffers and pending maps for the agent buffer readback.
pub struct AgentReadback {
    staging: [wgpu::Buffer; SLOTS],
    receivers: [Option<Receiver<MapResult>>; SLOTS],
    ring: ReadbackRing,
    size: u64,
}

impl AgentReadback {
    pub fn new(device: &wgpu::Device, size: u64) -> Self {
        let staging = std::array::from_fn(|i| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(if i == 0 { "Agent Readback 0" } else { "Agent Readback 1" }),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        });
        Self {
            staging,
            receivers: [None, None],
            ring: ReadbackRing::new(),
            size,
        }
    }

    /// Encode a copy of `source` into a free slot. Returns `false` when
    /// both slots are still busy.
    pub fn encode_copy(&mut self, encoder: &mut wgpu::CommandEncoder, source: &wgpu::Buffer, revision: u64) -> bool {
        let Some(slot) = self.ring.acquire(revision) else {
            return false;
        };
        encoder.copy_buffer_to_buffer(source, 0, &self.staging[slot], 0, self.size);
        true
    }

    /// Start mapping the slots copied this frame. Call after submit.
    pub fn begin_map(&mut self) {
        for slot in self.ring.start_mapping() {
            let (tx, rx) = mpsc::channel();
            self.staging[slot]
                .slice(..)
                .map_async(wgpu::MapMode::Read, move |result| {
                    let _ = tx.send(result);
                });
            self.receivers[slot] = Some(rx);
        }
    }

    /// Collect finished maps without blocking.
    ///
    /// Returns the newest agent bytes and the revision they were copied at.
    pub fn poll(&mut self, device: &wgpu::Device) -> Option<(Vec<u8>, u64)> {
        if !(0..SLOTS).any(|i| self.ring.is_mapping(i)) {
            return None;
        }
        let _ = device.poll(wgpu::Maintain::Poll);

        let mut newest = None;
        for slot in 0..SLOTS {
            let status = match &self.receivers[slot] {
                Some(rx) => rx.try_recv(),
                None => continue,
            };
            match status {
                Ok(Ok(())) => {
                    let bytes = {
                        let view = self.staging[slot].slice(..).get_mapped_range();
                        view.to_vec()
                    };
                    self.staging[slot].unmap();
                    self.receivers[slot] = None;
                    if let Some(revision) = self.ring.complete(slot, true) {
                        newest = Some((bytes, revision));
                    }
                }
                Ok(Err(e)) => {
                    log::warn!("Agent readback: {}", GpuError::BufferMapping(e.to_string()));
                    self.receivers[slot] = None;
                    self.ring.complete(slot, false);
                }
                Err(TryRecvError::Disconnected) => {
                    log::warn!("Agent readback callback dropped");
                    self.receivers[slot] = None;
                    self.ring.complete(slot, false);
                }
                Err(TryRecvError::Empty) => {}
            }
        }
        if let Some((_, revision)) = &newest {
            log::debug!("Agent readback ready at revision {}", revision);
        }
        newest
    }
}
