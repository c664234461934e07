//! Fixed-capacity, append-only store of raw frame snapshots.
use crate::frame::FrameSnapshot;

/// Snapshots indexed by admission order. Capacity is fixed at construction
/// and the store never holds more than `capacity` frames.
#[derive(Debug)]
pub struct SnapshotStore {
    snapshots: Vec<FrameSnapshot>,
    capacity: usize,
}

impl SnapshotStore {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot at index `frame_count`.
    /// Returns the snapshot back when the store is already full.
    pub fn push(&mut self, snapshot: FrameSnapshot) -> Result<usize, FrameSnapshot> {
        if self.is_full() {
            return Err(snapshot);
        }
        self.snapshots.push(snapshot);
        Ok(self.snapshots.len() - 1)
    }

    /// Number of stored frames, the append cursor.
    pub fn frame_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.snapshots.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn as_slice(&self) -> &[FrameSnapshot] {
        &self.snapshots
    }

    /// Session-clock timestamps of every stored frame, in admission order.
    pub fn timestamps(&self) -> Vec<u64> {
        self.snapshots.iter().map(FrameSnapshot::timestamp_ms).collect()
    }
}
