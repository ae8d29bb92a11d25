//! Waypoint history: a bounded trail of where the agent has been.
//!
//! Waypoints are not decayed by time. The history is a ring buffer: once it
//! is full, each push evicts the oldest entry.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::Vec3;

/// One sampled point of the agent's trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaypointMemory {
    /// Agent position when sampled.
    pub position: Vec3,
    /// Whether the agent was at its destination at the time.
    pub was_target: bool,
}

/// Fixed-capacity FIFO of waypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointHistory {
    entries: VecDeque<WaypointMemory>,
    capacity: usize,
}

impl WaypointHistory {
    /// An empty history holding at most `capacity` entries (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a waypoint, evicting the oldest if full. Returns the evicted entry.
    pub fn push(&mut self, waypoint: WaypointMemory) -> Option<WaypointMemory> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(waypoint);
        evicted
    }

    /// Number of stored waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no waypoint has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent waypoint.
    #[must_use]
    pub fn latest(&self) -> Option<&WaypointMemory> {
        self.entries.back()
    }

    /// Waypoints from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &WaypointMemory> {
        self.entries.iter()
    }

    /// Drop every waypoint.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
