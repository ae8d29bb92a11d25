//! Read-only views of an agent's internal state.
//!
//! Snapshots are plain serde data so a host can dump them as JSON next to a
//! playtest log, or print the grid as ASCII while debugging a level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GridBounds;
use crate::decay;
use crate::error::{Result, WayfarerError};
use crate::grid::{CellState, SpatialGrid};
use crate::memory::{ExploreMemory, MemoryStore, WaypointMemory};
use crate::types::{AgentId, EntityKey, EntityKind, Vec3};

/// One remembered entity as seen from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity key.
    pub key: EntityKey,
    /// Entity kind.
    pub kind: EntityKind,
    /// Remembered position.
    pub position: Vec3,
    /// Whether the agent reached it.
    pub visited: bool,
    /// Seconds since last perceived.
    pub impression_time: f32,
    /// Linear retention in `[0, 1]`.
    pub retention: f32,
    /// Long-term memory.
    pub unforgettable: bool,
}

/// Point-in-time copy of a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Owning agent.
    pub agent: AgentId,
    /// Wall-clock capture time.
    pub captured_at: DateTime<Utc>,
    /// Forget time in effect.
    pub forget_time: f32,
    /// Whether goals remain.
    pub goals_remaining: bool,
    /// Entity memories in key order.
    pub entities: Vec<EntitySnapshot>,
    /// Path memories, oldest first.
    pub paths: Vec<ExploreMemory>,
    /// Waypoint trail, oldest first.
    pub waypoints: Vec<WaypointMemory>,
}

impl MemorySnapshot {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns `WayfarerError::Serialization` if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| WayfarerError::Serialization(e.to_string()))
    }
}

impl MemoryStore {
    /// Copy the store for diagnostics.
    #[must_use]
    pub fn snapshot(&self, agent: AgentId) -> MemorySnapshot {
        let forget_time = self.forget_time();
        MemorySnapshot {
            agent,
            captured_at: Utc::now(),
            forget_time,
            goals_remaining: self.goals_remaining(),
            entities: self
                .entities()
                .map(|m| EntitySnapshot {
                    key: m.key(),
                    kind: m.kind(),
                    position: m.position(),
                    visited: m.visited(),
                    impression_time: m.impression_time,
                    retention: if m.unforgettable {
                        1.0
                    } else {
                        decay::retention(m.impression_time, forget_time)
                    },
                    unforgettable: m.unforgettable,
                })
                .collect(),
            paths: self.paths().to_vec(),
            waypoints: self.waypoints().iter().copied().collect(),
        }
    }
}

/// Occupancy summary of the spatial grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Columns (X).
    pub cols: usize,
    /// Rows (Z).
    pub rows: usize,
    /// Cell edge length.
    pub cell_size: f32,
    /// World extents.
    pub bounds: GridBounds,
    /// Explored cells.
    pub explored: usize,
    /// Obstacle cells.
    pub obstacles: usize,
}

impl SpatialGrid {
    /// Occupancy counts and layout.
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        let (cols, rows) = self.dimensions();
        GridSnapshot {
            cols,
            rows,
            cell_size: self.cell_size(),
            bounds: self.bounds(),
            explored: self.explored_count(),
            obstacles: self.obstacle_count(),
        }
    }

    /// One line per row, highest Z first: `.` unexplored, `o` explored,
    /// `#` obstacle.
    #[must_use]
    pub fn render_ascii(&self) -> String {
        let (cols, _) = self.dimensions();
        let mut out = String::with_capacity(self.cells().len() + self.cells().len() / cols.max(1));
        for row in self.cells().chunks(cols.max(1)).rev() {
            out.extend(row.iter().map(|cell| match cell {
                CellState::Unexplored => '.',
                CellState::Explored => 'o',
                CellState::Obstacle => '#',
            }));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WayfarerConfig;
    use crate::memory::PerceivedEntity;

    #[test]
    fn memory_snapshot_serializes() {
        let config = WayfarerConfig::default();
        let mut store = MemoryStore::new(&config, 0.0);
        store.memorize(&PerceivedEntity::new(EntityKey(1), EntityKind::GoalOptional, Vec3::zero()));
        store.commit_long_term(&PerceivedEntity::new(
            EntityKey(2),
            EntityKind::GoalCompletion,
            Vec3::unit_x(),
        ));
        store.push_waypoint(Vec3::zero(), false);
        store.decay(7.5);

        let snap = store.snapshot(AgentId::new());
        assert_eq!(snap.entities.len(), 2);
        assert!((snap.entities[0].retention - 0.5).abs() < 1e-5);
        assert_eq!(snap.entities[1].retention, 1.0);
        assert_eq!(snap.waypoints.len(), 1);

        let json = snap.to_json().expect("serializable");
        assert!(json.contains("captured_at"));
        let back: MemorySnapshot = serde_json::from_str(&json).expect("round trip");
        assert_eq!(back.entities, snap.entities);
    }

    #[test]
    fn ascii_has_highest_row_first() {
        let mut grid = SpatialGrid::new(
            GridBounds {
                min_x: 0.0,
                min_z: 0.0,
                max_x: 3.0,
                max_z: 2.0,
            },
            1.0,
        )
        .expect("valid grid");
        grid.fill(Vec3::new(0.5, 0.0, 0.5), CellState::Explored);
        grid.fill(Vec3::new(2.5, 0.0, 1.5), CellState::Obstacle);
        assert_eq!(grid.render_ascii(), "..#\no..\n");
        let snap = grid.snapshot();
        assert_eq!((snap.cols, snap.rows, snap.explored, snap.obstacles), (3, 2, 1, 1));
    }
}
