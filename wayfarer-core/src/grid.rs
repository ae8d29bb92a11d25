//! Spatial memory grid: the agent's mental map of the play area.
//!
//! The XZ extents of the level are split into square cells. Each cell is
//! either never sampled, walked through, or known to block movement:
//!
//! ```text
//!   . . . # # . .      .  unexplored
//!   . o o o # . .      o  explored (agent stood here)
//!   . o o o o o .      #  obstacle (a raycast hit here)
//! ```
//!
//! Walking the grid along a ray tells the decision engine how much
//! unexplored space lies in a direction (information gain) and how far it can
//! expect to travel before hitting something, without asking the navigation
//! oracle.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{GridBounds, GridConfig};
use crate::error::{Result, WayfarerError};
use crate::oracle::NavSurface;
use crate::types::{Aabb, Vec3, planar_direction};

/// Occupancy of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Never sampled.
    #[default]
    Unexplored,
    /// The agent has been here.
    Explored,
    /// A raycast hit something here.
    Obstacle,
}

/// Result of walking the grid along a ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRaycast {
    /// Distance of the first obstacle (or grid edge), else the full cast distance.
    pub distance: f32,
    /// Unexplored cells sampled before stopping.
    pub num_unexplored: usize,
}

/// Discretized explored/obstacle/unexplored map over the level's XZ extents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialGrid {
    origin_x: f32,
    origin_z: f32,
    cell_size: f32,
    cols: usize,
    rows: usize,
    cells: Vec<CellState>,
}

impl SpatialGrid {
    /// A fully unexplored grid covering `bounds`.
    ///
    /// # Errors
    /// Returns `WayfarerError::Config` for a non-positive cell size or empty bounds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(bounds: GridBounds, cell_size: f32) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(WayfarerError::Config(format!("grid cell size must be > 0 (got {cell_size})")));
        }
        let width = bounds.max_x - bounds.min_x;
        let depth = bounds.max_z - bounds.min_z;
        if !(width > 0.0 && depth > 0.0) {
            return Err(WayfarerError::Config("grid bounds are empty".to_string()));
        }
        let cols = ((width / cell_size).ceil() as usize).max(1);
        let rows = ((depth / cell_size).ceil() as usize).max(1);
        Ok(Self {
            origin_x: bounds.min_x,
            origin_z: bounds.min_z,
            cell_size,
            cols,
            rows,
            cells: vec![CellState::Unexplored; cols * rows],
        })
    }

    /// Build from configuration, falling back to the navigable surface's
    /// extents when no explicit bounds are given.
    ///
    /// # Errors
    /// Returns `WayfarerError::Config` if the resulting layout is invalid.
    pub fn from_config(config: &GridConfig, nav_bounds: Aabb) -> Result<Self> {
        let bounds = config.bounds.unwrap_or(GridBounds {
            min_x: nav_bounds.min.x,
            min_z: nav_bounds.min.z,
            max_x: nav_bounds.max.x,
            max_z: nav_bounds.max.z,
        });
        Self::new(bounds, config.cell_size)
    }

    /// Columns (X) and rows (Z).
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Cell edge length.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space extents covered by the grid.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            min_x: self.origin_x,
            min_z: self.origin_z,
            max_x: self.origin_x + self.cols as f32 * self.cell_size,
            max_z: self.origin_z + self.rows as f32 * self.cell_size,
        }
    }

    /// Row-major cell states, `rows × cols`.
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Column and row of the cell under `position`, or `None` outside the grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn cell_index(&self, position: Vec3) -> Option<(usize, usize)> {
        let fx = (position.x - self.origin_x) / self.cell_size;
        let fz = (position.z - self.origin_z) / self.cell_size;
        if !(fx.is_finite() && fz.is_finite()) || fx < 0.0 || fz < 0.0 {
            return None;
        }
        let (col, row) = (fx.floor() as usize, fz.floor() as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    /// Flat index of the cell under `position`.
    ///
    /// # Errors
    /// Returns `WayfarerError::OutOfBounds` outside the grid.
    pub fn checked_index(&self, position: Vec3) -> Result<usize> {
        self.cell_index(position)
            .map(|(col, row)| row * self.cols + col)
            .ok_or(WayfarerError::OutOfBounds {
                x: position.x,
                z: position.z,
            })
    }

    /// State of the cell under `position`, or `None` outside the grid.
    #[must_use]
    pub fn cell_state(&self, position: Vec3) -> Option<CellState> {
        self.cell_index(position)
            .map(|(col, row)| self.cells[row * self.cols + col])
    }

    /// Mark the cell under `position`.
    ///
    /// Explored always wins (the agent stood there), an obstacle only claims
    /// unexplored cells, and nothing reverts a cell to unexplored. Positions
    /// outside the grid are logged and ignored.
    pub fn fill(&mut self, position: Vec3, state: CellState) {
        let index = match self.checked_index(position) {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, ?state, "Grid write ignored");
                return;
            }
        };
        let cell = &mut self.cells[index];
        match (state, *cell) {
            (CellState::Explored, _) | (CellState::Obstacle, CellState::Unexplored) => *cell = state,
            _ => {}
        }
    }

    /// Number of explored cells.
    #[must_use]
    pub fn explored_count(&self) -> usize {
        self.count(CellState::Explored)
    }

    /// Number of obstacle cells.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.count(CellState::Obstacle)
    }

    fn count(&self, state: CellState) -> usize {
        self.cells.iter().filter(|c| **c == state).count()
    }

    /// Walk the grid from `origin` along `direction` in `samples` equal steps
    /// up to `max_distance`.
    ///
    /// Counts unexplored cells and stops at the first obstacle cell or at the
    /// grid edge, reporting the distance of that sample. A degenerate
    /// direction yields a zero-length, zero-gain result.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn raycast_memory_map(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        samples: usize,
    ) -> GridRaycast {
        let Some(dir) = planar_direction(direction) else {
            return GridRaycast {
                distance: 0.0,
                num_unexplored: 0,
            };
        };
        let samples = samples.max(1);
        let step = max_distance.max(0.0) / samples as f32;
        let mut num_unexplored = 0;
        for i in 1..=samples {
            let distance = step * i as f32;
            match self.cell_state(origin + dir * distance) {
                None | Some(CellState::Obstacle) => {
                    return GridRaycast {
                        distance,
                        num_unexplored,
                    };
                }
                Some(CellState::Unexplored) => num_unexplored += 1,
                Some(CellState::Explored) => {}
            }
        }
        GridRaycast {
            distance: max_distance.max(0.0),
            num_unexplored,
        }
    }

    /// Clamp `point` to lie at least `margin` inside the grid's extents.
    #[must_use]
    pub fn clamp_inside(&self, point: Vec3, margin: f32) -> Vec3 {
        let b = self.bounds();
        let clamp = |v: f32, lo: f32, hi: f32| {
            if lo + margin <= hi - margin {
                v.clamp(lo + margin, hi - margin)
            } else {
                (lo + hi) * 0.5
            }
        };
        Vec3::new(clamp(point.x, b.min_x, b.max_x), point.y, clamp(point.z, b.min_z, b.max_z))
    }

    /// Nearest walkable point to `point`, kept `border_margin` inside the
    /// grid and snapped by the navigation oracle within `snap_margin`.
    #[must_use]
    pub fn closest_walkable(
        &self,
        nav: &dyn NavSurface,
        point: Vec3,
        border_margin: f32,
        snap_margin: f32,
    ) -> Vec3 {
        nav.snap(self.clamp_inside(point, border_margin), snap_margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SpatialGrid {
        SpatialGrid::new(
            GridBounds {
                min_x: 0.0,
                min_z: 0.0,
                max_x: 10.0,
                max_z: 10.0,
            },
            1.0,
        )
        .expect("valid grid")
    }

    #[test]
    fn rejects_bad_layouts() {
        let b = GridBounds {
            min_x: 0.0,
            min_z: 0.0,
            max_x: 10.0,
            max_z: 10.0,
        };
        assert!(SpatialGrid::new(b, 0.0).is_err());
        assert!(SpatialGrid::new(GridBounds { max_x: 0.0, ..b }, 1.0).is_err());
    }

    #[test]
    fn dimensions_cover_extents() {
        let g = SpatialGrid::new(
            GridBounds {
                min_x: -5.0,
                min_z: 0.0,
                max_x: 5.5,
                max_z: 3.0,
            },
            2.0,
        )
        .expect("valid grid");
        assert_eq!(g.dimensions(), (6, 2));
        assert_eq!(g.cells().len(), 12);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut g = grid();
        g.fill(Vec3::new(-1.0, 0.0, 5.0), CellState::Explored);
        g.fill(Vec3::new(5.0, 0.0, 10.0), CellState::Explored);
        assert_eq!(g.explored_count(), 0);
        assert!(g.cell_state(Vec3::new(11.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn checked_index_reports_position() {
        let g = grid();
        assert_eq!(g.checked_index(Vec3::new(1.5, 0.0, 2.5)).ok(), Some(21));
        let err = g.checked_index(Vec3::new(-3.0, 0.0, 1.0)).expect_err("outside");
        assert!(matches!(err, WayfarerError::OutOfBounds { x, .. } if (x + 3.0).abs() < 1e-6));
    }

    #[test]
    fn explored_is_never_downgraded() {
        let mut g = grid();
        let p = Vec3::new(2.5, 0.0, 2.5);
        g.fill(p, CellState::Obstacle);
        assert_eq!(g.cell_state(p), Some(CellState::Obstacle));
        g.fill(p, CellState::Explored);
        g.fill(p, CellState::Obstacle);
        g.fill(p, CellState::Unexplored);
        assert_eq!(g.cell_state(p), Some(CellState::Explored));
    }

    #[test]
    fn raycast_counts_unexplored_and_stops_at_obstacles() {
        let mut g = grid();
        let origin = Vec3::new(0.5, 0.0, 0.5);
        g.fill(Vec3::new(1.5, 0.0, 0.5), CellState::Explored);
        g.fill(Vec3::new(4.5, 0.0, 0.5), CellState::Obstacle);

        let hit = g.raycast_memory_map(origin, Vec3::unit_x(), 8.0, 8);
        assert!((hit.distance - 4.0).abs() < 1e-5);
        // Samples at x = 1.5 (explored), 2.5, 3.5 (unexplored), 4.5 (obstacle).
        assert_eq!(hit.num_unexplored, 2);
    }

    #[test]
    fn raycast_treats_grid_edge_as_wall() {
        let g = grid();
        let hit = g.raycast_memory_map(Vec3::new(8.5, 0.0, 0.5), Vec3::unit_x(), 5.0, 5);
        assert!((hit.distance - 2.0).abs() < 1e-5);
        assert_eq!(hit.num_unexplored, 1);
    }

    #[test]
    fn raycast_in_open_space_reaches_max_distance() {
        let g = grid();
        let hit = g.raycast_memory_map(Vec3::new(0.5, 0.0, 0.5), Vec3::unit_z(), 5.0, 10);
        assert!((hit.distance - 5.0).abs() < 1e-5);
        assert_eq!(hit.num_unexplored, 10);
    }

    #[test]
    fn degenerate_ray_is_empty() {
        let g = grid();
        let hit = g.raycast_memory_map(Vec3::new(5.0, 0.0, 5.0), Vec3::zero(), 5.0, 10);
        assert_eq!(hit.distance, 0.0);
        assert_eq!(hit.num_unexplored, 0);
    }

    #[test]
    fn clamp_inside_respects_margin() {
        let g = grid();
        let p = g.clamp_inside(Vec3::new(-4.0, 1.0, 12.0), 0.5);
        assert_eq!(p, Vec3::new(0.5, 1.0, 9.5));
    }
}
