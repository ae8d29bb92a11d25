//! Perception: what the agent can see right now.
//!
//! Every `perception_compute_time` seconds the agent looks through a camera
//! at eye height along its current heading. An entity is visible when its
//! bounding volume touches the view frustum and at least one probe (a box
//! corner or the center) has clear line of sight to the eye. Visible
//! entities are memorized and shielded from decay while they stay in view.
//!
//! Perception also owns the directional "can I walk there" raycast used by
//! the exploration fan, which writes obstacles into the spatial grid.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::PerceptionConfig;
use crate::grid::{CellState, SpatialGrid};
use crate::memory::{MemoryStore, PerceivedEntity};
use crate::oracle::{EntityRegistry, NavSurface, Occlusion, RayHit};
use crate::timer::IntervalTimer;
use crate::types::{Aabb, EntityKey, EntityKind, Vec3, aabb_corners, planar_direction, rotate_y};

// ---------------------------------------------------------------------------
// Frustum
// ---------------------------------------------------------------------------

/// Symmetric perspective frustum with a level (un-pitched) camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    eye: Vec3,
    forward: Vec3,
    right: Vec3,
    tan_half_h: f32,
    tan_half_v: f32,
    near: f32,
    far: f32,
}

impl Frustum {
    /// Camera at `eye` looking along the planar `heading`.
    #[must_use]
    pub fn new(eye: Vec3, heading: Vec3, config: &PerceptionConfig) -> Self {
        let forward = planar_direction(heading).unwrap_or_else(Vec3::unit_z);
        Self {
            eye,
            forward,
            right: rotate_y(forward, 90.0),
            tan_half_h: (config.horizontal_fov.clamp(0.0, 179.0) * 0.5).to_radians().tan(),
            tan_half_v: (config.vertical_fov.clamp(0.0, 179.0) * 0.5).to_radians().tan(),
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// Camera position.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    /// Whether `point` is inside the frustum.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        let rel = point - self.eye;
        let depth = rel.dot(self.forward);
        if depth < self.near || depth > self.far {
            return false;
        }
        rel.dot(self.right).abs() <= depth * self.tan_half_h && rel.y.abs() <= depth * self.tan_half_v
    }

    /// Whether `aabb` touches the frustum, or the camera is inside the box.
    ///
    /// Tests the box against the six bounding planes, so a box much larger
    /// than the view (a long wall crossing it) is seen even when none of its
    /// corners are. Conservative near frustum edges.
    #[must_use]
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        if aabb.contains_point(self.eye) {
            return true;
        }
        self.planes().iter().all(|&(normal, offset)| {
            let nearest = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            normal.dot(nearest - self.eye) >= offset
        })
    }

    /// Inward plane normals with their offset from the eye.
    fn planes(&self) -> [(Vec3, f32); 6] {
        let up = Vec3::unit_y();
        [
            (self.forward, self.near),
            (-self.forward, -self.far),
            (self.forward * self.tan_half_h - self.right, 0.0),
            (self.forward * self.tan_half_h + self.right, 0.0),
            (self.forward * self.tan_half_v - up, 0.0),
            (self.forward * self.tan_half_v + up, 0.0),
        ]
    }
}

fn probes(aabb: &Aabb) -> [Vec3; 9] {
    let c = aabb_corners(aabb);
    [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7], aabb.center()]
}

/// Whether any probe of `aabb` can see `eye`. Without an occlusion oracle
/// nothing blocks.
#[must_use]
pub fn line_of_sight(aabb: &Aabb, eye: Vec3, occlusion: Option<&dyn Occlusion>) -> bool {
    match occlusion {
        None => true,
        Some(occlusion) => probes(aabb).iter().any(|p| !occlusion.blocked(*p, eye)),
    }
}

// ---------------------------------------------------------------------------
// Perception pass
// ---------------------------------------------------------------------------

/// Outcome of one perception pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerceptionReport {
    /// Entities in view, in key order.
    pub visible: Vec<EntityKey>,
    /// Entities memorized for the first time.
    pub discovered: Vec<(EntityKey, EntityKind)>,
}

/// Timed visibility sampling and the current visible set.
#[derive(Debug, Clone)]
pub struct Perception {
    config: PerceptionConfig,
    timer: IntervalTimer,
    visible: BTreeSet<EntityKey>,
}

impl Perception {
    /// A perception routine that runs on its first tick.
    #[must_use]
    pub fn new(config: &PerceptionConfig) -> Self {
        Self {
            config: config.clone(),
            timer: IntervalTimer::primed(config.perception_compute_time),
            visible: BTreeSet::new(),
        }
    }

    /// Advance the perception timer. Returns `true` when a pass is due.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.timer.advance(dt).is_some()
    }

    /// Entities seen by the last pass.
    #[must_use]
    pub fn visible(&self) -> &BTreeSet<EntityKey> {
        &self.visible
    }

    /// Horizontal field of view in degrees.
    #[must_use]
    pub fn horizontal_fov(&self) -> f32 {
        self.config.horizontal_fov
    }

    /// Sample the registry from `eye` along `heading`, replace the visible
    /// set and memorize everything in view.
    ///
    /// Entities that leave view become forgettable again.
    pub fn process_perception(
        &mut self,
        eye: Vec3,
        heading: Vec3,
        registry: &dyn EntityRegistry,
        occlusion: Option<&dyn Occlusion>,
        memory: &mut MemoryStore,
    ) -> PerceptionReport {
        let frustum = Frustum::new(eye, heading, &self.config);
        let mut report = PerceptionReport::default();
        let mut now_visible = BTreeSet::new();

        for entity in registry.entities() {
            if !frustum.intersects(&entity.bounds) || !line_of_sight(&entity.bounds, eye, occlusion) {
                continue;
            }
            now_visible.insert(entity.key);
            if memory.memorize(&PerceivedEntity::new(entity.key, entity.kind, entity.position)) {
                report.discovered.push((entity.key, entity.kind));
            }
            memory.set_forgettable(entity.key, false);
        }

        for key in self.visible.difference(&now_visible) {
            memory.set_forgettable(*key, true);
        }
        self.visible = now_visible;
        report.visible = self.visible.iter().copied().collect();

        debug!(
            visible = report.visible.len(),
            discovered = report.discovered.len(),
            "Perception pass"
        );
        report
    }
}

/// Cast along the planar `direction` from `origin` for up to `max_distance`.
///
/// A blocked ray marks the hit cell as an obstacle in `grid`. Returns `None`
/// for a degenerate direction.
pub fn explore_visibility_check(
    nav: &dyn NavSurface,
    grid: &mut SpatialGrid,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
) -> Option<RayHit> {
    let dir = planar_direction(direction)?;
    let hit = nav.cast(origin, origin + dir * max_distance.max(0.0));
    if hit.hit {
        grid.fill(hit.position, CellState::Obstacle);
    }
    Some(hit)
}
