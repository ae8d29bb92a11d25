//! Collaborator interfaces the host engine supplies.
//!
//! The agent never owns the level. It asks a navigable-surface oracle about
//! traversal, an entity registry about what exists, and optionally an
//! occlusion oracle about line of sight. All three are shared read-only so
//! several agents can run against one level.

use serde::{Deserialize, Serialize};

use crate::types::{Aabb, EntityKey, EntityKind, Vec3};

/// Result of a traversal raycast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    /// Whether something blocked the ray before the target.
    pub hit: bool,
    /// Distance travelled from the origin (to the hit, or to the target).
    pub distance: f32,
    /// Where the ray stopped.
    pub position: Vec3,
}

impl RayHit {
    /// An unobstructed ray that reached `target`.
    #[must_use]
    pub fn clear(origin: Vec3, target: Vec3) -> Self {
        Self {
            hit: false,
            distance: (target - origin).magnitude(),
            position: target,
        }
    }
}

/// Walkable-surface oracle: traversal raycasts and nearest-walkable queries.
pub trait NavSurface: Send + Sync {
    /// Walk from `origin` toward `target` along the surface.
    fn cast(&self, origin: Vec3, target: Vec3) -> RayHit;

    /// Nearest walkable point to `point` within `margin`, or `point` itself
    /// if nothing walkable is that close.
    fn snap(&self, point: Vec3, margin: f32) -> Vec3;

    /// Extents of the walkable surface.
    fn bounds(&self) -> Aabb;
}

/// One entity as listed by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntity {
    /// Stable key.
    pub key: EntityKey,
    /// Markup tag.
    pub kind: EntityKind,
    /// Current world position.
    pub position: Vec3,
    /// Bounding volume used for frustum and line-of-sight tests.
    pub bounds: Aabb,
    /// Committed to long-term memory when the agent is built.
    pub always_known: bool,
}

/// Source of the level's entities.
pub trait EntityRegistry: Send + Sync {
    /// Every entity currently in the level.
    fn entities(&self) -> Vec<RegistryEntity>;
}

/// Line-of-sight oracle.
pub trait Occlusion: Send + Sync {
    /// Whether the segment `from → to` is obstructed.
    fn blocked(&self, from: Vec3, to: Vec3) -> bool;
}
