//! Core type definitions for the wayfarer agent.
//!
//! Positions are world-space `vek` vectors with Y up. All planar reasoning
//! (headings, exploration fans, the spatial grid) happens on the XZ plane.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// World-space vector (Y up).
pub type Vec3 = vek::Vec3<f32>;

/// Axis-aligned bounding volume.
pub type Aabb = vek::Aabb<f32>;

/// Directions shorter than this are treated as degenerate and skipped.
pub const DIRECTION_EPSILON: f32 = 1e-4;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Stable identity of a level entity, assigned by the entity registry.
///
/// Memory deduplication is keyed on this value, never on object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey(pub u64);

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Unique identifier for an agent instance, used to tag log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new random agent ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Entity Kinds
// ---------------------------------------------------------------------------

/// Markup tag describing what an entity means to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Must be reached to finish the level.
    GoalMandatory,
    /// Optional objective.
    GoalOptional,
    /// Level exit; only attractive once nothing else remains.
    GoalCompletion,
    /// Something worth looking at.
    PointOfInterest,
    /// Hostile creature.
    HazardEnemy,
    /// Environmental hazard (spikes, lava, ...).
    HazardEnvironment,
    /// Collectible tied to achievement.
    ResourceAchievement,
    /// Health or other self-preservation pickup.
    ResourcePreservation,
}

impl EntityKind {
    /// Number of entity kinds.
    pub const COUNT: usize = 8;

    /// Every kind, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::GoalMandatory,
        Self::GoalOptional,
        Self::GoalCompletion,
        Self::PointOfInterest,
        Self::HazardEnemy,
        Self::HazardEnvironment,
        Self::ResourceAchievement,
        Self::ResourcePreservation,
    ];

    /// Position of this kind in [`Self::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Hazards repel or attract depending on drives and are counted by
    /// hazard-density checks.
    #[must_use]
    pub fn is_hazard(self) -> bool {
        matches!(self, Self::HazardEnemy | Self::HazardEnvironment)
    }

    /// Kinds that keep the level "unfinished" while unvisited.
    #[must_use]
    pub fn counts_as_remaining_goal(self) -> bool {
        matches!(
            self,
            Self::GoalMandatory
                | Self::GoalOptional
                | Self::ResourceAchievement
                | Self::ResourcePreservation
        )
    }

    /// Snake-case name, matching the serde representation.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::GoalMandatory => "goal_mandatory",
            Self::GoalOptional => "goal_optional",
            Self::GoalCompletion => "goal_completion",
            Self::PointOfInterest => "point_of_interest",
            Self::HazardEnemy => "hazard_enemy",
            Self::HazardEnvironment => "hazard_environment",
            Self::ResourceAchievement => "resource_achievement",
            Self::ResourcePreservation => "resource_preservation",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = crate::WayfarerError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| crate::WayfarerError::Config(format!("unknown entity kind: {s}")))
    }
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Where the agent is and which way its body faces, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    /// Feet position.
    pub position: Vec3,
    /// Body forward direction. Only the XZ components are used.
    pub forward: Vec3,
}

impl AgentPose {
    /// Pose at `position` facing +Z.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::unit_z(),
        }
    }

    /// Planar unit forward, falling back to +Z for a degenerate heading.
    #[must_use]
    pub fn planar_forward(&self) -> Vec3 {
        planar_direction(self.forward).unwrap_or_else(Vec3::unit_z)
    }
}

impl Default for AgentPose {
    fn default() -> Self {
        Self::at(Vec3::zero())
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Total score of a destination candidate. Totally ordered so candidates can
/// be compared without NaN surprises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score(pub OrderedFloat<f32>);

impl Score {
    /// Create a score from a raw f32.
    #[must_use]
    pub fn new(score: f32) -> Self {
        Self(OrderedFloat(score))
    }

    /// Get the raw score value.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0.into_inner()
    }
}

// ---------------------------------------------------------------------------
// Planar math
// ---------------------------------------------------------------------------

/// Drop the vertical component.
#[must_use]
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Planar unit direction of `v`, or `None` if it is (nearly) zero-length.
#[must_use]
pub fn planar_direction(v: Vec3) -> Option<Vec3> {
    let flat = flatten(v);
    let len = flat.magnitude();
    if len < DIRECTION_EPSILON || !len.is_finite() {
        None
    } else {
        Some(flat / len)
    }
}

/// Rotate `v` about the Y axis. Positive angles turn to the right of +Z.
#[must_use]
pub fn rotate_y(v: Vec3, degrees: f32) -> Vec3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}

/// Unsigned planar angle between two directions, in degrees.
#[must_use]
pub fn planar_angle(a: Vec3, b: Vec3) -> f32 {
    match (planar_direction(a), planar_direction(b)) {
        (Some(a), Some(b)) => a.dot(b).clamp(-1.0, 1.0).acos().to_degrees(),
        _ => 0.0,
    }
}

/// Planar distance between two points.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(a - b).magnitude()
}

/// Component-wise approximate equality.
#[must_use]
pub fn approx_eq(a: Vec3, b: Vec3, epsilon: f32) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon && (a.z - b.z).abs() <= epsilon
}

/// The eight corners of a bounding volume.
#[must_use]
pub fn aabb_corners(aabb: &Aabb) -> [Vec3; 8] {
    let (lo, hi) = (aabb.min, aabb.max);
    [
        Vec3::new(lo.x, lo.y, lo.z),
        Vec3::new(hi.x, lo.y, lo.z),
        Vec3::new(lo.x, hi.y, lo.z),
        Vec3::new(hi.x, hi.y, lo.z),
        Vec3::new(lo.x, lo.y, hi.z),
        Vec3::new(hi.x, lo.y, hi.z),
        Vec3::new(lo.x, hi.y, hi.z),
        Vec3::new(hi.x, hi.y, hi.z),
    ]
}
