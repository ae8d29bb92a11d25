//! TOML level descriptions.
//!
//! A level file lists the arena bounds, the walls, the tagged entities and
//! how to spawn agents:
//!
//! ```toml
//! name = "courtyard"
//! duration = 90.0
//! spawn = [0.0, 0.0, -20.0]
//! bounds = { min = [-25.0, 0.0, -25.0], max = [25.0, 4.0, 25.0] }
//!
//! [[walls]]
//! min = [-8.0, 0.0, -2.0]
//! max = [8.0, 3.0, -1.0]
//!
//! [[entities]]
//! key = 1
//! kind = "goal_mandatory"
//! position = [0.0, 0.0, 15.0]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wayfarer_core::oracle::RegistryEntity;
use wayfarer_core::{Aabb, AgentPose, AgentProfile, DriveScalars, EntityKey, EntityKind, Vec3, WayfarerConfig};

use crate::error::{Result, SimError};
use crate::follower::PathFollower;
use crate::level::BoxLevel;

fn vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

fn default_duration() -> f32 {
    120.0
}

fn default_dt() -> f32 {
    0.1
}

fn default_facing() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

fn default_half_extents() -> [f32; 3] {
    [0.5, 1.0, 0.5]
}

/// An axis-aligned box given by two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSpec {
    /// Minimum corner.
    pub min: [f32; 3],
    /// Maximum corner.
    pub max: [f32; 3],
}

impl BoxSpec {
    fn to_aabb(self) -> Aabb {
        let (a, b) = (vec3(self.min), vec3(self.max));
        Aabb {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }
}

/// One tagged entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Unique key within the level.
    pub key: u64,
    /// Markup tag.
    pub kind: EntityKind,
    /// Feet position.
    pub position: [f32; 3],
    /// Half size of the bounding box around `position` (bottom at feet).
    #[serde(default = "default_half_extents")]
    pub half_extents: [f32; 3],
    /// Known without being seen.
    #[serde(default)]
    pub always_known: bool,
}

impl EntitySpec {
    fn to_registry(&self) -> RegistryEntity {
        let position = vec3(self.position);
        let [hx, hy, hz] = self.half_extents;
        RegistryEntity {
            key: EntityKey(self.key),
            kind: self.kind,
            position,
            bounds: Aabb {
                min: position - Vec3::new(hx, 0.0, hz),
                max: position + Vec3::new(hx, 2.0 * hy, hz),
            },
            always_known: self.always_known,
        }
    }
}

/// A complete level file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Display name.
    pub name: String,
    /// Seed for sampling agent drives.
    #[serde(default)]
    pub seed: u64,
    /// Simulated seconds before the run stops.
    #[serde(default = "default_duration")]
    pub duration: f32,
    /// Fixed tick length in seconds.
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Walkable arena.
    pub bounds: BoxSpec,
    /// Where agents start.
    pub spawn: [f32; 3],
    /// Initial facing.
    #[serde(default = "default_facing")]
    pub facing: [f32; 3],
    /// Solid boxes.
    #[serde(default)]
    pub walls: Vec<BoxSpec>,
    /// Tagged entities.
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    /// Profile to sample drives from. Ignored when `drives` is set.
    #[serde(default)]
    pub profile: Option<AgentProfile>,
    /// Fixed drives for every agent.
    #[serde(default)]
    pub drives: Option<DriveScalars>,
    /// Agent configuration overrides.
    #[serde(default)]
    pub config: WayfarerConfig,
    /// Movement model.
    #[serde(default)]
    pub follower: PathFollower,
}

impl LevelSpec {
    /// Parse and validate a level from TOML.
    ///
    /// # Errors
    /// Returns `SimError::Toml` for malformed input and
    /// `SimError::InvalidLevel` for an unusable level.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let spec: Self = toml::from_str(toml_str)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load a level file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject levels the run loop cannot use.
    ///
    /// # Errors
    /// Returns `SimError::InvalidLevel` naming the problem, or
    /// `SimError::Core` for a bad agent configuration.
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::InvalidLevel(format!("dt must be > 0 (got {})", self.dt)));
        }
        if !(self.duration.is_finite() && self.duration >= 0.0) {
            return Err(SimError::InvalidLevel(format!(
                "duration must be >= 0 (got {})",
                self.duration
            )));
        }
        if !(self.follower.speed.is_finite() && self.follower.speed > 0.0) {
            return Err(SimError::InvalidLevel("follower.speed must be > 0".to_string()));
        }
        let bounds = self.bounds.to_aabb();
        if bounds.max.x <= bounds.min.x || bounds.max.z <= bounds.min.z {
            return Err(SimError::InvalidLevel("bounds are empty".to_string()));
        }
        let spawn = vec3(self.spawn);
        if spawn.x < bounds.min.x || spawn.x > bounds.max.x || spawn.z < bounds.min.z || spawn.z > bounds.max.z {
            return Err(SimError::InvalidLevel("spawn lies outside the bounds".to_string()));
        }
        let mut keys = BTreeSet::new();
        for entity in &self.entities {
            if !keys.insert(entity.key) {
                return Err(SimError::InvalidLevel(format!(
                    "duplicate entity key {}",
                    entity.key
                )));
            }
        }
        self.config.validate()?;
        Ok(())
    }

    /// Build the shared level.
    #[must_use]
    pub fn build_level(&self) -> BoxLevel {
        BoxLevel::new(
            self.bounds.to_aabb(),
            self.walls.iter().map(|w| w.to_aabb()).collect(),
            self.entities.iter().map(EntitySpec::to_registry).collect(),
        )
    }

    /// Starting pose for every agent.
    #[must_use]
    pub fn spawn_pose(&self) -> AgentPose {
        AgentPose {
            position: vec3(self.spawn),
            forward: vec3(self.facing),
        }
    }

    /// Whether the level has an exit to finish on.
    #[must_use]
    pub fn has_completion_goal(&self) -> bool {
        self.entities.iter().any(|e| e.kind == EntityKind::GoalCompletion)
    }
}
