//! Memory record types and the per-agent [`MemoryStore`].
//!
//! The store owns three kinds of memory:
//!
//! - **Entity**: remembered level entities, keyed by [`EntityKey`]
//! - **Path**: exploration directions the agent has scored
//! - **Waypoint**: a bounded trail of recent positions
//!
//! It is fed by perception and read by the decision engine. Nothing in here
//! is shared between agents.

pub mod entity;
pub mod path;
pub mod waypoint;

pub use entity::{EntityMemory, PerceivedEntity};
pub use path::ExploreMemory;
pub use waypoint::{WaypointHistory, WaypointMemory};

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::{CentroidDivisor, HazardConfig, WayfarerConfig};
use crate::decay;
use crate::hazard::{self, HazardCluster};
use crate::types::{EntityKey, EntityKind, Vec3, planar_distance};

/// What a decay pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecayReport {
    /// Entities that were forgotten.
    pub entities_forgotten: Vec<EntityKey>,
    /// Number of path memories that expired.
    pub paths_forgotten: usize,
}

/// Per-agent memory of entities, explored paths and waypoints.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    /// Ordered so every pass over the entities is deterministic.
    entities: BTreeMap<EntityKey, EntityMemory>,
    /// Oldest first.
    paths: Vec<ExploreMemory>,
    waypoints: WaypointHistory,
    nearby_hazards: Vec<Vec3>,
    goals_remaining: bool,
    forget_time: f32,
    path_match_epsilon: f32,
    max_paths: usize,
    hazard_range: f32,
    hazard_limit: usize,
    centroid_divisor: CentroidDivisor,
}

impl MemoryStore {
    /// An empty store for an agent with the given experience drive.
    #[must_use]
    pub fn new(config: &WayfarerConfig, experience: f32) -> Self {
        let HazardConfig {
            hazard_range,
            hazard_limit,
            centroid_divisor,
            ..
        } = config.hazard;
        Self {
            entities: BTreeMap::new(),
            paths: Vec::new(),
            waypoints: WaypointHistory::new(config.agent.waypoint_capacity),
            nearby_hazards: Vec::new(),
            goals_remaining: false,
            forget_time: decay::forget_time(experience, &config.memory),
            path_match_epsilon: config.memory.path_match_epsilon,
            max_paths: config.memory.max_paths.max(1),
            hazard_range,
            hazard_limit,
            centroid_divisor,
        }
    }

    // -----------------------------------------------------------------------
    // Entities
    // -----------------------------------------------------------------------

    /// Upsert a perceived entity. Returns `true` if it was not remembered before.
    pub fn memorize(&mut self, perceived: &PerceivedEntity) -> bool {
        let created = match self.entities.get_mut(&perceived.key) {
            Some(memory) => {
                memory.refresh(perceived);
                false
            }
            None => {
                self.entities.insert(perceived.key, EntityMemory::new(*perceived));
                true
            }
        };
        if created {
            self.recompute_goals_remaining();
        }
        created
    }

    /// Upsert an entity into long-term memory. It will never be forgotten.
    pub fn commit_long_term(&mut self, perceived: &PerceivedEntity) {
        self.entities
            .entry(perceived.key)
            .and_modify(|memory| {
                memory.refresh(perceived);
                memory.unforgettable = true;
            })
            .or_insert_with(|| EntityMemory::long_term(*perceived));
        self.recompute_goals_remaining();
    }

    /// Whether the entity is remembered and visited. Unknown keys are `false`.
    #[must_use]
    pub fn visited(&self, key: EntityKey) -> bool {
        self.entities.get(&key).is_some_and(EntityMemory::visited)
    }

    /// Mark an entity visited. Returns its kind if this was the first visit.
    pub fn mark_visited(&mut self, key: EntityKey) -> Option<EntityKind> {
        let memory = self.entities.get_mut(&key)?;
        if memory.entity.visited {
            return None;
        }
        memory.entity.visited = true;
        let kind = memory.kind();
        self.recompute_goals_remaining();
        Some(kind)
    }

    /// Protect (or release) an entity from decay, e.g. while it is in view.
    pub fn set_forgettable(&mut self, key: EntityKey, forgettable: bool) {
        if let Some(memory) = self.entities.get_mut(&key) {
            memory.forgettable = forgettable;
        }
    }

    /// Look up one entity memory.
    #[must_use]
    pub fn entity(&self, key: EntityKey) -> Option<&EntityMemory> {
        self.entities.get(&key)
    }

    /// All entity memories in key order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityMemory> {
        self.entities.values()
    }

    /// Unvisited entity memories in key order.
    pub fn unvisited(&self) -> impl Iterator<Item = &EntityMemory> {
        self.entities.values().filter(|m| !m.visited())
    }

    /// Number of remembered entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Whether any goal or resource is still unvisited.
    #[must_use]
    pub fn goals_remaining(&self) -> bool {
        self.goals_remaining
    }

    /// Rebuild the goals-remaining flag from the current memories.
    pub fn recompute_goals_remaining(&mut self) {
        self.goals_remaining = self
            .entities
            .values()
            .any(|m| m.kind().counts_as_remaining_goal() && !m.visited());
    }

    // -----------------------------------------------------------------------
    // Paths
    // -----------------------------------------------------------------------

    /// Record a scored direction. A similar existing record is refreshed and
    /// moved to the newest end instead, and `false` is returned.
    pub fn add_path(&mut self, path: ExploreMemory) -> bool {
        let epsilon = self.path_match_epsilon;
        if let Some(index) = self.paths.iter().position(|p| p.similar(&path, epsilon)) {
            let mut existing = self.paths.remove(index);
            existing.impression_time = 0.0;
            self.paths.push(existing);
            return false;
        }
        if self.paths.len() >= self.max_paths {
            self.paths.remove(0);
        }
        self.paths.push(path);
        true
    }

    /// Remembered paths, least recently refreshed first.
    #[must_use]
    pub fn paths(&self) -> &[ExploreMemory] {
        &self.paths
    }

    // -----------------------------------------------------------------------
    // Waypoints
    // -----------------------------------------------------------------------

    /// Append to the waypoint trail, evicting the oldest entry when full.
    pub fn push_waypoint(&mut self, position: Vec3, was_target: bool) {
        self.waypoints.push(WaypointMemory {
            position,
            was_target,
        });
    }

    /// The waypoint trail.
    #[must_use]
    pub fn waypoints(&self) -> &WaypointHistory {
        &self.waypoints
    }

    // -----------------------------------------------------------------------
    // Decay
    // -----------------------------------------------------------------------

    /// Current forget time in seconds.
    #[must_use]
    pub fn forget_time(&self) -> f32 {
        self.forget_time
    }

    /// Re-derive the forget time after a profile change.
    pub fn set_forget_time(&mut self, forget_time: f32) {
        self.forget_time = forget_time.max(0.0);
    }

    /// Advance every impression clock by `dt` and evict expired records.
    pub fn decay(&mut self, dt: f32) -> DecayReport {
        let entities_forgotten =
            decay::decay_entity_memories(&mut self.entities, dt, self.forget_time);
        let paths_forgotten = decay::decay_path_memories(&mut self.paths, dt, self.forget_time);
        if !entities_forgotten.is_empty() {
            debug!(forgotten = ?entities_forgotten, "Entity memories decayed");
            self.recompute_goals_remaining();
        }
        DecayReport {
            entities_forgotten,
            paths_forgotten,
        }
    }

    // -----------------------------------------------------------------------
    // Hazards
    // -----------------------------------------------------------------------

    /// Collect hazard memories within the hazard range of `point` and report
    /// whether there are at least `hazard_limit` of them.
    ///
    /// Visited hazards still count: having fought there does not make the
    /// area any safer. The collected positions feed
    /// [`Self::calculate_centroid`] and [`Self::calculate_hazard_radius`].
    pub fn check_hazards(&mut self, point: Vec3) -> bool {
        let range = self.hazard_range;
        self.nearby_hazards = self
            .entities
            .values()
            .filter(|m| m.kind().is_hazard())
            .map(EntityMemory::position)
            .filter(|p| planar_distance(*p, point) <= range)
            .collect();
        self.nearby_hazards.len() >= self.hazard_limit.max(1)
    }

    /// Positions collected by the last [`Self::check_hazards`] call.
    #[must_use]
    pub fn nearby_hazards(&self) -> &[Vec3] {
        &self.nearby_hazards
    }

    /// Mean position of the collected hazards. `None` until
    /// [`Self::check_hazards`] has found at least one.
    #[must_use]
    pub fn calculate_centroid(&self) -> Option<Vec3> {
        hazard::centroid(&self.nearby_hazards, self.centroid_divisor, self.hazard_limit)
    }

    /// Distance from `centroid` to the farthest collected hazard.
    #[must_use]
    pub fn calculate_hazard_radius(&self, centroid: Vec3) -> Option<f32> {
        hazard::radius(&self.nearby_hazards, centroid)
    }

    /// Run the hazard check, centroid and radius in order. `None` unless the
    /// area around `point` is hazardous.
    pub fn hazard_cluster(&mut self, point: Vec3) -> Option<HazardCluster> {
        if !self.check_hazards(point) {
            return None;
        }
        let centroid = self.calculate_centroid()?;
        let radius = self.calculate_hazard_radius(centroid)?;
        Some(HazardCluster {
            centroid,
            radius,
            count: self.nearby_hazards.len(),
        })
    }
}
