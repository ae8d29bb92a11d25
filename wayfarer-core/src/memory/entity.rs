//! Entity memory: "what I have seen and where".
//!
//! One record per level entity, keyed by [`EntityKey`]. Records fade when the
//! entity has not been perceived for longer than the agent's forget time,
//! unless they are visited, currently in view, or committed long-term.

use serde::{Deserialize, Serialize};

use crate::types::{EntityKey, EntityKind, Vec3};

/// An entity as the agent perceived it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerceivedEntity {
    /// Stable identity from the registry.
    pub key: EntityKey,
    /// Markup tag.
    pub kind: EntityKind,
    /// Last perceived world position.
    pub position: Vec3,
    /// Whether the agent has reached it.
    pub visited: bool,
}

impl PerceivedEntity {
    /// A freshly perceived, unvisited entity.
    #[must_use]
    pub fn new(key: EntityKey, kind: EntityKind, position: Vec3) -> Self {
        Self {
            key,
            kind,
            position,
            visited: false,
        }
    }
}

/// The agent's memory of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityMemory {
    /// What was perceived.
    pub entity: PerceivedEntity,
    /// Seconds since the last refresh.
    pub impression_time: f32,
    /// Cleared while the entity is in view.
    pub forgettable: bool,
    /// Long-term memory: never evicted.
    pub unforgettable: bool,
}

impl EntityMemory {
    /// A new short-term memory with a fresh impression.
    #[must_use]
    pub fn new(entity: PerceivedEntity) -> Self {
        Self {
            entity,
            impression_time: 0.0,
            forgettable: true,
            unforgettable: false,
        }
    }

    /// A new long-term memory.
    #[must_use]
    pub fn long_term(entity: PerceivedEntity) -> Self {
        Self {
            unforgettable: true,
            ..Self::new(entity)
        }
    }

    /// Entity key shorthand.
    #[must_use]
    pub fn key(&self) -> EntityKey {
        self.entity.key
    }

    /// Entity kind shorthand.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.entity.kind
    }

    /// Remembered position shorthand.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.entity.position
    }

    /// Visited flag shorthand.
    #[must_use]
    pub fn visited(&self) -> bool {
        self.entity.visited
    }

    /// Refresh from a new perception. The visited flag is owned by the agent
    /// and survives the refresh.
    pub fn refresh(&mut self, perceived: &PerceivedEntity) {
        self.entity.kind = perceived.kind;
        self.entity.position = perceived.position;
        self.impression_time = 0.0;
    }

    /// Whether the decay pass should drop this record.
    #[must_use]
    pub fn should_forget(&self, forget_time: f32) -> bool {
        !self.unforgettable
            && self.forgettable
            && !self.entity.visited
            && self.impression_time >= forget_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perceived(x: f32) -> PerceivedEntity {
        PerceivedEntity::new(EntityKey(1), EntityKind::PointOfInterest, Vec3::new(x, 0.0, 0.0))
    }

    #[test]
    fn refresh_resets_impression_and_keeps_visited() {
        let mut mem = EntityMemory::new(perceived(0.0));
        mem.impression_time = 12.0;
        mem.entity.visited = true;
        mem.refresh(&perceived(4.0));
        assert_eq!(mem.impression_time, 0.0);
        assert!(mem.visited());
        assert_eq!(mem.position().x, 4.0);
    }

    #[test]
    fn protection_rules() {
        let mut mem = EntityMemory::new(perceived(0.0));
        mem.impression_time = 10.0;
        assert!(mem.should_forget(10.0));
        assert!(!mem.should_forget(10.5));

        mem.forgettable = false;
        assert!(!mem.should_forget(1.0));
        mem.forgettable = true;

        mem.entity.visited = true;
        assert!(!mem.should_forget(1.0));

        let mut ltm = EntityMemory::long_term(perceived(0.0));
        ltm.impression_time = f32::MAX;
        assert!(!ltm.should_forget(0.0));
    }
}
