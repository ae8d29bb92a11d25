//! Agent events buffered for the host.
//!
//! The agent never calls back into the host. Anything worth reporting
//! (a new memory, a visit, a detour) is queued here and drained by the host
//! after each tick, e.g. to write a playtest log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::types::{EntityKey, EntityKind, Vec3};

/// Which detour the agent took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetourKind {
    /// Retreat along remembered paths away from the hazards.
    Backtrack,
    /// Charge the hazard centroid.
    HeadTowardHazard,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// An entity entered memory for the first time.
    Perceived {
        /// Entity key.
        key: EntityKey,
        /// Entity kind.
        kind: EntityKind,
    },
    /// An entity memory decayed away.
    Forgotten {
        /// Entity key.
        key: EntityKey,
    },
    /// The agent reached an entity.
    Visited {
        /// Entity key.
        key: EntityKey,
        /// Entity kind.
        kind: EntityKind,
    },
    /// The routing pass picked a different destination.
    DestinationChanged {
        /// Previous destination, if any.
        from: Option<Vec3>,
        /// New destination.
        to: Vec3,
    },
    /// A hazard detour began.
    DetourStarted {
        /// Detour type.
        kind: DetourKind,
        /// Where the agent is heading.
        target: Vec3,
        /// Hazard centroid.
        centroid: Vec3,
        /// Hazard radius.
        radius: f32,
    },
    /// A detour finished.
    DetourEnded {
        /// Detour type.
        kind: DetourKind,
    },
    /// A look-around sweep began.
    LookStarted,
    /// A look-around sweep finished.
    LookFinished,
    /// Health went down.
    Damaged {
        /// Damage taken.
        amount: f32,
        /// Health afterwards.
        health: f32,
    },
    /// Health went up.
    Healed {
        /// Health restored.
        amount: f32,
        /// Health afterwards.
        health: f32,
    },
    /// Health reached zero.
    Depleted,
}

/// Bounded FIFO of undrained events. The oldest are dropped if the host
/// stops draining.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<AgentEvent>,
    capacity: usize,
}

impl EventLog {
    /// Default number of undrained events kept.
    pub const DEFAULT_CAPACITY: usize = 4096;

    /// An empty log holding at most `capacity` events (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Queue an event.
    pub fn push(&mut self, event: AgentEvent) {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<AgentEvent> {
        self.events.drain(..).collect()
    }

    /// Queued events.
    pub fn iter(&self) -> impl Iterator<Item = &AgentEvent> {
        self.events.iter()
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_in_order() {
        let mut log = EventLog::default();
        log.push(AgentEvent::LookStarted);
        log.push(AgentEvent::LookFinished);
        assert_eq!(log.drain(), vec![AgentEvent::LookStarted, AgentEvent::LookFinished]);
        assert!(log.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut log = EventLog::new(2);
        log.push(AgentEvent::LookStarted);
        log.push(AgentEvent::Depleted);
        log.push(AgentEvent::LookFinished);
        assert_eq!(log.len(), 2);
        assert_eq!(log.iter().next(), Some(&AgentEvent::Depleted));
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_string(&AgentEvent::Visited {
            key: EntityKey(3),
            kind: EntityKind::GoalMandatory,
        })
        .expect("serializable");
        assert!(json.contains("\"event\":\"visited\""));
        assert!(json.contains("goal_mandatory"));
    }
}
