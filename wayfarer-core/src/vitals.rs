//! Agent health.
//!
//! Enemies and environmental hazards hurt when reached, preservation
//! resources heal. Health feeds back into scoring: a preservation pickup is
//! only worth as much as the health the agent is missing.

use serde::{Deserialize, Serialize};

use crate::config::VitalsConfig;
use crate::events::{AgentEvent, EventLog};
use crate::types::EntityKind;

/// Health pool of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    health: f32,
    max_health: f32,
    enemy_damage: f32,
    environment_damage: f32,
    preservation_heal: f32,
}

impl Vitals {
    /// Full health.
    #[must_use]
    pub fn new(config: &VitalsConfig) -> Self {
        let max_health = config.max_health.max(f32::EPSILON);
        Self {
            health: max_health,
            max_health,
            enemy_damage: config.enemy_damage.max(0.0),
            environment_damage: config.environment_damage.max(0.0),
            preservation_heal: config.preservation_heal.max(0.0),
        }
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Health as a fraction of the maximum, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Whether health has run out.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.health <= 0.0
    }

    /// Apply the effect of visiting an entity of `kind`, logging what changed.
    pub fn apply_visit(&mut self, kind: EntityKind, events: &mut EventLog) {
        match kind {
            EntityKind::HazardEnemy => self.damage(self.enemy_damage, events),
            EntityKind::HazardEnvironment => self.damage(self.environment_damage, events),
            EntityKind::ResourcePreservation => self.heal(self.preservation_heal, events),
            _ => {}
        }
    }

    fn damage(&mut self, amount: f32, events: &mut EventLog) {
        if amount <= 0.0 || self.is_depleted() {
            return;
        }
        let before = self.health;
        self.health = (self.health - amount).max(0.0);
        events.push(AgentEvent::Damaged {
            amount: before - self.health,
            health: self.health,
        });
        if self.is_depleted() {
            events.push(AgentEvent::Depleted);
        }
    }

    fn heal(&mut self, amount: f32, events: &mut EventLog) {
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        if self.health > before {
            events.push(AgentEvent::Healed {
                amount: self.health - before,
                health: self.health,
            });
        }
    }
}
