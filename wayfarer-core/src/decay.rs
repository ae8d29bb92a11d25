//! Time-based memory decay.
//!
//! Every record carries an impression time: seconds since the agent last
//! perceived (entities) or scored (paths) it. Each decay pass advances those
//! clocks and drops the records whose impression is older than the agent's
//! forget time.
//!
//! The forget time itself depends on the experience drive: experienced
//! players hold a mental map longer.
//!
//! ```text
//!   forget_time = min_forget_time + (max_forget_time − min_forget_time) × experience
//! ```

use std::collections::BTreeMap;

use crate::config::MemoryConfig;
use crate::memory::entity::EntityMemory;
use crate::memory::path::ExploreMemory;
use crate::types::EntityKey;

/// Forget time for an agent with the given experience drive.
#[must_use]
pub fn forget_time(experience: f32, config: &MemoryConfig) -> f32 {
    let t = experience.clamp(0.0, 1.0);
    config.min_forget_time + (config.max_forget_time - config.min_forget_time) * t
}

/// Linear retention in `[0, 1]`: 1 for a fresh impression, 0 once forgotten.
///
/// Only used for diagnostics; eviction is a hard threshold.
#[must_use]
pub fn retention(impression_time: f32, forget_time: f32) -> f32 {
    if forget_time <= 0.0 {
        return 0.0;
    }
    (1.0 - impression_time / forget_time).clamp(0.0, 1.0)
}

/// Age every entity memory by `dt` and remove the ones that should be forgotten.
///
/// Returns the keys that were removed, in key order.
pub fn decay_entity_memories(
    entities: &mut BTreeMap<EntityKey, EntityMemory>,
    dt: f32,
    forget_time: f32,
) -> Vec<EntityKey> {
    let mut forgotten = Vec::new();
    entities.retain(|key, memory| {
        memory.impression_time += dt;
        if memory.should_forget(forget_time) {
            forgotten.push(*key);
            false
        } else {
            true
        }
    });
    forgotten
}

/// Age every path memory by `dt` and remove the stale ones.
///
/// Paths have no visited state; they expire purely on impression time.
/// Returns how many were removed.
pub fn decay_path_memories(paths: &mut Vec<ExploreMemory>, dt: f32, forget_time: f32) -> usize {
    let before = paths.len();
    paths.retain_mut(|path| {
        path.impression_time += dt;
        path.impression_time < forget_time
    });
    before - paths.len()
}
