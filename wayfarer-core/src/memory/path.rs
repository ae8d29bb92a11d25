//! Path memory: "which ways I have considered going".
//!
//! Every exploration direction the agent scores is remembered as an
//! [`ExploreMemory`]. Backtracking walks these records from newest to oldest
//! to find a way out of a hazardous area.

use serde::{Deserialize, Serialize};

use crate::types::{Vec3, approx_eq};

/// A scored exploration direction and how far it looked traversable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExploreMemory {
    /// Where the agent stood when it scored the direction.
    pub origin: Vec3,
    /// Planar unit direction.
    pub direction: Vec3,
    /// Estimated traversable distance along `direction`.
    pub distance: f32,
    /// Seconds since it was last scored.
    pub impression_time: f32,
}

impl ExploreMemory {
    /// A fresh path memory.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3, distance: f32) -> Self {
        Self {
            origin,
            direction,
            distance,
            impression_time: 0.0,
        }
    }

    /// End point of the path.
    #[must_use]
    pub fn destination(&self) -> Vec3 {
        self.origin + self.direction * self.distance
    }

    /// Approximate equality on origin, distance and end point.
    ///
    /// Directions are compared through the end point so that neighbouring
    /// rays of a fine fan stay distinct at long range.
    #[must_use]
    pub fn similar(&self, other: &Self, epsilon: f32) -> bool {
        approx_eq(self.origin, other.origin, epsilon)
            && (self.distance - other.distance).abs() <= epsilon
            && approx_eq(self.destination(), other.destination(), epsilon)
    }
}
