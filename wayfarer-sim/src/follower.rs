//! Straight-line path follower.
//!
//! Stands in for an engine's navigation agent: walks toward the destination
//! at a fixed speed and stops short of walls instead of passing through.

use serde::{Deserialize, Serialize};
use wayfarer_core::oracle::NavSurface;
use wayfarer_core::{AgentPose, Vec3, planar_direction, planar_distance};

/// Moves a pose toward a destination each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathFollower {
    /// Walking speed in units per second.
    pub speed: f32,
    /// Distance at which the follower stops moving.
    pub arrive_radius: f32,
}

impl Default for PathFollower {
    fn default() -> Self {
        Self {
            speed: 4.0,
            arrive_radius: 0.2,
        }
    }
}

impl PathFollower {
    /// Advance `pose` toward `destination` by at most `speed * dt`.
    ///
    /// Returns the distance actually travelled. A blocked step moves up to
    /// the wall and stops there.
    pub fn step(&self, nav: &dyn NavSurface, pose: &mut AgentPose, destination: Vec3, dt: f32) -> f32 {
        let remaining = planar_distance(pose.position, destination);
        if remaining <= self.arrive_radius {
            return 0.0;
        }
        let Some(direction) = planar_direction(destination - pose.position) else {
            return 0.0;
        };
        pose.forward = direction;

        let stride = (self.speed * dt.max(0.0)).min(remaining);
        let target = pose.position + direction * stride;
        let hit = nav.cast(pose.position, target);
        let travelled = hit.distance.min(stride);
        pose.position += direction * travelled;
        travelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::BoxLevel;
    use wayfarer_core::Aabb;

    fn corridor() -> BoxLevel {
        BoxLevel::new(
            Aabb {
                min: Vec3::new(-5.0, 0.0, -5.0),
                max: Vec3::new(5.0, 3.0, 20.0),
            },
            vec![Aabb {
                min: Vec3::new(-5.0, 0.0, 10.0),
                max: Vec3::new(5.0, 3.0, 11.0),
            }],
            Vec::new(),
        )
    }

    #[test]
    fn walks_at_speed_and_turns_to_face() {
        let level = corridor();
        let follower = PathFollower::default();
        let mut pose = AgentPose::at(Vec3::zero());
        pose.forward = Vec3::unit_x();
        let moved = follower.step(&level, &mut pose, Vec3::new(0.0, 0.0, 5.0), 0.5);
        assert!((moved - 2.0).abs() < 1e-5);
        assert!((pose.position.z - 2.0).abs() < 1e-5);
        assert!((pose.forward.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn does_not_overshoot() {
        let level = corridor();
        let follower = PathFollower::default();
        let mut pose = AgentPose::at(Vec3::zero());
        follower.step(&level, &mut pose, Vec3::new(0.0, 0.0, 1.0), 5.0);
        assert!((pose.position.z - 1.0).abs() < 1e-5);
        assert_eq!(follower.step(&level, &mut pose, Vec3::new(0.0, 0.0, 1.0), 1.0), 0.0);
    }

    #[test]
    fn stops_at_walls() {
        let level = corridor();
        let follower = PathFollower { speed: 100.0, arrive_radius: 0.2 };
        let mut pose = AgentPose::at(Vec3::zero());
        follower.step(&level, &mut pose, Vec3::new(0.0, 0.0, 18.0), 1.0);
        assert!(pose.position.z < 10.0);
        assert!(!level.inside_wall(pose.position));
    }
}
