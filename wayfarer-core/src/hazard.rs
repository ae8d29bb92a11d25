//! Hazard clusters: where danger is concentrated.
//!
//! A cluster is derived from the hazard memories collected by the last
//! [`MemoryStore::check_hazards`](crate::memory::MemoryStore::check_hazards)
//! call: the centroid is their mean position and the radius is the distance
//! from the centroid to the farthest of them.
//!
//! The averaging divisor is configurable (see [`CentroidDivisor`]). Dividing
//! by the hazard limit instead of the collected count drifts the centroid
//! away from the true mean whenever the two differ.

use serde::{Deserialize, Serialize};

use crate::config::CentroidDivisor;
use crate::types::{Vec3, planar_distance};

/// Transient summary of a hazardous area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardCluster {
    /// Mean position of the hazards.
    pub centroid: Vec3,
    /// Planar distance from the centroid to the farthest hazard.
    pub radius: f32,
    /// Hazards that formed the cluster.
    pub count: usize,
}

impl HazardCluster {
    /// Whether `point` lies strictly outside the cluster radius.
    #[must_use]
    pub fn is_outside(&self, point: Vec3) -> bool {
        planar_distance(point, self.centroid) > self.radius
    }
}

/// Mean position of `positions`, or `None` if there are none.
#[must_use]
pub fn centroid(positions: &[Vec3], divisor: CentroidDivisor, hazard_limit: usize) -> Option<Vec3> {
    if positions.is_empty() {
        return None;
    }
    let sum = positions.iter().fold(Vec3::zero(), |acc, p| acc + *p);
    let n = match divisor {
        CentroidDivisor::Collected => positions.len(),
        CentroidDivisor::HazardLimit => hazard_limit.max(1),
    };
    Some(sum / n as f32)
}

/// Largest planar distance from `centroid` to any of `positions`.
#[must_use]
pub fn radius(positions: &[Vec3], centroid: Vec3) -> Option<f32> {
    positions
        .iter()
        .map(|p| planar_distance(*p, centroid))
        .reduce(f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_nothing_is_none() {
        assert!(centroid(&[], CentroidDivisor::Collected, 2).is_none());
        assert!(radius(&[], Vec3::zero()).is_none());
    }

    #[test]
    fn collected_divisor_is_the_true_mean() {
        let hazards = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 6.0),
        ];
        let c = centroid(&hazards, CentroidDivisor::Collected, 2).expect("non-empty");
        assert!((c.x - 2.0).abs() < 1e-5);
        assert!((c.z - 2.0).abs() < 1e-5);
        let r = radius(&hazards, c).expect("non-empty");
        assert!((r - 4.0).abs() < 1e-5);
    }

    #[test]
    fn limit_divisor_scales_by_the_hazard_limit() {
        let hazards = [
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ];
        let scaled = centroid(&hazards, CentroidDivisor::HazardLimit, 2).expect("non-empty");
        assert!((scaled.x - 4.5).abs() < 1e-5);
        let floored = centroid(&hazards[..1], CentroidDivisor::HazardLimit, 0).expect("non-empty");
        assert!((floored.x - 3.0).abs() < 1e-5);
    }

    #[test]
    fn outside_is_strict() {
        let cluster = HazardCluster {
            centroid: Vec3::zero(),
            radius: 2.0,
            count: 2,
        };
        assert!(!cluster.is_outside(Vec3::new(2.0, 0.0, 0.0)));
        assert!(cluster.is_outside(Vec3::new(2.1, 0.0, 0.0)));
    }
}
