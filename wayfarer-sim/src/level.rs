//! Box-world level.
//!
//! The walkable surface is a flat rectangle. Walls are axis-aligned boxes
//! that block both movement and sight. Entities live in a lock-guarded list
//! so the host can consume pickups while agents keep reading.

use parking_lot::RwLock;
use wayfarer_core::oracle::{EntityRegistry, NavSurface, Occlusion, RayHit, RegistryEntity};
use wayfarer_core::{Aabb, EntityKey, Vec3};

/// Distance kept between a stopped ray and the surface it hit.
const SKIN: f32 = 0.05;

/// Entry parameter `t ∈ [0, 1]` of the segment `origin → origin + delta`
/// into `aabb`, or `None` if it misses. Starting inside yields `0`.
#[must_use]
pub fn segment_aabb(origin: Vec3, delta: Vec3, aabb: &Aabb) -> Option<f32> {
    let mut t_min = 0.0f32;
    let mut t_max = 1.0f32;
    for (o, d, lo, hi) in [
        (origin.x, delta.x, aabb.min.x, aabb.max.x),
        (origin.y, delta.y, aabb.min.y, aabb.max.y),
        (origin.z, delta.z, aabb.min.z, aabb.max.z),
    ] {
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (a, b) = ((lo - o) / d, (hi - o) / d);
        let (near, far) = if a < b { (a, b) } else { (b, a) };
        t_min = t_min.max(near);
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

/// A flat arena with box walls and a mutable entity list.
#[derive(Debug)]
pub struct BoxLevel {
    bounds: Aabb,
    walls: Vec<Aabb>,
    entities: RwLock<Vec<RegistryEntity>>,
}

impl BoxLevel {
    /// A level spanning `bounds`.
    #[must_use]
    pub fn new(bounds: Aabb, walls: Vec<Aabb>, entities: Vec<RegistryEntity>) -> Self {
        Self {
            bounds,
            walls,
            entities: RwLock::new(entities),
        }
    }

    /// Wall boxes.
    #[must_use]
    pub fn walls(&self) -> &[Aabb] {
        &self.walls
    }

    /// Whether `point` stands inside a wall (ignoring height).
    #[must_use]
    pub fn inside_wall(&self, point: Vec3) -> bool {
        self.walls.iter().any(|w| {
            point.x > w.min.x && point.x < w.max.x && point.z > w.min.z && point.z < w.max.z
        })
    }

    /// Remove an entity, e.g. a consumed pickup. Returns whether it existed.
    pub fn remove(&self, key: EntityKey) -> bool {
        let mut entities = self.entities.write();
        let before = entities.len();
        entities.retain(|e| e.key != key);
        entities.len() != before
    }

    /// Number of entities still in the level.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    fn clamp_to_bounds(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.bounds.min.x, self.bounds.max.x),
            point.y,
            point.z.clamp(self.bounds.min.z, self.bounds.max.z),
        )
    }

    /// Exit parameter of a planar segment leaving the level bounds.
    fn bounds_exit(&self, origin: Vec3, delta: Vec3) -> f32 {
        let mut t = 1.0f32;
        for (o, d, lo, hi) in [
            (origin.x, delta.x, self.bounds.min.x, self.bounds.max.x),
            (origin.z, delta.z, self.bounds.min.z, self.bounds.max.z),
        ] {
            if d > f32::EPSILON {
                t = t.min((hi - o) / d);
            } else if d < -f32::EPSILON {
                t = t.min((lo - o) / d);
            }
        }
        t.max(0.0)
    }
}

impl NavSurface for BoxLevel {
    fn cast(&self, origin: Vec3, target: Vec3) -> RayHit {
        let flat_target = Vec3::new(target.x, origin.y, target.z);
        let delta = flat_target - origin;
        let length = delta.magnitude();
        if length < f32::EPSILON {
            return RayHit::clear(origin, flat_target);
        }

        let mut t = self.bounds_exit(origin, delta);
        let mut hit = t < 1.0;
        for wall in &self.walls {
            let tall = Aabb {
                min: Vec3::new(wall.min.x, f32::MIN, wall.min.z),
                max: Vec3::new(wall.max.x, f32::MAX, wall.max.z),
            };
            if let Some(enter) = segment_aabb(origin, delta, &tall)
                && enter < t
            {
                t = enter;
                hit = true;
            }
        }
        if !hit {
            return RayHit::clear(origin, flat_target);
        }
        let distance = (t * length - SKIN).max(0.0);
        RayHit {
            hit: true,
            distance,
            position: origin + delta / length * distance,
        }
    }

    fn snap(&self, point: Vec3, margin: f32) -> Vec3 {
        let clamped = self.clamp_to_bounds(point);
        let Some(wall) = self.walls.iter().find(|w| {
            clamped.x > w.min.x && clamped.x < w.max.x && clamped.z > w.min.z && clamped.z < w.max.z
        }) else {
            return clamped;
        };
        // Push out through the nearest face.
        let exits = [
            (clamped.x - wall.min.x, Vec3::new(wall.min.x - SKIN, clamped.y, clamped.z)),
            (wall.max.x - clamped.x, Vec3::new(wall.max.x + SKIN, clamped.y, clamped.z)),
            (clamped.z - wall.min.z, Vec3::new(clamped.x, clamped.y, wall.min.z - SKIN)),
            (wall.max.z - clamped.z, Vec3::new(clamped.x, clamped.y, wall.max.z + SKIN)),
        ];
        let (depth, exit) = exits
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((f32::MAX, clamped));
        if depth <= margin && !self.inside_wall(exit) {
            self.clamp_to_bounds(exit)
        } else {
            point
        }
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }
}

impl Occlusion for BoxLevel {
    fn blocked(&self, from: Vec3, to: Vec3) -> bool {
        let delta = to - from;
        self.walls
            .iter()
            .any(|wall| segment_aabb(from, delta, wall).is_some())
    }
}

impl EntityRegistry for BoxLevel {
    fn entities(&self) -> Vec<RegistryEntity> {
        self.entities.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::EntityKind;

    fn arena() -> BoxLevel {
        BoxLevel::new(
            Aabb {
                min: Vec3::new(-10.0, 0.0, -10.0),
                max: Vec3::new(10.0, 4.0, 10.0),
            },
            vec![Aabb {
                min: Vec3::new(2.0, 0.0, -1.0),
                max: Vec3::new(3.0, 3.0, 1.0),
            }],
            vec![RegistryEntity {
                key: EntityKey(1),
                kind: EntityKind::ResourcePreservation,
                position: Vec3::new(-5.0, 0.0, 0.0),
                bounds: Aabb {
                    min: Vec3::new(-5.5, 0.0, -0.5),
                    max: Vec3::new(-4.5, 1.0, 0.5),
                },
                always_known: false,
            }],
        )
    }

    #[test]
    fn segment_misses_and_hits() {
        let b = Aabb {
            min: Vec3::new(1.0, -1.0, -1.0),
            max: Vec3::new(2.0, 1.0, 1.0),
        };
        let t = segment_aabb(Vec3::zero(), Vec3::new(4.0, 0.0, 0.0), &b).expect("crosses");
        assert!((t - 0.25).abs() < 1e-6);
        assert!(segment_aabb(Vec3::zero(), Vec3::new(0.5, 0.0, 0.0), &b).is_none());
        assert!(segment_aabb(Vec3::new(0.0, 0.0, 5.0), Vec3::new(4.0, 0.0, 0.0), &b).is_none());
    }

    #[test]
    fn cast_stops_at_walls_and_edges() {
        let level = arena();
        let hit = level.cast(Vec3::zero(), Vec3::new(8.0, 0.0, 0.0));
        assert!(hit.hit);
        assert!((hit.distance - (2.0 - SKIN)).abs() < 1e-4);

        let edge = level.cast(Vec3::zero(), Vec3::new(0.0, 0.0, 15.0));
        assert!(edge.hit);
        assert!((edge.distance - (10.0 - SKIN)).abs() < 1e-4);

        let clear = level.cast(Vec3::zero(), Vec3::new(0.0, 0.0, 5.0));
        assert!(!clear.hit);
        assert!((clear.distance - 5.0).abs() < 1e-5);
    }

    #[test]
    fn snap_pushes_out_of_walls_within_margin() {
        let level = arena();
        let snapped = level.snap(Vec3::new(2.2, 0.0, 0.0), 1.0);
        assert!(!level.inside_wall(snapped));
        assert!((snapped.x - (2.0 - SKIN)).abs() < 1e-5);
        let outside = level.snap(Vec3::new(40.0, 0.0, 0.0), 1.0);
        assert_eq!(outside.x, 10.0);
        let too_deep = level.snap(Vec3::new(2.5, 0.0, 0.0), 0.1);
        assert_eq!(too_deep, Vec3::new(2.5, 0.0, 0.0));
    }

    #[test]
    fn walls_block_sight() {
        let level = arena();
        assert!(level.blocked(Vec3::new(0.0, 1.0, 0.0), Vec3::new(6.0, 1.0, 0.0)));
        assert!(!level.blocked(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 6.0)));
        // Over the wall.
        assert!(!level.blocked(Vec3::new(0.0, 3.5, 0.0), Vec3::new(6.0, 3.5, 0.0)));
    }

    #[test]
    fn consumed_entities_leave_the_registry() {
        let level = arena();
        assert_eq!(level.entities().len(), 1);
        assert!(level.remove(EntityKey(1)));
        assert!(!level.remove(EntityKey(1)));
        assert_eq!(level.entity_count(), 0);
    }
}
