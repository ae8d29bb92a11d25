//! Destination scoring.
//!
//! A routing pass scores three families of candidates and keeps the best:
//!
//! 1. **Entities**: every unvisited remembered entity.
//! 2. **Exploration fan**: directions around the agent. Inside the field of
//!    view every `explore_degrees` with a live traversal raycast; outside it
//!    every `invisible_explore_degrees` using only the spatial grid.
//! 3. **Current goal**: the direction of the current destination, so the
//!    agent does not flip-flop between similar candidates.
//!
//! Every candidate shares one term: how much unexplored space lies in its
//! direction plus the pull (or push) of every unvisited memory, weighted by
//! its base score, alignment and inverse square distance.
//!
//! ```text
//!   shared(dir) = (curiosity + 0.1) · unexplored / samples
//!               + Σ base(m) · align(dir, m) / max(d(m)², 1)
//! ```
//!
//! Ties keep the earlier candidate, so the pass is deterministic for a
//! frozen memory snapshot.

use tracing::debug;

use crate::config::WayfarerConfig;
use crate::drives::{Drive, DriveScalars, DriveWeights};
use crate::grid::SpatialGrid;
use crate::hazard::HazardCluster;
use crate::memory::{ExploreMemory, MemoryStore};
use crate::oracle::NavSurface;
use crate::perception::explore_visibility_check;
use crate::types::{
    DIRECTION_EPSILON, EntityKey, EntityKind, Score, Vec3, planar_angle, planar_direction, planar_distance,
    rotate_y,
};

/// Added to curiosity so a fully incurious agent still values open space.
const CURIOSITY_FLOOR: f32 = 0.1;

/// Lowest health multiplier on a preservation pickup. Pickups count as
/// remaining goals, so a healthy agent must still collect them eventually.
const PRESERVATION_FLOOR: f32 = 0.5;

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// A remembered entity.
    Entity(EntityKey),
    /// An exploration direction.
    Explore {
        /// Inside the field of view (live raycast) or outside (grid only).
        visible: bool,
    },
    /// The direction of the current destination.
    CurrentGoal,
}

/// A scored destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// World-space destination.
    pub destination: Vec3,
    /// Planar unit direction from the agent.
    pub direction: Vec3,
    /// Total score.
    pub score: Score,
    /// Origin of the candidate.
    pub source: CandidateSource,
}

/// Everything a pass reads about the agent.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    /// Agent feet position.
    pub position: Vec3,
    /// Planar heading the field of view is centred on.
    pub heading: Vec3,
    /// Drive scalars.
    pub drives: &'a DriveScalars,
    /// Full configuration (weights, fan, casts).
    pub config: &'a WayfarerConfig,
    /// Health as a fraction of the maximum.
    pub health_fraction: f32,
    /// Current destination, if any.
    pub current_destination: Option<Vec3>,
    /// Entity the current destination belongs to, if any.
    pub current_goal: Option<EntityKey>,
    /// Candidates not strictly outside this cluster are discarded.
    pub exclusion: Option<HazardCluster>,
}

/// Outcome of a routing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringPass {
    /// Highest-scoring candidate, if any was scorable.
    pub best: Option<Candidate>,
    /// Number of candidates that received a score.
    pub candidates_scored: usize,
}

/// Base score of an entity kind for this agent.
///
/// The completion goal is worthless while other goals remain, and a
/// preservation resource is scaled by missing health, never below
/// `PRESERVATION_FLOOR`.
#[must_use]
pub fn entity_base_score(
    kind: EntityKind,
    drives: &DriveScalars,
    weights: &DriveWeights,
    goals_remaining: bool,
    health_fraction: f32,
) -> f32 {
    match kind {
        EntityKind::GoalCompletion if goals_remaining => 0.0,
        EntityKind::ResourcePreservation => {
            let missing = 1.0 - health_fraction.clamp(0.0, 1.0);
            weights.base_score(kind, drives) * missing.max(PRESERVATION_FLOOR)
        }
        _ => weights.base_score(kind, drives),
    }
}

/// An unvisited memory reduced to what the shared term needs.
#[derive(Debug, Clone, Copy)]
struct Attractor {
    position: Vec3,
    base: f32,
    hazard: bool,
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// One routing pass over memory, grid and oracle.
pub struct Scorer<'a> {
    input: ScoringInput<'a>,
    nav: &'a dyn NavSurface,
    attractors: Vec<(EntityKey, EntityKind, Attractor)>,
    best: Option<Candidate>,
    scored: usize,
}

impl<'a> Scorer<'a> {
    /// Prepare a pass, snapshotting the unvisited memories.
    #[must_use]
    pub fn new(input: ScoringInput<'a>, nav: &'a dyn NavSurface, memory: &MemoryStore) -> Self {
        let goals_remaining = memory.goals_remaining();
        let attractors = memory
            .unvisited()
            .map(|m| {
                let base = entity_base_score(
                    m.kind(),
                    input.drives,
                    &input.config.weights,
                    goals_remaining,
                    input.health_fraction,
                );
                (
                    m.key(),
                    m.kind(),
                    Attractor {
                        position: m.position(),
                        base,
                        hazard: m.kind().is_hazard(),
                    },
                )
            })
            .collect();
        Self {
            input,
            nav,
            attractors,
            best: None,
            scored: 0,
        }
    }

    /// Score every candidate family and return the winner.
    pub fn run(mut self, grid: &mut SpatialGrid, memory: &mut MemoryStore) -> ScoringPass {
        self.score_entities(grid);
        self.score_fan(grid, memory);
        self.score_current_goal(grid, memory);
        debug!(
            candidates = self.scored,
            best = ?self.best.map(|c| c.score.value()),
            "Routing pass"
        );
        ScoringPass {
            best: self.best,
            candidates_scored: self.scored,
        }
    }

    fn curiosity(&self) -> f32 {
        self.input.drives[Drive::Curiosity] + CURIOSITY_FLOOR
    }

    fn half_fov(&self) -> f32 {
        (self.input.config.perception.horizontal_fov * 0.5).clamp(0.0, 180.0)
    }

    fn max_cast(&self) -> f32 {
        self.input.config.scoring.max_cast_distance.max(DIRECTION_EPSILON)
    }

    #[allow(clippy::cast_precision_loss)]
    fn shared_term(&self, grid: &SpatialGrid, direction: Vec3) -> f32 {
        let samples = self.input.config.scoring.max_cast_samples.max(1);
        let gain = grid.raycast_memory_map(self.input.position, direction, self.max_cast(), samples);
        let exploration = self.curiosity() * gain.num_unexplored as f32 / samples as f32;

        let pull: f32 = self
            .attractors
            .iter()
            .filter_map(|(_, _, a)| {
                let to = a.position - self.input.position;
                let towards = planar_direction(to)?;
                let dot = direction.dot(towards);
                let align = if a.hazard { dot } else { dot.clamp(0.0, 1.0) };
                let d = planar_distance(a.position, self.input.position);
                Some(a.base * align / (d * d).max(1.0))
            })
            .sum();
        exploration + pull
    }

    fn goal_bias(&self, destination: Vec3) -> f32 {
        match self.input.current_destination {
            Some(current)
                if planar_distance(current, destination) <= self.input.config.agent.goal_match_epsilon =>
            {
                self.input.config.agent.existing_goal_bias
            }
            _ => 0.0,
        }
    }

    fn offer(&mut self, candidate: Candidate) {
        if let Some(cluster) = self.input.exclusion
            && !cluster.is_outside(candidate.destination)
        {
            return;
        }
        self.scored += 1;
        if self.best.is_none_or(|b| candidate.score > b.score) {
            self.best = Some(candidate);
        }
    }

    fn score_entities(&mut self, grid: &SpatialGrid) {
        let entries: Vec<_> = self
            .attractors
            .iter()
            .map(|(key, _, a)| (*key, a.position, a.base))
            .collect();
        for (key, position, base) in entries {
            let Some(direction) = planar_direction(position - self.input.position) else {
                continue;
            };
            let bias = if self.input.current_goal == Some(key) {
                self.input.config.agent.existing_goal_bias
            } else {
                0.0
            };
            let score = base + bias + self.shared_term(grid, direction);
            self.offer(Candidate {
                destination: position,
                direction,
                score: Score::new(score),
                source: CandidateSource::Entity(key),
            });
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    fn score_fan(&mut self, grid: &mut SpatialGrid, memory: &mut MemoryStore) {
        let forward = planar_direction(self.input.heading).unwrap_or_else(Vec3::unit_z);
        let half = self.half_fov();
        let step = self.input.config.scoring.explore_degrees.max(0.1);
        let visible_steps = ((2.0 * half) / step).floor() as usize;
        for i in 0..=visible_steps {
            let angle = -half + step * i as f32;
            self.score_direction(grid, memory, rotate_y(forward, angle), true);
        }

        let step = self.input.config.scoring.invisible_explore_degrees.max(0.1);
        let mut angle = half + step;
        while angle < 360.0 - half - DIRECTION_EPSILON {
            self.score_direction(grid, memory, rotate_y(forward, angle), false);
            angle += step;
        }
    }

    fn score_current_goal(&mut self, grid: &mut SpatialGrid, memory: &mut MemoryStore) {
        if self.input.current_goal.is_some() {
            return;
        }
        let Some(destination) = self.input.current_destination else {
            return;
        };
        let Some(direction) = planar_direction(destination - self.input.position) else {
            return;
        };
        let forward = planar_direction(self.input.heading).unwrap_or_else(Vec3::unit_z);
        let visible = planar_angle(forward, direction) <= self.half_fov();
        let Some(distance) = self.traversable_distance(grid, direction, visible) else {
            return;
        };
        memory.add_path(ExploreMemory::new(self.input.position, direction, distance));
        let score = (distance / self.max_cast()) * self.curiosity()
            + self.input.config.agent.existing_goal_bias
            + self.shared_term(grid, direction);
        self.offer(Candidate {
            destination,
            direction,
            score: Score::new(score),
            source: CandidateSource::CurrentGoal,
        });
    }

    fn traversable_distance(&self, grid: &mut SpatialGrid, direction: Vec3, visible: bool) -> Option<f32> {
        let max = self.max_cast();
        if visible {
            explore_visibility_check(self.nav, grid, self.input.position, direction, max)
                .map(|hit| hit.distance.min(max))
        } else {
            let samples = self.input.config.scoring.max_cast_samples.max(1);
            Some(grid.raycast_memory_map(self.input.position, direction, max, samples).distance)
        }
    }

    fn score_direction(&mut self, grid: &mut SpatialGrid, memory: &mut MemoryStore, direction: Vec3, visible: bool) {
        let Some(direction) = planar_direction(direction) else {
            return;
        };
        let Some(distance) = self.traversable_distance(grid, direction, visible) else {
            return;
        };
        let travel = distance - self.input.config.scoring.explore_target_margin;
        if travel < DIRECTION_EPSILON {
            return;
        }
        memory.add_path(ExploreMemory::new(self.input.position, direction, distance));

        let scoring = &self.input.config.scoring;
        let destination = grid.closest_walkable(
            self.nav,
            self.input.position + direction * travel,
            scoring.border_margin,
            scoring.snap_margin,
        );
        let score = (distance / self.max_cast()) * self.curiosity()
            + self.goal_bias(destination)
            + self.shared_term(grid, direction);
        self.offer(Candidate {
            destination,
            direction,
            score: Score::new(score),
            source: CandidateSource::Explore { visible },
        });
    }
}

/// Run a full routing pass.
pub fn score_destinations(
    input: ScoringInput<'_>,
    nav: &dyn NavSurface,
    grid: &mut SpatialGrid,
    memory: &mut MemoryStore,
) -> ScoringPass {
    Scorer::new(input, nav, memory).run(grid, memory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridBounds;
    use crate::memory::PerceivedEntity;
    use crate::oracle::RayHit;
    use crate::types::Aabb;

    struct OpenField;

    impl NavSurface for OpenField {
        fn cast(&self, origin: Vec3, target: Vec3) -> RayHit {
            RayHit::clear(origin, target)
        }

        fn snap(&self, point: Vec3, _margin: f32) -> Vec3 {
            point
        }

        fn bounds(&self) -> Aabb {
            Aabb {
                min: Vec3::new(-50.0, 0.0, -50.0),
                max: Vec3::new(50.0, 2.0, 50.0),
            }
        }
    }

    fn grid() -> SpatialGrid {
        SpatialGrid::new(
            GridBounds {
                min_x: -50.0,
                min_z: -50.0,
                max_x: 50.0,
                max_z: 50.0,
            },
            1.0,
        )
        .expect("valid grid")
    }

    fn input<'a>(config: &'a WayfarerConfig, drives: &'a DriveScalars) -> ScoringInput<'a> {
        ScoringInput {
            position: Vec3::zero(),
            heading: Vec3::unit_z(),
            drives,
            config,
            health_fraction: 1.0,
            current_destination: None,
            current_goal: None,
            exclusion: None,
        }
    }

    fn remember(memory: &mut MemoryStore, key: u64, kind: EntityKind, x: f32, z: f32) {
        memory.memorize(&PerceivedEntity::new(EntityKey(key), kind, Vec3::new(x, 0.0, z)));
    }

    #[test]
    fn completion_goal_waits_for_other_goals() {
        let drives = DriveScalars::uniform(0.5);
        let weights = DriveWeights::default();
        assert_eq!(
            entity_base_score(EntityKind::GoalCompletion, &drives, &weights, true, 1.0),
            0.0
        );
        assert!(entity_base_score(EntityKind::GoalCompletion, &drives, &weights, false, 1.0) > 0.0);
    }

    #[test]
    fn preservation_scales_with_missing_health_above_a_floor() {
        let drives = DriveScalars::uniform(0.5);
        let weights = DriveWeights::default();
        let healthy = entity_base_score(EntityKind::ResourcePreservation, &drives, &weights, true, 1.0);
        assert!((healthy - 0.25).abs() < 1e-5);
        let half = entity_base_score(EntityKind::ResourcePreservation, &drives, &weights, true, 0.5);
        assert!((half - 0.25).abs() < 1e-5);
        let dying = entity_base_score(EntityKind::ResourcePreservation, &drives, &weights, true, 0.2);
        assert!((dying - 0.4).abs() < 1e-5);
    }

    #[test]
    fn mandatory_goal_beats_open_space() {
        let config = WayfarerConfig::default();
        let drives = DriveScalars::uniform(0.5);
        let mut memory = MemoryStore::new(&config, 0.5);
        let mut grid = grid();
        remember(&mut memory, 1, EntityKind::GoalMandatory, 10.0, 0.0);

        let pass = score_destinations(input(&config, &drives), &OpenField, &mut grid, &mut memory);
        let best = pass.best.expect("candidates exist");
        assert_eq!(best.source, CandidateSource::Entity(EntityKey(1)));
        assert_eq!(best.destination, Vec3::new(10.0, 0.0, 0.0));
        assert!(pass.candidates_scored > 1);
    }

    #[test]
    fn fan_records_every_scored_direction() {
        let config = WayfarerConfig::default();
        let drives = DriveScalars::uniform(0.5);
        let mut memory = MemoryStore::new(&config, 0.5);
        let mut grid = grid();

        let pass = score_destinations(input(&config, &drives), &OpenField, &mut grid, &mut memory);
        // 90° FOV at 5° → 19 visible rays; remaining 270° at 30° → 8 invisible rays.
        assert_eq!(pass.candidates_scored, 27);
        assert_eq!(memory.paths().len(), 27);
        assert!(matches!(
            pass.best.expect("open field").source,
            CandidateSource::Explore { .. }
        ));
    }

    #[test]
    fn frozen_snapshot_scores_identically() {
        let config = WayfarerConfig::default();
        let drives = DriveScalars::uniform(0.5);
        let mut memory = MemoryStore::new(&config, 0.5);
        remember(&mut memory, 1, EntityKind::PointOfInterest, 6.0, 6.0);
        remember(&mut memory, 2, EntityKind::HazardEnemy, -4.0, 5.0);
        let mut grid = grid();

        let first = score_destinations(input(&config, &drives), &OpenField, &mut grid, &mut memory);
        let second = score_destinations(input(&config, &drives), &OpenField, &mut grid, &mut memory);
        assert_eq!(
            first.best.map(|c| c.destination),
            second.best.map(|c| c.destination)
        );
    }

    #[test]
    fn hazards_push_and_attractions_only_pull() {
        let config = WayfarerConfig::default();
        let drives = DriveScalars::uniform(0.0).with(Drive::Caution, 1.0);
        let mut memory = MemoryStore::new(&config, 0.5);
        remember(&mut memory, 1, EntityKind::HazardEnvironment, 0.0, 3.0);
        let grid = grid();
        let scorer = Scorer::new(input(&config, &drives), &OpenField, &memory);
        let toward = scorer.shared_term(&grid, Vec3::unit_z());
        let away = scorer.shared_term(&grid, -Vec3::unit_z());
        assert!(toward < away);
    }

    #[test]
    fn exclusion_discards_candidates_inside_cluster() {
        let config = WayfarerConfig::default();
        let drives = DriveScalars::uniform(0.5);
        let mut memory = MemoryStore::new(&config, 0.5);
        remember(&mut memory, 1, EntityKind::GoalMandatory, 10.0, 0.0);
        let mut grid = grid();
        let mut inp = input(&config, &drives);
        inp.exclusion = Some(HazardCluster {
            centroid: Vec3::new(10.0, 0.0, 0.0),
            radius: 3.0,
            count: 2,
        });
        let best = score_destinations(inp, &OpenField, &mut grid, &mut memory)
            .best
            .expect("some direction survives");
        assert!(planar_distance(best.destination, Vec3::new(10.0, 0.0, 0.0)) > 3.0);
        assert_ne!(best.source, CandidateSource::Entity(EntityKey(1)));
    }

    #[test]
    fn current_destination_keeps_its_bias() {
        let config = WayfarerConfig::default();
        let drives = DriveScalars::uniform(0.5);
        let mut memory = MemoryStore::new(&config, 0.5);
        let mut grid = grid();
        let mut inp = input(&config, &drives);
        inp.current_destination = Some(Vec3::new(-15.0, 0.0, -15.0));
        let best = score_destinations(inp, &OpenField, &mut grid, &mut memory)
            .best
            .expect("candidates exist");
        assert_eq!(best.source, CandidateSource::CurrentGoal);
        assert_eq!(best.destination, Vec3::new(-15.0, 0.0, -15.0));
    }
}
