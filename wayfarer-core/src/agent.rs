//! The decision engine.
//!
//! An [`Agent`] is driven by its host once per simulation tick with the
//! elapsed time and the current pose. Each tick runs, in order:
//!
//! 1. mark the current grid cell explored
//! 2. decay memories (on the decay timer)
//! 3. advance or start a look-around sweep
//! 4. perception (on the perception timer)
//! 5. visitation and vitals
//! 6. waypoint sampling (on the waypoint timer)
//! 7. hazard check and detour entry (on the hazard timer)
//! 8. detour progress
//! 9. routing (on the route timer, only while not detouring)
//!
//! and returns one destination for the host's path follower.
//!
//! ```text
//!                 hazard check (caution dominant)
//!   Routing ─────────────────────────────────────▶ Backtrack
//!      │  ▲                                          │ reached retreat point:
//!      │  │ arrived                                  │ re-score outside hazards
//!      │  └──────────────────────────────────────────┘
//!      │  hazard check (otherwise)
//!      └───────────────────────────────────────────▶ HeadTowardHazard
//! ```
//!
//! Look-around sweeps run alongside routing; they only rotate the camera.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::WayfarerConfig;
use crate::decay;
use crate::diagnostics::{GridSnapshot, MemorySnapshot};
use crate::drives::{AgentProfile, Drive, DriveScalars};
use crate::error::{Result, WayfarerError};
use crate::events::{AgentEvent, DetourKind, EventLog};
use crate::grid::{CellState, SpatialGrid};
use crate::hazard::HazardCluster;
use crate::memory::{ExploreMemory, MemoryStore, PerceivedEntity};
use crate::metrics::{AgentCounters, AgentMetrics, Phase, spans};
use crate::oracle::{EntityRegistry, NavSurface, Occlusion};
use crate::perception::Perception;
use crate::scoring::{Candidate, CandidateSource, ScoringInput, score_destinations};
use crate::timer::IntervalTimer;
use crate::types::{AgentId, AgentPose, EntityKey, Vec3, planar_distance, rotate_y};
use crate::vitals::Vitals;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// What the agent is doing, as reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Periodically re-scoring destinations.
    Routing,
    /// Sweeping the camera while routing continues.
    LookingAround,
    /// Following a hazard detour.
    Detour(DetourKind),
}

/// What the host should do this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Where to walk. The agent's own position until a destination exists.
    pub destination: Vec3,
    /// Planar camera heading, including any look-around offset.
    pub heading: Vec3,
    /// Current state.
    pub state: AgentState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Detour {
    kind: DetourKind,
    cluster: HazardCluster,
    target: Vec3,
    /// Backtrack only: the retreat point was reached and an alternate chosen.
    rerouted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LookSweep {
    elapsed: f32,
    duration: f32,
    degrees: f32,
}

impl LookSweep {
    fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Camera yaw offset of a look-around sweep `elapsed` seconds in.
///
/// The sweep goes centre → right → centre → left → centre, each leg taking a
/// quarter of `duration`.
#[must_use]
pub fn look_offset(elapsed: f32, duration: f32, degrees: f32) -> f32 {
    if duration <= 0.0 || elapsed <= 0.0 || elapsed >= duration {
        return 0.0;
    }
    let u = elapsed / duration * 4.0;
    if u < 1.0 {
        degrees * u
    } else if u < 2.0 {
        degrees * (2.0 - u)
    } else if u < 3.0 {
        -degrees * (u - 2.0)
    } else {
        -degrees * (4.0 - u)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles an [`Agent`] from configuration and collaborators.
pub struct AgentBuilder {
    config: WayfarerConfig,
    drives: DriveScalars,
    id: AgentId,
    nav: Option<Arc<dyn NavSurface>>,
    registry: Option<Arc<dyn EntityRegistry>>,
    occlusion: Option<Arc<dyn Occlusion>>,
    metrics: Option<Arc<AgentMetrics>>,
}

impl AgentBuilder {
    /// Start from a configuration with neutral (0.5) drives.
    #[must_use]
    pub fn new(config: WayfarerConfig) -> Self {
        Self {
            config,
            drives: DriveScalars::default(),
            id: AgentId::new(),
            nav: None,
            registry: None,
            occlusion: None,
            metrics: None,
        }
    }

    /// Use these drive scalars.
    #[must_use]
    pub fn drives(mut self, drives: DriveScalars) -> Self {
        self.drives = drives;
        self
    }

    /// Sample drives from a profile.
    #[must_use]
    pub fn profile<R: Rng + ?Sized>(mut self, profile: &AgentProfile, rng: &mut R) -> Self {
        self.drives = profile.sample(rng);
        self
    }

    /// Fix the agent ID (defaults to a random one).
    #[must_use]
    pub fn id(mut self, id: AgentId) -> Self {
        self.id = id;
        self
    }

    /// Navigable-surface oracle. Required.
    #[must_use]
    pub fn nav(mut self, nav: Arc<dyn NavSurface>) -> Self {
        self.nav = Some(nav);
        self
    }

    /// Entity registry. Required.
    #[must_use]
    pub fn registry(mut self, registry: Arc<dyn EntityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Line-of-sight oracle. Without one nothing occludes.
    #[must_use]
    pub fn occlusion(mut self, occlusion: Arc<dyn Occlusion>) -> Self {
        self.occlusion = Some(occlusion);
        self
    }

    /// Share a metrics sink, e.g. across agents.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<AgentMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate and assemble the agent. Always-known entities are committed
    /// to long-term memory.
    ///
    /// # Errors
    /// `MissingCollaborator` without a navigable surface or registry, and
    /// `Config` for invalid configuration or grid layout.
    pub fn build(self) -> Result<Agent> {
        self.config.validate()?;
        let Some(nav) = self.nav else {
            error!(agent = %self.id, "No navigable surface supplied");
            return Err(WayfarerError::MissingCollaborator("navigable surface"));
        };
        let Some(registry) = self.registry else {
            error!(agent = %self.id, "No entity registry supplied");
            return Err(WayfarerError::MissingCollaborator("entity registry"));
        };

        let config = self.config;
        let grid = SpatialGrid::from_config(&config.grid, nav.bounds())?;
        let mut memory = MemoryStore::new(&config, self.drives[Drive::Experience]);
        let mut committed = 0usize;
        for entity in registry.entities().into_iter().filter(|e| e.always_known) {
            memory.commit_long_term(&PerceivedEntity::new(entity.key, entity.kind, entity.position));
            committed += 1;
        }

        let (cols, rows) = grid.dimensions();
        info!(
            agent = %self.id,
            cols,
            rows,
            long_term = committed,
            forget_time = memory.forget_time(),
            "Agent built"
        );

        let mut agent = Agent {
            id: self.id,
            drives: self.drives,
            nav,
            registry,
            occlusion: self.occlusion,
            metrics: self.metrics.unwrap_or_default(),
            memory,
            grid,
            perception: Perception::new(&config.perception),
            vitals: Vitals::new(&config.vitals),
            events: EventLog::default(),
            pose: AgentPose::default(),
            heading: Vec3::unit_z(),
            destination: None,
            current_goal: None,
            route_timer: IntervalTimer::primed(config.agent.route_compute_time),
            hazard_timer: IntervalTimer::new(config.agent.hazard_check_interval),
            waypoint_timer: IntervalTimer::new(config.agent.waypoint_interval),
            decay_timer: IntervalTimer::new(config.memory.decay_interval),
            look_timer: IntervalTimer::new(config.agent.look_time),
            look: None,
            detour: None,
            hazard_detected: false,
            config,
        };
        agent.look_timer.set_interval(agent.effective_look_time());
        Ok(agent)
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A synthetic player: perception, memory and destination choice for one
/// agent. Memory is owned; the level is shared.
pub struct Agent {
    id: AgentId,
    config: WayfarerConfig,
    drives: DriveScalars,
    nav: Arc<dyn NavSurface>,
    registry: Arc<dyn EntityRegistry>,
    occlusion: Option<Arc<dyn Occlusion>>,
    metrics: Arc<AgentMetrics>,
    memory: MemoryStore,
    grid: SpatialGrid,
    perception: Perception,
    vitals: Vitals,
    events: EventLog,
    pose: AgentPose,
    heading: Vec3,
    destination: Option<Vec3>,
    current_goal: Option<EntityKey>,
    route_timer: IntervalTimer,
    hazard_timer: IntervalTimer,
    waypoint_timer: IntervalTimer,
    decay_timer: IntervalTimer,
    look_timer: IntervalTimer,
    look: Option<LookSweep>,
    detour: Option<Detour>,
    hazard_detected: bool,
}

impl Agent {
    /// Advance the agent by `dt` seconds from `pose`.
    pub fn tick(&mut self, dt: f32, pose: &AgentPose) -> TickOutput {
        let _span = tracing::debug_span!(spans::TICK, agent = %self.id).entered();
        let metrics = Arc::clone(&self.metrics);
        let _timing = metrics.timings.start(Phase::Tick);
        let dt = dt.max(0.0);
        self.pose = *pose;
        let position = pose.position;

        self.grid.fill(position, CellState::Explored);
        self.decay(dt);
        self.heading = self.update_look(dt, pose);
        if self.perception.tick(dt) {
            self.perceive(position);
        }
        self.visit(position);
        if self.waypoint_timer.advance(dt).is_some() {
            let was_target = self
                .destination
                .is_some_and(|d| planar_distance(position, d) <= self.config.agent.visit_threshold);
            self.memory.push_waypoint(position, was_target);
        }
        if self.hazard_timer.advance(dt).is_some() {
            self.check_hazard_detour(position);
        }
        self.progress_detour(position);
        if self.detour.is_none() && self.route_timer.advance(dt).is_some() {
            self.route(position, None);
        }

        AgentCounters::add(&metrics.counters.ticks, 1);
        TickOutput {
            destination: self.destination.unwrap_or(position),
            heading: self.heading,
            state: self.state(),
        }
    }

    // -----------------------------------------------------------------------
    // Phases
    // -----------------------------------------------------------------------

    fn decay(&mut self, dt: f32) {
        let Some(elapsed) = self.decay_timer.advance(dt) else {
            return;
        };
        let _timing = self.metrics.timings.start(Phase::Decay);
        let report = self.memory.decay(elapsed);
        let counters = &self.metrics.counters;
        AgentCounters::add(&counters.entities_forgotten, report.entities_forgotten.len() as u64);
        AgentCounters::add(&counters.paths_forgotten, report.paths_forgotten as u64);
        for key in report.entities_forgotten {
            if self.current_goal == Some(key) {
                self.current_goal = None;
            }
            self.events.push(AgentEvent::Forgotten { key });
        }
    }

    fn effective_look_time(&self) -> f32 {
        let detour_kind = self.detour.map(|d| d.kind);
        let heading_toward = detour_kind == Some(DetourKind::HeadTowardHazard);
        let backtracking = detour_kind == Some(DetourKind::Backtrack);
        if !heading_toward && (self.hazard_detected || backtracking) {
            self.config.agent.hazard_look_time
        } else {
            self.config.agent.look_time * (1.0 - 0.5 * self.drives[Drive::Curiosity])
        }
    }

    fn update_look(&mut self, dt: f32, pose: &AgentPose) -> Vec3 {
        let forward = pose.planar_forward();
        if let Some(look) = self.look.as_mut() {
            look.elapsed += dt;
            if look.finished() {
                self.look = None;
                self.look_timer.reset();
                self.events.push(AgentEvent::LookFinished);
                return forward;
            }
            return rotate_y(forward, look_offset(look.elapsed, look.duration, look.degrees));
        }
        self.look_timer.set_interval(self.effective_look_time());
        if self.look_timer.advance(dt).is_some() {
            self.look = Some(LookSweep {
                elapsed: 0.0,
                duration: self.config.agent.look_duration,
                degrees: self.config.agent.look_degrees,
            });
            self.events.push(AgentEvent::LookStarted);
            debug!(agent = %self.id, "Look-around started");
        }
        forward
    }

    fn perceive(&mut self, position: Vec3) {
        let _span = tracing::debug_span!(spans::PERCEPTION).entered();
        let _timing = self.metrics.timings.start(Phase::Perception);
        let eye = position + Vec3::unit_y() * self.config.agent.eye_height;
        let report = self.perception.process_perception(
            eye,
            self.heading,
            self.registry.as_ref(),
            self.occlusion.as_deref(),
            &mut self.memory,
        );
        AgentCounters::add(&self.metrics.counters.perception_passes, 1);
        for (key, kind) in report.discovered {
            self.events.push(AgentEvent::Perceived { key, kind });
        }
    }

    fn visit(&mut self, position: Vec3) {
        let threshold = self.config.agent.visit_threshold;
        let reached: Vec<EntityKey> = self
            .memory
            .unvisited()
            .filter(|m| planar_distance(m.position(), position) <= threshold)
            .map(|m| m.key())
            .collect();
        for key in reached {
            let Some(kind) = self.memory.mark_visited(key) else {
                continue;
            };
            info!(agent = %self.id, key = %key, kind = %kind, "Entity visited");
            self.events.push(AgentEvent::Visited { key, kind });
            self.vitals.apply_visit(kind, &mut self.events);
            if self.current_goal == Some(key) {
                self.current_goal = None;
            }
        }
    }

    /// Run a routing pass and adopt its winner. Returns the winner.
    fn route(&mut self, position: Vec3, exclusion: Option<HazardCluster>) -> Option<Candidate> {
        let _span = tracing::debug_span!(spans::SCORING).entered();
        let metrics = Arc::clone(&self.metrics);
        let _timing = metrics.timings.start(Phase::Scoring);
        let input = ScoringInput {
            position,
            heading: self.heading,
            drives: &self.drives,
            config: &self.config,
            health_fraction: self.vitals.fraction(),
            current_destination: self.destination,
            current_goal: self.current_goal,
            exclusion,
        };
        let pass = score_destinations(input, self.nav.as_ref(), &mut self.grid, &mut self.memory);

        let counters = &metrics.counters;
        AgentCounters::add(&counters.scoring_passes, 1);
        AgentCounters::add(&counters.candidates_scored, pass.candidates_scored as u64);

        let best = pass.best?;
        self.adopt(best);
        Some(best)
    }

    fn adopt(&mut self, candidate: Candidate) {
        let eps = self.config.agent.goal_match_epsilon;
        let changed = self
            .destination
            .is_none_or(|d| planar_distance(d, candidate.destination) > eps);
        if changed {
            debug!(
                agent = %self.id,
                x = candidate.destination.x,
                z = candidate.destination.z,
                score = candidate.score.value(),
                source = ?candidate.source,
                "Destination changed"
            );
            self.events.push(AgentEvent::DestinationChanged {
                from: self.destination,
                to: candidate.destination,
            });
        }
        self.destination = Some(candidate.destination);
        self.current_goal = match candidate.source {
            CandidateSource::Entity(key) => Some(key),
            CandidateSource::CurrentGoal => self.current_goal,
            CandidateSource::Explore { .. } => None,
        };
    }

    fn check_hazard_detour(&mut self, position: Vec3) {
        let Some(destination) = self.destination else {
            return;
        };
        let cluster = self.memory.hazard_cluster(destination);
        self.hazard_detected = cluster.is_some();
        let Some(cluster) = cluster else {
            return;
        };
        if self.detour.is_some() || self.memory.paths().is_empty() {
            return;
        }
        if planar_distance(position, destination) <= self.config.agent.detour_epsilon {
            return;
        }

        if self.drives.caution_dominant() {
            let retreat = self
                .memory
                .paths()
                .iter()
                .rev()
                .map(ExploreMemory::destination)
                .find(|p| cluster.is_outside(*p));
            let Some(target) = retreat else {
                debug!(agent = %self.id, "No remembered path leads out of the hazard area");
                return;
            };
            self.begin_detour(DetourKind::Backtrack, cluster, target);
        } else {
            if planar_distance(position, cluster.centroid) <= self.config.hazard.approach_radius {
                return;
            }
            self.begin_detour(DetourKind::HeadTowardHazard, cluster, cluster.centroid);
        }
    }

    fn begin_detour(&mut self, kind: DetourKind, cluster: HazardCluster, target: Vec3) {
        info!(
            agent = %self.id,
            ?kind,
            hazards = cluster.count,
            radius = cluster.radius,
            "Detour started"
        );
        self.detour = Some(Detour {
            kind,
            cluster,
            target,
            rerouted: false,
        });
        self.events.push(AgentEvent::DetourStarted {
            kind,
            target,
            centroid: cluster.centroid,
            radius: cluster.radius,
        });
        self.events.push(AgentEvent::DestinationChanged {
            from: self.destination,
            to: target,
        });
        self.destination = Some(target);
        self.current_goal = None;
        AgentCounters::add(&self.metrics.counters.detours_entered, 1);
    }

    fn progress_detour(&mut self, position: Vec3) {
        let Some(detour) = self.detour else {
            return;
        };
        if planar_distance(position, detour.target) > self.config.agent.detour_epsilon {
            return;
        }
        if detour.kind == DetourKind::Backtrack
            && !detour.rerouted
            && let Some(alternate) = self.route(position, Some(detour.cluster))
        {
            debug!(agent = %self.id, "Backtrack rerouted around hazards");
            self.detour = Some(Detour {
                target: alternate.destination,
                rerouted: true,
                ..detour
            });
            return;
        }
        self.end_detour();
    }

    fn end_detour(&mut self) {
        if let Some(detour) = self.detour.take() {
            info!(agent = %self.id, kind = ?detour.kind, "Detour ended");
            self.events.push(AgentEvent::DetourEnded { kind: detour.kind });
        }
        self.route_timer.reset();
        self.hazard_timer.reset();
    }

    // -----------------------------------------------------------------------
    // Control
    // -----------------------------------------------------------------------

    /// Abandon any detour or look-around and return to plain routing. The
    /// next tick re-scores immediately.
    pub fn cancel(&mut self) {
        if let Some(detour) = self.detour.take() {
            self.events.push(AgentEvent::DetourEnded { kind: detour.kind });
        }
        if self.look.take().is_some() {
            self.events.push(AgentEvent::LookFinished);
        }
        self.look_timer.reset();
        self.hazard_timer.reset();
        self.route_timer = IntervalTimer::primed(self.config.agent.route_compute_time);
    }

    /// Re-sample drives from a profile and re-derive everything that
    /// depends on them.
    pub fn apply_profile<R: Rng + ?Sized>(&mut self, profile: &AgentProfile, rng: &mut R) {
        self.set_drives(profile.sample(rng));
        info!(agent = %self.id, profile = %profile.name, "Profile applied");
    }

    /// Replace the drive scalars.
    pub fn set_drives(&mut self, drives: DriveScalars) {
        self.drives = drives;
        self.memory
            .set_forget_time(decay::forget_time(drives[Drive::Experience], &self.config.memory));
        self.look_timer.set_interval(self.effective_look_time());
    }

    /// Take every event queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Agent ID.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> AgentState {
        match (self.detour, self.look) {
            (Some(detour), _) => AgentState::Detour(detour.kind),
            (None, Some(_)) => AgentState::LookingAround,
            (None, None) => AgentState::Routing,
        }
    }

    /// Current destination.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    /// Entity the destination belongs to, if any.
    #[must_use]
    pub fn current_goal(&self) -> Option<EntityKey> {
        self.current_goal
    }

    /// Hazard cluster of the active detour.
    #[must_use]
    pub fn detour_cluster(&self) -> Option<HazardCluster> {
        self.detour.map(|d| d.cluster)
    }

    /// Whether the last hazard check found a hazardous area.
    #[must_use]
    pub fn hazard_detected(&self) -> bool {
        self.hazard_detected
    }

    /// Last camera heading.
    #[must_use]
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    /// Last pose reported by the host.
    #[must_use]
    pub fn pose(&self) -> AgentPose {
        self.pose
    }

    /// Drive scalars.
    #[must_use]
    pub fn drives(&self) -> &DriveScalars {
        &self.drives
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &WayfarerConfig {
        &self.config
    }

    /// Memory store.
    #[must_use]
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// Spatial memory grid.
    #[must_use]
    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// Health.
    #[must_use]
    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    /// Entities seen by the last perception pass.
    pub fn visible(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.perception.visible().iter().copied()
    }

    /// Metrics sink.
    #[must_use]
    pub fn metrics(&self) -> &Arc<AgentMetrics> {
        &self.metrics
    }

    /// Copy of the memory store.
    #[must_use]
    pub fn memory_snapshot(&self) -> MemorySnapshot {
        self.memory.snapshot(self.id)
    }

    /// Grid occupancy summary.
    #[must_use]
    pub fn grid_snapshot(&self) -> GridSnapshot {
        self.grid.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{RayHit, RegistryEntity};
    use crate::types::{Aabb, EntityKind};

    struct Flat;

    impl NavSurface for Flat {
        fn cast(&self, origin: Vec3, target: Vec3) -> RayHit {
            RayHit::clear(origin, target)
        }

        fn snap(&self, point: Vec3, _margin: f32) -> Vec3 {
            point
        }

        fn bounds(&self) -> Aabb {
            Aabb {
                min: Vec3::new(-30.0, 0.0, -30.0),
                max: Vec3::new(30.0, 2.0, 30.0),
            }
        }
    }

    struct Registry(Vec<RegistryEntity>);

    impl EntityRegistry for Registry {
        fn entities(&self) -> Vec<RegistryEntity> {
            self.0.clone()
        }
    }

    fn entity(key: u64, kind: EntityKind, x: f32, z: f32, always_known: bool) -> RegistryEntity {
        let position = Vec3::new(x, 0.0, z);
        RegistryEntity {
            key: EntityKey(key),
            kind,
            position,
            bounds: Aabb {
                min: position - Vec3::new(0.5, 0.0, 0.5),
                max: position + Vec3::new(0.5, 1.0, 0.5),
            },
            always_known,
        }
    }

    fn agent(entities: Vec<RegistryEntity>) -> Agent {
        AgentBuilder::new(WayfarerConfig::default())
            .nav(Arc::new(Flat))
            .registry(Arc::new(Registry(entities)))
            .build()
            .expect("valid agent")
    }

    #[test]
    fn build_requires_collaborators() {
        let err = AgentBuilder::new(WayfarerConfig::default())
            .registry(Arc::new(Registry(Vec::new())))
            .build()
            .err()
            .expect("missing nav");
        assert!(matches!(err, WayfarerError::MissingCollaborator("navigable surface")));

        let err = AgentBuilder::new(WayfarerConfig::default())
            .nav(Arc::new(Flat))
            .build()
            .err()
            .expect("missing registry");
        assert!(matches!(err, WayfarerError::MissingCollaborator("entity registry")));
    }

    #[test]
    fn always_known_entities_are_long_term() {
        let a = agent(vec![
            entity(1, EntityKind::GoalCompletion, 0.0, -20.0, true),
            entity(2, EntityKind::PointOfInterest, 5.0, 5.0, false),
        ]);
        let m = a.memory().entity(EntityKey(1)).expect("committed");
        assert!(m.unforgettable);
        assert!(a.memory().entity(EntityKey(2)).is_none());
    }

    #[test]
    fn first_tick_perceives_and_routes() {
        let mut a = agent(vec![entity(1, EntityKind::GoalMandatory, 0.0, 8.0, false)]);
        let out = a.tick(0.1, &AgentPose::at(Vec3::zero()));
        assert_eq!(out.destination, Vec3::new(0.0, 0.0, 8.0));
        assert_eq!(a.current_goal(), Some(EntityKey(1)));
        let events = a.drain_events();
        assert!(events.contains(&AgentEvent::Perceived {
            key: EntityKey(1),
            kind: EntityKind::GoalMandatory
        }));
        assert!(a.grid().explored_count() >= 1);
        assert_eq!(a.metrics().counters.snapshot().scoring_passes, 1);
    }

    #[test]
    fn reaching_an_enemy_hurts() {
        let mut a = agent(vec![entity(1, EntityKind::HazardEnemy, 0.0, 3.0, false)]);
        a.tick(0.1, &AgentPose::at(Vec3::zero()));
        a.tick(0.1, &AgentPose::at(Vec3::new(0.0, 0.0, 2.5)));
        assert!(a.memory().visited(EntityKey(1)));
        assert!((a.vitals().health() - 75.0).abs() < 1e-5);
        let events = a.drain_events();
        assert!(events.iter().any(|e| matches!(e, AgentEvent::Damaged { .. })));
    }

    #[test]
    fn look_sweep_goes_right_then_left() {
        assert_eq!(look_offset(0.0, 2.0, 60.0), 0.0);
        assert!((look_offset(0.5, 2.0, 60.0) - 60.0).abs() < 1e-4);
        assert!((look_offset(1.0, 2.0, 60.0)).abs() < 1e-4);
        assert!((look_offset(1.5, 2.0, 60.0) + 60.0).abs() < 1e-4);
        assert_eq!(look_offset(2.0, 2.0, 60.0), 0.0);
    }

    #[test]
    fn looks_around_on_schedule() {
        let mut a = AgentBuilder::new(WayfarerConfig::default())
            .drives(DriveScalars::uniform(0.0))
            .nav(Arc::new(Flat))
            .registry(Arc::new(Registry(Vec::new())))
            .build()
            .expect("valid agent");
        let pose = AgentPose::at(Vec3::zero());
        let mut started_at = None;
        for i in 0..60 {
            let out = a.tick(0.1, &pose);
            if out.state == AgentState::LookingAround && started_at.is_none() {
                started_at = Some(i);
            }
        }
        // Zero curiosity: look every 4 s, so the first sweep starts near tick 40.
        let started = started_at.expect("looked around");
        assert!((38..=41).contains(&started), "started at {started}");
        assert!(a.drain_events().contains(&AgentEvent::LookStarted));
    }

    #[test]
    fn cancel_returns_to_routing() {
        let mut a = agent(Vec::new());
        a.tick(0.1, &AgentPose::at(Vec3::zero()));
        a.cancel();
        assert_eq!(a.state(), AgentState::Routing);
        a.tick(0.1, &AgentPose::at(Vec3::zero()));
        assert_eq!(a.metrics().counters.snapshot().scoring_passes, 2);
    }

    #[test]
    fn profile_changes_forget_time() {
        let mut a = agent(Vec::new());
        let before = a.memory().forget_time();
        let veteran = AgentProfile::new("veteran").with_range(Drive::Experience, 1.0, 1.0);
        let mut rng = rand::thread_rng();
        a.apply_profile(&veteran, &mut rng);
        assert!(a.memory().forget_time() > before);
        assert!((a.memory().forget_time() - a.config().memory.max_forget_time).abs() < 1e-5);
    }
}
