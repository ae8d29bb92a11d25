//! Headless run loop.
//!
//! Every agent shares one level and owns its memory. Each step ticks the
//! agents, walks them toward their destinations and applies the world side
//! of their visits: consumed pickups disappear for everyone, and reaching
//! an exit finishes that agent's run.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};
use wayfarer_core::metrics::MetricsSnapshot;
use wayfarer_core::{
    Agent, AgentBuilder, AgentEvent, AgentId, AgentPose, AgentProfile, DriveScalars,
    EntityKey, EntityKind, Vec3,
};

use crate::error::Result;
use crate::follower::PathFollower;
use crate::level::BoxLevel;
use crate::scenario::LevelSpec;

/// Pickups that vanish from the level once reached.
fn consumable(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::ResourceAchievement | EntityKind::ResourcePreservation)
}

// ---------------------------------------------------------------------------
// Per-agent state
// ---------------------------------------------------------------------------

struct AgentRun {
    agent: Agent,
    pose: AgentPose,
    distance: f32,
    visits: Vec<(EntityKey, EntityKind)>,
    detours: usize,
    finished_at: Option<f32>,
    log: Vec<AgentEvent>,
}

/// Outcome of one agent's run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    /// Agent identifier.
    pub id: AgentId,
    /// Drives the agent ran with.
    pub drives: DriveScalars,
    /// Simulated second at which the agent reached the exit.
    pub finished_at: Option<f32>,
    /// Distance walked.
    pub distance: f32,
    /// Entities reached, in order.
    pub visits: Vec<(EntityKey, EntityKind)>,
    /// Hazard detours started.
    pub detours: usize,
    /// Entities still remembered at the end.
    pub remembered: usize,
    /// Grid cells marked explored.
    pub explored_cells: usize,
    /// Health left.
    pub health: f32,
    /// Last position.
    pub final_position: Vec3,
    /// Counters and latency at the end of the run.
    pub metrics: MetricsSnapshot,
}

/// Outcome of a whole simulation.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Level name.
    pub level: String,
    /// Simulated seconds run.
    pub elapsed: f32,
    /// Ticks run.
    pub ticks: u64,
    /// One entry per agent, in spawn order.
    pub agents: Vec<AgentSummary>,
}

impl RunSummary {
    /// Agents that reached the exit.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.agents.iter().filter(|a| a.finished_at.is_some()).count()
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// A level plus the agents walking it.
pub struct Simulation {
    name: String,
    level: Arc<BoxLevel>,
    follower: PathFollower,
    dt: f32,
    duration: f32,
    stop_on_exit: bool,
    elapsed: f32,
    ticks: u64,
    runs: Vec<AgentRun>,
}

impl Simulation {
    /// Spawn `agents` agents into the level described by `spec`.
    ///
    /// Drives come from `spec.drives` when set, otherwise from the level's
    /// profile (or `profile_override`) sampled with a generator seeded from
    /// `spec.seed`, so the same seed always yields the same population.
    ///
    /// # Errors
    /// Returns an error if an agent cannot be built.
    pub fn new(spec: &LevelSpec, agents: usize, profile_override: Option<&AgentProfile>) -> Result<Self> {
        let level = Arc::new(spec.build_level());
        let mut rng = StdRng::seed_from_u64(spec.seed);
        let profile = profile_override.or(spec.profile.as_ref());
        let pose = spec.spawn_pose();

        let mut runs = Vec::with_capacity(agents);
        for _ in 0..agents {
            let mut builder = AgentBuilder::new(spec.config.clone())
                .nav(level.clone())
                .registry(level.clone())
                .occlusion(level.clone());
            builder = match (spec.drives, profile) {
                (Some(drives), _) => builder.drives(drives),
                (None, Some(profile)) => builder.profile(profile, &mut rng),
                (None, None) => builder,
            };
            let agent = builder.build()?;
            debug!(agent = %agent.id(), drives = ?agent.drives(), "Agent spawned");
            runs.push(AgentRun {
                agent,
                pose,
                distance: 0.0,
                visits: Vec::new(),
                detours: 0,
                finished_at: None,
                log: Vec::new(),
            });
        }
        info!(level = %spec.name, agents, entities = level.entity_count(), "Simulation ready");

        Ok(Self {
            name: spec.name.clone(),
            level,
            follower: spec.follower,
            dt: spec.dt,
            duration: spec.duration,
            stop_on_exit: spec.has_completion_goal(),
            elapsed: 0.0,
            ticks: 0,
            runs,
        })
    }

    /// The shared level.
    #[must_use]
    pub fn level(&self) -> &Arc<BoxLevel> {
        &self.level
    }

    /// Simulated seconds so far.
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Agents in spawn order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.runs.iter().map(|r| &r.agent)
    }

    /// Events each agent produced so far, in spawn order.
    pub fn event_logs(&self) -> impl Iterator<Item = &[AgentEvent]> {
        self.runs.iter().map(|r| r.log.as_slice())
    }

    /// Whether every agent is done or time ran out.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.elapsed >= self.duration
            || (self.stop_on_exit && self.runs.iter().all(|r| r.finished_at.is_some()))
    }

    /// Advance every unfinished agent by one tick.
    pub fn step(&mut self) {
        let dt = self.dt;
        self.elapsed += dt;
        self.ticks += 1;
        for run in &mut self.runs {
            if run.finished_at.is_some() {
                continue;
            }
            let out = run.agent.tick(dt, &run.pose);
            run.distance += self
                .follower
                .step(self.level.as_ref(), &mut run.pose, out.destination, dt);

            for event in run.agent.drain_events() {
                match event {
                    AgentEvent::Visited { key, kind } => {
                        run.visits.push((key, kind));
                        if consumable(kind) && self.level.remove(key) {
                            debug!(agent = %run.agent.id(), key = %key, "Pickup consumed");
                        }
                        if kind == EntityKind::GoalCompletion && run.finished_at.is_none() {
                            run.finished_at = Some(self.elapsed);
                            info!(agent = %run.agent.id(), at = self.elapsed, "Exit reached");
                        }
                    }
                    AgentEvent::DetourStarted { .. } => run.detours += 1,
                    AgentEvent::Depleted => {
                        warn!(agent = %run.agent.id(), at = self.elapsed, "Agent out of health");
                    }
                    _ => {}
                }
                run.log.push(event);
            }
        }
    }

    /// Step until [`Self::is_done`] and summarize.
    pub fn run(&mut self) -> RunSummary {
        while !self.is_done() {
            self.step();
        }
        let summary = self.summary();
        info!(
            level = %summary.level,
            elapsed = summary.elapsed,
            finished = summary.finished(),
            agents = summary.agents.len(),
            "Simulation finished"
        );
        summary
    }

    /// Summary of the run so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            level: self.name.clone(),
            elapsed: self.elapsed,
            ticks: self.ticks,
            agents: self
                .runs
                .iter()
                .map(|run| AgentSummary {
                    id: run.agent.id(),
                    drives: *run.agent.drives(),
                    finished_at: run.finished_at,
                    distance: run.distance,
                    visits: run.visits.clone(),
                    detours: run.detours,
                    remembered: run.agent.memory().entity_count(),
                    explored_cells: run.agent.grid().explored_count(),
                    health: run.agent.vitals().health(),
                    final_position: run.pose.position,
                    metrics: run.agent.metrics().snapshot(),
                })
                .collect(),
        }
    }
}
