//! Scenario Tests: End-to-End Decision Flows
//!
//! Each scenario builds a small open level, drives an agent tick by tick and
//! checks the destination it hands to the path follower.

use std::sync::Arc;

use wayfarer_core::config::WayfarerConfig;
use wayfarer_core::oracle::{EntityRegistry, NavSurface, RayHit, RegistryEntity};
use wayfarer_core::{
    Aabb, AgentBuilder, AgentEvent, AgentPose, AgentState, DetourKind, Drive, DriveScalars, EntityKey,
    EntityKind, Vec3, approx_eq, planar_distance,
};

const DT: f32 = 0.1;

struct OpenLevel;

impl NavSurface for OpenLevel {
    fn cast(&self, origin: Vec3, target: Vec3) -> RayHit {
        RayHit::clear(origin, target)
    }

    fn snap(&self, point: Vec3, _margin: f32) -> Vec3 {
        point
    }

    fn bounds(&self) -> Aabb {
        Aabb {
            min: Vec3::new(-30.0, 0.0, -30.0),
            max: Vec3::new(30.0, 3.0, 30.0),
        }
    }
}

struct Markup(Vec<RegistryEntity>);

impl EntityRegistry for Markup {
    fn entities(&self) -> Vec<RegistryEntity> {
        self.0.clone()
    }
}

fn entity(key: u64, kind: EntityKind, x: f32, z: f32) -> RegistryEntity {
    let position = Vec3::new(x, 0.0, z);
    RegistryEntity {
        key: EntityKey(key),
        kind,
        position,
        bounds: Aabb {
            min: position - Vec3::new(0.5, 0.0, 0.5),
            max: position + Vec3::new(0.5, 1.8, 0.5),
        },
        always_known: false,
    }
}

fn build(drives: DriveScalars, entities: Vec<RegistryEntity>) -> wayfarer_core::Agent {
    AgentBuilder::new(WayfarerConfig::default())
        .drives(drives)
        .nav(Arc::new(OpenLevel))
        .registry(Arc::new(Markup(entities)))
        .build()
        .expect("valid agent")
}

fn guarded_goal() -> Vec<RegistryEntity> {
    vec![
        entity(1, EntityKind::GoalMandatory, 0.0, 20.0),
        entity(2, EntityKind::HazardEnemy, -2.0, 18.0),
        entity(3, EntityKind::HazardEnemy, 2.0, 18.0),
    ]
}

// ---------------------------------------------------------------------------
// Hazard detours
// ---------------------------------------------------------------------------

#[test]
fn aggressive_agent_heads_for_the_hazard_centroid() {
    let drives = DriveScalars::uniform(0.5)
        .with(Drive::Aggression, 1.0)
        .with(Drive::Adrenaline, 1.0)
        .with(Drive::Caution, 0.0);
    let mut agent = build(drives, guarded_goal());
    let pose = AgentPose::at(Vec3::zero());

    let mut out = agent.tick(DT, &pose);
    let chosen = out.destination;
    let hazards = [Vec3::new(-2.0, 0.0, 18.0), Vec3::new(2.0, 0.0, 18.0)];
    assert!(hazards.iter().all(|h| planar_distance(*h, chosen) <= 6.0));

    for _ in 0..60 {
        out = agent.tick(DT, &pose);
    }
    assert_eq!(out.state, AgentState::Detour(DetourKind::HeadTowardHazard));
    assert!(approx_eq(out.destination, Vec3::new(0.0, 0.0, 18.0), 1e-4));
    assert!(
        agent
            .drain_events()
            .iter()
            .any(|e| matches!(e, AgentEvent::DetourStarted { kind: DetourKind::HeadTowardHazard, .. }))
    );
    assert_eq!(agent.metrics().counters.snapshot().detours_entered, 1);
}

#[test]
fn head_toward_ends_on_arrival() {
    let drives = DriveScalars::uniform(0.5)
        .with(Drive::Aggression, 1.0)
        .with(Drive::Adrenaline, 1.0)
        .with(Drive::Caution, 0.0);
    let mut agent = build(drives, guarded_goal());
    for _ in 0..60 {
        agent.tick(DT, &AgentPose::at(Vec3::zero()));
    }
    let target = agent.destination().expect("detouring");
    let out = agent.tick(DT, &AgentPose::at(target));
    assert!(!matches!(out.state, AgentState::Detour(_)));
    assert!(agent.drain_events().contains(&AgentEvent::DetourEnded {
        kind: DetourKind::HeadTowardHazard
    }));
}

#[test]
fn heading_toward_hazards_keeps_the_normal_look_cadence() {
    let drives = DriveScalars::uniform(0.5)
        .with(Drive::Aggression, 1.0)
        .with(Drive::Adrenaline, 1.0)
        .with(Drive::Caution, 0.0);
    let mut agent = build(drives, guarded_goal());
    let pose = AgentPose::at(Vec3::zero());
    for _ in 0..61 {
        agent.tick(DT, &pose);
    }
    agent.drain_events();

    // 19 s at a 3 s interval plus a 2 s sweep; the hazard cadence would give 5+.
    let mut out = agent.tick(DT, &pose);
    for _ in 1..190 {
        out = agent.tick(DT, &pose);
    }
    assert_eq!(out.state, AgentState::Detour(DetourKind::HeadTowardHazard));
    let looks = agent
        .drain_events()
        .iter()
        .filter(|e| matches!(e, AgentEvent::LookStarted))
        .count();
    assert!((3..=4).contains(&looks), "{looks} look-arounds");
}

#[test]
fn cautious_agent_backtracks_along_remembered_paths() {
    let drives = DriveScalars::uniform(0.5)
        .with(Drive::Caution, 1.0)
        .with(Drive::Aggression, 0.0)
        .with(Drive::Adrenaline, 0.0)
        .with(Drive::Completion, 1.0)
        .with(Drive::Efficiency, 1.0);
    let mut agent = build(drives, guarded_goal());
    let pose = AgentPose::at(Vec3::zero());

    let first = agent.tick(DT, &pose);
    assert_eq!(first.destination, Vec3::new(0.0, 0.0, 20.0));

    let mut out = first;
    for _ in 0..60 {
        out = agent.tick(DT, &pose);
    }
    assert_eq!(out.state, AgentState::Detour(DetourKind::Backtrack));
    let cluster = agent.detour_cluster().expect("detouring");
    assert!(approx_eq(cluster.centroid, Vec3::new(0.0, 0.0, 18.0), 1e-4));
    assert!(planar_distance(out.destination, cluster.centroid) > cluster.radius);
    assert!(
        agent
            .memory()
            .paths()
            .iter()
            .any(|p| approx_eq(p.destination(), out.destination, 1e-4)),
        "retreat point is a recorded path destination"
    );

    // Reaching the retreat point picks an alternate outside the hazards.
    let retreat = out.destination;
    let out = agent.tick(DT, &AgentPose::at(retreat));
    assert_eq!(out.state, AgentState::Detour(DetourKind::Backtrack));
    assert!(cluster.is_outside(out.destination));
    assert!(planar_distance(out.destination, retreat) > agent.config().agent.detour_epsilon);

    // Reaching the alternate ends the detour.
    let out = agent.tick(DT, &AgentPose::at(out.destination));
    assert!(!matches!(out.state, AgentState::Detour(_)));
    assert!(agent.drain_events().contains(&AgentEvent::DetourEnded {
        kind: DetourKind::Backtrack
    }));
}

#[test]
fn single_hazard_does_not_trigger_a_detour() {
    let drives = DriveScalars::uniform(0.5).with(Drive::Caution, 1.0);
    let mut agent = build(
        drives,
        vec![
            entity(1, EntityKind::GoalMandatory, 0.0, 20.0),
            entity(2, EntityKind::HazardEnemy, -2.0, 18.0),
        ],
    );
    let mut out = agent.tick(DT, &AgentPose::at(Vec3::zero()));
    for _ in 0..60 {
        out = agent.tick(DT, &AgentPose::at(Vec3::zero()));
    }
    assert!(!matches!(out.state, AgentState::Detour(_)));
    assert!(!agent.hazard_detected());
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[test]
fn completion_goal_waits_for_the_mandatory_goal() {
    let drives = DriveScalars::zero()
        .with(Drive::Efficiency, 1.0)
        .with(Drive::Completion, 0.5);
    let mut exit = entity(2, EntityKind::GoalCompletion, 0.0, -8.0);
    exit.always_known = true;
    let mut agent = build(drives, vec![entity(1, EntityKind::GoalMandatory, 0.0, 6.0), exit]);

    let out = agent.tick(DT, &AgentPose::at(Vec3::zero()));
    assert_eq!(out.destination, Vec3::new(0.0, 0.0, 6.0));
    assert!(agent.memory().goals_remaining());

    let at_goal = AgentPose::at(Vec3::new(0.0, 0.0, 6.0));
    agent.tick(DT, &at_goal);
    assert!(agent.memory().visited(EntityKey(1)));
    assert!(!agent.memory().goals_remaining());

    let passes = agent.metrics().counters.snapshot().scoring_passes;
    let mut out = agent.tick(DT, &at_goal);
    while agent.metrics().counters.snapshot().scoring_passes == passes {
        out = agent.tick(DT, &at_goal);
    }
    assert_eq!(out.destination, Vec3::new(0.0, 0.0, -8.0));
    assert_eq!(agent.current_goal(), Some(EntityKey(2)));
}

#[test]
fn healthy_agent_collects_the_pickup_before_the_exit() {
    let drives = DriveScalars::zero()
        .with(Drive::Efficiency, 1.0)
        .with(Drive::Completion, 0.5)
        .with(Drive::Caution, 0.5);
    let mut pickup = entity(2, EntityKind::ResourcePreservation, 4.0, 10.0);
    pickup.always_known = true;
    let mut exit = entity(3, EntityKind::GoalCompletion, 0.0, -8.0);
    exit.always_known = true;
    let mut agent = build(drives, vec![entity(1, EntityKind::GoalMandatory, 0.0, 6.0), pickup, exit]);

    let out = agent.tick(DT, &AgentPose::at(Vec3::zero()));
    assert_eq!(out.destination, Vec3::new(0.0, 0.0, 6.0));

    let at_goal = AgentPose::at(Vec3::new(0.0, 0.0, 6.0));
    agent.tick(DT, &at_goal);
    assert!(agent.memory().visited(EntityKey(1)));
    assert!(agent.memory().goals_remaining());
    assert!((agent.vitals().fraction() - 1.0).abs() < 1e-6);

    let passes = agent.metrics().counters.snapshot().scoring_passes;
    let mut out = agent.tick(DT, &at_goal);
    while agent.metrics().counters.snapshot().scoring_passes == passes {
        out = agent.tick(DT, &at_goal);
    }
    assert_eq!(out.destination, Vec3::new(4.0, 0.0, 10.0));
    assert_eq!(agent.current_goal(), Some(EntityKey(2)));

    let at_pickup = AgentPose::at(Vec3::new(4.0, 0.0, 10.0));
    agent.tick(DT, &at_pickup);
    assert!(agent.memory().visited(EntityKey(2)));
    assert!(!agent.memory().goals_remaining());

    let passes = agent.metrics().counters.snapshot().scoring_passes;
    let mut out = agent.tick(DT, &at_pickup);
    while agent.metrics().counters.snapshot().scoring_passes == passes {
        out = agent.tick(DT, &at_pickup);
    }
    assert_eq!(out.destination, Vec3::new(0.0, 0.0, -8.0));
    assert_eq!(agent.current_goal(), Some(EntityKey(3)));
}

#[test]
fn identical_agents_make_identical_choices() {
    let markup = Arc::new(Markup(vec![
        entity(1, EntityKind::PointOfInterest, 5.0, 9.0),
        entity(2, EntityKind::ResourceAchievement, -6.0, 4.0),
        entity(3, EntityKind::HazardEnvironment, 1.0, 12.0),
    ]));
    let nav = Arc::new(OpenLevel);
    let make = || {
        AgentBuilder::new(WayfarerConfig::default())
            .nav(nav.clone())
            .registry(markup.clone())
            .build()
            .expect("valid agent")
    };
    let (mut a, mut b) = (make(), make());

    let mut pose = AgentPose::at(Vec3::zero());
    for _ in 0..100 {
        let oa = a.tick(DT, &pose);
        let ob = b.tick(DT, &pose);
        assert_eq!(oa.destination, ob.destination);
        assert_eq!(oa.state, ob.state);
        let step = oa.destination - pose.position;
        if step.magnitude() > 0.3 {
            pose.position += step.normalized() * 0.3;
        }
    }
    assert_eq!(a.memory().entity_count(), b.memory().entity_count());
    assert_eq!(a.grid().explored_count(), b.grid().explored_count());
}

#[test]
fn unknown_entities_are_never_visited() {
    let agent = build(DriveScalars::default(), Vec::new());
    assert!(!agent.memory().visited(EntityKey(42)));
    assert!(agent.memory().entity(EntityKey(42)).is_none());
}
