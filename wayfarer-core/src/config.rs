//! Configuration for the wayfarer agent.
//!
//! Maps directly to a `wayfarer.toml` file. Every field has a default, so an
//! empty file (or `WayfarerConfig::default()`) yields a working agent.

use serde::{Deserialize, Serialize};

use crate::drives::DriveWeights;
use crate::error::{Result, WayfarerError};

/// Top-level agent configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WayfarerConfig {
    /// Timers and thresholds of the decision loop.
    #[serde(default)]
    pub agent: AgentConfig,
    /// View frustum and perception rate.
    #[serde(default)]
    pub perception: PerceptionConfig,
    /// Exploration fan and raycast sampling.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Memory retention.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Spatial memory grid layout.
    #[serde(default)]
    pub grid: GridConfig,
    /// Hazard-density detection and detours.
    #[serde(default)]
    pub hazard: HazardConfig,
    /// Health model.
    #[serde(default)]
    pub vitals: VitalsConfig,
    /// Entity kind × drive coefficients.
    #[serde(default)]
    pub weights: DriveWeights,
}

impl WayfarerConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `WayfarerError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| WayfarerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values the decision loop cannot run with.
    ///
    /// # Errors
    /// Returns `WayfarerError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("agent.route_compute_time", self.agent.route_compute_time),
            ("agent.look_duration", self.agent.look_duration),
            ("agent.waypoint_interval", self.agent.waypoint_interval),
            ("agent.hazard_check_interval", self.agent.hazard_check_interval),
            ("perception.perception_compute_time", self.perception.perception_compute_time),
            ("perception.horizontal_fov", self.perception.horizontal_fov),
            ("perception.vertical_fov", self.perception.vertical_fov),
            ("perception.far_plane", self.perception.far_plane),
            ("scoring.explore_degrees", self.scoring.explore_degrees),
            ("scoring.invisible_explore_degrees", self.scoring.invisible_explore_degrees),
            ("scoring.max_cast_distance", self.scoring.max_cast_distance),
            ("grid.cell_size", self.grid.cell_size),
            ("hazard.hazard_range", self.hazard.hazard_range),
            ("vitals.max_health", self.vitals.max_health),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(WayfarerError::Config(format!("{name} must be > 0 (got {value})")));
            }
        }
        if self.perception.horizontal_fov > 360.0 {
            return Err(WayfarerError::Config(
                "perception.horizontal_fov must be <= 360".to_string(),
            ));
        }
        if self.memory.min_forget_time > self.memory.max_forget_time {
            return Err(WayfarerError::Config(
                "memory.min_forget_time must not exceed memory.max_forget_time".to_string(),
            ));
        }
        if self.agent.waypoint_capacity == 0 {
            return Err(WayfarerError::Config(
                "agent.waypoint_capacity must be at least 1".to_string(),
            ));
        }
        if let Some(bounds) = &self.grid.bounds {
            if bounds.max_x <= bounds.min_x || bounds.max_z <= bounds.min_z {
                return Err(WayfarerError::Config("grid.bounds is empty".to_string()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Timers and thresholds of the decision loop (seconds, world units).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Distance at which an entity counts as visited.
    #[serde(default = "default_1_0")]
    pub visit_threshold: f32,
    /// Seconds between destination re-scores.
    #[serde(default = "default_1_0")]
    pub route_compute_time: f32,
    /// Seconds between look-around sweeps, before curiosity scaling.
    #[serde(default = "default_4_0")]
    pub look_time: f32,
    /// Look interval used while a hazardous area is detected or backtracking.
    #[serde(default = "default_1_5")]
    pub hazard_look_time: f32,
    /// Seconds one full sweep takes.
    #[serde(default = "default_2_0")]
    pub look_duration: f32,
    /// Sweep half-angle in degrees.
    #[serde(default = "default_60_0")]
    pub look_degrees: f32,
    /// Seconds between waypoint records.
    #[serde(default = "default_1_0")]
    pub waypoint_interval: f32,
    /// Waypoint ring buffer capacity.
    #[serde(default = "default_256")]
    pub waypoint_capacity: usize,
    /// Camera height above the feet position.
    #[serde(default = "default_eye_height")]
    pub eye_height: f32,
    /// Arrival radius for detour targets.
    #[serde(default = "default_0_5")]
    pub detour_epsilon: f32,
    /// Seconds between hazard-density checks.
    #[serde(default = "default_5_0")]
    pub hazard_check_interval: f32,
    /// Bonus for keeping the current, unreached destination.
    #[serde(default = "default_1_0")]
    pub existing_goal_bias: f32,
    /// Candidates this close to the current destination count as "the same goal".
    #[serde(default = "default_0_5")]
    pub goal_match_epsilon: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            visit_threshold: 1.0,
            route_compute_time: 1.0,
            look_time: 4.0,
            hazard_look_time: 1.5,
            look_duration: 2.0,
            look_degrees: 60.0,
            waypoint_interval: 1.0,
            waypoint_capacity: 256,
            eye_height: 1.6,
            detour_epsilon: 0.5,
            hazard_check_interval: 5.0,
            existing_goal_bias: 1.0,
            goal_match_epsilon: 0.5,
        }
    }
}

/// View frustum and perception rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerceptionConfig {
    /// Seconds between visibility passes.
    #[serde(default = "default_0_25")]
    pub perception_compute_time: f32,
    /// Horizontal field of view in degrees.
    #[serde(default = "default_90_0")]
    pub horizontal_fov: f32,
    /// Vertical field of view in degrees.
    #[serde(default = "default_60_0")]
    pub vertical_fov: f32,
    /// Near clip distance.
    #[serde(default = "default_0_1")]
    pub near_plane: f32,
    /// Far clip distance.
    #[serde(default = "default_50_0")]
    pub far_plane: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            perception_compute_time: 0.25,
            horizontal_fov: 90.0,
            vertical_fov: 60.0,
            near_plane: 0.1,
            far_plane: 50.0,
        }
    }
}

/// Exploration fan and raycast sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Angular step of the visible exploration arc (degrees).
    #[serde(default = "default_5_0")]
    pub explore_degrees: f32,
    /// Angular step of the remembered (out-of-view) arc (degrees).
    #[serde(default = "default_30_0")]
    pub invisible_explore_degrees: f32,
    /// Longest exploration raycast.
    #[serde(default = "default_20_0")]
    pub max_cast_distance: f32,
    /// Samples per grid raycast.
    #[serde(default = "default_20_usize")]
    pub max_cast_samples: usize,
    /// Exploration targets are pulled back this far from the hit point.
    #[serde(default = "default_1_0")]
    pub explore_target_margin: f32,
    /// Search radius handed to the closest-walkable-point oracle.
    #[serde(default = "default_2_0")]
    pub snap_margin: f32,
    /// Keep exploration targets this far inside the grid border.
    #[serde(default = "default_0_5")]
    pub border_margin: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            explore_degrees: 5.0,
            invisible_explore_degrees: 30.0,
            max_cast_distance: 20.0,
            max_cast_samples: 20,
            explore_target_margin: 1.0,
            snap_margin: 2.0,
            border_margin: 0.5,
        }
    }
}

/// Memory retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Forget time of a completely inexperienced agent (seconds).
    #[serde(default = "default_15_0")]
    pub min_forget_time: f32,
    /// Forget time of a fully experienced agent (seconds).
    #[serde(default = "default_60_0")]
    pub max_forget_time: f32,
    /// Seconds between decay passes; `0` decays every tick.
    #[serde(default)]
    pub decay_interval: f32,
    /// Path memories closer than this in origin, direction and distance are merged.
    #[serde(default = "default_0_25")]
    pub path_match_epsilon: f32,
    /// Hard cap on remembered paths; oldest impressions are dropped first.
    #[serde(default = "default_2048")]
    pub max_paths: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_forget_time: 15.0,
            max_forget_time: 60.0,
            decay_interval: 0.0,
            path_match_epsilon: 0.25,
            max_paths: 2048,
        }
    }
}

/// Explicit XZ extents of the spatial memory grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    /// Minimum world X.
    pub min_x: f32,
    /// Minimum world Z.
    pub min_z: f32,
    /// Maximum world X.
    pub max_x: f32,
    /// Maximum world Z.
    pub max_z: f32,
}

/// Spatial memory grid layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Cell edge length in world units.
    #[serde(default = "default_1_0")]
    pub cell_size: f32,
    /// Explicit extents. `None` autogenerates them from the navigable surface.
    #[serde(default)]
    pub bounds: Option<GridBounds>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: 1.0,
            bounds: None,
        }
    }
}

/// How the hazard centroid and radius average over nearby hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CentroidDivisor {
    /// Divide by the number of hazards actually found.
    #[default]
    Collected,
    /// Divide by the configured hazard limit.
    HazardLimit,
}

/// Hazard-density detection and detours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardConfig {
    /// Radius around the destination searched for hazards.
    #[serde(default = "default_10_0")]
    pub hazard_range: f32,
    /// Hazards within range needed to call an area hazardous.
    #[serde(default = "default_2_usize")]
    pub hazard_limit: usize,
    /// Aggressive agents closer than this to the centroid do not re-engage.
    #[serde(default = "default_1_5")]
    pub approach_radius: f32,
    /// Averaging rule for the hazard cluster.
    #[serde(default)]
    pub centroid_divisor: CentroidDivisor,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            hazard_range: 10.0,
            hazard_limit: 2,
            approach_radius: 1.5,
            centroid_divisor: CentroidDivisor::Collected,
        }
    }
}

/// Health model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsConfig {
    /// Starting and maximum health.
    #[serde(default = "default_100_0")]
    pub max_health: f32,
    /// Health lost when reaching an enemy.
    #[serde(default = "default_25_0")]
    pub enemy_damage: f32,
    /// Health lost when reaching an environmental hazard.
    #[serde(default = "default_10_0")]
    pub environment_damage: f32,
    /// Health restored by a preservation resource.
    #[serde(default = "default_40_0")]
    pub preservation_heal: f32,
}

impl Default for VitalsConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            enemy_damage: 25.0,
            environment_damage: 10.0,
            preservation_heal: 40.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_eye_height() -> f32 { 1.6 }
fn default_0_1() -> f32 { 0.1 }
fn default_0_25() -> f32 { 0.25 }
fn default_0_5() -> f32 { 0.5 }
fn default_1_0() -> f32 { 1.0 }
fn default_1_5() -> f32 { 1.5 }
fn default_2_0() -> f32 { 2.0 }
fn default_4_0() -> f32 { 4.0 }
fn default_5_0() -> f32 { 5.0 }
fn default_10_0() -> f32 { 10.0 }
fn default_15_0() -> f32 { 15.0 }
fn default_20_0() -> f32 { 20.0 }
fn default_25_0() -> f32 { 25.0 }
fn default_30_0() -> f32 { 30.0 }
fn default_40_0() -> f32 { 40.0 }
fn default_50_0() -> f32 { 50.0 }
fn default_60_0() -> f32 { 60.0 }
fn default_90_0() -> f32 { 90.0 }
fn default_100_0() -> f32 { 100.0 }
fn default_2_usize() -> usize { 2 }
fn default_20_usize() -> usize { 20 }
fn default_256() -> usize { 256 }
fn default_2048() -> usize { 2048 }
