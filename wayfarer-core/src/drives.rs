//! Behavioral drives: the agent's "personality".
//!
//! Every agent carries one [`DriveScalars`] value: a weight in `[0, 1]` for
//! each [`Drive`]. Entity kinds turn those weights into a base attraction via
//! the [`DriveWeights`] matrix, so a cautious agent is repelled by enemies
//! while an aggressive one seeks them out.
//!
//! Drive values are plain data. They are fixed for a run unless the host
//! applies a new [`AgentProfile`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WayfarerError};
use crate::types::EntityKind;

// ---------------------------------------------------------------------------
// Drive
// ---------------------------------------------------------------------------

/// A behavioral motivator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Drive {
    /// Seeks unexplored space and points of interest.
    Curiosity,
    /// Seeks collectibles and optional objectives.
    Achievement,
    /// Seeks fights.
    Aggression,
    /// Avoids hazards, values self-preservation.
    Caution,
    /// Seeks danger for its own sake.
    Adrenaline,
    /// Wants to finish objectives.
    Completion,
    /// Wants to finish quickly.
    Efficiency,
    /// Familiarity with games; lengthens memory retention.
    Experience,
}

impl Drive {
    /// Number of drives.
    pub const COUNT: usize = 8;

    /// Every drive, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Curiosity,
        Self::Achievement,
        Self::Aggression,
        Self::Caution,
        Self::Adrenaline,
        Self::Completion,
        Self::Efficiency,
        Self::Experience,
    ];

    /// Snake-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Curiosity => "curiosity",
            Self::Achievement => "achievement",
            Self::Aggression => "aggression",
            Self::Caution => "caution",
            Self::Adrenaline => "adrenaline",
            Self::Completion => "completion",
            Self::Efficiency => "efficiency",
            Self::Experience => "experience",
        }
    }
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Drive {
    type Err = WayfarerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| WayfarerError::UnknownDrive(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// DriveScalars
// ---------------------------------------------------------------------------

/// One weight in `[0, 1]` per drive.
///
/// Serialized as a `name → value` table. Unknown names and out-of-range
/// values are rejected on load; omitted drives default to `0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f32>", into = "BTreeMap<String, f32>")]
pub struct DriveScalars([f32; Drive::COUNT]);

impl DriveScalars {
    /// All drives at the same level (clamped to `[0, 1]`).
    #[must_use]
    pub fn uniform(value: f32) -> Self {
        Self([value.clamp(0.0, 1.0); Drive::COUNT])
    }

    /// All drives at zero.
    #[must_use]
    pub fn zero() -> Self {
        Self([0.0; Drive::COUNT])
    }

    /// Builder-style setter, clamping to `[0, 1]`.
    #[must_use]
    pub fn with(mut self, drive: Drive, value: f32) -> Self {
        self.set(drive, value);
        self
    }

    /// Set one drive, clamping to `[0, 1]`.
    pub fn set(&mut self, drive: Drive, value: f32) {
        self.0[drive as usize] = value.clamp(0.0, 1.0);
    }

    /// Read one drive.
    #[must_use]
    pub fn get(&self, drive: Drive) -> f32 {
        self.0[drive as usize]
    }

    /// Raw values in [`Drive::ALL`] order.
    #[must_use]
    pub fn as_array(&self) -> &[f32; Drive::COUNT] {
        &self.0
    }

    /// Caution outweighs the mean of aggression and adrenaline.
    #[must_use]
    pub fn caution_dominant(&self) -> bool {
        self.get(Drive::Caution) > 0.5 * (self.get(Drive::Aggression) + self.get(Drive::Adrenaline))
    }
}

impl Default for DriveScalars {
    fn default() -> Self {
        Self::uniform(0.5)
    }
}

impl Index<Drive> for DriveScalars {
    type Output = f32;

    fn index(&self, drive: Drive) -> &f32 {
        &self.0[drive as usize]
    }
}

impl IndexMut<Drive> for DriveScalars {
    fn index_mut(&mut self, drive: Drive) -> &mut f32 {
        &mut self.0[drive as usize]
    }
}

impl TryFrom<BTreeMap<String, f32>> for DriveScalars {
    type Error = WayfarerError;

    fn try_from(table: BTreeMap<String, f32>) -> Result<Self> {
        let mut scalars = Self::default();
        for (name, value) in table {
            let drive: Drive = name.parse()?;
            if !(0.0..=1.0).contains(&value) {
                return Err(WayfarerError::Config(format!(
                    "drive {drive} = {value} is outside [0, 1]"
                )));
            }
            scalars.0[drive as usize] = value;
        }
        Ok(scalars)
    }
}

impl From<DriveScalars> for BTreeMap<String, f32> {
    fn from(scalars: DriveScalars) -> Self {
        Drive::ALL
            .into_iter()
            .map(|d| (d.name().to_string(), scalars.get(d)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// DriveWeights: entity kind × drive coefficient matrix
// ---------------------------------------------------------------------------

/// How strongly each drive contributes to the attraction of each entity kind.
///
/// The base score of an entity is `Σ weights[kind][drive] × drives[drive]`.
/// Negative coefficients make a drive repel (caution against hazards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, BTreeMap<String, f32>>",
    into = "BTreeMap<String, BTreeMap<String, f32>>"
)]
pub struct DriveWeights([[f32; Drive::COUNT]; EntityKind::COUNT]);

impl DriveWeights {
    /// A matrix with every coefficient at zero.
    #[must_use]
    pub fn zero() -> Self {
        Self([[0.0; Drive::COUNT]; EntityKind::COUNT])
    }

    /// Set one coefficient.
    pub fn set(&mut self, kind: EntityKind, drive: Drive, coefficient: f32) {
        self.0[kind.index()][drive as usize] = coefficient;
    }

    /// Read one coefficient.
    #[must_use]
    pub fn get(&self, kind: EntityKind, drive: Drive) -> f32 {
        self.0[kind.index()][drive as usize]
    }

    /// Weighted sum of the drives for an entity kind.
    #[must_use]
    pub fn base_score(&self, kind: EntityKind, drives: &DriveScalars) -> f32 {
        self.0[kind.index()]
            .iter()
            .zip(drives.as_array())
            .map(|(w, d)| w * d)
            .sum()
    }
}

impl Default for DriveWeights {
    fn default() -> Self {
        use Drive::{Achievement, Adrenaline, Aggression, Caution, Completion, Curiosity, Efficiency};
        use EntityKind::{
            GoalCompletion, GoalMandatory, GoalOptional, HazardEnemy, HazardEnvironment,
            PointOfInterest, ResourceAchievement, ResourcePreservation,
        };

        let mut w = Self::zero();
        w.set(GoalMandatory, Completion, 1.0);
        w.set(GoalMandatory, Efficiency, 1.0);
        w.set(GoalOptional, Completion, 1.0);
        w.set(GoalOptional, Achievement, 0.5);
        w.set(GoalCompletion, Efficiency, 1.0);
        w.set(PointOfInterest, Curiosity, 1.0);
        w.set(HazardEnemy, Aggression, 1.0);
        w.set(HazardEnemy, Adrenaline, 1.0);
        w.set(HazardEnemy, Caution, -1.0);
        w.set(HazardEnvironment, Adrenaline, 1.0);
        w.set(HazardEnvironment, Caution, -1.0);
        w.set(ResourceAchievement, Achievement, 1.0);
        w.set(ResourcePreservation, Caution, 1.0);
        w
    }
}

impl TryFrom<BTreeMap<String, BTreeMap<String, f32>>> for DriveWeights {
    type Error = WayfarerError;

    /// Rows present in the table replace the default row entirely.
    fn try_from(table: BTreeMap<String, BTreeMap<String, f32>>) -> Result<Self> {
        let mut weights = Self::default();
        for (kind, row) in table {
            let kind: EntityKind = kind.parse()?;
            weights.0[kind.index()] = [0.0; Drive::COUNT];
            for (name, coefficient) in row {
                let drive: Drive = name.parse()?;
                if !coefficient.is_finite() {
                    return Err(WayfarerError::Config(format!(
                        "weight {kind}.{drive} is not finite"
                    )));
                }
                weights.set(kind, drive, coefficient);
            }
        }
        Ok(weights)
    }
}

impl From<DriveWeights> for BTreeMap<String, BTreeMap<String, f32>> {
    fn from(weights: DriveWeights) -> Self {
        EntityKind::ALL
            .into_iter()
            .map(|kind| {
                let row = Drive::ALL
                    .into_iter()
                    .filter(|d| weights.get(kind, *d) != 0.0)
                    .map(|d| (d.name().to_string(), weights.get(kind, d)))
                    .collect();
                (kind.name().to_string(), row)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Agent profiles
// ---------------------------------------------------------------------------

/// Inclusive sampling range for one drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl DriveRange {
    /// A range, with bounds clamped to `[0, 1]` and ordered.
    #[must_use]
    pub fn new(a: f32, b: f32) -> Self {
        let (a, b) = (a.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A degenerate range that always yields `value`.
    #[must_use]
    pub fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f32 {
        if self.max - self.min <= f32::EPSILON {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }
}

impl Default for DriveRange {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// A named population of players, described as per-drive ranges.
///
/// Applying a profile samples concrete [`DriveScalars`] for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileTable", into = "ProfileTable")]
pub struct AgentProfile {
    /// Display name.
    pub name: String,
    /// Range per drive. Missing drives sample from `[0, 1]`.
    pub ranges: BTreeMap<Drive, DriveRange>,
}

/// On-disk shape of a profile: drive ranges keyed by drive name.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProfileTable {
    name: String,
    #[serde(default)]
    ranges: BTreeMap<String, DriveRange>,
}

impl TryFrom<ProfileTable> for AgentProfile {
    type Error = WayfarerError;

    fn try_from(table: ProfileTable) -> Result<Self> {
        let mut profile = Self::new(table.name);
        for (name, range) in table.ranges {
            let drive: Drive = name.parse()?;
            profile.ranges.insert(drive, DriveRange::new(range.min, range.max));
        }
        Ok(profile)
    }
}

impl From<AgentProfile> for ProfileTable {
    fn from(profile: AgentProfile) -> Self {
        Self {
            name: profile.name,
            ranges: profile
                .ranges
                .into_iter()
                .map(|(drive, range)| (drive.name().to_string(), range))
                .collect(),
        }
    }
}

impl AgentProfile {
    /// An empty profile (every drive uniform in `[0, 1]`).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ranges: BTreeMap::new(),
        }
    }

    /// Builder-style range setter.
    #[must_use]
    pub fn with_range(mut self, drive: Drive, min: f32, max: f32) -> Self {
        self.ranges.insert(drive, DriveRange::new(min, max));
        self
    }

    /// Built-in profiles used by the reference host.
    ///
    /// # Errors
    /// Returns `WayfarerError::UnknownProfile` for an unrecognized name.
    pub fn preset(name: &str) -> Result<Self> {
        let profile = match name {
            "explorer" => Self::new(name)
                .with_range(Drive::Curiosity, 0.8, 1.0)
                .with_range(Drive::Efficiency, 0.0, 0.3)
                .with_range(Drive::Caution, 0.3, 0.6),
            "achiever" => Self::new(name)
                .with_range(Drive::Achievement, 0.8, 1.0)
                .with_range(Drive::Completion, 0.6, 1.0),
            "speedrunner" => Self::new(name)
                .with_range(Drive::Efficiency, 0.8, 1.0)
                .with_range(Drive::Completion, 0.7, 1.0)
                .with_range(Drive::Curiosity, 0.0, 0.2)
                .with_range(Drive::Experience, 0.7, 1.0),
            "cautious" => Self::new(name)
                .with_range(Drive::Caution, 0.8, 1.0)
                .with_range(Drive::Aggression, 0.0, 0.2)
                .with_range(Drive::Adrenaline, 0.0, 0.2),
            "brawler" => Self::new(name)
                .with_range(Drive::Aggression, 0.8, 1.0)
                .with_range(Drive::Adrenaline, 0.6, 1.0)
                .with_range(Drive::Caution, 0.0, 0.2),
            _ => return Err(WayfarerError::UnknownProfile(name.to_string())),
        };
        Ok(profile)
    }

    /// Sample concrete drive values for one agent.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DriveScalars {
        let mut scalars = DriveScalars::zero();
        for drive in Drive::ALL {
            let range = self.ranges.get(&drive).copied().unwrap_or_default();
            scalars.set(drive, range.sample(rng));
        }
        scalars
    }
}
