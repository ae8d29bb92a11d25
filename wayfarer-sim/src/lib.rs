//! # wayfarer-sim
//!
//! A headless host for `wayfarer-core` agents.
//!
//! The level is a flat box world: an arena, solid wall boxes and tagged
//! entities, loaded from TOML. [`level::BoxLevel`] answers the agent's
//! navigation, occlusion and registry queries, [`follower::PathFollower`]
//! walks each agent toward the destination it picks, and
//! [`runner::Simulation`] ties them together into a fixed-step run.
//!
//! ## Modules
//!
//! - `level`: box-world level implementing the oracle traits
//! - `follower`: straight-line movement that stops at walls
//! - `scenario`: TOML level files
//! - `runner`: the run loop and its summary

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod follower;
pub mod level;
pub mod runner;
pub mod scenario;

pub use error::{Result, SimError};
pub use follower::PathFollower;
pub use level::BoxLevel;
pub use runner::{AgentSummary, RunSummary, Simulation};
pub use scenario::LevelSpec;
