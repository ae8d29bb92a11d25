//! # Wayfarer Core Library
//!
//! Engine-agnostic synthetic player for automated playtesting.
//!
//! An [`Agent`] walks a level the way a person might: it perceives what is
//! in view, keeps a decaying memory of it, maps what it has explored, and
//! keeps re-choosing a single destination by scoring remembered entities and
//! exploration directions against its behavioral drives:
//!
//! - **Curiosity**: open space and points of interest
//! - **Achievement**: optional goals and collectibles
//! - **Aggression / Adrenaline**: enemies and hazards
//! - **Caution**: avoiding danger, healing
//! - **Completion / Efficiency**: finishing the level
//! - **Experience**: how long memories last
//!
//! The host supplies the level through the [`oracle`] traits and drives the
//! agent with [`Agent::tick`], feeding back the pose its path follower
//! reached.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod config;
pub mod decay;
pub mod diagnostics;
pub mod drives;
pub mod error;
pub mod events;
pub mod grid;
pub mod hazard;
pub mod memory;
pub mod metrics;
pub mod oracle;
pub mod perception;
pub mod scoring;
pub mod timer;
pub mod types;
pub mod vitals;

pub use agent::{Agent, AgentBuilder, AgentState, TickOutput};
pub use config::WayfarerConfig;
pub use drives::{AgentProfile, Drive, DriveScalars, DriveWeights};
pub use error::{Result, WayfarerError};
pub use events::{AgentEvent, DetourKind};
pub use memory::MemoryStore;
pub use types::*;
