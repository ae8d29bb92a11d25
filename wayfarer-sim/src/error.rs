//! Error types for the simulation host.

use thiserror::Error;
use wayfarer_core::WayfarerError;

/// Everything that can go wrong loading or running a level.
#[derive(Error, Debug)]
pub enum SimError {
    /// The level file is not valid TOML or does not match the schema.
    #[error("Level parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The level parsed but describes something unusable.
    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    /// Agent construction or configuration failed.
    #[error(transparent)]
    Core(#[from] WayfarerError),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, SimError>;
