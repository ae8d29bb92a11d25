//! Error types for the wayfarer core library.

use thiserror::Error;

/// Top-level error type for all wayfarer operations.
#[derive(Error, Debug)]
pub enum WayfarerError {
    /// A collaborator the agent cannot run without was not supplied.
    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Configuration error (bad TOML, out-of-range values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A drive name did not match any known drive.
    #[error("Unknown drive: {0}")]
    UnknownDrive(String),

    /// A profile name did not match any registered profile.
    #[error("Unknown profile: {0}")]
    UnknownProfile(String),

    /// A grid coordinate fell outside the spatial memory grid.
    #[error("Grid position out of bounds: ({x:.2}, {z:.2})")]
    OutOfBounds {
        /// World X.
        x: f32,
        /// World Z.
        z: f32,
    },

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, WayfarerError>;
