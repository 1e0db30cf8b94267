/*
 * Error Module
 *
 * Typed errors for configuration loading and registry mutation.
 * The per-frame update itself never fails: degenerate geometry falls back
 * to defined defaults instead of raising.
 */

use glam::Vec3;
use thiserror::Error;

/// Problems with a `SimulationParams` value or the file it came from.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Rejected registry mutations.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// Zero, negative or non-finite scale would make the inverse scale blow up.
    #[error("obstacle scale must be positive and finite on every axis, got {scale:?}")]
    DegenerateObstacle { scale: Vec3 },
    #[error("radius must be positive and finite, got {0}")]
    NonPositiveRadius(f32),
    #[error("position must be finite, got {0:?}")]
    NonFinitePosition(Vec3),
    #[error("no such obstacle")]
    UnknownObstacle,
    #[error("no such bait")]
    UnknownBait,
    #[error("no such fish")]
    UnknownFish,
}
