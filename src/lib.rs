/*
 * Fish School Simulation - Module Definitions
 *
 * This file defines the module structure of the school simulation core and
 * its optional nannou viewer. The core has no rendering dependencies: the
 * viewer modules only compile with the `viewer` feature.
 */

// Re-export key components for easier access
pub use avoidance::{avoidance_force, penetration_correction, Avoidance};
pub use bait::{Bait, BaitId, BaitRegistry};
pub use bounds::WorldBounds;
pub use debug::TickStats;
pub use error::{ConfigError, RegistryError};
pub use events::SimEvent;
pub use fish::{Fish, FishId};
pub use flock::{FlockingEngine, GoalZone};
pub use obstacle::{Obstacle, ObstacleId, ObstacleRegistry};
pub use params::{
    AvoidSide, AvoidanceParams, FishParams, FlockingParams, NeighborBackend, PredatorParams,
    SimulationParams,
};
pub use predator::{Predator, PredatorId};
pub use spawn::SpawnVolume;
pub use steering::Steerable;

#[cfg(feature = "viewer")]
pub use app::Model;
#[cfg(feature = "viewer")]
pub use camera::Camera;

// Simulation core
pub mod avoidance;
pub mod bait;
pub mod bounds;
pub mod debug;
pub mod error;
pub mod events;
pub mod fish;
pub mod flock;
pub mod neighbors;
pub mod obstacle;
pub mod params;
pub mod predator;
pub mod spawn;
pub mod steering;

// Viewer
#[cfg(feature = "viewer")]
pub mod app;
#[cfg(feature = "viewer")]
pub mod camera;
#[cfg(feature = "viewer")]
pub mod input;
#[cfg(feature = "viewer")]
pub mod renderer;
#[cfg(feature = "viewer")]
pub mod ui;
