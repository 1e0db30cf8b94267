/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * tunable weights and radii of the school simulation. Game-feel tuning
 * happens here, so nothing in the force code is a magic number.
 * Parameters can be loaded from JSON and are edited live by the viewer UI.
 */

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bounds::WorldBounds;
use crate::error::ConfigError;

/// How the neighborhood pass finds candidate neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NeighborBackend {
    /// Every living fish against every other, O(n²).
    #[default]
    BruteForce,
    /// Uniform 3D grid with cell size equal to the perception radius.
    Grid,
}

/// Which way an agent dodges an obstacle that sits exactly on its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AvoidSide {
    /// Coin flip per decision, so a school does not dodge in lockstep.
    Random,
    /// Always the local +X side.
    #[default]
    FixedAxis,
}

// Flocking weights and radii
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingParams {
    pub perception_radius: f32,
    pub separation_radius: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub seek_weight: f32,
    pub obstacle_weight: f32,
    pub boundary_weight: f32,
    /// Distance from a wall at which the boundary push starts.
    pub boundary_radius: f32,
    pub bait_consumption_radius: f32,
    pub neighbor_backend: NeighborBackend,
}

impl Default for FlockingParams {
    fn default() -> Self {
        Self {
            perception_radius: 3.0,
            separation_radius: 1.0,
            separation_weight: 1.5,
            alignment_weight: 0.4,
            cohesion_weight: 0.3,
            seek_weight: 1.0,
            obstacle_weight: 4.0,
            boundary_weight: 3.0,
            boundary_radius: 2.0,
            bait_consumption_radius: 0.6,
            neighbor_backend: NeighborBackend::BruteForce,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FishParams {
    pub max_speed: f32,
    pub max_force: f32,
    pub mass: f32,
    pub bounding_radius: f32,
    /// Slerp factor applied to the orientation each tick.
    pub turn_smoothness: f32,
    /// Extra yaw (radians) to line the visual model up with its heading.
    pub model_yaw_offset: f32,
    pub initial_speed: f32,
}

impl Default for FishParams {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            max_force: 5.0,
            mass: 1.0,
            bounding_radius: 0.3,
            turn_smoothness: 0.1,
            model_yaw_offset: std::f32::consts::FRAC_PI_2,
            initial_speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorParams {
    pub max_speed: f32,
    /// Per-tick velocity change budget.
    pub max_force: f32,
    pub bounding_radius: f32,
    pub detection_radius: f32,
    pub capture_radius: f32,
    pub capture_enabled: bool,
    pub wander_radius: f32,
    pub wander_distance: f32,
    pub wander_jitter: f32,
    pub obstacle_weight: f32,
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            max_speed: 2.4,
            max_force: 0.08,
            bounding_radius: 0.8,
            detection_radius: 8.0,
            capture_radius: 0.7,
            capture_enabled: true,
            wander_radius: 1.5,
            wander_distance: 3.0,
            wander_jitter: 0.3,
            obstacle_weight: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvoidanceParams {
    /// Look-ahead length at rest; doubles at full speed.
    pub detection_box_min_length: f32,
    pub lateral_gain: f32,
    /// Weight of vertical steering relative to horizontal.
    pub vertical_factor: f32,
    pub proximity_gain: f32,
    pub panic_distance: f32,
    pub panic_boost: f32,
    pub braking_weight: f32,
    pub avoid_side: AvoidSide,
    pub correction_strength: f32,
    pub correction_bias: f32,
    /// Fraction of the velocity aimed at an obstacle's center removed on contact.
    pub approach_damping: f32,
}

impl Default for AvoidanceParams {
    fn default() -> Self {
        Self {
            detection_box_min_length: 5.0,
            lateral_gain: 1.0,
            vertical_factor: 0.5,
            proximity_gain: 3.0,
            panic_distance: 1.5,
            panic_boost: 2.0,
            braking_weight: 0.2,
            avoid_side: AvoidSide::FixedAxis,
            correction_strength: 10.0,
            correction_bias: 0.1,
            approach_damping: 1.0,
        }
    }
}

// Parameters for the simulation that can be adjusted via UI or a config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub flocking: FlockingParams,
    pub fish: FishParams,
    pub predator: PredatorParams,
    pub avoidance: AvoidanceParams,
    pub bounds: WorldBounds,
    /// Seed for the engine's random source; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    /// Frame deltas above this are logged. They are never clamped.
    pub large_step_warning: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            flocking: FlockingParams::default(),
            fish: FishParams::default(),
            predator: PredatorParams::default(),
            avoidance: AvoidanceParams::default(),
            bounds: WorldBounds::default(),
            rng_seed: None,
            large_step_warning: 0.25,
        }
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl SimulationParams {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let params: Self = serde_json::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let flocking = &self.flocking;
        if !positive(flocking.perception_radius) {
            return Err(ConfigError::Invalid("perception_radius must be positive"));
        }
        if !positive(flocking.separation_radius) {
            return Err(ConfigError::Invalid("separation_radius must be positive"));
        }
        if flocking.separation_radius > flocking.perception_radius {
            return Err(ConfigError::Invalid(
                "separation_radius must not exceed perception_radius",
            ));
        }
        if !positive(flocking.boundary_radius) {
            return Err(ConfigError::Invalid("boundary_radius must be positive"));
        }
        if !positive(flocking.bait_consumption_radius) {
            return Err(ConfigError::Invalid("bait_consumption_radius must be positive"));
        }

        let fish = &self.fish;
        if !positive(fish.max_speed) || !positive(fish.max_force) {
            return Err(ConfigError::Invalid("fish max_speed and max_force must be positive"));
        }
        if !positive(fish.mass) {
            return Err(ConfigError::Invalid("fish mass must be positive"));
        }
        if !positive(fish.bounding_radius) {
            return Err(ConfigError::Invalid("fish bounding_radius must be positive"));
        }
        if !(fish.turn_smoothness > 0.0 && fish.turn_smoothness <= 1.0) {
            return Err(ConfigError::Invalid("turn_smoothness must be in (0, 1]"));
        }

        let predator = &self.predator;
        if !positive(predator.max_speed) || !positive(predator.max_force) {
            return Err(ConfigError::Invalid(
                "predator max_speed and max_force must be positive",
            ));
        }
        if !positive(predator.bounding_radius)
            || !positive(predator.detection_radius)
            || !positive(predator.capture_radius)
        {
            return Err(ConfigError::Invalid("predator radii must be positive"));
        }

        if !positive(self.avoidance.detection_box_min_length) {
            return Err(ConfigError::Invalid("detection_box_min_length must be positive"));
        }

        let bounds = &self.bounds;
        if !positive(bounds.half_x) || !positive(bounds.half_z) {
            return Err(ConfigError::Invalid("world half extents must be positive"));
        }
        if !(bounds.min_y < bounds.max_y) {
            return Err(ConfigError::Invalid("world min_y must be below max_y"));
        }

        Ok(())
    }

    // Parameter ranges for UI sliders
    pub fn weight_range() -> std::ops::RangeInclusive<f32> {
        0.0..=10.0
    }

    pub fn radius_range() -> std::ops::RangeInclusive<f32> {
        0.1..=10.0
    }

    pub fn speed_range() -> std::ops::RangeInclusive<f32> {
        0.1..=10.0
    }

    pub fn smoothness_range() -> std::ops::RangeInclusive<f32> {
        0.01..=1.0
    }
}
