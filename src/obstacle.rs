/*
 * Obstacle Module
 *
 * Static ellipsoidal volumes the school steers around. An obstacle is a
 * sphere of `bounding_radius` stretched per axis by `scale` and then rotated.
 * "Sphere space" undoes the stretch (in the obstacle's own axes) so the
 * ellipsoid becomes a plain sphere of `bounding_radius`.
 */

use glam::{Quat, Vec3};
use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::error::RegistryError;

new_key_type! {
    /// Stable handle for a registered obstacle.
    pub struct ObstacleId;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vec3,
    pub bounding_radius: f32,
    pub scale: Vec3,
    pub rotation: Quat,
}

impl Obstacle {
    pub fn sphere(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            bounding_radius: radius,
            scale: Vec3::ONE,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn ellipsoid(position: Vec3, radius: f32, scale: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            bounding_radius: radius,
            scale,
            rotation,
        }
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if !self.position.is_finite() {
            return Err(RegistryError::NonFinitePosition(self.position));
        }
        if !(self.bounding_radius.is_finite() && self.bounding_radius > 0.0) {
            return Err(RegistryError::NonPositiveRadius(self.bounding_radius));
        }
        let scale = self.scale;
        if !(scale.is_finite() && scale.min_element() > 0.0) {
            return Err(RegistryError::DegenerateObstacle { scale });
        }
        Ok(())
    }

    pub fn inverse_scale(&self) -> Vec3 {
        Vec3::ONE / self.scale
    }

    /// Worst-case stretch factor for an agent radius in sphere space.
    ///
    /// Uses the largest inverse-scale component so thin axes are never
    /// underestimated.
    pub fn max_inverse_scale(&self) -> f32 {
        self.inverse_scale().max_element()
    }

    /// Map a world-space offset (relative to anything) into sphere space.
    pub fn to_sphere_space(&self, offset: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * offset;
        self.rotation * (local * self.inverse_scale())
    }

    /// Map a sphere-space vector back onto the real ellipsoid.
    pub fn from_sphere_space(&self, v: Vec3) -> Vec3 {
        let local = self.rotation.inverse() * v;
        self.rotation * (local * self.scale)
    }

    /// Rough horizontal footprint (X/Z half extents) for drawing.
    pub fn footprint(&self) -> (f32, f32) {
        let radius = self.bounding_radius;
        let x_axis = self.rotation * Vec3::new(self.scale.x * radius, 0.0, 0.0);
        let z_axis = self.rotation * Vec3::new(0.0, 0.0, self.scale.z * radius);
        (x_axis.length(), z_axis.length())
    }
}

/// Flat collection of obstacles with stable handles.
#[derive(Debug, Default)]
pub struct ObstacleRegistry {
    obstacles: SlotMap<ObstacleId, Obstacle>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, obstacle: Obstacle) -> Result<ObstacleId, RegistryError> {
        obstacle.validate()?;
        let id = self.obstacles.insert(obstacle);
        debug!(?id, position = ?obstacle.position, radius = obstacle.bounding_radius, "obstacle added");
        Ok(id)
    }

    pub fn remove(&mut self, id: ObstacleId) -> Result<Obstacle, RegistryError> {
        let obstacle = self
            .obstacles
            .remove(id)
            .ok_or(RegistryError::UnknownObstacle)?;
        debug!(?id, "obstacle removed");
        Ok(obstacle)
    }

    pub fn get(&self, id: ObstacleId) -> Option<&Obstacle> {
        self.obstacles.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObstacleId, &Obstacle)> {
        self.obstacles.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }
}
