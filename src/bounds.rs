/*
 * World Bounds Module
 *
 * The axis-aligned box every agent lives in. The same value feeds the
 * agents' hard position clamp and the boundary-avoidance force; if the two
 * disagreed, agents would oscillate at the walls.
 */

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::steering::MIN_DISTANCE;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBounds {
    pub half_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub half_z: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            half_x: 20.0,
            min_y: -8.0,
            max_y: 8.0,
            half_z: 20.0,
        }
    }
}

impl WorldBounds {
    pub fn min(&self) -> Vec3 {
        Vec3::new(-self.half_x, self.min_y, -self.half_z)
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.half_x, self.max_y, self.half_z)
    }

    pub fn center(&self) -> Vec3 {
        (self.min() + self.max()) * 0.5
    }

    // Componentwise clamp into the box
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        position.max(self.min()).min(self.max())
    }

    pub fn contains(&self, position: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        position.x >= min.x
            && position.x <= max.x
            && position.y >= min.y
            && position.y <= max.y
            && position.z >= min.z
            && position.z <= max.z
    }

    /// Inverse-distance push away from each of the six walls.
    ///
    /// A wall contributes only while the position is inside the box and
    /// closer than `radius` to it. The magnitude is `1 / distance`, with the
    /// distance floored at `MIN_DISTANCE`, so the push dominates every other
    /// force right at the wall.
    pub fn avoidance_force(&self, position: Vec3, radius: f32) -> Vec3 {
        let min = self.min();
        let max = self.max();
        let mut force = Vec3::ZERO;

        // (distance to wall, inward normal)
        let walls = [
            (position.x - min.x, Vec3::X),
            (max.x - position.x, -Vec3::X),
            (position.y - min.y, Vec3::Y),
            (max.y - position.y, -Vec3::Y),
            (position.z - min.z, Vec3::Z),
            (max.z - position.z, -Vec3::Z),
        ];

        for (distance, inward) in walls {
            if distance >= 0.0 && distance < radius {
                force += inward / distance.max(MIN_DISTANCE);
            }
        }

        force
    }
}
