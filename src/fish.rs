/*
 * Fish Module
 *
 * This module defines the Fish struct, the passive prey agent of the school.
 * Each tick the engine hands it a summed steering force built from:
 * 1. Separation: push away from crowding neighbors (quadratic falloff)
 * 2. Alignment: head the way the neighbors are heading
 * 3. Cohesion: drift toward the neighbors' centroid
 * 4. Seek: chase the nearest bait
 * plus obstacle and wall avoidance, then integrates it into motion.
 */

use glam::{Quat, Vec3};

use crate::bounds::WorldBounds;
use crate::params::FishParams;
use crate::steering::{self, Steerable, MIN_DISTANCE, SPEED_EPSILON_SQ};

/// Index of a fish in the engine's school. Fish are never removed
/// individually, so the index stays valid until the school is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FishId(pub usize);

#[derive(Debug, Clone)]
pub struct Fish {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Smoothed heading; local -Z points where the fish swims.
    pub rotation: Quat,
    pub max_speed: f32,
    pub max_force: f32,
    pub mass: f32,
    pub bounding_radius: f32,
    pub turn_smoothness: f32,
    pub model_yaw_offset: f32,
    alive: bool,
    reached_goal: bool,
    was_dead: bool,
}

impl Fish {
    pub fn new(position: Vec3, velocity: Vec3, params: &FishParams) -> Self {
        let velocity = steering::limit(velocity, params.max_speed);
        Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            rotation: steering::heading_rotation(velocity).unwrap_or(Quat::IDENTITY),
            max_speed: params.max_speed,
            max_force: params.max_force,
            mass: params.mass,
            bounding_radius: params.bounding_radius,
            turn_smoothness: params.turn_smoothness,
            model_yaw_offset: params.model_yaw_offset,
            alive: true,
            reached_goal: false,
            was_dead: false,
        }
    }

    // Re-read tunables after a live parameter change
    pub fn apply_params(&mut self, params: &FishParams) {
        self.max_speed = params.max_speed;
        self.max_force = params.max_force;
        self.mass = params.mass;
        self.bounding_radius = params.bounding_radius;
        self.turn_smoothness = params.turn_smoothness;
        self.model_yaw_offset = params.model_yaw_offset;
        self.velocity = steering::limit(self.velocity, self.max_speed);
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn has_reached_goal(&self) -> bool {
        self.reached_goal
    }

    /// Alive and still swimming: the only fish the simulation touches.
    pub fn is_active(&self) -> bool {
        self.alive && !self.reached_goal
    }

    /// Kill the fish. Returns `true` only on the first call, so the caller
    /// reports the death exactly once no matter how often this is invoked.
    pub fn die(&mut self) -> bool {
        self.alive = false;
        if self.was_dead {
            return false;
        }
        self.was_dead = true;
        true
    }

    /// Park the fish in the goal. Returns `true` on the transition.
    pub fn reach_goal(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.reached_goal = true;
        true
    }

    // Apply a force to the fish
    pub fn apply_force(&mut self, force: Vec3) {
        if !self.is_active() {
            return;
        }
        self.acceleration += force / self.mass;
    }

    /// Integrate the accumulated force over `dt`.
    pub fn integrate(&mut self, dt: f32, bounds: &WorldBounds) {
        if !self.is_active() {
            return;
        }

        self.acceleration = steering::limit(self.acceleration, self.max_force);

        self.velocity += self.acceleration * dt;
        self.velocity = steering::limit(self.velocity, self.max_speed);

        self.position += self.velocity * dt;

        // Final safety net, independent of the wall force
        self.position = bounds.clamp(self.position);

        if self.velocity.length_squared() > SPEED_EPSILON_SQ {
            if let Some(target) = steering::heading_rotation(self.velocity) {
                self.rotation = self
                    .rotation
                    .slerp(target, self.turn_smoothness)
                    .normalize();
            }
        }

        self.acceleration = Vec3::ZERO;
    }

    /// Orientation for drawing: heading plus the model's yaw correction.
    pub fn render_rotation(&self) -> Quat {
        self.rotation * Quat::from_rotation_y(self.model_yaw_offset)
    }

    // Separation force (push away from neighbors inside `radius`)
    pub fn separation(
        &self,
        index: usize,
        school: &[Fish],
        neighbor_indices: &[usize],
        radius: f32,
    ) -> Vec3 {
        let mut steering = Vec3::ZERO;
        let radius_sq = radius * radius;

        for &i in neighbor_indices {
            let other = &school[i];
            let offset = self.position - other.position;
            let distance_sq = offset.length_squared();
            if distance_sq >= radius_sq {
                continue;
            }

            let distance = distance_sq.sqrt().max(MIN_DISTANCE);
            let direction = if distance_sq > SPEED_EPSILON_SQ {
                offset / distance_sq.sqrt()
            } else if index < i {
                // Stacked on top of each other: split along X by index
                Vec3::X
            } else {
                -Vec3::X
            };

            // Quadratic falloff: near neighbors repel much harder
            steering += direction / (distance * distance);
        }

        steering
    }

    // Alignment force (direction of the neighbors' average velocity)
    pub fn alignment(&self, school: &[Fish], neighbor_indices: &[usize]) -> Vec3 {
        if neighbor_indices.is_empty() {
            return Vec3::ZERO;
        }

        let mut sum = Vec3::ZERO;
        for &i in neighbor_indices {
            sum += school[i].velocity;
        }

        steering::safe_normalize(sum / neighbor_indices.len() as f32)
    }

    // Cohesion force (direction toward the neighbors' centroid)
    pub fn cohesion(&self, school: &[Fish], neighbor_indices: &[usize]) -> Vec3 {
        if neighbor_indices.is_empty() {
            return Vec3::ZERO;
        }

        let mut centroid = Vec3::ZERO;
        for &i in neighbor_indices {
            centroid += school[i].position;
        }
        centroid /= neighbor_indices.len() as f32;

        steering::safe_normalize(centroid - self.position)
    }

    // Reynolds seek: desired velocity minus current velocity
    pub fn seek(&self, target: Vec3) -> Vec3 {
        let desired = steering::safe_normalize(target - self.position) * self.max_speed;
        desired - self.velocity
    }
}

impl Steerable for Fish {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn orientation(&self) -> Quat {
        self.rotation
    }

    fn max_speed(&self) -> f32 {
        self.max_speed
    }

    fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }
}
