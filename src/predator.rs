/*
 * Predator Module
 *
 * The hunter. Each tick it picks the nearest living fish inside its
 * detection radius and seeks it, or wanders when nothing is in range.
 * Predators never flock; they only share the obstacle math with the school
 * through the `Steerable` trait.
 */

use glam::{Quat, Vec3};
use rand::Rng;

use crate::bounds::WorldBounds;
use crate::fish::{Fish, FishId};
use crate::params::PredatorParams;
use crate::steering::{self, Steerable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PredatorId(pub usize);

#[derive(Debug, Clone)]
pub struct Predator {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub max_speed: f32,
    /// Per-tick velocity change budget.
    pub max_force: f32,
    pub bounding_radius: f32,
    pub detection_radius: f32,
    pub capture_radius: f32,
    pub wander_radius: f32,
    pub wander_distance: f32,
    pub wander_jitter: f32,
    /// Offset of the wander point from the projected circle's center.
    wander_target: Vec3,
    /// Fish chased during the current tick, if any.
    pub target: Option<FishId>,
}

impl Predator {
    pub fn new(position: Vec3, velocity: Vec3, params: &PredatorParams) -> Self {
        let heading = steering::safe_normalize(velocity);
        let heading = if heading == Vec3::ZERO { -Vec3::Z } else { heading };
        Self {
            position,
            velocity: steering::limit(velocity, params.max_speed),
            acceleration: Vec3::ZERO,
            max_speed: params.max_speed,
            max_force: params.max_force,
            bounding_radius: params.bounding_radius,
            detection_radius: params.detection_radius,
            capture_radius: params.capture_radius,
            wander_radius: params.wander_radius,
            wander_distance: params.wander_distance,
            wander_jitter: params.wander_jitter,
            wander_target: heading * params.wander_radius,
            target: None,
        }
    }

    pub fn apply_params(&mut self, params: &PredatorParams) {
        self.max_speed = params.max_speed;
        self.max_force = params.max_force;
        self.bounding_radius = params.bounding_radius;
        self.detection_radius = params.detection_radius;
        self.capture_radius = params.capture_radius;
        self.wander_radius = params.wander_radius;
        self.wander_distance = params.wander_distance;
        self.wander_jitter = params.wander_jitter;
        self.velocity = steering::limit(self.velocity, self.max_speed);
    }

    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    /// Nearest swimming fish inside the detection radius.
    pub fn find_target(&self, school: &[Fish]) -> Option<FishId> {
        let radius_sq = self.detection_radius * self.detection_radius;
        let mut best = None;
        let mut best_distance_sq = radius_sq;

        for (i, fish) in school.iter().enumerate() {
            if !fish.is_active() {
                continue;
            }
            let distance_sq = fish.position.distance_squared(self.position);
            if distance_sq < best_distance_sq {
                best_distance_sq = distance_sq;
                best = Some(FishId(i));
            }
        }

        best
    }

    // Steering toward a point, limited to the force budget
    pub fn seek(&self, target: Vec3) -> Vec3 {
        let desired = steering::safe_normalize(target - self.position) * self.max_speed;
        steering::limit(desired - self.velocity, self.max_force)
    }

    /// Random walk on a circle projected ahead of the predator.
    ///
    /// The wander point persists between ticks and only jitters a little,
    /// so the path meanders instead of twitching.
    pub fn wander<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec3 {
        let jitter = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        ) * self.wander_jitter;

        let moved = steering::safe_normalize(self.wander_target + jitter);
        self.wander_target = if moved == Vec3::ZERO {
            self.heading() * self.wander_radius
        } else {
            moved * self.wander_radius
        };

        let center = self.position + self.heading() * self.wander_distance;
        self.seek(center + self.wander_target)
    }

    pub fn heading(&self) -> Vec3 {
        let heading = steering::safe_normalize(self.velocity);
        if heading == Vec3::ZERO {
            -Vec3::Z
        } else {
            heading
        }
    }

    /// A fish can be taken while it is still swimming and within reach.
    pub fn can_capture(&self, fish: &Fish) -> bool {
        fish.is_active() && fish.position.distance(self.position) < self.capture_radius
    }

    /// Integrate one tick. Acceleration is a per-tick impulse, not a rate,
    /// so it is not scaled by `dt`.
    pub fn integrate(&mut self, dt: f32, bounds: &WorldBounds) {
        self.acceleration = steering::limit(self.acceleration, self.max_force);

        self.velocity += self.acceleration;
        self.velocity = steering::limit(self.velocity, self.max_speed);

        self.position += self.velocity * dt;
        self.position = bounds.clamp(self.position);

        self.acceleration = Vec3::ZERO;
    }
}

impl Steerable for Predator {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    // Built on demand from the velocity
    fn orientation(&self) -> Quat {
        steering::heading_rotation(self.velocity).unwrap_or(Quat::IDENTITY)
    }

    fn max_speed(&self) -> f32 {
        self.max_speed
    }

    fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }
}
