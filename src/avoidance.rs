/*
 * Obstacle Avoidance Module
 *
 * Two independent layers keep agents out of obstacles:
 * 1. A predictive steering force from a forward detection box whose length
 *    grows with speed. Only the closest threat on the path is answered.
 * 2. A penetration correction run after integration. It nudges the velocity
 *    (never the position) of any agent found overlapping an obstacle, so
 *    motion stays continuous even when steering was not enough.
 *
 * Both work in sphere space (see `Obstacle::to_sphere_space`) so stretched
 * and rotated ellipsoids are handled like spheres, and both take any
 * `Steerable`, which is how fish and predators share them.
 */

use glam::Vec3;
use rand::Rng;
use tracing::trace;

use crate::obstacle::{ObstacleId, ObstacleRegistry};
use crate::params::{AvoidSide, AvoidanceParams};
use crate::steering::{self, Steerable, MIN_DISTANCE};

/// Lateral offsets below this count as dead ahead.
const DEAD_AHEAD_EPSILON: f32 = 1.0e-3;

/// Result of the steering layer for one agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avoidance {
    pub force: Vec3,
    pub obstacle: ObstacleId,
    /// Distance along the heading to the answered obstacle.
    pub distance: f32,
}

struct Threat {
    id: ObstacleId,
    along: f32,
    /// Obstacle center in agent-local sphere space.
    sphere_local: Vec3,
    radius: f32,
}

/// Look-ahead length for an agent moving at `speed`.
pub fn detection_length(params: &AvoidanceParams, speed: f32, max_speed: f32) -> f32 {
    params.detection_box_min_length * (1.0 + speed / max_speed.max(MIN_DISTANCE))
}

/// Steering force away from the closest obstacle inside the detection box.
///
/// Returns `None` when nothing is ahead and within reach.
pub fn avoidance_force<S, R>(
    agent: &S,
    obstacles: &ObstacleRegistry,
    params: &AvoidanceParams,
    rng: &mut R,
) -> Option<Avoidance>
where
    S: Steerable + ?Sized,
    R: Rng + ?Sized,
{
    if obstacles.is_empty() {
        return None;
    }

    let box_length = detection_length(params, agent.speed(), agent.max_speed());
    let rotation = agent.orientation();
    let to_local = rotation.inverse();
    let position = agent.position();

    let mut closest: Option<Threat> = None;

    for (id, obstacle) in obstacles.iter() {
        let offset = obstacle.position - position;
        let local = to_local * offset;

        // Forward is -Z: anything at or behind the agent is ignored
        if local.z >= 0.0 {
            continue;
        }
        let along = -local.z;
        if along > box_length {
            continue;
        }

        let sphere_local = to_local * obstacle.to_sphere_space(offset);
        let radius = obstacle.bounding_radius + agent.bounding_radius() * obstacle.max_inverse_scale();
        let lateral = (sphere_local.x * sphere_local.x + sphere_local.y * sphere_local.y).sqrt();
        if lateral >= radius {
            continue;
        }

        if closest.as_ref().map_or(true, |threat| along < threat.along) {
            closest = Some(Threat {
                id,
                along,
                sphere_local,
                radius,
            });
        }
    }

    let threat = closest?;
    let obstacle = obstacles.get(threat.id)?;

    // Quadratic ease-in as the obstacle gets closer, plus a panic boost
    let proximity = (1.0 - threat.along / box_length).clamp(0.0, 1.0);
    let mut multiplier = 1.0 + params.proximity_gain * proximity * proximity;
    if params.panic_distance > 0.0 && threat.along < params.panic_distance {
        multiplier += params.panic_boost * (1.0 - threat.along / params.panic_distance);
    }

    let offset = threat.sphere_local;
    let lateral = (offset.x * offset.x + offset.y * offset.y).sqrt();
    let away = if lateral < DEAD_AHEAD_EPSILON {
        let side = match params.avoid_side {
            AvoidSide::FixedAxis => 1.0,
            AvoidSide::Random => {
                if rng.gen_bool(0.5) {
                    1.0
                } else {
                    -1.0
                }
            }
        };
        Vec3::new(side, 0.0, 0.0)
    } else {
        Vec3::new(-offset.x / lateral, -offset.y / lateral, 0.0)
    };

    let push = (threat.radius - lateral) * multiplier * params.lateral_gain;
    let sphere_along = -offset.z;
    // Local +Z is backwards
    let braking = (sphere_along - threat.radius).max(0.0) * params.braking_weight;

    let local_force = Vec3::new(
        away.x * push,
        away.y * push * params.vertical_factor,
        braking,
    );

    let world_force = obstacle.from_sphere_space(rotation * local_force);

    Some(Avoidance {
        force: world_force,
        obstacle: threat.id,
        distance: threat.along,
    })
}

/// Push an overlapping agent back out through its velocity.
///
/// For every obstacle the agent overlaps, the velocity component aimed at
/// the obstacle's center is damped and a horizontal outward push scaled by
/// `(depth + bias) * strength` is added. The position is left untouched.
/// Returns the number of obstacles that needed correcting.
pub fn penetration_correction<S>(
    agent: &mut S,
    obstacles: &ObstacleRegistry,
    params: &AvoidanceParams,
) -> usize
where
    S: Steerable + ?Sized,
{
    let mut corrections = 0;

    for obstacle in obstacles.values() {
        let offset = agent.position() - obstacle.position;
        let sphere = obstacle.to_sphere_space(offset);
        let threshold = obstacle.bounding_radius + agent.bounding_radius() * obstacle.max_inverse_scale();
        let distance = sphere.length();
        if distance >= threshold {
            continue;
        }

        let depth = threshold - distance;

        let mut push = if distance > MIN_DISTANCE {
            obstacle.from_sphere_space(sphere / distance)
        } else {
            Vec3::X
        };
        // Vertical pushes make agents bob over the top; keep it horizontal
        push.y = 0.0;
        let push = match steering::safe_normalize(push) {
            v if v == Vec3::ZERO => Vec3::X,
            v => v,
        };

        let mut velocity = agent.velocity();
        let to_center = steering::safe_normalize(-offset);
        let approach = velocity.dot(to_center);
        if approach > 0.0 {
            velocity -= to_center * approach * params.approach_damping;
        }
        velocity += push * (depth + params.correction_bias) * params.correction_strength;

        trace!(depth, ?push, "penetration corrected");
        agent.set_velocity(steering::limit(velocity, agent.max_speed()));
        corrections += 1;
    }

    corrections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fish::Fish;
    use crate::obstacle::Obstacle;
    use crate::params::FishParams;
    use glam::Quat;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn fish(position: Vec3, velocity: Vec3) -> Fish {
        Fish::new(
            position,
            velocity,
            &FishParams {
                max_speed: 2.0,
                bounding_radius: 0.3,
                ..FishParams::default()
            },
        )
    }

    fn unit_sphere_registry() -> ObstacleRegistry {
        let mut registry = ObstacleRegistry::new();
        registry.add(Obstacle::sphere(Vec3::ZERO, 1.0)).unwrap();
        registry
    }

    #[test]
    fn detection_box_grows_with_speed() {
        let params = AvoidanceParams::default();
        assert!((detection_length(&params, 0.0, 2.0) - 5.0).abs() < 1e-6);
        assert!((detection_length(&params, 2.0, 2.0) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn obstacle_ahead_in_range_brakes_and_swerves() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let agent = fish(Vec3::new(0.0, 0.0, -6.0), Vec3::new(0.0, 0.0, 2.0));
        let avoidance = avoidance_force(&agent, &registry, &params, &mut rng).unwrap();
        assert!(avoidance.force.length() > 0.0);
        // Braking pushes against the +Z heading
        assert!(avoidance.force.z < 0.0);
        // Dead ahead still produces a sideways dodge
        assert!(avoidance.force.x.abs() > 0.0);
        assert!((avoidance.distance - 6.0).abs() < 1e-4);
    }

    #[test]
    fn obstacle_beyond_detection_box_is_ignored() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        // Nearly at rest the box is only ~5 long
        let agent = fish(Vec3::new(0.0, 0.0, -6.0), Vec3::new(0.0, 0.0, 0.01));
        assert!(avoidance_force(&agent, &registry, &params, &mut rng).is_none());
    }

    #[test]
    fn obstacle_behind_is_ignored() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let agent = fish(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, 2.0));
        assert!(avoidance_force(&agent, &registry, &params, &mut rng).is_none());
    }

    #[test]
    fn obstacle_off_the_path_is_ignored() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let agent = fish(Vec3::new(3.0, 0.0, -4.0), Vec3::new(0.0, 0.0, 2.0));
        assert!(avoidance_force(&agent, &registry, &params, &mut rng).is_none());
    }

    #[test]
    fn offset_obstacle_pushes_to_the_far_side() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        // Obstacle sits slightly to the agent's -X side
        let agent = fish(Vec3::new(0.5, 0.0, -4.0), Vec3::new(0.0, 0.0, 2.0));
        let avoidance = avoidance_force(&agent, &registry, &params, &mut rng).unwrap();
        assert!(avoidance.force.x > 0.0);
    }

    #[test]
    fn closer_threat_wins() {
        let mut registry = ObstacleRegistry::new();
        registry.add(Obstacle::sphere(Vec3::new(0.0, 0.0, 4.0), 1.0)).unwrap();
        let near = registry.add(Obstacle::sphere(Vec3::new(0.0, 0.0, 1.0), 1.0)).unwrap();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let agent = fish(Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, 2.0));
        let avoidance = avoidance_force(&agent, &registry, &params, &mut rng).unwrap();
        assert_eq!(avoidance.obstacle, near);
    }

    #[test]
    fn stretched_obstacle_is_detected_along_its_long_axis() {
        let mut registry = ObstacleRegistry::new();
        // Long along X: a sphere of radius 1 would miss an agent 3 units off center
        registry
            .add(Obstacle::ellipsoid(
                Vec3::ZERO,
                1.0,
                Vec3::new(5.0, 1.0, 1.0),
                Quat::IDENTITY,
            ))
            .unwrap();
        let params = AvoidanceParams::default();
        let mut rng = SmallRng::seed_from_u64(1);

        let agent = fish(Vec3::new(3.0, 0.0, -4.0), Vec3::new(0.0, 0.0, 2.0));
        assert!(avoidance_force(&agent, &registry, &params, &mut rng).is_some());
    }

    #[test]
    fn random_side_choice_still_dodges() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams {
            avoid_side: AvoidSide::Random,
            ..AvoidanceParams::default()
        };
        let mut rng = SmallRng::seed_from_u64(99);
        let agent = fish(Vec3::new(0.0, 0.0, -3.0), Vec3::new(0.0, 0.0, 2.0));
        for _ in 0..10 {
            let avoidance = avoidance_force(&agent, &registry, &params, &mut rng).unwrap();
            assert!(avoidance.force.x.abs() > 0.1);
        }
    }

    #[test]
    fn correction_pushes_overlapping_agent_outward() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();

        // Inside on the -Z side, swimming toward the center
        let mut agent = fish(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 2.0));
        let corrections = penetration_correction(&mut agent, &registry, &params);
        assert_eq!(corrections, 1);
        assert!(agent.velocity.z < 0.0);
        assert!(agent.velocity.length() <= agent.max_speed + 1e-5);
        // Position is never teleported
        assert_eq!(agent.position, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn correction_keeps_push_horizontal() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();

        let mut agent = fish(Vec3::new(0.3, 0.9, 0.0), Vec3::ZERO);
        penetration_correction(&mut agent, &registry, &params);
        assert!(agent.velocity.y.abs() < 1e-6);
        assert!(agent.velocity.x > 0.0);
    }

    #[test]
    fn correction_at_the_center_uses_a_fixed_direction() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();

        let mut agent = fish(Vec3::ZERO, Vec3::ZERO);
        penetration_correction(&mut agent, &registry, &params);
        assert!(agent.velocity.is_finite());
        assert!(agent.velocity.x > 0.0);
    }

    #[test]
    fn no_correction_when_clear() {
        let registry = unit_sphere_registry();
        let params = AvoidanceParams::default();

        let mut agent = fish(Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(penetration_correction(&mut agent, &registry, &params), 0);
        assert_eq!(agent.velocity, Vec3::new(0.0, 0.0, 1.0));
    }
}
