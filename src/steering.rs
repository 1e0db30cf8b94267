/*
 * Steering Module
 *
 * The capability shared by every agent that the avoidance math needs, plus
 * the small vector helpers all force computations lean on.
 *
 * Convention: an agent's local forward axis is -Z, so its orientation maps
 * -Z onto its heading in world space.
 */

use glam::{Mat3, Quat, Vec3};

/// Floor applied to distances used as denominators.
pub const MIN_DISTANCE: f32 = 0.01;

/// Squared speed below which a heading is considered undefined.
pub const SPEED_EPSILON_SQ: f32 = 1.0e-6;

/// What obstacle avoidance and penetration correction need from an agent.
///
/// Implemented by both `Fish` and `Predator`, so neither needs to know about
/// the other and the geometry lives in one place.
pub trait Steerable {
    fn position(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    /// Rotation mapping local -Z onto the agent's heading.
    fn orientation(&self) -> Quat;
    fn max_speed(&self) -> f32;
    fn bounding_radius(&self) -> f32;

    fn speed(&self) -> f32 {
        self.velocity().length()
    }
}

// Scale a vector down to `max` length if it is longer
#[inline]
pub fn limit(v: Vec3, max: f32) -> Vec3 {
    if max <= 0.0 {
        return Vec3::ZERO;
    }
    let length_squared = v.length_squared();
    if length_squared > max * max {
        v * (max / length_squared.sqrt())
    } else {
        v
    }
}

// Unit vector, or zero when the input is too short to have a direction
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let length_squared = v.length_squared();
    if length_squared <= SPEED_EPSILON_SQ || !length_squared.is_finite() {
        Vec3::ZERO
    } else {
        v / length_squared.sqrt()
    }
}

/// Look-along rotation: the returned quaternion maps local -Z onto `direction`.
///
/// Returns `None` when `direction` is too short to define a heading.
pub fn heading_rotation(direction: Vec3) -> Option<Quat> {
    let forward = safe_normalize(direction);
    if forward == Vec3::ZERO {
        return None;
    }

    // Local +Z points backwards
    let z_axis = -forward;
    let up = if forward.y.abs() > 0.999 { Vec3::Z } else { Vec3::Y };
    let x_axis = up.cross(z_axis).normalize();
    let y_axis = z_axis.cross(x_axis);

    Some(Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, z_axis)).normalize())
}
