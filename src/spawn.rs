/*
 * Spawn Module
 *
 * Scatters fish and predators through an axis-aligned box with random
 * headings. Positions are clamped into the world so a volume that pokes
 * past the walls still yields valid agents.
 */

use glam::Vec3;
use rand::Rng;

use crate::bounds::WorldBounds;
use crate::fish::Fish;
use crate::params::{FishParams, PredatorParams};
use crate::predator::Predator;
use crate::steering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnVolume {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl SpawnVolume {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// The whole world, shrunk by `margin` on every side.
    pub fn from_bounds(bounds: &WorldBounds, margin: f32) -> Self {
        let half = (bounds.max() - bounds.min()) * 0.5 - Vec3::splat(margin);
        Self::new(bounds.center(), half.max(Vec3::ZERO))
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        self.center
            + Vec3::new(
                symmetric(rng, self.half_extents.x),
                symmetric(rng, self.half_extents.y),
                symmetric(rng, self.half_extents.z),
            )
    }
}

fn symmetric<R: Rng + ?Sized>(rng: &mut R, half: f32) -> f32 {
    if half > 0.0 {
        rng.gen_range(-half..=half)
    } else {
        0.0
    }
}

/// Random unit vector, or -Z in the unlikely case every component rolls zero.
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let heading = steering::safe_normalize(Vec3::new(
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
    ));
    if heading == Vec3::ZERO {
        -Vec3::Z
    } else {
        heading
    }
}

pub fn school<R: Rng + ?Sized>(
    count: usize,
    volume: &SpawnVolume,
    params: &FishParams,
    bounds: &WorldBounds,
    rng: &mut R,
) -> Vec<Fish> {
    (0..count)
        .map(|_| {
            let position = bounds.clamp(volume.sample(rng));
            let velocity = random_heading(rng) * params.initial_speed;
            Fish::new(position, velocity, params)
        })
        .collect()
}

pub fn predators<R: Rng + ?Sized>(
    count: usize,
    volume: &SpawnVolume,
    params: &PredatorParams,
    bounds: &WorldBounds,
    rng: &mut R,
) -> Vec<Predator> {
    (0..count)
        .map(|_| {
            let position = bounds.clamp(volume.sample(rng));
            let velocity = random_heading(rng) * params.max_speed * 0.5;
            Predator::new(position, velocity, params)
        })
        .collect()
}
