/*
 * Bait Module
 *
 * Point attractants the school seeks. Regular bait is eaten by the first
 * fish to reach it; goal bait lures the school toward the exit and is never
 * eaten.
 */

use glam::Vec3;
use slotmap::{new_key_type, SlotMap};
use tracing::debug;

use crate::error::RegistryError;

new_key_type! {
    /// Stable handle for a placed bait.
    pub struct BaitId;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bait {
    pub position: Vec3,
    /// Goal bait is exempt from consumption.
    pub goal: bool,
}

impl Bait {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            goal: false,
        }
    }

    pub fn goal(position: Vec3) -> Self {
        Self {
            position,
            goal: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct BaitRegistry {
    baits: SlotMap<BaitId, Bait>,
}

impl BaitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bait: Bait) -> Result<BaitId, RegistryError> {
        if !bait.position.is_finite() {
            return Err(RegistryError::NonFinitePosition(bait.position));
        }
        let id = self.baits.insert(bait);
        debug!(?id, position = ?bait.position, goal = bait.goal, "bait placed");
        Ok(id)
    }

    pub fn remove(&mut self, id: BaitId) -> Result<Bait, RegistryError> {
        let bait = self.baits.remove(id).ok_or(RegistryError::UnknownBait)?;
        debug!(?id, "bait removed");
        Ok(bait)
    }

    pub fn get(&self, id: BaitId) -> Option<&Bait> {
        self.baits.get(id)
    }

    /// Closest bait to `position` by linear scan.
    pub fn nearest(&self, position: Vec3) -> Option<(BaitId, &Bait)> {
        let mut best: Option<(BaitId, &Bait)> = None;
        let mut best_distance_sq = f32::INFINITY;
        for (id, bait) in &self.baits {
            let distance_sq = bait.position.distance_squared(position);
            if distance_sq < best_distance_sq {
                best_distance_sq = distance_sq;
                best = Some((id, bait));
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (BaitId, &Bait)> {
        self.baits.iter()
    }

    pub fn len(&self) -> usize {
        self.baits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baits.is_empty()
    }

    pub fn clear(&mut self) {
        self.baits.clear();
    }
}
