/*
 * Events Module
 *
 * Things that happen during a tick and that the game layer reacts to.
 * The engine queues them during `update` and the caller drains the queue
 * afterwards, instead of running callbacks mid-tick.
 */

use glam::Vec3;

use crate::bait::BaitId;
use crate::fish::FishId;
use crate::predator::PredatorId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// A bait was eaten and removed from the registry.
    BaitConsumed {
        bait: BaitId,
        position: Vec3,
        fish: FishId,
    },
    /// A fish died; `predator` is `None` when it was killed from outside.
    FishDied {
        fish: FishId,
        predator: Option<PredatorId>,
    },
    FishReachedGoal { fish: FishId },
}
