/*
 * Debug Information Module
 *
 * Per-tick counters describing what the last `update` did. The viewer shows
 * them; the engine also logs them at debug level.
 */

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    pub tick: u64,
    /// Fish still moving: alive and not parked at the goal.
    pub swimming_fish: usize,
    /// Directed neighbor links (each mutual pair counts twice).
    pub neighbor_links: usize,
    /// Agents that received an obstacle steering force.
    pub avoidance_contacts: usize,
    /// Agent/obstacle overlaps resolved by the correction pass.
    pub corrections: usize,
    pub baits_consumed: usize,
    pub fish_died: usize,
    pub fish_reached_goal: usize,
    pub elapsed: Duration,
}
