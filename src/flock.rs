/*
 * Flocking Engine Module
 *
 * This module owns the school, the predators and the obstacle and bait
 * registries, and advances them one frame at a time. `update` is a single
 * linear pipeline:
 * 1. Neighborhood pass: rebuild every fish's neighbor list
 * 2. Force pass: separation, alignment, cohesion, seek, obstacle and wall
 *    forces for every fish, predator hunting or wandering, all computed from
 *    pre-tick state
 * 3. Integration pass
 * 4. Correction pass: velocity nudges for anything overlapping an obstacle
 * 5. Capture, goal and bait consumption passes, which queue events
 *
 * Registry and agent-list mutation happens between ticks only.
 */

use std::time::Instant;

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, info, trace, warn};

use crate::avoidance;
use crate::bait::{Bait, BaitId, BaitRegistry};
use crate::debug::TickStats;
use crate::error::{ConfigError, RegistryError};
use crate::events::SimEvent;
use crate::fish::{Fish, FishId};
use crate::neighbors::Neighborhood;
use crate::obstacle::{Obstacle, ObstacleId, ObstacleRegistry};
use crate::params::SimulationParams;
use crate::predator::{Predator, PredatorId};
use crate::spawn::{self, SpawnVolume};

/// Spherical success zone; fish that swim into it are parked there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalZone {
    pub center: Vec3,
    pub radius: f32,
}

impl GoalZone {
    pub fn contains(&self, position: Vec3) -> bool {
        position.distance_squared(self.center) <= self.radius * self.radius
    }
}

pub struct FlockingEngine {
    params: SimulationParams,
    school: Vec<Fish>,
    predators: Vec<Predator>,
    obstacles: ObstacleRegistry,
    baits: BaitRegistry,
    goal: Option<GoalZone>,
    neighborhood: Neighborhood,
    // Per-fish steering sums, reused across ticks
    forces: Vec<Vec3>,
    events: Vec<SimEvent>,
    rng: SmallRng,
    tick: u64,
    stats: TickStats,
}

impl FlockingEngine {
    pub fn new(params: SimulationParams) -> Result<Self, ConfigError> {
        params.validate()?;

        let rng = match params.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        info!(
            bounds = ?params.bounds,
            perception_radius = params.flocking.perception_radius,
            backend = ?params.flocking.neighbor_backend,
            seeded = params.rng_seed.is_some(),
            "flocking engine created"
        );

        Ok(Self {
            params,
            school: Vec::new(),
            predators: Vec::new(),
            obstacles: ObstacleRegistry::new(),
            baits: BaitRegistry::new(),
            goal: None,
            neighborhood: Neighborhood::new(),
            forces: Vec::new(),
            events: Vec::new(),
            rng,
            tick: 0,
            stats: TickStats::default(),
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Swap in new tunables and push them onto every agent.
    pub fn set_params(&mut self, params: SimulationParams) -> Result<(), ConfigError> {
        params.validate()?;
        for fish in &mut self.school {
            fish.apply_params(&params.fish);
        }
        for predator in &mut self.predators {
            predator.apply_params(&params.predator);
        }
        debug!("simulation parameters updated");
        self.params = params;
        Ok(())
    }

    // ----- agents -----

    pub fn add_fish(&mut self, fish: Fish) -> FishId {
        let id = FishId(self.school.len());
        self.school.push(fish);
        id
    }

    /// Add a fish built from the current fish parameters.
    pub fn spawn_fish(&mut self, position: Vec3, velocity: Vec3) -> FishId {
        let fish = Fish::new(self.params.bounds.clamp(position), velocity, &self.params.fish);
        self.add_fish(fish)
    }

    pub fn add_predator(&mut self, predator: Predator) -> PredatorId {
        let id = PredatorId(self.predators.len());
        self.predators.push(predator);
        id
    }

    pub fn spawn_predator(&mut self, position: Vec3, velocity: Vec3) -> PredatorId {
        let predator = Predator::new(
            self.params.bounds.clamp(position),
            velocity,
            &self.params.predator,
        );
        self.add_predator(predator)
    }

    /// Scatter `count` fish through `volume` with random headings.
    pub fn spawn_school(&mut self, count: usize, volume: &SpawnVolume) -> Vec<FishId> {
        let school = spawn::school(
            count,
            volume,
            &self.params.fish,
            &self.params.bounds,
            &mut self.rng,
        );
        info!(count, center = ?volume.center, "school spawned");
        school.into_iter().map(|fish| self.add_fish(fish)).collect()
    }

    pub fn spawn_predators(&mut self, count: usize, volume: &SpawnVolume) -> Vec<PredatorId> {
        let predators = spawn::predators(
            count,
            volume,
            &self.params.predator,
            &self.params.bounds,
            &mut self.rng,
        );
        info!(count, center = ?volume.center, "predators spawned");
        predators
            .into_iter()
            .map(|predator| self.add_predator(predator))
            .collect()
    }

    /// Kill a fish from outside the simulation. Returns `true` if this call
    /// killed it; a `FishDied` event is queued only in that case.
    pub fn kill_fish(&mut self, id: FishId) -> Result<bool, RegistryError> {
        let fish = self.school.get_mut(id.0).ok_or(RegistryError::UnknownFish)?;
        let killed = fish.die();
        if killed {
            self.events.push(SimEvent::FishDied {
                fish: id,
                predator: None,
            });
        }
        Ok(killed)
    }

    pub fn clear_school(&mut self) {
        self.school.clear();
        self.neighborhood.clear();
        for predator in &mut self.predators {
            predator.target = None;
        }
        debug!("school cleared");
    }

    pub fn clear_predators(&mut self) {
        self.predators.clear();
        debug!("predators cleared");
    }

    // ----- registries -----

    pub fn add_obstacle(&mut self, obstacle: Obstacle) -> Result<ObstacleId, RegistryError> {
        self.obstacles.add(obstacle)
    }

    pub fn remove_obstacle(&mut self, id: ObstacleId) -> Result<Obstacle, RegistryError> {
        self.obstacles.remove(id)
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    pub fn add_bait(&mut self, bait: Bait) -> Result<BaitId, RegistryError> {
        self.baits.add(bait)
    }

    pub fn remove_bait(&mut self, id: BaitId) -> Result<Bait, RegistryError> {
        self.baits.remove(id)
    }

    pub fn clear_baits(&mut self) {
        self.baits.clear();
        debug!("baits cleared");
    }

    pub fn set_goal_zone(&mut self, goal: Option<GoalZone>) {
        self.goal = goal;
    }

    pub fn goal_zone(&self) -> Option<GoalZone> {
        self.goal
    }

    /// Level restart: drop every agent, registry entry and pending event.
    pub fn reset(&mut self) {
        self.clear_school();
        self.clear_predators();
        self.clear_obstacles();
        self.clear_baits();
        self.goal = None;
        self.events.clear();
        self.tick = 0;
        self.stats = TickStats::default();
        info!("simulation reset");
    }

    // ----- queries -----

    pub fn school(&self) -> &[Fish] {
        &self.school
    }

    pub fn fish(&self, id: FishId) -> Option<&Fish> {
        self.school.get(id.0)
    }

    pub fn predators(&self) -> &[Predator] {
        &self.predators
    }

    pub fn obstacles(&self) -> &ObstacleRegistry {
        &self.obstacles
    }

    pub fn baits(&self) -> &BaitRegistry {
        &self.baits
    }

    /// School indices (`FishId.0`) of the fish found near `id` during the
    /// last tick, in ascending order.
    pub fn neighbors_of(&self, id: FishId) -> &[usize] {
        self.neighborhood.of(id.0)
    }

    /// Fish that should be drawn: every fish that has not died, including
    /// those parked at the goal.
    pub fn living_fish(&self) -> impl Iterator<Item = &Fish> {
        self.school.iter().filter(|fish| fish.is_alive())
    }

    pub fn alive_count(&self) -> usize {
        self.school.iter().filter(|fish| fish.is_alive()).count()
    }

    pub fn reached_goal_count(&self) -> usize {
        self.school.iter().filter(|fish| fish.has_reached_goal()).count()
    }

    pub fn last_stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Events queued since the last drain.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    // ----- simulation -----

    /// Advance the simulation by `dt` seconds.
    ///
    /// `dt` is used as given. A very large value (a dropped frame, say) can
    /// overshoot; it is logged, not clamped.
    pub fn update(&mut self, dt: f32) {
        let started = Instant::now();
        if dt > self.params.large_step_warning {
            warn!(dt, "large frame delta, integrating unclamped");
        }

        self.tick += 1;
        let mut stats = TickStats {
            tick: self.tick,
            ..TickStats::default()
        };

        // Neighborhood pass
        let flocking = &self.params.flocking;
        self.neighborhood.rebuild(
            &self.school,
            flocking.perception_radius,
            flocking.neighbor_backend,
            &self.params.bounds,
        );
        stats.neighbor_links = self.neighborhood.link_count();

        // Force pass
        stats.avoidance_contacts += self.compute_school_forces();
        stats.avoidance_contacts += self.steer_predators();

        for (fish, force) in self.school.iter_mut().zip(&self.forces) {
            fish.apply_force(*force);
        }

        // Integration pass
        let bounds = self.params.bounds;
        for fish in &mut self.school {
            fish.integrate(dt, &bounds);
        }
        for predator in &mut self.predators {
            predator.integrate(dt, &bounds);
        }

        // Correction pass
        for fish in self.school.iter_mut().filter(|fish| fish.is_active()) {
            stats.corrections +=
                avoidance::penetration_correction(fish, &self.obstacles, &self.params.avoidance);
        }
        for predator in &mut self.predators {
            stats.corrections += avoidance::penetration_correction(
                predator,
                &self.obstacles,
                &self.params.avoidance,
            );
        }

        stats.fish_died = self.resolve_captures();
        stats.fish_reached_goal = self.resolve_goal();
        stats.baits_consumed = self.resolve_bait_consumption();

        stats.swimming_fish = self.school.iter().filter(|fish| fish.is_active()).count();
        stats.elapsed = started.elapsed();
        debug!(
            tick = stats.tick,
            swimming = stats.swimming_fish,
            links = stats.neighbor_links,
            contacts = stats.avoidance_contacts,
            corrections = stats.corrections,
            eaten = stats.baits_consumed,
            died = stats.fish_died,
            "tick complete"
        );
        self.stats = stats;
    }

    // Sum the weighted steering forces of every swimming fish into
    // `self.forces`. Returns how many fish reacted to an obstacle.
    fn compute_school_forces(&mut self) -> usize {
        let flocking = &self.params.flocking;
        let mut contacts = 0;

        self.forces.clear();
        self.forces.resize(self.school.len(), Vec3::ZERO);

        for (i, fish) in self.school.iter().enumerate() {
            if !fish.is_active() {
                continue;
            }
            let neighbors = self.neighborhood.of(i);

            let separation = fish.separation(i, &self.school, neighbors, flocking.separation_radius);
            let alignment = fish.alignment(&self.school, neighbors);
            let cohesion = fish.cohesion(&self.school, neighbors);
            let seek = self
                .baits
                .nearest(fish.position)
                .map_or(Vec3::ZERO, |(_, bait)| fish.seek(bait.position));
            let obstacle = match avoidance::avoidance_force(
                fish,
                &self.obstacles,
                &self.params.avoidance,
                &mut self.rng,
            ) {
                Some(avoidance) => {
                    contacts += 1;
                    avoidance.force
                }
                None => Vec3::ZERO,
            };
            let boundary = self
                .params
                .bounds
                .avoidance_force(fish.position, flocking.boundary_radius);

            self.forces[i] = separation * flocking.separation_weight
                + alignment * flocking.alignment_weight
                + cohesion * flocking.cohesion_weight
                + seek * flocking.seek_weight
                + obstacle * flocking.obstacle_weight
                + boundary * flocking.boundary_weight;
        }

        contacts
    }

    // Hunt or wander, then add obstacle avoidance. Predators never flock.
    fn steer_predators(&mut self) -> usize {
        let weight = self.params.predator.obstacle_weight;
        let mut contacts = 0;

        for predator in &mut self.predators {
            predator.target = predator.find_target(&self.school);
            let steer = match predator.target {
                Some(FishId(i)) => predator.seek(self.school[i].position),
                None => predator.wander(&mut self.rng),
            };
            predator.apply_force(steer);

            if let Some(avoidance) = avoidance::avoidance_force(
                &*predator,
                &self.obstacles,
                &self.params.avoidance,
                &mut self.rng,
            ) {
                predator.apply_force(avoidance.force * weight);
                contacts += 1;
            }
        }

        contacts
    }

    fn resolve_captures(&mut self) -> usize {
        if !self.params.predator.capture_enabled {
            return 0;
        }

        let mut captured = 0;
        for (p, predator) in self.predators.iter().enumerate() {
            let Some(FishId(i)) = predator.target else {
                continue;
            };
            let fish = &mut self.school[i];
            if predator.can_capture(fish) && fish.die() {
                trace!(predator = p, fish = i, "fish captured");
                self.events.push(SimEvent::FishDied {
                    fish: FishId(i),
                    predator: Some(PredatorId(p)),
                });
                captured += 1;
            }
        }
        captured
    }

    fn resolve_goal(&mut self) -> usize {
        let Some(goal) = self.goal else {
            return 0;
        };

        let mut arrived = 0;
        for (i, fish) in self.school.iter_mut().enumerate() {
            if fish.is_active() && goal.contains(fish.position) && fish.reach_goal() {
                trace!(fish = i, "fish reached goal");
                self.events.push(SimEvent::FishReachedGoal { fish: FishId(i) });
                arrived += 1;
            }
        }
        arrived
    }

    // Each non-goal bait goes to the first swimming fish in reach. Removal
    // and events wait until the scan is over.
    fn resolve_bait_consumption(&mut self) -> usize {
        let radius = self.params.flocking.bait_consumption_radius;
        let radius_sq = radius * radius;

        let mut eaten = Vec::new();
        for (id, bait) in self.baits.iter() {
            if bait.goal {
                continue;
            }
            let eater = self.school.iter().position(|fish| {
                fish.is_active() && fish.position.distance_squared(bait.position) <= radius_sq
            });
            if let Some(i) = eater {
                eaten.push((id, FishId(i)));
            }
        }

        let mut consumed = 0;
        for (id, fish) in eaten {
            if let Ok(bait) = self.baits.remove(id) {
                self.events.push(SimEvent::BaitConsumed {
                    bait: id,
                    position: bait.position,
                    fish,
                });
                consumed += 1;
            }
        }
        consumed
    }
}
