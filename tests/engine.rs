// Whole-engine behavior: bounds, obstacle safety net, events and queries.

use glam::{Quat, Vec3};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use shoal::{
    avoidance_force, AvoidSide, Bait, Fish, FishId, FishParams, FlockingEngine, GoalZone,
    NeighborBackend, Obstacle, ObstacleRegistry, PredatorId, RegistryError, SimEvent,
    SimulationParams, SpawnVolume, Steerable,
};

const DT: f32 = 1.0 / 60.0;

fn seeded(seed: u64) -> SimulationParams {
    SimulationParams {
        rng_seed: Some(seed),
        ..SimulationParams::default()
    }
}

fn engine(seed: u64) -> FlockingEngine {
    FlockingEngine::new(seeded(seed)).unwrap()
}

fn busy_engine(seed: u64, backend: NeighborBackend) -> FlockingEngine {
    let mut params = seeded(seed);
    params.flocking.neighbor_backend = backend;
    params.avoidance.avoid_side = AvoidSide::Random;
    let mut engine = FlockingEngine::new(params).unwrap();

    let volume = SpawnVolume::from_bounds(&engine.params().bounds, 0.5);
    engine.spawn_school(150, &volume);
    engine.spawn_predators(2, &volume);
    engine
        .add_obstacle(Obstacle::sphere(Vec3::new(5.0, 0.0, 5.0), 2.0))
        .unwrap();
    engine
        .add_obstacle(Obstacle::ellipsoid(
            Vec3::new(-6.0, 0.0, -4.0),
            1.5,
            Vec3::new(2.0, 5.0, 0.5),
            Quat::from_rotation_y(0.7),
        ))
        .unwrap();
    engine.add_bait(Bait::new(Vec3::new(0.0, 0.0, -12.0))).unwrap();
    engine.add_bait(Bait::goal(Vec3::new(10.0, 2.0, 10.0))).unwrap();
    engine
}

#[test]
fn speeds_stay_bounded_and_agents_stay_in_the_world() {
    let mut engine = busy_engine(1, NeighborBackend::Grid);
    let bounds = engine.params().bounds;

    for tick in 0..400 {
        // Mix in a few dropped frames
        let dt = if tick % 97 == 0 { 0.5 } else { DT };
        engine.update(dt);

        for fish in engine.school() {
            assert!(fish.velocity.length() <= fish.max_speed + 1e-4);
            assert_eq!(fish.acceleration, Vec3::ZERO);
            assert!(bounds.contains(fish.position), "{:?}", fish.position);
        }
        for predator in engine.predators() {
            assert!(predator.velocity.length() <= predator.max_speed + 1e-4);
            assert!(bounds.contains(predator.position), "{:?}", predator.position);
        }
    }
}

// Lone fish swimming straight at `obstacle` at full speed with the steering
// layer weighted to zero, so only the correction keeps it out. Returns the
// overlap threshold and the sphere-space distance after every tick.
fn ram_without_steering(obstacle: Obstacle, start: Vec3, ticks: usize) -> (f32, Vec<f32>) {
    let mut params = seeded(2);
    params.flocking.obstacle_weight = 0.0;
    let fish_params = params.fish.clone();
    let mut engine = FlockingEngine::new(params).unwrap();
    engine.add_obstacle(obstacle).unwrap();
    let heading = (obstacle.position - start).normalize();
    engine.spawn_fish(start, heading * fish_params.max_speed);

    let threshold =
        obstacle.bounding_radius + fish_params.bounding_radius * obstacle.max_inverse_scale();
    let distances = (0..ticks)
        .map(|_| {
            engine.update(DT);
            let fish = &engine.school()[0];
            assert!(fish.position.is_finite());
            obstacle.to_sphere_space(fish.position - obstacle.position).length()
        })
        .collect();
    (threshold, distances)
}

fn assert_pushed_out_for_good(threshold: f32, distances: &[f32]) {
    let entered = distances
        .iter()
        .position(|&d| d < threshold)
        .expect("fish never overlapped the rock");
    let left = entered
        + distances[entered..]
            .iter()
            .position(|&d| d >= threshold)
            .expect("fish never left the rock");
    assert!(left - entered <= 8, "inside for {} ticks", left - entered);

    for (tick, &d) in distances.iter().enumerate().skip(left) {
        assert!(d >= threshold - 1e-4, "back inside at tick {}: {} < {}", tick, d, threshold);
    }
    assert!(distances[distances.len() - 1] > threshold);
}

#[test]
fn fish_ramming_a_rock_is_pushed_out_and_stays_out() {
    let (threshold, distances) =
        ram_without_steering(Obstacle::sphere(Vec3::ZERO, 1.0), Vec3::new(0.0, 0.0, 3.0), 240);
    assert!((threshold - 1.3).abs() < 1e-6);
    assert_pushed_out_for_good(threshold, &distances);
}

#[test]
fn fish_ramming_a_stretched_turned_rock_is_pushed_out_and_stays_out() {
    let rock = Obstacle::ellipsoid(
        Vec3::new(1.0, 0.0, -2.0),
        1.0,
        Vec3::new(2.0, 1.0, 0.6),
        Quat::from_rotation_y(0.6),
    );
    let (threshold, distances) = ram_without_steering(rock, Vec3::new(4.0, 0.0, 1.0), 240);
    assert_pushed_out_for_good(threshold, &distances);
}

#[test]
fn predator_chasing_past_a_rock_only_grazes_it() {
    let mut params = seeded(21);
    params.predator.capture_enabled = false;
    let predator_radius = params.predator.bounding_radius;
    let mut engine = FlockingEngine::new(params).unwrap();
    engine.add_obstacle(Obstacle::sphere(Vec3::ZERO, 1.5)).unwrap();
    engine.spawn_fish(Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO);
    engine.spawn_predator(Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 0.0, -2.4));
    let threshold = 1.5 + predator_radius;

    let mut inside_streak = 0;
    let mut longest_streak = 0;
    let mut closest = f32::MAX;
    let mut corrections = 0;
    for _ in 0..600 {
        engine.update(DT);
        corrections += engine.last_stats().corrections;
        let predator = &engine.predators()[0];
        assert!(predator.position.is_finite());
        assert_eq!(predator.target, Some(FishId(0)));

        let distance = predator.position.length();
        closest = closest.min(distance);
        if distance < threshold {
            inside_streak += 1;
            longest_streak = longest_streak.max(inside_streak);
        } else {
            inside_streak = 0;
        }
    }

    assert!(corrections > 0, "predator never reached the rock");
    assert!(longest_streak <= 6, "inside for {} ticks", longest_streak);
    assert!(closest >= threshold - 0.1, "went {} deep", threshold - closest);
}

#[test]
fn tiny_perception_radius_on_the_grid_runs() {
    let mut params = seeded(22);
    params.flocking.perception_radius = 0.001;
    params.flocking.separation_radius = 0.0005;
    params.flocking.neighbor_backend = NeighborBackend::Grid;
    let mut engine = FlockingEngine::new(params).unwrap();
    let a = engine.spawn_fish(Vec3::ZERO, Vec3::X);
    let b = engine.spawn_fish(Vec3::new(0.0005, 0.0, 0.0), Vec3::X);
    engine.spawn_fish(Vec3::new(5.0, 0.0, 0.0), Vec3::X);

    engine.update(DT);
    assert_eq!(engine.neighbors_of(a), &[b.0]);
    assert_eq!(engine.school().len(), 3);
}

#[test]
fn overlapping_fish_is_nudged_out_without_teleporting() {
    let mut engine = engine(3);
    engine.add_obstacle(Obstacle::sphere(Vec3::ZERO, 2.0)).unwrap();
    let id = engine.spawn_fish(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO);
    let threshold = 2.0 + FishParams::default().bounding_radius;

    engine.update(DT);
    assert_eq!(engine.last_stats().corrections, 1);
    let fish = engine.fish(id).unwrap();
    assert_eq!(fish.position, Vec3::new(0.5, 0.0, 0.0));
    assert!(fish.velocity.x > 0.0);

    let mut previous = 0.5;
    for _ in 0..90 {
        engine.update(DT);
        let distance = engine.fish(id).unwrap().position.length();
        assert!(distance >= previous - 1e-5);
        assert!(distance - previous < 2.0 * DT + 1e-4);
        previous = distance;
    }
    assert!(previous >= threshold);
}

#[test]
fn killing_a_fish_reports_one_death() {
    let mut engine = engine(4);
    let id = engine.spawn_fish(Vec3::ZERO, Vec3::X);
    engine.spawn_fish(Vec3::new(1.0, 0.0, 0.0), Vec3::X);

    assert_eq!(engine.kill_fish(id), Ok(true));
    assert_eq!(engine.kill_fish(id), Ok(false));
    assert_eq!(engine.kill_fish(FishId(99)), Err(RegistryError::UnknownFish));

    let events = engine.drain_events();
    assert_eq!(
        events,
        vec![SimEvent::FishDied {
            fish: id,
            predator: None
        }]
    );
    assert!(engine.drain_events().is_empty());

    let position = engine.fish(id).unwrap().position;
    engine.update(DT);
    assert_eq!(engine.fish(id).unwrap().position, position);
    assert!(engine.neighbors_of(FishId(1)).is_empty());
    assert_eq!(engine.alive_count(), 1);
}

#[test]
fn dead_fish_are_not_drawn_but_parked_fish_are() {
    let mut engine = engine(23);
    let dead = engine.spawn_fish(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
    engine.spawn_fish(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
    engine.spawn_fish(Vec3::new(0.0, 0.0, 10.0), Vec3::X);
    engine.set_goal_zone(Some(GoalZone {
        center: Vec3::new(5.0, 0.0, 0.0),
        radius: 2.0,
    }));
    engine.kill_fish(dead).unwrap();
    engine.update(DT);

    let drawn: Vec<Vec3> = engine.living_fish().map(|fish| fish.position).collect();
    assert_eq!(drawn.len(), 2);
    assert!(drawn.iter().all(|p| p.x > -4.0));
    assert_eq!(engine.reached_goal_count(), 1);
    assert_eq!(engine.last_stats().swimming_fish, 1);
}

#[test]
fn a_bait_is_eaten_once_even_with_two_fish_in_reach() {
    let mut engine = engine(5);
    engine.spawn_fish(Vec3::new(0.1, 0.0, 0.0), Vec3::ZERO);
    engine.spawn_fish(Vec3::new(-0.1, 0.0, 0.0), Vec3::ZERO);
    let bait = engine.add_bait(Bait::new(Vec3::ZERO)).unwrap();

    engine.update(DT);

    let events = engine.drain_events();
    assert_eq!(events.len(), 1);
    match events[0] {
        SimEvent::BaitConsumed {
            bait: eaten,
            position,
            fish,
        } => {
            assert_eq!(eaten, bait);
            assert_eq!(position, Vec3::ZERO);
            assert_eq!(fish, FishId(0));
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(engine.baits().is_empty());
    assert_eq!(engine.last_stats().baits_consumed, 1);

    engine.update(DT);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn goal_baits_are_never_eaten() {
    let mut engine = engine(6);
    engine.spawn_fish(Vec3::new(0.1, 0.0, 0.0), Vec3::ZERO);
    engine.add_bait(Bait::goal(Vec3::ZERO)).unwrap();

    for _ in 0..10 {
        engine.update(DT);
    }
    assert_eq!(engine.baits().len(), 1);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn fish_in_the_goal_zone_are_parked() {
    let mut engine = engine(7);
    let home = engine.spawn_fish(Vec3::new(0.5, 0.0, 0.0), Vec3::ZERO);
    let away = engine.spawn_fish(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
    engine.set_goal_zone(Some(GoalZone {
        center: Vec3::ZERO,
        radius: 1.5,
    }));

    engine.update(DT);
    assert_eq!(
        engine.drain_events(),
        vec![SimEvent::FishReachedGoal { fish: home }]
    );
    assert!(engine.fish(home).unwrap().has_reached_goal());
    assert!(!engine.fish(away).unwrap().has_reached_goal());
    assert_eq!(engine.reached_goal_count(), 1);

    let parked = engine.fish(home).unwrap().position;
    for _ in 0..20 {
        engine.update(DT);
    }
    assert_eq!(engine.fish(home).unwrap().position, parked);
    assert!(engine.drain_events().is_empty());
}

#[test]
fn predator_captures_a_fish_in_reach() {
    let mut engine = engine(8);
    let fish = engine.spawn_fish(Vec3::new(0.3, 0.0, 0.0), Vec3::ZERO);
    let predator = engine.spawn_predator(Vec3::ZERO, Vec3::ZERO);

    engine.update(DT);
    assert_eq!(
        engine.drain_events(),
        vec![SimEvent::FishDied {
            fish,
            predator: Some(predator)
        }]
    );
    assert!(!engine.fish(fish).unwrap().is_alive());

    engine.update(DT);
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.predators()[0].target, None);
}

#[test]
fn capture_can_be_switched_off() {
    let mut params = seeded(9);
    params.predator.capture_enabled = false;
    let mut engine = FlockingEngine::new(params).unwrap();
    let fish = engine.spawn_fish(Vec3::new(0.3, 0.0, 0.0), Vec3::ZERO);
    engine.spawn_predator(Vec3::ZERO, Vec3::ZERO);

    for _ in 0..30 {
        engine.update(DT);
    }
    assert!(engine.fish(fish).unwrap().is_alive());
    assert!(engine.drain_events().is_empty());
    assert_eq!(engine.predators()[0].target, Some(fish));
    assert_eq!(engine.last_stats().fish_died, 0);
}

#[test]
fn neighbor_lists_are_symmetric() {
    for backend in [NeighborBackend::BruteForce, NeighborBackend::Grid] {
        let mut engine = busy_engine(10, backend);
        for _ in 0..5 {
            engine.update(DT);
        }
        for (i, _) in engine.school().iter().enumerate() {
            for &j in engine.neighbors_of(FishId(i)) {
                assert!(
                    engine.neighbors_of(FishId(j)).contains(&i),
                    "{:?}: {} -> {} not mirrored",
                    backend,
                    i,
                    j
                );
            }
        }
    }
}

#[test]
fn alignment_and_cohesion_follow_the_neighbor() {
    let mut engine = engine(11);
    let fish = engine.spawn_fish(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
    engine.spawn_fish(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));

    // Neighbor lists are built from the state at the start of the tick
    engine.update(DT);
    assert_eq!(engine.neighbors_of(fish), &[1]);

    let params = FishParams::default();
    let me = Fish::new(Vec3::ZERO, Vec3::X, &params);
    let school = vec![
        me.clone(),
        Fish::new(Vec3::new(1.0, 0.0, 0.0), Vec3::Y, &params),
    ];
    assert!((me.alignment(&school, &[1]) - Vec3::Y).length() < 1e-6);
    assert!((me.cohesion(&school, &[1]) - Vec3::X).length() < 1e-6);
}

#[test]
fn obstacle_ahead_triggers_braking_only_within_range() {
    let mut obstacles = ObstacleRegistry::new();
    obstacles.add(Obstacle::sphere(Vec3::ZERO, 1.0)).unwrap();
    let params = SimulationParams::default().avoidance;
    let mut rng = SmallRng::seed_from_u64(12);

    let cruising = Fish::new(Vec3::new(0.0, 0.0, -6.0), Vec3::new(0.0, 0.0, 1.0), &FishParams::default());
    assert!(cruising.speed() > 0.0);
    let avoidance = avoidance_force(&cruising, &obstacles, &params, &mut rng).unwrap();
    assert!(avoidance.force.length() > 0.0);
    assert!(avoidance.force.z < 0.0);

    let drifting = Fish::new(Vec3::new(0.0, 0.0, -6.0), Vec3::new(0.0, 0.0, 0.1), &FishParams::default());
    assert!(avoidance_force(&drifting, &obstacles, &params, &mut rng).is_none());
}

#[test]
fn same_seed_gives_the_same_run() {
    let mut a = busy_engine(13, NeighborBackend::Grid);
    let mut b = busy_engine(13, NeighborBackend::Grid);
    for _ in 0..120 {
        a.update(DT);
        b.update(DT);
    }
    for (x, y) in a.school().iter().zip(b.school()) {
        assert_eq!(x.position, y.position);
        assert_eq!(x.velocity, y.velocity);
    }
    assert_eq!(a.drain_events(), b.drain_events());
}

#[test]
fn grid_and_brute_force_runs_agree() {
    let mut brute = busy_engine(14, NeighborBackend::BruteForce);
    let mut grid = busy_engine(14, NeighborBackend::Grid);
    for _ in 0..60 {
        brute.update(DT);
        grid.update(DT);
    }
    for (x, y) in brute.school().iter().zip(grid.school()) {
        assert_eq!(x.position, y.position);
    }
}

#[test]
fn registry_changes_between_ticks() {
    let mut engine = engine(15);
    engine.spawn_fish(Vec3::ZERO, Vec3::X);
    let rock = engine
        .add_obstacle(Obstacle::sphere(Vec3::new(3.0, 0.0, 0.0), 1.0))
        .unwrap();
    assert!(matches!(
        engine.add_obstacle(Obstacle::ellipsoid(Vec3::ZERO, 1.0, Vec3::new(1.0, 0.0, 1.0), Quat::IDENTITY)),
        Err(RegistryError::DegenerateObstacle { .. })
    ));
    engine.update(DT);

    engine.remove_obstacle(rock).unwrap();
    assert_eq!(engine.remove_obstacle(rock), Err(RegistryError::UnknownObstacle));
    assert!(engine.obstacles().is_empty());

    let bait = engine.add_bait(Bait::new(Vec3::new(0.0, 0.0, 10.0))).unwrap();
    engine.remove_bait(bait).unwrap();
    engine.add_bait(Bait::new(Vec3::new(0.0, 0.0, 10.0))).unwrap();
    engine.clear_baits();
    assert!(engine.baits().is_empty());
    engine.update(DT);
    assert_eq!(engine.tick(), 2);
}

#[test]
fn reset_empties_everything() {
    let mut engine = busy_engine(16, NeighborBackend::BruteForce);
    engine.set_goal_zone(Some(GoalZone {
        center: Vec3::ZERO,
        radius: 2.0,
    }));
    for _ in 0..10 {
        engine.update(DT);
    }
    engine.kill_fish(FishId(0)).unwrap();

    engine.reset();
    assert!(engine.school().is_empty());
    assert!(engine.predators().is_empty());
    assert!(engine.obstacles().is_empty());
    assert!(engine.baits().is_empty());
    assert!(engine.goal_zone().is_none());
    assert!(engine.events().is_empty());
    assert_eq!(engine.tick(), 0);

    engine.update(DT);
    assert_eq!(engine.last_stats().swimming_fish, 0);
}

#[test]
fn clearing_the_school_drops_predator_targets() {
    let mut engine = engine(17);
    engine.spawn_fish(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
    let predator = engine.spawn_predator(Vec3::ZERO, Vec3::ZERO);
    assert_eq!(predator, PredatorId(0));
    engine.update(DT);
    assert!(engine.predators()[0].target.is_some());

    engine.clear_school();
    assert!(engine.predators()[0].target.is_none());
    engine.update(DT);
    assert!(engine.predators()[0].target.is_none());
}
