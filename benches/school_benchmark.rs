/*
 * School Simulation Benchmark
 *
 * Measures the neighborhood pass with both backends and the full update
 * loop, at school sizes from a small shoal to a large bait ball.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::{Quat, Vec3};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use shoal::neighbors::Neighborhood;
use shoal::spawn::{self, SpawnVolume};
use shoal::{Bait, FlockingEngine, NeighborBackend, Obstacle, SimulationParams};

const SIZES: [usize; 4] = [100, 250, 500, 1000];

fn seeded_params(backend: NeighborBackend) -> SimulationParams {
    let mut params = SimulationParams::default();
    params.rng_seed = Some(42);
    params.flocking.neighbor_backend = backend;
    params
}

fn bench_neighborhood(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighborhood");

    for &n in SIZES.iter() {
        let params = SimulationParams::default();
        let volume = SpawnVolume::from_bounds(&params.bounds, 1.0);
        let mut rng = SmallRng::seed_from_u64(7);
        let school = spawn::school(n, &volume, &params.fish, &params.bounds, &mut rng);
        let radius = params.flocking.perception_radius;

        for backend in [NeighborBackend::BruteForce, NeighborBackend::Grid] {
            let id = BenchmarkId::new(format!("{:?}", backend), n);
            group.bench_with_input(id, &school, |b, school| {
                let mut neighborhood = Neighborhood::new();
                b.iter(|| {
                    neighborhood.rebuild(black_box(school), radius, backend, &params.bounds);
                    black_box(neighborhood.link_count())
                });
            });
        }
    }

    group.finish();
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    group.sample_size(30);

    for &n in SIZES.iter() {
        for backend in [NeighborBackend::BruteForce, NeighborBackend::Grid] {
            let id = BenchmarkId::new(format!("{:?}", backend), n);
            group.bench_function(id, |b| {
                let mut engine = match FlockingEngine::new(seeded_params(backend)) {
                    Ok(engine) => engine,
                    Err(err) => panic!("benchmark parameters rejected: {}", err),
                };
                let volume = SpawnVolume::from_bounds(&engine.params().bounds, 1.0);
                engine.spawn_school(n, &volume);
                engine.spawn_predators(2, &volume);
                for x in [-8.0, 0.0, 8.0] {
                    let rock = Obstacle::ellipsoid(
                        Vec3::new(x, 0.0, 0.0),
                        2.0,
                        Vec3::new(1.0, 4.0, 1.5),
                        Quat::from_rotation_y(0.4),
                    );
                    engine.add_obstacle(rock).ok();
                }
                // Goal baits are never eaten, so the seek force stays on
                engine.add_bait(Bait::goal(Vec3::new(0.0, 0.0, -15.0))).ok();

                b.iter(|| {
                    engine.update(black_box(1.0 / 60.0));
                    engine.drain_events().len()
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_neighborhood, bench_update);
criterion_main!(benches);
