//! Benchmarks for the CPU simulation paths.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use plexfield::layout;
use plexfield::particle::Particle;
use plexfield::spatial::SpatialGrid;
use plexfield::spawn::SpawnContext;
use plexfield::stage::Stage;
use plexfield::time::FrameTiming;
use plexfield::visuals::ColorScheme;
use plexfield::Simulation;

fn scattered_positions(count: usize) -> Vec<Vec2> {
    let mut rng = SmallRng::seed_from_u64(9);
    (0..count)
        .map(|_| Vec2::new(rng.gen::<f32>() * 1280.0, rng.gen::<f32>() * 720.0))
        .collect()
}

fn spawn_batch(count: u32) -> Vec<Particle> {
    (0..count)
        .map(|i| {
            let mut ctx = SpawnContext::new(i, count, 1280.0, 720.0, 9);
            Particle::spawn(&mut ctx, ColorScheme::Ocean)
        })
        .collect()
}

fn bench_field_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_advance");

    for count in [40u32, 80, 200] {
        group.bench_with_input(BenchmarkId::new("particles", count), &count, |b, &count| {
            let mut field = Simulation::new()
                .with_particle_count(count)
                .with_size(1280, 720)
                .with_seed(9)
                .build();
            let mut frame = 0u64;
            b.iter(|| {
                field.advance(FrameTiming::fixed(frame));
                frame += 1;
                black_box(field.particles().len())
            })
        });
    }

    group.finish();
}

fn bench_spatial(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial");

    for count in [80usize, 500, 2000] {
        let positions = scattered_positions(count);

        group.bench_with_input(BenchmarkId::new("rebuild", count), &count, |b, _| {
            let mut grid = SpatialGrid::new(120.0);
            b.iter(|| {
                grid.rebuild(black_box(&positions));
            })
        });

        group.bench_with_input(BenchmarkId::new("pairs", count), &count, |b, _| {
            let mut grid = SpatialGrid::new(120.0);
            grid.rebuild(&positions);
            let mut out = Vec::new();
            b.iter(|| {
                grid.pairs_within(black_box(&positions), 120.0, &mut out);
                black_box(out.len())
            })
        });
    }

    group.finish();
}

fn bench_layouts(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");

    let mut particles = spawn_batch(200);
    let mut rng = SmallRng::seed_from_u64(9);

    for stage in Stage::ALL {
        group.bench_function(BenchmarkId::from_parameter(format!("{stage:?}")), |b| {
            b.iter(|| {
                layout::assign_targets(stage, &mut particles, 1280.0, 720.0, &mut rng);
                black_box(particles[0].target)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_field_advance, bench_spatial, bench_layouts);
criterion_main!(benches);
