//! Target layouts for each animation stage.
//!
//! Every stage transition regenerates the target position of every particle
//! through one of these generators. Grid, radial, and arrow placement are
//! deterministic in particle order; scatter and the arrow shaft jitter draw
//! from the field's RNG.
//!
//! All generators work in pixel space with the origin at the top left and
//! scale their shapes from `R = min(width, height) × 0.4`.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::{PI, TAU};

use crate::particle::Particle;
use crate::stage::Stage;

/// Fraction of rolls that land a scattered particle inside a cluster.
const CLUSTER_PROBABILITY: f32 = 0.7;

/// Number of angular clusters in the scatter stage.
const CLUSTER_COUNT: u32 = 4;

/// Fraction of particles forming the arrow shaft; the rest form the head.
const ARROW_SHAFT_FRACTION: f32 = 0.4;

/// Assign every particle a fresh target for `stage`.
pub fn assign_targets(
    stage: Stage,
    particles: &mut [Particle],
    width: f32,
    height: f32,
    rng: &mut SmallRng,
) {
    match stage {
        Stage::Scatter => scatter_targets(particles, width, height, rng),
        Stage::Grid => grid_targets(particles, width, height),
        Stage::Radial => radial_targets(particles, width, height),
        Stage::Arrow => arrow_targets(particles, width, height, rng),
    }
}

/// Side length of the square grid holding `count` particles.
pub fn grid_side(count: usize) -> usize {
    (count as f32).sqrt().ceil() as usize
}

/// Grid cell for a particle index: row-major `(i % side, i / side)`.
pub fn grid_cell(index: usize, count: usize) -> (usize, usize) {
    let side = grid_side(count).max(1);
    (index % side, index / side)
}

/// Scattered points, 70% gathered into four angular clusters and the rest
/// spread over the full disk.
fn scatter_targets(particles: &mut [Particle], width: f32, height: f32, rng: &mut SmallRng) {
    let center = Vec2::new(width / 2.0, height / 2.0);
    let max_radius = width.min(height) * 0.4;

    for particle in particles {
        let target = if rng.gen::<f32>() < CLUSTER_PROBABILITY {
            let cluster = rng.gen_range(0..CLUSTER_COUNT);
            let cluster_angle = TAU / CLUSTER_COUNT as f32 * cluster as f32;
            let cluster_center = center
                + Vec2::new(cluster_angle.cos(), cluster_angle.sin()) * (max_radius * 0.5);

            let angle = rng.gen_range(0.0..TAU);
            let radius = rng.gen::<f32>() * max_radius * 0.4;
            cluster_center + Vec2::new(angle.cos(), angle.sin()) * radius
        } else {
            let angle = rng.gen_range(0.0..TAU);
            let radius = rng.gen::<f32>() * max_radius;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        };
        particle.set_target(target);
    }
}

/// Row-major square grid centered in the field, spanning 70% of the smaller
/// dimension. Deterministic given count and size.
fn grid_targets(particles: &mut [Particle], width: f32, height: f32) {
    let count = particles.len();
    if count == 0 {
        return;
    }
    let center = Vec2::new(width / 2.0, height / 2.0);
    let side = grid_side(count) as f32;
    let cell = width.min(height) * 0.7 / side;
    let origin = center - Vec2::splat(cell * side / 2.0);

    for (i, particle) in particles.iter_mut().enumerate() {
        let (gx, gy) = grid_cell(i, count);
        particle.set_target(
            origin + Vec2::new(gx as f32 * cell + cell / 2.0, gy as f32 * cell + cell / 2.0),
        );
    }
}

/// Points on a circle at equal angular spacing, radius scaled by each
/// particle's data value.
fn radial_targets(particles: &mut [Particle], width: f32, height: f32) {
    let count = particles.len();
    if count == 0 {
        return;
    }
    let center = Vec2::new(width / 2.0, height / 2.0);
    let max_radius = width.min(height) * 0.4;

    for (i, particle) in particles.iter_mut().enumerate() {
        let angle = TAU / count as f32 * i as f32;
        let radius = max_radius * (0.3 + (particle.data_value / 100.0) * 0.7);
        particle.set_target(center + Vec2::new(angle.cos(), angle.sin()) * radius);
    }
}

/// Upward arrow: the first 40% of particles form a jittered vertical shaft,
/// the rest sweep a semicircular head above it.
fn arrow_targets(particles: &mut [Particle], width: f32, height: f32, rng: &mut SmallRng) {
    let count = particles.len();
    if count == 0 {
        return;
    }
    let center = Vec2::new(width / 2.0, height / 2.0);
    let max_radius = width.min(height) * 0.4;

    for (i, particle) in particles.iter_mut().enumerate() {
        let t = i as f32 / count as f32;
        let target = if t < ARROW_SHAFT_FRACTION {
            let y = center.y + max_radius * 0.6 - t * max_radius * 1.5;
            let jitter = (rng.gen::<f32>() - 0.5) * max_radius * 0.2;
            Vec2::new(center.x + jitter, y)
        } else {
            let angle = (t - ARROW_SHAFT_FRACTION) / (1.0 - ARROW_SHAFT_FRACTION) * PI
                - PI / 2.0;
            let radius = max_radius * 0.5;
            Vec2::new(
                center.x + angle.cos() * radius,
                center.y - max_radius * 0.3 + angle.sin() * radius,
            )
        };
        particle.set_target(target);
    }
}
