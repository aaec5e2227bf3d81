//! Spawn context for particle initialization.
//!
//! Provides the randomness helpers a field needs when creating its particle
//! batch: uniform positions in the field rectangle and the power-skewed data
//! value that drives size, hue, and radial placement.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Context provided when spawning one particle of a batch.
///
/// ```ignore
/// let mut ctx = SpawnContext::new(i, count, width, height, seed);
/// let particle = Particle::spawn(&mut ctx, scheme);
/// ```
pub struct SpawnContext {
    /// Index of the particle being spawned (0 to count-1).
    pub index: u32,
    /// Total number of particles being spawned.
    pub count: u32,
    /// Field width in pixels.
    pub width: f32,
    /// Field height in pixels.
    pub height: f32,
    rng: SmallRng,
}

impl SpawnContext {
    /// Create a spawn context for one particle.
    ///
    /// `base_seed` keeps a batch reproducible: each particle derives its own
    /// stream from `base_seed` and its index, so spawning is deterministic
    /// per (seed, index) while still decorrelated across the batch.
    pub fn new(index: u32, count: u32, width: f32, height: f32, base_seed: u64) -> Self {
        let seed = base_seed ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Self {
            index,
            count,
            width,
            height,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Normalized progress through the batch (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.count == 0 {
            0.0
        } else {
            self.index as f32 / self.count as f32
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in the given range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        self.rng.gen_range(min..max)
    }

    /// Random angle in radians, full turn.
    #[inline]
    pub fn random_angle(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }

    /// Uniform random point in the field rectangle.
    pub fn random_in_field(&mut self) -> Vec2 {
        Vec2::new(
            self.rng.gen::<f32>() * self.width,
            self.rng.gen::<f32>() * self.height,
        )
    }

    /// Random value in [0, 100] skewed toward the high end.
    ///
    /// `rand^0.8` compresses the low range, so most particles land above the
    /// midpoint. This is the "data value" driving size, hue, and the radial
    /// layout radius.
    pub fn data_value(&mut self) -> f32 {
        self.rng.gen::<f32>().powf(0.8) * 100.0
    }
}
