//! Particle state and the per-frame update step.
//!
//! A particle is a plain data record: position, velocity, a target it seeks,
//! HSL color, a pulsing display size, and a short fading trail. All motion
//! happens in [`Particle::update`], which needs nothing but numbers — no
//! canvas, no window — so the whole simulation layer is unit-testable.
//!
//! Particles are created in one batch per field and only replaced wholesale
//! when the field is rebuilt; a run mutates positions, velocities, and
//! trails, never the set itself.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::Rng;

use crate::spawn::SpawnContext;
use crate::stage::Stage;
use crate::visuals::ColorScheme;

/// Repulsion radius between nearby particles, in pixels.
const REPEL_DISTANCE: f32 = 20.0;
const REPEL_DISTANCE_PERFORMANCE: f32 = 15.0;

/// Repulsion force scale per pixel of penetration.
const REPEL_FORCE: f32 = 0.003;
const REPEL_FORCE_PERFORMANCE: f32 = 0.002;

/// Fraction of the remaining distance to the target covered per frame.
const SEEK_GAIN: f32 = 0.05;
const SEEK_GAIN_PERFORMANCE: f32 = 0.06;

/// Opacity removed from every trail point per frame.
const TRAIL_FADE: f32 = 0.03;
const TRAIL_FADE_PERFORMANCE: f32 = 0.04;

/// Below this speed an explosion impulse is spent.
const EXPLOSION_FLOOR: f32 = 0.1;

/// Frequency scale of the size pulse (per millisecond).
const PULSE_SPEED: f32 = 0.002;

/// Per-frame inputs shared by every particle update.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext {
    /// Wall-clock milliseconds since the field started; drives the pulse.
    pub elapsed_ms: f32,
    /// Currently active stage.
    pub stage: Stage,
    /// Field width in pixels.
    pub width: f32,
    /// Field height in pixels.
    pub height: f32,
    /// Cheaper constants, no pulse, short trails.
    pub performance_mode: bool,
}

/// One sample of a particle's recent path, drawn as a fading disc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    /// Position at the time the sample was taken.
    pub pos: Vec2,
    /// Disc radius (70% of the particle's size when sampled).
    pub size: f32,
    /// Current opacity; the point is dropped once this reaches zero.
    pub opacity: f32,
}

/// A single point entity of the field.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current position in pixels.
    pub pos: Vec2,
    /// Parallax depth factor, 0.5-2.5.
    pub z: f32,
    /// Layout target the particle seeks.
    pub target: Vec2,
    /// Velocity from the last update, in pixels per frame.
    pub velocity: Vec2,
    /// Hue in degrees, fixed at spawn from the color scheme and data value.
    pub hue: f32,
    /// Saturation percentage, 75-100.
    pub saturation: f32,
    /// Lightness percentage, 55-80.
    pub lightness: f32,
    /// Resting radius, `2.5 + data_value / 18`.
    pub base_size: f32,
    /// Display radius this frame (base size plus pulse).
    pub size: f32,
    /// Synthetic scalar in [0, 100] driving size, hue, and radial layout.
    pub data_value: f32,
    /// Bounded history of recent positions, oldest first.
    pub trail: Vec<TrailPoint>,
    explosion_angle: f32,
    explosion_speed: f32,
    explosion_decay: f32,
}

impl Particle {
    /// Spawn one particle at a uniformly random position.
    pub fn spawn(ctx: &mut SpawnContext, scheme: ColorScheme) -> Self {
        let pos = ctx.random_in_field();
        let data_value = ctx.data_value();
        let (hue_base, hue_span) = scheme.hue_band();

        Self {
            pos,
            z: 0.5 + ctx.random() * 2.0,
            target: pos,
            velocity: Vec2::ZERO,
            hue: hue_base + (data_value / 100.0) * hue_span,
            saturation: 75.0 + ctx.random() * 25.0,
            lightness: 55.0 + ctx.random() * 25.0,
            base_size: 2.5 + data_value / 18.0,
            size: 2.5 + data_value / 18.0,
            data_value,
            trail: Vec::new(),
            explosion_angle: 0.0,
            explosion_speed: 0.0,
            explosion_decay: 1.0,
        }
    }

    /// Set the layout target the particle will seek.
    #[inline]
    pub fn set_target(&mut self, target: Vec2) {
        self.target = target;
    }

    /// Apply an outward impulse. The particle ignores its target and drifts
    /// along `angle` until the speed decays below the floor.
    pub fn explode(&mut self, angle: f32, speed: f32) {
        self.explosion_angle = angle;
        self.explosion_speed = speed;
        self.explosion_decay = 0.95;
    }

    /// Whether an explosion impulse is still being integrated.
    #[inline]
    pub fn is_exploding(&self) -> bool {
        self.explosion_speed > EXPLOSION_FLOOR
    }

    /// Remaining explosion speed, for decay inspection.
    #[inline]
    pub fn explosion_speed(&self) -> f32 {
        self.explosion_speed
    }

    /// Advance one frame.
    ///
    /// `index` is this particle's position in `positions`, a snapshot of
    /// every particle's location taken at the start of the frame; repulsion
    /// reads the snapshot so update order does not matter.
    pub fn update(
        &mut self,
        index: usize,
        ctx: &UpdateContext,
        positions: &[Vec2],
        rng: &mut SmallRng,
    ) {
        let (repel_distance, repel_force, seek_gain) = if ctx.performance_mode {
            (REPEL_DISTANCE_PERFORMANCE, REPEL_FORCE_PERFORMANCE, SEEK_GAIN_PERFORMANCE)
        } else {
            (REPEL_DISTANCE, REPEL_FORCE, SEEK_GAIN)
        };

        if self.is_exploding() {
            self.pos.x += self.explosion_angle.cos() * self.explosion_speed;
            self.pos.y += self.explosion_angle.sin() * self.explosion_speed;
            self.explosion_speed *= self.explosion_decay;

            self.pos.x = self.pos.x.clamp(0.0, ctx.width);
            self.pos.y = self.pos.y.clamp(0.0, ctx.height);

            let skip = if ctx.performance_mode { 0.7 } else { 0.5 };
            if rng.gen::<f32>() > skip {
                self.add_trail_point(0.7, ctx, rng);
            }
        } else {
            let mut v = (self.target - self.pos) * seek_gain;

            for (j, &other) in positions.iter().enumerate() {
                if j == index {
                    continue;
                }
                let delta = self.pos - other;
                let dist_sq = delta.length_squared();
                if dist_sq < repel_distance * repel_distance && dist_sq > 0.0 {
                    let distance = dist_sq.sqrt();
                    let force = (repel_distance - distance) * repel_force;
                    v += delta * (force / distance);
                }
            }

            self.velocity = v;
            self.pos += v;

            let skip = if ctx.performance_mode { 0.6 } else { 0.3 };
            if rng.gen::<f32>() > skip {
                let base_opacity = if ctx.stage == Stage::Scatter { 0.4 } else { 0.3 };
                self.add_trail_point(base_opacity, ctx, rng);
            }
        }

        let fade = if ctx.performance_mode { TRAIL_FADE_PERFORMANCE } else { TRAIL_FADE };
        self.trail.retain_mut(|point| {
            point.opacity -= fade;
            point.opacity > 0.0
        });

        if ctx.performance_mode {
            self.size = self.base_size;
        } else {
            let pulse_amount = self.data_value / 30.0;
            let frequency = self.data_value / 20.0 + 0.5;
            self.size = self.base_size
                + (ctx.elapsed_ms * PULSE_SPEED * frequency).sin() * pulse_amount;
        }
    }

    /// Maximum trail length for the current state.
    pub fn max_trail_len(&self, ctx: &UpdateContext) -> usize {
        if ctx.performance_mode {
            3
        } else if self.is_exploding() {
            7
        } else if ctx.stage == Stage::Scatter {
            10
        } else {
            5
        }
    }

    fn add_trail_point(&mut self, base_opacity: f32, ctx: &UpdateContext, rng: &mut SmallRng) {
        if self.trail.len() < self.max_trail_len(ctx) {
            self.trail.push(TrailPoint {
                pos: self.pos,
                size: self.size * 0.7,
                opacity: base_opacity + rng.gen::<f32>() * 0.2,
            });
        }
    }
}
