//! The particle field: spawning, stage cycling, and per-frame stepping.
//!
//! [`Field`] is the headless heart of the crate — a batch of particles, the
//! stage scheduler, and the spatial grid, advanced one frame at a time by
//! [`Field::advance`]. It never touches a window or GPU, so everything in
//! this module runs under plain unit tests; the renderer only reads the
//! state the field exposes.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::layout;
use crate::particle::{Particle, UpdateContext};
use crate::spatial::{Pair, SpatialGrid};
use crate::spawn::SpawnContext;
use crate::stage::{Stage, StageScheduler, DEFAULT_DWELL_MS, REDUCED_MOTION_DWELL_MS};
use crate::time::FrameTiming;
use crate::visuals::VisualConfig;

/// Default connection distance threshold in pixels; also the spatial grid
/// cell size.
pub const DEFAULT_CONNECTION_DISTANCE: f32 = 120.0;

/// Below this frame rate the field starts skipping whole frames.
const FRAME_SKIP_FPS: f32 = 20.0;

/// Probability of skipping a frame once below the FPS floor.
const FRAME_SKIP_PROBABILITY: f32 = 0.3;

/// Behavioral configuration for a field, passed down from the composition
/// root. There is no global state: two fields with different configs can
/// coexist in one process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldConfig {
    /// Requested particle count before quality scaling.
    pub particle_count: u32,
    /// Cheaper update constants, no pulse or glow, connections off.
    pub performance_mode: bool,
    /// Slower stage cycling, fewer particles, connections off.
    pub reduced_motion: bool,
    /// Connection distance threshold; `None` disables connection lines.
    pub connection_distance: Option<f32>,
    /// Stage dwell override in milliseconds; `None` picks the default for
    /// the motion preference.
    pub dwell_ms: Option<f32>,
    /// RNG seed for reproducible runs; `None` seeds from the system clock.
    pub seed: Option<u64>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 80,
            performance_mode: false,
            reduced_motion: false,
            connection_distance: Some(DEFAULT_CONNECTION_DISTANCE),
            dwell_ms: None,
            seed: None,
        }
    }
}

impl FieldConfig {
    /// Particle count after quality scaling: performance mode and reduced
    /// motion both drop the count to 60%.
    pub fn effective_count(&self) -> u32 {
        if self.performance_mode || self.reduced_motion {
            (self.particle_count as f32 * 0.6) as u32
        } else {
            self.particle_count
        }
    }

    /// Stage dwell time for this configuration.
    pub fn effective_dwell_ms(&self) -> f32 {
        self.dwell_ms.unwrap_or(if self.reduced_motion {
            REDUCED_MOTION_DWELL_MS
        } else {
            DEFAULT_DWELL_MS
        })
    }

    /// Whether connection lines can ever be drawn under this configuration.
    /// Stage gating comes on top (only Grid and Radial draw connections).
    pub fn connections_enabled(&self) -> bool {
        self.connection_distance.is_some() && !self.reduced_motion && !self.performance_mode
    }
}

/// A running particle field simulation.
pub struct Field {
    config: FieldConfig,
    visuals: VisualConfig,
    width: f32,
    height: f32,
    particles: Vec<Particle>,
    scheduler: StageScheduler,
    grid: SpatialGrid,
    positions: Vec<Vec2>,
    pairs: Vec<Pair>,
    rng: SmallRng,
}

impl Field {
    /// Spawn a field of the configured size. A zero effective count yields
    /// an empty field whose `advance` is a no-op.
    pub fn new(config: FieldConfig, visuals: VisualConfig, width: f32, height: f32) -> Self {
        let base_seed = config.seed.unwrap_or_else(entropy_seed);
        let count = config.effective_count();

        let mut particles: Vec<Particle> = (0..count)
            .map(|i| {
                let mut ctx = SpawnContext::new(i, count, width, height, base_seed);
                Particle::spawn(&mut ctx, visuals.color_scheme)
            })
            .collect();

        let mut rng = SmallRng::seed_from_u64(base_seed.wrapping_add(0x5EED));
        let scheduler = StageScheduler::new(config.effective_dwell_ms());
        layout::assign_targets(scheduler.stage(), &mut particles, width, height, &mut rng);

        let cell_size = config
            .connection_distance
            .unwrap_or(DEFAULT_CONNECTION_DISTANCE);

        Self {
            config,
            visuals,
            width,
            height,
            particles,
            scheduler,
            grid: SpatialGrid::new(cell_size),
            positions: Vec::with_capacity(count as usize),
            pairs: Vec::new(),
            rng,
        }
    }

    /// The currently active stage.
    #[inline]
    pub fn stage(&self) -> Stage {
        self.scheduler.stage()
    }

    /// All particles, in spawn order.
    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Connection pairs computed by the last `advance`, empty outside the
    /// Grid and Radial stages.
    #[inline]
    pub fn connections(&self) -> &[Pair] {
        &self.pairs
    }

    /// Behavioral configuration.
    #[inline]
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// Rendering configuration.
    #[inline]
    pub fn visuals(&self) -> &VisualConfig {
        &self.visuals
    }

    /// Mutable rendering configuration, for runtime scheme switching.
    #[inline]
    pub fn visuals_mut(&mut self) -> &mut VisualConfig {
        &mut self.visuals
    }

    /// Field width in pixels.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Field height in pixels.
    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Whether the field holds no particles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Whether this frame should be dropped outright. Only kicks in when
    /// the frame rate has collapsed below 20 FPS, and even then drops only
    /// a random 30% of frames so the animation crawls instead of freezing.
    pub fn should_skip_frame(&mut self, fps: f32) -> bool {
        fps < FRAME_SKIP_FPS && self.rng.gen::<f32>() < FRAME_SKIP_PROBABILITY
    }

    /// Advance the simulation one frame.
    ///
    /// Ticks the stage clock (scaled by the adaptive factor), applies the
    /// explosion impulse and fresh targets on a stage change, updates every
    /// particle against a position snapshot taken at frame start, then
    /// recomputes connection pairs for the renderer.
    pub fn advance(&mut self, timing: FrameTiming) {
        if self.particles.is_empty() {
            return;
        }

        if let Some(next) = self
            .scheduler
            .tick(timing.delta_ms * timing.adaptive_factor)
        {
            if next == Stage::Scatter {
                for particle in &mut self.particles {
                    let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
                    let speed = 5.0 + self.rng.gen::<f32>() * 5.0;
                    particle.explode(angle, speed);
                }
            }
            layout::assign_targets(next, &mut self.particles, self.width, self.height, &mut self.rng);
        }

        self.snapshot_positions();
        let ctx = UpdateContext {
            elapsed_ms: timing.elapsed_ms,
            stage: self.scheduler.stage(),
            width: self.width,
            height: self.height,
            performance_mode: self.config.performance_mode,
        };
        for index in 0..self.particles.len() {
            self.particles[index].update(index, &ctx, &self.positions, &mut self.rng);
        }

        self.pairs.clear();
        if self.connections_active() {
            if let Some(distance) = self.config.connection_distance {
                self.snapshot_positions();
                self.grid.rebuild(&self.positions);
                self.grid.pairs_within(&self.positions, distance, &mut self.pairs);
            }
        }
    }

    /// Resize the field. Positions are clamped into the new bounds and the
    /// current stage's targets are regenerated; zero or negative dimensions
    /// are ignored.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        self.width = width;
        self.height = height;
        for particle in &mut self.particles {
            particle.pos.x = particle.pos.x.clamp(0.0, width);
            particle.pos.y = particle.pos.y.clamp(0.0, height);
        }
        layout::assign_targets(
            self.scheduler.stage(),
            &mut self.particles,
            width,
            height,
            &mut self.rng,
        );
    }

    fn connections_active(&self) -> bool {
        self.config.connections_enabled() && self.scheduler.stage().draws_connections()
    }

    fn snapshot_positions(&mut self) {
        self.positions.clear();
        self.positions.extend(self.particles.iter().map(|p| p.pos));
    }
}

fn entropy_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(count: u32) -> FieldConfig {
        FieldConfig {
            particle_count: count,
            seed: Some(7),
            dwell_ms: Some(100.0),
            ..FieldConfig::default()
        }
    }

    fn advance_frames(field: &mut Field, frames: u64) {
        for frame in 0..frames {
            field.advance(FrameTiming::fixed(frame));
        }
    }

    /// Step until the scheduler enters `stage` (bounded).
    fn advance_to_stage(field: &mut Field, stage: Stage) {
        for frame in 0..10_000 {
            if field.stage() == stage {
                return;
            }
            field.advance(FrameTiming::fixed(frame));
        }
        panic!("stage {stage:?} never reached");
    }

    #[test]
    fn test_zero_count_is_empty_and_inert() {
        let mut field = Field::new(test_config(0), VisualConfig::default(), 800.0, 600.0);
        assert!(field.is_empty());
        advance_frames(&mut field, 10);
        assert!(field.connections().is_empty());
    }

    #[test]
    fn test_effective_count_scaling() {
        let full = FieldConfig {
            particle_count: 80,
            ..FieldConfig::default()
        };
        assert_eq!(full.effective_count(), 80);

        let reduced = FieldConfig {
            particle_count: 80,
            reduced_motion: true,
            ..FieldConfig::default()
        };
        assert_eq!(reduced.effective_count(), 48);

        let performance = FieldConfig {
            particle_count: 80,
            performance_mode: true,
            ..FieldConfig::default()
        };
        assert_eq!(performance.effective_count(), 48);
    }

    #[test]
    fn test_dwell_selection() {
        let normal = FieldConfig::default();
        assert_eq!(normal.effective_dwell_ms(), DEFAULT_DWELL_MS);

        let reduced = FieldConfig {
            reduced_motion: true,
            ..FieldConfig::default()
        };
        assert_eq!(reduced.effective_dwell_ms(), REDUCED_MOTION_DWELL_MS);

        let overridden = FieldConfig {
            dwell_ms: Some(50.0),
            reduced_motion: true,
            ..FieldConfig::default()
        };
        assert_eq!(overridden.effective_dwell_ms(), 50.0);
    }

    #[test]
    fn test_stages_cycle_in_order() {
        let mut field = Field::new(test_config(10), VisualConfig::default(), 800.0, 600.0);
        assert_eq!(field.stage(), Stage::Scatter);
        advance_to_stage(&mut field, Stage::Grid);
        advance_to_stage(&mut field, Stage::Radial);
        advance_to_stage(&mut field, Stage::Arrow);
        advance_to_stage(&mut field, Stage::Scatter);
    }

    #[test]
    fn test_wraparound_explodes_every_particle() {
        let mut field = Field::new(test_config(12), VisualConfig::default(), 800.0, 600.0);
        advance_to_stage(&mut field, Stage::Arrow);

        // Step frame by frame until the wrap lands; the explosion impulse
        // must be visible on the wrap frame itself.
        for frame in 0..1_000 {
            field.advance(FrameTiming::fixed(frame));
            if field.stage() == Stage::Scatter {
                assert!(field.particles().iter().all(|p| p.is_exploding()));
                return;
            }
        }
        panic!("wraparound never happened");
    }

    #[test]
    fn test_no_explosion_on_other_transitions() {
        let mut field = Field::new(test_config(12), VisualConfig::default(), 800.0, 600.0);
        advance_to_stage(&mut field, Stage::Grid);
        assert!(field.particles().iter().all(|p| !p.is_exploding()));
    }

    #[test]
    fn test_connections_follow_stage_gating() {
        let mut field = Field::new(test_config(40), VisualConfig::default(), 400.0, 400.0);

        // Scatter: no connections regardless of proximity.
        field.advance(FrameTiming::fixed(0));
        assert!(field.connections().is_empty());

        // 40 particles in a 400×400 field: in-range pairs are inevitable.
        advance_to_stage(&mut field, Stage::Grid);
        field.advance(FrameTiming::fixed(1));
        assert_eq!(field.stage(), Stage::Grid);
        assert!(!field.connections().is_empty());
    }

    #[test]
    fn test_connections_disabled_by_performance_mode() {
        let config = FieldConfig {
            performance_mode: true,
            ..test_config(40)
        };
        let mut field = Field::new(config, VisualConfig::default(), 400.0, 400.0);
        advance_to_stage(&mut field, Stage::Grid);
        advance_frames(&mut field, 120);
        assert!(field.connections().is_empty());
    }

    #[test]
    fn test_connections_disabled_by_reduced_motion() {
        let config = FieldConfig {
            reduced_motion: true,
            ..test_config(40)
        };
        let mut field = Field::new(config, VisualConfig::default(), 400.0, 400.0);
        advance_to_stage(&mut field, Stage::Grid);
        advance_frames(&mut field, 120);
        assert!(field.connections().is_empty());
    }

    #[test]
    fn test_connection_pairs_unique() {
        let mut field = Field::new(test_config(40), VisualConfig::default(), 400.0, 400.0);
        advance_to_stage(&mut field, Stage::Grid);
        field.advance(FrameTiming::fixed(1));
        assert!(!field.connections().is_empty());

        let mut seen = std::collections::HashSet::new();
        for pair in field.connections() {
            let key = (pair.a.min(pair.b), pair.a.max(pair.b));
            assert!(seen.insert(key), "pair {key:?} emitted twice");
        }
    }

    #[test]
    fn test_resize_clamps_and_ignores_degenerate() {
        let mut field = Field::new(test_config(30), VisualConfig::default(), 800.0, 600.0);
        advance_frames(&mut field, 5);

        field.resize(0.0, 600.0); // ignored
        assert_eq!(field.width(), 800.0);

        field.resize(200.0, 150.0);
        assert_eq!((field.width(), field.height()), (200.0, 150.0));
        for particle in field.particles() {
            assert!(particle.pos.x >= 0.0 && particle.pos.x <= 200.0);
            assert!(particle.pos.y >= 0.0 && particle.pos.y <= 150.0);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = Field::new(test_config(20), VisualConfig::default(), 800.0, 600.0);
        let mut b = Field::new(test_config(20), VisualConfig::default(), 800.0, 600.0);
        advance_frames(&mut a, 300);
        advance_frames(&mut b, 300);

        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.pos, pb.pos);
            assert_eq!(pa.size, pb.size);
        }
    }

    #[test]
    fn test_frame_skip_only_below_floor() {
        let mut field = Field::new(test_config(5), VisualConfig::default(), 800.0, 600.0);
        for _ in 0..100 {
            assert!(!field.should_skip_frame(60.0));
        }
        let skipped = (0..1000).filter(|_| field.should_skip_frame(10.0)).count();
        // Roughly 30% of frames skip under a collapsed frame rate.
        assert!((150..450).contains(&skipped));
    }
}
