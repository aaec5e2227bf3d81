//! Simulation builder and runner.
//!
//! The fluent entry point of the crate: configure a field with method
//! chaining, then either open a window with [`Simulation::run`] or take the
//! headless [`Field`] with [`Simulation::build`] for tests, embedding, or
//! offscreen export.
//!
//! ```ignore
//! use plexfield::prelude::*;
//!
//! Simulation::new()
//!     .with_particle_count(80)
//!     .with_size(1280, 720)
//!     .with_visuals(|v| {
//!         v.color_scheme(ColorScheme::Ocean);
//!     })
//!     .run()?;
//! ```

use winit::event_loop::{ControlFlow, EventLoop};

use crate::error::SimulationError;
use crate::field::{Field, FieldConfig};
use crate::visuals::VisualConfig;
use crate::window::App;

/// A particle field simulation builder.
///
/// Use method chaining to configure, then call `.run()` to open a window or
/// `.build()` for a headless field.
pub struct Simulation {
    config: FieldConfig,
    visuals: VisualConfig,
    width: u32,
    height: u32,
    title: String,
}

impl Simulation {
    /// Create a simulation with default settings: 80 particles, a
    /// 1280×720 field, connections at 120 px, the Ocean scheme.
    pub fn new() -> Self {
        Self {
            config: FieldConfig::default(),
            visuals: VisualConfig::default(),
            width: 1280,
            height: 720,
            title: "plexfield".to_string(),
        }
    }

    /// Set the particle count before quality scaling.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.config.particle_count = count;
        self
    }

    /// Set the field (and window) size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Toggle performance mode: cheaper update constants, no pulse or
    /// glow, short trails, connections off, 60% of the particle count.
    pub fn with_performance_mode(mut self, enabled: bool) -> Self {
        self.config.performance_mode = enabled;
        self
    }

    /// Honor a reduced-motion preference: slower stage cycling, fewer
    /// particles, no connection lines.
    pub fn with_reduced_motion(mut self, enabled: bool) -> Self {
        self.config.reduced_motion = enabled;
        self
    }

    /// Enable connection lines with the given distance threshold in pixels.
    pub fn with_connections(mut self, distance: f32) -> Self {
        self.config.connection_distance = Some(distance);
        self
    }

    /// Disable connection lines entirely.
    pub fn without_connections(mut self) -> Self {
        self.config.connection_distance = None;
        self
    }

    /// Override the stage dwell time in milliseconds.
    pub fn with_stage_dwell_ms(mut self, dwell_ms: f32) -> Self {
        self.config.dwell_ms = Some(dwell_ms);
        self
    }

    /// Seed the RNG for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Set the window title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Adjust rendering options through the visual config.
    ///
    /// ```ignore
    /// .with_visuals(|v| {
    ///     v.color_scheme(ColorScheme::Amber);
    ///     v.high_quality_effects(false);
    /// })
    /// ```
    pub fn with_visuals<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut VisualConfig),
    {
        configure(&mut self.visuals);
        self
    }

    /// Build the headless field without opening a window.
    pub fn build(self) -> Field {
        Field::new(
            self.config,
            self.visuals,
            self.width as f32,
            self.height as f32,
        )
    }

    /// Run the simulation in a window. Blocks until the window is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        let title = self.title.clone();
        let field = self.build();

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(field, title);
        event_loop.run_app(&mut app)?;
        Ok(())
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}
