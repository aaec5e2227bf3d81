//! # plexfield
//!
//! Stage-driven 2D particle field animations with trails, glow, and
//! connection lines.
//!
//! A field is a fixed batch of particles cycling through four layout stages
//! — scatter, grid, radial, arrow — on a wall-clock timer. Each frame every
//! particle seeks its stage target under local repulsion, sheds a fading
//! trail, and pulses with its data value; stage wraparound fires an outward
//! explosion impulse across the whole batch. In the grid and radial stages
//! nearby particles are joined by distance-faded connection lines found
//! through a uniform spatial grid.
//!
//! ## Quick Start
//!
//! ```ignore
//! use plexfield::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new()
//!         .with_particle_count(80)
//!         .with_size(1280, 720)
//!         .with_connections(120.0)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Field
//!
//! [`Field`] is the headless simulation: particles, the stage scheduler,
//! and the spatial grid, advanced one frame at a time by
//! [`Field::advance`]. It never touches a window or GPU — build one with
//! [`Simulation::build`] and drive it yourself for tests or offscreen
//! export.
//!
//! ### Stages
//!
//! [`Stage`] cycles Scatter → Grid → Radial → Arrow on the configured dwell
//! time (6 s by default, 8 s under reduced motion). Every transition
//! regenerates layout targets; the wrap back to Scatter also explodes the
//! batch outward.
//!
//! ### Rendering
//!
//! The renderer accumulates frames in an offscreen texture: a low-alpha
//! background quad fades previous frames into a motion-blur tail before
//! lines, trails, glow halos, and particle bodies are drawn on top.
//! [`Simulation::run`] presents this in a winit window;
//! [`OffscreenRenderer`] renders headless and exports PNG snapshots.
//!
//! ### Quality scaling
//!
//! Performance mode trims the particle count, trail lengths, and update
//! constants and drops glow and connections; a reduced-motion preference
//! slows stage cycling and also drops connections. Below 20 FPS the loop
//! starts skipping frames rather than freezing.

pub mod error;
pub mod field;
mod gpu;
pub mod layout;
pub mod particle;
pub mod shader;
mod simulation;
pub mod spatial;
pub mod spawn;
pub mod stage;
pub mod time;
pub mod visuals;
mod window;

pub use error::{GpuError, SimulationError, SnapshotError};
pub use field::{Field, FieldConfig, DEFAULT_CONNECTION_DISTANCE};
pub use glam::Vec2;
pub use gpu::OffscreenRenderer;
pub use particle::{Particle, TrailPoint, UpdateContext};
pub use simulation::Simulation;
pub use spatial::{Pair, SpatialGrid};
pub use spawn::SpawnContext;
pub use stage::{Stage, StageScheduler};
pub use time::{Clock, FrameTiming};
pub use visuals::{ColorScheme, LineStyle, VisualConfig};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use plexfield::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{SimulationError, SnapshotError};
    pub use crate::field::{Field, FieldConfig};
    pub use crate::gpu::OffscreenRenderer;
    pub use crate::simulation::Simulation;
    pub use crate::stage::Stage;
    pub use crate::time::{Clock, FrameTiming};
    pub use crate::visuals::{ColorScheme, VisualConfig};
    pub use crate::Vec2;
}
