//! # Showcase Demo
//!
//! The full stage-cycling animation with every effect enabled: clustered
//! scatter, grid and radial layouts with connection lines, the arrow
//! formation, glow halos on high-value particles, and the explosion burst
//! on every wraparound.
//!
//! ## What This Demonstrates
//!
//! - Default `Simulation` configuration
//! - Stage cycling on the 6-second dwell
//! - Connection lines in the Grid and Radial stages
//!
//! ## Controls
//!
//! - **Space** - pause/resume
//! - **C** - cycle color scheme
//! - **Escape** - quit
//!
//! ## Try This
//!
//! - Raise the particle count to 200 for a denser web
//! - Shorten the dwell with `.with_stage_dwell_ms(2_000.0)` to see the
//!   explosion burst more often
//!
//! Run with: `cargo run --example showcase`

use plexfield::prelude::*;

fn main() -> Result<(), SimulationError> {
    Simulation::new()
        .with_particle_count(80)
        .with_size(1280, 720)
        .with_connections(120.0)
        .with_title("plexfield - showcase")
        .run()
}
