//! # Performance Mode Demo
//!
//! The same animation trimmed for weak hardware: 60% of the particle
//! count, cheaper repulsion constants, three-point trails, a heavier fade,
//! and no pulse, glow, or connection lines.
//!
//! ## What This Demonstrates
//!
//! - `.with_performance_mode(true)` quality scaling
//! - The heavier fade alpha (0.15 vs 0.08) shortening the motion-blur tail
//!
//! ## Try This
//!
//! - Run side by side with the showcase demo and compare the trails
//! - Combine with `.with_reduced_motion(true)` for the slowest cycling
//!
//! Run with: `cargo run --example performance_mode`

use plexfield::prelude::*;

fn main() -> Result<(), SimulationError> {
    Simulation::new()
        .with_particle_count(80)
        .with_size(1280, 720)
        .with_performance_mode(true)
        .with_title("plexfield - performance mode")
        .run()
}
