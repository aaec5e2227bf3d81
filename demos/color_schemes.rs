//! # Color Schemes Demo
//!
//! Starts in the Amber scheme; press `C` to cycle through all four.
//! A scheme fixes the hue band particles spawn into and the background
//! color the fade pass accumulates over, so switching at runtime recolors
//! the background immediately while particles keep their spawn hues until
//! the field is rebuilt.
//!
//! ## What This Demonstrates
//!
//! - `.with_visuals(...)` configuration
//! - Runtime scheme cycling with the `C` key
//!
//! Run with: `cargo run --example color_schemes`

use plexfield::prelude::*;

fn main() -> Result<(), SimulationError> {
    Simulation::new()
        .with_particle_count(100)
        .with_size(1280, 720)
        .with_visuals(|v| {
            v.color_scheme(ColorScheme::Amber);
        })
        .with_title("plexfield - color schemes")
        .run()
}
