//! # Snapshot Demo
//!
//! Headless rendering: advances a seeded field for ten simulated seconds
//! without opening a window, then writes the accumulated scene to
//! `plexfield.png`. The fade tail, trails, and glow build up across frames
//! exactly as in the windowed loop.
//!
//! ## What This Demonstrates
//!
//! - `Simulation::build()` for a headless field
//! - Driving the field with fixed-step `FrameTiming`
//! - `OffscreenRenderer` readback and PNG export
//!
//! ## Try This
//!
//! - Change the seed and compare outputs - same seed, same image
//! - Render only 30 frames to catch the initial scatter convergence
//!
//! Run with: `cargo run --example snapshot`

use plexfield::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut field = Simulation::new()
        .with_particle_count(80)
        .with_size(1280, 720)
        .with_seed(7)
        .build();

    let mut renderer = OffscreenRenderer::new(1280, 720)?;

    // Ten seconds at 60 FPS; enough to cross into the Grid stage and pick
    // up connection lines.
    for frame in 0..600 {
        field.advance(FrameTiming::fixed(frame));
        renderer.render(&field);
    }

    renderer.save_png("plexfield.png")?;
    println!("Wrote plexfield.png ({:?} stage)", field.stage());
    Ok(())
}
