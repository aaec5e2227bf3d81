use plexfield::prelude::*;

fn main() -> Result<(), SimulationError> {
    Simulation::new()
        .with_particle_count(80)
        .with_size(1280, 720)
        .with_title("plexfield")
        .run()
}
