//! # Voxel World Entry Point
//!
//! Runs the headless driver: a viewer walks through a generated world while the
//! streamer generates, simulates and meshes chunks around it.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info VOXEL_WORLD_CONFIG=assets/world.json cargo run --release
//! ```

fn main() {
    if let Err(error) = voxel_world::run() {
        eprintln!("voxel-world: {error}");
        std::process::exit(1);
    }
}
