#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! Procedural generation, simulation and meshing for a chunked 3D voxel world.
//!
//! The crate turns noise into terrain, evolves that terrain with a small cellular
//! automaton (grass, gravity, water), and turns every chunk into face-culled triangle
//! batches grouped by material. Rendering, physics and input are left to the caller:
//! the world emits [`WorldEvent`]s and accepts [`BlockEdit`]s.
//!
//! ## Key Modules
//!
//! * `engine_state` - The [`ChunkStreamer`] and every subsystem it drives
//! * `engine_state::voxels` - Blocks, noise, chunks, clouds and the world map
//! * `engine_state::rendering` - Mesh construction
//! * `engine_state::task_management` - Per-chunk pipelines and scheduling
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_world::{BlockRegistry, ChunkStreamer, WorldContext};
//!
//! let context = WorldContext::bundled().unwrap();
//! let registry = BlockRegistry::with_default_blocks().unwrap();
//! let mut streamer = ChunkStreamer::new(context, registry, cgmath::Point3::new(0.0, 40.0, 0.0));
//!
//! loop {
//!     streamer.process(web_time::Duration::from_millis(16));
//!     for event in streamer.drain_events() {
//!         // hand meshes, falling blocks and particles to their owners
//!         let _ = event;
//!     }
//! }
//! ```

use cgmath::{Deg, Point3};
use log::info;
use thiserror::Error;
use web_time::{Duration, Instant};

pub mod engine_state;

pub use engine_state::{
    camera_state::{ViewerController, ViewerState},
    events::{BlockEdit, WorldEvent},
    rendering::{
        meshing::{ChunkMesh, MeshBuilder},
        Vertex,
    },
    voxels::{
        block::{
            block_registry::{BlockRegistry, RegistryError},
            BlockDef, BlockId, OUT_OF_BOUNDS,
        },
        chunk::voxel_map::VoxelMap,
        noise_field::NoiseField,
    },
    world_context::{ConfigError, NoiseParams, WorldContext},
    ChunkStreamer, StreamerStats,
};

/// Environment variable naming a world configuration file.
pub const CONFIG_ENV_VAR: &str = "VOXEL_WORLD_CONFIG";

/// Frames simulated by [`run`].
const HEADLESS_FRAMES: u32 = 600;

/// Simulated frame time of [`run`].
const FRAME_TIME: Duration = Duration::from_millis(16);

/// Errors that stop the headless driver from starting.
#[derive(Debug, Error)]
pub enum RunError {
    /// The world configuration failed to load.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The block content failed to load.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Loads the configuration named by [`CONFIG_ENV_VAR`], or the bundled one.
pub fn load_world_context() -> Result<WorldContext, ConfigError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) => WorldContext::from_path(path),
        Err(_) => WorldContext::bundled(),
    }
}

/// Walks a viewer across a freshly generated world and logs what the streamer does.
pub fn run() -> Result<(), RunError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
    info!("Logger initialized");

    let context = load_world_context()?;
    let registry = BlockRegistry::with_default_blocks()?;
    info!(
        "{} blocks, {} materials, chunk size {:?}",
        registry.len(),
        registry.materials().len(),
        context.chunk_size
    );

    let start = Point3::new(0.5, context.chunk_size[1] as f32, 0.5);
    let mut streamer = ChunkStreamer::new(context, registry, start);
    let mut controller = ViewerController::new(Deg(0.0), 8.0);

    let started = Instant::now();
    let (mut meshes, mut falling, mut particles) = (0usize, 0usize, 0usize);
    for frame in 0..HEADLESS_FRAMES {
        streamer.process(FRAME_TIME);
        for event in streamer.drain_events() {
            match event {
                WorldEvent::MeshReady { .. } => meshes += 1,
                WorldEvent::SpawnFallingBlock { block, position } => {
                    falling += 1;
                    // No physics here: drop the block straight back where it fell from.
                    let landing = position.cast::<f32>().unwrap_or(start);
                    streamer.land_falling_block(landing, block);
                }
                WorldEvent::SpawnParticles { .. } => particles += 1,
            }
        }

        let next = controller.step(streamer.viewer_position(), FRAME_TIME);
        if streamer.set_viewer_position(next).is_some() && frame % 4 == 0 {
            controller.turn(Deg(90.0));
        }

        if frame % 120 == 0 {
            let stats = streamer.stats();
            info!(
                "Frame {}: {} chunks ({} active, {} inactive, {} meshed, {} scheduled)",
                frame, stats.chunks, stats.active, stats.inactive, stats.meshed, stats.scheduled
            );
        }
    }

    let stats = streamer.stats();
    info!(
        "Finished {} frames in {:?}: {} chunks, {} meshes built, {} falling blocks, {} particle bursts",
        HEADLESS_FRAMES,
        started.elapsed(),
        stats.chunks,
        meshes,
        falling,
        particles
    );
    Ok(())
}
