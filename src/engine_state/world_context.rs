//! # World Context
//!
//! Session-wide configuration read by every component. The context is loaded once
//! (from JSON or the bundled defaults), validated, and then handed by reference to the
//! generator, the automaton, the mesher and the streamer. Nothing mutates it afterwards.
//!
//! The noise scale and offset are the one exception: they start from the context but
//! live in [`NoiseParams`], which the streamer may replace when the world is reshuffled.

use std::path::Path;

use cgmath::Vector3;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The configuration bundled with the crate.
pub const DEFAULT_WORLD_JSON: &str = include_str!("../../assets/world.json");

/// Errors raised while loading or validating a [`WorldContext`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read world configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for the expected schema.
    #[error("failed to parse world configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A chunk extent is zero or negative.
    #[error("chunk size must be positive on every axis, got {0:?}")]
    InvalidChunkSize([i32; 3]),
    /// The chunk holds more cells than an `i32` index can address.
    #[error("chunk size {0:?} holds more cells than fit an i32 index")]
    ChunkTooLarge([i32; 3]),
    /// A grass probability denominator is zero or negative.
    #[error("{0} must be at least 1, got {1}")]
    InvalidProbability(&'static str, i32),
    /// The noise scale would divide by zero or flip the world.
    #[error("noise scale must be positive, got {0}")]
    InvalidNoiseScale(f64),
    /// The field of view has a negative extent.
    #[error("field of view extents must be non-negative, got {0:?}")]
    InvalidFov([i32; 3]),
    /// Clouds coverage must be a fraction.
    #[error("clouds coverage must be within [0, 1], got {0}")]
    InvalidCoverage(f32),
}

/// Immutable configuration for one session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldContext {
    /// Extent of every chunk in blocks, `[x, y, z]`.
    pub chunk_size: [i32; 3],
    /// Air below this height is filled with water during generation.
    pub water_level: f32,
    /// World-space Y of the cloud overlay.
    pub clouds_height: i32,
    /// Fraction of the sky covered by clouds.
    pub clouds_coverage: f32,
    /// Sample noise in world space (true) or restart it in every chunk (false).
    pub use_position_as_offset: bool,
    /// Draw a random noise scale and offset before the first chunk is generated.
    pub randomize_noise_on_start: bool,
    /// Number of fbm octaves.
    pub fractal_level: u32,
    /// Initial noise scale; larger values stretch features.
    pub noise_scale: f64,
    /// Initial noise offset.
    pub noise_offset: [f64; 3],
    /// Half-extent of the streaming window around the viewer.
    ///
    /// Chunks are created inside `viewer ± fov` on X/Z and stay active within the
    /// Euclidean length of this vector.
    pub player_fov: [i32; 3],
    /// Multiplier applied to `player_fov` for the initial population.
    pub initial_fov_multiplier: i32,
    /// Seconds between automaton ticks.
    pub chunk_update_interval: f32,
    /// Grass grows with probability `1 / grass_grow_prob` per tick.
    pub grass_grow_prob: i32,
    /// Covered grass dies with probability `1 / grass_death_prob` per tick.
    pub grass_death_prob: i32,
    /// Seed for the noise function and every chunk's random stream.
    pub seed: u32,
    /// Pipeline slices the scheduler may run per round.
    pub slices_per_round: usize,
    /// Deactivated chunks kept around before the least recently used is dropped.
    pub max_inactive_chunks: usize,
}

impl Default for WorldContext {
    fn default() -> Self {
        WorldContext {
            chunk_size: [16, 64, 16],
            water_level: 24.0,
            clouds_height: 96,
            clouds_coverage: 0.7,
            use_position_as_offset: true,
            randomize_noise_on_start: false,
            fractal_level: 5,
            noise_scale: 64.0,
            noise_offset: [0.0, 0.0, 0.0],
            player_fov: [32, 32, 32],
            initial_fov_multiplier: 2,
            chunk_update_interval: 1.0,
            grass_grow_prob: 10,
            grass_death_prob: 10,
            seed: 0,
            slices_per_round: 64,
            max_inactive_chunks: 256,
        }
    }
}

impl WorldContext {
    /// Parses and validates a context from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let context: WorldContext = serde_json::from_str(json)?;
        context.validate()?;
        Ok(context)
    }

    /// Reads, parses and validates a context from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let context = Self::from_json_str(&json)?;
        info!("World configuration loaded from {}", path.display());
        Ok(context)
    }

    /// Loads the configuration bundled with the crate.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_json_str(DEFAULT_WORLD_JSON)
    }

    /// Checks the invariants every component relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size.iter().any(|extent| *extent <= 0) {
            return Err(ConfigError::InvalidChunkSize(self.chunk_size));
        }
        let [x, y, z] = self.chunk_size;
        if x.checked_mul(y).and_then(|area| area.checked_mul(z)).is_none() {
            return Err(ConfigError::ChunkTooLarge(self.chunk_size));
        }
        if self.grass_grow_prob < 1 {
            return Err(ConfigError::InvalidProbability(
                "grass_grow_prob",
                self.grass_grow_prob,
            ));
        }
        if self.grass_death_prob < 1 {
            return Err(ConfigError::InvalidProbability(
                "grass_death_prob",
                self.grass_death_prob,
            ));
        }
        if !(self.noise_scale > 0.0) {
            return Err(ConfigError::InvalidNoiseScale(self.noise_scale));
        }
        if self.player_fov.iter().any(|extent| *extent < 0) {
            return Err(ConfigError::InvalidFov(self.player_fov));
        }
        if !(0.0..=1.0).contains(&self.clouds_coverage) {
            return Err(ConfigError::InvalidCoverage(self.clouds_coverage));
        }
        Ok(())
    }

    /// Chunk extent as a vector.
    pub fn chunk_dimensions(&self) -> Vector3<i32> {
        Vector3::new(self.chunk_size[0], self.chunk_size[1], self.chunk_size[2])
    }

    /// Planar distance within which chunks stay active.
    pub fn fov_radius(&self) -> f32 {
        let [x, y, z] = self.player_fov.map(|extent| extent as f32);
        (x * x + y * y + z * z).sqrt()
    }

    /// Seconds between automaton ticks, as a duration.
    pub fn chunk_update_duration(&self) -> web_time::Duration {
        web_time::Duration::from_secs_f32(self.chunk_update_interval.max(0.0))
    }
}

/// Noise scale and offset shared by every chunk's generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseParams {
    /// Divides world coordinates before sampling.
    pub scale: f64,
    /// Added to the scaled coordinates.
    pub offset: [f64; 3],
}

impl NoiseParams {
    /// Params taken verbatim from the configuration.
    pub fn from_context(context: &WorldContext) -> Self {
        NoiseParams {
            scale: context.noise_scale,
            offset: context.noise_offset,
        }
    }

    /// Draws a scale in `[32, 128)` and an offset uniformly inside a sphere of radius
    /// `scale²`.
    pub fn randomized(rng: &mut fastrand::Rng) -> Self {
        let scale = rng.i32(32..128) as f64;
        let offset = loop {
            let candidate = [
                rng.f64() * 2.0 - 1.0,
                rng.f64() * 2.0 - 1.0,
                rng.f64() * 2.0 - 1.0,
            ];
            if candidate.iter().map(|c| c * c).sum::<f64>() <= 1.0 {
                break candidate;
            }
        };
        NoiseParams {
            scale,
            offset: offset.map(|c| c * scale * scale),
        }
    }
}
