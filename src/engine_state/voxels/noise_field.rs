//! # Noise Field
//!
//! Deterministic fractal Brownian motion built on Perlin noise. The field has no
//! mutable state: identical coordinates, octave counts and seeds always yield the same
//! sample, which is what makes chunk regeneration reproducible.

use noise::{NoiseFn, Perlin};

/// Multi-octave Perlin sampler.
#[derive(Clone, Copy, Debug)]
pub struct NoiseField {
    perlin: Perlin,
}

impl NoiseField {
    /// Creates a field for the given seed.
    pub fn new(seed: u32) -> Self {
        NoiseField {
            perlin: Perlin::new(seed),
        }
    }

    /// Samples 3D fbm: octave `i` reads the base noise at `coords * 2^i` with weight
    /// `0.5^(i + 1)`. The result lies within `[-1, 1]`.
    pub fn fbm(&self, coords: [f64; 3], octaves: u32) -> f64 {
        let mut sample = 0.0;
        let mut weight = 0.5;
        let mut coords = coords;
        for _ in 0..octaves {
            sample += weight * self.perlin.get(coords);
            coords = coords.map(|c| c * 2.0);
            weight *= 0.5;
        }
        sample
    }

    /// 2D counterpart of [`NoiseField::fbm`], used by the cloud overlay.
    pub fn fbm2(&self, coords: [f64; 2], octaves: u32) -> f64 {
        let mut sample = 0.0;
        let mut weight = 0.5;
        let mut coords = coords;
        for _ in 0..octaves {
            sample += weight * self.perlin.get(coords);
            coords = coords.map(|c| c * 2.0);
            weight *= 0.5;
        }
        sample
    }
}
