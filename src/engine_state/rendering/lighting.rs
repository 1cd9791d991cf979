//! # Lighting
//!
//! The light pass that runs between terrain generation and meshing. Every vertex has a
//! color slot, but no light propagation exists yet: the pass always yields the constant
//! [`DARK`] color.

use crate::engine_state::voxels::{block::block_side::BlockSide, chunk::voxel_map::VoxelMap};

/// Vertex color used for every face.
pub const DARK: [u8; 4] = [13, 13, 13, 255];

/// Light values for one chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Lighting;

impl Lighting {
    /// Computes lighting for `map`.
    pub fn compute(_map: &VoxelMap) -> Self {
        Lighting
    }

    /// Color of the face on `side` of the voxel at `(x, y, z)`.
    #[inline]
    pub fn face_color(&self, _x: i32, _y: i32, _z: i32, _side: BlockSide) -> [u8; 4] {
        DARK
    }
}
