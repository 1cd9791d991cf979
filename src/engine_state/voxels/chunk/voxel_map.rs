//! # Voxel Map Module
//!
//! The dense block grid owned by a chunk. Blocks are stored in a flat vector indexed by
//! `x + y * size_x + z * size_x * size_y`, one compact [`BlockTypeSize`] per cell.
//!
//! All accessors take chunk-local signed coordinates and are bounds-checked:
//! - reads outside the grid return [`OUT_OF_BOUNDS`]
//! - writes outside the grid are dropped
//!
//! This is what lets the generator stamp trees and veins near chunk borders without
//! caring which cells actually belong to the chunk.

use cgmath::{Point3, Vector3};

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId, BlockTypeSize, OUT_OF_BOUNDS};

/// A fixed-size 3D grid of block ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelMap {
    dimensions: Vector3<i32>,
    blocks: Vec<BlockTypeSize>,
}

impl VoxelMap {
    /// Creates a grid of the given extent with every cell set to `fill`.
    ///
    /// # Panics
    /// Panics if an extent is not positive or `fill` is not a storable block id.
    pub fn new(dimensions: Vector3<i32>, fill: BlockId) -> Self {
        assert!(
            dimensions.x > 0 && dimensions.y > 0 && dimensions.z > 0,
            "voxel map extent must be positive, got {dimensions:?}"
        );
        let len = (dimensions.x * dimensions.y * dimensions.z) as usize;
        VoxelMap {
            dimensions,
            blocks: vec![Self::to_stored(fill); len],
        }
    }

    fn to_stored(block: BlockId) -> BlockTypeSize {
        BlockTypeSize::try_from(block)
            .unwrap_or_else(|_| panic!("block id {block} cannot be stored in a voxel map"))
    }

    /// Extent of the grid on each axis.
    pub fn dimensions(&self) -> Vector3<i32> {
        self.dimensions
    }

    /// Whether `(x, y, z)` lies inside the grid.
    #[inline]
    pub fn index_exists(&self, x: i32, y: i32, z: i32) -> bool {
        !(x < 0
            || x >= self.dimensions.x
            || y < 0
            || y >= self.dimensions.y
            || z < 0
            || z >= self.dimensions.z)
    }

    #[inline]
    fn index(&self, x: i32, y: i32, z: i32) -> usize {
        (x + y * self.dimensions.x + z * self.dimensions.x * self.dimensions.y) as usize
    }

    /// Gets the block at `(x, y, z)`, or [`OUT_OF_BOUNDS`] outside the grid.
    #[inline]
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        if self.index_exists(x, y, z) {
            self.blocks[self.index(x, y, z)] as BlockId
        } else {
            OUT_OF_BOUNDS
        }
    }

    /// Convenience wrapper around [`VoxelMap::get_block_at`].
    pub fn get_block(&self, point: Point3<i32>) -> BlockId {
        self.get_block_at(point.x, point.y, point.z)
    }

    /// Gets the block sharing `side` with the block at `(x, y, z)`.
    #[inline]
    pub fn get_neighbor(&self, x: i32, y: i32, z: i32, side: BlockSide) -> BlockId {
        let offset = side.normal();
        self.get_block_at(x + offset.x, y + offset.y, z + offset.z)
    }

    /// Sets the block at `(x, y, z)`. Returns `false` (and writes nothing) outside the grid.
    ///
    /// # Panics
    /// Panics if `block` is negative; the sentinel is never stored.
    #[inline]
    pub fn set_block_at(&mut self, x: i32, y: i32, z: i32, block: BlockId) -> bool {
        let stored = Self::to_stored(block);
        if !self.index_exists(x, y, z) {
            return false;
        }
        let idx = self.index(x, y, z);
        self.blocks[idx] = stored;
        true
    }

    /// Whether the cell is `air` or lies outside the grid.
    #[inline]
    pub fn is_air_block(&self, x: i32, y: i32, z: i32, air: BlockId) -> bool {
        !self.index_exists(x, y, z) || self.blocks[self.index(x, y, z)] as BlockId == air
    }

    /// Number of cells holding `block`.
    pub fn count(&self, block: BlockId) -> usize {
        self.blocks
            .iter()
            .filter(|stored| **stored as BlockId == block)
            .count()
    }

    /// Raw storage, in flat index order.
    pub fn blocks(&self) -> &[BlockTypeSize] {
        &self.blocks
    }
}
