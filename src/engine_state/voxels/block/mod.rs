//! # Block Module
//!
//! This module provides the core block-related functionality for the voxel world.
//! It includes block definitions, the registry that resolves names to ids, and
//! block face handling.
//!
//! Blocks are stored in chunks as compact [`BlockTypeSize`] values. Accessors widen
//! them to [`BlockId`] so that the [`OUT_OF_BOUNDS`] sentinel can be returned for
//! coordinates that fall outside a chunk.

use serde::{Deserialize, Serialize};

use block_side::BlockSide;

pub mod block_registry;
pub mod block_side;

/// The underlying integer type used to store block ids inside a voxel grid.
pub type BlockTypeSize = u16;

/// A block id as seen by callers: an index into the [`block_registry::BlockRegistry`],
/// or [`OUT_OF_BOUNDS`].
pub type BlockId = i32;

/// Returned by chunk accessors for coordinates outside the chunk. Never stored in a grid.
pub const OUT_OF_BOUNDS: BlockId = -1;

fn default_particle_lifetime() -> f32 {
    3.0
}

/// Static metadata for one kind of block.
///
/// Definitions are loaded once with the registry and never change during a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDef {
    /// Unique name used for lookups (`"Air"`, `"Water"`, ...).
    pub name: String,
    /// Index into the registry's material list.
    #[serde(default)]
    pub material_index: usize,
    /// Tile atlas indices in face order bottom, top, right, left, front, back.
    ///
    /// Fewer than six entries are allowed; missing faces reuse the last tile.
    pub tiles: Vec<u32>,
    /// Whether the block falls when there is air below it.
    #[serde(default)]
    pub uses_gravity: bool,
    /// Whether neighboring faces stay visible through this block.
    #[serde(default)]
    pub is_transparent: bool,
    /// Whether the block is rendered with partial opacity.
    #[serde(default)]
    pub is_translucent: bool,
    /// How long (in seconds) a particle burst of this block should live.
    #[serde(default = "default_particle_lifetime")]
    pub particle_lifetime: f32,
}

impl BlockDef {
    /// Gets the atlas tile used for one face of the block.
    ///
    /// # Panics
    /// Panics if the definition has no tiles at all. The registry rejects such
    /// definitions at load time.
    pub fn tile_for(&self, side: BlockSide) -> u32 {
        let slot = side as usize;
        match self.tiles.get(slot) {
            Some(tile) => *tile,
            None => *self
                .tiles
                .last()
                .unwrap_or_else(|| panic!("block '{}' has no tiles", self.name)),
        }
    }
}
