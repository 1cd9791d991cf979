//! Requests exchanged between the streamer and its external collaborators.
//!
//! The world never spawns physics bodies, particles or GPU buffers itself. It emits
//! [`WorldEvent`]s for whoever owns those, and accepts [`BlockEdit`]s from input
//! handling.

use cgmath::Point3;

use crate::engine_state::voxels::block::BlockId;

/// Something the world wants an outside system to do.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// A block lost its support and should continue as a falling body.
    SpawnFallingBlock {
        /// Block id the body should carry
        block: BlockId,
        /// World-space cell the block left
        position: Point3<i32>,
    },
    /// A block was broken; show a burst of its particles.
    SpawnParticles {
        /// Block that was broken
        block: BlockId,
        /// World-space cell of the broken block
        position: Point3<i32>,
        /// Seconds the burst stays alive
        lifetime: f32,
    },
    /// A chunk installed a new mesh.
    MeshReady {
        /// Grid origin of the chunk
        origin: Point3<i32>,
        /// Increases with every mesh the chunk installs
        revision: u64,
    },
}

/// An edit at a chunk-relative position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockEdit {
    /// Place a block if the cell is air.
    Place(Point3<i32>, BlockId),
    /// Break the block, leaving air.
    Remove(Point3<i32>),
    /// Overwrite whatever is there.
    Replace(Point3<i32>, BlockId),
}

impl BlockEdit {
    /// Chunk-relative cell the edit targets.
    pub fn position(&self) -> Point3<i32> {
        match *self {
            BlockEdit::Place(position, _)
            | BlockEdit::Remove(position)
            | BlockEdit::Replace(position, _) => position,
        }
    }
}
