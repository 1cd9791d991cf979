//! Mesh generation for voxel chunks.
//!
//! [`MeshBuilder`] turns a [`VoxelMap`] into a [`ChunkMesh`] with per-face culling:
//!
//! 1. Every non-air voxel is visited X, Y, Z ascending.
//! 2. Its six faces are tested in the order bottom, top, right, left, front, back.
//! 3. A face is kept when the neighbor on that side is air, lies outside the chunk, or is
//!    a *different* transparent block. Two identical blocks never show a face to each
//!    other, so stacked water or glass has no internal seams.
//! 4. Kept faces go into the submesh of the block's material.
//!
//! Water gets a lowered surface: its top face, and any side face, drops to
//! [`WATER_SURFACE_HEIGHT`] when the neighbor on that side is inside the chunk and is
//! not water.
//!
//! # Performance Considerations
//! - Meshes are rebuilt wholesale; nothing is patched incrementally
//! - Neighbor lookups go through the map's bounds-checked accessors

use log::trace;

mod mesh;

pub use mesh::*;

use crate::engine_state::{
    rendering::lighting::Lighting,
    voxels::{
        block::{block_registry::BlockRegistry, block_side::BlockSide, BlockId, OUT_OF_BOUNDS},
        chunk::{
            chunk_iteration::{ChunkScanIterator, ScanDirection},
            voxel_map::VoxelMap,
        },
    },
};

/// Builds chunk meshes against a block registry.
#[derive(Clone, Copy)]
pub struct MeshBuilder<'a> {
    registry: &'a BlockRegistry,
}

impl<'a> MeshBuilder<'a> {
    /// Creates a builder that resolves blocks through `registry`.
    pub fn new(registry: &'a BlockRegistry) -> Self {
        MeshBuilder { registry }
    }

    /// Builds the mesh of `map`, running the light pass first.
    pub fn build(&self, map: &VoxelMap) -> ChunkMesh {
        self.build_lit(map, &Lighting::compute(map))
    }

    /// Builds the mesh of `map` with precomputed lighting.
    ///
    /// # Panics
    /// Panics if the map holds an id the registry does not know.
    pub fn build_lit(&self, map: &VoxelMap, lighting: &Lighting) -> ChunkMesh {
        let air = self.registry.core().air;
        let mut mesh = ChunkMesh::new();
        for point in ChunkScanIterator::new(map.dimensions(), ScanDirection::Ascending) {
            let block = map.get_block(point);
            if block == air {
                continue;
            }
            self.draw_block(&mut mesh, map, lighting, point.x, point.y, point.z, block);
        }
        trace!(
            "Built mesh with {} vertices in {} submeshes",
            mesh.vertex_count(),
            mesh.submeshes.len()
        );
        mesh
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_block(
        &self,
        mesh: &mut ChunkMesh,
        map: &VoxelMap,
        lighting: &Lighting,
        x: i32,
        y: i32,
        z: i32,
        block: BlockId,
    ) {
        let def = self.registry.def(block);
        let water = self.registry.core().water;

        for side in BlockSide::all() {
            let neighbor = map.get_neighbor(x, y, z, side);
            if !self.face_visible(block, neighbor) {
                continue;
            }
            let lowered = side != BlockSide::BOTTOM
                && block == water
                && neighbor != OUT_OF_BOUNDS
                && neighbor != water;
            let face = Face::new(x, y, z, side, lowered);
            mesh.push_face(
                &face,
                def.material_index,
                def.tile_for(side),
                lighting.face_color(x, y, z, side),
            );
        }
    }

    fn face_visible(&self, block: BlockId, neighbor: BlockId) -> bool {
        if neighbor == OUT_OF_BOUNDS || neighbor == self.registry.core().air {
            return true;
        }
        self.registry.def(neighbor).is_transparent && neighbor != block
    }
}
