use cgmath::{EuclideanSpace, Point3, Vector3};

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Height of a water surface that does not touch more water.
pub const WATER_SURFACE_HEIGHT: f32 = 0.875;
/// Width and height of one tile in a 4x4 atlas, in UV units.
pub const TILE_SIZE: f32 = 0.25;

/// One quad face of a voxel.
///
/// The quad spans `origin`, `origin + edge_u`, `origin + edge_v` and
/// `origin + edge_u + edge_v`, in that vertex order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// First corner of the quad in chunk coordinates
    pub origin: Point3<f32>,
    /// Edge from the first to the second corner
    pub edge_u: Vector3<f32>,
    /// Edge from the first to the third corner
    pub edge_v: Vector3<f32>,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the face on `block_side` of the voxel at `(i, j, k)`.
    ///
    /// # Arguments
    /// * `i`, `j`, `k` - The coordinates of the voxel in chunk space
    /// * `block_side` - Which side of the block this face represents
    /// * `lowered` - Drop the upper edge (or the whole top face) to the water surface
    ///   height. Ignored for the bottom face.
    ///
    /// # Returns
    /// A quad on the boundary of the cell `[i, i + 1] x [j, j + 1] x [k, k + 1]`.
    pub fn new(i: i32, j: i32, k: i32, block_side: BlockSide, lowered: bool) -> Self {
        let point = Vector3::new(i as f32, j as f32, k as f32);
        let right = Vector3::new(1.0, 0.0, 0.0);
        let left = Vector3::new(-1.0, 0.0, 0.0);
        let forward = Vector3::new(0.0, 0.0, 1.0);
        let back = Vector3::new(0.0, 0.0, -1.0);
        let up = if lowered {
            Vector3::new(0.0, WATER_SURFACE_HEIGHT, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let (start, edge_u, edge_v) = match block_side {
            BlockSide::BOTTOM => (point + right, left, back),
            BlockSide::TOP => (point + up, right, back),
            BlockSide::RIGHT => (point + right, back, up),
            BlockSide::LEFT => (point + back, forward, up),
            BlockSide::FRONT => (point, right, up),
            BlockSide::BACK => (point + right + back, left, up),
        };

        Face {
            origin: Point3::from_vec(start + forward),
            edge_u,
            edge_v,
            block_side,
        }
    }

    /// The four corners in emission order.
    pub fn corners(&self) -> [Point3<f32>; 4] {
        [
            self.origin,
            self.origin + self.edge_u,
            self.origin + self.edge_v,
            self.origin + self.edge_u + self.edge_v,
        ]
    }

    /// Atlas UVs for the four corners, given the face's tile index.
    ///
    /// The row is `tile / 4` and the column `row * 4 + tile`, which only lands on the
    /// expected column for tiles in the first row.
    pub fn tile_uvs(tile: u32) -> [[f32; 2]; 4] {
        let row = (tile / 4) as f32;
        let col = row * 4.0 + tile as f32;
        let u = col * TILE_SIZE;
        let v = row * TILE_SIZE;
        [
            [u, v],
            [u + TILE_SIZE, v],
            [u, v + TILE_SIZE],
            [u + TILE_SIZE, v + TILE_SIZE],
        ]
    }

    /// Triangle indices for a face whose first vertex sits at `base`.
    pub fn indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 2, base + 3, base + 2, base + 1]
    }
}
