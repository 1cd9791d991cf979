//! # Clouds Module
//!
//! A flat cloud layer laid over every terrain chunk. Each cloud chunk is a 2D coverage
//! mask, one bit per column, drawn as one-block-thick slabs at the configured clouds
//! height. Cloud chunks are generated and meshed once when created and never simulated.
//!
//! Coverage blends two fbm samples with swapped axes:
//! `lerp(fbm2(x, z, octaves), fbm2(z, x, 3), 0.5)`. A column is clear when the blend
//! falls below `1 - clouds_coverage`.

use bitvec::prelude::BitVec;
use cgmath::{Point3, Vector2};

use crate::engine_state::{
    rendering::meshing::Face,
    voxels::{block::block_side::BlockSide, chunk::ChunkContext},
};

/// Octaves of the second, axis-swapped coverage sample.
const DETAIL_OCTAVES: u32 = 3;

/// Geometry of a cloud chunk: a single triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudsMesh {
    /// Vertex positions relative to the cloud chunk's origin
    pub positions: Vec<Point3<f32>>,
    /// Triangle list into `positions`
    pub indices: Vec<u32>,
}

impl CloudsMesh {
    fn push_face(&mut self, face: &Face) {
        let base = self.positions.len() as u32;
        self.positions.extend(face.corners());
        self.indices.extend(Face::indices(base));
    }

    /// Number of quads in the mesh.
    pub fn face_count(&self) -> usize {
        self.positions.len() / 4
    }
}

/// The cloud layer above one terrain chunk.
#[derive(Debug, Clone)]
pub struct CloudsChunk {
    origin: Point3<i32>,
    dimensions: Vector2<i32>,
    covered: BitVec,
    mesh: CloudsMesh,
}

impl CloudsChunk {
    /// Generates and meshes the clouds over the terrain chunk at `terrain_origin`.
    pub fn new(terrain_origin: Point3<i32>, context: &ChunkContext) -> Self {
        let world = context.world;
        let origin = Point3::new(terrain_origin.x, world.clouds_height, terrain_origin.z);
        let dimensions = Vector2::new(world.chunk_size[0], world.chunk_size[2]);

        let params = context.noise_params;
        let (origin_x, origin_z) = if world.use_position_as_offset {
            (origin.x as f64, origin.z as f64)
        } else {
            (0.0, 0.0)
        };
        let threshold = 1.0 - world.clouds_coverage as f64;

        let mut covered = BitVec::repeat(false, (dimensions.x * dimensions.y) as usize);
        for x in 0..dimensions.x {
            for z in 0..dimensions.y {
                let x_coord = origin_x / params.scale + (params.offset[0] + x as f64 / params.scale);
                let z_coord = origin_z / params.scale + (params.offset[2] + z as f64 / params.scale);

                let a = context.noise.fbm2([x_coord, z_coord], world.fractal_level) / 1.4 + 0.5;
                let b = context.noise.fbm2([z_coord, x_coord], DETAIL_OCTAVES) / 1.4 + 0.5;
                let blend = a + (b - a) * 0.5;

                covered.set((x + z * dimensions.x) as usize, blend >= threshold);
            }
        }

        Self::from_mask(origin, dimensions, covered)
    }

    /// Builds a cloud chunk from an explicit coverage mask, indexed `x + z * size_x`.
    ///
    /// # Panics
    /// Panics if the mask length does not match the extent.
    pub fn from_mask(origin: Point3<i32>, dimensions: Vector2<i32>, covered: BitVec) -> Self {
        assert_eq!(
            covered.len(),
            (dimensions.x * dimensions.y) as usize,
            "cloud mask does not match a {}x{} chunk",
            dimensions.x,
            dimensions.y
        );
        let mut chunk = CloudsChunk {
            origin,
            dimensions,
            covered,
            mesh: CloudsMesh::default(),
        };
        chunk.mesh = chunk.build_mesh();
        chunk
    }

    /// Origin of the chunk the clouds sit over.
    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    /// The cloud quads.
    pub fn mesh(&self) -> &CloudsMesh {
        &self.mesh
    }

    /// Whether the column at `(x, z)` holds cloud. Columns outside the chunk are clear.
    pub fn is_covered(&self, x: i32, z: i32) -> bool {
        x >= 0
            && x < self.dimensions.x
            && z >= 0
            && z < self.dimensions.y
            && self.covered[(x + z * self.dimensions.x) as usize]
    }

    /// Number of covered columns.
    pub fn coverage(&self) -> usize {
        self.covered.count_ones()
    }

    fn build_mesh(&self) -> CloudsMesh {
        let mut mesh = CloudsMesh::default();
        for x in 0..self.dimensions.x {
            for z in 0..self.dimensions.y {
                if !self.is_covered(x, z) {
                    continue;
                }
                mesh.push_face(&Face::new(x, 0, z, BlockSide::BOTTOM, false));
                mesh.push_face(&Face::new(x, 0, z, BlockSide::TOP, false));
                for side in BlockSide::horizontal() {
                    let offset = side.normal();
                    if !self.is_covered(x + offset.x, z + offset.z) {
                        mesh.push_face(&Face::new(x, 0, z, side, false));
                    }
                }
            }
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        voxels::{block::block_registry::BlockRegistry, noise_field::NoiseField},
        world_context::{NoiseParams, WorldContext},
    };

    #[test]
    fn single_cloud_is_a_full_box() {
        let mut mask = BitVec::repeat(false, 9);
        mask.set(4, true);
        let clouds = CloudsChunk::from_mask(Point3::new(0, 64, 0), Vector2::new(3, 3), mask);
        assert_eq!(clouds.mesh().face_count(), 6);
        assert_eq!(clouds.mesh().indices.len(), 36);
    }

    #[test]
    fn touching_clouds_share_no_side_faces() {
        let mask = BitVec::repeat(true, 4);
        let clouds = CloudsChunk::from_mask(Point3::new(0, 64, 0), Vector2::new(2, 2), mask);
        // Four tops, four bottoms, two outer sides per column.
        assert_eq!(clouds.mesh().face_count(), 4 * 2 + 4 * 2);
    }

    #[test]
    fn coverage_extremes() {
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        for (coverage, expect_full) in [(0.0, false), (1.0, true)] {
            let world = WorldContext {
                chunk_size: [8, 8, 8],
                clouds_coverage: coverage,
                ..WorldContext::default()
            };
            let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
            let clouds = CloudsChunk::new(Point3::new(8, 0, -16), &context);
            assert_eq!(clouds.origin(), Point3::new(8, world.clouds_height, -16));
            if expect_full {
                assert_eq!(clouds.coverage(), 64);
            } else {
                assert_eq!(clouds.coverage(), 0);
            }
        }
    }
}
