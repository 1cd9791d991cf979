//! # Chunk Generation Module
//!
//! Builds a chunk's [`VoxelMap`] from noise. Generation runs in three passes:
//!
//! 1. **Terrain** (one X-slice at a time, ascending): every cell samples 3D fbm and is
//!    classified into air, surface, a sand/dirt band, bedrock or stone, with the odd
//!    diamond.
//! 2. **Finish**: diamond veins are stamped into the surrounding stone, then air below
//!    the water level is flooded.
//! 3. **Trees** (one X-slice at a time, descending): grassy surface cells above the
//!    water level occasionally grow an oak.
//!
//! Every write goes through the map's bounds-checked accessors, so trees and veins that
//! would cross into a neighboring chunk are clipped instead of written there.

use cgmath::Point3;

use super::{
    chunk_iteration::{ChunkSliceIterator, ScanDirection},
    voxel_map::VoxelMap,
    ChunkContext,
};

/// Normalized samples below this are carved out as air.
pub const AIR_THRESHOLD: f64 = 0.2;
/// Surface cells at or below this sample are sand, otherwise grass.
pub const BEACH_THRESHOLD: f64 = 0.475;
/// Sub-surface band cells at or below this sample are sand, otherwise dirt.
pub const SAND_BAND_THRESHOLD: f64 = 0.4;
/// Roll (out of 100) that seeds a diamond.
const DIAMOND_ROLL: i32 = 21;
/// Roll (out of 100) that grows a tree.
const TREE_ROLL: i32 = 50;
/// Widest canopy row of a tree.
const TREE_TOP_WIDTH: i32 = 4;

/// Terrain generator for the chunk at `origin`.
pub struct ChunkGenerator<'a> {
    context: &'a ChunkContext<'a>,
    origin: Point3<i32>,
}

impl<'a> ChunkGenerator<'a> {
    /// Creates a generator for the chunk whose minimum corner is `origin`.
    pub fn new(context: &'a ChunkContext<'a>, origin: Point3<i32>) -> Self {
        ChunkGenerator { context, origin }
    }

    /// A fresh all-air map of the configured chunk size.
    pub fn empty_map(&self) -> VoxelMap {
        VoxelMap::new(
            self.context.world.chunk_dimensions(),
            self.context.registry.core().air,
        )
    }

    /// Samples the normalized noise value (roughly `[0, 1]`) for a chunk-local cell.
    pub fn sample(&self, x: i32, y: i32, z: i32) -> f64 {
        let params = self.context.noise_params;
        let world = self.context.world;
        let origin = if world.use_position_as_offset {
            [
                self.origin.x as f64,
                self.origin.y as f64,
                self.origin.z as f64,
            ]
        } else {
            [0.0; 3]
        };
        let local = [x as f64, y as f64, z as f64];
        let mut coords = [0.0; 3];
        for axis in 0..3 {
            coords[axis] =
                origin[axis] / params.scale + (params.offset[axis] + local[axis] / params.scale);
        }
        self.context.noise.fbm(coords, world.fractal_level) / 1.4 + 0.5
    }

    /// Runs the terrain pass over the X-slice at `x`, reading samples from the noise field.
    ///
    /// Diamond cells seeded in this slice append their vein cells to `veins`.
    pub fn generate_map_slice(
        &self,
        map: &mut VoxelMap,
        x: i32,
        rng: &mut fastrand::Rng,
        veins: &mut Vec<Point3<i32>>,
    ) {
        self.generate_map_slice_with(map, x, rng, veins, |x, y, z| self.sample(x, y, z))
    }

    /// Same as [`ChunkGenerator::generate_map_slice`] with an explicit sample source.
    pub fn generate_map_slice_with(
        &self,
        map: &mut VoxelMap,
        x: i32,
        rng: &mut fastrand::Rng,
        veins: &mut Vec<Point3<i32>>,
        sampler: impl Fn(i32, i32, i32) -> f64,
    ) {
        let dims = map.dimensions();
        for point in ChunkSliceIterator::new(dims, x, ScanDirection::Ascending) {
            let sample = sampler(point.x, point.y, point.z);
            let block = self.classify(point, sample, dims.y, rng, veins);
            map.set_block_at(point.x, point.y, point.z, block);
        }
    }

    fn classify(
        &self,
        point: Point3<i32>,
        sample: f64,
        size_y: i32,
        rng: &mut fastrand::Rng,
        veins: &mut Vec<Point3<i32>>,
    ) -> i32 {
        let core = self.context.registry.core();
        if sample < AIR_THRESHOLD {
            return core.air;
        }

        let y = point.y;
        let heightmap = (sample * size_y as f64 + (y / size_y) as f64).round_ties_even() as i32;

        if y > heightmap {
            return core.air;
        }
        if y == heightmap {
            return if sample <= BEACH_THRESHOLD {
                core.sand
            } else {
                core.dirt_with_grass
            };
        }

        let mut block = None;
        if y == 0 || y <= rng.i32(0..2) {
            block = Some(core.bedrock);
        }
        if y >= heightmap - rng.i32(1..5) && y <= heightmap - 1 {
            block = Some(if sample <= SAND_BAND_THRESHOLD {
                core.sand
            } else {
                core.dirt
            });
        } else if block.is_none() {
            block = Some(core.stone);
            if rng.i32(0..100) == DIAMOND_ROLL {
                block = Some(core.diamond);
                let reach_x = rng.i32(1..3);
                for a in 0..reach_x {
                    let reach_y = rng.i32(1..3);
                    for b in 0..reach_y {
                        if a != 0 || b != 0 {
                            veins.push(Point3::new(point.x + a, y + b, point.z + a + b));
                        }
                    }
                }
            }
        }
        block.unwrap_or(core.stone)
    }

    /// Stamps diamond veins into stone, then floods air below the water level.
    pub fn finish_map(&self, map: &mut VoxelMap, veins: &[Point3<i32>]) {
        let core = self.context.registry.core();
        for cell in veins {
            if map.get_block_at(cell.x, cell.y, cell.z) == core.stone {
                map.set_block_at(cell.x, cell.y, cell.z, core.diamond);
            }
        }

        let dims = map.dimensions();
        let water_level = self.context.world.water_level;
        for x in 0..dims.x {
            let mut y = 0;
            while (y as f32) < water_level && y < dims.y {
                for z in 0..dims.z {
                    if map.is_air_block(x, y, z, core.air) && map.index_exists(x, y, z) {
                        map.set_block_at(x, y, z, core.water);
                    }
                }
                y += 1;
            }
        }
    }

    /// Runs the tree pass over the X-slice at `x`.
    pub fn generate_trees_slice(&self, map: &mut VoxelMap, x: i32, rng: &mut fastrand::Rng) {
        let core = self.context.registry.core();
        let water_level = self.context.world.water_level;
        let dims = map.dimensions();
        for point in ChunkSliceIterator::new(dims, x, ScanDirection::Descending) {
            if (point.y as f32) <= water_level {
                continue;
            }
            if map.get_block_at(point.x, point.y, point.z) != core.dirt_with_grass {
                continue;
            }
            if rng.i32(0..100) == TREE_ROLL {
                let trunk_height = rng.i32(4..8);
                self.grow_tree(map, point, trunk_height);
            }
        }
    }

    /// Places an oak rooted on top of `ground`.
    ///
    /// The trunk fills `1..trunk_height` above the ground. The canopy starts halfway up
    /// and narrows toward the top; its center column is left to the trunk except on the
    /// topmost row, which caps the tree with a leaf.
    pub fn grow_tree(&self, map: &mut VoxelMap, ground: Point3<i32>, trunk_height: i32) {
        let core = self.context.registry.core();
        let top_start = 1 + trunk_height / 2;
        let (x, y, z) = (ground.x, ground.y, ground.z);

        for a in 1..=trunk_height {
            if a != trunk_height {
                map.set_block_at(x, y + a, z, core.oak_bark);
            }
            if a >= top_start {
                let reach = (TREE_TOP_WIDTH - (a - top_start).abs()) / 2;
                for b in -reach..=reach {
                    for c in -reach..=reach {
                        if b == 0 && c == 0 && a != trunk_height {
                            continue;
                        }
                        map.set_block_at(x + b, y + a, z + c, core.oak_leaves);
                    }
                }
            }
        }
    }

    /// Generates the terrain in one go: every map slice, then the finishing pass.
    pub fn generate_map(&self, rng: &mut fastrand::Rng) -> VoxelMap {
        let mut map = self.empty_map();
        let mut veins = Vec::new();
        for x in 0..map.dimensions().x {
            self.generate_map_slice(&mut map, x, rng, &mut veins);
        }
        self.finish_map(&mut map, &veins);
        map
    }

    /// Runs every tree slice, X descending.
    pub fn generate_trees(&self, map: &mut VoxelMap, rng: &mut fastrand::Rng) {
        for step in 0..map.dimensions().x {
            let x = ScanDirection::Descending.coordinate(step, map.dimensions().x);
            self.generate_trees_slice(map, x, rng);
        }
    }
}
