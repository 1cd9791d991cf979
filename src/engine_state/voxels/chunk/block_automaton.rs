//! # Block Automaton Module
//!
//! The cellular automaton that evolves a chunk between regenerations. One tick sweeps
//! every cell X, Y, Z descending and mutates the map in place:
//!
//! - **Grass growth**: covered-by-air dirt next to grass becomes grass with probability
//!   `1 / grass_grow_prob`.
//! - **Grass death**: grass with something solid on top becomes dirt with probability
//!   `1 / grass_death_prob`.
//! - **Gravity**: a block whose definition uses gravity and has air below is removed and
//!   reported as a falling block. The automaton never spawns anything itself.
//! - **Water**: water pours into air below it and spreads into horizontal air. It never
//!   flows upward.
//!
//! Each cell's rules read its neighbors before that cell writes anything, but writes made
//! by cells visited earlier in the sweep are visible to cells visited later. Water poured
//! into a lower cell is therefore picked up again in the same tick.

use cgmath::{EuclideanSpace, Point3};

use super::{
    chunk_iteration::{ChunkSliceIterator, ScanDirection},
    voxel_map::VoxelMap,
    ChunkContext,
};
use crate::engine_state::voxels::block::{block_side::BlockSide, BlockId, OUT_OF_BOUNDS};

/// Accumulated result of a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AutomatonOutcome {
    /// Set when any cell changed; the mesh must then be rebuilt.
    pub needs_regenerate: bool,
    /// Blocks removed by gravity, as `(world position, block)`.
    ///
    /// At most one entry per position; a later removal at the same position replaces it.
    pub falling_blocks: Vec<(Point3<i32>, BlockId)>,
}

impl AutomatonOutcome {
    fn record_falling_block(&mut self, position: Point3<i32>, block: BlockId) {
        match self
            .falling_blocks
            .iter_mut()
            .find(|(existing, _)| *existing == position)
        {
            Some(entry) => entry.1 = block,
            None => self.falling_blocks.push((position, block)),
        }
    }
}

/// Runs automaton ticks for the chunk at `origin`.
pub struct BlockAutomaton<'a> {
    context: &'a ChunkContext<'a>,
    origin: Point3<i32>,
}

impl<'a> BlockAutomaton<'a> {
    /// Creates an automaton for the chunk at `origin`.
    pub fn new(context: &'a ChunkContext<'a>, origin: Point3<i32>) -> Self {
        BlockAutomaton { context, origin }
    }

    /// Sweeps the X-slice at `x`, accumulating into `outcome`.
    ///
    /// A full tick is every slice from `size_x - 1` down to `0`.
    pub fn tick_slice(
        &self,
        map: &mut VoxelMap,
        x: i32,
        rng: &mut fastrand::Rng,
        outcome: &mut AutomatonOutcome,
    ) {
        for point in ChunkSliceIterator::new(map.dimensions(), x, ScanDirection::Descending) {
            self.update_cell(map, point, rng, outcome);
        }
    }

    /// Runs one full tick.
    pub fn tick(&self, map: &mut VoxelMap, rng: &mut fastrand::Rng) -> AutomatonOutcome {
        let mut outcome = AutomatonOutcome::default();
        let size_x = map.dimensions().x;
        for step in 0..size_x {
            let x = ScanDirection::Descending.coordinate(step, size_x);
            self.tick_slice(map, x, rng, &mut outcome);
        }
        outcome
    }

    fn update_cell(
        &self,
        map: &mut VoxelMap,
        point: Point3<i32>,
        rng: &mut fastrand::Rng,
        outcome: &mut AutomatonOutcome,
    ) {
        let registry = self.context.registry;
        let world = self.context.world;
        let core = registry.core();
        let (x, y, z) = (point.x, point.y, point.z);

        let block = map.get_block_at(x, y, z);
        let def = registry.def(block);
        let top = map.get_neighbor(x, y, z, BlockSide::TOP);
        let bottom = map.get_neighbor(x, y, z, BlockSide::BOTTOM);
        let around = [
            map.get_neighbor(x, y, z, BlockSide::LEFT),
            map.get_neighbor(x, y, z, BlockSide::RIGHT),
            bottom,
            map.get_neighbor(x, y, z, BlockSide::FRONT),
            map.get_neighbor(x, y, z, BlockSide::BACK),
        ];

        if top != OUT_OF_BOUNDS
            && top == core.air
            && block == core.dirt
            && around.contains(&core.dirt_with_grass)
            && roll(rng, world.grass_grow_prob)
        {
            map.set_block_at(x, y, z, core.dirt_with_grass);
            outcome.needs_regenerate = true;
        }

        if top != OUT_OF_BOUNDS
            && top != core.air
            && block == core.dirt_with_grass
            && roll(rng, world.grass_death_prob)
        {
            map.set_block_at(x, y, z, core.dirt);
            outcome.needs_regenerate = true;
        }

        if bottom != OUT_OF_BOUNDS && bottom == core.air && def.uses_gravity {
            map.set_block_at(x, y, z, core.air);
            outcome.record_falling_block(self.origin + point.to_vec(), block);
            outcome.needs_regenerate = true;
        }

        if block == core.water {
            if bottom == core.air {
                map.set_block_at(x, y - 1, z, core.water);
                outcome.needs_regenerate = true;
            }
            for side in BlockSide::horizontal() {
                if map.get_neighbor(x, y, z, side) == core.air {
                    let offset = side.normal();
                    map.set_block_at(x + offset.x, y + offset.y, z + offset.z, core.water);
                    outcome.needs_regenerate = true;
                }
            }
        }
    }
}

/// `true` with probability `1 / denominator`.
#[inline]
fn roll(rng: &mut fastrand::Rng, denominator: i32) -> bool {
    rng.i32(0..denominator) == denominator / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        voxels::{block::block_registry::BlockRegistry, noise_field::NoiseField},
        world_context::{NoiseParams, WorldContext},
    };
    use cgmath::Vector3;

    fn world() -> WorldContext {
        WorldContext {
            chunk_size: [5, 5, 5],
            ..WorldContext::default()
        }
    }

    fn air_map(registry: &BlockRegistry) -> VoxelMap {
        VoxelMap::new(Vector3::new(5, 5, 5), registry.core().air)
    }

    #[test]
    fn water_spreads_down_and_sideways_but_not_up() {
        let world = world();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));
        let core = *registry.core();

        let mut map = air_map(&registry);
        map.set_block_at(2, 2, 2, core.water);
        let outcome = automaton.tick(&mut map, &mut fastrand::Rng::with_seed(1));

        assert!(outcome.needs_regenerate);
        assert_eq!(map.get_block_at(2, 1, 2), core.water);
        assert_eq!(map.get_block_at(1, 2, 2), core.water);
        assert_eq!(map.get_block_at(3, 2, 2), core.water);
        assert_eq!(map.get_block_at(2, 2, 1), core.water);
        assert_eq!(map.get_block_at(2, 2, 3), core.water);
        for y in 3..5 {
            for x in 0..5 {
                for z in 0..5 {
                    assert_eq!(map.get_block_at(x, y, z), core.air, "water rose to y = {y}");
                }
            }
        }
    }

    #[test]
    fn water_on_solid_ground_only_spreads_sideways() {
        let world = world();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));
        let core = *registry.core();

        let mut map = air_map(&registry);
        for x in 0..5 {
            for z in 0..5 {
                map.set_block_at(x, 0, z, core.stone);
            }
        }
        map.set_block_at(4, 1, 4, core.water);
        automaton.tick(&mut map, &mut fastrand::Rng::with_seed(1));

        assert_eq!(map.get_block_at(3, 1, 4), core.water);
        assert_eq!(map.get_block_at(4, 1, 3), core.water);
        assert_eq!(map.get_block_at(4, 2, 4), core.air);
        assert_eq!(map.count(core.stone), 25);
    }

    #[test]
    fn untouched_map_needs_no_regeneration() {
        let world = world();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));

        let mut map = air_map(&registry);
        map.set_block_at(2, 0, 2, registry.core().stone);
        let outcome = automaton.tick(&mut map, &mut fastrand::Rng::with_seed(3));
        assert_eq!(outcome, AutomatonOutcome::default());
    }

    #[test]
    fn gravity_removes_block_and_reports_world_position() {
        let world = world();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let origin = Point3::new(16, 0, -32);
        let automaton = BlockAutomaton::new(&context, origin);
        let core = *registry.core();

        let mut map = air_map(&registry);
        map.set_block_at(1, 3, 2, core.sand);
        let outcome = automaton.tick(&mut map, &mut fastrand::Rng::with_seed(5));

        assert!(outcome.needs_regenerate);
        assert_eq!(map.get_block_at(1, 3, 2), core.air);
        assert_eq!(outcome.falling_blocks, vec![(Point3::new(17, 3, -30), core.sand)]);
    }

    #[test]
    fn resting_sand_stays_put() {
        let world = world();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));
        let core = *registry.core();

        let mut map = air_map(&registry);
        // Bottom row: the neighbor below is out of bounds, which blocks the rule.
        map.set_block_at(1, 0, 1, core.sand);
        let outcome = automaton.tick(&mut map, &mut fastrand::Rng::with_seed(5));
        assert!(outcome.falling_blocks.is_empty());
        assert_eq!(map.get_block_at(1, 0, 1), core.sand);
    }

    #[test]
    fn grass_grows_at_configured_rate() {
        let world = WorldContext {
            grass_grow_prob: 10,
            ..world()
        };
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));
        let core = *registry.core();

        let mut rng = fastrand::Rng::with_seed(2024);
        let trials = 10_000;
        let mut conversions = 0;
        for _ in 0..trials {
            let mut map = air_map(&registry);
            map.set_block_at(2, 2, 2, core.dirt);
            map.set_block_at(3, 2, 2, core.dirt_with_grass);
            // Keep the grass neighbor covered by air so it cannot die.
            automaton.tick(&mut map, &mut rng);
            if map.get_block_at(2, 2, 2) == core.dirt_with_grass {
                conversions += 1;
            }
        }
        // Expected 1000, standard deviation 30.
        assert!(
            (850..=1150).contains(&conversions),
            "observed {conversions} conversions in {trials} ticks"
        );
    }

    #[test]
    fn covered_grass_dies() {
        let world = WorldContext {
            grass_death_prob: 1,
            ..world()
        };
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));
        let core = *registry.core();

        let mut map = air_map(&registry);
        map.set_block_at(2, 1, 2, core.dirt_with_grass);
        map.set_block_at(2, 2, 2, core.stone);
        automaton.tick(&mut map, &mut fastrand::Rng::with_seed(8));
        assert_eq!(map.get_block_at(2, 1, 2), core.dirt);
    }

    #[test]
    #[should_panic(expected = "invalid block id")]
    fn unknown_block_is_fatal() {
        let world = world();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&world, &registry, &noise, NoiseParams::from_context(&world));
        let automaton = BlockAutomaton::new(&context, Point3::new(0, 0, 0));

        let mut map = air_map(&registry);
        map.set_block_at(0, 0, 0, 999);
        automaton.tick(&mut map, &mut fastrand::Rng::with_seed(8));
    }
}
