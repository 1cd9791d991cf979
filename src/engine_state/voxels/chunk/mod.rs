//! # Chunk Module
//!
//! This module provides the `Chunk` struct: one fixed-size, grid-aligned cuboid of the
//! world together with everything needed to generate, simulate and mesh it.
//!
//! ## Submodules
//! - `voxel_map`: the dense block grid
//! - `chunk_generation`: noise terrain, veins, water and trees
//! - `block_automaton`: grass, gravity and water rules
//! - `chunk_iteration`: the scan orders every pass relies on
//!
//! ## Work Sequences
//!
//! A chunk never runs work on its own. Callers request a [`PipelineKind`] with
//! [`Chunk::request`]; the scheduler then calls [`Chunk::advance`] once per turn, and each
//! call performs one bounded slice of the running sequence. Requests made while a
//! sequence is running wait in the chunk's queue, so two sequences never interleave
//! writes to the same map.
//!
//! The in-flight counter counts requested sequences that have not finished yet,
//! queued or running. A chunk is only deactivated while that counter is zero.

use std::collections::VecDeque;

use cgmath::{Point3, Vector3};
use log::debug;

use crate::engine_state::{
    rendering::meshing::ChunkMesh,
    task_management::task::{ChunkPipeline, PipelineKind, PipelineReport, PipelineStage},
    world_context::{NoiseParams, WorldContext},
};

use super::{
    block::{block_registry::BlockRegistry, BlockId},
    noise_field::NoiseField,
};
use voxel_map::VoxelMap;

pub mod block_automaton;
pub mod chunk_generation;
pub mod chunk_iteration;
pub mod voxel_map;

/// Everything a chunk's passes read but never own.
#[derive(Clone, Copy)]
pub struct ChunkContext<'a> {
    /// Session configuration
    pub world: &'a WorldContext,
    /// Block definitions
    pub registry: &'a BlockRegistry,
    /// Shared noise source
    pub noise: &'a NoiseField,
    /// Session noise scale and offset
    pub noise_params: NoiseParams,
}

impl<'a> ChunkContext<'a> {
    /// Bundles the shared read-only state.
    pub fn new(
        world: &'a WorldContext,
        registry: &'a BlockRegistry,
        noise: &'a NoiseField,
        noise_params: NoiseParams,
    ) -> Self {
        ChunkContext {
            world,
            registry,
            noise,
            noise_params,
        }
    }
}

/// One chunk of terrain.
pub struct Chunk {
    /// World-space minimum corner; X and Z are multiples of the chunk size, Y is 0.
    origin: Point3<i32>,
    map: VoxelMap,
    air: BlockId,
    rng: fastrand::Rng,
    mesh: Option<ChunkMesh>,
    mesh_revision: u64,
    pending_regeneration: bool,
    in_flight: u32,
    active: bool,
    running: Option<ChunkPipeline>,
    queued: VecDeque<PipelineKind>,
}

impl Chunk {
    /// Creates an all-air, active chunk at `origin`. Nothing is generated until a
    /// [`PipelineKind::Generate`] sequence is requested and run.
    ///
    /// # Arguments
    /// * `origin` - The grid-aligned world position of the chunk's minimum corner
    /// * `context` - Session configuration and registry
    pub fn new(origin: Point3<i32>, context: &ChunkContext) -> Self {
        let air = context.registry.core().air;
        Chunk {
            origin,
            map: VoxelMap::new(context.world.chunk_dimensions(), air),
            air,
            rng: fastrand::Rng::with_seed(Self::chunk_seed(context.world.seed, origin)),
            mesh: None,
            mesh_revision: 0,
            pending_regeneration: false,
            in_flight: 0,
            active: true,
            running: None,
            queued: VecDeque::new(),
        }
    }

    /// Seed of a chunk's random stream, derived from the session seed and the origin.
    pub fn chunk_seed(seed: u32, origin: Point3<i32>) -> u64 {
        let x = (origin.x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let z = (origin.z as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        ((seed as u64) << 32) ^ x ^ z.rotate_left(31)
    }

    /// Grid origin of the chunk in world space.
    pub fn origin(&self) -> Point3<i32> {
        self.origin
    }

    /// Extent of the voxel grid.
    pub fn dimensions(&self) -> Vector3<i32> {
        self.map.dimensions()
    }

    /// The chunk's voxel grid.
    pub fn map(&self) -> &VoxelMap {
        &self.map
    }

    /// The map and the chunk's random stream, borrowed together for a pass.
    pub(crate) fn map_and_rng(&mut self) -> (&mut VoxelMap, &mut fastrand::Rng) {
        (&mut self.map, &mut self.rng)
    }

    /// Whether the world-space X/Z of `position` falls inside this chunk's footprint.
    pub fn contains_column(&self, x: f32, z: f32) -> bool {
        let dims = self.dimensions();
        x >= self.origin.x as f32
            && x < (self.origin.x + dims.x) as f32
            && z >= self.origin.z as f32
            && z < (self.origin.z + dims.z) as f32
    }

    /// Gets the block at chunk-local `(x, y, z)`, or the out-of-bounds sentinel.
    pub fn get_block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.map.get_block_at(x, y, z)
    }

    /// Whether the chunk-local cell lies inside the grid.
    pub fn index_exists(&self, x: i32, y: i32, z: i32) -> bool {
        self.map.index_exists(x, y, z)
    }

    /// Whether the cell is air or outside the chunk.
    pub fn is_air_block(&self, x: i32, y: i32, z: i32) -> bool {
        self.map.is_air_block(x, y, z, self.air)
    }

    /// Places `block` only if the cell is currently air.
    ///
    /// # Returns
    /// `true` if the block was placed.
    pub fn insert_block_at(&mut self, point: Point3<i32>, block: BlockId, regenerate: bool) -> bool {
        if self.map.get_block(point) != self.air {
            return false;
        }
        self.set_block_at(point, block, regenerate)
    }

    /// Clears the cell to air.
    ///
    /// # Returns
    /// The block that was removed, or `None` if the cell is outside the chunk or already air.
    pub fn remove_block_at(&mut self, point: Point3<i32>, regenerate: bool) -> Option<BlockId> {
        let previous = self.map.get_block(point);
        if !self.map.index_exists(point.x, point.y, point.z) || previous == self.air {
            return None;
        }
        self.set_block_at(point, self.air, regenerate);
        Some(previous)
    }

    /// Writes `block` unconditionally.
    ///
    /// # Returns
    /// `false` if the cell is outside the chunk.
    pub fn set_block_at(&mut self, point: Point3<i32>, block: BlockId, regenerate: bool) -> bool {
        let written = self.map.set_block_at(point.x, point.y, point.z, block);
        if written && regenerate {
            self.pending_regeneration = true;
        }
        written
    }

    /// Returns and clears the flag set by edits that asked for regeneration.
    pub fn take_pending_regeneration(&mut self) -> bool {
        std::mem::take(&mut self.pending_regeneration)
    }

    /// Whether the chunk is inside the activation radius.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the chunk active or inactive.
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            debug!(
                "Chunk {:?} {}",
                self.origin,
                if active { "activated" } else { "deactivated" }
            );
        }
        self.active = active;
    }

    /// Sequences requested and not yet finished.
    pub fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// No sequence is queued or running.
    pub fn is_idle(&self) -> bool {
        self.in_flight == 0
    }

    /// Whether a sequence is running or queued.
    pub fn has_work(&self) -> bool {
        self.running.is_some() || !self.queued.is_empty()
    }

    /// Whether a sequence of `kind` is waiting to start.
    pub fn has_queued(&self, kind: PipelineKind) -> bool {
        self.queued.contains(&kind)
    }

    /// Stage of the running sequence. Without one, [`PipelineStage::Ready`] once a mesh
    /// exists and [`PipelineStage::Idle`] before that.
    pub fn stage(&self) -> PipelineStage {
        match &self.running {
            Some(pipeline) => pipeline.stage(),
            None if self.mesh.is_some() => PipelineStage::Ready,
            None => PipelineStage::Idle,
        }
    }

    /// Queues a sequence and counts it as in flight.
    pub fn request(&mut self, kind: PipelineKind) {
        self.in_flight += 1;
        self.queued.push_back(kind);
    }

    /// Runs one slice of the current sequence, starting the next queued one if needed.
    ///
    /// # Returns
    /// A report when a sequence finished with this slice.
    pub fn advance(&mut self, context: &ChunkContext) -> Option<PipelineReport> {
        if self.running.is_none() {
            let kind = self.queued.pop_front()?;
            debug!("Chunk {:?} starting {:?}", self.origin, kind);
            self.running = Some(ChunkPipeline::new(kind));
        }

        let mut pipeline = self.running.take()?;
        match pipeline.advance(self, context) {
            Some(report) => {
                self.in_flight -= 1;
                debug!("Chunk {:?} finished {:?}", self.origin, report.kind);
                Some(report)
            }
            None => {
                self.running = Some(pipeline);
                None
            }
        }
    }

    /// The installed mesh, if one was built.
    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh.as_ref()
    }

    /// Number of meshes installed so far.
    pub fn mesh_revision(&self) -> u64 {
        self.mesh_revision
    }

    /// Swaps in a freshly built mesh.
    pub(crate) fn install_mesh(&mut self, mesh: ChunkMesh) -> u64 {
        self.mesh = Some(mesh);
        self.mesh_revision += 1;
        self.mesh_revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        world: WorldContext,
        registry: BlockRegistry,
        noise: NoiseField,
    }

    impl Fixture {
        fn new() -> Self {
            let world = WorldContext {
                chunk_size: [4, 8, 4],
                water_level: 2.0,
                ..WorldContext::default()
            };
            Fixture {
                noise: NoiseField::new(world.seed),
                registry: BlockRegistry::with_default_blocks().unwrap(),
                world,
            }
        }

        fn context(&self) -> ChunkContext<'_> {
            ChunkContext::new(
                &self.world,
                &self.registry,
                &self.noise,
                NoiseParams::from_context(&self.world),
            )
        }
    }

    fn run_to_completion(chunk: &mut Chunk, context: &ChunkContext) -> Vec<PipelineReport> {
        let mut reports = Vec::new();
        let mut guard = 0;
        while chunk.has_work() {
            if let Some(report) = chunk.advance(context) {
                reports.push(report);
            }
            guard += 1;
            assert!(guard < 1000, "pipeline did not finish");
        }
        reports
    }

    #[test]
    fn insert_only_fills_air() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let core = *fixture.registry.core();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &context);

        assert!(chunk.insert_block_at(Point3::new(1, 1, 1), core.stone, false));
        assert!(!chunk.insert_block_at(Point3::new(1, 1, 1), core.dirt, false));
        assert_eq!(chunk.get_block_at(1, 1, 1), core.stone);
        assert!(!chunk.take_pending_regeneration());
    }

    #[test]
    fn remove_reports_previous_block() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let core = *fixture.registry.core();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &context);

        chunk.set_block_at(Point3::new(0, 0, 0), core.sand, true);
        assert_eq!(chunk.remove_block_at(Point3::new(0, 0, 0), true), Some(core.sand));
        assert_eq!(chunk.remove_block_at(Point3::new(0, 0, 0), true), None);
        assert_eq!(chunk.remove_block_at(Point3::new(9, 0, 0), true), None);
        assert!(chunk.is_air_block(0, 0, 0));
        assert!(chunk.take_pending_regeneration());
        assert!(!chunk.take_pending_regeneration());
    }

    #[test]
    fn generation_runs_in_slices_and_installs_mesh() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &context);
        assert_eq!(chunk.stage(), PipelineStage::Idle);

        chunk.request(PipelineKind::Generate);
        assert_eq!(chunk.in_flight(), 1);
        assert!(chunk.advance(&context).is_none());
        assert_eq!(chunk.stage(), PipelineStage::GeneratingMap);

        let reports = run_to_completion(&mut chunk, &context);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].kind, PipelineKind::Generate);
        assert_eq!(reports[0].mesh_revision, Some(1));
        assert!(chunk.is_idle());
        assert_eq!(chunk.stage(), PipelineStage::Ready);
        assert!(chunk.mesh().is_some());
    }

    #[test]
    fn requests_are_serialized() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let mut chunk = Chunk::new(Point3::new(4, 0, 0), &context);

        chunk.request(PipelineKind::Generate);
        chunk.request(PipelineKind::Refresh);
        assert_eq!(chunk.in_flight(), 2);
        assert!(chunk.has_queued(PipelineKind::Refresh));

        let reports = run_to_completion(&mut chunk, &context);
        let kinds: Vec<_> = reports.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![PipelineKind::Generate, PipelineKind::Refresh]);
        assert_eq!(chunk.in_flight(), 0);
    }

    #[test]
    fn chunk_seed_depends_on_origin_and_seed() {
        let a = Chunk::chunk_seed(0, Point3::new(0, 0, 16));
        let b = Chunk::chunk_seed(0, Point3::new(16, 0, 0));
        let c = Chunk::chunk_seed(1, Point3::new(0, 0, 16));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Chunk::chunk_seed(0, Point3::new(0, 0, 16)));
    }

    #[test]
    fn footprint_contains_its_columns() {
        let fixture = Fixture::new();
        let context = fixture.context();
        let chunk = Chunk::new(Point3::new(-4, 0, 8), &context);
        assert!(chunk.contains_column(-4.0, 8.0));
        assert!(chunk.contains_column(-0.5, 11.9));
        assert!(!chunk.contains_column(0.0, 8.0));
        assert!(!chunk.contains_column(-4.0, 12.0));
    }
}
