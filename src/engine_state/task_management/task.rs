//! # Chunk Pipelines
//!
//! The explicit state machine that replaces long-running chunk work. A pipeline is one
//! requested sequence of stages for one chunk; every call to [`ChunkPipeline::advance`]
//! performs exactly one bounded slice and then returns control to the scheduler.
//!
//! ## Sequences
//! - `Generate`: GeneratingMap → GeneratingTrees → ComputingLight → BuildingMesh → Ready
//! - `Refresh`: RunningAutomaton → (ComputingLight → BuildingMesh, if anything changed) → Ready
//! - `Remesh`: ComputingLight → BuildingMesh → Ready
//!
//! ## Slices
//! - GeneratingMap, GeneratingTrees, RunningAutomaton: one X-slice of the chunk
//! - ComputingLight, BuildingMesh: the whole stage

use cgmath::Point3;
use log::trace;

use crate::engine_state::{
    rendering::{lighting::Lighting, meshing::MeshBuilder},
    voxels::{
        block::BlockId,
        chunk::{
            block_automaton::{AutomatonOutcome, BlockAutomaton},
            chunk_generation::ChunkGenerator,
            chunk_iteration::ScanDirection,
            Chunk, ChunkContext,
        },
    },
};

/// A sequence a chunk can be asked to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Generate the terrain from noise, then mesh it.
    Generate,
    /// Run one automaton tick, remeshing if it changed anything.
    Refresh,
    /// Rebuild the mesh after edits.
    Remesh,
}

/// Where a chunk's work currently stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    /// No sequence running
    Idle,
    /// Filling the voxel map from noise, one X-slice per turn
    GeneratingMap,
    /// Planting trees, one X-slice per turn
    GeneratingTrees,
    /// Lighting pass
    ComputingLight,
    /// Stepping the block automaton, one X-slice per turn
    RunningAutomaton,
    /// Rebuilding the mesh
    BuildingMesh,
    /// Sequence finished
    Ready,
}

/// What a finished sequence produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    /// Chunk the sequence ran on
    pub origin: Point3<i32>,
    /// Which sequence finished
    pub kind: PipelineKind,
    /// Blocks the automaton removed, as `(world position, block)`
    pub falling_blocks: Vec<(Point3<i32>, BlockId)>,
    /// Revision of the mesh installed by this sequence, if it built one
    pub mesh_revision: Option<u64>,
}

/// One running sequence.
#[derive(Debug)]
pub struct ChunkPipeline {
    kind: PipelineKind,
    stage: PipelineStage,
    cursor: i32,
    veins: Vec<Point3<i32>>,
    outcome: AutomatonOutcome,
    lighting: Lighting,
    mesh_revision: Option<u64>,
}

impl ChunkPipeline {
    /// Creates a pipeline positioned at the first stage of `kind`.
    pub fn new(kind: PipelineKind) -> Self {
        let stage = match kind {
            PipelineKind::Generate => PipelineStage::GeneratingMap,
            PipelineKind::Refresh => PipelineStage::RunningAutomaton,
            PipelineKind::Remesh => PipelineStage::ComputingLight,
        };
        ChunkPipeline {
            kind,
            stage,
            cursor: 0,
            veins: Vec::new(),
            outcome: AutomatonOutcome::default(),
            lighting: Lighting,
            mesh_revision: None,
        }
    }

    /// Stage the pipeline will run next.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Performs one slice of work on `chunk`.
    ///
    /// # Returns
    /// `Some(report)` once the sequence reaches [`PipelineStage::Ready`].
    pub fn advance(&mut self, chunk: &mut Chunk, context: &ChunkContext) -> Option<PipelineReport> {
        let origin = chunk.origin();
        let size_x = chunk.dimensions().x;
        trace!("Chunk {:?} {:?} slice {}", origin, self.stage, self.cursor);

        match self.stage {
            PipelineStage::GeneratingMap => {
                let generator = ChunkGenerator::new(context, origin);
                let (map, rng) = chunk.map_and_rng();
                generator.generate_map_slice(map, self.cursor, rng, &mut self.veins);
                self.cursor += 1;
                if self.cursor >= size_x {
                    generator.finish_map(map, &self.veins);
                    self.veins.clear();
                    self.next_stage(PipelineStage::GeneratingTrees);
                }
            }
            PipelineStage::GeneratingTrees => {
                let generator = ChunkGenerator::new(context, origin);
                let (map, rng) = chunk.map_and_rng();
                let x = ScanDirection::Descending.coordinate(self.cursor, size_x);
                generator.generate_trees_slice(map, x, rng);
                self.cursor += 1;
                if self.cursor >= size_x {
                    self.next_stage(PipelineStage::ComputingLight);
                }
            }
            PipelineStage::RunningAutomaton => {
                let automaton = BlockAutomaton::new(context, origin);
                let (map, rng) = chunk.map_and_rng();
                let x = ScanDirection::Descending.coordinate(self.cursor, size_x);
                automaton.tick_slice(map, x, rng, &mut self.outcome);
                self.cursor += 1;
                if self.cursor >= size_x {
                    if self.outcome.needs_regenerate {
                        self.next_stage(PipelineStage::ComputingLight);
                    } else {
                        self.next_stage(PipelineStage::Ready);
                    }
                }
            }
            PipelineStage::ComputingLight => {
                self.lighting = Lighting::compute(chunk.map());
                self.next_stage(PipelineStage::BuildingMesh);
            }
            PipelineStage::BuildingMesh => {
                let mesh = MeshBuilder::new(context.registry).build_lit(chunk.map(), &self.lighting);
                self.mesh_revision = Some(chunk.install_mesh(mesh));
                self.next_stage(PipelineStage::Ready);
            }
            PipelineStage::Idle | PipelineStage::Ready => {}
        }

        if self.stage != PipelineStage::Ready {
            return None;
        }
        Some(PipelineReport {
            origin,
            kind: self.kind,
            falling_blocks: std::mem::take(&mut self.outcome.falling_blocks),
            mesh_revision: self.mesh_revision,
        })
    }

    fn next_stage(&mut self, stage: PipelineStage) {
        self.stage = stage;
        self.cursor = 0;
    }
}
