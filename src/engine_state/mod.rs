//! # Engine State Module
//!
//! The core module that owns a running world and keeps it streamed around the viewer.
//!
//! ## Key Components
//!
//! * `ChunkStreamer` - The main state container: world, registry, configuration, scheduler
//! * `camera_state` - Viewer position and movement
//! * `events` - Requests exchanged with physics, particles and input handling
//! * `rendering` - Mesh construction and the lighting slot
//! * `task_management` - Per-chunk pipelines and the round-robin scheduler
//! * `voxels` - Block registry, noise, chunks, clouds and the world map
//! * `world_context` - Session configuration
//!
//! ## Frame Lifecycle
//!
//! Every call to [`ChunkStreamer::process`]:
//! 1. Activates chunks within the FOV radius of the viewer and deactivates idle ones
//!    outside it
//! 2. Turns edits that asked for regeneration into remesh requests
//! 3. Queues an automaton refresh on active idle chunks once per update interval
//! 4. Creates chunks for empty grid cells inside the FOV window
//! 5. Runs one scheduling round and converts finished sequences into [`WorldEvent`]s

use cgmath::{EuclideanSpace, Point3, Vector3};
use log::{debug, info, warn};
use web_time::Duration;

use camera_state::{ViewerState, ViewerUpdates};
use events::{BlockEdit, WorldEvent};
use task_management::{
    task::{PipelineKind, PipelineReport},
    ChunkScheduler,
};
use voxels::{
    block::{block_registry::BlockRegistry, BlockId},
    chunk::{Chunk, ChunkContext},
    clouds::CloudsChunk,
    noise_field::NoiseField,
    world::World,
};
use world_context::{NoiseParams, WorldContext};

pub mod camera_state;
pub mod events;
pub mod rendering;
pub mod task_management;
pub mod voxels;
pub mod world_context;

/// Read-only state every chunk pass borrows.
struct WorldResources {
    context: WorldContext,
    registry: BlockRegistry,
    noise: NoiseField,
    noise_params: NoiseParams,
}

impl WorldResources {
    fn chunk_context(&self) -> ChunkContext<'_> {
        ChunkContext::new(&self.context, &self.registry, &self.noise, self.noise_params)
    }
}

/// Counters describing the streamer at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamerStats {
    /// Chunks currently loaded
    pub chunks: usize,
    /// Loaded chunks inside the activation radius
    pub active: usize,
    /// Loaded chunks waiting in the eviction cache
    pub inactive: usize,
    /// Chunks with an installed mesh
    pub meshed: usize,
    /// Chunks with work queued in the scheduler
    pub scheduled: usize,
}

/// Keeps a world generated, simulated and meshed around a moving viewer.
pub struct ChunkStreamer {
    resources: WorldResources,
    world: World,
    scheduler: ChunkScheduler,
    viewer: ViewerState,
    /// Time since the last automaton refresh
    update_accumulator: Duration,
    rng: fastrand::Rng,
    events: Vec<WorldEvent>,
}

impl ChunkStreamer {
    /// Creates a streamer and queues generation of the initial population.
    ///
    /// # Arguments
    /// * `context` - Validated session configuration
    /// * `registry` - Block definitions
    /// * `viewer_position` - Where the viewer starts
    ///
    /// # Returns
    /// A streamer whose chunks cover the FOV window scaled by `initial_fov_multiplier`.
    /// Nothing is generated until [`ChunkStreamer::process`] runs.
    pub fn new(context: WorldContext, registry: BlockRegistry, viewer_position: Point3<f32>) -> Self {
        let mut rng = fastrand::Rng::with_seed(context.seed as u64);
        let noise_params = if context.randomize_noise_on_start {
            let params = NoiseParams::randomized(&mut rng);
            info!(
                "Randomized noise: scale {}, offset {:?}",
                params.scale, params.offset
            );
            params
        } else {
            NoiseParams::from_context(&context)
        };

        let chunk_dimensions = context.chunk_dimensions();
        let mut streamer = ChunkStreamer {
            world: World::new(chunk_dimensions, context.max_inactive_chunks),
            scheduler: ChunkScheduler::new(context.slices_per_round),
            viewer: ViewerState::new(viewer_position, chunk_dimensions),
            update_accumulator: Duration::ZERO,
            rng,
            events: Vec::new(),
            resources: WorldResources {
                noise: NoiseField::new(context.seed),
                context,
                registry,
                noise_params,
            },
        };

        let multiplier = streamer.resources.context.initial_fov_multiplier.max(1);
        let created = streamer.expand_coverage(multiplier);
        info!("Initial population: {} chunks", created);
        streamer
    }

    /// Advances the world by one frame.
    ///
    /// # Arguments
    /// * `dt` - Time elapsed since the previous call
    pub fn process(&mut self, dt: Duration) {
        self.update_activation();
        self.flush_pending_regenerations();

        self.update_accumulator += dt;
        if self.update_accumulator >= self.resources.context.chunk_update_duration() {
            self.queue_refreshes();
            self.update_accumulator = Duration::ZERO;
        }

        self.expand_coverage(1);

        let context = self.resources.chunk_context();
        let reports = self.scheduler.run_round(&mut self.world, &context);
        for report in reports {
            self.publish_report(report);
        }
    }

    /// Moves the viewer.
    ///
    /// # Returns
    /// The chunk change, if the viewer crossed a chunk border.
    pub fn set_viewer_position(&mut self, position: Point3<f32>) -> Option<ViewerUpdates> {
        let updates = self.viewer.update(position);
        if let Some(updates) = updates {
            debug!(
                "Viewer moved from chunk {:?} to {:?}",
                updates.previous_chunk_origin, updates.new_chunk_origin
            );
        }
        updates
    }

    /// World-space position of the viewer.
    pub fn viewer_position(&self) -> Point3<f32> {
        self.viewer.position()
    }

    /// The viewer being streamed around.
    pub fn viewer(&self) -> &ViewerState {
        &self.viewer
    }

    /// Draws new noise parameters and queues regeneration of every known chunk.
    ///
    /// Cloud chunks keep the coverage they were created with.
    pub fn reshuffle(&mut self) {
        let params = NoiseParams::randomized(&mut self.rng);
        info!(
            "Reshuffling {} chunks: scale {}, offset {:?}",
            self.world.len(),
            params.scale,
            params.offset
        );
        self.resources.noise_params = params;

        for chunk in self.world.chunks_mut() {
            chunk.request(PipelineKind::Generate);
            self.scheduler.schedule(chunk.origin());
        }
    }

    /// Applies an edit at a position relative to the chunk at `origin`.
    ///
    /// Successful edits coalesce into one remesh on the next frame. Removing a block
    /// emits a [`WorldEvent::SpawnParticles`] at its world position.
    ///
    /// # Returns
    /// `true` if the chunk exists and the edit changed it. Edits carrying a block id
    /// the registry does not define are refused.
    pub fn apply_edit(&mut self, origin: Point3<i32>, edit: BlockEdit) -> bool {
        if let BlockEdit::Place(_, block) | BlockEdit::Replace(_, block) = edit {
            if !self.resources.registry.contains(block) {
                warn!(
                    "Refusing edit at {:?} in chunk {:?}: unknown block id {}",
                    edit.position(),
                    origin,
                    block
                );
                return false;
            }
        }
        let Some(chunk) = self.world.get_chunk_at_mut(origin) else {
            return false;
        };
        match edit {
            BlockEdit::Place(point, block) => chunk.insert_block_at(point, block, true),
            BlockEdit::Replace(point, block) => chunk.set_block_at(point, block, true),
            BlockEdit::Remove(point) => match chunk.remove_block_at(point, true) {
                Some(block) => {
                    self.events.push(WorldEvent::SpawnParticles {
                        block,
                        position: origin + point.to_vec(),
                        lifetime: self.resources.registry.def(block).particle_lifetime,
                    });
                    true
                }
                None => false,
            },
        }
    }

    /// Settles a falling block at a world position.
    ///
    /// The block goes into the cell at `floor(position - origin + (0, 0.5, 0))` of the
    /// chunk whose footprint contains the position, if that cell is air.
    ///
    /// # Returns
    /// `true` if the block was placed. Unknown block ids are never placed.
    pub fn land_falling_block(&mut self, position: Point3<f32>, block: BlockId) -> bool {
        if !self.resources.registry.contains(block) {
            warn!("Refusing to land unknown block id {}", block);
            return false;
        }
        let Some(chunk) = self.world.try_get_chunk_mut(position) else {
            return false;
        };
        let origin = chunk.origin();
        let local = Point3::new(
            (position.x - origin.x as f32).floor() as i32,
            (position.y - origin.y as f32 + 0.5).floor() as i32,
            (position.z - origin.z as f32).floor() as i32,
        );
        chunk.insert_block_at(local, block, true)
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    /// Chunk whose footprint contains the world-space `position`, if loaded.
    pub fn try_get_chunk(&self, position: Point3<f32>) -> Option<&Chunk> {
        self.world.try_get_chunk(position)
    }

    /// Whether a chunk is loaded at the world-space `position`.
    pub fn chunk_exists(&self, position: Point3<f32>) -> bool {
        self.world.chunk_exists(position)
    }

    /// Block at a world-space cell, or the out-of-bounds sentinel where nothing is loaded.
    pub fn get_block_world(&self, position: Point3<i32>) -> BlockId {
        self.world.get_block_world(position)
    }

    /// The chunk map.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Block definitions in use.
    pub fn registry(&self) -> &BlockRegistry {
        &self.resources.registry
    }

    /// World configuration the streamer was built with.
    pub fn context(&self) -> &WorldContext {
        &self.resources.context
    }

    /// Noise parameters drawn for this session.
    pub fn noise_params(&self) -> NoiseParams {
        self.resources.noise_params
    }

    /// Snapshot of chunk and scheduler counters.
    pub fn stats(&self) -> StreamerStats {
        let mut stats = StreamerStats {
            chunks: self.world.len(),
            inactive: self.world.inactive_len(),
            scheduled: self.scheduler.len(),
            ..StreamerStats::default()
        };
        for chunk in self.world.chunks() {
            if chunk.is_active() {
                stats.active += 1;
            }
            if chunk.mesh().is_some() {
                stats.meshed += 1;
            }
        }
        stats
    }

    fn update_activation(&mut self) {
        let radius = self.resources.context.fov_radius();
        let mut activated = Vec::new();
        let mut deactivated = Vec::new();

        for chunk in self.world.chunks_mut() {
            let in_range = self.viewer.planar_distance(chunk.origin()) <= radius;
            if in_range && !chunk.is_active() {
                chunk.set_active(true);
                activated.push(chunk.origin());
            } else if !in_range && chunk.is_active() && chunk.is_idle() {
                chunk.set_active(false);
                deactivated.push(chunk.origin());
            }
        }

        for origin in activated {
            self.world.mark_active(origin);
        }
        for origin in deactivated {
            self.world.mark_inactive(origin);
        }
    }

    fn flush_pending_regenerations(&mut self) {
        for chunk in self.world.chunks_mut() {
            if chunk.take_pending_regeneration() {
                if !chunk.has_queued(PipelineKind::Remesh) {
                    chunk.request(PipelineKind::Remesh);
                }
                self.scheduler.schedule(chunk.origin());
            }
        }
    }

    fn queue_refreshes(&mut self) {
        for chunk in self.world.chunks_mut() {
            if chunk.is_active() && chunk.is_idle() {
                chunk.request(PipelineKind::Refresh);
                self.scheduler.schedule(chunk.origin());
            }
        }

        // The viewer's chunk keeps simulating even while busy.
        let viewer_origin = self.viewer.chunk_origin();
        if let Some(chunk) = self.world.get_chunk_at_mut(viewer_origin) {
            if !chunk.has_queued(PipelineKind::Refresh) {
                chunk.request(PipelineKind::Refresh);
                self.scheduler.schedule(viewer_origin);
            }
        }
    }

    /// Creates chunks for every empty grid cell within `viewer ± fov * multiplier` on X/Z.
    /// Both ends of the range are included, so the window is centered on the viewer.
    ///
    /// # Returns
    /// Number of chunks created.
    fn expand_coverage(&mut self, multiplier: i32) -> usize {
        let dims = self.world.chunk_dimensions();
        let fov = Vector3::from(self.resources.context.player_fov) * multiplier;
        let position = self.viewer.position();
        let (px, pz) = (position.x.floor() as i32, position.z.floor() as i32);

        let mut created = 0;
        for x in ((px - fov.x)..=(px + fov.x)).step_by(dims.x as usize) {
            for z in ((pz - fov.z)..=(pz + fov.z)).step_by(dims.z as usize) {
                let origin = self.world.chunk_origin_for(x as f32, z as f32);
                if self.world.get_chunk_at(origin).is_none() {
                    self.create_chunk(origin);
                    created += 1;
                }
            }
        }
        created
    }

    fn create_chunk(&mut self, origin: Point3<i32>) {
        let context = self.resources.chunk_context();
        let mut chunk = Chunk::new(origin, &context);
        chunk.request(PipelineKind::Generate);
        let clouds = CloudsChunk::new(origin, &context);
        self.world.insert_chunk(chunk, Some(clouds));
        self.scheduler.schedule(origin);
        debug!("Created chunk {:?}", origin);
    }

    fn publish_report(&mut self, report: PipelineReport) {
        for (position, block) in report.falling_blocks {
            self.events
                .push(WorldEvent::SpawnFallingBlock { block, position });
        }
        if let Some(revision) = report.mesh_revision {
            self.events.push(WorldEvent::MeshReady {
                origin: report.origin,
                revision,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_context() -> WorldContext {
        WorldContext {
            chunk_size: [4, 8, 4],
            water_level: 2.0,
            player_fov: [4, 0, 4],
            initial_fov_multiplier: 1,
            chunk_update_interval: 1.0,
            slices_per_round: 1024,
            ..WorldContext::default()
        }
    }

    fn streamer() -> ChunkStreamer {
        ChunkStreamer::new(
            small_context(),
            BlockRegistry::with_default_blocks().unwrap(),
            Point3::new(0.5, 6.0, 0.5),
        )
    }

    #[test]
    fn initial_population_covers_fov_window() {
        let streamer = streamer();
        // x and z in -4..=4 step 4 over the grid of 4: origins -4, 0, 4.
        assert_eq!(streamer.world().len(), 9);
        assert_eq!(streamer.world().clouds().count(), 9);
        assert_eq!(streamer.stats().scheduled, 9);
    }

    #[test]
    fn fov_window_is_centered_and_uses_z_extent() {
        let context = WorldContext {
            player_fov: [4, 0, 8],
            ..small_context()
        };
        let streamer = ChunkStreamer::new(
            context,
            BlockRegistry::with_default_blocks().unwrap(),
            Point3::new(0.5, 6.0, 0.5),
        );
        // Three columns on X, five rows on Z, both ends included.
        assert_eq!(streamer.world().len(), 15);
        for x in [-4, 0, 4] {
            for z in [-8, -4, 0, 4, 8] {
                assert!(streamer.world().get_chunk_at(Point3::new(x, 0, z)).is_some());
            }
        }
        assert!(streamer.world().get_chunk_at(Point3::new(8, 0, 0)).is_none());
    }

    #[test]
    fn first_frame_generates_and_meshes() {
        let mut streamer = streamer();
        streamer.process(Duration::from_millis(16));

        let events = streamer.drain_events();
        let ready = events
            .iter()
            .filter(|event| matches!(event, WorldEvent::MeshReady { revision: 1, .. }))
            .count();
        assert_eq!(ready, 9);
        assert_eq!(streamer.stats().meshed, 9);
        assert!(streamer.drain_events().is_empty());
    }

    #[test]
    fn remove_edit_emits_particles_and_remeshes() {
        let mut streamer = streamer();
        streamer.process(Duration::from_millis(16));
        streamer.drain_events();

        let origin = Point3::new(0, 0, 0);
        let point = Point3::new(1, 0, 1);
        let stone = streamer.registry().core().stone;
        assert!(streamer.apply_edit(origin, BlockEdit::Replace(point, stone)));
        assert_eq!(streamer.get_block_world(point), stone);

        assert!(streamer.apply_edit(origin, BlockEdit::Remove(point)));
        assert!(!streamer.apply_edit(origin, BlockEdit::Remove(point)));
        assert!(!streamer.apply_edit(Point3::new(400, 0, 0), BlockEdit::Remove(point)));
        let lifetime = streamer.registry().def(stone).particle_lifetime;
        assert_eq!(
            streamer.drain_events(),
            vec![WorldEvent::SpawnParticles {
                block: stone,
                position: Point3::new(1, 0, 1),
                lifetime,
            }]
        );

        streamer.process(Duration::from_millis(16));
        let events = streamer.drain_events();
        assert!(events.contains(&WorldEvent::MeshReady {
            origin,
            revision: 2
        }));
    }

    #[test]
    fn landing_rounds_half_a_block_up() {
        let mut streamer = streamer();
        let sand = streamer.registry().core().sand;
        // Chunks are still all air before the first frame.
        assert!(streamer.land_falling_block(Point3::new(-2.5, 3.6, 5.25), sand));
        assert_eq!(streamer.get_block_world(Point3::new(-3, 4, 5)), sand);
        assert!(!streamer.land_falling_block(Point3::new(-2.5, 3.6, 5.25), sand));
        assert!(!streamer.land_falling_block(Point3::new(400.0, 3.0, 0.0), sand));
    }

    #[test]
    fn edits_with_unknown_blocks_are_refused() {
        let mut streamer = streamer();
        streamer.process(Duration::from_millis(16));
        streamer.drain_events();

        let origin = Point3::new(0, 0, 0);
        let point = Point3::new(1, 7, 1);
        let before = streamer.get_block_world(point);
        let unknown = streamer.registry().len() as BlockId;

        assert!(!streamer.apply_edit(origin, BlockEdit::Replace(point, unknown)));
        assert!(!streamer.apply_edit(origin, BlockEdit::Replace(point, -3)));
        assert!(!streamer.apply_edit(origin, BlockEdit::Place(point, 999)));
        assert!(!streamer.land_falling_block(Point3::new(1.5, 7.0, 1.5), unknown));
        assert_eq!(streamer.get_block_world(point), before);

        // Nothing was queued, so the next frame has no remesh to run.
        streamer.process(Duration::from_millis(16));
        assert!(!streamer
            .drain_events()
            .iter()
            .any(|event| matches!(event, WorldEvent::MeshReady { origin: o, .. } if *o == origin)));
    }

    #[test]
    fn reshuffle_replaces_noise_and_regenerates() {
        let mut streamer = streamer();
        streamer.process(Duration::from_millis(16));
        streamer.drain_events();

        let before = streamer.noise_params();
        streamer.reshuffle();
        assert_ne!(streamer.noise_params(), before);
        assert_eq!(streamer.stats().scheduled, 9);

        streamer.process(Duration::from_millis(16));
        let regenerated = streamer
            .drain_events()
            .iter()
            .filter(|event| matches!(event, WorldEvent::MeshReady { revision: 2, .. }))
            .count();
        assert_eq!(regenerated, 9);
    }

    #[test]
    fn distant_chunks_deactivate_and_return() {
        let mut streamer = streamer();
        streamer.process(Duration::from_millis(16));

        streamer.set_viewer_position(Point3::new(100.5, 6.0, 0.5));
        streamer.process(Duration::from_millis(16));
        let origin_chunk = streamer.world().get_chunk_at(Point3::new(0, 0, 0)).unwrap();
        assert!(!origin_chunk.is_active());
        assert!(streamer.world().inactive_len() > 0);

        streamer.set_viewer_position(Point3::new(0.5, 6.0, 0.5));
        streamer.process(Duration::from_millis(16));
        let origin_chunk = streamer.world().get_chunk_at(Point3::new(0, 0, 0)).unwrap();
        assert!(origin_chunk.is_active());
        assert_eq!(origin_chunk.mesh_revision(), 1);
    }

    #[test]
    fn refresh_runs_once_per_interval() {
        let mut streamer = streamer();
        streamer.process(Duration::from_millis(16));
        assert_eq!(streamer.stats().scheduled, 0);

        streamer.process(Duration::from_millis(500));
        assert_eq!(streamer.stats().scheduled, 0);

        // The interval elapses during this frame; every refresh finishes within it.
        streamer.process(Duration::from_millis(600));
        assert!(streamer.world().chunks().all(Chunk::is_idle));

        streamer.process(Duration::from_millis(16));
        assert_eq!(streamer.stats().scheduled, 0);
    }
}
