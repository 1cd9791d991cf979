//! # Task Management System
//!
//! This module provides the cooperative scheduler that drives every chunk's work.
//! Nothing runs in the background: the streamer calls [`ChunkScheduler::run_round`]
//! once per frame and the scheduler hands out a bounded number of slices.
//!
//! ## Architecture Overview
//!
//! - `ChunkScheduler`: Round-robin queue of chunks that have work
//! - `ChunkPipeline` (in [`task`]): The state machine a chunk runs, one slice per turn
//! - `PipelineReport`: What a finished sequence produced
//!
//! ## Round Lifecycle
//! 1. Chunks with requested work are scheduled via `ChunkScheduler::schedule()`
//! 2. Each turn pops the oldest scheduled chunk and advances it by one slice
//! 3. Chunks that still have work go to the back of the queue
//! 4. The round ends when the slice budget is spent or the queue is empty
//!
//! Round-robin order keeps a chunk with a long queue from starving its neighbours.

pub mod task;

use std::collections::{HashSet, VecDeque};

use cgmath::Point3;
use log::{trace, warn};

use crate::engine_state::voxels::{chunk::ChunkContext, world::World};
use task::PipelineReport;

/// Round-robin scheduler over chunks with pending sequences.
#[derive(Debug)]
pub struct ChunkScheduler {
    queue: VecDeque<Point3<i32>>,
    scheduled: HashSet<Point3<i32>>,
    slices_per_round: usize,
}

impl ChunkScheduler {
    /// Creates a scheduler.
    ///
    /// # Arguments
    /// * `slices_per_round` - Slices handed out per call to `run_round`. Zero is
    ///   treated as one so work always progresses.
    pub fn new(slices_per_round: usize) -> Self {
        ChunkScheduler {
            queue: VecDeque::new(),
            scheduled: HashSet::new(),
            slices_per_round: slices_per_round.max(1),
        }
    }

    /// Puts a chunk in line. Scheduling a chunk that is already in line does nothing.
    pub fn schedule(&mut self, origin: Point3<i32>) {
        if self.scheduled.insert(origin) {
            self.queue.push_back(origin);
        }
    }

    /// Whether `origin` has a queue entry.
    pub fn is_scheduled(&self, origin: Point3<i32>) -> bool {
        self.scheduled.contains(&origin)
    }

    /// Number of chunks with queued work.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Hands out up to `slices_per_round` slices in round-robin order.
    ///
    /// # Returns
    /// Reports of every sequence that finished during the round, in completion order.
    pub fn run_round(&mut self, world: &mut World, context: &ChunkContext) -> Vec<PipelineReport> {
        let mut reports = Vec::new();
        let mut slices = 0;

        while slices < self.slices_per_round {
            let Some(origin) = self.queue.pop_front() else {
                break;
            };
            let Some(chunk) = world.get_chunk_at_mut(origin) else {
                warn!("Scheduled chunk {:?} no longer exists", origin);
                self.scheduled.remove(&origin);
                continue;
            };

            if let Some(report) = chunk.advance(context) {
                reports.push(report);
            }
            slices += 1;

            if chunk.has_work() {
                self.queue.push_back(origin);
            } else {
                self.scheduled.remove(&origin);
            }
        }

        trace!(
            "Scheduler round: {} slices, {} finished, {} waiting",
            slices,
            reports.len(),
            self.queue.len()
        );
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        voxels::{block::block_registry::BlockRegistry, chunk::Chunk, noise_field::NoiseField},
        world_context::{NoiseParams, WorldContext},
    };
    use task::PipelineKind;

    fn config() -> WorldContext {
        WorldContext {
            chunk_size: [2, 4, 2],
            water_level: 1.0,
            ..WorldContext::default()
        }
    }

    #[test]
    fn scheduling_twice_queues_once() {
        let mut scheduler = ChunkScheduler::new(4);
        scheduler.schedule(Point3::new(0, 0, 0));
        scheduler.schedule(Point3::new(0, 0, 0));
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.is_scheduled(Point3::new(0, 0, 0)));
    }

    #[test]
    fn chunks_take_turns() {
        let config = config();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&config, &registry, &noise, NoiseParams::from_context(&config));
        let mut world = World::new(config.chunk_dimensions(), 8);
        let mut scheduler = ChunkScheduler::new(2);

        for origin in [Point3::new(0, 0, 0), Point3::new(2, 0, 0)] {
            let mut chunk = Chunk::new(origin, &context);
            chunk.request(PipelineKind::Remesh);
            world.insert_chunk(chunk, None);
            scheduler.schedule(origin);
        }

        // One slice each: both chunks are now building their mesh.
        assert!(scheduler.run_round(&mut world, &context).is_empty());
        let reports = scheduler.run_round(&mut world, &context);
        let origins: Vec<_> = reports.iter().map(|r| r.origin).collect();
        assert_eq!(origins, vec![Point3::new(0, 0, 0), Point3::new(2, 0, 0)]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn budget_limits_slices_per_round() {
        let config = config();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&config, &registry, &noise, NoiseParams::from_context(&config));
        let mut world = World::new(config.chunk_dimensions(), 8);
        let mut scheduler = ChunkScheduler::new(1);

        let mut chunk = Chunk::new(Point3::new(0, 0, 0), &context);
        chunk.request(PipelineKind::Generate);
        world.insert_chunk(chunk, None);
        scheduler.schedule(Point3::new(0, 0, 0));

        // 2 map slices, 2 tree slices, light, mesh.
        let mut rounds = 0;
        let mut reports = Vec::new();
        while !scheduler.is_empty() {
            reports.extend(scheduler.run_round(&mut world, &context));
            rounds += 1;
        }
        assert_eq!(rounds, 6);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn missing_chunks_are_dropped_from_the_queue() {
        let config = config();
        let registry = BlockRegistry::with_default_blocks().unwrap();
        let noise = NoiseField::new(0);
        let context = ChunkContext::new(&config, &registry, &noise, NoiseParams::from_context(&config));
        let mut world = World::new(config.chunk_dimensions(), 8);
        let mut scheduler = ChunkScheduler::new(4);

        scheduler.schedule(Point3::new(10, 0, 10));
        assert!(scheduler.run_round(&mut world, &context).is_empty());
        assert!(!scheduler.is_scheduled(Point3::new(10, 0, 10)));
    }
}
