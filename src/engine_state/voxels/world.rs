//! # World Module
//!
//! This module provides the `World` struct which owns every instantiated chunk and its
//! cloud overlay, keyed by grid-aligned origin.
//!
//! ## Architecture
//!
//! The world uses a sparse storage approach: chunks exist only where the viewer has been
//! close enough for them to be created. Chunks that fall out of range are deactivated,
//! not dropped, so returning to them costs nothing.
//!
//! ## Eviction
//!
//! Deactivated chunks are tracked in an LRU list. Once more than `max_inactive` chunks
//! are inactive, the least recently deactivated idle ones are dropped along with their
//! clouds. Reactivating a chunk takes it off the list.

use std::collections::HashMap;

use cgmath::{Point3, Vector3};
use log::info;
use lru::LruCache;

use super::{
    block::{BlockId, OUT_OF_BOUNDS},
    chunk::Chunk,
    clouds::CloudsChunk,
};

/// Terrain and cloud chunks of a session.
pub struct World {
    chunks: HashMap<Point3<i32>, Chunk>,
    clouds: HashMap<Point3<i32>, CloudsChunk>,
    inactive: LruCache<Point3<i32>, ()>,
    max_inactive: usize,
    chunk_dimensions: Vector3<i32>,
}

impl World {
    /// Creates a new, empty world.
    ///
    /// # Arguments
    /// * `chunk_dimensions` - Extent of every chunk
    /// * `max_inactive` - Inactive chunks kept before eviction starts
    pub fn new(chunk_dimensions: Vector3<i32>, max_inactive: usize) -> Self {
        World {
            chunks: HashMap::new(),
            clouds: HashMap::new(),
            inactive: LruCache::unbounded(),
            max_inactive,
            chunk_dimensions,
        }
    }

    /// Grid origin of the chunk whose footprint contains world X/Z `(x, z)`.
    pub fn chunk_origin_for(&self, x: f32, z: f32) -> Point3<i32> {
        let size_x = self.chunk_dimensions.x as f32;
        let size_z = self.chunk_dimensions.z as f32;
        Point3::new(
            ((x / size_x).floor() * size_x) as i32,
            0,
            ((z / size_z).floor() * size_z) as i32,
        )
    }

    /// Extent shared by every chunk.
    pub fn chunk_dimensions(&self) -> Vector3<i32> {
        self.chunk_dimensions
    }

    /// Adds a terrain chunk and, optionally, its clouds.
    pub fn insert_chunk(&mut self, chunk: Chunk, clouds: Option<CloudsChunk>) {
        let origin = chunk.origin();
        self.chunks.insert(origin, chunk);
        if let Some(clouds) = clouds {
            self.clouds.insert(origin, clouds);
        }
    }

    /// Retrieves the chunk at a grid origin.
    pub fn get_chunk_at(&self, origin: Point3<i32>) -> Option<&Chunk> {
        self.chunks.get(&origin)
    }

    /// Mutable access to the chunk at grid `origin`.
    pub fn get_chunk_at_mut(&mut self, origin: Point3<i32>) -> Option<&mut Chunk> {
        self.chunks.get_mut(&origin)
    }

    /// Clouds over the terrain chunk at `origin`.
    pub fn get_clouds_at(&self, origin: Point3<i32>) -> Option<&CloudsChunk> {
        self.clouds.get(&origin)
    }

    /// Finds the chunk whose X/Z footprint contains `position`. Height is ignored.
    pub fn try_get_chunk(&self, position: Point3<f32>) -> Option<&Chunk> {
        let origin = self.chunk_origin_for(position.x, position.z);
        self.chunks
            .get(&origin)
            .filter(|chunk| chunk.contains_column(position.x, position.z))
    }

    /// Mutable access to the chunk containing the world-space `position`.
    pub fn try_get_chunk_mut(&mut self, position: Point3<f32>) -> Option<&mut Chunk> {
        let origin = self.chunk_origin_for(position.x, position.z);
        self.chunks
            .get_mut(&origin)
            .filter(|chunk| chunk.contains_column(position.x, position.z))
    }

    /// Whether a chunk is loaded at the world-space `position`.
    pub fn chunk_exists(&self, position: Point3<f32>) -> bool {
        self.try_get_chunk(position).is_some()
    }

    /// Block at a world-space cell, or the out-of-bounds sentinel where no chunk exists.
    pub fn get_block_world(&self, position: Point3<i32>) -> BlockId {
        let column = Point3::new(position.x as f32, position.y as f32, position.z as f32);
        match self.try_get_chunk(column) {
            Some(chunk) => {
                let origin = chunk.origin();
                chunk.get_block_at(
                    position.x - origin.x,
                    position.y - origin.y,
                    position.z - origin.z,
                )
            }
            None => OUT_OF_BOUNDS,
        }
    }

    /// Every loaded chunk, active or not.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    /// Mutable access to every loaded chunk.
    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut Chunk> {
        self.chunks.values_mut()
    }

    /// Origins of every loaded chunk.
    pub fn origins(&self) -> Vec<Point3<i32>> {
        self.chunks.keys().copied().collect()
    }

    /// Cloud layers of every loaded chunk.
    pub fn clouds(&self) -> impl Iterator<Item = &CloudsChunk> {
        self.clouds.values()
    }

    /// Number of loaded chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when no chunk is loaded.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of chunks waiting in the eviction cache.
    pub fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    /// Records a deactivation and evicts the least recently deactivated idle chunks
    /// beyond capacity.
    ///
    /// # Returns
    /// Origins of the evicted chunks.
    pub fn mark_inactive(&mut self, origin: Point3<i32>) -> Vec<Point3<i32>> {
        self.inactive.push(origin, ());

        let mut evicted = Vec::new();
        while self.inactive.len() > self.max_inactive {
            let victim = self
                .inactive
                .iter()
                .rev()
                .map(|(origin, _)| *origin)
                .find(|origin| self.chunks.get(origin).map_or(true, Chunk::is_idle));
            let Some(victim) = victim else {
                break;
            };
            self.inactive.pop(&victim);
            self.chunks.remove(&victim);
            self.clouds.remove(&victim);
            info!("Evicted chunk {:?}", victim);
            evicted.push(victim);
        }
        evicted
    }

    /// Takes a reactivated chunk off the eviction list.
    pub fn mark_active(&mut self, origin: Point3<i32>) {
        self.inactive.pop(&origin);
    }
}
