//! # Viewer State Management
//!
//! This module tracks the point the world streams around:
//! - Viewer position in world space
//! - The chunk the viewer currently stands in
//! - Planar (X/Z) distance checks used for chunk activation
//!
//! ## Core Components
//! - `ViewerState`: Current position and containing chunk
//! - `ViewerController`: Moves the viewer along a heading at a fixed speed
//! - `ViewerUpdates`: Returned when the viewer crosses into another chunk

use cgmath::{Point3, Rad, Vector3};
use web_time::Duration;

/// Position of the viewer and the chunk it stands in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    position: Point3<f32>,
    chunk_origin: Point3<i32>,
    chunk_dimensions: Vector3<i32>,
}

impl ViewerState {
    /// Creates a viewer at `position` for chunks of the given extent.
    pub fn new(position: Point3<f32>, chunk_dimensions: Vector3<i32>) -> Self {
        ViewerState {
            position,
            chunk_origin: Self::origin_for(position, chunk_dimensions),
            chunk_dimensions,
        }
    }

    fn origin_for(position: Point3<f32>, dims: Vector3<i32>) -> Point3<i32> {
        Point3::new(
            (position.x / dims.x as f32).floor() as i32 * dims.x,
            0,
            (position.z / dims.z as f32).floor() as i32 * dims.z,
        )
    }

    /// Current world-space position.
    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    /// Grid origin of the chunk containing the viewer.
    pub fn chunk_origin(&self) -> Point3<i32> {
        self.chunk_origin
    }

    /// Moves the viewer.
    ///
    /// # Returns
    /// - `Some(ViewerUpdates)` if the viewer entered a different chunk
    /// - `None` otherwise
    pub fn update(&mut self, position: Point3<f32>) -> Option<ViewerUpdates> {
        self.position = position;
        let new_chunk_origin = Self::origin_for(position, self.chunk_dimensions);
        if new_chunk_origin == self.chunk_origin {
            return None;
        }
        let previous_chunk_origin = self.chunk_origin;
        self.chunk_origin = new_chunk_origin;
        Some(ViewerUpdates {
            previous_chunk_origin,
            new_chunk_origin,
        })
    }

    /// Distance on the X/Z plane between the viewer and `origin`.
    pub fn planar_distance(&self, origin: Point3<i32>) -> f32 {
        let dx = self.position.x - origin.x as f32;
        let dz = self.position.z - origin.z as f32;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Emitted by [`ViewerState::update`] when the viewer changes chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerUpdates {
    /// Origin of the chunk the viewer left.
    pub previous_chunk_origin: Point3<i32>,
    /// Origin of the chunk the viewer is now in.
    pub new_chunk_origin: Point3<i32>,
}

/// Walks a viewer across the world.
#[derive(Debug, Clone, Copy)]
pub struct ViewerController {
    heading: Rad<f32>,
    speed: f32,
}

impl ViewerController {
    /// Creates a controller.
    ///
    /// # Arguments
    /// * `heading` - Direction of travel on the X/Z plane, measured from +X toward +Z
    /// * `speed` - Movement speed in blocks per second
    pub fn new<H: Into<Rad<f32>>>(heading: H, speed: f32) -> Self {
        ViewerController {
            heading: heading.into(),
            speed,
        }
    }

    /// Position reached after moving from `position` for `dt`.
    pub fn step(&self, position: Point3<f32>, dt: Duration) -> Point3<f32> {
        let distance = self.speed * dt.as_secs_f32();
        let (sin, cos) = (self.heading.0.sin(), self.heading.0.cos());
        position + Vector3::new(cos * distance, 0.0, sin * distance)
    }

    /// Turns the heading by `delta`.
    pub fn turn<A: Into<Rad<f32>>>(&mut self, delta: A) {
        self.heading += delta.into();
    }
}
