//! Vertex data structures for chunk meshes.
//!
//! [`ChunkMesh`](super::meshing::ChunkMesh) keeps positions, UVs and colors in parallel
//! arrays. Consumers that want a single interleaved buffer can convert it into
//! [`Vertex`] values and upload them as raw bytes.

use cgmath::Point3;

/// An interleaved mesh vertex.
///
/// # Memory Layout
/// - Position: 3x f32 (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
/// - Color: [u8; 4] (4 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Chunk-local position
    position: [f32; 3],
    /// Atlas UV coordinates
    tex_coords: [f32; 2],
    /// RGBA vertex color
    color: [u8; 4],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `pos` - Chunk-local position of the vertex
    /// * `tex_coords` - UV coordinates inside the tile atlas
    /// * `color` - RGBA vertex color
    pub fn new(pos: Point3<f32>, tex_coords: [f32; 2], color: [u8; 4]) -> Self {
        Vertex {
            position: [pos.x, pos.y, pos.z],
            tex_coords,
            color,
        }
    }

    /// Chunk-local position.
    pub fn position(&self) -> Point3<f32> {
        Point3::new(self.position[0], self.position[1], self.position[2])
    }

    /// Atlas UV coordinates.
    pub fn tex_coords(&self) -> [f32; 2] {
        self.tex_coords
    }
}
