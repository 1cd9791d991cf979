//! Mesh data structures produced for a chunk.
//!
//! A [`ChunkMesh`] holds vertex attributes in parallel arrays and one triangle list per
//! material. Meshes are never patched: every regeneration builds a new one and the chunk
//! swaps it in.

use cgmath::Point3;

use super::face::Face;
use crate::engine_state::rendering::Vertex;

/// Triangle indices drawn with one material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submesh {
    /// Registry material index
    pub material: usize,
    /// Triangle list into the owning mesh's vertex arrays
    pub indices: Vec<u32>,
}

/// Renderable geometry of one chunk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMesh {
    /// Vertex positions in chunk coordinates
    pub positions: Vec<Point3<f32>>,
    /// Atlas UVs, parallel to `positions`
    pub uvs: Vec<[f32; 2]>,
    /// RGBA vertex colors, parallel to `positions`
    pub colors: Vec<[u8; 4]>,
    /// One entry per material, in the order the materials were first met
    pub submeshes: Vec<Submesh>,
}

impl ChunkMesh {
    /// Creates a new, empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one face to the submesh for `material`, creating it on first use.
    ///
    /// # Arguments
    /// * `face` - The quad to append
    /// * `material` - Registry material index of the block the face belongs to
    /// * `tile` - Atlas tile for the face
    /// * `color` - Color given to all four vertices
    pub fn push_face(&mut self, face: &Face, material: usize, tile: u32, color: [u8; 4]) {
        let base = self.positions.len() as u32;
        self.positions.extend(face.corners());
        self.uvs.extend(Face::tile_uvs(tile));
        self.colors.extend([color; 4]);

        let indices = Face::indices(base);
        match self
            .submeshes
            .iter_mut()
            .find(|submesh| submesh.material == material)
        {
            Some(submesh) => submesh.indices.extend(indices),
            None => self.submeshes.push(Submesh {
                material,
                indices: indices.to_vec(),
            }),
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Total number of indices across all submeshes.
    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(|submesh| submesh.indices.len()).sum()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    /// True when no face was emitted.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Triangle list for `material`, if any face used it.
    pub fn submesh(&self, material: usize) -> Option<&Submesh> {
        self.submeshes
            .iter()
            .find(|submesh| submesh.material == material)
    }

    /// Interleaves the vertex attributes.
    ///
    /// # Returns
    /// A vector of `Vertex` objects indexed exactly like the submesh triangle lists.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.positions
            .iter()
            .zip(&self.uvs)
            .zip(&self.colors)
            .map(|((position, uv), color)| Vertex::new(*position, *uv, *color))
            .collect()
    }

    /// Interleaved vertex data as raw bytes, ready for upload.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.vertices()).to_vec()
    }
}
