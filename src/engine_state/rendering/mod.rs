//! Mesh output for the voxel engine.
//!
//! This module turns chunk voxel data into renderer-agnostic triangle batches. It does
//! not talk to a GPU: consumers take the [`ChunkMesh`](meshing::ChunkMesh) buffers (or the
//! interleaved [`Vertex`] bytes) and upload them with whatever backend they use.
//!
//! - `lighting`: the light pass and the per-vertex color it produces
//! - `meshing`: face-culled mesh construction grouped by material
//! - `vertex`: the interleaved `Pod` vertex layout

pub mod lighting;
pub mod meshing;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;
