//! Mesh data structures for voxel rendering.
//!
//! # Architecture
//! - [`ChunkMesh`]: Vertex attributes plus one triangle list per material
//! - [`Face`]: A single voxel quad with its corners, UVs and indices
//!
//! Faces are emitted one voxel side at a time. Adjacent faces are never merged, so the
//! vertex count of a mesh is always four times its face count.

mod face;
#[allow(clippy::module_inception)]
mod mesh;

pub use face::{Face, TILE_SIZE, WATER_SURFACE_HEIGHT};
pub use mesh::*;
