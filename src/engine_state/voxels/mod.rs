//! # Voxel World Core
//!
//! This module contains the data side of the world: what blocks exist, how terrain is
//! sampled, and where every chunk lives.
//!
//! ## Architecture
//!
//! The voxel system is organized into several key components:
//!
//! * **Block**: Block definitions, the registry that resolves names to ids, and faces
//! * **Noise field**: Deterministic fractal noise every generator samples
//! * **Chunk**: Fixed-size 3D grids with their generator, automaton and work queue
//! * **Clouds**: A flat, one-off overlay above every terrain chunk
//! * **World**: Owns every chunk and cloud chunk, keyed by grid origin
//!
//! ## Data Flow
//!
//! 1. The streamer creates a chunk for an empty grid cell near the viewer
//! 2. The chunk's generator fills its map from the noise field
//! 3. The automaton evolves the map on every refresh
//! 4. Any change is followed by a full mesh rebuild

pub mod block;
pub mod chunk;
pub mod clouds;
pub mod noise_field;
pub mod world;
