//! # Block Side Module
//!
//! This module defines the different faces/sides of a voxel block.
//! It provides the neighbor offsets used for face culling and the tile slot
//! each face reads from a block definition.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant of each variant is the face's tile slot in
/// [`BlockDef::tiles`](super::BlockDef::tiles), and also the order in which the
/// mesher visits faces.
///
/// The order is: [BOTTOM, TOP, RIGHT, LEFT, FRONT, BACK]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The bottom face (facing negative Y)
    BOTTOM = 0,

    /// The top face (facing positive Y)
    TOP = 1,

    /// The right face (facing positive X)
    RIGHT = 2,

    /// The left face (facing negative X)
    LEFT = 3,

    /// The front face (facing positive Z)
    FRONT = 4,

    /// The back face (facing negative Z)
    BACK = 5,
}

impl BlockSide {
    /// Returns an array containing all six block faces in mesher order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::RIGHT,
            BlockSide::LEFT,
            BlockSide::FRONT,
            BlockSide::BACK,
        ]
    }

    /// The four faces whose normals lie in the horizontal plane.
    pub fn horizontal() -> [BlockSide; 4] {
        [
            BlockSide::RIGHT,
            BlockSide::LEFT,
            BlockSide::FRONT,
            BlockSide::BACK,
        ]
    }

    /// Offset from a block to the neighbor that shares this face.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
            BlockSide::FRONT => Vector3::new(0, 0, 1),
            BlockSide::BACK => Vector3::new(0, 0, -1),
        }
    }
}
