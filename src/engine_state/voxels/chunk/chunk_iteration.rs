//! # Chunk Iteration Module
//!
//! Scan orders over a chunk's cells. Every pass over a chunk walks X in the outer loop,
//! Y in the middle and Z in the inner loop, either all ascending or all descending.
//!
//! The direction is part of each pass's contract, not a detail: the automaton mutates
//! the grid in place, so a descending scan lets water poured into the cell below be
//! visited again later in the same pass, while an ascending one would not.
//!
//! Passes that run cooperatively work one X-slice at a time, so the iterators here can
//! either cover a single slice ([`ChunkSliceIterator`]) or the whole chunk
//! ([`ChunkScanIterator`]).

use cgmath::{Point3, Vector3};

/// Direction in which every axis of a scan advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanDirection {
    /// `0, 1, ..., extent - 1` on every axis.
    Ascending,
    /// `extent - 1, ..., 1, 0` on every axis.
    Descending,
}

impl ScanDirection {
    /// The coordinate visited at `step` along an axis of length `extent`.
    #[inline]
    pub fn coordinate(self, step: i32, extent: i32) -> i32 {
        match self {
            ScanDirection::Ascending => step,
            ScanDirection::Descending => extent - 1 - step,
        }
    }
}

/// Iterates the cells of one X-slice: Y in the outer loop, Z in the inner loop.
pub struct ChunkSliceIterator {
    dimensions: Vector3<i32>,
    direction: ScanDirection,
    x: i32,
    step: i32,
}

impl ChunkSliceIterator {
    /// Creates an iterator over the slice at `x`.
    pub fn new(dimensions: Vector3<i32>, x: i32, direction: ScanDirection) -> Self {
        ChunkSliceIterator {
            dimensions,
            direction,
            x,
            step: 0,
        }
    }
}

impl Iterator for ChunkSliceIterator {
    type Item = Point3<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.dimensions.y * self.dimensions.z {
            return None;
        }
        let y = self
            .direction
            .coordinate(self.step / self.dimensions.z, self.dimensions.y);
        let z = self
            .direction
            .coordinate(self.step % self.dimensions.z, self.dimensions.z);
        self.step += 1;
        Some(Point3::new(self.x, y, z))
    }
}

/// Iterates every cell of a chunk, one X-slice after another.
pub struct ChunkScanIterator {
    dimensions: Vector3<i32>,
    direction: ScanDirection,
    slice_step: i32,
    slice: ChunkSliceIterator,
}

impl ChunkScanIterator {
    /// Creates an iterator over the whole chunk.
    pub fn new(dimensions: Vector3<i32>, direction: ScanDirection) -> Self {
        let first_x = direction.coordinate(0, dimensions.x);
        ChunkScanIterator {
            dimensions,
            direction,
            slice_step: 0,
            slice: ChunkSliceIterator::new(dimensions, first_x, direction),
        }
    }
}

impl Iterator for ChunkScanIterator {
    type Item = Point3<i32>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.slice_step >= self.dimensions.x {
                return None;
            }
            if let Some(point) = self.slice.next() {
                return Some(point);
            }
            self.slice_step += 1;
            let x = self.direction.coordinate(self.slice_step, self.dimensions.x);
            self.slice = ChunkSliceIterator::new(self.dimensions, x, self.direction);
        }
    }
}
