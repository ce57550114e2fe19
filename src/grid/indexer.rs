//! `CellIndexer` and `CellRange`: linear slots for 3-D cell coordinates.
//!
//! Cells are never allocated individually; every per-cell quantity lives in a
//! flat array addressed through a [`CellIndexer`]. The layout is x-fastest:
//! `idx = i + nx * (j + ny * k)`.
//!
//! A [`CellRange`] is a rectangular box of cells inside a grid (a halo slab,
//! the non-ghost interior, ...). It carries its own x-fastest slot order so a
//! range can be packed into, or staged from, a contiguous buffer.

use std::fmt;

use itertools::iproduct;

/// Maps `[i, j, k]` cell coordinates to a linear slot and back.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CellIndexer {
    dims: [u32; 3],
}

impl CellIndexer {
    /// Indexer over a grid of `dims[0] x dims[1] x dims[2]` cells.
    ///
    /// A zero extent is allowed (it describes an empty range) but such a
    /// grid has no cells, so [`index`](Self::index) and
    /// [`coords`](Self::coords) have nothing valid to map. Sub-domains are
    /// built through [`GridTopology`](crate::grid::topology::GridTopology),
    /// which rejects zero extents.
    #[inline]
    pub const fn new(dims: [u32; 3]) -> Self {
        Self { dims }
    }

    #[inline]
    pub const fn dims(&self) -> [u32; 3] {
        self.dims
    }

    /// Total number of cells.
    #[inline]
    pub const fn num_cells(&self) -> usize {
        self.dims[0] as usize * self.dims[1] as usize * self.dims[2] as usize
    }

    /// Linear slot of `coords`. The coordinates must lie inside the grid.
    #[inline]
    pub const fn index(&self, coords: [u32; 3]) -> usize {
        let [nx, ny, _] = self.dims;
        coords[0] as usize + nx as usize * (coords[1] as usize + ny as usize * coords[2] as usize)
    }

    /// Inverse of [`index`](Self::index). `idx` must be below
    /// [`num_cells`](Self::num_cells).
    #[inline]
    pub const fn coords(&self, idx: usize) -> [u32; 3] {
        debug_assert!(idx < self.num_cells(), "cell slot outside grid");
        let nx = self.dims[0] as usize;
        let ny = self.dims[1] as usize;
        let i = idx % nx;
        let rest = idx / nx;
        [i as u32, (rest % ny) as u32, (rest / ny) as u32]
    }

    /// Whether `coords` addresses a cell of this grid.
    #[inline]
    pub const fn contains(&self, coords: [u32; 3]) -> bool {
        coords[0] < self.dims[0] && coords[1] < self.dims[1] && coords[2] < self.dims[2]
    }

    /// The whole grid as a range.
    #[inline]
    pub const fn full_range(&self) -> CellRange {
        CellRange::new([0, 0, 0], self.dims)
    }
}

/// A rectangular sub-range `[origin, origin + extent)` of a grid.
#[derive(Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CellRange {
    pub origin: [u32; 3],
    pub extent: [u32; 3],
}

impl CellRange {
    #[inline]
    pub const fn new(origin: [u32; 3], extent: [u32; 3]) -> Self {
        Self { origin, extent }
    }

    /// Number of cells in the range.
    #[inline]
    pub const fn len(&self) -> usize {
        self.indexer().num_cells()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indexer over the range's own extent (slot order of packed buffers).
    #[inline]
    pub const fn indexer(&self) -> CellIndexer {
        CellIndexer::new(self.extent)
    }

    /// Grid coordinates of buffer slot `slot`.
    #[inline]
    pub const fn coords_of(&self, slot: usize) -> [u32; 3] {
        let local = self.indexer().coords(slot);
        [
            self.origin[0] + local[0],
            self.origin[1] + local[1],
            self.origin[2] + local[2],
        ]
    }

    /// Buffer slot of grid coordinates `coords`, if they fall inside the range.
    #[inline]
    pub fn slot_of(&self, coords: [u32; 3]) -> Option<usize> {
        let mut local = [0u32; 3];
        for axis in 0..3 {
            local[axis] = coords[axis].checked_sub(self.origin[axis])?;
            if local[axis] >= self.extent[axis] {
                return None;
            }
        }
        Some(self.indexer().index(local))
    }

    /// Grid coordinates of every cell, in slot order.
    pub fn iter_coords(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        let [ox, oy, oz] = self.origin;
        let [ex, ey, ez] = self.extent;
        iproduct!(oz..oz + ez, oy..oy + ey, ox..ox + ex).map(|(k, j, i)| [i, j, k])
    }

    /// Whether two ranges share at least one cell.
    pub fn overlaps(&self, other: &CellRange) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (0..3).all(|axis| {
            let a_end = self.origin[axis] as u64 + self.extent[axis] as u64;
            let b_end = other.origin[axis] as u64 + other.extent[axis] as u64;
            (self.origin[axis] as u64) < b_end && (other.origin[axis] as u64) < a_end
        })
    }

    /// Whether the range lies completely inside `grid`.
    pub fn fits_in(&self, grid: &CellIndexer) -> bool {
        let dims = grid.dims();
        (0..3).all(|axis| self.origin[axis] as u64 + self.extent[axis] as u64 <= dims[axis] as u64)
    }
}

impl fmt::Debug for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellRange({:?} + {:?})", self.origin, self.extent)
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
