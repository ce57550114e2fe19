//! Local grid topology of one sub-domain: owned cells surrounded by a ghost layer.
//!
//! The decomposition itself (which rank neighbours which) is decided
//! elsewhere; this type only answers "which cells are mine" and "which slabs
//! travel along an axis".
//!
//! Along a decomposed axis with ghost width `g` and `d` cells in total:
//!
//! ```text
//!  | ghost L | boundary L |   ...   | boundary R | ghost R |
//!  0         g            2g        d-2g         d-g       d
//! ```
//!
//! Ghost mirroring sends the boundary slabs and overwrites the neighbours'
//! ghost slabs; additive folding sends the ghost slabs and adds them into the
//! neighbours' boundary slabs.

use crate::debug_invariants::DebugInvariants;
use crate::grid::indexer::{CellIndexer, CellRange};
use crate::thermo_error::ThermoError;

/// Cartesian axis of the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// A pair of disjoint ranges on opposite faces of a grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HaloRanges {
    pub grid: CellIndexer,
    pub left: CellRange,
    pub right: CellRange,
}

impl HaloRanges {
    /// Total number of cells in both ranges.
    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DebugInvariants for HaloRanges {
    fn validate_invariants(&self) -> Result<(), ThermoError> {
        for r in [&self.left, &self.right] {
            if !r.fits_in(&self.grid) {
                return Err(ThermoError::RangeOutOfGrid {
                    range: r.to_string(),
                    dims: self.grid.dims(),
                });
            }
        }
        if self.left.overlaps(&self.right) {
            return Err(ThermoError::OverlappingHaloRanges {
                left: self.left.to_string(),
                right: self.right.to_string(),
            });
        }
        Ok(())
    }
}

/// Cell counts (ghosts included) and ghost width of one sub-domain.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridTopology {
    dims: [u32; 3],
    ghost: [u32; 3],
}

impl GridTopology {
    /// Build a topology. A decomposed axis (`ghost > 0`) needs at least
    /// `4 * ghost` cells so its two boundary slabs stay disjoint.
    pub fn new(dims: [u32; 3], ghost: [u32; 3]) -> Result<Self, ThermoError> {
        let ok = (0..3).all(|a| {
            let d = dims[a] as u64;
            let g = ghost[a] as u64;
            d > 0 && d >= 4 * g
        });
        if !ok {
            return Err(ThermoError::InvalidTopology { dims, ghost });
        }
        Ok(Self { dims, ghost })
    }

    /// A single-domain grid with no ghost layer.
    pub fn serial(dims: [u32; 3]) -> Result<Self, ThermoError> {
        Self::new(dims, [0, 0, 0])
    }

    #[inline]
    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    #[inline]
    pub fn ghost_width(&self) -> [u32; 3] {
        self.ghost
    }

    #[inline]
    pub fn indexer(&self) -> CellIndexer {
        CellIndexer::new(self.dims)
    }

    #[inline]
    pub fn num_cells(&self) -> usize {
        self.indexer().num_cells()
    }

    /// Owned (non-ghost) cells; staging over this range avoids double counting.
    pub fn local_range(&self) -> CellRange {
        let mut origin = [0; 3];
        let mut extent = [0; 3];
        for a in 0..3 {
            origin[a] = self.ghost[a];
            extent[a] = self.dims[a] - 2 * self.ghost[a];
        }
        CellRange::new(origin, extent)
    }

    /// Whether the axis exchanges halos at all.
    #[inline]
    pub fn is_decomposed(&self, axis: Axis) -> bool {
        self.ghost[axis.index()] > 0
    }

    fn slab(&self, axis: Axis, start: u32) -> CellRange {
        let a = axis.index();
        let mut origin = [0; 3];
        let mut extent = self.dims;
        origin[a] = start;
        extent[a] = self.ghost[a];
        CellRange::new(origin, extent)
    }

    /// Ghost slabs on both faces of `axis`.
    pub fn ghost_ranges(&self, axis: Axis) -> HaloRanges {
        let a = axis.index();
        HaloRanges {
            grid: self.indexer(),
            left: self.slab(axis, 0),
            right: self.slab(axis, self.dims[a] - self.ghost[a]),
        }
    }

    /// Owned slabs adjacent to the ghost layer on both faces of `axis`.
    pub fn boundary_ranges(&self, axis: Axis) -> HaloRanges {
        let a = axis.index();
        HaloRanges {
            grid: self.indexer(),
            left: self.slab(axis, self.ghost[a]),
            right: self.slab(axis, self.dims[a] - 2 * self.ghost[a]),
        }
    }
}

impl DebugInvariants for GridTopology {
    fn validate_invariants(&self) -> Result<(), ThermoError> {
        Self::new(self.dims, self.ghost).map(|_| ())?;
        for axis in Axis::ALL {
            self.ghost_ranges(axis).validate_invariants()?;
            self.boundary_ranges(axis).validate_invariants()?;
        }
        Ok(())
    }
}
