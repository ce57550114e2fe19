//! ThermoError: unified error type for cell-thermo public APIs
//!
//! The thermodynamic passes are pure arithmetic over well-formed arrays, so
//! the error surface is small: caller contract violations that are cheap to
//! detect (length and sizing mismatches, invalid configuration) and resource
//! failures from the execution backend (allocation, launch, transport).
//! Numerically undefined cells (zero mass, fewer than two particles) are
//! *not* errors; they resolve to zero by convention.

use thiserror::Error;

use crate::algs::launch::Pass;

/// Unified error type for cell-thermo operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ThermoError {
    /// Two arrays that must describe the same set of cells or slots disagree in length.
    #[error("length mismatch for {what}: expected {expected}, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The equipartition relation is only defined for 2 or 3 dimensions.
    #[error("invalid dimensionality {0} (expected 2 or 3)")]
    InvalidDimensionality(u32),
    /// A worker-group size of zero was requested for a pass.
    #[error("worker-group size for pass `{0}` must be non-zero")]
    ZeroBlockSize(Pass),
    /// The grid is too small to hold the requested ghost layer.
    #[error("invalid topology: dims {dims:?} cannot hold ghost width {ghost:?}")]
    InvalidTopology { dims: [u32; 3], ghost: [u32; 3] },
    /// A raw particle index in a cell list does not resolve to stored particle data.
    #[error("particle index {index} out of range (native {native}, embedded {embedded})")]
    InvalidParticleIndex {
        index: u32,
        native: usize,
        embedded: usize,
    },
    /// Phase two of a reduction received less scratch memory than phase one asked for.
    #[error("reduction scratch too small: required {required} bytes, found {found}")]
    ScratchTooSmall { required: usize, found: usize },
    /// Host-side allocation of per-cell arrays failed.
    #[error("failed to allocate {bytes} bytes for {what}")]
    Allocation { what: &'static str, bytes: usize },
    /// The worker pool backing the passes could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
    /// The execution backend failed to run a pass to completion.
    #[error("launch of pass `{pass}` failed: {reason}")]
    Launch { pass: Pass, reason: String },
    /// Left and right halo ranges share cells.
    #[error("halo ranges overlap: left {left:?}, right {right:?}")]
    OverlappingHaloRanges { left: String, right: String },
    /// A cell range reaches outside its grid.
    #[error("cell range {range} lies outside grid {dims:?}")]
    RangeOutOfGrid { range: String, dims: [u32; 3] },
    /// Transport-level failure while talking to a neighbor.
    #[error("communication with neighbor {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
}
