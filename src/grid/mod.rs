//! Grid addressing: cell indexing, sub-ranges and sub-domain topology.

pub mod indexer;
pub mod topology;

pub use indexer::{CellIndexer, CellRange};
pub use topology::{Axis, GridTopology, HaloRanges};
