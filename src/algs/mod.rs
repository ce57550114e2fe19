//! Per-cell passes and the global reduction.

pub mod accumulate;
pub mod finalize;
pub mod launch;
pub mod reduce;
pub mod stage;

pub use accumulate::accumulate_cells;
pub use finalize::finalize_cells;
pub use launch::{Launcher, Pass};
pub use reduce::{ReductionSession, ThermoElement, reduce_elements};
pub use stage::{stage_cells, stage_range};
