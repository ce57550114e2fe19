#![cfg_attr(docsrs, feature(doc_cfg))]
//! # cell-thermo
//!
//! cell-thermo computes per-cell thermodynamic observables (center-of-mass
//! velocity, kinetic energy, temperature) for particles binned into a regular
//! grid, and aggregates them locally and across a domain-decomposed volume.
//!
//! ## Pipeline
//! 1. [`algs::accumulate`]: raw per-cell sums of momentum, mass and kinetic
//!    energy over native and embedded particles.
//! 2. [`algs::finalize`]: center-of-mass velocity and equipartition
//!    temperature, with zero-by-convention for empty and single-particle cells.
//! 3. [`halo`]: generic pack/unpack of boundary slabs, parametrized by a
//!    [`PackOp`](halo::PackOp) strategy, plus a per-axis exchange driver over a
//!    pluggable [`Communicator`](comm::Communicator).
//! 4. [`algs::stage`] and [`algs::reduce`]: additive [`ThermoElement`]s and a
//!    two-phase (size query, then execute) sum reduction.
//!
//! [`compute::CellThermoCompute`] wires these together for one sub-domain.
//!
//! ## Determinism
//!
//! Per-cell passes are deterministic. The reduction sums groups in parallel,
//! so totals may differ in the last bits between group sizes or thread
//! counts; cross-domain sums are combined in rank order so every rank sees the
//! same value.
//!
//! ## Usage
//! ```rust
//! use cell_thermo::prelude::*;
//!
//! let velocities = vec![[1.0f64, 0.0, 0.0], [-1.0, 0.0, 0.0]];
//! let particles = ParticleSet::native(&velocities, 1.0);
//! let topology = GridTopology::serial([1, 1, 1]).unwrap();
//! let cells = CellList::from_lists(&particles, &[[0u32, 1]]).unwrap();
//!
//! let mut thermo = CellThermoCompute::<f64>::new(topology, ThermoConfig::default()).unwrap();
//! thermo.compute(&particles, &cells).unwrap();
//! let summary = thermo.global_thermo().unwrap();
//! assert_eq!(summary.valid_cells, 1);
//! assert!((summary.mean_temperature().unwrap() - 2.0 / 3.0).abs() < 1e-12);
//! ```

pub mod algs;
pub mod comm;
pub mod compute;
pub mod config;
pub mod data;
pub mod debug_invariants;
pub mod grid;
pub mod halo;
pub mod thermo_error;

pub use algs::reduce::ThermoElement;
pub use debug_invariants::DebugInvariants;
pub use thermo_error::ThermoError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::launch::{Launcher, Pass};
    pub use crate::algs::reduce::{ReductionSession, ThermoElement};
    pub use crate::comm::communicator::{CommTag, Communicator, LocalComm, NoComm};
    pub use crate::compute::{CellThermoCompute, GlobalThermo};
    pub use crate::config::{Dimensionality, ThermoConfig};
    pub use crate::data::cell_data::{CellEnergy, CellVelocity};
    pub use crate::data::particles::{CellList, EmbeddedParticles, ParticleRef, ParticleSet};
    pub use crate::data::scalar::Scalar;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::grid::indexer::{CellIndexer, CellRange};
    pub use crate::grid::topology::{Axis, GridTopology, HaloRanges};
    pub use crate::halo::exchange::AxisNeighbors;
    pub use crate::halo::pack_op::{
        Accumulate, AddPack, CopyPack, EnergyPack, MergeRule, Overwrite, PackOp, VelocityMassPack,
    };
    pub use crate::thermo_error::ThermoError;
}
