//! `CellThermoCompute`: the per-step pipeline over one sub-domain.
//!
//! ```text
//! accumulate ─▶ [fold ghosts] ─▶ finalize ─▶ [mirror ghosts]
//!                                   │
//!                                   └─▶ stage (owned cells) ─▶ reduce ─▶ [allreduce]
//! ```
//!
//! Bracketed steps only run for decomposed axes. Each step is a full pass
//! over its cells and returns before the next one starts.

use crate::algs::accumulate::accumulate_cells;
use crate::algs::finalize::finalize_cells;
use crate::algs::launch::{Launcher, Pass};
use crate::algs::reduce::{ReductionSession, ThermoElement};
use crate::algs::stage::stage_range;
use crate::comm::allreduce::allreduce_thermo;
use crate::comm::communicator::{CommTag, Communicator};
use crate::config::ThermoConfig;
use crate::data::cell_data::{CellEnergy, CellThermoArrays, CellVelocity};
use crate::data::particles::{CellList, ParticleSet};
use crate::data::scalar::Scalar;
use crate::grid::topology::{Axis, GridTopology};
use crate::halo::exchange::{AxisNeighbors, fold_ghosts, mirror_ghosts};
use crate::halo::pack_op::{Accumulate, EnergyPack, Overwrite, VelocityMassPack};
use crate::thermo_error::ThermoError;

/// System-wide thermodynamic summary.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GlobalThermo {
    pub momentum: [f64; 3],
    pub kinetic_energy: f64,
    /// Sum of the temperatures of `valid_cells` cells.
    pub temperature_sum: f64,
    pub valid_cells: u64,
}

impl From<ThermoElement> for GlobalThermo {
    fn from(e: ThermoElement) -> Self {
        Self {
            momentum: e.momentum,
            kinetic_energy: e.energy,
            temperature_sum: e.temperature,
            valid_cells: e.valid,
        }
    }
}

impl GlobalThermo {
    /// Mean over cells with a defined temperature; `None` if there are none.
    pub fn mean_temperature(&self) -> Option<f64> {
        (self.valid_cells > 0).then(|| self.temperature_sum / self.valid_cells as f64)
    }

    /// Center-of-mass velocity of the whole system.
    pub fn net_velocity(&self, total_mass: f64) -> Option<[f64; 3]> {
        (total_mass > 0.0).then(|| {
            [
                self.momentum[0] / total_mass,
                self.momentum[1] / total_mass,
                self.momentum[2] / total_mass,
            ]
        })
    }
}

/// Per-cell thermodynamics of one sub-domain.
#[derive(Debug)]
pub struct CellThermoCompute<S> {
    config: ThermoConfig,
    launcher: Launcher,
    topology: GridTopology,
    arrays: CellThermoArrays<S>,
}

impl<S: Scalar> CellThermoCompute<S> {
    /// Validate `config` and allocate the per-cell arrays for `topology`.
    pub fn new(topology: GridTopology, config: ThermoConfig) -> Result<Self, ThermoError> {
        config.validate()?;
        let launcher = config.launcher()?;
        let arrays = CellThermoArrays::allocate(topology.num_cells())?;
        Ok(Self {
            config,
            launcher,
            topology,
            arrays,
        })
    }

    /// Replace the launcher (e.g. to share one pool between computes).
    pub fn with_launcher(mut self, launcher: Launcher) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn config(&self) -> &ThermoConfig {
        &self.config
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    pub fn velocities(&self) -> &[CellVelocity<S>] {
        self.arrays.velocity()
    }

    pub fn energies(&self) -> &[CellEnergy<S>] {
        self.arrays.energy()
    }

    /// Mutable access to both per-cell arrays, e.g. for a custom exchange.
    pub fn cells_mut(&mut self) -> (&mut [CellVelocity<S>], &mut [CellEnergy<S>]) {
        self.arrays.split_mut()
    }

    /// Pass 1: raw sums.
    pub fn accumulate(&mut self, particles: &ParticleSet<'_, S>, cells: &CellList) -> Result<(), ThermoError> {
        let block = self.config.block(Pass::Accumulate);
        let (vel, en) = self.arrays.split_mut();
        accumulate_cells(&self.launcher, block, particles, cells, vel, en)
    }

    /// Pass 2: averages and temperature.
    pub fn finalize(&mut self) -> Result<(), ThermoError> {
        let block = self.config.block(Pass::Finalize);
        let dims = self.config.dimensions;
        let (vel, en) = self.arrays.split_mut();
        finalize_cells(&self.launcher, block, dims, vel, en)
    }

    /// Both passes of a serial (or already complete) grid.
    pub fn compute(&mut self, particles: &ParticleSet<'_, S>, cells: &CellList) -> Result<(), ThermoError> {
        self.accumulate(particles, cells)?;
        self.finalize()
    }

    /// Add ghost-cell raw sums into the neighbours' boundary cells.
    /// Must run between [`accumulate`](Self::accumulate) and [`finalize`](Self::finalize).
    pub fn fold_halos<C: Communicator>(
        &mut self,
        comm: &C,
        neighbors: [AxisNeighbors; 3],
        tag: CommTag,
    ) -> Result<(), ThermoError> {
        self.exchange_all(comm, neighbors, tag, true)
    }

    /// Overwrite ghost cells with the neighbours' finalized boundary cells.
    pub fn mirror_halos<C: Communicator>(
        &mut self,
        comm: &C,
        neighbors: [AxisNeighbors; 3],
        tag: CommTag,
    ) -> Result<(), ThermoError> {
        self.exchange_all(comm, neighbors, tag, false)
    }

    fn exchange_all<C: Communicator>(
        &mut self,
        comm: &C,
        neighbors: [AxisNeighbors; 3],
        tag: CommTag,
        fold: bool,
    ) -> Result<(), ThermoError> {
        let block = self.config.block(Pass::Pack);
        let topo = self.topology;
        let launcher = &self.launcher;
        let (vel, en) = self.arrays.split_mut();
        for axis in Axis::ALL {
            let nbrs = neighbors[axis.index()];
            // two tags per observable, two observables per axis
            let base = tag.offset(4 * axis.index() as u16);
            if fold {
                fold_ghosts::<_, VelocityMassPack<Accumulate>, _>(launcher, block, comm, &topo, axis, nbrs, base, vel)?;
                fold_ghosts::<_, EnergyPack<Accumulate>, _>(launcher, block, comm, &topo, axis, nbrs, base.offset(2), en)?;
            } else {
                mirror_ghosts::<_, VelocityMassPack<Overwrite>, _>(launcher, block, comm, &topo, axis, nbrs, base, vel)?;
                mirror_ghosts::<_, EnergyPack<Overwrite>, _>(launcher, block, comm, &topo, axis, nbrs, base.offset(2), en)?;
            }
        }
        Ok(())
    }

    /// Full distributed step: accumulate, fold ghosts, finalize, mirror ghosts.
    pub fn compute_distributed<C: Communicator>(
        &mut self,
        particles: &ParticleSet<'_, S>,
        cells: &CellList,
        comm: &C,
        neighbors: [AxisNeighbors; 3],
        tag: CommTag,
    ) -> Result<(), ThermoError> {
        self.accumulate(particles, cells)?;
        self.fold_halos(comm, neighbors, tag)?;
        self.finalize()?;
        self.mirror_halos(comm, neighbors, tag.offset(12))
    }

    /// Stage the owned cells into additive elements.
    pub fn stage(&self) -> Result<Vec<ThermoElement>, ThermoError> {
        stage_range(
            &self.launcher,
            self.config.block(Pass::Stage),
            &self.topology.indexer(),
            &self.topology.local_range(),
            self.arrays.velocity(),
            self.arrays.energy(),
        )
    }

    /// Sum of the owned cells of this sub-domain.
    pub fn reduce(&self) -> Result<ThermoElement, ThermoError> {
        let staged = self.stage()?;
        let session = ReductionSession::new(&self.launcher, staged.len(), self.config.block(Pass::Reduce))?;
        let mut scratch = vec![0u8; session.scratch_bytes()];
        session.execute(&self.launcher, &staged, &mut scratch)
    }

    /// Summary of this sub-domain alone.
    pub fn global_thermo(&self) -> Result<GlobalThermo, ThermoError> {
        self.reduce().map(GlobalThermo::from)
    }

    /// Summary over all `n_ranks` sub-domains.
    pub fn global_thermo_across<C: Communicator>(
        &self,
        comm: &C,
        my_rank: usize,
        n_ranks: usize,
        tag: CommTag,
    ) -> Result<GlobalThermo, ThermoError> {
        let local = self.reduce()?;
        allreduce_thermo(comm, my_rank, n_ranks, tag, local).map(GlobalThermo::from)
    }
}
