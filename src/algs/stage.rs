//! Staging: finalized cells back to additive [`ThermoElement`]s.
//!
//! Averages do not sum; momenta do. Staging multiplies the center-of-mass
//! velocity by the cell mass again, copies the (already extensive) kinetic
//! energy, and flags the cells whose temperature is a real measurement.
//! Only the requested range is staged, typically the owned cells, so ghost
//! copies are not counted twice.

use rayon::prelude::*;

use crate::algs::accumulate::check_len;
use crate::algs::launch::{Launcher, Pass};
use crate::algs::reduce::ThermoElement;
use crate::data::cell_data::{CellEnergy, CellVelocity};
use crate::data::scalar::Scalar;
use crate::grid::indexer::{CellIndexer, CellRange};
use crate::thermo_error::ThermoError;

#[inline]
pub(crate) fn stage_cell<S: Scalar>(v: &CellVelocity<S>, e: &CellEnergy<S>) -> ThermoElement {
    let mass = v.mass.widen();
    let valid = e.has_temperature();
    ThermoElement {
        momentum: [
            mass * v.velocity[0].widen(),
            mass * v.velocity[1].widen(),
            mass * v.velocity[2].widen(),
        ],
        energy: e.energy.widen(),
        temperature: if valid { e.temperature.widen() } else { 0.0 },
        valid: valid as u64,
    }
}

/// Stage every cell of `range` (slot order) into `out`.
#[allow(clippy::too_many_arguments)]
pub fn stage_cells<S: Scalar>(
    launcher: &Launcher,
    block_size: usize,
    grid: &CellIndexer,
    range: &CellRange,
    velocity: &[CellVelocity<S>],
    energy: &[CellEnergy<S>],
    out: &mut [ThermoElement],
) -> Result<(), ThermoError> {
    check_len("cell velocity array", grid.num_cells(), velocity.len())?;
    check_len("cell energy array", grid.num_cells(), energy.len())?;
    check_len("staging buffer", range.len(), out.len())?;
    if !range.fits_in(grid) {
        return Err(ThermoError::RangeOutOfGrid {
            range: range.to_string(),
            dims: grid.dims(),
        });
    }
    let block = launcher.clamp_block(Pass::Stage, block_size)?;

    launcher.run(Pass::Stage, || {
        out.par_chunks_mut(block).enumerate().for_each(|(group, slots)| {
            let first = group * block;
            for (k, slot) in slots.iter_mut().enumerate() {
                let cell = grid.index(range.coords_of(first + k));
                *slot = stage_cell(&velocity[cell], &energy[cell]);
            }
        });
    })
}

/// Allocate and fill a staging buffer for `range`.
pub fn stage_range<S: Scalar>(
    launcher: &Launcher,
    block_size: usize,
    grid: &CellIndexer,
    range: &CellRange,
    velocity: &[CellVelocity<S>],
    energy: &[CellEnergy<S>],
) -> Result<Vec<ThermoElement>, ThermoError> {
    let mut out = vec![ThermoElement::default(); range.len()];
    stage_cells(launcher, block_size, grid, range, velocity, energy, &mut out)?;
    Ok(out)
}
