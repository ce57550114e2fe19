//! First pass: raw per-cell sums of momentum, mass and kinetic energy.
//!
//! Each cell is reduced by exactly one logical worker that only reads the
//! particles of its own cell, so workers write disjoint outputs and need no
//! synchronization. Sums are carried in `f64` regardless of the storage
//! precision, since a cell may hold many particles.

use rayon::prelude::*;

use crate::algs::launch::{Launcher, Pass};
use crate::data::cell_data::{CellEnergy, CellVelocity};
use crate::data::particles::{CellList, ParticleSet};
use crate::data::scalar::{Scalar, narrow3, norm2, widen3};
use crate::thermo_error::ThermoError;

/// Raw sums of one cell, before narrowing to storage precision.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) struct CellSums {
    pub momentum: [f64; 3],
    pub mass: f64,
    pub kinetic: f64,
    pub count: u32,
}

pub(crate) fn sum_cell<S: Scalar>(particles: &ParticleSet<'_, S>, cells: &CellList, cell: usize) -> CellSums {
    let mut sums = CellSums::default();
    for &p in cells.cell(cell) {
        let (v, m) = particles.kinematics(p);
        let v = widen3(v);
        let m = m.widen();
        sums.momentum[0] += m * v[0];
        sums.momentum[1] += m * v[1];
        sums.momentum[2] += m * v[2];
        sums.mass += m;
        sums.kinetic += 0.5 * m * norm2(v);
    }
    sums.count = cells.count(cell);
    sums
}

/// Accumulate every cell of `cells` into `velocity` (momentum + mass) and
/// `energy` (kinetic energy sum, zero temperature, particle count).
///
/// Cells without particles come out all-zero. Both output slices must have
/// one entry per cell of the list.
pub fn accumulate_cells<S: Scalar>(
    launcher: &Launcher,
    block_size: usize,
    particles: &ParticleSet<'_, S>,
    cells: &CellList,
    velocity: &mut [CellVelocity<S>],
    energy: &mut [CellEnergy<S>],
) -> Result<(), ThermoError> {
    cells.check_matches(particles)?;
    check_len("cell velocity array", cells.num_cells(), velocity.len())?;
    check_len("cell energy array", cells.num_cells(), energy.len())?;
    let block = launcher.clamp_block(Pass::Accumulate, block_size)?;

    launcher.run(Pass::Accumulate, || {
        velocity
            .par_chunks_mut(block)
            .zip(energy.par_chunks_mut(block))
            .enumerate()
            .for_each(|(group, (vs, es))| {
                let first = group * block;
                for (k, (v, e)) in vs.iter_mut().zip(es.iter_mut()).enumerate() {
                    let sums = sum_cell(particles, cells, first + k);
                    *v = CellVelocity::new(narrow3(sums.momentum), S::narrow(sums.mass));
                    *e = CellEnergy::new(S::narrow(sums.kinetic), S::zero(), sums.count);
                }
            });
    })
}

pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), ThermoError> {
    if expected != found {
        return Err(ThermoError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}
