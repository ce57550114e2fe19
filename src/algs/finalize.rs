//! Second pass: averages and equipartition temperature per cell.
//!
//! Input is the output of [`accumulate_cells`](crate::algs::accumulate::accumulate_cells);
//! output overwrites it in place:
//! - `velocity = momentum / mass` when the cell holds mass, else zero;
//! - `T = 2 (KE - KE_com) / (dof (n - 1))` when `n > 1`, else zero,
//!   with `KE_com = 0.5 * mass * |v_com|^2`.

use rayon::prelude::*;

use crate::algs::accumulate::check_len;
use crate::algs::launch::{Launcher, Pass};
use crate::config::Dimensionality;
use crate::data::cell_data::{CellEnergy, CellVelocity};
use crate::data::scalar::{Scalar, narrow3, norm2, widen3};
use crate::thermo_error::ThermoError;

#[inline]
pub(crate) fn finalize_cell<S: Scalar>(dof: f64, v: &mut CellVelocity<S>, e: &mut CellEnergy<S>) {
    let mass = v.mass.widen();
    let mut vel = [0.0; 3];
    if mass > 0.0 {
        let p = widen3(v.velocity);
        vel = [p[0] / mass, p[1] / mass, p[2] / mass];
    }
    v.velocity = narrow3(vel);

    let mut temperature = 0.0;
    if e.count > 1 {
        let ke_com = 0.5 * mass * norm2(vel);
        temperature = 2.0 * (e.energy.widen() - ke_com) / (dof * (e.count - 1) as f64);
    }
    e.temperature = S::narrow(temperature);
}

/// Convert raw sums into center-of-mass velocity and temperature.
pub fn finalize_cells<S: Scalar>(
    launcher: &Launcher,
    block_size: usize,
    dimensions: Dimensionality,
    velocity: &mut [CellVelocity<S>],
    energy: &mut [CellEnergy<S>],
) -> Result<(), ThermoError> {
    check_len("cell energy array", velocity.len(), energy.len())?;
    let block = launcher.clamp_block(Pass::Finalize, block_size)?;
    let dof = dimensions.degrees_of_freedom();

    launcher.run(Pass::Finalize, || {
        velocity
            .par_chunks_mut(block)
            .zip(energy.par_chunks_mut(block))
            .for_each(|(vs, es)| {
                for (v, e) in vs.iter_mut().zip(es.iter_mut()) {
                    finalize_cell(dof, v, e);
                }
            });
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(v: CellVelocity<f64>, e: CellEnergy<f64>, dim: Dimensionality) -> (CellVelocity<f64>, CellEnergy<f64>) {
        let mut vs = vec![v];
        let mut es = vec![e];
        finalize_cells(&Launcher::global(), 32, dim, &mut vs, &mut es).unwrap();
        (vs[0], es[0])
    }

    #[test]
    fn massless_cell_stays_zero() {
        let (v, e) = run(CellVelocity::default(), CellEnergy::default(), Dimensionality::Three);
        assert_eq!(v.velocity, [0.0; 3]);
        assert_eq!(e.temperature, 0.0);
    }

    #[test]
    fn single_particle_has_no_temperature() {
        // m = 2, v = (1, 2, 3): momentum (2, 4, 6), ke = 14
        let (v, e) = run(
            CellVelocity::new([2.0, 4.0, 6.0], 2.0),
            CellEnergy::new(14.0, 0.0, 1),
            Dimensionality::Three,
        );
        assert_eq!(v.velocity, [1.0, 2.0, 3.0]);
        assert_eq!(e.temperature, 0.0);
        assert_eq!(e.energy, 14.0);
    }

    #[test]
    fn bulk_motion_is_subtracted() {
        // two particles m = 1 with v = (2, 0, 0) and (0, 0, 0):
        // momentum 2, mass 2, v_com 1, ke 2, ke_com 1 -> T = 2 * 1 / (2 * 1)
        let (v, e) = run(
            CellVelocity::new([2.0, 0.0, 0.0], 2.0),
            CellEnergy::new(2.0, 0.0, 2),
            Dimensionality::Two,
        );
        assert_eq!(v.velocity, [1.0, 0.0, 0.0]);
        assert!((e.temperature - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_arrays_error() {
        let mut vs = vec![CellVelocity::<f32>::default(); 2];
        let mut es = vec![CellEnergy::<f32>::default(); 1];
        assert!(finalize_cells(&Launcher::global(), 4, Dimensionality::Three, &mut vs, &mut es).is_err());
    }
}
