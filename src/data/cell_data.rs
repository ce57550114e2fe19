//! Per-cell observables and the arrays that hold them.
//!
//! Between the accumulate and finalize passes these types carry raw sums
//! (momentum in `velocity`, kinetic energy in `energy`); afterwards they carry
//! averages. The arrays are allocated once per grid and overwritten each step.

use crate::data::scalar::Scalar;
use crate::thermo_error::ThermoError;

/// Velocity (or momentum, before finalizing) and total mass of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CellVelocity<S> {
    pub velocity: [S; 3],
    pub mass: S,
}

impl<S: Scalar> CellVelocity<S> {
    pub fn new(velocity: [S; 3], mass: S) -> Self {
        Self { velocity, mass }
    }

    /// A velocity is only measured in cells that hold mass.
    #[inline]
    pub fn has_velocity(&self) -> bool {
        self.mass > S::zero()
    }
}

/// Kinetic energy, temperature and particle count of a cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CellEnergy<S> {
    pub energy: S,
    pub temperature: S,
    pub count: u32,
}

impl<S: Scalar> CellEnergy<S> {
    pub fn new(energy: S, temperature: S, count: u32) -> Self {
        Self {
            energy,
            temperature,
            count,
        }
    }

    /// Temperature needs at least two particles to define a fluctuation;
    /// below that the stored zero is a placeholder, not a measurement.
    #[inline]
    pub fn has_temperature(&self) -> bool {
        self.count > 1
    }
}

/// Parallel per-cell arrays for one grid.
#[derive(Clone, Debug)]
pub struct CellThermoArrays<S> {
    velocity: Vec<CellVelocity<S>>,
    energy: Vec<CellEnergy<S>>,
}

impl<S: Scalar> CellThermoArrays<S> {
    /// Allocate zeroed arrays for `num_cells` cells.
    ///
    /// Allocation failure is reported instead of aborting the process.
    pub fn allocate(num_cells: usize) -> Result<Self, ThermoError> {
        let velocity = zeroed_vec::<CellVelocity<S>>(num_cells, "cell velocity array")?;
        let energy = zeroed_vec::<CellEnergy<S>>(num_cells, "cell energy array")?;
        log::debug!("allocated thermo arrays for {num_cells} cells");
        Ok(Self { velocity, energy })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.velocity.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.velocity.is_empty()
    }

    #[inline]
    pub fn velocity(&self) -> &[CellVelocity<S>] {
        &self.velocity
    }

    #[inline]
    pub fn energy(&self) -> &[CellEnergy<S>] {
        &self.energy
    }

    /// Mutable access to both arrays at once.
    #[inline]
    pub fn split_mut(&mut self) -> (&mut [CellVelocity<S>], &mut [CellEnergy<S>]) {
        (&mut self.velocity, &mut self.energy)
    }
}

fn zeroed_vec<T: Default + Clone>(len: usize, what: &'static str) -> Result<Vec<T>, ThermoError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ThermoError::Allocation {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    v.resize(len, T::default());
    Ok(v)
}
