//! Two-phase global sum of staged [`ThermoElement`]s.
//!
//! The reduction never allocates scratch memory itself. A
//! [`ReductionSession`] first reports how many scratch bytes it needs
//! ([`scratch_bytes`](ReductionSession::scratch_bytes)); the caller owns that
//! buffer and hands it to [`execute`](ReductionSession::execute), which
//! writes one partial sum per worker group into it and then sums the
//! partials.
//!
//! Summation is associative and commutative only up to floating-point
//! rounding: regrouping (a different group size, a different thread count)
//! may change the last bits of the result.

use std::mem::size_of;
use std::ops::{Add, AddAssign};

use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;

use crate::algs::launch::{Launcher, Pass};
use crate::thermo_error::ThermoError;

/// Additive per-cell summary used by staging and reduction.
///
/// After a reduction, `temperature` is a *sum* of per-cell temperatures and
/// `valid` counts the cells that contributed a real measurement; divide the
/// former by the latter for a mean.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable, serde::Serialize, serde::Deserialize)]
pub struct ThermoElement {
    pub momentum: [f64; 3],
    pub energy: f64,
    pub temperature: f64,
    pub valid: u64,
}

static_assertions::assert_eq_size!(ThermoElement, [u64; 6]);

impl Add for ThermoElement {
    type Output = ThermoElement;

    #[inline]
    fn add(mut self, rhs: ThermoElement) -> ThermoElement {
        self += rhs;
        self
    }
}

impl AddAssign for ThermoElement {
    #[inline]
    fn add_assign(&mut self, rhs: ThermoElement) {
        self.momentum[0] += rhs.momentum[0];
        self.momentum[1] += rhs.momentum[1];
        self.momentum[2] += rhs.momentum[2];
        self.energy += rhs.energy;
        self.temperature += rhs.temperature;
        self.valid += rhs.valid;
    }
}

impl std::iter::Sum for ThermoElement {
    fn sum<I: Iterator<Item = ThermoElement>>(iter: I) -> Self {
        iter.fold(ThermoElement::default(), Add::add)
    }
}

/// Sizing handle for one reduction over `num_items` staged elements.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReductionSession {
    num_items: usize,
    block: usize,
}

impl ReductionSession {
    /// Plan a reduction; `block_size` is clamped to the launcher's limit.
    pub fn new(launcher: &Launcher, num_items: usize, block_size: usize) -> Result<Self, ThermoError> {
        let block = launcher.clamp_block(Pass::Reduce, block_size)?;
        let session = Self { num_items, block };
        log::debug!(
            "reduction of {num_items} elements: {} groups, {} scratch bytes",
            session.num_groups(),
            session.scratch_bytes()
        );
        Ok(session)
    }

    #[inline]
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block
    }

    #[inline]
    fn num_groups(&self) -> usize {
        self.num_items.div_ceil(self.block)
    }

    /// Phase one: scratch bytes [`execute`](Self::execute) needs.
    #[inline]
    pub fn scratch_bytes(&self) -> usize {
        self.num_groups() * size_of::<ThermoElement>()
    }

    /// Phase two: sum `input` using caller-provided `scratch`.
    ///
    /// `scratch` needs no particular alignment; partials are written and
    /// read back byte-wise.
    pub fn execute(
        &self,
        launcher: &Launcher,
        input: &[ThermoElement],
        scratch: &mut [u8],
    ) -> Result<ThermoElement, ThermoError> {
        if input.len() != self.num_items {
            return Err(ThermoError::LengthMismatch {
                what: "staged elements",
                expected: self.num_items,
                found: input.len(),
            });
        }
        let required = self.scratch_bytes();
        if scratch.len() < required {
            return Err(ThermoError::ScratchTooSmall {
                required,
                found: scratch.len(),
            });
        }
        let partials = &mut scratch[..required];
        let block = self.block;
        let elem = size_of::<ThermoElement>();

        launcher.run(Pass::Reduce, || {
            partials
                .par_chunks_mut(elem)
                .zip(input.par_chunks(block))
                .for_each(|(slot, group)| {
                    let partial: ThermoElement = group.iter().copied().sum();
                    slot.copy_from_slice(bytemuck::bytes_of(&partial));
                });
            partials
                .chunks_exact(elem)
                .map(bytemuck::pod_read_unaligned::<ThermoElement>)
                .sum()
        })
    }
}

/// Convenience wrapper running both phases with a freshly allocated scratch buffer.
pub fn reduce_elements(
    launcher: &Launcher,
    block_size: usize,
    input: &[ThermoElement],
) -> Result<ThermoElement, ThermoError> {
    let session = ReductionSession::new(launcher, input.len(), block_size)?;
    let mut scratch = vec![0u8; session.scratch_bytes()];
    session.execute(launcher, input, &mut scratch)
}
