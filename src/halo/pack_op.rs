//! PackOp trait: how one per-cell quantity travels through a halo buffer

use std::marker::PhantomData;
use std::ops::AddAssign;

use bytemuck::Pod;

use crate::data::cell_data::{CellEnergy, CellVelocity};
use crate::data::scalar::Scalar;

/// *PackOp* encapsulates extraction & merging for a per-cell value `V`.
pub trait PackOp<V>: Sized {
    /// Wire format of one cell's quantity.
    type Element: Pod + Send + Sync;

    /// Extract the part of `v` that goes into the buffer.
    fn pack(v: &V) -> Self::Element;

    /// Merge a received element into the local value.
    fn unpack(local: &mut V, incoming: Self::Element);
}

/// Identity op for plain-data values (received copy overwrites local).
#[derive(Copy, Clone, Debug, Default)]
pub struct CopyPack;

impl<V: Pod + Send + Sync> PackOp<V> for CopyPack {
    type Element = V;
    #[inline]
    fn pack(v: &V) -> V {
        *v
    }
    #[inline]
    fn unpack(local: &mut V, incoming: V) {
        *local = incoming;
    }
}

/// Additive op for partial sums split across domains.
#[derive(Copy, Clone, Debug, Default)]
pub struct AddPack;

impl<V> PackOp<V> for AddPack
where
    V: Pod + AddAssign + Send + Sync,
{
    type Element = V;
    #[inline]
    fn pack(v: &V) -> V {
        *v
    }
    #[inline]
    fn unpack(local: &mut V, incoming: V) {
        *local += incoming;
    }
}

/// How a received component combines with the local one.
pub trait MergeRule: Send + Sync + 'static {
    fn merge<S: Scalar>(local: &mut S, incoming: S);
    fn merge_count(local: &mut u32, incoming: u32);
}

/// Received value replaces the local one (ghost mirroring).
#[derive(Copy, Clone, Debug, Default)]
pub struct Overwrite;

impl MergeRule for Overwrite {
    #[inline]
    fn merge<S: Scalar>(local: &mut S, incoming: S) {
        *local = incoming;
    }
    #[inline]
    fn merge_count(local: &mut u32, incoming: u32) {
        *local = incoming;
    }
}

/// Received value is added to the local one (folding partial sums).
#[derive(Copy, Clone, Debug, Default)]
pub struct Accumulate;

impl MergeRule for Accumulate {
    #[inline]
    fn merge<S: Scalar>(local: &mut S, incoming: S) {
        *local = *local + incoming;
    }
    #[inline]
    fn merge_count(local: &mut u32, incoming: u32) {
        *local += incoming;
    }
}

/// Velocity (or raw momentum) plus mass as four scalars.
///
/// With [`Accumulate`] this folds raw sums from the accumulate pass; adding
/// averaged velocities is meaningless.
#[derive(Copy, Clone, Debug, Default)]
pub struct VelocityMassPack<R = Overwrite>(PhantomData<R>);

impl<S: Scalar, R: MergeRule> PackOp<CellVelocity<S>> for VelocityMassPack<R> {
    type Element = [S; 4];
    #[inline]
    fn pack(v: &CellVelocity<S>) -> [S; 4] {
        [v.velocity[0], v.velocity[1], v.velocity[2], v.mass]
    }
    #[inline]
    fn unpack(local: &mut CellVelocity<S>, incoming: [S; 4]) {
        R::merge(&mut local.velocity[0], incoming[0]);
        R::merge(&mut local.velocity[1], incoming[1]);
        R::merge(&mut local.velocity[2], incoming[2]);
        R::merge(&mut local.mass, incoming[3]);
    }
}

/// Energy, temperature and particle count as three scalars.
///
/// The count travels as its bit pattern in the third slot, so it is exact for
/// every `u32` in both storage precisions.
#[derive(Copy, Clone, Debug, Default)]
pub struct EnergyPack<R = Overwrite>(PhantomData<R>);

impl<S: Scalar, R: MergeRule> PackOp<CellEnergy<S>> for EnergyPack<R> {
    type Element = [S; 3];
    #[inline]
    fn pack(e: &CellEnergy<S>) -> [S; 3] {
        [e.energy, e.temperature, S::from_count_bits(e.count)]
    }
    #[inline]
    fn unpack(local: &mut CellEnergy<S>, incoming: [S; 3]) {
        R::merge(&mut local.energy, incoming[0]);
        R::merge(&mut local.temperature, incoming[1]);
        R::merge_count(&mut local.count, incoming[2].count_bits());
    }
}
