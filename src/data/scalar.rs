//! Storage precision for per-cell and per-particle data.
//!
//! Arrays may be stored in `f32` or `f64`; every accumulation is carried out
//! in `f64` and narrowed only when written back.

use std::fmt::Debug;

use bytemuck::Pod;
use num_traits::Float;

/// Floating-point storage type of particle and cell arrays.
pub trait Scalar: Float + Pod + Default + Debug + Send + Sync + 'static {
    /// Lossless promotion to the accumulation precision.
    fn widen(self) -> f64;
    /// Rounding conversion back to storage precision.
    fn narrow(v: f64) -> Self;
    /// Carry a count in a scalar slot as its bit pattern (not its value).
    fn from_count_bits(count: u32) -> Self;
    /// Inverse of [`from_count_bits`](Self::from_count_bits).
    fn count_bits(self) -> u32;
}

impl Scalar for f32 {
    #[inline]
    fn widen(self) -> f64 {
        self as f64
    }
    #[inline]
    fn narrow(v: f64) -> Self {
        v as f32
    }
    #[inline]
    fn from_count_bits(count: u32) -> Self {
        bytemuck::cast(count)
    }
    #[inline]
    fn count_bits(self) -> u32 {
        bytemuck::cast(self)
    }
}

impl Scalar for f64 {
    #[inline]
    fn widen(self) -> f64 {
        self
    }
    #[inline]
    fn narrow(v: f64) -> Self {
        v
    }
    #[inline]
    fn from_count_bits(count: u32) -> Self {
        f64::from_bits(u64::from(count))
    }
    #[inline]
    fn count_bits(self) -> u32 {
        // the upper half is zero for anything built by from_count_bits
        self.to_bits() as u32
    }
}

#[inline]
pub(crate) fn widen3<S: Scalar>(v: [S; 3]) -> [f64; 3] {
    [v[0].widen(), v[1].widen(), v[2].widen()]
}

#[inline]
pub(crate) fn narrow3<S: Scalar>(v: [f64; 3]) -> [S; 3] {
    [S::narrow(v[0]), S::narrow(v[1]), S::narrow(v[2])]
}

#[inline]
pub(crate) fn norm2(v: [f64; 3]) -> f64 {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2]
}
