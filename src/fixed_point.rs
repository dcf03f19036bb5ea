//! Signed 64-bit fixed-point arithmetic.
//!
//! A real number $`r`$ is represented by the integer $`\lfloor r \cdot 2^N \rfloor`$ where `N` is the
//! number of fractional bits, fixed at compile time through a const generic.
//! Products are computed in 128 bits and truncated back with an arithmetic shift,
//! so results round toward negative infinity. Overflow wraps, like the additive shares that carry them.

use clap::ValueEnum;
use std::fmt::Display;

/// Number of fractional bits used by the demo binary and benchmarks.
pub const DEFAULT_SCALE: usize = 16;

/// Empirically tuned bias compensation, in fixed-point units per set fractional bit of the OT
/// receiver's operand. See [fractional_weight].
pub const FIXED_POINT_COMPENSATION: f64 = 0.3;

/// `a * b` truncated by `N` fractional bits.
#[inline]
pub fn mul<const N: usize>(a: i64, b: i64) -> i64 {
    debug_assert!(N < 64);
    let res = (a as i128) * (b as i128);
    (res >> N) as i64
}

/// `x * 2^k` in the truncated fixed-point domain, i.e. `mul::<N>(x, 1 << k)`.
///
/// For `k = 63` the multiplier is `i64::MIN`, the two's-complement weight of the sign bit.
#[inline]
pub fn scaled_shift<const N: usize>(x: i64, k: usize) -> i64 {
    debug_assert!(k < 64);
    mul::<N>(x, 1i64 << k)
}

/// Compensation added to a product share whose OT choice word had `weight` set fractional bits.
#[inline]
pub fn compensation(constant: f64, weight: u32) -> i64 {
    (constant * weight as f64) as i64
}

/// Set bits of `y` below bit `N`.
///
/// Only these bits lose anything when `x * 2^i` is truncated by `N` bits: for `i >= N` the term is
/// an exact integer.
#[inline]
pub fn fractional_weight<const N: usize>(y: i64) -> u32 {
    debug_assert!(N < 64);
    let mask = (1u64 << N) - 1;
    (y as u64 & mask).count_ones()
}

/// Encode a float as fixed-point.
pub fn to_fixed<const N: usize>(x: f64) -> i64 {
    (x * (1u64 << N) as f64) as i64
}

/// Decode a fixed-point value.
pub fn from_fixed<const N: usize>(x: i64) -> f64 {
    x as f64 / (1u64 << N) as f64
}

/// Element kinds a caller may ask a triplet generator for.
#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Signed 64-bit fixed-point. The only supported kind.
    I64,
    /// Signed 32-bit integers.
    I32,
    /// Unsigned 64-bit integers.
    U64,
    /// IEEE double.
    F64,
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::I64 => write!(f, "i64"),
            ElementKind::I32 => write!(f, "i32"),
            ElementKind::U64 => write!(f, "u64"),
            ElementKind::F64 => write!(f, "f64"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i64 {}
}

/// Element types triplets can be produced for.
///
/// This trait is sealed: signed 64-bit fixed-point is the only representation the
/// product engine knows how to decompose into bits.
pub trait FixedPointElement: sealed::Sealed + Copy + Default + std::fmt::Debug + Send + 'static {
    /// Runtime tag of this element type.
    const KIND: ElementKind;

    /// Wrap a raw fixed-point word.
    fn from_raw(raw: i64) -> Self;

    /// The raw fixed-point word.
    fn into_raw(self) -> i64;
}

impl FixedPointElement for i64 {
    const KIND: ElementKind = ElementKind::I64;

    #[inline]
    fn from_raw(raw: i64) -> Self {
        raw
    }

    #[inline]
    fn into_raw(self) -> i64 {
        self
    }
}
