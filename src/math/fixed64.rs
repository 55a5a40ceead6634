//! Wide 32.32 fixed-point value used for all opinion math
//!
//! Every operation is pure integer arithmetic, so results are bit-identical
//! on every platform. Floating point is accepted only through
//! [`Fixed64::from_f64`], which exists for data loading and must never be
//! called from a simulation step.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::core::error::FixedPointError;
use crate::math::fixed::Fixed32;

/// Newton-Raphson steps for `sqrt`. Enough for a full 64-bit root from an
/// initial guess within a factor of two.
const SQRT_ITERATIONS: u32 = 8;

/// Signed 32.32 fixed-point number stored in an `i64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed64(i64);

impl Fixed64 {
    pub const FRAC_BITS: u32 = 32;
    pub const ZERO: Fixed64 = Fixed64(0);
    pub const ONE: Fixed64 = Fixed64(1 << 32);
    pub const HALF: Fixed64 = Fixed64(1 << 31);
    pub const MAX: Fixed64 = Fixed64(i64::MAX);
    pub const MIN: Fixed64 = Fixed64(i64::MIN);

    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn from_int(value: i32) -> Self {
        Self((value as i64) << Self::FRAC_BITS)
    }

    /// `numerator / denominator` computed exactly in integer space
    pub fn from_fraction(numerator: i64, denominator: i64) -> Result<Self, FixedPointError> {
        if denominator == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        let raw = ((numerator as i128) << Self::FRAC_BITS) / denominator as i128;
        Ok(Self(saturate(raw)))
    }

    /// Load-time conversion from a float (config files, scenario data).
    ///
    /// The conversion is one-way: there is no way back to `f64`, so a
    /// simulation value can never round-trip through floating point.
    pub fn from_f64(value: f64) -> Self {
        let scaled = (value * (1u64 << Self::FRAC_BITS) as f64).round();
        if scaled >= i64::MAX as f64 {
            Self::MAX
        } else if scaled <= i64::MIN as f64 {
            Self::MIN
        } else {
            Self(scaled as i64)
        }
    }

    /// Integer part, rounded toward negative infinity
    #[inline]
    pub const fn to_int(self) -> i32 {
        (self.0 >> Self::FRAC_BITS) as i32
    }

    /// Nearest integer, halves rounded up
    pub fn round_to_int(self) -> i32 {
        (self.0.saturating_add(Self::HALF.0) >> Self::FRAC_BITS) as i32
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn signum(self) -> i32 {
        self.0.signum() as i32
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Product, or `None` if it does not fit in 32.32
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let wide = (self.0 as i128 * rhs.0 as i128) >> Self::FRAC_BITS;
        i64::try_from(wide).ok().map(Self)
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, FixedPointError> {
        if rhs.0 == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        let wide = ((self.0 as i128) << Self::FRAC_BITS) / rhs.0 as i128;
        Ok(Self(saturate(wide)))
    }

    /// Multiply by an integer ratio without an intermediate 32.32 rounding
    pub fn mul_ratio(self, numerator: i64, denominator: i64) -> Result<Self, FixedPointError> {
        if denominator == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        let wide = self.0 as i128 * numerator as i128 / denominator as i128;
        Ok(Self(saturate(wide)))
    }

    /// Linear interpolation `a + (b - a) * t`
    pub fn lerp(a: Self, b: Self, t: Self) -> Self {
        a.saturating_add((b.saturating_sub(a)) * t)
    }

    /// Square root with a fixed Newton-Raphson step count.
    ///
    /// Non-positive inputs return zero.
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        // sqrt(raw / 2^32) * 2^32 == sqrt(raw * 2^32)
        let n = (self.0 as u128) << Self::FRAC_BITS;
        Self(isqrt_u128(n) as i64)
    }

    /// Lossy narrowing to 16.16: drops the low 16 fractional bits and
    /// saturates the integer part to the `i16` range.
    pub fn to_fixed32_truncating(self) -> Fixed32 {
        let shifted = self.0 >> (Self::FRAC_BITS - Fixed32::FRAC_BITS);
        let clamped = shifted.clamp(i32::MIN as i64, i32::MAX as i64);
        Fixed32::from_raw(clamped as i32)
    }

    /// Fixed-width little-endian encoding
    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self(i64::from_le_bytes(bytes))
    }
}

/// Integer square root: floor(sqrt(n)), fixed iteration count.
fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    let bits = 128 - n.leading_zeros();
    // 2^ceil(bits/2) is always >= sqrt(n), so Newton descends monotonically
    let mut x: u128 = 1 << bits.div_ceil(2);
    for _ in 0..SQRT_ITERATIONS {
        let next = (x + n / x) >> 1;
        if next < x {
            x = next;
        }
    }
    x
}

#[inline]
fn saturate(wide: i128) -> i64 {
    wide.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl From<Fixed32> for Fixed64 {
    /// Lossless widen from 16.16
    fn from(value: Fixed32) -> Self {
        Self((value.raw() as i64) << (Self::FRAC_BITS - Fixed32::FRAC_BITS))
    }
}

impl Add for Fixed64 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed64 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed64 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed64 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed64 {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul for Fixed64 {
    type Output = Self;
    /// Widening multiply; saturates instead of wrapping on overflow
    fn mul(self, rhs: Self) -> Self {
        let wide = (self.0 as i128 * rhs.0 as i128) >> Self::FRAC_BITS;
        Self(saturate(wide))
    }
}

impl Div for Fixed64 {
    type Output = Self;
    /// Panics on division by zero, like primitive integer division.
    /// Use [`Fixed64::checked_div`] to get a `FixedPointError` instead.
    fn div(self, rhs: Self) -> Self {
        match self.checked_div(rhs) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl std::iter::Sum for Fixed64 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Fixed64::saturating_add)
    }
}

impl std::fmt::Display for Fixed64 {
    /// Four decimal places, computed in integer space
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let negative = self.0 < 0;
        let magnitude = (self.0 as i128).unsigned_abs();
        let int_part = magnitude >> Self::FRAC_BITS;
        let frac = magnitude & ((1u128 << Self::FRAC_BITS) - 1);
        let decimals = (frac * 10_000) >> Self::FRAC_BITS;
        write!(f, "{}{}.{:04}", if negative { "-" } else { "" }, int_part, decimals)
    }
}
