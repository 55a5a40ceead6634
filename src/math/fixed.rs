//! Compact 16.16 fixed-point value for low-precision fields

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

use crate::core::error::FixedPointError;

const SQRT_ITERATIONS: u32 = 6;

/// Signed 16.16 fixed-point number stored in an `i32`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed32(i32);

impl Fixed32 {
    pub const FRAC_BITS: u32 = 16;
    pub const ZERO: Fixed32 = Fixed32(0);
    pub const ONE: Fixed32 = Fixed32(1 << 16);
    pub const HALF: Fixed32 = Fixed32(1 << 15);
    pub const MAX: Fixed32 = Fixed32(i32::MAX);
    pub const MIN: Fixed32 = Fixed32(i32::MIN);

    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn from_int(value: i16) -> Self {
        Self((value as i32) << Self::FRAC_BITS)
    }

    /// Load-time only, see [`crate::math::Fixed64::from_f64`]
    pub fn from_f32(value: f32) -> Self {
        let scaled = (value as f64 * (1u32 << Self::FRAC_BITS) as f64).round();
        Self(scaled.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
    }

    #[inline]
    pub const fn to_int(self) -> i16 {
        (self.0 >> Self::FRAC_BITS) as i16
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, FixedPointError> {
        if rhs.0 == 0 {
            return Err(FixedPointError::DivisionByZero);
        }
        let wide = ((self.0 as i64) << Self::FRAC_BITS) / rhs.0 as i64;
        Ok(Self(saturate(wide)))
    }

    pub fn lerp(a: Self, b: Self, t: Self) -> Self {
        a.saturating_add((b.saturating_sub(a)) * t)
    }

    /// Square root with a fixed Newton-Raphson step count; non-positive
    /// inputs return zero
    pub fn sqrt(self) -> Self {
        if self.0 <= 0 {
            return Self::ZERO;
        }
        let n = (self.0 as u64) << Self::FRAC_BITS;
        let bits = 64 - n.leading_zeros();
        let mut x: u64 = 1 << bits.div_ceil(2);
        for _ in 0..SQRT_ITERATIONS {
            let next = (x + n / x) >> 1;
            if next < x {
                x = next;
            }
        }
        Self(x as i32)
    }

    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(i32::from_le_bytes(bytes))
    }
}

#[inline]
fn saturate(wide: i64) -> i32 {
    wide.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

impl Add for Fixed32 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed32 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed32 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed32 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed32 {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul for Fixed32 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        let wide = (self.0 as i64 * rhs.0 as i64) >> Self::FRAC_BITS;
        Self(saturate(wide))
    }
}

impl Div for Fixed32 {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        match self.checked_div(rhs) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }
}

impl std::fmt::Display for Fixed32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let negative = self.0 < 0;
        let magnitude = (self.0 as i64).unsigned_abs();
        let int_part = magnitude >> Self::FRAC_BITS;
        let decimals = ((magnitude & 0xFFFF) * 10_000) >> Self::FRAC_BITS;
        write!(f, "{}{}.{:04}", if negative { "-" } else { "" }, int_part, decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        let a = Fixed32::from_int(6);
        let b = Fixed32::from_int(4);
        assert_eq!(a + b, Fixed32::from_int(10));
        assert_eq!(a - b, Fixed32::from_int(2));
        assert_eq!(a * b, Fixed32::from_int(24));
        assert_eq!(a / b, Fixed32::from_raw(3 << 15));
        assert_eq!(-a, Fixed32::from_int(-6));
    }

    #[test]
    fn test_checked_div_by_zero() {
        assert_eq!(
            Fixed32::ONE.checked_div(Fixed32::ZERO),
            Err(FixedPointError::DivisionByZero)
        );
    }

    #[test]
    fn test_mul_saturates() {
        let big = Fixed32::from_int(i16::MAX);
        assert_eq!(big * big, Fixed32::MAX);
    }

    #[test]
    fn test_sqrt() {
        assert_eq!(Fixed32::from_int(9).sqrt(), Fixed32::from_int(3));
        assert_eq!(Fixed32::from_int(-1).sqrt(), Fixed32::ZERO);
    }

    #[test]
    fn test_lerp_and_clamp() {
        let mid = Fixed32::lerp(Fixed32::ZERO, Fixed32::from_int(10), Fixed32::HALF);
        assert_eq!(mid, Fixed32::from_int(5));
        assert_eq!(
            Fixed32::from_int(20).clamp(Fixed32::ZERO, Fixed32::from_int(10)),
            Fixed32::from_int(10)
        );
    }

    #[test]
    fn test_bytes_and_display() {
        let v = Fixed32::from_f32(-1.25);
        assert_eq!(Fixed32::from_le_bytes(v.to_le_bytes()), v);
        assert_eq!(v.to_string(), "-1.2500");
    }
}
