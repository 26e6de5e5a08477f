//! Q16.16 fixed-point numbers with explicit 32-bit wrapping semantics.

use std::{
    fmt,
    ops::{Add, Mul, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional bits carried by a [`Fixed`] value.
pub const FRACTIONAL_BITS: u32 = 16;

const ONE_RAW: i32 = 1 << FRACTIONAL_BITS;
const ONE_F64: f64 = ONE_RAW as f64;
const WRAP_MODULUS: f64 = 4_294_967_296.0;

/// Misuse of a fixed-point operation that has no meaningful result.
///
/// These errors indicate a logic defect in the caller and must be propagated
/// rather than coerced into a fallback value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The divisor of a fixed-point division was zero.
    #[error("fixed-point division of {dividend} by zero")]
    DivisionByZero {
        /// Dividend supplied to the failed division.
        dividend: Fixed,
    },
    /// The operand of a fixed-point square root was negative.
    #[error("square root of negative fixed-point value {value}")]
    NegativeSqrt {
        /// Operand supplied to the failed square root.
        value: Fixed,
    },
}

/// Signed Q16.16 fixed-point number backed by an `i32`.
///
/// The low 16 bits hold the fraction, giving a range of roughly
/// `[-32768.0, 32767.99998]` with a resolution of `1 / 65536`. Every
/// arithmetic operation wraps at the 32-bit boundary exactly like
/// two's-complement integer overflow; nothing is silently widened.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// The value `0.0`.
    pub const ZERO: Self = Self(0);
    /// The value `1.0`.
    pub const ONE: Self = Self(ONE_RAW);
    /// The value `0.5`.
    pub const HALF: Self = Self(1 << (FRACTIONAL_BITS - 1));
    /// π scaled by 65536 and truncated.
    pub const PI: Self = Self(205_887);
    /// Largest representable value.
    pub const MAX: Self = Self(i32::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i32::MIN);

    /// Wraps a raw Q16.16 bit pattern.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Retrieves the raw Q16.16 bit pattern.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Converts a whole number, wrapping when it exceeds the integer range.
    #[must_use]
    pub const fn from_int(value: i32) -> Self {
        Self(value.wrapping_shl(FRACTIONAL_BITS))
    }

    /// Integer part of the value, rounded toward negative infinity.
    #[must_use]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACTIONAL_BITS
    }

    /// Converts a real number, rounding to nearest with ties toward positive
    /// infinity and wrapping into the 32-bit range.
    ///
    /// Non-finite inputs map to zero.
    #[must_use]
    pub fn from_float(value: f64) -> Self {
        let scaled = value * ONE_F64;
        if !scaled.is_finite() {
            return Self::ZERO;
        }

        // Adding 0.5 before flooring would round the sum itself, so compare
        // the exact fractional part instead.
        let floor = scaled.floor();
        let rounded = if scaled - floor >= 0.5 {
            floor + 1.0
        } else {
            floor
        };

        // `rem_euclid` is exact for integral operands and lands in [0, 2^32).
        let wrapped = rounded.rem_euclid(WRAP_MODULUS);
        Self(wrapped as u32 as i32)
    }

    /// Converts the value into a real number by exact division by 65536.
    #[must_use]
    pub fn to_float(self) -> f64 {
        f64::from(self.0) / ONE_F64
    }

    /// Wrapping addition.
    #[must_use]
    pub const fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }

    /// Wrapping subtraction.
    #[must_use]
    pub const fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }

    /// Multiplies through a 64-bit intermediate, truncating toward zero before
    /// wrapping back into 32 bits.
    #[must_use]
    pub const fn mul(self, rhs: Self) -> Self {
        let product = self.0 as i64 * rhs.0 as i64;
        Self((product / ONE_RAW as i64) as i32)
    }

    /// Divides through a 64-bit intermediate, truncating toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DivisionByZero`] when `rhs` is zero.
    pub const fn div(self, rhs: Self) -> Result<Self, DomainError> {
        if rhs.0 == 0 {
            return Err(DomainError::DivisionByZero { dividend: self });
        }
        let scaled = self.0 as i64 * ONE_RAW as i64;
        Ok(Self((scaled / rhs.0 as i64) as i32))
    }

    /// Square root computed through `f64` and truncated toward zero.
    ///
    /// This is the only operation that routes through native floating point.
    /// IEEE-754 square root is correctly rounded, so the result is still
    /// reproducible on every conforming host.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NegativeSqrt`] when the operand is negative.
    pub fn sqrt(self) -> Result<Self, DomainError> {
        if self.0 < 0 {
            return Err(DomainError::NegativeSqrt { value: self });
        }
        let root = self.to_float().sqrt() * ONE_F64;
        Ok(Self(root.trunc() as i32))
    }

    /// Absolute value; `MIN` wraps to itself.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    /// Smaller of the two values.
    #[must_use]
    pub const fn min(self, other: Self) -> Self {
        if self.0 < other.0 {
            self
        } else {
            other
        }
    }

    /// Larger of the two values.
    #[must_use]
    pub const fn max(self, other: Self) -> Self {
        if self.0 > other.0 {
            self
        } else {
            other
        }
    }

    /// Reports whether the value is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Fixed::add(self, rhs)
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Fixed::sub(self, rhs)
    }
}

impl Mul for Fixed {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Fixed::mul(self, rhs)
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.wrapping_neg())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_float())
    }
}
