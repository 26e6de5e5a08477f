//! Two-dimensional fixed-point vectors with allocation-free arithmetic.
//!
//! Binary operations write into an explicit `out` parameter so per-tick code
//! can reuse storage. The `*_in_place` variants cover the case where the
//! output aliases an input. [`Vector2::to_boxed`] is the only operation that
//! allocates and must stay out of the per-tick hot path.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fixed::{DomainError, Fixed};

/// Mutable pair of fixed-point components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector2 {
    /// Horizontal component.
    pub x: Fixed,
    /// Vertical component.
    pub y: Fixed,
}

impl Vector2 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(Fixed::ZERO, Fixed::ZERO);

    /// Creates a vector from its components.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Overwrites both components.
    pub fn set(&mut self, x: Fixed, y: Fixed) -> &mut Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Overwrites both components with those of `other`.
    pub fn copy_from(&mut self, other: &Vector2) -> &mut Self {
        self.x = other.x;
        self.y = other.y;
        self
    }

    /// Copies the vector onto the heap.
    ///
    /// This is the only allocating operation; never call it while ticking.
    #[must_use]
    pub fn to_boxed(&self) -> Box<Vector2> {
        Box::new(*self)
    }

    /// Writes `a + b` into `out`.
    pub fn add(out: &mut Vector2, a: &Vector2, b: &Vector2) {
        out.x = a.x.add(b.x);
        out.y = a.y.add(b.y);
    }

    /// Writes `a - b` into `out`.
    pub fn sub(out: &mut Vector2, a: &Vector2, b: &Vector2) {
        out.x = a.x.sub(b.x);
        out.y = a.y.sub(b.y);
    }

    /// Writes `v * scalar` into `out`.
    pub fn mul(out: &mut Vector2, v: &Vector2, scalar: Fixed) {
        out.x = v.x.mul(scalar);
        out.y = v.y.mul(scalar);
    }

    /// Writes `v / scalar` into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DivisionByZero`] when `scalar` is zero; `out` is
    /// left untouched.
    pub fn div(out: &mut Vector2, v: &Vector2, scalar: Fixed) -> Result<(), DomainError> {
        let x = v.x.div(scalar)?;
        let y = v.y.div(scalar)?;
        out.x = x;
        out.y = y;
        Ok(())
    }

    /// Adds `other` to this vector.
    pub fn add_in_place(&mut self, other: &Vector2) -> &mut Self {
        self.x = self.x.add(other.x);
        self.y = self.y.add(other.y);
        self
    }

    /// Subtracts `other` from this vector.
    pub fn sub_in_place(&mut self, other: &Vector2) -> &mut Self {
        self.x = self.x.sub(other.x);
        self.y = self.y.sub(other.y);
        self
    }

    /// Scales this vector by `scalar`.
    pub fn mul_in_place(&mut self, scalar: Fixed) -> &mut Self {
        self.x = self.x.mul(scalar);
        self.y = self.y.mul(scalar);
        self
    }

    /// Divides this vector by `scalar`.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::DivisionByZero`] when `scalar` is zero; the
    /// vector is left untouched.
    pub fn div_in_place(&mut self, scalar: Fixed) -> Result<&mut Self, DomainError> {
        let source = *self;
        Vector2::div(self, &source, scalar)?;
        Ok(self)
    }

    /// Squared length.
    #[must_use]
    pub fn length_sqr(&self) -> Fixed {
        self.dot(self)
    }

    /// Length, computed through [`Fixed::sqrt`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NegativeSqrt`] when the squared length wrapped
    /// negative because the vector exceeds the representable range.
    pub fn length(&self) -> Result<Fixed, DomainError> {
        self.length_sqr().sqrt()
    }

    /// Squared distance between two points.
    #[must_use]
    pub fn distance_sqr(a: &Vector2, b: &Vector2) -> Fixed {
        let dx = a.x.sub(b.x);
        let dy = a.y.sub(b.y);
        dx.mul(dx).add(dy.mul(dy))
    }

    /// Distance between two points.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NegativeSqrt`] when the squared distance wrapped
    /// negative.
    pub fn distance(a: &Vector2, b: &Vector2) -> Result<Fixed, DomainError> {
        Vector2::distance_sqr(a, b).sqrt()
    }

    /// Dot product.
    #[must_use]
    pub fn dot(&self, other: &Vector2) -> Fixed {
        self.x.mul(other.x).add(self.y.mul(other.y))
    }

    /// Z component of the 3D cross product.
    #[must_use]
    pub fn cross(&self, other: &Vector2) -> Fixed {
        self.x.mul(other.y).sub(self.y.mul(other.x))
    }

    /// Scales the vector to unit length.
    ///
    /// A zero-length vector is left unchanged.
    ///
    /// # Errors
    ///
    /// Propagates [`DomainError`] from the length computation.
    pub fn normalize(&mut self) -> Result<&mut Self, DomainError> {
        let length = self.length()?;
        if length.is_zero() {
            return Ok(self);
        }
        self.div_in_place(length)
    }
}

impl fmt::Display for Vector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x.to_float(), self.y.to_float())
    }
}
