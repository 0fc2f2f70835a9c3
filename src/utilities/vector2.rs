use crate::utilities::math_helper::{self, Real, ZERO};
use std::ops::{Add, Mul, Neg, Sub};

/// Two component fixed-point vector. Used for impulses expressed in a tangent plane basis.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vector2 {
    pub x: Real,
    pub y: Real,
}

impl Vector2 {
    pub const ZERO: Self = Self::new(ZERO, ZERO);

    #[inline(always)]
    pub const fn new(x: Real, y: Real) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn dot(self, other: Self) -> Real {
        math_helper::safe_mul(self.x, other.x).saturating_add(math_helper::safe_mul(self.y, other.y))
    }

    #[inline(always)]
    pub fn length_squared(self) -> Real {
        self.dot(self)
    }

    pub fn length(self) -> Real {
        let length_squared = self.length_squared();
        if length_squared < Real::MAX {
            return math_helper::sqrt(length_squared);
        }
        let largest = math_helper::max(self.x.abs(), self.y.abs());
        let unit = Self::new(self.x / largest, self.y / largest);
        math_helper::safe_mul(largest, math_helper::sqrt(unit.length_squared()))
    }

    /// Scales the vector down so its length does not exceed `maximum_length`.
    pub fn clamp_length(self, maximum_length: Real) -> Self {
        if self.length_squared() <= math_helper::safe_mul(maximum_length, maximum_length) {
            return self;
        }
        match math_helper::checked_div(maximum_length, self.length()) {
            Some(scale) => self * scale,
            None => Self::ZERO,
        }
    }
}

impl Add for Vector2 {
    type Output = Self;

    #[inline(always)]
    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<Real> for Vector2 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, scalar: Real) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::math_helper::from_int;
    use approx::assert_abs_diff_eq;

    #[test]
    fn clamp_length_scales_long_vectors() {
        let v = Vector2::new(from_int(3), from_int(4));
        let clamped = v.clamp_length(from_int(1));
        assert_abs_diff_eq!(clamped.length().to_num::<f64>(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(clamped.x.to_num::<f64>(), 0.6, epsilon = 1e-6);
        assert_eq!(v.clamp_length(from_int(10)), v);
        assert_eq!(v.clamp_length(ZERO), Vector2::ZERO);
    }

    #[test]
    fn clamp_length_saturates_instead_of_overflowing() {
        let v = Vector2::new(from_int(-120_000), from_int(50_000));
        assert_abs_diff_eq!(v.length().to_num::<f64>(), 130_000.0, epsilon = 1e-3);
        let clamped = v.clamp_length(from_int(13));
        assert_abs_diff_eq!(clamped.x.to_num::<f64>(), -12.0, epsilon = 1e-4);
        assert_abs_diff_eq!(clamped.y.to_num::<f64>(), 5.0, epsilon = 1e-4);
    }
}
