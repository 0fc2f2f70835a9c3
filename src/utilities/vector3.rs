use crate::utilities::math_helper::{self, Real, EPSILON_SQUARED_LENGTH, ONE, ZERO};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Three component fixed-point vector.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vector3 {
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

impl Vector3 {
    /// Vector with all components set to zero.
    pub const ZERO: Self = Self::new(ZERO, ZERO, ZERO);
    /// Unit vector along the X axis.
    pub const UNIT_X: Self = Self::new(ONE, ZERO, ZERO);
    /// Unit vector along the Y axis.
    pub const UNIT_Y: Self = Self::new(ZERO, ONE, ZERO);
    /// Unit vector along the Z axis.
    pub const UNIT_Z: Self = Self::new(ZERO, ZERO, ONE);

    /// Constructs a new `Vector3`.
    #[inline(always)]
    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z }
    }

    /// Constructs a vector with every component set to the same value.
    #[inline(always)]
    pub const fn splat(value: Real) -> Self {
        Self::new(value, value, value)
    }

    /// Constructs a vector from integer components.
    #[inline(always)]
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(
            math_helper::from_int(x),
            math_helper::from_int(y),
            math_helper::from_int(z),
        )
    }

    /// Computes the dot product of two vectors, saturating instead of overflowing.
    #[inline(always)]
    pub fn dot(self, other: Self) -> Real {
        math_helper::safe_mul(self.x, other.x)
            .saturating_add(math_helper::safe_mul(self.y, other.y))
            .saturating_add(math_helper::safe_mul(self.z, other.z))
    }

    /// Computes the cross product of two vectors.
    #[inline(always)]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Scales the vector by a scalar.
    #[inline(always)]
    pub fn scale(self, scale: Real) -> Self {
        Self::new(self.x * scale, self.y * scale, self.z * scale)
    }

    #[inline(always)]
    pub fn length_squared(self) -> Real {
        self.dot(self)
    }

    /// Length of the vector. Stays exact for vectors whose squared length saturates.
    pub fn length(self) -> Real {
        let length_squared = self.length_squared();
        if length_squared < Real::MAX {
            return math_helper::sqrt(length_squared);
        }
        // The largest component is at least sqrt(MAX / 3) here.
        let largest = math_helper::max(math_helper::max(self.x.abs(), self.y.abs()), self.z.abs());
        let unit = Self::new(self.x / largest, self.y / largest, self.z / largest);
        math_helper::safe_mul(largest, math_helper::sqrt(unit.length_squared()))
    }

    /// Sum of the absolute values of the components.
    #[inline(always)]
    pub fn abs_sum(self) -> Real {
        self.x.abs() + self.y.abs() + self.z.abs()
    }

    #[inline(always)]
    pub fn distance(self, other: Self) -> Real {
        (self - other).length()
    }

    /// Normalizes the vector, returning `None` if it is too short to have a stable direction.
    #[inline(always)]
    pub fn try_normalize(self) -> Option<Self> {
        if self.length_squared() < EPSILON_SQUARED_LENGTH {
            return None;
        }
        let inverse_length = math_helper::checked_div(ONE, self.length())?;
        Some(self.scale(inverse_length))
    }

    #[inline(always)]
    pub fn normalize_or_zero(self) -> Self {
        self.try_normalize().unwrap_or(Self::ZERO)
    }

    /// Scales the vector down so its length does not exceed `maximum_length`.
    pub fn clamp_length(self, maximum_length: Real) -> Self {
        if self.length_squared() <= math_helper::safe_mul(maximum_length, maximum_length) {
            return self;
        }
        match math_helper::checked_div(maximum_length, self.length()) {
            Some(scale) => self.scale(scale),
            None => Self::ZERO,
        }
    }

    /// Builds an arbitrary unit vector perpendicular to a unit vector.
    pub fn any_perpendicular(self) -> Self {
        // Cross with whichever basis axis is least aligned to keep the result well conditioned.
        let axis = if self.x.abs() < self.y.abs() {
            if self.x.abs() < self.z.abs() {
                Self::UNIT_X
            } else {
                Self::UNIT_Z
            }
        } else if self.y.abs() < self.z.abs() {
            Self::UNIT_Y
        } else {
            Self::UNIT_Z
        };
        self.cross(axis).normalize_or_zero()
    }

    /// Converts to a host float vector.
    #[inline(always)]
    pub fn to_glam(self) -> glam::Vec3 {
        glam::Vec3::new(
            math_helper::to_f32(self.x),
            math_helper::to_f32(self.y),
            math_helper::to_f32(self.z),
        )
    }

    /// Converts from a host float vector. Only meant for initialization at the host boundary.
    #[inline(always)]
    pub fn from_glam(v: glam::Vec3) -> Self {
        Self::new(
            math_helper::from_f32(v.x),
            math_helper::from_f32(v.y),
            math_helper::from_f32(v.z),
        )
    }
}

impl Add for Vector3 {
    type Output = Self;

    #[inline(always)]
    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Vector3 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Neg for Vector3 {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<Real> for Vector3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, scalar: Real) -> Self::Output {
        self.scale(scalar)
    }
}

impl AddAssign for Vector3 {
    #[inline(always)]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl SubAssign for Vector3 {
    #[inline(always)]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl MulAssign<Real> for Vector3 {
    #[inline(always)]
    fn mul_assign(&mut self, scalar: Real) {
        *self = self.scale(scalar);
    }
}

impl std::fmt::Display for Vector3 {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.z)
    }
}
