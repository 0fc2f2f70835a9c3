use crate::utilities::math_helper::{self, Real, ONE, ZERO};
use crate::utilities::quaternion::Quaternion;
use crate::utilities::vector3::Vector3;
use std::ops::{Add, Mul, Sub};

/// 3 row, 3 column matrix. Vectors are treated as columns: `m.transform(v)` is `M * v`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Matrix3x3 {
    /// First row of the matrix.
    pub x: Vector3,
    /// Second row of the matrix.
    pub y: Vector3,
    /// Third row of the matrix.
    pub z: Vector3,
}

impl Matrix3x3 {
    /// Matrix with every element set to zero.
    pub const ZERO: Self = Self::from_rows(Vector3::ZERO, Vector3::ZERO, Vector3::ZERO);
    /// The 3x3 identity matrix.
    pub const IDENTITY: Self = Self::from_rows(Vector3::UNIT_X, Vector3::UNIT_Y, Vector3::UNIT_Z);

    #[inline(always)]
    pub const fn from_rows(x: Vector3, y: Vector3, z: Vector3) -> Self {
        Self { x, y, z }
    }

    /// Creates a diagonal matrix.
    #[inline(always)]
    pub const fn from_diagonal(diagonal: Vector3) -> Self {
        Self::from_rows(
            Vector3::new(diagonal.x, ZERO, ZERO),
            Vector3::new(ZERO, diagonal.y, ZERO),
            Vector3::new(ZERO, ZERO, diagonal.z),
        )
    }

    /// Creates a matrix with `value` on the diagonal.
    #[inline(always)]
    pub const fn from_scalar(value: Real) -> Self {
        Self::from_diagonal(Vector3::splat(value))
    }

    /// Scales the components of a matrix by a scalar.
    #[inline(always)]
    pub fn scale(self, scale: Real) -> Self {
        Self::from_rows(self.x * scale, self.y * scale, self.z * scale)
    }

    /// Adds a value to each diagonal element.
    #[inline(always)]
    pub fn add_diagonal(self, value: Real) -> Self {
        let mut result = self;
        result.x.x += value;
        result.y.y += value;
        result.z.z += value;
        result
    }

    #[inline(always)]
    pub fn transpose(self) -> Self {
        Self::from_rows(
            Vector3::new(self.x.x, self.y.x, self.z.x),
            Vector3::new(self.x.y, self.y.y, self.z.y),
            Vector3::new(self.x.z, self.y.z, self.z.z),
        )
    }

    /// Computes the determinant of the matrix.
    #[inline(always)]
    pub fn determinant(self) -> Real {
        self.x.dot(self.y.cross(self.z))
    }

    /// Computes `M * v`.
    #[inline(always)]
    pub fn transform(self, v: Vector3) -> Vector3 {
        Vector3::new(self.x.dot(v), self.y.dot(v), self.z.dot(v))
    }

    /// Computes `transpose(M) * v`.
    #[inline(always)]
    pub fn transform_transpose(self, v: Vector3) -> Vector3 {
        self.x * v.x + self.y * v.y + self.z * v.z
    }

    /// Computes `a * b`.
    #[inline(always)]
    pub fn multiply(a: Self, b: Self) -> Self {
        Self::from_rows(
            b.transform_transpose(a.x),
            b.transform_transpose(a.y),
            b.transform_transpose(a.z),
        )
    }

    /// Computes `a * transpose(b)`.
    #[inline(always)]
    pub fn multiply_transposed(a: Self, b: Self) -> Self {
        Self::from_rows(b.transform(a.x), b.transform(a.y), b.transform(a.z))
    }

    /// Creates a rotation matrix from a unit quaternion.
    #[inline(always)]
    pub fn from_quaternion(q: Quaternion) -> Self {
        let qx2 = q.x + q.x;
        let qy2 = q.y + q.y;
        let qz2 = q.z + q.z;
        let xx = qx2 * q.x;
        let yy = qy2 * q.y;
        let zz = qz2 * q.z;
        let xy = qx2 * q.y;
        let xz = qx2 * q.z;
        let xw = qx2 * q.w;
        let yz = qy2 * q.z;
        let yw = qy2 * q.w;
        let zw = qz2 * q.w;
        Self::from_rows(
            Vector3::new(ONE - yy - zz, xy - zw, xz + yw),
            Vector3::new(xy + zw, ONE - xx - zz, yz - xw),
            Vector3::new(xz - yw, yz + xw, ONE - xx - yy),
        )
    }

    /// Creates the skew symmetric matrix `S(v)` such that `S(v) * u == v x u`.
    #[inline(always)]
    pub fn create_cross_product(v: Vector3) -> Self {
        Self::from_rows(
            Vector3::new(ZERO, -v.z, v.y),
            Vector3::new(v.z, ZERO, -v.x),
            Vector3::new(-v.y, v.x, ZERO),
        )
    }

    /// Computes `R * M * transpose(R)`, the change of basis used for inertia tensors.
    #[inline(always)]
    pub fn rotation_sandwich(rotation: Self, m: Self) -> Self {
        Self::multiply_transposed(Self::multiply(rotation, m), rotation)
    }

    /// Inverts the matrix with Gauss-Jordan elimination and partial pivoting.
    ///
    /// Returns `None` if a pivot falls within epsilon of zero.
    pub fn invert(self) -> Option<Self> {
        let mut left = self.to_array();
        let mut right = Self::IDENTITY.to_array();
        for column in 0..3 {
            let mut pivot_row = column;
            for row in (column + 1)..3 {
                if left[row][column].abs() > left[pivot_row][column].abs() {
                    pivot_row = row;
                }
            }
            left.swap(column, pivot_row);
            right.swap(column, pivot_row);

            let inverse_pivot = math_helper::checked_div(ONE, left[column][column])?;
            for k in 0..3 {
                left[column][k] *= inverse_pivot;
                right[column][k] *= inverse_pivot;
            }
            for row in 0..3 {
                if row == column {
                    continue;
                }
                let factor = left[row][column];
                if factor == ZERO {
                    continue;
                }
                for k in 0..3 {
                    left[row][k] -= factor * left[column][k];
                    right[row][k] -= factor * right[column][k];
                }
            }
        }
        Some(Self::from_array(right))
    }

    /// Inverts the matrix, falling back to the zero matrix when it is singular.
    #[inline(always)]
    pub fn invert_or_zero(self) -> Self {
        self.invert().unwrap_or(Self::ZERO)
    }

    /// Checks that the matrix is symmetric within a tolerance.
    pub fn is_symmetric(self, tolerance: Real) -> bool {
        (self.x.y - self.y.x).abs() <= tolerance
            && (self.x.z - self.z.x).abs() <= tolerance
            && (self.y.z - self.z.y).abs() <= tolerance
    }

    #[inline(always)]
    fn to_array(self) -> [[Real; 3]; 3] {
        [
            [self.x.x, self.x.y, self.x.z],
            [self.y.x, self.y.y, self.y.z],
            [self.z.x, self.z.y, self.z.z],
        ]
    }

    #[inline(always)]
    fn from_array(m: [[Real; 3]; 3]) -> Self {
        Self::from_rows(
            Vector3::new(m[0][0], m[0][1], m[0][2]),
            Vector3::new(m[1][0], m[1][1], m[1][2]),
            Vector3::new(m[2][0], m[2][1], m[2][2]),
        )
    }
}

impl Add for Matrix3x3 {
    type Output = Self;

    #[inline(always)]
    fn add(self, other: Self) -> Self::Output {
        Self::from_rows(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for Matrix3x3 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, other: Self) -> Self::Output {
        Self::from_rows(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl Mul for Matrix3x3 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, other: Self) -> Self::Output {
        Self::multiply(self, other)
    }
}

impl Mul<Vector3> for Matrix3x3 {
    type Output = Vector3;

    #[inline(always)]
    fn mul(self, v: Vector3) -> Self::Output {
        self.transform(v)
    }
}
