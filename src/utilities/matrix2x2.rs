use crate::utilities::math_helper::{self, Real, ONE, ZERO};
use crate::utilities::vector2::Vector2;

/// 2 row, 2 column matrix. Vectors are treated as columns.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Matrix2x2 {
    /// First row of the matrix.
    pub x: Vector2,
    /// Second row of the matrix.
    pub y: Vector2,
}

impl Matrix2x2 {
    pub const ZERO: Self = Self::from_rows(Vector2::ZERO, Vector2::ZERO);
    pub const IDENTITY: Self = Self::from_rows(Vector2::new(ONE, ZERO), Vector2::new(ZERO, ONE));

    #[inline(always)]
    pub const fn from_rows(x: Vector2, y: Vector2) -> Self {
        Self { x, y }
    }

    #[inline(always)]
    pub fn determinant(self) -> Real {
        self.x.x * self.y.y - self.x.y * self.y.x
    }

    /// Adds a value to each diagonal element.
    #[inline(always)]
    pub fn add_diagonal(self, value: Real) -> Self {
        Self::from_rows(
            Vector2::new(self.x.x + value, self.x.y),
            Vector2::new(self.y.x, self.y.y + value),
        )
    }

    /// Computes `M * v`.
    #[inline(always)]
    pub fn transform(self, v: Vector2) -> Vector2 {
        Vector2::new(self.x.dot(v), self.y.dot(v))
    }

    /// Inverts the matrix. Returns `None` when the determinant is within epsilon of zero.
    pub fn invert(self) -> Option<Self> {
        let inverse_determinant = math_helper::checked_div(ONE, self.determinant())?;
        Some(Self::from_rows(
            Vector2::new(self.y.y * inverse_determinant, -self.x.y * inverse_determinant),
            Vector2::new(-self.y.x * inverse_determinant, self.x.x * inverse_determinant),
        ))
    }

    /// Inverts the matrix, falling back to the zero matrix when it is singular.
    #[inline(always)]
    pub fn invert_or_zero(self) -> Self {
        self.invert().unwrap_or(Self::ZERO)
    }
}
