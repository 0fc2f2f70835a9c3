use crate::utilities::math_helper::{self, Real, EPSILON_SQUARED_LENGTH, HALF, ONE, ZERO};
use crate::utilities::vector3::Vector3;

/// Fixed-point rotation quaternion. Orientations are expected to stay unit length.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Quaternion {
    pub x: Real,
    pub y: Real,
    pub z: Real,
    pub w: Real,
}

impl Default for Quaternion {
    #[inline(always)]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    /// Quaternion representing no rotation.
    pub const IDENTITY: Self = Self::new(ZERO, ZERO, ZERO, ONE);

    #[inline(always)]
    pub const fn new(x: Real, y: Real, z: Real, w: Real) -> Self {
        Self { x, y, z, w }
    }

    /// Adds two quaternions together.
    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        Self::new(
            self.x + other.x,
            self.y + other.y,
            self.z + other.z,
            self.w + other.w,
        )
    }

    /// Scales a quaternion.
    #[inline(always)]
    pub fn scale(self, scale: Real) -> Self {
        Self::new(
            self.x * scale,
            self.y * scale,
            self.z * scale,
            self.w * scale,
        )
    }

    /// Concatenates the transforms of two quaternions together such that the resulting quaternion,
    /// applied as an orientation to a vector v, is equivalent to transformed = (v * a) * b.
    #[inline(always)]
    pub fn concatenate(a: Self, b: Self) -> Self {
        Self::new(
            a.w * b.x + a.x * b.w + a.z * b.y - a.y * b.z,
            a.w * b.y + a.y * b.w + a.x * b.z - a.z * b.x,
            a.w * b.z + a.z * b.w + a.y * b.x - a.x * b.y,
            a.w * b.w - a.x * b.x - a.y * b.y - a.z * b.z,
        )
    }

    /// Hamilton product `a * b`. Applying the result rotates by `b` first, then by `a`.
    #[inline(always)]
    pub fn multiply(a: Self, b: Self) -> Self {
        Self::concatenate(b, a)
    }

    /// Computes the conjugate of the quaternion.
    #[inline(always)]
    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    #[inline(always)]
    pub fn length_squared(self) -> Real {
        self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w
    }

    #[inline(always)]
    pub fn length(self) -> Real {
        math_helper::sqrt(self.length_squared())
    }

    /// Ensures the quaternion has unit length. Degenerate quaternions collapse to identity.
    #[inline(always)]
    pub fn normalize(self) -> Self {
        let length_squared = self.length_squared();
        if length_squared < EPSILON_SQUARED_LENGTH {
            return Self::IDENTITY;
        }
        match math_helper::checked_div(ONE, math_helper::sqrt(length_squared)) {
            Some(inverse_length) => self.scale(inverse_length),
            None => Self::IDENTITY,
        }
    }

    /// The vector part of the quaternion.
    #[inline(always)]
    pub fn xyz(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Transforms the vector using a quaternion.
    #[inline(always)]
    pub fn transform(self, v: Vector3) -> Vector3 {
        // Optimized-down version of v' = q * v * q^-1 for a unit q.
        let x2 = self.x + self.x;
        let y2 = self.y + self.y;
        let z2 = self.z + self.z;
        let xx2 = self.x * x2;
        let xy2 = self.x * y2;
        let xz2 = self.x * z2;
        let yy2 = self.y * y2;
        let yz2 = self.y * z2;
        let zz2 = self.z * z2;
        let wx2 = self.w * x2;
        let wy2 = self.w * y2;
        let wz2 = self.w * z2;
        Vector3::new(
            v.x * (ONE - yy2 - zz2) + v.y * (xy2 - wz2) + v.z * (xz2 + wy2),
            v.x * (xy2 + wz2) + v.y * (ONE - xx2 - zz2) + v.z * (yz2 - wx2),
            v.x * (xz2 - wy2) + v.y * (yz2 + wx2) + v.z * (ONE - xx2 - yy2),
        )
    }

    /// Advances an orientation by an angular velocity over `dt` using q += ½·ω·q·dt, then
    /// renormalizes.
    #[inline(always)]
    pub fn integrate(self, angular_velocity: Vector3, dt: Real) -> Self {
        let half_dt = dt * HALF;
        let omega = Self::new(
            angular_velocity.x * half_dt,
            angular_velocity.y * half_dt,
            angular_velocity.z * half_dt,
            ZERO,
        );
        self.add(Self::multiply(omega, self)).normalize()
    }

    /// Converts to a host float quaternion.
    #[inline(always)]
    pub fn to_glam(self) -> glam::Quat {
        glam::Quat::from_xyzw(
            math_helper::to_f32(self.x),
            math_helper::to_f32(self.y),
            math_helper::to_f32(self.z),
            math_helper::to_f32(self.w),
        )
    }

    /// Converts from a host float quaternion. Only meant for initialization at the host boundary.
    #[inline(always)]
    pub fn from_glam(q: glam::Quat) -> Self {
        Self::new(
            math_helper::from_f32(q.x),
            math_helper::from_f32(q.y),
            math_helper::from_f32(q.z),
            math_helper::from_f32(q.w),
        )
        .normalize()
    }
}

impl std::fmt::Display for Quaternion {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{{{}, {}, {}, {}}}", self.x, self.y, self.z, self.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quarter_turn_about_z() -> Quaternion {
        let s = math_helper::sqrt(HALF);
        Quaternion::new(ZERO, ZERO, s, s)
    }

    fn assert_vector_near(a: Vector3, b: Vector3) {
        assert_abs_diff_eq!(a.x.to_num::<f64>(), b.x.to_num::<f64>(), epsilon = 1e-6);
        assert_abs_diff_eq!(a.y.to_num::<f64>(), b.y.to_num::<f64>(), epsilon = 1e-6);
        assert_abs_diff_eq!(a.z.to_num::<f64>(), b.z.to_num::<f64>(), epsilon = 1e-6);
    }

    #[test]
    fn transform_rotates_about_axis() {
        let rotated = quarter_turn_about_z().transform(Vector3::UNIT_X);
        assert_vector_near(rotated, Vector3::UNIT_Y);
    }

    #[test]
    fn concatenate_applies_first_argument_first() {
        let q = quarter_turn_about_z();
        let half_turn = Quaternion::concatenate(q, q);
        assert_vector_near(half_turn.transform(Vector3::UNIT_X), -Vector3::UNIT_X);
        let undone = Quaternion::concatenate(q, q.conjugate());
        assert_vector_near(undone.transform(Vector3::UNIT_Y), Vector3::UNIT_Y);
    }

    #[test]
    fn degenerate_normalize_is_identity() {
        let zero = Quaternion::new(ZERO, ZERO, ZERO, ZERO);
        assert_eq!(zero.normalize(), Quaternion::IDENTITY);
    }

    #[test]
    fn integration_keeps_unit_length() {
        let mut q = Quaternion::IDENTITY;
        let omega = Vector3::from_ints(1, 2, 3);
        for _ in 0..100 {
            q = q.integrate(omega, math_helper::ratio(1, 60));
        }
        assert_abs_diff_eq!(q.length().to_num::<f64>(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn glam_conversion_matches_rotation() {
        let q = Quaternion::from_glam(glam::Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let rotated = q.transform(Vector3::UNIT_X).to_glam();
        assert!((rotated - glam::Vec3::Y).length() < 1e-5);
    }
}
