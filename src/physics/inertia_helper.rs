use crate::utilities::math_helper::{self, Real};
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::vector3::Vector3;

/// Helper functions computing local inertia tensors of common solid shapes.
pub struct InertiaHelper;

impl InertiaHelper {
    /// Inertia tensor of a solid box with the given full extents, centered on its center of mass.
    pub fn box_tensor(mass: Real, width: Real, height: Real, length: Real) -> Matrix3x3 {
        let scale = mass / 12;
        let width_squared = width * width;
        let height_squared = height * height;
        let length_squared = length * length;
        Matrix3x3::from_diagonal(Vector3::new(
            scale * (height_squared + length_squared),
            scale * (width_squared + length_squared),
            scale * (width_squared + height_squared),
        ))
    }

    /// Inertia tensor of a solid sphere.
    pub fn sphere_tensor(mass: Real, radius: Real) -> Matrix3x3 {
        Matrix3x3::from_scalar(mass * math_helper::ratio(2, 5) * radius * radius)
    }
}
