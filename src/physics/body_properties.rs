use crate::utilities::math_helper::{self, Real, ZERO};
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::quaternion::Quaternion;
use crate::utilities::vector3::Vector3;
use std::fmt;

/// Represents a rigid transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RigidPose {
    /// Orientation of the pose.
    pub orientation: Quaternion,
    /// Position of the pose.
    pub position: Vector3,
}

impl RigidPose {
    /// Returns a pose with a position at (0,0,0) and identity orientation.
    pub const IDENTITY: Self = Self {
        orientation: Quaternion::IDENTITY,
        position: Vector3::ZERO,
    };

    /// Creates a rigid pose with the given position and orientation.
    #[inline(always)]
    pub fn new(position: Vector3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Creates a rigid pose with the given position and identity orientation.
    #[inline(always)]
    pub fn from_position(position: Vector3) -> Self {
        Self {
            position,
            orientation: Quaternion::IDENTITY,
        }
    }

    /// Transforms a local point into world space.
    #[inline(always)]
    pub fn transform(&self, v: Vector3) -> Vector3 {
        self.orientation.transform(v) + self.position
    }

    /// Transforms a world point into the local space of the pose.
    #[inline(always)]
    pub fn transform_by_inverse(&self, v: Vector3) -> Vector3 {
        self.orientation.conjugate().transform(v - self.position)
    }
}

impl From<Vector3> for RigidPose {
    fn from(position: Vector3) -> Self {
        Self::from_position(position)
    }
}

impl fmt::Display for RigidPose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.position, self.orientation)
    }
}

/// Linear and angular velocity for a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyVelocity {
    /// Linear velocity associated with the body.
    pub linear: Vector3,
    /// Angular velocity associated with the body.
    pub angular: Vector3,
}

impl BodyVelocity {
    pub const ZERO: Self = Self {
        linear: Vector3::ZERO,
        angular: Vector3::ZERO,
    };

    #[inline(always)]
    pub fn new(linear: Vector3, angular: Vector3) -> Self {
        Self { linear, angular }
    }

    /// Velocity of a point offset from the center of mass by `offset`.
    #[inline(always)]
    pub fn velocity_at(&self, offset: Vector3) -> Vector3 {
        self.linear + self.angular.cross(offset)
    }
}

impl fmt::Display for BodyVelocity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Linear: {}, Angular: {}", self.linear, self.angular)
    }
}

/// Mass properties of a body. Non-dynamic bodies carry all zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BodyInertia {
    pub mass: Real,
    pub inverse_mass: Real,
    /// Inertia tensor in the body's local space.
    pub local_inertia_tensor: Matrix3x3,
    /// Inverse of the local inertia tensor.
    pub local_inverse_inertia_tensor: Matrix3x3,
    /// Inertia tensor rotated into world space. Refreshed by the integrator.
    pub world_inertia_tensor: Matrix3x3,
    /// Inverse inertia tensor rotated into world space. Refreshed by the integrator.
    pub world_inverse_inertia_tensor: Matrix3x3,
}

impl BodyInertia {
    /// Mass properties of a body that never responds to impulses.
    pub const NON_DYNAMIC: Self = Self {
        mass: ZERO,
        inverse_mass: ZERO,
        local_inertia_tensor: Matrix3x3::ZERO,
        local_inverse_inertia_tensor: Matrix3x3::ZERO,
        world_inertia_tensor: Matrix3x3::ZERO,
        world_inverse_inertia_tensor: Matrix3x3::ZERO,
    };

    /// Builds the mass properties of a dynamic body. The world-space tensors start equal to the
    /// local ones and must be refreshed against the body's orientation.
    pub fn dynamic(mass: Real, local_inertia_tensor: Matrix3x3) -> Self {
        Self {
            mass,
            inverse_mass: math_helper::reciprocal_or_zero(mass),
            local_inertia_tensor,
            local_inverse_inertia_tensor: local_inertia_tensor.invert_or_zero(),
            world_inertia_tensor: local_inertia_tensor,
            world_inverse_inertia_tensor: local_inertia_tensor.invert_or_zero(),
        }
    }

    /// Rotates the local tensors into world space.
    #[inline(always)]
    pub fn update_world(&mut self, orientation: Quaternion) {
        let rotation = Matrix3x3::from_quaternion(orientation);
        self.world_inertia_tensor = Matrix3x3::rotation_sandwich(rotation, self.local_inertia_tensor);
        self.world_inverse_inertia_tensor =
            Matrix3x3::rotation_sandwich(rotation, self.local_inverse_inertia_tensor);
    }
}
