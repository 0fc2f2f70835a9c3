use crate::error::{ConfigError, ConfigResult};
use crate::physics::body_properties::{BodyInertia, BodyVelocity, RigidPose};
use crate::physics::materials::MaterialId;
use crate::utilities::math_helper::{Real, ZERO};
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::quaternion::Quaternion;
use crate::utilities::vector3::Vector3;

/// A rigid body.
///
/// Dynamic entities respond to impulses. Kinematic entities (including static ones, which are
/// just kinematic entities that never move) have zero inverse mass and inverse inertia and
/// ignore every impulse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Position and orientation of the center of mass.
    pub pose: RigidPose,
    /// Linear and angular velocity.
    pub velocity: BodyVelocity,
    /// Surface material used when this entity is in contact.
    pub material: MaterialId,
    inertia: BodyInertia,
    is_dynamic: bool,
}

impl Entity {
    /// Creates a dynamic entity. The mass must be positive.
    pub fn new_dynamic(
        position: Vector3,
        mass: Real,
        local_inertia_tensor: Matrix3x3,
    ) -> ConfigResult<Self> {
        Self::validate_mass(mass)?;
        Ok(Self {
            pose: RigidPose::from_position(position),
            velocity: BodyVelocity::ZERO,
            material: MaterialId::DEFAULT,
            inertia: BodyInertia::dynamic(mass, local_inertia_tensor),
            is_dynamic: true,
        })
    }

    /// Creates a kinematic entity with infinite mass.
    pub fn new_kinematic(position: Vector3) -> Self {
        Self {
            pose: RigidPose::from_position(position),
            velocity: BodyVelocity::ZERO,
            material: MaterialId::DEFAULT,
            inertia: BodyInertia::NON_DYNAMIC,
            is_dynamic: false,
        }
    }

    /// Sets the orientation and refreshes the world-space inertia.
    pub fn with_orientation(mut self, orientation: Quaternion) -> Self {
        self.pose.orientation = orientation.normalize();
        self.update_inertia_tensor();
        self
    }

    pub fn with_velocity(mut self, linear: Vector3, angular: Vector3) -> Self {
        self.velocity = BodyVelocity::new(linear, angular);
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = material;
        self
    }

    fn validate_mass(mass: Real) -> ConfigResult {
        if mass <= ZERO {
            return Err(ConfigError::NonPositive {
                type_name: "Entity",
                property: "mass",
                value: mass,
            });
        }
        Ok(())
    }

    /// Gives the entity finite mass so it responds to impulses.
    pub fn become_dynamic(&mut self, mass: Real, local_inertia_tensor: Matrix3x3) -> ConfigResult {
        Self::validate_mass(mass)?;
        self.inertia = BodyInertia::dynamic(mass, local_inertia_tensor);
        self.is_dynamic = true;
        self.update_inertia_tensor();
        Ok(())
    }

    /// Gives the entity infinite mass. Its velocity is kept but no impulse will change it.
    pub fn become_kinematic(&mut self) {
        self.inertia = BodyInertia::NON_DYNAMIC;
        self.is_dynamic = false;
    }

    #[inline(always)]
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    #[inline(always)]
    pub fn position(&self) -> Vector3 {
        self.pose.position
    }

    #[inline(always)]
    pub fn orientation(&self) -> Quaternion {
        self.pose.orientation
    }

    #[inline(always)]
    pub fn linear_velocity(&self) -> Vector3 {
        self.velocity.linear
    }

    #[inline(always)]
    pub fn angular_velocity(&self) -> Vector3 {
        self.velocity.angular
    }

    #[inline(always)]
    pub fn mass(&self) -> Real {
        self.inertia.mass
    }

    #[inline(always)]
    pub fn inverse_mass(&self) -> Real {
        self.inertia.inverse_mass
    }

    #[inline(always)]
    pub fn inertia(&self) -> &BodyInertia {
        &self.inertia
    }

    #[inline(always)]
    pub fn world_inertia_tensor(&self) -> Matrix3x3 {
        self.inertia.world_inertia_tensor
    }

    #[inline(always)]
    pub fn world_inverse_inertia_tensor(&self) -> Matrix3x3 {
        self.inertia.world_inverse_inertia_tensor
    }

    /// Velocity of a world space point rigidly attached to the entity.
    #[inline(always)]
    pub fn velocity_at_point(&self, point: Vector3) -> Vector3 {
        self.velocity.velocity_at(point - self.pose.position)
    }

    /// Applies a linear impulse through the center of mass. No-op for non-dynamic entities.
    #[inline(always)]
    pub fn apply_linear_impulse(&mut self, impulse: Vector3) {
        if self.is_dynamic {
            self.velocity.linear += impulse * self.inertia.inverse_mass;
        }
    }

    /// Applies an angular impulse. No-op for non-dynamic entities.
    #[inline(always)]
    pub fn apply_angular_impulse(&mut self, impulse: Vector3) {
        if self.is_dynamic {
            self.velocity.angular += self.inertia.world_inverse_inertia_tensor.transform(impulse);
        }
    }

    /// Applies an impulse at a world space point. No-op for non-dynamic entities.
    pub fn apply_impulse_at(&mut self, impulse: Vector3, point: Vector3) {
        if self.is_dynamic {
            let offset = point - self.pose.position;
            self.apply_linear_impulse(impulse);
            self.apply_angular_impulse(offset.cross(impulse));
        }
    }

    /// Recomputes the world space inertia tensors from the current orientation.
    #[inline(always)]
    pub fn update_inertia_tensor(&mut self) {
        if self.is_dynamic {
            self.inertia.update_world(self.pose.orientation);
        }
    }
}
