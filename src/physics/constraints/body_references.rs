use crate::physics::body_properties::{BodyVelocity, RigidPose};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::utilities::math_helper::{Real, ZERO};
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::vector3::Vector3;

/// Snapshot of the entity properties a constraint reads while updating.
///
/// A missing handle, or one whose entity no longer exists, reads as the static world: identity
/// pose, zero velocity and infinite mass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyReference {
    pub handle: Option<EntityHandle>,
    pub is_dynamic: bool,
    pub pose: RigidPose,
    pub velocity: BodyVelocity,
    pub inverse_mass: Real,
    pub inertia_tensor: Matrix3x3,
    pub inverse_inertia_tensor: Matrix3x3,
}

impl BodyReference {
    /// The static world.
    pub const WORLD: Self = Self {
        handle: None,
        is_dynamic: false,
        pose: RigidPose::IDENTITY,
        velocity: BodyVelocity::ZERO,
        inverse_mass: ZERO,
        inertia_tensor: Matrix3x3::ZERO,
        inverse_inertia_tensor: Matrix3x3::ZERO,
    };

    /// Reads the current state of an entity.
    pub fn read(entities: &Entities, handle: Option<EntityHandle>) -> Self {
        let Some(entity) = handle.and_then(|handle| entities.get(handle)) else {
            return Self::WORLD;
        };
        Self {
            handle,
            is_dynamic: entity.is_dynamic(),
            pose: entity.pose,
            velocity: entity.velocity,
            inverse_mass: entity.inverse_mass(),
            inertia_tensor: entity.world_inertia_tensor(),
            inverse_inertia_tensor: entity.world_inverse_inertia_tensor(),
        }
    }

    #[inline(always)]
    pub fn position(&self) -> Vector3 {
        self.pose.position
    }
}

/// Current velocity of a connected entity. Missing entities are motionless.
#[inline(always)]
pub fn velocity_of(entities: &Entities, handle: Option<EntityHandle>) -> BodyVelocity {
    handle
        .and_then(|handle| entities.get(handle))
        .map(|entity| entity.velocity)
        .unwrap_or(BodyVelocity::ZERO)
}

/// Applies a linear and an angular impulse to a connected entity. Non-dynamic or missing
/// entities are left untouched.
#[inline(always)]
pub fn apply_impulse(
    entities: &mut Entities,
    handle: Option<EntityHandle>,
    linear_impulse: Vector3,
    angular_impulse: Vector3,
) {
    if let Some(entity) = handle.and_then(|handle| entities.get_mut(handle)) {
        entity.apply_linear_impulse(linear_impulse);
        entity.apply_angular_impulse(angular_impulse);
    }
}
