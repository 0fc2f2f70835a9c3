use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::inequality_helpers::InequalityHelpers;
use crate::physics::constraints::velocity_jacobian::VelocityJacobian;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::utilities::math_helper::{self, Real, ZERO};
use crate::utilities::vector3::Vector3;

/// Resists relative rotation of a manifold's entities about the contact normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwistFrictionConstraint {
    jacobian: VelocityJacobian,
    effective_mass: Real,
    relative_velocity: Real,
    friction: Real,
    accumulated_impulse: Real,
}

impl TwistFrictionConstraint {
    /// Relative angular speed about the normal measured at the last update.
    pub fn relative_velocity(&self) -> Real {
        self.relative_velocity
    }

    /// Coefficient used this step, already scaled by the twist friction factor.
    pub fn friction(&self) -> Real {
        self.friction
    }

    pub(crate) fn set_friction(&mut self, friction: Real) {
        self.friction = friction;
    }

    pub fn accumulated_impulse(&self) -> Real {
        self.accumulated_impulse
    }

    pub(crate) fn clear_accumulated_impulse(&mut self) {
        self.accumulated_impulse = ZERO;
    }

    pub(crate) fn update(&mut self, a: &BodyReference, b: &BodyReference, normal: Vector3) {
        self.jacobian = VelocityJacobian::angular(normal);
        self.relative_velocity = self.jacobian.velocity(&a.velocity, &b.velocity);
        self.effective_mass = if a.is_dynamic || b.is_dynamic {
            self.jacobian.effective_mass(a, b, ZERO)
        } else {
            ZERO
        };
    }

    pub(crate) fn warm_start(
        &self,
        entities: &mut Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
    ) {
        self.jacobian
            .apply_impulse(entities, entity_a, entity_b, self.accumulated_impulse);
    }

    /// Solves one iteration with the accumulated impulse bounded by `maximum_impulse` either way.
    pub(crate) fn solve_iteration(
        &mut self,
        entities: &mut Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        maximum_impulse: Real,
    ) -> Real {
        let velocity = self.jacobian.relative_velocity(entities, entity_a, entity_b);
        let impulse = -math_helper::safe_mul(velocity, self.effective_mass);
        let impulse =
            InequalityHelpers::clamp_symmetric(&mut self.accumulated_impulse, impulse, maximum_impulse);
        self.jacobian.apply_impulse(entities, entity_a, entity_b, impulse);
        impulse.abs()
    }
}
