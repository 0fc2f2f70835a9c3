use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::contact::contact::Contact;
use crate::physics::constraints::inequality_helpers::InequalityHelpers;
use crate::physics::constraints::velocity_jacobian::VelocityJacobian;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::CollisionResponseSettings;
use crate::utilities::math_helper::{self, Real, ZERO};

/// Keeps one contact of a manifold from penetrating further.
///
/// Only pushes the entities apart; the accumulated impulse is never negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct PenetrationConstraint {
    pub contact: Contact,
    jacobian: VelocityJacobian,
    bias: Real,
    softness: Real,
    effective_mass: Real,
    pub(crate) accumulated_impulse: Real,
}

impl PenetrationConstraint {
    pub(crate) fn new(contact: Contact) -> Self {
        Self {
            contact,
            ..Self::default()
        }
    }

    /// Total impulse applied along the normal this step.
    pub fn accumulated_impulse(&self) -> Real {
        self.accumulated_impulse
    }

    /// Current velocity bias, in units of separating speed.
    pub fn bias(&self) -> Real {
        self.bias
    }

    pub(crate) fn update(
        &mut self,
        a: &BodyReference,
        b: &BodyReference,
        inverse_dt: Real,
        allowed_penetration: Real,
        response: &CollisionResponseSettings,
        bounciness: Real,
    ) {
        let offset_a = self.contact.position - a.position();
        let offset_b = self.contact.position - b.position();
        self.jacobian = VelocityJacobian::point_along_direction(self.contact.normal, offset_a, offset_b);

        let depth = self.contact.penetration_depth;
        self.bias = if depth >= ZERO {
            let excess = math_helper::max(ZERO, depth - allowed_penetration);
            let recovery = math_helper::safe_mul(
                math_helper::safe_mul(excess, response.penetration_recovery_stiffness()),
                inverse_dt,
            );
            math_helper::min(recovery, response.maximum_penetration_recovery_speed())
        } else {
            // Speculative: allow closing the gap within the step but no further.
            math_helper::safe_mul(depth, inverse_dt)
        };

        // Restitution only applies to touching contacts.
        let approach_speed = -self.jacobian.velocity(&a.velocity, &b.velocity);
        if bounciness > ZERO
            && depth >= ZERO
            && approach_speed > response.bounciness_velocity_threshold()
        {
            self.bias = math_helper::max(self.bias, math_helper::safe_mul(approach_speed, bounciness));
        }

        self.softness = math_helper::safe_mul(response.softness(), inverse_dt);
        self.effective_mass = if a.is_dynamic || b.is_dynamic {
            self.jacobian.effective_mass(a, b, self.softness)
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

    pub(crate) fn solve_iteration(
        &mut self,
        entities: &mut Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
    ) -> Real {
        let velocity = self.jacobian.relative_velocity(entities, entity_a, entity_b);
        let impulse =
            (self.bias - velocity - self.softness * self.accumulated_impulse) * self.effective_mass;
        let impulse = InequalityHelpers::clamp_positive(&mut self.accumulated_impulse, impulse);
        self.jacobian.apply_impulse(entities, entity_a, entity_b, impulse);
        impulse.abs()
    }
}
