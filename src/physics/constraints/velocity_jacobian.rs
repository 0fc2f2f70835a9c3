use crate::physics::body_properties::BodyVelocity;
use crate::physics::constraints::body_references::{self, BodyReference};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::utilities::math_helper::{self, Real, ZERO};
use crate::utilities::vector3::Vector3;

/// Jacobian of a one dimensional velocity constraint between two entities.
///
/// The constrained velocity is `J * v`, with entity A's terms and entity B's terms summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VelocityJacobian {
    pub linear_a: Vector3,
    pub angular_a: Vector3,
    pub linear_b: Vector3,
    pub angular_b: Vector3,
}

impl VelocityJacobian {
    /// Jacobian of the relative velocity of two anchor points along `direction`.
    /// `offset_a` and `offset_b` are the anchors' world space offsets from each center of mass.
    #[inline(always)]
    pub fn point_along_direction(direction: Vector3, offset_a: Vector3, offset_b: Vector3) -> Self {
        Self {
            linear_a: -direction,
            angular_a: direction.cross(offset_a),
            linear_b: direction,
            angular_b: offset_b.cross(direction),
        }
    }

    /// Jacobian of the relative angular velocity about `axis`.
    #[inline(always)]
    pub fn angular(axis: Vector3) -> Self {
        Self {
            linear_a: Vector3::ZERO,
            angular_a: -axis,
            linear_b: Vector3::ZERO,
            angular_b: axis,
        }
    }

    /// Computes `J * v`.
    #[inline(always)]
    pub fn velocity(&self, velocity_a: &BodyVelocity, velocity_b: &BodyVelocity) -> Real {
        self.linear_a.dot(velocity_a.linear)
            + self.angular_a.dot(velocity_a.angular)
            + self.linear_b.dot(velocity_b.linear)
            + self.angular_b.dot(velocity_b.angular)
    }

    /// Reads both velocities from the arena and computes `J * v`.
    #[inline(always)]
    pub fn relative_velocity(
        &self,
        entities: &Entities,
        a: Option<EntityHandle>,
        b: Option<EntityHandle>,
    ) -> Real {
        self.velocity(
            &body_references::velocity_of(entities, a),
            &body_references::velocity_of(entities, b),
        )
    }

    /// Computes `J * M^-1 * J^T`. Non-dynamic entities contribute nothing.
    #[inline(always)]
    pub fn inverse_effective_mass(&self, a: &BodyReference, b: &BodyReference) -> Real {
        let mut sum = ZERO;
        if a.is_dynamic {
            sum += a.inverse_mass * self.linear_a.length_squared()
                + self.angular_a.dot(a.inverse_inertia_tensor.transform(self.angular_a));
        }
        if b.is_dynamic {
            sum += b.inverse_mass * self.linear_b.length_squared()
                + self.angular_b.dot(b.inverse_inertia_tensor.transform(self.angular_b));
        }
        sum
    }

    /// Computes the off-diagonal term `J * M^-1 * K^T` coupling two jacobians on the same entities.
    #[inline(always)]
    pub fn coupled_inverse_effective_mass(
        &self,
        other: &Self,
        a: &BodyReference,
        b: &BodyReference,
    ) -> Real {
        let mut sum = ZERO;
        if a.is_dynamic {
            sum += a.inverse_mass * self.linear_a.dot(other.linear_a)
                + self.angular_a.dot(a.inverse_inertia_tensor.transform(other.angular_a));
        }
        if b.is_dynamic {
            sum += b.inverse_mass * self.linear_b.dot(other.linear_b)
                + self.angular_b.dot(b.inverse_inertia_tensor.transform(other.angular_b));
        }
        sum
    }

    /// Computes `1 / (J * M^-1 * J^T + softness)`, or zero when the sum is degenerate.
    #[inline(always)]
    pub fn effective_mass(&self, a: &BodyReference, b: &BodyReference, softness: Real) -> Real {
        math_helper::reciprocal_or_zero(self.inverse_effective_mass(a, b) + softness)
    }

    /// Applies `J^T * impulse` to both entities.
    #[inline(always)]
    pub fn apply_impulse(
        &self,
        entities: &mut Entities,
        a: Option<EntityHandle>,
        b: Option<EntityHandle>,
        impulse: Real,
    ) {
        body_references::apply_impulse(entities, a, self.linear_a * impulse, self.angular_a * impulse);
        body_references::apply_impulse(entities, b, self.linear_b * impulse, self.angular_b * impulse);
    }
}
