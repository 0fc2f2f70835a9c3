use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::velocity_jacobian::VelocityJacobian;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::utilities::math_helper::Real;
use crate::utilities::matrix2x2::Matrix2x2;
use crate::utilities::vector2::Vector2;
use crate::utilities::vector3::Vector3;

/// Two dimensional friction acting at the center of a contact manifold.
///
/// The tangent basis follows the relative sliding direction, so the accumulated impulse is kept in
/// world space and re-expressed in the new basis whenever the basis is rebuilt.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlidingFrictionConstraint {
    manifold_center: Vector3,
    tangent_x: Vector3,
    tangent_y: Vector3,
    jacobian_x: VelocityJacobian,
    jacobian_y: VelocityJacobian,
    effective_mass: Matrix2x2,
    relative_velocity: Vector3,
    friction: Real,
    accumulated_impulse: Vector2,
}

impl SlidingFrictionConstraint {
    /// Point the friction acts at, in world space.
    pub fn manifold_center(&self) -> Vector3 {
        self.manifold_center
    }

    /// Tangential velocity of B relative to A at the manifold center, measured at the last update.
    pub fn relative_velocity(&self) -> Vector3 {
        self.relative_velocity
    }

    /// Coefficient used this step.
    pub fn friction(&self) -> Real {
        self.friction
    }

    pub(crate) fn set_friction(&mut self, friction: Real) {
        self.friction = friction;
    }

    /// Accumulated impulse expressed in the current tangent basis.
    pub fn accumulated_impulse(&self) -> Vector2 {
        self.accumulated_impulse
    }

    /// Accumulated impulse in world space, as applied to entity B.
    pub fn world_accumulated_impulse(&self) -> Vector3 {
        self.tangent_x * self.accumulated_impulse.x + self.tangent_y * self.accumulated_impulse.y
    }

    pub(crate) fn clear_accumulated_impulse(&mut self) {
        self.accumulated_impulse = Vector2::ZERO;
    }

    pub(crate) fn update(
        &mut self,
        a: &BodyReference,
        b: &BodyReference,
        manifold_center: Vector3,
        normal: Vector3,
    ) {
        let previous_world_impulse = self.world_accumulated_impulse();

        self.manifold_center = manifold_center;
        let offset_a = manifold_center - a.position();
        let offset_b = manifold_center - b.position();
        let velocity = b.velocity.velocity_at(offset_b) - a.velocity.velocity_at(offset_a);
        self.relative_velocity = velocity - normal * velocity.dot(normal);

        self.tangent_x = match self.relative_velocity.try_normalize() {
            Some(direction) => direction,
            None => normal.any_perpendicular(),
        };
        self.tangent_y = normal.cross(self.tangent_x);

        self.jacobian_x = VelocityJacobian::point_along_direction(self.tangent_x, offset_a, offset_b);
        self.jacobian_y = VelocityJacobian::point_along_direction(self.tangent_y, offset_a, offset_b);

        self.effective_mass = if a.is_dynamic || b.is_dynamic {
            let xx = self.jacobian_x.inverse_effective_mass(a, b);
            let yy = self.jacobian_y.inverse_effective_mass(a, b);
            let xy = self.jacobian_x.coupled_inverse_effective_mass(&self.jacobian_y, a, b);
            Matrix2x2::from_rows(Vector2::new(xx, xy), Vector2::new(xy, yy)).invert_or_zero()
        } else {
            Matrix2x2::ZERO
        };

        self.accumulated_impulse = Vector2::new(
            previous_world_impulse.dot(self.tangent_x),
            previous_world_impulse.dot(self.tangent_y),
        );
    }

    fn apply_impulse(
        &self,
        entities: &mut Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        impulse: Vector2,
    ) {
        self.jacobian_x.apply_impulse(entities, entity_a, entity_b, impulse.x);
        self.jacobian_y.apply_impulse(entities, entity_a, entity_b, impulse.y);
    }

    pub(crate) fn warm_start(
        &self,
        entities: &mut Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
    ) {
        self.apply_impulse(entities, entity_a, entity_b, self.accumulated_impulse);
    }

    /// Solves one iteration with the accumulated impulse bounded by `maximum_impulse`.
    pub(crate) fn solve_iteration(
        &mut self,
        entities: &mut Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        maximum_impulse: Real,
    ) -> Real {
        let velocity = Vector2::new(
            self.jacobian_x.relative_velocity(entities, entity_a, entity_b),
            self.jacobian_y.relative_velocity(entities, entity_a, entity_b),
        );
        let impulse = self.effective_mass.transform(-velocity);

        let previous = self.accumulated_impulse;
        self.accumulated_impulse = (previous + impulse).clamp_length(maximum_impulse);
        let impulse = self.accumulated_impulse - previous;

        self.apply_impulse(entities, entity_a, entity_b, impulse);
        impulse.x.abs() + impulse.y.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::entity::Entity;
    use crate::utilities::math_helper::{from_int, ratio, ONE, ZERO};
    use crate::utilities::matrix3x3::Matrix3x3;
    use approx::assert_abs_diff_eq;

    fn sliding_box() -> (Entities, EntityHandle) {
        let mut entities = Entities::new();
        let body = entities.add(
            Entity::new_dynamic(Vector3::from_ints(0, 1, 0), ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::from_ints(3, 0, 4), Vector3::ZERO),
        );
        (entities, body)
    }

    #[test]
    fn basis_follows_sliding_direction() {
        let (entities, body) = sliding_box();
        let mut friction = SlidingFrictionConstraint::default();
        let b = BodyReference::read(&entities, Some(body));
        friction.update(&BodyReference::WORLD, &b, Vector3::ZERO, Vector3::UNIT_Y);
        assert_eq!(friction.relative_velocity(), Vector3::from_ints(3, 0, 4));
        assert_abs_diff_eq!(friction.tangent_x.x.to_num::<f64>(), 0.6, epsilon = 1e-6);
        assert_abs_diff_eq!(friction.tangent_x.z.to_num::<f64>(), 0.8, epsilon = 1e-6);
        assert_eq!(friction.tangent_x.dot(Vector3::UNIT_Y), ZERO);
    }

    #[test]
    fn impulse_is_bounded() {
        let (mut entities, body) = sliding_box();
        let mut friction = SlidingFrictionConstraint::default();
        let b = BodyReference::read(&entities, Some(body));
        friction.update(&BodyReference::WORLD, &b, Vector3::from_ints(0, 1, 0), Vector3::UNIT_Y);
        friction.solve_iteration(&mut entities, None, Some(body), ONE);
        assert!(friction.accumulated_impulse().length() <= ONE + ratio(1, 1000));
        let velocity = entities.get(body).unwrap().linear_velocity();
        assert_abs_diff_eq!(velocity.length().to_num::<f64>(), 4.0, epsilon = 1e-3);
    }

    #[test]
    fn unbounded_friction_stops_sliding() {
        let (mut entities, body) = sliding_box();
        let mut friction = SlidingFrictionConstraint::default();
        let b = BodyReference::read(&entities, Some(body));
        friction.update(&BodyReference::WORLD, &b, Vector3::from_ints(0, 1, 0), Vector3::UNIT_Y);
        friction.solve_iteration(&mut entities, None, Some(body), from_int(100));
        let velocity = entities.get(body).unwrap().linear_velocity();
        assert_abs_diff_eq!(velocity.length().to_num::<f64>(), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn world_impulse_survives_basis_change() {
        let (mut entities, body) = sliding_box();
        let mut friction = SlidingFrictionConstraint::default();
        let b = BodyReference::read(&entities, Some(body));
        friction.update(&BodyReference::WORLD, &b, Vector3::from_ints(0, 1, 0), Vector3::UNIT_Y);
        friction.solve_iteration(&mut entities, None, Some(body), ONE);
        let world = friction.world_accumulated_impulse();

        let b = BodyReference::read(&entities, Some(body));
        friction.update(&BodyReference::WORLD, &b, Vector3::from_ints(0, 1, 0), Vector3::UNIT_Y);
        let rebuilt = friction.world_accumulated_impulse();
        assert_abs_diff_eq!((rebuilt - world).length().to_num::<f64>(), 0.0, epsilon = 1e-4);
    }
}
