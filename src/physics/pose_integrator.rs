use crate::physics::entities::Entities;
use crate::physics::entity::Entity;
use crate::utilities::math_helper::{self, Real};
use crate::utilities::vector3::Vector3;
use tracing::trace;

/// Moves entities through time using their velocities.
///
/// Velocities are integrated before the solver runs and poses after it, so the solver sees the
/// gravity impulse of the step and the poses reflect the corrected velocities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoseIntegrator {
    /// Acceleration applied to every dynamic entity.
    pub gravity: Vector3,
}

impl Default for PoseIntegrator {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(math_helper::ZERO, math_helper::ratio(-981, 100), math_helper::ZERO),
        }
    }
}

impl PoseIntegrator {
    pub fn new(gravity: Vector3) -> Self {
        Self { gravity }
    }

    /// Adds the gravity impulse of one step to every dynamic entity's linear velocity.
    pub fn apply_forces(&self, entities: &mut Entities, dt: Real) {
        let velocity_change = self.gravity * dt;
        for (_, entity) in entities.iter_mut() {
            if entity.is_dynamic() {
                entity.velocity.linear += velocity_change;
            }
        }
    }

    /// Integrates every entity's pose by its velocity and refreshes world inertia.
    pub fn integrate(&self, entities: &mut Entities, dt: Real) {
        let mut moved = 0usize;
        for (_, entity) in entities.iter_mut() {
            moved += Self::integrate_entity(entity, dt) as usize;
        }
        trace!(moved, "Integrated poses");
    }

    /// Integrates one entity. Returns whether its pose changed.
    fn integrate_entity(entity: &mut Entity, dt: Real) -> bool {
        let velocity = entity.velocity;
        if velocity.linear == Vector3::ZERO && velocity.angular == Vector3::ZERO {
            return false;
        }
        entity.pose.position += velocity.linear * dt;
        if velocity.angular != Vector3::ZERO {
            entity.pose.orientation = entity.pose.orientation.integrate(velocity.angular, dt);
            entity.update_inertia_tensor();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::math_helper::{from_int, ratio, ONE};
    use crate::utilities::matrix3x3::Matrix3x3;
    use approx::assert_abs_diff_eq;

    #[test]
    fn gravity_only_affects_dynamic_entities() {
        let mut entities = Entities::new();
        let body = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        let platform = entities.add(
            Entity::new_kinematic(Vector3::ZERO).with_velocity(Vector3::UNIT_X, Vector3::ZERO),
        );
        let integrator = PoseIntegrator::new(Vector3::from_ints(0, -10, 0));
        let dt = ratio(1, 10);
        integrator.apply_forces(&mut entities, dt);
        integrator.integrate(&mut entities, dt);

        let body = entities.get(body).unwrap();
        assert_abs_diff_eq!(body.linear_velocity().y.to_num::<f64>(), -1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(body.position().y.to_num::<f64>(), -0.1, epsilon = 1e-6);

        let platform = entities.get(platform).unwrap();
        assert_eq!(platform.linear_velocity(), Vector3::UNIT_X);
        assert_abs_diff_eq!(platform.position().x.to_num::<f64>(), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn spinning_entity_rotates() {
        let mut entities = Entities::new();
        let spinner = entities.add(
            Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::ZERO, Vector3::from_ints(0, 0, 1)),
        );
        let integrator = PoseIntegrator::new(Vector3::ZERO);
        for _ in 0..10 {
            integrator.integrate(&mut entities, ratio(1, 10));
        }
        let orientation = entities.get(spinner).unwrap().orientation();
        // One radian about z.
        let rotated = orientation.transform(Vector3::UNIT_X);
        assert_abs_diff_eq!(rotated.x.to_num::<f64>(), 1f64.cos(), epsilon = 1e-2);
        assert_abs_diff_eq!(rotated.y.to_num::<f64>(), 1f64.sin(), epsilon = 1e-2);
        assert_abs_diff_eq!(rotated.z.to_num::<f64>(), 0.0, epsilon = 1e-6);
        assert_eq!(orientation.length_squared().round(), from_int(1));
    }
}
