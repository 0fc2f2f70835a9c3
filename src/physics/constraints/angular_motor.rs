use crate::error::ConfigResult;
use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::motor_settings::MotorSettings;
use crate::physics::constraints::no_rotation_joint::{
    angular_effective_mass, apply_angular_impulse, relative_angular_velocity,
};
use crate::physics::constraints::rigidity_settings::SoftnessCoefficients;
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::Real;
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::vector3::Vector3;

/// Drives the angular velocity of B relative to A towards a goal.
#[derive(Debug, Clone)]
pub struct AngularVelocityMotor {
    base: ConstraintBase,
    entity_a: Option<EntityHandle>,
    entity_b: Option<EntityHandle>,
    /// Target value of B's angular velocity minus A's.
    pub goal_velocity: Vector3,
    pub settings: MotorSettings,
    coefficients: SoftnessCoefficients,
    effective_mass: Matrix3x3,
    accumulated_impulse: Vector3,
}

impl AngularVelocityMotor {
    pub fn new(
        entities: &Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        goal_velocity: Vector3,
    ) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, entity_a, entity_b)?;
        Ok(Self {
            base: ConstraintBase::default(),
            entity_a,
            entity_b,
            goal_velocity,
            settings: MotorSettings::default(),
            coefficients: SoftnessCoefficients::default(),
            effective_mass: Matrix3x3::ZERO,
            accumulated_impulse: Vector3::ZERO,
        })
    }

    pub fn entity_a(&self) -> Option<EntityHandle> {
        self.entity_a
    }

    pub fn entity_b(&self) -> Option<EntityHandle> {
        self.entity_b
    }

    pub fn accumulated_impulse(&self) -> Vector3 {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for AngularVelocityMotor {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn involved_entities(&self, handles: &mut Vec<EntityHandle>) {
        handles.extend(self.entity_a);
        handles.extend(self.entity_b);
    }

    fn preupdate(&mut self, dt: Real, inverse_dt: Real, _settings: &Settings) {
        self.coefficients = self.settings.compute(dt, inverse_dt);
    }

    fn update_jacobians_and_velocity_bias(&mut self, _entities: &Entities, _settings: &Settings) {
        // The jacobians are the identity on relative angular velocity; the goal is the bias.
    }

    fn compute_effective_mass(&mut self, entities: &Entities) {
        let a = BodyReference::read(entities, self.entity_a);
        let b = BodyReference::read(entities, self.entity_b);
        self.effective_mass = angular_effective_mass(&a, &b, self.coefficients.softness);
    }

    fn warm_start(&mut self, entities: &mut Entities) {
        apply_angular_impulse(entities, self.entity_a, self.entity_b, self.accumulated_impulse);
    }

    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real {
        let velocity = relative_angular_velocity(entities, self.entity_a, self.entity_b);
        let corrective_velocity = self.goal_velocity
            - velocity
            - self.accumulated_impulse * self.coefficients.softness;
        let mut impulse = self.effective_mass.transform(corrective_velocity);

        let previous = self.accumulated_impulse;
        self.accumulated_impulse =
            (previous + impulse).clamp_length(self.coefficients.maximum_impulse);
        impulse = self.accumulated_impulse - previous;

        apply_angular_impulse(entities, self.entity_a, self.entity_b, impulse);
        impulse.abs_sum()
    }

    fn clear_accumulated_impulses(&mut self) {
        self.accumulated_impulse = Vector3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::entity::Entity;
    use crate::utilities::math_helper::{from_int, ratio, ONE, ZERO};
    use approx::assert_abs_diff_eq;

    #[test]
    fn spins_up_to_goal() {
        let mut entities = Entities::new();
        let wheel = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        let mut motor =
            AngularVelocityMotor::new(&entities, None, Some(wheel), Vector3::from_ints(0, 3, 0))
                .unwrap();
        motor.settings.set_softness(ZERO).unwrap();
        motor.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        motor.solve_velocity_iteration(&mut entities);
        let spin = entities.get(wheel).unwrap().angular_velocity();
        assert_abs_diff_eq!(spin.y.to_num::<f64>(), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn torque_limit_caps_acceleration() {
        let mut entities = Entities::new();
        let wheel = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        let mut motor =
            AngularVelocityMotor::new(&entities, None, Some(wheel), Vector3::from_ints(0, 100, 0))
                .unwrap();
        motor.settings.set_maximum_force(from_int(60));
        motor.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        for _ in 0..5 {
            motor.solve_velocity_iteration(&mut entities);
        }
        let spin = entities.get(wheel).unwrap().angular_velocity();
        assert_abs_diff_eq!(spin.y.to_num::<f64>(), 1.0, epsilon = 1e-3);
    }
}
