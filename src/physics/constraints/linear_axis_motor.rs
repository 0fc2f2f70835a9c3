use crate::error::ConfigResult;
use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::inequality_helpers::InequalityHelpers;
use crate::physics::constraints::motor_settings::MotorSettings;
use crate::physics::constraints::rigidity_settings::SoftnessCoefficients;
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::constraints::velocity_jacobian::VelocityJacobian;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{Real, ZERO};
use crate::utilities::vector3::Vector3;

/// Drives the relative velocity of two anchors along an axis attached to entity A.
#[derive(Debug, Clone)]
pub struct LinearAxisMotor {
    base: ConstraintBase,
    entity_a: Option<EntityHandle>,
    entity_b: Option<EntityHandle>,
    /// Anchor on entity A in A's local space.
    pub local_anchor_a: Vector3,
    /// Anchor on entity B in B's local space.
    pub local_anchor_b: Vector3,
    local_axis: Vector3,
    /// Target velocity of B's anchor relative to A's anchor along the axis.
    pub goal_velocity: Real,
    pub settings: MotorSettings,
    coefficients: SoftnessCoefficients,
    jacobian: VelocityJacobian,
    effective_mass: Real,
    accumulated_impulse: Real,
}

impl LinearAxisMotor {
    /// Creates a motor acting along a world space axis between two world space anchors.
    pub fn new(
        entities: &Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        anchor_a: Vector3,
        anchor_b: Vector3,
        axis: Vector3,
        goal_velocity: Real,
    ) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, entity_a, entity_b)?;
        let axis = ConstraintChecker::require_direction("LinearAxisMotor", "axis", axis)?;
        let a = BodyReference::read(entities, entity_a);
        let b = BodyReference::read(entities, entity_b);
        Ok(Self {
            base: ConstraintBase::default(),
            entity_a,
            entity_b,
            local_anchor_a: a.pose.transform_by_inverse(anchor_a),
            local_anchor_b: b.pose.transform_by_inverse(anchor_b),
            local_axis: a.pose.orientation.conjugate().transform(axis),
            goal_velocity,
            settings: MotorSettings::default(),
            coefficients: SoftnessCoefficients::default(),
            jacobian: VelocityJacobian::default(),
            effective_mass: ZERO,
            accumulated_impulse: ZERO,
        })
    }

    pub fn entity_a(&self) -> Option<EntityHandle> {
        self.entity_a
    }

    pub fn entity_b(&self) -> Option<EntityHandle> {
        self.entity_b
    }

    /// Motor axis in A's local space.
    pub fn local_axis(&self) -> Vector3 {
        self.local_axis
    }

    /// Sets the motor axis in A's local space. Must have nonzero length.
    pub fn set_local_axis(&mut self, axis: Vector3) -> ConfigResult {
        self.local_axis = ConstraintChecker::require_direction("LinearAxisMotor", "axis", axis)?;
        Ok(())
    }

    pub fn accumulated_impulse(&self) -> Real {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for LinearAxisMotor {
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

    fn update_jacobians_and_velocity_bias(&mut self, entities: &Entities, _settings: &Settings) {
        let a = BodyReference::read(entities, self.entity_a);
        let b = BodyReference::read(entities, self.entity_b);
        let axis = a.pose.orientation.transform(self.local_axis);
        let offset_a = a.pose.orientation.transform(self.local_anchor_a);
        let offset_b = b.pose.orientation.transform(self.local_anchor_b);
        self.jacobian = VelocityJacobian::point_along_direction(axis, offset_a, offset_b);
    }

    fn compute_effective_mass(&mut self, entities: &Entities) {
        let a = BodyReference::read(entities, self.entity_a);
        let b = BodyReference::read(entities, self.entity_b);
        self.effective_mass = if a.is_dynamic || b.is_dynamic {
            self.jacobian.effective_mass(&a, &b, self.coefficients.softness)
        } else {
            ZERO
        };
    }

    fn warm_start(&mut self, entities: &mut Entities) {
        self.jacobian
            .apply_impulse(entities, self.entity_a, self.entity_b, self.accumulated_impulse);
    }

    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real {
        let velocity = self
            .jacobian
            .relative_velocity(entities, self.entity_a, self.entity_b);
        let impulse = (self.goal_velocity
            - velocity
            - self.accumulated_impulse * self.coefficients.softness)
            * self.effective_mass;
        let impulse = InequalityHelpers::clamp_symmetric(
            &mut self.accumulated_impulse,
            impulse,
            self.coefficients.maximum_impulse,
        );
        self.jacobian
            .apply_impulse(entities, self.entity_a, self.entity_b, impulse);
        impulse.abs()
    }

    fn clear_accumulated_impulses(&mut self) {
        self.accumulated_impulse = ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::entity::Entity;
    use crate::utilities::math_helper::{from_int, ratio, ONE};
    use crate::utilities::matrix3x3::Matrix3x3;
    use approx::assert_abs_diff_eq;

    #[test]
    fn drives_only_along_axis() {
        let mut entities = Entities::new();
        let slider = entities.add(
            Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::from_ints(0, 0, 5), Vector3::ZERO),
        );
        let mut motor = LinearAxisMotor::new(
            &entities,
            None,
            Some(slider),
            Vector3::ZERO,
            Vector3::ZERO,
            Vector3::from_ints(2, 0, 0),
            from_int(2),
        )
        .unwrap();
        motor.settings.set_softness(ZERO).unwrap();
        motor.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        motor.solve_velocity_iteration(&mut entities);
        let velocity = entities.get(slider).unwrap().linear_velocity();
        assert_abs_diff_eq!(velocity.x.to_num::<f64>(), 2.0, epsilon = 1e-6);
        assert_eq!(velocity.z, from_int(5));
    }

    #[test]
    fn zero_axis_rejected() {
        let mut entities = Entities::new();
        let slider = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        assert!(LinearAxisMotor::new(
            &entities,
            None,
            Some(slider),
            Vector3::ZERO,
            Vector3::ZERO,
            Vector3::ZERO,
            ZERO
        )
        .is_err());
    }
}
