use crate::error::ConfigResult;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{self, Real, ZERO};
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::vector3::Vector3;

/// Prevents an entity from spinning faster than a maximum angular speed.
///
/// Not warm-started: the limit is not a position error nor a velocity goal, so the accumulated
/// impulse is discarded at the start of every step.
#[derive(Debug, Clone)]
pub struct MaximumAngularSpeedConstraint {
    base: ConstraintBase,
    entity: EntityHandle,
    maximum_speed: Real,
    softness: Real,
    maximum_force: Real,
    used_softness: Real,
    maximum_impulse: Real,
    effective_mass: Matrix3x3,
    accumulated_impulse: Vector3,
}

impl MaximumAngularSpeedConstraint {
    pub const DEFAULT_SOFTNESS: Real = math_helper::ratio(1, 100_000);

    pub fn new(entities: &Entities, entity: EntityHandle, maximum_speed: Real) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, Some(entity), None)?;
        ConstraintChecker::require_nonnegative("MaximumAngularSpeedConstraint", "maximum_speed", maximum_speed)?;
        Ok(Self {
            base: ConstraintBase::default(),
            entity,
            maximum_speed,
            softness: Self::DEFAULT_SOFTNESS,
            maximum_force: Real::MAX,
            used_softness: ZERO,
            maximum_impulse: ZERO,
            effective_mass: Matrix3x3::ZERO,
            accumulated_impulse: Vector3::ZERO,
        })
    }

    pub fn entity(&self) -> EntityHandle {
        self.entity
    }

    #[inline(always)]
    pub fn maximum_speed(&self) -> Real {
        self.maximum_speed
    }

    pub fn set_maximum_speed(&mut self, value: Real) -> ConfigResult {
        ConstraintChecker::require_nonnegative("MaximumAngularSpeedConstraint", "maximum_speed", value)?;
        self.maximum_speed = value;
        Ok(())
    }

    #[inline(always)]
    pub fn softness(&self) -> Real {
        self.softness
    }

    pub fn set_softness(&mut self, value: Real) -> ConfigResult {
        ConstraintChecker::require_nonnegative("MaximumAngularSpeedConstraint", "softness", value)?;
        self.softness = value;
        Ok(())
    }

    #[inline(always)]
    pub fn maximum_force(&self) -> Real {
        self.maximum_force
    }

    /// Sets the maximum force. Negative values clamp to zero.
    pub fn set_maximum_force(&mut self, value: Real) {
        self.maximum_force = math_helper::max(value, ZERO);
    }

    pub fn accumulated_impulse(&self) -> Vector3 {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for MaximumAngularSpeedConstraint {
    fn base(&self) -> &ConstraintBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ConstraintBase {
        &mut self.base
    }

    fn involved_entities(&self, handles: &mut Vec<EntityHandle>) {
        handles.push(self.entity);
    }

    fn preupdate(&mut self, dt: Real, inverse_dt: Real, _settings: &Settings) {
        self.used_softness = math_helper::safe_mul(self.softness, inverse_dt);
        self.maximum_impulse = math_helper::safe_mul(self.maximum_force, dt);
    }

    fn update_jacobians_and_velocity_bias(&mut self, _entities: &Entities, _settings: &Settings) {}

    fn compute_effective_mass(&mut self, entities: &Entities) {
        self.effective_mass = match entities.get(self.entity) {
            Some(entity) if entity.is_dynamic() => entity
                .world_inverse_inertia_tensor()
                .add_diagonal(self.used_softness)
                .invert_or_zero(),
            _ => Matrix3x3::ZERO,
        };
    }

    fn warm_start(&mut self, _entities: &mut Entities) {
        self.accumulated_impulse = Vector3::ZERO;
    }

    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real {
        let Some(entity) = entities.get_mut(self.entity) else {
            return ZERO;
        };
        let angular_velocity = entity.angular_velocity();
        if angular_velocity.length_squared() <= math_helper::safe_mul(self.maximum_speed, self.maximum_speed) {
            return ZERO;
        }
        let speed = angular_velocity.length();
        let Some(excess_fraction) = math_helper::checked_div(speed - self.maximum_speed, speed) else {
            return ZERO;
        };
        // Velocity change that would bring the speed back to the limit.
        let velocity_change = angular_velocity * -excess_fraction;
        let corrective_velocity = velocity_change - self.accumulated_impulse * self.used_softness;
        let mut impulse = self.effective_mass.transform(corrective_velocity);

        let previous = self.accumulated_impulse;
        self.accumulated_impulse = (previous + impulse).clamp_length(self.maximum_impulse);
        impulse = self.accumulated_impulse - previous;

        entity.apply_angular_impulse(impulse);
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
    use crate::physics::inertia_helper::InertiaHelper;
    use crate::utilities::math_helper::{from_int, ratio, ONE};

    #[test]
    fn slows_spinning_entity_to_limit() {
        let mut entities = Entities::new();
        let mass = from_int(2);
        let spinner = entities.add(
            Entity::new_dynamic(Vector3::ZERO, mass, InertiaHelper::box_tensor(mass, ONE, from_int(2), ONE))
                .unwrap()
                .with_velocity(Vector3::ZERO, Vector3::from_ints(6, 0, 8)),
        );
        let mut limiter = MaximumAngularSpeedConstraint::new(&entities, spinner, from_int(5)).unwrap();
        limiter.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        limiter.warm_start(&mut entities);
        limiter.solve_velocity_iteration(&mut entities);
        let speed = entities.get(spinner).unwrap().angular_velocity().length();
        assert!(speed.to_num::<f64>() <= 5.0 + 0.01);
        assert!(speed.to_num::<f64>() >= 4.9);
    }

    #[test]
    fn slow_entity_untouched() {
        let mut entities = Entities::new();
        let spinner = entities.add(
            Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::ZERO, Vector3::UNIT_X),
        );
        let mut limiter = MaximumAngularSpeedConstraint::new(&entities, spinner, from_int(5)).unwrap();
        limiter.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        assert_eq!(limiter.solve_velocity_iteration(&mut entities), ZERO);
        assert_eq!(entities.get(spinner).unwrap().angular_velocity(), Vector3::UNIT_X);
    }

    #[test]
    fn warm_start_discards_previous_impulse() {
        let mut entities = Entities::new();
        let spinner = entities.add(
            Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::ZERO, Vector3::from_ints(10, 0, 0)),
        );
        let mut limiter = MaximumAngularSpeedConstraint::new(&entities, spinner, ONE).unwrap();
        limiter.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        limiter.solve_velocity_iteration(&mut entities);
        assert_ne!(limiter.accumulated_impulse(), Vector3::ZERO);
        let before = entities.get(spinner).unwrap().angular_velocity();
        limiter.warm_start(&mut entities);
        assert_eq!(limiter.accumulated_impulse(), Vector3::ZERO);
        assert_eq!(entities.get(spinner).unwrap().angular_velocity(), before);
    }
}
