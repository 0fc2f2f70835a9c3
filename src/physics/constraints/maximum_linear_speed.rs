use crate::error::ConfigResult;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{self, Real, ZERO};
use crate::utilities::vector3::Vector3;

/// Prevents an entity from moving faster than a maximum linear speed. Not warm-started.
#[derive(Debug, Clone)]
pub struct MaximumLinearSpeedConstraint {
    base: ConstraintBase,
    entity: EntityHandle,
    maximum_speed: Real,
    softness: Real,
    maximum_force: Real,
    used_softness: Real,
    maximum_impulse: Real,
    effective_mass: Real,
    accumulated_impulse: Vector3,
}

impl MaximumLinearSpeedConstraint {
    pub const DEFAULT_SOFTNESS: Real = math_helper::ratio(1, 100_000);

    pub fn new(entities: &Entities, entity: EntityHandle, maximum_speed: Real) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, Some(entity), None)?;
        ConstraintChecker::require_nonnegative("MaximumLinearSpeedConstraint", "maximum_speed", maximum_speed)?;
        Ok(Self {
            base: ConstraintBase::default(),
            entity,
            maximum_speed,
            softness: Self::DEFAULT_SOFTNESS,
            maximum_force: Real::MAX,
            used_softness: ZERO,
            maximum_impulse: ZERO,
            effective_mass: ZERO,
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
        ConstraintChecker::require_nonnegative("MaximumLinearSpeedConstraint", "maximum_speed", value)?;
        self.maximum_speed = value;
        Ok(())
    }

    #[inline(always)]
    pub fn softness(&self) -> Real {
        self.softness
    }

    pub fn set_softness(&mut self, value: Real) -> ConfigResult {
        ConstraintChecker::require_nonnegative("MaximumLinearSpeedConstraint", "softness", value)?;
        self.softness = value;
        Ok(())
    }

    /// Sets the maximum force. Negative values clamp to zero.
    pub fn set_maximum_force(&mut self, value: Real) {
        self.maximum_force = math_helper::max(value, ZERO);
    }

    pub fn accumulated_impulse(&self) -> Vector3 {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for MaximumLinearSpeedConstraint {
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
            Some(entity) if entity.is_dynamic() => {
                math_helper::reciprocal_or_zero(entity.inverse_mass() + self.used_softness)
            }
            _ => ZERO,
        };
    }

    fn warm_start(&mut self, _entities: &mut Entities) {
        self.accumulated_impulse = Vector3::ZERO;
    }

    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real {
        let Some(entity) = entities.get_mut(self.entity) else {
            return ZERO;
        };
        let linear_velocity = entity.linear_velocity();
        if linear_velocity.length_squared() <= math_helper::safe_mul(self.maximum_speed, self.maximum_speed) {
            return ZERO;
        }
        let speed = linear_velocity.length();
        let Some(excess_fraction) = math_helper::checked_div(speed - self.maximum_speed, speed) else {
            return ZERO;
        };
        let corrective_velocity =
            linear_velocity * -excess_fraction - self.accumulated_impulse * self.used_softness;
        let mut impulse = corrective_velocity * self.effective_mass;

        let previous = self.accumulated_impulse;
        self.accumulated_impulse = (previous + impulse).clamp_length(self.maximum_impulse);
        impulse = self.accumulated_impulse - previous;

        entity.apply_linear_impulse(impulse);
        impulse.abs_sum()
    }

    fn clear_accumulated_impulses(&mut self) {
        self.accumulated_impulse = Vector3::ZERO;
    }
}
