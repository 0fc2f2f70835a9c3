use crate::error::ConfigResult;
use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::inequality_helpers::InequalityHelpers;
use crate::physics::constraints::rigidity_settings::{RigiditySettings, SoftnessCoefficients};
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::constraints::velocity_jacobian::VelocityJacobian;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{Real, ZERO};
use crate::utilities::vector3::Vector3;

/// Keeps two anchor points at a fixed distance from each other.
#[derive(Debug, Clone)]
pub struct DistanceJoint {
    base: ConstraintBase,
    entity_a: Option<EntityHandle>,
    entity_b: Option<EntityHandle>,
    /// Anchor on entity A in A's local space.
    pub local_anchor_a: Vector3,
    /// Anchor on entity B in B's local space.
    pub local_anchor_b: Vector3,
    distance: Real,
    pub rigidity_settings: RigiditySettings,
    coefficients: SoftnessCoefficients,
    jacobian: VelocityJacobian,
    error: Real,
    bias_velocity: Real,
    effective_mass: Real,
    accumulated_impulse: Real,
}

impl DistanceJoint {
    /// Connects two world space anchors, keeping their current distance.
    pub fn new(
        entities: &Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        anchor_a: Vector3,
        anchor_b: Vector3,
    ) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, entity_a, entity_b)?;
        let a = BodyReference::read(entities, entity_a);
        let b = BodyReference::read(entities, entity_b);
        Ok(Self {
            base: ConstraintBase::default(),
            entity_a,
            entity_b,
            local_anchor_a: a.pose.transform_by_inverse(anchor_a),
            local_anchor_b: b.pose.transform_by_inverse(anchor_b),
            distance: anchor_a.distance(anchor_b),
            rigidity_settings: RigiditySettings::default(),
            coefficients: SoftnessCoefficients::default(),
            jacobian: VelocityJacobian::default(),
            error: ZERO,
            bias_velocity: ZERO,
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

    #[inline(always)]
    pub fn distance(&self) -> Real {
        self.distance
    }

    /// Sets the target distance. Must be nonnegative.
    pub fn set_distance(&mut self, value: Real) -> ConfigResult {
        ConstraintChecker::require_nonnegative("DistanceJoint", "distance", value)?;
        self.distance = value;
        Ok(())
    }

    /// Current distance minus the target distance, measured at the last update.
    pub fn error(&self) -> Real {
        self.error
    }

    pub fn accumulated_impulse(&self) -> Real {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for DistanceJoint {
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
        self.coefficients = self.rigidity_settings.compute(dt, inverse_dt);
    }

    fn update_jacobians_and_velocity_bias(&mut self, entities: &Entities, _settings: &Settings) {
        let a = BodyReference::read(entities, self.entity_a);
        let b = BodyReference::read(entities, self.entity_b);
        let offset_a = a.pose.orientation.transform(self.local_anchor_a);
        let offset_b = b.pose.orientation.transform(self.local_anchor_b);
        let separation = (b.position() + offset_b) - (a.position() + offset_a);
        let current_distance = separation.length();
        self.error = current_distance - self.distance;
        self.jacobian = match separation.try_normalize() {
            Some(direction) => VelocityJacobian::point_along_direction(direction, offset_a, offset_b),
            // Coincident anchors have no usable direction; contribute nothing this step.
            None => VelocityJacobian::default(),
        };
        self.bias_velocity = -(self.error * self.coefficients.error_correction_factor);
    }

    fn compute_effective_mass(&mut self, entities: &Entities) {
        if self.jacobian == VelocityJacobian::default() {
            self.effective_mass = ZERO;
            return;
        }
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
        let impulse = (self.bias_velocity
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
