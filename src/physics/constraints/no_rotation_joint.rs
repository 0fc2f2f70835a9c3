use crate::error::ConfigResult;
use crate::physics::constraints::body_references::{self, BodyReference};
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::rigidity_settings::{RigiditySettings, SoftnessCoefficients};
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{self, Real, TWO};
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::quaternion::Quaternion;
use crate::utilities::vector3::Vector3;

/// Computes the effective mass of a pure angular 3D constraint: `(IA^-1 + IB^-1 + softness I)^-1`.
pub(crate) fn angular_effective_mass(a: &BodyReference, b: &BodyReference, softness: Real) -> Matrix3x3 {
    if !a.is_dynamic && !b.is_dynamic {
        return Matrix3x3::ZERO;
    }
    (a.inverse_inertia_tensor + b.inverse_inertia_tensor)
        .add_diagonal(softness)
        .invert_or_zero()
}

/// Applies `impulse` as an angular impulse to B and its negation to A.
#[inline(always)]
pub(crate) fn apply_angular_impulse(
    entities: &mut Entities,
    a: Option<EntityHandle>,
    b: Option<EntityHandle>,
    impulse: Vector3,
) {
    body_references::apply_impulse(entities, a, Vector3::ZERO, -impulse);
    body_references::apply_impulse(entities, b, Vector3::ZERO, impulse);
}

/// Angular velocity of B relative to A.
#[inline(always)]
pub(crate) fn relative_angular_velocity(
    entities: &Entities,
    a: Option<EntityHandle>,
    b: Option<EntityHandle>,
) -> Vector3 {
    body_references::velocity_of(entities, b).angular - body_references::velocity_of(entities, a).angular
}

/// Locks the relative orientation of two entities to the one they had when the joint was created.
#[derive(Debug, Clone)]
pub struct NoRotationJoint {
    base: ConstraintBase,
    entity_a: Option<EntityHandle>,
    entity_b: Option<EntityHandle>,
    /// Orientation of B relative to A that the joint maintains.
    pub initial_relative_orientation: Quaternion,
    pub rigidity_settings: RigiditySettings,
    coefficients: SoftnessCoefficients,
    error: Vector3,
    bias_velocity: Vector3,
    effective_mass: Matrix3x3,
    accumulated_impulse: Vector3,
}

impl NoRotationJoint {
    pub fn new(
        entities: &Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
    ) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, entity_a, entity_b)?;
        let a = BodyReference::read(entities, entity_a);
        let b = BodyReference::read(entities, entity_b);
        Ok(Self {
            base: ConstraintBase::default(),
            entity_a,
            entity_b,
            initial_relative_orientation: Self::relative_orientation(&a, &b),
            rigidity_settings: RigiditySettings::default(),
            coefficients: SoftnessCoefficients::default(),
            error: Vector3::ZERO,
            bias_velocity: Vector3::ZERO,
            effective_mass: Matrix3x3::ZERO,
            accumulated_impulse: Vector3::ZERO,
        })
    }

    #[inline(always)]
    fn relative_orientation(a: &BodyReference, b: &BodyReference) -> Quaternion {
        Quaternion::multiply(b.pose.orientation, a.pose.orientation.conjugate())
    }

    pub fn entity_a(&self) -> Option<EntityHandle> {
        self.entity_a
    }

    pub fn entity_b(&self) -> Option<EntityHandle> {
        self.entity_b
    }

    /// Rotation error, as a scaled axis, measured at the last update.
    pub fn error(&self) -> Vector3 {
        self.error
    }

    pub fn accumulated_impulse(&self) -> Vector3 {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for NoRotationJoint {
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
        let error_rotation = Quaternion::multiply(
            Self::relative_orientation(&a, &b),
            self.initial_relative_orientation.conjugate(),
        );
        // Small angle approximation of the error rotation's scaled axis, taken along the
        // shorter arc.
        self.error = error_rotation.xyz() * (TWO * math_helper::binary_sign(error_rotation.w));
        self.bias_velocity = -(self.error * self.coefficients.error_correction_factor);
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
        let corrective_velocity = self.bias_velocity
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
    fn relative_spin_is_removed() {
        let mut entities = Entities::new();
        let a = entities.add(
            Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::ZERO, Vector3::from_ints(0, 0, 2)),
        );
        let b = entities.add(Entity::new_dynamic(Vector3::UNIT_X, ONE, Matrix3x3::IDENTITY).unwrap());
        let mut joint = NoRotationJoint::new(&entities, Some(a), Some(b)).unwrap();
        assert_eq!(joint.initial_relative_orientation, Quaternion::IDENTITY);
        joint.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        assert_eq!(joint.error(), Vector3::ZERO);
        for _ in 0..10 {
            joint.solve_velocity_iteration(&mut entities);
        }
        let wa = entities.get(a).unwrap().angular_velocity();
        let wb = entities.get(b).unwrap().angular_velocity();
        assert_abs_diff_eq!((wb.z - wa.z).to_num::<f64>(), 0.0, epsilon = 1e-2);
        assert_abs_diff_eq!((wa.z + wb.z).to_num::<f64>(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn rotated_entity_produces_restoring_bias() {
        let mut entities = Entities::new();
        let b = entities.add(Entity::new_dynamic(Vector3::ZERO, ONE, Matrix3x3::IDENTITY).unwrap());
        let mut joint = NoRotationJoint::new(&entities, None, Some(b)).unwrap();
        // Rotate B slightly about +Z.
        let small = ratio(1, 20);
        entities.get_mut(b).unwrap().pose.orientation = Quaternion::new(ZERO, ZERO, small, ONE).normalize();
        joint.update(ratio(1, 60), from_int(60), &entities, &Settings::default());
        assert!(joint.error().z > ZERO);
        joint.solve_velocity_iteration(&mut entities);
        assert!(entities.get(b).unwrap().angular_velocity().z < ZERO);
    }
}
