use crate::error::ConfigResult;
use crate::physics::constraints::body_references::{self, BodyReference};
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::rigidity_settings::{RigiditySettings, SoftnessCoefficients};
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::Real;
use crate::utilities::matrix3x3::Matrix3x3;
use crate::utilities::vector3::Vector3;

/// Provides shared functionality for constraints with jacobians similar to the ball socket.
pub struct BallSocketShared;

impl BallSocketShared {
    /// Computes the inverse of `(mA^-1 + mB^-1) I + S(rA) IA^-1 S(rA)^T + S(rB) IB^-1 S(rB)^T + softness I`.
    /// Falls back to zero when no dynamic entity is involved or the matrix is singular.
    pub fn compute_effective_mass(
        a: &BodyReference,
        b: &BodyReference,
        offset_a: Vector3,
        offset_b: Vector3,
        softness: Real,
    ) -> Matrix3x3 {
        if !a.is_dynamic && !b.is_dynamic {
            return Matrix3x3::ZERO;
        }
        let mut inverse_effective_mass = Matrix3x3::ZERO;
        if a.is_dynamic {
            let skew = Matrix3x3::create_cross_product(offset_a);
            inverse_effective_mass = inverse_effective_mass
                + Matrix3x3::multiply_transposed(
                    Matrix3x3::multiply(skew, a.inverse_inertia_tensor),
                    skew,
                );
        }
        if b.is_dynamic {
            let skew = Matrix3x3::create_cross_product(offset_b);
            inverse_effective_mass = inverse_effective_mass
                + Matrix3x3::multiply_transposed(
                    Matrix3x3::multiply(skew, b.inverse_inertia_tensor),
                    skew,
                );
        }
        // Linear contributions are simply I * inverseMass * I, which is just boosting the diagonal.
        inverse_effective_mass
            .add_diagonal(a.inverse_mass + b.inverse_mass + softness)
            .invert_or_zero()
    }

    /// Velocity of B's anchor relative to A's anchor.
    #[inline(always)]
    pub fn relative_velocity(
        entities: &Entities,
        a: Option<EntityHandle>,
        b: Option<EntityHandle>,
        offset_a: Vector3,
        offset_b: Vector3,
    ) -> Vector3 {
        let velocity_a = body_references::velocity_of(entities, a);
        let velocity_b = body_references::velocity_of(entities, b);
        velocity_b.velocity_at(offset_b) - velocity_a.velocity_at(offset_a)
    }

    /// Applies `impulse` to B's anchor and its negation to A's anchor.
    #[inline(always)]
    pub fn apply_impulse(
        entities: &mut Entities,
        a: Option<EntityHandle>,
        b: Option<EntityHandle>,
        offset_a: Vector3,
        offset_b: Vector3,
        impulse: Vector3,
    ) {
        body_references::apply_impulse(entities, a, -impulse, impulse.cross(offset_a));
        body_references::apply_impulse(entities, b, impulse, offset_b.cross(impulse));
    }
}

/// Constrains a point on one entity to a point on another entity.
#[derive(Debug, Clone)]
pub struct BallSocketJoint {
    base: ConstraintBase,
    entity_a: Option<EntityHandle>,
    entity_b: Option<EntityHandle>,
    /// Offset from the center of entity A to its anchor in A's local space.
    pub local_offset_a: Vector3,
    /// Offset from the center of entity B to its anchor in B's local space.
    pub local_offset_b: Vector3,
    /// Rigidity and force limit.
    pub rigidity_settings: RigiditySettings,
    coefficients: SoftnessCoefficients,
    world_offset_a: Vector3,
    world_offset_b: Vector3,
    error: Vector3,
    bias_velocity: Vector3,
    effective_mass: Matrix3x3,
    accumulated_impulse: Vector3,
}

impl BallSocketJoint {
    /// Connects two entities at a world space anchor. `None` attaches to the static world.
    pub fn new(
        entities: &Entities,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
        anchor: Vector3,
    ) -> ConfigResult<Self> {
        ConstraintChecker::check_connection(entities, entity_a, entity_b)?;
        let a = BodyReference::read(entities, entity_a);
        let b = BodyReference::read(entities, entity_b);
        Ok(Self {
            base: ConstraintBase::default(),
            entity_a,
            entity_b,
            local_offset_a: a.pose.orientation.conjugate().transform(anchor - a.position()),
            local_offset_b: b.pose.orientation.conjugate().transform(anchor - b.position()),
            rigidity_settings: RigiditySettings::default(),
            coefficients: SoftnessCoefficients::default(),
            world_offset_a: Vector3::ZERO,
            world_offset_b: Vector3::ZERO,
            error: Vector3::ZERO,
            bias_velocity: Vector3::ZERO,
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

    /// Separation of the anchors, B's minus A's, measured at the last update.
    pub fn error(&self) -> Vector3 {
        self.error
    }

    pub fn accumulated_impulse(&self) -> Vector3 {
        self.accumulated_impulse
    }
}

impl SolverUpdateable for BallSocketJoint {
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
        self.world_offset_a = a.pose.orientation.transform(self.local_offset_a);
        self.world_offset_b = b.pose.orientation.transform(self.local_offset_b);
        self.error = (b.position() + self.world_offset_b) - (a.position() + self.world_offset_a);
        self.bias_velocity = -(self.error * self.coefficients.error_correction_factor);
    }

    fn compute_effective_mass(&mut self, entities: &Entities) {
        let a = BodyReference::read(entities, self.entity_a);
        let b = BodyReference::read(entities, self.entity_b);
        self.effective_mass = BallSocketShared::compute_effective_mass(
            &a,
            &b,
            self.world_offset_a,
            self.world_offset_b,
            self.coefficients.softness,
        );
    }

    fn warm_start(&mut self, entities: &mut Entities) {
        BallSocketShared::apply_impulse(
            entities,
            self.entity_a,
            self.entity_b,
            self.world_offset_a,
            self.world_offset_b,
            self.accumulated_impulse,
        );
    }

    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real {
        let velocity = BallSocketShared::relative_velocity(
            entities,
            self.entity_a,
            self.entity_b,
            self.world_offset_a,
            self.world_offset_b,
        );
        let corrective_velocity = self.bias_velocity
            - velocity
            - self.accumulated_impulse * self.coefficients.softness;
        let mut impulse = self.effective_mass.transform(corrective_velocity);

        let previous = self.accumulated_impulse;
        self.accumulated_impulse =
            (previous + impulse).clamp_length(self.coefficients.maximum_impulse);
        impulse = self.accumulated_impulse - previous;

        BallSocketShared::apply_impulse(
            entities,
            self.entity_a,
            self.entity_b,
            self.world_offset_a,
            self.world_offset_b,
            impulse,
        );
        impulse.abs_sum()
    }

    fn clear_accumulated_impulses(&mut self) {
        self.accumulated_impulse = Vector3::ZERO;
    }
}
