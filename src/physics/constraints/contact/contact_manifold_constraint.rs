use crate::error::ConfigResult;
use crate::physics::constraints::body_references::BodyReference;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::contact::contact::{Contact, ContactData};
use crate::physics::constraints::contact::penetration_limit::PenetrationConstraint;
use crate::physics::constraints::contact::tangent_friction::SlidingFrictionConstraint;
use crate::physics::constraints::contact::twist_friction::TwistFrictionConstraint;
use crate::physics::constraints::solver_updateable::{ConstraintBase, SolverUpdateable};
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::materials::{InteractionProperties, MaterialId, MaterialManager};
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{self, Real, ONE, ZERO};
use crate::utilities::vector3::Vector3;
use tracing::trace;

/// Which friction coefficient a manifold uses for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrictionMode {
    #[default]
    Static,
    Kinetic,
}

/// Outcome of offering a contact to a manifold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactAddResult {
    /// Stored as a new contact.
    Added,
    /// Matched an existing contact's id; geometry refreshed, accumulated impulse kept.
    Updated,
    /// Replaced the shallowest contact of a full manifold.
    Replaced,
    /// Redundant, too separated, or shallower than everything in a full manifold.
    Rejected,
}

impl ContactAddResult {
    #[inline(always)]
    pub fn is_stored(self) -> bool {
        self != Self::Rejected
    }
}

/// All the contacts between one pair of entities, solved together.
///
/// Each contact gets a penetration constraint. Friction is shared: one two dimensional sliding
/// constraint at the manifold center and one twist constraint about the average normal, both
/// bounded by the normal impulses of the contacts.
#[derive(Debug, Clone)]
pub struct ContactManifoldConstraint {
    base: ConstraintBase,
    entity_a: Option<EntityHandle>,
    entity_b: Option<EntityHandle>,
    material: InteractionProperties,
    penetration_constraints: Vec<PenetrationConstraint>,
    sliding_friction: SlidingFrictionConstraint,
    twist_friction: TwistFrictionConstraint,
    lever_arms: [Real; Self::MAXIMUM_CONTACTS],
    friction_mode: FrictionMode,
    inverse_dt: Real,
}

impl Default for ContactManifoldConstraint {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactManifoldConstraint {
    pub const MAXIMUM_CONTACTS: usize = 4;

    /// Creates an inactive manifold connected to nothing. Use [`setup`](Self::setup) to attach it.
    pub fn new() -> Self {
        let mut manifold = Self {
            base: ConstraintBase::default(),
            entity_a: None,
            entity_b: None,
            material: InteractionProperties::default(),
            penetration_constraints: Vec::with_capacity(Self::MAXIMUM_CONTACTS),
            sliding_friction: SlidingFrictionConstraint::default(),
            twist_friction: TwistFrictionConstraint::default(),
            lever_arms: [ZERO; Self::MAXIMUM_CONTACTS],
            friction_mode: FrictionMode::Static,
            inverse_dt: ZERO,
        };
        manifold.set_active(false);
        manifold
    }

    /// Attaches the manifold to a pair of entities and activates it.
    pub fn setup(
        &mut self,
        entities: &Entities,
        materials: &MaterialManager,
        entity_a: Option<EntityHandle>,
        entity_b: Option<EntityHandle>,
    ) -> ConfigResult {
        ConstraintChecker::check_connection(entities, entity_a, entity_b)?;
        self.clean_up();
        self.entity_a = entity_a;
        self.entity_b = entity_b;
        self.refresh_material(entities, materials);
        self.set_active(true);
        Ok(())
    }

    /// Detaches the manifold, drops every contact and deactivates it.
    pub fn clean_up(&mut self) {
        self.set_active(false);
        self.entity_a = None;
        self.entity_b = None;
        self.penetration_constraints.clear();
        self.clear_accumulated_impulses();
        self.lever_arms = [ZERO; Self::MAXIMUM_CONTACTS];
        self.friction_mode = FrictionMode::Static;
    }

    /// Recomputes the blended friction and bounciness from the entities' current materials.
    pub fn refresh_material(&mut self, entities: &Entities, materials: &MaterialManager) {
        let material_of = |handle: Option<EntityHandle>| {
            handle
                .and_then(|handle| entities.get(handle))
                .map_or(MaterialId::DEFAULT, |entity| entity.material)
        };
        self.material =
            materials.interaction_properties(material_of(self.entity_a), material_of(self.entity_b));
    }

    pub fn entity_a(&self) -> Option<EntityHandle> {
        self.entity_a
    }

    pub fn entity_b(&self) -> Option<EntityHandle> {
        self.entity_b
    }

    pub fn material(&self) -> &InteractionProperties {
        &self.material
    }

    pub fn friction_mode(&self) -> FrictionMode {
        self.friction_mode
    }

    pub fn contact_count(&self) -> usize {
        self.penetration_constraints.len()
    }

    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.penetration_constraints.iter().map(|constraint| &constraint.contact)
    }

    pub fn penetration_constraints(&self) -> &[PenetrationConstraint] {
        &self.penetration_constraints
    }

    pub fn sliding_friction(&self) -> &SlidingFrictionConstraint {
        &self.sliding_friction
    }

    pub fn twist_friction(&self) -> &TwistFrictionConstraint {
        &self.twist_friction
    }

    /// Sum of the accumulated normal impulses of every contact.
    pub fn total_normal_impulse(&self) -> Real {
        self.penetration_constraints
            .iter()
            .fold(ZERO, |sum, constraint| sum.saturating_add(constraint.accumulated_impulse))
    }

    /// Offers a contact from collision detection.
    ///
    /// A contact whose id matches a stored one refreshes it in place. Otherwise the contact is
    /// rejected when it is separated by more than the maximum contact distance or sits within the
    /// minimum separation distance of a stored contact. A full manifold swaps out its shallowest
    /// contact for a deeper newcomer.
    pub fn add_contact(&mut self, entities: &Entities, settings: &Settings, data: &ContactData) -> ContactAddResult {
        let detection = &settings.collision_detection;
        if data.penetration_depth < -detection.maximum_contact_distance() {
            return ContactAddResult::Rejected;
        }
        let pose_a = BodyReference::read(entities, self.entity_a).pose;
        let pose_b = BodyReference::read(entities, self.entity_b).pose;

        if let Some(existing) = self
            .penetration_constraints
            .iter_mut()
            .find(|constraint| constraint.contact.id == data.id)
        {
            existing.contact.set(data, &pose_a, &pose_b);
            return ContactAddResult::Updated;
        }

        let minimum_separation_squared = detection.contact_minimum_separation_distance_squared();
        let redundant = self.contacts().any(|contact| {
            (contact.position - data.position).length_squared() < minimum_separation_squared
        });
        if redundant {
            return ContactAddResult::Rejected;
        }

        let contact = Contact::new(data, &pose_a, &pose_b);
        if self.penetration_constraints.len() < Self::MAXIMUM_CONTACTS {
            self.penetration_constraints.push(PenetrationConstraint::new(contact));
            return ContactAddResult::Added;
        }

        let shallowest = self
            .penetration_constraints
            .iter_mut()
            .min_by_key(|constraint| constraint.contact.penetration_depth);
        match shallowest {
            Some(shallowest) if shallowest.contact.penetration_depth < data.penetration_depth => {
                trace!(
                    replaced = shallowest.contact.id,
                    id = data.id,
                    "Replaced shallowest manifold contact"
                );
                *shallowest = PenetrationConstraint::new(contact);
                ContactAddResult::Replaced
            }
            _ => ContactAddResult::Rejected,
        }
    }

    /// Removes the contact at `index`, returning it.
    pub fn remove_contact(&mut self, index: usize) -> Option<Contact> {
        if index < self.penetration_constraints.len() {
            Some(self.penetration_constraints.swap_remove(index).contact)
        } else {
            None
        }
    }

    /// Moves every contact along with its entities and drops the ones that no longer hold.
    ///
    /// A contact goes away once its anchors drift apart tangentially past the invalidation length,
    /// or once it separates by more than the maximum contact distance. Returns how many were
    /// removed.
    pub fn refresh(&mut self, entities: &Entities, settings: &Settings) -> usize {
        let detection = &settings.collision_detection;
        let pose_a = BodyReference::read(entities, self.entity_a).pose;
        let pose_b = BodyReference::read(entities, self.entity_b).pose;
        let invalidation_length_squared = detection.contact_invalidation_length_squared();
        let maximum_separation = -detection.maximum_contact_distance();
        let before = self.penetration_constraints.len();
        self.penetration_constraints.retain_mut(|constraint| {
            constraint
                .contact
                .refresh(&pose_a, &pose_b, invalidation_length_squared)
                && constraint.contact.penetration_depth >= maximum_separation
        });
        before - self.penetration_constraints.len()
    }

    fn average_normal(&self) -> Vector3 {
        let sum = self
            .contacts()
            .fold(Vector3::ZERO, |sum, contact| sum + contact.normal);
        match sum.try_normalize() {
            Some(normal) => normal,
            None => self
                .contacts()
                .next()
                .map_or(Vector3::ZERO, |contact| contact.normal),
        }
    }

    fn manifold_center(&self) -> Vector3 {
        let count = self.penetration_constraints.len();
        if count == 0 {
            return Vector3::ZERO;
        }
        let sum = self
            .contacts()
            .fold(Vector3::ZERO, |sum, contact| sum + contact.position);
        sum * (ONE / Real::from_num(count))
    }

    fn maximum_twist_impulse(&self) -> Real {
        let weighted = self
            .penetration_constraints
            .iter()
            .zip(self.lever_arms.iter())
            .fold(ZERO, |sum, (constraint, lever_arm)| {
                sum.saturating_add(math_helper::safe_mul(*lever_arm, constraint.accumulated_impulse))
            });
        math_helper::safe_mul(self.twist_friction.friction(), weighted)
    }
}

impl SolverUpdateable for ContactManifoldConstraint {
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

    fn preupdate(&mut self, _dt: Real, inverse_dt: Real, _settings: &Settings) {
        self.inverse_dt = inverse_dt;
    }

    fn update_jacobians_and_velocity_bias(&mut self, entities: &Entities, settings: &Settings) {
        if self.penetration_constraints.is_empty() {
            return;
        }
        let a = BodyReference::read(entities, self.entity_a);
        let b = BodyReference::read(entities, self.entity_b);
        let response = &settings.collision_response;
        let allowed_penetration = settings.collision_detection.allowed_penetration();
        for constraint in self.penetration_constraints.iter_mut() {
            constraint.update(
                &a,
                &b,
                self.inverse_dt,
                allowed_penetration,
                response,
                self.material.bounciness,
            );
        }

        let center = self.manifold_center();
        let normal = self.average_normal();
        self.sliding_friction.update(&a, &b, center, normal);
        self.twist_friction.update(&a, &b, normal);

        let mut lever_arms = [ZERO; Self::MAXIMUM_CONTACTS];
        for (lever_arm, contact) in lever_arms.iter_mut().zip(self.contacts()) {
            *lever_arm = contact.position.distance(center);
        }
        self.lever_arms = lever_arms;

        let threshold = response.static_friction_velocity_threshold();
        let kinetic = self.twist_friction.relative_velocity().abs() > threshold
            || self.sliding_friction.relative_velocity().abs_sum() > threshold;
        self.friction_mode = if kinetic {
            FrictionMode::Kinetic
        } else {
            FrictionMode::Static
        };
        let friction = match self.friction_mode {
            FrictionMode::Static => self.material.static_friction,
            FrictionMode::Kinetic => self.material.kinetic_friction,
        };
        self.sliding_friction.set_friction(friction);
        self.twist_friction
            .set_friction(math_helper::safe_mul(friction, response.twist_friction_factor()));
    }

    /// No-op: the contact constraints compute their effective masses while updating jacobians.
    fn compute_effective_mass(&mut self, _entities: &Entities) {}

    fn warm_start(&mut self, entities: &mut Entities) {
        if self.penetration_constraints.is_empty() {
            return;
        }
        for constraint in &self.penetration_constraints {
            constraint.warm_start(entities, self.entity_a, self.entity_b);
        }
        self.sliding_friction
            .warm_start(entities, self.entity_a, self.entity_b);
        self.twist_friction
            .warm_start(entities, self.entity_a, self.entity_b);
    }

    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real {
        if self.penetration_constraints.is_empty() {
            return ZERO;
        }
        let mut total = ZERO;
        for constraint in self.penetration_constraints.iter_mut() {
            total = total.saturating_add(constraint.solve_iteration(entities, self.entity_a, self.entity_b));
        }

        let maximum_sliding_impulse =
            math_helper::safe_mul(self.sliding_friction.friction(), self.total_normal_impulse());
        total = total.saturating_add(self.sliding_friction.solve_iteration(
            entities,
            self.entity_a,
            self.entity_b,
            maximum_sliding_impulse,
        ));

        let maximum_twist_impulse = self.maximum_twist_impulse();
        total.saturating_add(self.twist_friction.solve_iteration(
            entities,
            self.entity_a,
            self.entity_b,
            maximum_twist_impulse,
        ))
    }

    fn clear_accumulated_impulses(&mut self) {
        for constraint in self.penetration_constraints.iter_mut() {
            constraint.accumulated_impulse = ZERO;
        }
        self.sliding_friction.clear_accumulated_impulse();
        self.twist_friction.clear_accumulated_impulse();
    }
}
