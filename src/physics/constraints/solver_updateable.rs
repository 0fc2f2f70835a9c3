use crate::physics::constraints::solver_settings::SolverSettings;
use crate::physics::entities::Entities;
use crate::physics::handles::EntityHandle;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::Real;
use std::any::Any;
use std::fmt;

/// State every constraint carries regardless of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintBase {
    is_active: bool,
    /// Iteration controls for this constraint.
    pub solver_settings: SolverSettings,
}

impl Default for ConstraintBase {
    fn default() -> Self {
        Self {
            is_active: true,
            solver_settings: SolverSettings::default(),
        }
    }
}

impl ConstraintBase {
    #[inline(always)]
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

/// Upcast helper so trait objects can be downcast to their concrete constraint type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline(always)]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline(always)]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A unit of work processed by the solver.
///
/// Each step the solver calls, for every active constraint, `update` (which runs `preupdate`,
/// `update_jacobians_and_velocity_bias` and `compute_effective_mass`), then `warm_start` once,
/// then `solve_velocity_iteration` up to the iteration limit.
pub trait SolverUpdateable: AsAny + Send + fmt::Debug {
    fn base(&self) -> &ConstraintBase;

    fn base_mut(&mut self) -> &mut ConstraintBase;

    /// Pushes the handles of every entity this constraint acts on.
    fn involved_entities(&self, handles: &mut Vec<EntityHandle>);

    /// Derives the per-step coefficients from the constraint's tunables.
    fn preupdate(&mut self, dt: Real, inverse_dt: Real, settings: &Settings);

    /// Recomputes Jacobians from the current poses, and the bias velocity from the position error.
    fn update_jacobians_and_velocity_bias(&mut self, entities: &Entities, settings: &Settings);

    /// Computes the effective mass from the Jacobians and the entities' mass properties.
    fn compute_effective_mass(&mut self, entities: &Entities);

    /// Reapplies the impulse accumulated during the previous step.
    fn warm_start(&mut self, entities: &mut Entities);

    /// Computes and applies one corrective impulse. Returns the magnitude of the impulse applied.
    fn solve_velocity_iteration(&mut self, entities: &mut Entities) -> Real;

    /// Zeroes every accumulated impulse.
    fn clear_accumulated_impulses(&mut self);

    /// Runs the three update phases.
    fn update(&mut self, dt: Real, inverse_dt: Real, entities: &Entities, settings: &Settings) {
        self.preupdate(dt, inverse_dt, settings);
        self.update_jacobians_and_velocity_bias(entities, settings);
        self.compute_effective_mass(entities);
    }

    #[inline(always)]
    fn is_active(&self) -> bool {
        self.base().is_active
    }

    /// Activates or deactivates the constraint. Any change of state discards the accumulated
    /// impulses, so a reactivated constraint starts cold.
    fn set_active(&mut self, active: bool) {
        if self.base().is_active != active {
            self.clear_accumulated_impulses();
            self.base_mut().is_active = active;
        }
    }

    #[inline(always)]
    fn solver_settings(&self) -> &SolverSettings {
        &self.base().solver_settings
    }

    #[inline(always)]
    fn solver_settings_mut(&mut self) -> &mut SolverSettings {
        &mut self.base_mut().solver_settings
    }

    /// Whether every involved entity still exists.
    fn entities_exist(&self, entities: &Entities) -> bool {
        let mut handles = Vec::new();
        self.involved_entities(&mut handles);
        handles.iter().all(|&handle| entities.contains(handle))
    }
}

impl dyn SolverUpdateable {
    /// Downcasts to a concrete constraint type.
    pub fn downcast_ref<T: SolverUpdateable>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts to a concrete constraint type.
    pub fn downcast_mut<T: SolverUpdateable>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Takes ownership of a boxed constraint as its concrete type.
    pub fn downcast<T: SolverUpdateable>(self: Box<Self>) -> Option<Box<T>> {
        AsAny::into_any(self).downcast::<T>().ok()
    }
}
