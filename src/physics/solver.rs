use crate::error::{ConfigError, ConfigResult};
use crate::physics::constraints::solver_updateable::SolverUpdateable;
use crate::physics::entities::Entities;
use crate::physics::handles::{ConstraintHandle, EntityHandle};
use crate::physics::islands::Islands;
use crate::physics::settings::Settings;
use crate::utilities::math_helper::{self, Real, ZERO};
use std::fmt;
use tracing::{debug, trace, warn};

/// Where the solver is within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolverState {
    #[default]
    Idle,
    /// Every active constraint has computed its jacobians, bias and effective mass.
    Updated,
    /// Accumulated impulses from the previous step have been reapplied.
    WarmStarted,
    Iterating,
    /// A full pass applied no more than the minimum total impulse.
    Converged,
    /// The iteration limit was hit before convergence.
    IterationLimitReached,
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Summary of one velocity solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveReport {
    /// Either `Converged` or `IterationLimitReached`.
    pub state: SolverState,
    /// Number of full passes over the constraints.
    pub iterations: u32,
    /// Sum of the impulse magnitudes applied during the final pass.
    pub last_total_impulse: Real,
}

impl SolveReport {
    const EMPTY: Self = Self {
        state: SolverState::Converged,
        iterations: 0,
        last_total_impulse: ZERO,
    };

    #[inline(always)]
    pub fn converged(&self) -> bool {
        self.state == SolverState::Converged
    }

    /// Combines the reports of independently solved islands.
    fn merge(self, other: Self) -> Self {
        let state = if self.state == SolverState::IterationLimitReached
            || other.state == SolverState::IterationLimitReached
        {
            SolverState::IterationLimitReached
        } else {
            SolverState::Converged
        };
        Self {
            state,
            iterations: self.iterations.max(other.iterations),
            last_total_impulse: self.last_total_impulse.saturating_add(other.last_total_impulse),
        }
    }
}

struct ConstraintSlot {
    generation: u32,
    constraint: Option<Box<dyn SolverUpdateable>>,
}

/// Sequential impulse solver.
///
/// Owns the constraints and drives them through update, warm start and velocity iterations. Each
/// iteration visits every active constraint once in insertion order, so results depend only on
/// the inputs and the order constraints were added.
pub struct Solver {
    slots: Vec<ConstraintSlot>,
    free_slots: Vec<u32>,
    count: usize,
    iteration_limit: u32,
    minimum_total_impulse: Real,
    state: SolverState,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Solver")
            .field("constraints", &self.count)
            .field("iteration_limit", &self.iteration_limit)
            .field("minimum_total_impulse", &self.minimum_total_impulse)
            .field("state", &self.state)
            .finish()
    }
}

impl Solver {
    pub const DEFAULT_ITERATION_LIMIT: u32 = 10;
    pub const DEFAULT_MINIMUM_TOTAL_IMPULSE: Real = math_helper::ratio(1, 100_000);

    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_slots: Vec::new(),
            count: 0,
            iteration_limit: Self::DEFAULT_ITERATION_LIMIT,
            minimum_total_impulse: Self::DEFAULT_MINIMUM_TOTAL_IMPULSE,
            state: SolverState::Idle,
        }
    }

    /// Maximum number of velocity iterations per step.
    #[inline(always)]
    pub fn iteration_limit(&self) -> u32 {
        self.iteration_limit
    }

    pub fn set_iteration_limit(&mut self, value: u32) -> ConfigResult {
        if value == 0 {
            return Err(ConfigError::ZeroCount {
                type_name: "Solver",
                property: "iteration_limit",
            });
        }
        self.iteration_limit = value;
        Ok(())
    }

    /// Total impulse of a full pass at or below which the solve is considered converged.
    #[inline(always)]
    pub fn minimum_total_impulse(&self) -> Real {
        self.minimum_total_impulse
    }

    pub fn set_minimum_total_impulse(&mut self, value: Real) -> ConfigResult {
        if value < ZERO {
            return Err(ConfigError::Negative {
                type_name: "Solver",
                property: "minimum_total_impulse",
                value,
            });
        }
        self.minimum_total_impulse = value;
        Ok(())
    }

    #[inline(always)]
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Number of constraints owned by the solver, active or not.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Adds a constraint, returning its handle.
    pub fn add<C: SolverUpdateable>(&mut self, constraint: C) -> ConstraintHandle {
        self.add_boxed(Box::new(constraint))
    }

    /// Adds an already boxed constraint, such as a pooled contact manifold.
    pub fn add_boxed(&mut self, constraint: Box<dyn SolverUpdateable>) -> ConstraintHandle {
        self.count += 1;
        self.state = SolverState::Idle;
        if let Some(index) = self.free_slots.pop() {
            let slot = &mut self.slots[index as usize];
            slot.constraint = Some(constraint);
            return ConstraintHandle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(ConstraintSlot {
            generation: 0,
            constraint: Some(constraint),
        });
        ConstraintHandle::new(index, 0)
    }

    /// Removes a constraint and hands it back to the caller.
    pub fn remove(&mut self, handle: ConstraintHandle) -> Option<Box<dyn SolverUpdateable>> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let constraint = slot.constraint.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_slots.push(handle.index);
        self.count -= 1;
        self.state = SolverState::Idle;
        Some(constraint)
    }

    #[inline(always)]
    pub fn contains(&self, handle: ConstraintHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: ConstraintHandle) -> Option<&(dyn SolverUpdateable + 'static)> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.constraint.as_deref()
    }

    pub fn get_mut(&mut self, handle: ConstraintHandle) -> Option<&mut (dyn SolverUpdateable + 'static)> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.constraint.as_deref_mut()
    }

    /// Looks a constraint up as its concrete type.
    pub fn get_as<T: SolverUpdateable>(&self, handle: ConstraintHandle) -> Option<&T> {
        self.get(handle)?.downcast_ref::<T>()
    }

    /// Looks a constraint up mutably as its concrete type.
    pub fn get_as_mut<T: SolverUpdateable>(&mut self, handle: ConstraintHandle) -> Option<&mut T> {
        self.get_mut(handle)?.downcast_mut::<T>()
    }

    /// Iterates over every constraint in insertion slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ConstraintHandle, &(dyn SolverUpdateable + 'static))> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.constraint
                .as_deref()
                .map(|constraint| (ConstraintHandle::new(index as u32, slot.generation), constraint))
        })
    }

    /// Removes every constraint acting on `entity`, returning them in slot order.
    pub fn remove_constraints_of(&mut self, entity: EntityHandle) -> Vec<Box<dyn SolverUpdateable>> {
        let mut involved = Vec::new();
        let doomed: Vec<ConstraintHandle> = self
            .iter()
            .filter(|(_, constraint)| {
                involved.clear();
                constraint.involved_entities(&mut involved);
                involved.contains(&entity)
            })
            .map(|(handle, _)| handle)
            .collect();
        if !doomed.is_empty() {
            debug!(%entity, count = doomed.len(), "Removing constraints of entity");
        }
        doomed
            .into_iter()
            .filter_map(|handle| self.remove(handle))
            .collect()
    }

    /// Deactivates active constraints whose entities no longer exist.
    fn deactivate_orphans(&mut self, entities: &Entities) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(constraint) = slot.constraint.as_deref_mut() else {
                continue;
            };
            if constraint.is_active() && !constraint.entities_exist(entities) {
                warn!(
                    constraint = %ConstraintHandle::new(index as u32, slot.generation),
                    "Deactivating constraint connected to a removed entity"
                );
                constraint.set_active(false);
            }
        }
    }

    fn active_constraints(&mut self) -> Vec<&mut (dyn SolverUpdateable + 'static)> {
        self.slots
            .iter_mut()
            .filter_map(|slot| slot.constraint.as_deref_mut())
            .filter(|constraint| constraint.is_active())
            .collect()
    }

    /// Prepares every active constraint for the step.
    pub fn update(&mut self, entities: &Entities, settings: &Settings, dt: Real) {
        self.deactivate_orphans(entities);
        let inverse_dt = math_helper::reciprocal_or_zero(dt);
        let mut active = self.active_constraints();
        update_constraints(&mut active, entities, settings, dt, inverse_dt);
        debug!(constraints = active.len(), %dt, "Solver updated");
        self.state = SolverState::Updated;
    }

    /// Reapplies each active constraint's accumulated impulse from the previous step.
    pub fn warm_start(&mut self, entities: &mut Entities) {
        let mut active = self.active_constraints();
        warm_start_constraints(&mut active, entities);
        self.state = SolverState::WarmStarted;
    }

    /// Runs velocity iterations until convergence or the iteration limit.
    pub fn iterate(&mut self, entities: &mut Entities) -> SolveReport {
        self.state = SolverState::Iterating;
        let iteration_limit = self.iteration_limit;
        let minimum_total_impulse = self.minimum_total_impulse;
        let mut active = self.active_constraints();
        let report = iterate_constraints(&mut active, entities, iteration_limit, minimum_total_impulse);
        debug!(
            state = %report.state,
            iterations = report.iterations,
            last_total_impulse = %report.last_total_impulse,
            "Solver finished iterating"
        );
        self.state = report.state;
        report
    }

    /// Update, warm start and iterate in one call.
    pub fn solve(&mut self, entities: &mut Entities, settings: &Settings, dt: Real) -> SolveReport {
        self.update(entities, settings, dt);
        self.warm_start(entities);
        self.iterate(entities)
    }

    /// Same as [`solve`](Self::solve), but independent islands are solved on scoped threads.
    ///
    /// Each island works on its own copy of the entities it touches; the dynamic entities'
    /// velocities are copied back afterwards. Islands never share a dynamic entity, so the result
    /// matches a serial solve of each island in isolation.
    pub fn solve_islands_parallel(
        &mut self,
        entities: &mut Entities,
        settings: &Settings,
        dt: Real,
    ) -> SolveReport {
        self.deactivate_orphans(entities);
        let inverse_dt = math_helper::reciprocal_or_zero(dt);
        let iteration_limit = self.iteration_limit;
        let minimum_total_impulse = self.minimum_total_impulse;

        let mut active: Vec<Option<&mut (dyn SolverUpdateable + 'static)>> =
            self.active_constraints().into_iter().map(Some).collect();
        let islands = Islands::build(
            entities,
            active
                .iter()
                .filter_map(|constraint| constraint.as_deref())
                .map(|constraint| constraint as &dyn SolverUpdateable),
        );
        debug!(islands = islands.len(), constraints = active.len(), "Solving islands in parallel");

        let shared: &Entities = entities;
        let jobs: Vec<_> = islands
            .into_iter()
            .map(|island| {
                let constraints: Vec<_> = island
                    .constraints
                    .iter()
                    .filter_map(|&position| active[position].take())
                    .collect();
                let island_entities = shared.gather(&island.entities);
                (island.entities, island_entities, constraints)
            })
            .collect();

        let outcome = crossbeam_utils::thread::scope(|scope| {
            let workers: Vec<_> = jobs
                .into_iter()
                .map(|(handles, mut island_entities, mut constraints)| {
                    scope.spawn(move |_| {
                        update_constraints(&mut constraints, &island_entities, settings, dt, inverse_dt);
                        warm_start_constraints(&mut constraints, &mut island_entities);
                        let report = iterate_constraints(
                            &mut constraints,
                            &mut island_entities,
                            iteration_limit,
                            minimum_total_impulse,
                        );
                        (handles, island_entities, report)
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|worker| worker.join())
                .collect::<Vec<_>>()
        });
        let results = match outcome {
            Ok(results) => results,
            Err(payload) => std::panic::resume_unwind(payload),
        };

        let mut report = SolveReport::EMPTY;
        for result in results {
            let (handles, island_entities, island_report) = match result {
                Ok(result) => result,
                Err(payload) => std::panic::resume_unwind(payload),
            };
            entities.scatter_velocities(&island_entities, &handles);
            report = report.merge(island_report);
        }
        debug!(
            state = %report.state,
            iterations = report.iterations,
            last_total_impulse = %report.last_total_impulse,
            "Solver finished islands"
        );
        self.state = report.state;
        report
    }
}

fn update_constraints(
    constraints: &mut [&mut (dyn SolverUpdateable + 'static)],
    entities: &Entities,
    settings: &Settings,
    dt: Real,
    inverse_dt: Real,
) {
    for constraint in constraints.iter_mut() {
        constraint.solver_settings_mut().reset_counters();
        constraint.update(dt, inverse_dt, entities, settings);
    }
}

fn warm_start_constraints(constraints: &mut [&mut (dyn SolverUpdateable + 'static)], entities: &mut Entities) {
    for constraint in constraints.iter_mut() {
        constraint.warm_start(entities);
    }
}

fn iterate_constraints(
    constraints: &mut [&mut (dyn SolverUpdateable + 'static)],
    entities: &mut Entities,
    iteration_limit: u32,
    minimum_total_impulse: Real,
) -> SolveReport {
    if constraints.is_empty() {
        return SolveReport::EMPTY;
    }
    let mut last_total_impulse = ZERO;
    for iteration in 0..iteration_limit {
        let mut total_impulse = ZERO;
        for constraint in constraints.iter_mut() {
            if !constraint.solver_settings_mut().begin_iteration(iteration_limit) {
                continue;
            }
            let impulse = constraint.solve_velocity_iteration(entities);
            constraint.solver_settings_mut().end_iteration(impulse);
            total_impulse = total_impulse.saturating_add(impulse);
        }
        last_total_impulse = total_impulse;
        trace!(iteration, %total_impulse, "Solver iteration");
        if total_impulse <= minimum_total_impulse {
            return SolveReport {
                state: SolverState::Converged,
                iterations: iteration + 1,
                last_total_impulse,
            };
        }
    }
    SolveReport {
        state: SolverState::IterationLimitReached,
        iterations: iteration_limit,
        last_total_impulse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::constraints::ball_socket::BallSocketJoint;
    use crate::physics::constraints::maximum_angular_speed::MaximumAngularSpeedConstraint;
    use crate::physics::entity::Entity;
    use crate::utilities::math_helper::{from_int, ratio, ONE};
    use crate::utilities::matrix3x3::Matrix3x3;
    use crate::utilities::vector3::Vector3;

    fn pendulum() -> (Entities, EntityHandle, BallSocketJoint) {
        let mut entities = Entities::new();
        let bob = entities.add(
            Entity::new_dynamic(Vector3::from_ints(0, -1, 0), ONE, Matrix3x3::IDENTITY)
                .unwrap()
                .with_velocity(Vector3::from_ints(0, -3, 0), Vector3::ZERO),
        );
        let joint = BallSocketJoint::new(&entities, None, Some(bob), Vector3::ZERO).unwrap();
        (entities, bob, joint)
    }

    #[test]
    fn handles_survive_removal_of_others() {
        let (entities, bob, joint) = pendulum();
        let mut solver = Solver::new();
        let first = solver.add(joint.clone());
        let second = solver.add(MaximumAngularSpeedConstraint::new(&entities, bob, ONE).unwrap());
        assert!(solver.remove(first).is_some());
        assert!(solver.remove(first).is_none());
        assert!(solver.get_as::<MaximumAngularSpeedConstraint>(second).is_some());
        assert!(solver.get_as::<BallSocketJoint>(second).is_none());
        let third = solver.add(joint);
        assert_ne!(first, third);
        assert!(!solver.contains(first));
        assert_eq!(solver.len(), 2);
    }

    #[test]
    fn state_transitions() {
        let (mut entities, _, joint) = pendulum();
        let mut solver = Solver::new();
        solver.add(joint);
        assert_eq!(solver.state(), SolverState::Idle);
        solver.update(&entities, &Settings::default(), ratio(1, 60));
        assert_eq!(solver.state(), SolverState::Updated);
        solver.warm_start(&mut entities);
        assert_eq!(solver.state(), SolverState::WarmStarted);
        let report = solver.iterate(&mut entities);
        assert_eq!(solver.state(), report.state);
        assert!(report.iterations >= 1);
        assert!(report.iterations <= Solver::DEFAULT_ITERATION_LIMIT);
    }

    #[test]
    fn iteration_limit_is_respected() {
        let (mut entities, _, joint) = pendulum();
        let mut solver = Solver::new();
        solver.set_iteration_limit(1).unwrap();
        solver.set_minimum_total_impulse(ZERO).unwrap();
        let handle = solver.add(joint);
        solver
            .get_mut(handle)
            .unwrap()
            .solver_settings_mut()
            .set_minimum_impulse(ZERO)
            .unwrap();
        let report = solver.solve(&mut entities, &Settings::default(), ratio(1, 60));
        assert_eq!(report.state, SolverState::IterationLimitReached);
        assert_eq!(report.iterations, 1);
        assert!(report.last_total_impulse > ZERO);
    }

    #[test]
    fn invalid_settings_rejected() {
        let mut solver = Solver::new();
        assert!(solver.set_iteration_limit(0).is_err());
        assert!(solver.set_minimum_total_impulse(-ONE).is_err());
        assert_eq!(solver.iteration_limit(), Solver::DEFAULT_ITERATION_LIMIT);
    }

    #[test]
    fn orphans_are_deactivated() {
        let (mut entities, bob, joint) = pendulum();
        let mut solver = Solver::new();
        let handle = solver.add(joint);
        entities.remove(bob);
        let report = solver.solve(&mut entities, &Settings::default(), ratio(1, 60));
        assert!(!solver.get(handle).unwrap().is_active());
        assert_eq!(report.iterations, 0);
        assert!(report.converged());
    }

    #[test]
    fn remove_constraints_of_entity() {
        let (entities, bob, joint) = pendulum();
        let mut solver = Solver::new();
        solver.add(joint);
        solver.add(MaximumAngularSpeedConstraint::new(&entities, bob, from_int(2)).unwrap());
        let removed = solver.remove_constraints_of(bob);
        assert_eq!(removed.len(), 2);
        assert!(solver.is_empty());
    }
}
