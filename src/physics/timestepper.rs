use crate::physics::entities::Entities;
use crate::physics::pose_integrator::PoseIntegrator;
use crate::physics::settings::Settings;
use crate::physics::solver::{SolveReport, Solver};
use crate::utilities::math_helper::Real;
use tracing::debug;

/// Callback invoked between the stages of a step.
pub type TimestepperStageHandler = Box<dyn FnMut(Real, &mut Entities) + Send>;

/// Advances entities by one step in the order:
/// forces -> solver update, warm start and iterations -> pose integration.
#[derive(Default)]
pub struct TimeStepper {
    /// Solve independent islands on scoped threads instead of one sequential pass.
    pub parallel_islands: bool,
    /// Fires after forces are applied and before the solver runs.
    pub forces_applied: Option<TimestepperStageHandler>,
    /// Fires after the solver and before poses are integrated.
    pub constraints_solved: Option<TimestepperStageHandler>,
}

impl std::fmt::Debug for TimeStepper {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TimeStepper")
            .field("parallel_islands", &self.parallel_islands)
            .field("forces_applied", &self.forces_applied.is_some())
            .field("constraints_solved", &self.constraints_solved.is_some())
            .finish()
    }
}

impl TimeStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Performs one step of length `dt`.
    pub fn step(
        &mut self,
        entities: &mut Entities,
        solver: &mut Solver,
        integrator: &PoseIntegrator,
        settings: &Settings,
        dt: Real,
    ) -> SolveReport {
        integrator.apply_forces(entities, dt);
        if let Some(handler) = self.forces_applied.as_mut() {
            handler(dt, entities);
        }

        let report = if self.parallel_islands {
            solver.solve_islands_parallel(entities, settings, dt)
        } else {
            solver.solve(entities, settings, dt)
        };
        if let Some(handler) = self.constraints_solved.as_mut() {
            handler(dt, entities);
        }

        integrator.integrate(entities, dt);
        debug!(
            %dt,
            state = %report.state,
            iterations = report.iterations,
            "Stepped"
        );
        report
    }
}
