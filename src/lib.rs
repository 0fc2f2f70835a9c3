//! Deterministic fixed-point sequential impulse constraint solver.
//!
//! Every quantity is a Q31.32 fixed-point [`Real`], so identical inputs step identically on
//! every machine. Collision detection is left to the host: it hands contacts to
//! [`ContactManifoldConstraint`]s, and the [`Solver`] resolves them together with joints,
//! motors and velocity limiters.

pub mod error;
pub mod physics;
pub mod utilities;

pub use crate::error::{ConfigError, ConfigResult};
pub use crate::physics::constraints::contact::{
    Contact, ContactManifoldConstraint, ContactManifoldConstraintPool,
};
pub use crate::physics::constraints::SolverUpdateable;
pub use crate::physics::entities::Entities;
pub use crate::physics::entity::Entity;
pub use crate::physics::handles::{ConstraintHandle, EntityHandle};
pub use crate::physics::settings::Settings;
pub use crate::physics::solver::{SolveReport, Solver, SolverState};
pub use crate::utilities::math_helper::Real;
