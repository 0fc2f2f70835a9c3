pub mod body_properties;
pub mod constraints;
pub mod entities;
pub mod entity;
pub mod handles;
pub mod inertia_helper;
pub mod islands;
pub mod materials;
pub mod pose_integrator;
pub mod settings;
pub mod solver;
pub mod timestepper;

pub use self::pose_integrator::PoseIntegrator;
pub use self::timestepper::{TimeStepper, TimestepperStageHandler};
