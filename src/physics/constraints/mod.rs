pub mod body_references;
pub mod constraint_checker;
pub mod inequality_helpers;
pub mod solver_settings;
pub mod solver_updateable;
pub mod velocity_jacobian;

// Softness and limits
pub mod motor_settings;
pub mod rigidity_settings;

// Joints
pub mod ball_socket;
pub mod distance_joint;
pub mod no_rotation_joint;

// Motors
pub mod angular_motor;
pub mod linear_axis_motor;

// Single entity limiters
pub mod maximum_angular_speed;
pub mod maximum_linear_speed;

// Collision response
pub mod contact;

pub use self::angular_motor::AngularVelocityMotor;
pub use self::ball_socket::BallSocketJoint;
pub use self::distance_joint::DistanceJoint;
pub use self::linear_axis_motor::LinearAxisMotor;
pub use self::maximum_angular_speed::MaximumAngularSpeedConstraint;
pub use self::maximum_linear_speed::MaximumLinearSpeedConstraint;
pub use self::motor_settings::MotorSettings;
pub use self::no_rotation_joint::NoRotationJoint;
pub use self::rigidity_settings::{RigiditySettings, SoftnessCoefficients};
pub use self::solver_settings::SolverSettings;
pub use self::solver_updateable::{ConstraintBase, SolverUpdateable};
