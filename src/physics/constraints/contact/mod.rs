#[allow(clippy::module_inception)]
pub mod contact;
pub mod contact_manifold_constraint;
pub mod manifold_pool;
pub mod penetration_limit;
pub mod tangent_friction;
pub mod twist_friction;

pub use contact::{Contact, ContactData};
pub use contact_manifold_constraint::{ContactAddResult, ContactManifoldConstraint, FrictionMode};
pub use manifold_pool::ContactManifoldConstraintPool;
pub use penetration_limit::PenetrationConstraint;
pub use tangent_friction::SlidingFrictionConstraint;
pub use twist_friction::TwistFrictionConstraint;
