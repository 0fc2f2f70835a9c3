//! Configuration errors.
//!
//! Only invalid configuration is reported. Singular effective masses and degenerate geometry
//! are absorbed inside the solver as zero contributions and never surface here.

use crate::physics::handles::EntityHandle;
use crate::physics::materials::MaterialId;
use crate::utilities::math_helper::Real;
use thiserror::Error;

/// Errors raised when a tunable or a constraint description is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero or negative.
    #[error("{type_name}.{property} must be positive, got {value}")]
    NonPositive {
        /// Type owning the property.
        type_name: &'static str,
        /// Name of the rejected property.
        property: &'static str,
        /// The rejected value.
        value: Real,
    },

    /// A value that must be nonnegative was negative.
    #[error("{type_name}.{property} must be nonnegative, got {value}")]
    Negative {
        /// Type owning the property.
        type_name: &'static str,
        /// Name of the rejected property.
        property: &'static str,
        /// The rejected value.
        value: Real,
    },

    /// A value fell outside its allowed interval.
    #[error("{type_name}.{property} must be in ({min}, {max}], got {value}")]
    OutOfRange {
        /// Type owning the property.
        type_name: &'static str,
        /// Name of the rejected property.
        property: &'static str,
        /// The rejected value.
        value: Real,
        /// Exclusive lower bound.
        min: Real,
        /// Inclusive upper bound.
        max: Real,
    },

    /// A count that must be at least one was zero.
    #[error("{type_name}.{property} must be at least 1")]
    ZeroCount {
        /// Type owning the property.
        type_name: &'static str,
        /// Name of the rejected property.
        property: &'static str,
    },

    /// A vector that must have a direction was too short to normalize.
    #[error("{type_name}.{property} must have nonzero length")]
    ZeroLength {
        /// Type owning the property.
        type_name: &'static str,
        /// Name of the rejected property.
        property: &'static str,
    },

    /// A handle did not resolve to a live entity.
    #[error("entity {0} does not exist")]
    InvalidEntity(EntityHandle),

    /// A material identifier was never registered.
    #[error("material {0} is not registered")]
    UnknownMaterial(MaterialId),

    /// Both ends of a two-entity constraint referenced the same entity.
    #[error("constraint connects entity {0} to itself")]
    SameEntity(EntityHandle),

    /// A constraint needs at least one dynamic entity to act on.
    #[error("constraint has no dynamic entity to act on")]
    NoDynamicEntity,
}

/// Shorthand result type for configuration.
pub type ConfigResult<T = ()> = Result<T, ConfigError>;
