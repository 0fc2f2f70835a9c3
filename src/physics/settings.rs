//! Tunables shared by every constraint of a simulation.
//!
//! Settings are passed explicitly to the solver and the contact constraints each step.
//! Setters validate their input and leave the previous value untouched on rejection.

use crate::error::{ConfigError, ConfigResult};
use crate::utilities::math_helper::{self, Real, ONE, ZERO};

fn require_nonnegative(type_name: &'static str, property: &'static str, value: Real) -> ConfigResult {
    if value < ZERO {
        return Err(ConfigError::Negative {
            type_name,
            property,
            value,
        });
    }
    Ok(())
}

/// Distances governing how contacts are created, kept and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionDetectionSettings {
    contact_invalidation_length_squared: Real,
    contact_minimum_separation_distance_squared: Real,
    allowed_penetration: Real,
    default_margin: Real,
    maximum_contact_distance: Real,
}

impl Default for CollisionDetectionSettings {
    fn default() -> Self {
        let invalidation = math_helper::ratio(1, 10);
        let separation = math_helper::ratio(3, 100);
        Self {
            contact_invalidation_length_squared: invalidation * invalidation,
            contact_minimum_separation_distance_squared: separation * separation,
            allowed_penetration: math_helper::ratio(1, 100),
            default_margin: math_helper::ratio(4, 100),
            maximum_contact_distance: math_helper::ratio(1, 10),
        }
    }
}

impl CollisionDetectionSettings {
    const TYPE_NAME: &'static str = "CollisionDetectionSettings";

    /// Squared tangential drift after which a persistent contact is discarded.
    #[inline(always)]
    pub fn contact_invalidation_length_squared(&self) -> Real {
        self.contact_invalidation_length_squared
    }

    /// Sets the tangential drift distance after which a persistent contact is discarded.
    pub fn set_contact_invalidation_length(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "contact_invalidation_length", value)?;
        self.contact_invalidation_length_squared = math_helper::safe_mul(value, value);
        Ok(())
    }

    /// Squared distance below which a new contact is considered redundant with an existing one.
    #[inline(always)]
    pub fn contact_minimum_separation_distance_squared(&self) -> Real {
        self.contact_minimum_separation_distance_squared
    }

    pub fn set_contact_minimum_separation_distance(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "contact_minimum_separation_distance", value)?;
        self.contact_minimum_separation_distance_squared = math_helper::safe_mul(value, value);
        Ok(())
    }

    /// Penetration depth tolerated without any corrective bias.
    #[inline(always)]
    pub fn allowed_penetration(&self) -> Real {
        self.allowed_penetration
    }

    pub fn set_allowed_penetration(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "allowed_penetration", value)?;
        self.allowed_penetration = value;
        Ok(())
    }

    /// Collision margin handed to shapes created by the host.
    #[inline(always)]
    pub fn default_margin(&self) -> Real {
        self.default_margin
    }

    pub fn set_default_margin(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "default_margin", value)?;
        self.default_margin = value;
        Ok(())
    }

    /// Separation beyond which a contact is dropped from its manifold.
    #[inline(always)]
    pub fn maximum_contact_distance(&self) -> Real {
        self.maximum_contact_distance
    }

    pub fn set_maximum_contact_distance(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "maximum_contact_distance", value)?;
        self.maximum_contact_distance = value;
        Ok(())
    }
}

/// Coefficients shaping how contacts respond once detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResponseSettings {
    static_friction_velocity_threshold: Real,
    bounciness_velocity_threshold: Real,
    twist_friction_factor: Real,
    penetration_recovery_stiffness: Real,
    maximum_penetration_recovery_speed: Real,
    softness: Real,
}

impl Default for CollisionResponseSettings {
    fn default() -> Self {
        Self {
            static_friction_velocity_threshold: math_helper::ratio(2, 10),
            bounciness_velocity_threshold: ONE,
            twist_friction_factor: ONE,
            penetration_recovery_stiffness: math_helper::ratio(2, 10),
            maximum_penetration_recovery_speed: math_helper::from_int(2),
            softness: math_helper::ratio(1, 1000),
        }
    }
}

impl CollisionResponseSettings {
    const TYPE_NAME: &'static str = "CollisionResponseSettings";

    /// Relative sliding speed below which contacts use static friction.
    #[inline(always)]
    pub fn static_friction_velocity_threshold(&self) -> Real {
        self.static_friction_velocity_threshold
    }

    pub fn set_static_friction_velocity_threshold(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "static_friction_velocity_threshold", value)?;
        self.static_friction_velocity_threshold = value;
        Ok(())
    }

    /// Approach speed above which bounciness is applied.
    #[inline(always)]
    pub fn bounciness_velocity_threshold(&self) -> Real {
        self.bounciness_velocity_threshold
    }

    pub fn set_bounciness_velocity_threshold(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "bounciness_velocity_threshold", value)?;
        self.bounciness_velocity_threshold = value;
        Ok(())
    }

    /// Scale applied to the friction coefficient when bounding twist friction.
    #[inline(always)]
    pub fn twist_friction_factor(&self) -> Real {
        self.twist_friction_factor
    }

    pub fn set_twist_friction_factor(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "twist_friction_factor", value)?;
        self.twist_friction_factor = value;
        Ok(())
    }

    /// Fraction of the excess penetration corrected per unit of time, in (0, 1].
    #[inline(always)]
    pub fn penetration_recovery_stiffness(&self) -> Real {
        self.penetration_recovery_stiffness
    }

    pub fn set_penetration_recovery_stiffness(&mut self, value: Real) -> ConfigResult {
        if value <= ZERO || value > ONE {
            return Err(ConfigError::OutOfRange {
                type_name: Self::TYPE_NAME,
                property: "penetration_recovery_stiffness",
                value,
                min: ZERO,
                max: ONE,
            });
        }
        self.penetration_recovery_stiffness = value;
        Ok(())
    }

    /// Upper bound on the separation speed produced by penetration recovery.
    #[inline(always)]
    pub fn maximum_penetration_recovery_speed(&self) -> Real {
        self.maximum_penetration_recovery_speed
    }

    pub fn set_maximum_penetration_recovery_speed(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "maximum_penetration_recovery_speed", value)?;
        self.maximum_penetration_recovery_speed = value;
        Ok(())
    }

    /// Softness of penetration constraints, scaled by the inverse timestep when used.
    #[inline(always)]
    pub fn softness(&self) -> Real {
        self.softness
    }

    pub fn set_softness(&mut self, value: Real) -> ConfigResult {
        require_nonnegative(Self::TYPE_NAME, "softness", value)?;
        self.softness = value;
        Ok(())
    }
}

/// Every simulation-wide tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    pub collision_detection: CollisionDetectionSettings,
    pub collision_response: CollisionResponseSettings,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }
}
