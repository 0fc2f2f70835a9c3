use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::error::ConfigResult;
use crate::utilities::math_helper::{self, Real, ZERO};

/// Per-step coefficients derived from a constraint's spring-like tunables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftnessCoefficients {
    /// Fraction of the position error converted into bias velocity per unit of time.
    pub error_correction_factor: Real,
    /// Scale applied to the accumulated impulse and added to the effective mass diagonal.
    pub softness: Real,
    /// Largest accumulated impulse magnitude allowed within one step.
    pub maximum_impulse: Real,
}

/// Stiffness and damping of a position-correcting constraint, expressed as one rigidity value.
///
/// Stiffness is `STIFFNESS_OVER_DAMPING * rigidity` and damping is `rigidity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RigiditySettings {
    rigidity: Real,
    maximum_force: Real,
}

impl Default for RigiditySettings {
    fn default() -> Self {
        Self {
            rigidity: Self::DEFAULT_RIGIDITY,
            maximum_force: Real::MAX,
        }
    }
}

impl RigiditySettings {
    /// Ratio of spring stiffness to damping shared by every rigidity-driven constraint.
    pub const STIFFNESS_OVER_DAMPING: Real = math_helper::ratio(20, 3);
    pub const DEFAULT_RIGIDITY: Real = math_helper::from_int(90_000);

    /// Creates settings with the given rigidity and no force limit.
    pub fn new(rigidity: Real) -> ConfigResult<Self> {
        let mut settings = Self::default();
        settings.set_rigidity(rigidity)?;
        Ok(settings)
    }

    #[inline(always)]
    pub fn rigidity(&self) -> Real {
        self.rigidity
    }

    /// Sets the rigidity. Must be positive.
    pub fn set_rigidity(&mut self, value: Real) -> ConfigResult {
        ConstraintChecker::require_positive("RigiditySettings", "rigidity", value)?;
        self.rigidity = value;
        Ok(())
    }

    #[inline(always)]
    pub fn maximum_force(&self) -> Real {
        self.maximum_force
    }

    /// Sets the maximum force. Negative values clamp to zero.
    #[inline(always)]
    pub fn set_maximum_force(&mut self, value: Real) {
        self.maximum_force = math_helper::max(value, ZERO);
    }

    /// Computes the step coefficients.
    pub fn compute(&self, dt: Real, inverse_dt: Real) -> SoftnessCoefficients {
        let stiffness = math_helper::safe_mul(Self::STIFFNESS_OVER_DAMPING, self.rigidity);
        let damping = self.rigidity;
        let denominator = math_helper::safe_mul(dt, stiffness).saturating_add(damping);
        SoftnessCoefficients {
            error_correction_factor: math_helper::checked_div(stiffness, denominator)
                .unwrap_or(ZERO),
            softness: math_helper::checked_div(inverse_dt, denominator).unwrap_or(ZERO),
            maximum_impulse: math_helper::safe_mul(self.maximum_force, dt),
        }
    }
}
