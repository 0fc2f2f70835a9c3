use crate::error::ConfigResult;
use crate::physics::constraints::constraint_checker::ConstraintChecker;
use crate::physics::constraints::rigidity_settings::SoftnessCoefficients;
use crate::utilities::math_helper::{self, Real, ZERO};

/// Defines some of the shared behavior across velocity motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorSettings {
    softness: Real,
    maximum_force: Real,
}

impl Default for MotorSettings {
    fn default() -> Self {
        Self {
            softness: Self::DEFAULT_SOFTNESS,
            maximum_force: Real::MAX,
        }
    }
}

impl MotorSettings {
    pub const DEFAULT_SOFTNESS: Real = math_helper::ratio(1, 10_000);

    /// Defines settings for a motor constraint.
    ///
    /// * `maximum_force` - Maximum amount of force the motor can apply in one unit of time.
    ///   Negative values clamp to zero.
    /// * `softness` - How soft the constraint is. 0 is perfectly rigid.
    pub fn new(maximum_force: Real, softness: Real) -> ConfigResult<Self> {
        let mut settings = Self::default();
        settings.set_softness(softness)?;
        settings.set_maximum_force(maximum_force);
        Ok(settings)
    }

    /// Gets how soft the constraint is. Values range from 0 to infinity.
    #[inline(always)]
    pub fn softness(&self) -> Real {
        self.softness
    }

    pub fn set_softness(&mut self, value: Real) -> ConfigResult {
        ConstraintChecker::require_nonnegative("MotorSettings", "softness", value)?;
        self.softness = value;
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

    /// Computes the step coefficients. Motors have no position error to correct.
    pub fn compute(&self, dt: Real, inverse_dt: Real) -> SoftnessCoefficients {
        SoftnessCoefficients {
            error_correction_factor: ZERO,
            softness: math_helper::safe_mul(self.softness, inverse_dt),
            maximum_impulse: math_helper::safe_mul(self.maximum_force, dt),
        }
    }
}
