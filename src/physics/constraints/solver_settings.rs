use crate::error::{ConfigError, ConfigResult};
use crate::utilities::math_helper::{self, Real, ZERO};

/// Per-constraint iteration controls.
///
/// A constraint stops being visited for the rest of a step once it has run
/// `maximum_iteration_count` iterations, or once it has applied less than `minimum_impulse`
/// for `minimum_iteration_count` consecutive iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverSettings {
    maximum_iteration_count: u32,
    minimum_impulse: Real,
    minimum_iteration_count: u32,
    pub(crate) current_iterations: u32,
    pub(crate) iterations_at_minimum_impulse: u32,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            maximum_iteration_count: u32::MAX,
            minimum_impulse: Self::DEFAULT_MINIMUM_IMPULSE,
            minimum_iteration_count: Self::DEFAULT_MINIMUM_ITERATION_COUNT,
            current_iterations: 0,
            iterations_at_minimum_impulse: 0,
        }
    }
}

impl SolverSettings {
    pub const DEFAULT_MINIMUM_IMPULSE: Real = math_helper::ratio(1, 1000);
    pub const DEFAULT_MINIMUM_ITERATION_COUNT: u32 = 1;

    /// Settings that visit the constraint on every solver iteration.
    pub fn exhaustive() -> Self {
        Self {
            minimum_impulse: ZERO,
            ..Self::default()
        }
    }

    #[inline(always)]
    pub fn maximum_iteration_count(&self) -> u32 {
        self.maximum_iteration_count
    }

    /// Caps the iterations this constraint may run in one step. The solver's global limit still
    /// applies when it is lower.
    pub fn set_maximum_iteration_count(&mut self, value: u32) -> ConfigResult {
        if value == 0 {
            return Err(ConfigError::ZeroCount {
                type_name: "SolverSettings",
                property: "maximum_iteration_count",
            });
        }
        self.maximum_iteration_count = value;
        Ok(())
    }

    #[inline(always)]
    pub fn minimum_impulse(&self) -> Real {
        self.minimum_impulse
    }

    pub fn set_minimum_impulse(&mut self, value: Real) -> ConfigResult {
        if value < ZERO {
            return Err(ConfigError::Negative {
                type_name: "SolverSettings",
                property: "minimum_impulse",
                value,
            });
        }
        self.minimum_impulse = value;
        Ok(())
    }

    #[inline(always)]
    pub fn minimum_iteration_count(&self) -> u32 {
        self.minimum_iteration_count
    }

    pub fn set_minimum_iteration_count(&mut self, value: u32) -> ConfigResult {
        if value == 0 {
            return Err(ConfigError::ZeroCount {
                type_name: "SolverSettings",
                property: "minimum_iteration_count",
            });
        }
        self.minimum_iteration_count = value;
        Ok(())
    }

    /// Resets the per-step counters.
    #[inline(always)]
    pub(crate) fn reset_counters(&mut self) {
        self.current_iterations = 0;
        self.iterations_at_minimum_impulse = 0;
    }

    /// Whether the constraint should be visited on the next iteration. Counts the visit.
    #[inline(always)]
    pub(crate) fn begin_iteration(&mut self, iteration_limit: u32) -> bool {
        self.current_iterations = self.current_iterations.saturating_add(1);
        self.current_iterations <= iteration_limit
            && self.current_iterations <= self.maximum_iteration_count
            && self.iterations_at_minimum_impulse < self.minimum_iteration_count
    }

    /// Records the impulse magnitude applied by a visited iteration.
    #[inline(always)]
    pub(crate) fn end_iteration(&mut self, impulse: Real) {
        if impulse < self.minimum_impulse {
            self.iterations_at_minimum_impulse += 1;
        } else {
            self.iterations_at_minimum_impulse = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::math_helper::ONE;

    #[test]
    fn stops_after_consecutive_small_impulses() {
        let mut settings = SolverSettings::default();
        settings.set_minimum_iteration_count(2).unwrap();
        settings.reset_counters();
        assert!(settings.begin_iteration(10));
        settings.end_iteration(ZERO);
        assert!(settings.begin_iteration(10));
        settings.end_iteration(ONE);
        assert!(settings.begin_iteration(10));
        settings.end_iteration(ZERO);
        assert!(settings.begin_iteration(10));
        settings.end_iteration(ZERO);
        assert!(!settings.begin_iteration(10));
    }

    #[test]
    fn respects_maximum_iteration_count() {
        let mut settings = SolverSettings::exhaustive();
        settings.set_maximum_iteration_count(1).unwrap();
        assert!(settings.begin_iteration(10));
        settings.end_iteration(ONE);
        assert!(!settings.begin_iteration(10));
        assert!(settings.set_maximum_iteration_count(0).is_err());
    }
}
