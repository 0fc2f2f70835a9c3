use crate::utilities::math_helper::{self, Real, ZERO};

/// Helpers for inequality constraint clamping.
pub struct InequalityHelpers;

impl InequalityHelpers {
    /// Adds `impulse` to a nonnegative accumulated impulse, returning the change actually applied.
    #[inline(always)]
    pub fn clamp_positive(accumulated_impulse: &mut Real, impulse: Real) -> Real {
        let previous = *accumulated_impulse;
        *accumulated_impulse = math_helper::max(ZERO, previous + impulse);
        *accumulated_impulse - previous
    }

    /// Adds `impulse` to an accumulated impulse bounded to `[-maximum, maximum]`, returning the
    /// change actually applied.
    #[inline(always)]
    pub fn clamp_symmetric(accumulated_impulse: &mut Real, impulse: Real, maximum: Real) -> Real {
        let previous = *accumulated_impulse;
        *accumulated_impulse = math_helper::clamp(previous.saturating_add(impulse), -maximum, maximum);
        *accumulated_impulse - previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::math_helper::from_int;

    #[test]
    fn positive_clamp_never_pulls() {
        let mut accumulated = from_int(2);
        assert_eq!(InequalityHelpers::clamp_positive(&mut accumulated, from_int(-5)), from_int(-2));
        assert_eq!(accumulated, ZERO);
        assert_eq!(InequalityHelpers::clamp_positive(&mut accumulated, from_int(3)), from_int(3));
    }

    #[test]
    fn symmetric_clamp() {
        let mut accumulated = ZERO;
        assert_eq!(
            InequalityHelpers::clamp_symmetric(&mut accumulated, from_int(-7), from_int(4)),
            from_int(-4)
        );
        assert_eq!(accumulated, from_int(-4));
    }
}
