use fixed::types::I32F32;

/// Deterministic fixed-point scalar used for every physical quantity.
///
/// Q31.32: 31 integer bits, 32 fractional bits. Arithmetic is bit-exact across platforms.
pub type Real = I32F32;

/// Zero.
pub const ZERO: Real = Real::ZERO;
/// One.
pub const ONE: Real = Real::ONE;
/// One half.
pub const HALF: Real = Real::from_bits(1 << 31);
/// Two.
pub const TWO: Real = from_int(2);
/// Smallest magnitude treated as nonzero by divisions and normalizations (~1e-8).
pub const EPSILON: Real = Real::from_bits(43);
/// Squared lengths below this are treated as zero length (~1e-6).
pub const EPSILON_SQUARED_LENGTH: Real = Real::from_bits(4295);

/// Creates a value from an integer at compile time.
#[inline(always)]
pub const fn from_int(value: i32) -> Real {
    Real::from_bits((value as i64) << 32)
}

/// Creates the value `numerator / denominator` at compile time.
///
/// `numerator` must stay below 2^31 in magnitude.
#[inline(always)]
pub const fn ratio(numerator: i64, denominator: i64) -> Real {
    Real::from_bits((numerator << 32) / denominator)
}

/// Converts a host float into the fixed-point representation, saturating out-of-range values.
/// Only meant for initialization at the host boundary.
#[inline(always)]
pub fn from_f32(value: f32) -> Real {
    if value.is_nan() {
        return ZERO;
    }
    Real::saturating_from_num(value)
}

/// Converts a fixed-point value into a host float.
#[inline(always)]
pub fn to_f32(value: Real) -> f32 {
    value.to_num::<f32>()
}

/// Clamps a value between a minimum and maximum value.
#[inline(always)]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Returns the higher value of the two parameters.
#[inline(always)]
pub fn max<T: PartialOrd>(a: T, b: T) -> T {
    if a > b {
        a
    } else {
        b
    }
}

/// Returns the lower value of the two parameters.
#[inline(always)]
pub fn min<T: PartialOrd>(a: T, b: T) -> T {
    if a < b {
        a
    } else {
        b
    }
}

/// Returns -1 if the value is negative and 1 otherwise.
#[inline(always)]
pub fn binary_sign(x: Real) -> Real {
    if x < ZERO {
        -ONE
    } else {
        ONE
    }
}

/// Multiplies two values, saturating at the representable range instead of overflowing.
/// Used wherever one operand may be `Real::MAX` standing in for "unbounded".
#[inline(always)]
pub fn safe_mul(a: Real, b: Real) -> Real {
    a.saturating_mul(b)
}

/// Divides two values, returning `None` when the divisor is within `EPSILON` of zero
/// or the quotient does not fit.
#[inline(always)]
pub fn checked_div(numerator: Real, denominator: Real) -> Option<Real> {
    if denominator.abs() < EPSILON {
        return None;
    }
    numerator.checked_div(denominator)
}

/// Computes the reciprocal of a value, falling back to zero for degenerate inputs.
#[inline(always)]
pub fn reciprocal_or_zero(value: Real) -> Real {
    checked_div(ONE, value).unwrap_or(ZERO)
}

/// Deterministic square root. Negative inputs return zero.
///
/// Computed with a bit-by-bit integer square root on the raw representation, so the result
/// is the exact floor of the true root at the type's resolution.
pub fn sqrt(x: Real) -> Real {
    if x <= ZERO {
        return ZERO;
    }
    // sqrt(bits / 2^32) * 2^32 == sqrt(bits * 2^32)
    let radicand = (x.to_bits() as u128) << 32;
    let mut remainder = radicand;
    let mut root: u128 = 0;
    let mut bit: u128 = 1 << 126;
    while bit > radicand {
        bit >>= 2;
    }
    while bit != 0 {
        if remainder >= root + bit {
            remainder -= root + bit;
            root = (root >> 1) + bit;
        } else {
            root >>= 1;
        }
        bit >>= 2;
    }
    Real::from_bits(root as i64)
}
