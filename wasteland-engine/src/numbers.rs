//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

use crate::constants::{PROBABILITY_FLOOR, PROBABILITY_MAX};

/// Clamp a probability-like value into `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return PROBABILITY_FLOOR;
    }
    value.clamp(PROBABILITY_FLOOR, PROBABILITY_MAX)
}

/// Floor a non-negative f64 into a `u32`, returning 0 for negative or non-finite values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(value.min(max).floor()).unwrap_or(0)
}

/// Round a non-negative f64 into a `u32`, returning 0 for negative or non-finite values.
#[must_use]
pub fn round_f64_to_u32(value: f64) -> u32 {
    floor_f64_to_u32(value.round())
}

/// Floor a multiplier into a `usize` count, returning 0 for negative or non-finite values.
#[must_use]
pub fn floor_f64_to_usize(value: f64) -> usize {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, usize>(value.floor()).unwrap_or(0)
}

/// Convert a `u64` millisecond span to f64 for variance math.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Truncate a non-negative f64 millisecond value to `u64`.
#[must_use]
pub fn f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u64>(value.trunc()).unwrap_or(u64::MAX)
}
