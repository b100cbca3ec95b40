//! Rate and rounding helpers shared by the runner and the aggregator.

use std::time::Duration;

/// Decimal places for pass rates.
pub const RATE_DECIMALS: u32 = 3;

/// Decimal places for per-trial elapsed seconds.
pub const ELAPSED_DECIMALS: u32 = 4;

/// Round to a fixed number of decimal places (half away from zero).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// `numerator / denominator`, or 0.0 when the denominator is zero.
pub fn rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// A pass rate rounded for reporting.
pub fn rounded_rate(numerator: u64, denominator: u64) -> f64 {
    round_to(rate(numerator, denominator), RATE_DECIMALS)
}

/// Elapsed seconds rounded for reporting.
pub fn elapsed_secs(duration: Duration) -> f64 {
    round_to(duration.as_secs_f64(), ELAPSED_DECIMALS)
}
