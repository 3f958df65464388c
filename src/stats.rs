//! Statistics and clock-time utilities
//!
//! Shared numeric foundation for the sleep-need pipeline. Clock times are
//! represented as decimal hours in `[0, 24)` (7.5 = 07:30). Every function
//! that compares or averages clock times goes through [`circular_difference`]
//! so that midnight wraparound is handled in exactly one place.
//!
//! # Circular Time
//!
//! Two clock times are never more than 12 hours apart. A bedtime of 23:30 and
//! one of 00:30 differ by one hour, not 23 hours:
//!
//! ```rust
//! use sleeprs::stats::circular_difference;
//!
//! assert!((circular_difference(0.5, 23.5) - 1.0).abs() < 1e-9);
//! assert!((circular_difference(23.5, 0.5) + 1.0).abs() < 1e-9);
//! ```

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use statrs::statistics::Statistics;
use std::f64::consts::PI;

/// Hours in one clock day
pub const HOURS_PER_DAY: f64 = 24.0;

/// Half a clock day; the largest possible circular distance
pub const HALF_DAY_HOURS: f64 = 12.0;

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.mean()
}

/// Population standard deviation, `0.0` for fewer than two values
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values.population_std_dev()
}

/// Median of a set of values
///
/// Sorts a copy ascending; odd counts return the middle element, even counts
/// the average of the two central elements. Empty input yields `0.0`.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Wrap any hour value into `[0, 24)`
pub fn wrap_hours(hours: f64) -> f64 {
    let wrapped = hours.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can return exactly 24.0 for tiny negative inputs
    if wrapped >= HOURS_PER_DAY {
        0.0
    } else {
        wrapped
    }
}

/// Signed shortest distance from clock time `b` to clock time `a`, in hours
///
/// Result lies in `(-12, 12]`: raw differences above 12h wrap by -24h and
/// differences below -12h wrap by +24h. Non-finite input yields NaN.
pub fn circular_difference(a: f64, b: f64) -> f64 {
    let diff = wrap_hours(a - b);
    if diff > HALF_DAY_HOURS {
        diff - HOURS_PER_DAY
    } else {
        diff
    }
}

/// Add (or subtract) hours to a clock time, result always in `[0, 24)`
pub fn add_hours(hours: f64, delta: f64) -> f64 {
    wrap_hours(hours + delta)
}

/// Circular (vector) mean of clock times
///
/// Each time is mapped onto the unit circle and the resulting mean angle is
/// mapped back to hours. Empty input yields `0.0`.
pub fn circular_mean_time(times: &[f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }

    let (sin_sum, cos_sum) = times.iter().fold((0.0, 0.0), |(s, c), &t| {
        let angle = t / HOURS_PER_DAY * 2.0 * PI;
        (s + angle.sin(), c + angle.cos())
    });

    wrap_hours(sin_sum.atan2(cos_sum) / (2.0 * PI) * HOURS_PER_DAY)
}

/// Re-express clock times on a continuous axis centred on `reference`
///
/// Every value ends up within 12 hours of `reference` so that ordinary
/// (linear) statistics can be applied without a midnight discontinuity.
pub fn unwrap_around(times: &[f64], reference: f64) -> Vec<f64> {
    times
        .iter()
        .map(|&t| reference + circular_difference(t, reference))
        .collect()
}

/// Median of clock times with midnight wraparound handling
///
/// Times are unwrapped around their circular mean, the ordinary median is
/// taken, and the result is wrapped back into `[0, 24)`.
pub fn median_time(times: &[f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    let reference = circular_mean_time(times);
    wrap_hours(median(&unwrap_around(times, reference)))
}

/// Spread (population standard deviation, hours) of clock times
pub fn time_spread(times: &[f64]) -> f64 {
    let reference = circular_mean_time(times);
    population_std_dev(&unwrap_around(times, reference))
}

/// Format decimal hours as zero-padded `HH:MM`
///
/// Minutes are rounded to the nearest whole minute and the value is wrapped
/// to the clock day first, so `23.999` renders as `00:00`.
pub fn hours_to_time_string(hours: f64) -> String {
    let total_minutes = (wrap_hours(hours) * 60.0).round() as i64 % (24 * 60);
    format!("{:02}:{:02}", total_minutes / 60, total_minutes % 60)
}

/// Format a duration in hours as `"7h 45m"`
pub fn hours_to_duration_string(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).round() as i64;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}

/// Local clock time of an instant as decimal hours
pub fn time_of_day_hours(instant: DateTime<Utc>, offset: FixedOffset) -> f64 {
    let local = instant.with_timezone(&offset);
    local.hour() as f64 + local.minute() as f64 / 60.0 + local.second() as f64 / 3600.0
}

/// Round to two decimal places for presentation
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round a clock time to two decimal places, keeping it inside `[0, 24)`
pub fn round_time(hours: f64) -> f64 {
    wrap_hours(round2(wrap_hours(hours)))
}
