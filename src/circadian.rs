//! Two-process model of alertness
//!
//! Combines homeostatic sleep pressure with a circadian oscillation into a
//! single 0-100 energy score.
//!
//! # Sleep Science Background
//!
//! - **Process S** (homeostatic pressure) builds up while awake and dissipates
//!   during sleep. It rises as a saturating exponential from a small residual
//!   level at wake-up toward 1.
//! - **Process C** (circadian alertness) oscillates with a 24-hour period,
//!   lowest at the circadian nadir (typically around 04:00) and highest twelve
//!   hours later.
//!
//! Energy is high when circadian alertness is high and sleep pressure is low.
//!
//! ```rust
//! use sleeprs::circadian::TwoProcessModel;
//!
//! let model = TwoProcessModel::default();
//! let morning = model.energy(model.process_s(2.0), model.process_c(10.0));
//! let late_night = model.energy(model.process_s(20.0), model.process_c(4.0));
//! assert!(morning > late_night);
//! ```

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{ParseError, Result};
use crate::stats;

/// Two-process model parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircadianConfig {
    /// Clock hour of minimum circadian alertness (default: 4.0)
    pub nadir_hour: f64,

    /// Time constant of sleep-pressure build-up in hours (default: 18.2)
    pub sleep_pressure_time_constant: f64,

    /// Sleep pressure remaining right after waking, 0-1 (default: 0.15)
    pub residual_pressure: f64,

    /// Weight of the circadian term in the energy score, 0-1 (default: 0.5)
    pub circadian_weight: f64,

    /// Offset from UTC used to read clock hours from instants, in minutes
    pub utc_offset_minutes: i32,
}

impl Default for CircadianConfig {
    fn default() -> Self {
        CircadianConfig {
            nadir_hour: 4.0,
            sleep_pressure_time_constant: 18.2,
            residual_pressure: 0.15,
            circadian_weight: 0.5,
            utc_offset_minutes: 0,
        }
    }
}

/// Energy estimate at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyPoint {
    pub time: DateTime<Utc>,
    /// Local clock hour
    pub hour_of_day: f64,
    pub hours_awake: f64,
    pub process_s: f64,
    pub process_c: f64,
    /// 0-100
    pub energy: f64,
}

/// Homeostatic + circadian alertness model
#[derive(Debug, Clone, Default)]
pub struct TwoProcessModel {
    config: CircadianConfig,
}

impl TwoProcessModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CircadianConfig) -> Self {
        TwoProcessModel { config }
    }

    pub fn config(&self) -> &CircadianConfig {
        &self.config
    }

    /// Sleep pressure after `hours_awake` hours, in `[0, 1)`
    ///
    /// `S(t) = S0 + (1 − S0)(1 − e^(−t/τ))`. Negative or non-finite input is
    /// treated as zero hours awake.
    pub fn process_s(&self, hours_awake: f64) -> f64 {
        let hours = if hours_awake.is_finite() { hours_awake.max(0.0) } else { 0.0 };
        let s0 = self.config.residual_pressure.clamp(0.0, 1.0);
        let tau = self.config.sleep_pressure_time_constant.max(f64::EPSILON);

        (s0 + (1.0 - s0) * (1.0 - (-hours / tau).exp())).min(1.0)
    }

    /// Circadian alertness at `hour_of_day` using the configured nadir
    pub fn process_c(&self, hour_of_day: f64) -> f64 {
        calculate_process_c(hour_of_day, self.config.nadir_hour)
    }

    /// Energy score in `[0, 100]`
    pub fn energy(&self, process_s: f64, process_c: f64) -> f64 {
        let weight = self.config.circadian_weight.clamp(0.0, 1.0);
        let s = finite_unit(process_s);
        let c = finite_unit(process_c);

        (100.0 * (weight * c + (1.0 - weight) * (1.0 - s))).clamp(0.0, 100.0)
    }

    /// Energy at `now` for someone who woke at `last_wake`
    pub fn energy_at(&self, now: DateTime<Utc>, last_wake: DateTime<Utc>) -> EnergyPoint {
        let offset = FixedOffset::east_opt(self.config.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix());
        let hours_awake = ((now - last_wake).num_seconds() as f64 / 3600.0).max(0.0);
        let hour_of_day = stats::time_of_day_hours(now, offset);
        let process_s = self.process_s(hours_awake);
        let process_c = self.process_c(hour_of_day);

        EnergyPoint {
            time: now,
            hour_of_day,
            hours_awake,
            process_s,
            process_c,
            energy: self.energy(process_s, process_c),
        }
    }

    /// Energy points from `start` over `hours`, every `step_minutes`
    pub fn energy_curve(
        &self,
        last_wake: DateTime<Utc>,
        start: DateTime<Utc>,
        hours: u32,
        step_minutes: u32,
    ) -> Vec<EnergyPoint> {
        let step = chrono::Duration::minutes(i64::from(step_minutes.max(1)));
        let end = start + chrono::Duration::hours(i64::from(hours));

        std::iter::successors(Some(start), |t| Some(*t + step))
            .take_while(|t| *t <= end)
            .map(|t| self.energy_at(t, last_wake))
            .collect()
    }

    /// [`TwoProcessModel::energy_at`] for ISO-8601 inputs
    pub fn energy_at_iso(&self, now: &str, last_wake: &str) -> Result<EnergyPoint> {
        Ok(self.energy_at(parse_instant(now)?, parse_instant(last_wake)?))
    }
}

/// Sleep pressure with default model parameters
pub fn calculate_process_s(hours_awake: f64) -> f64 {
    TwoProcessModel::default().process_s(hours_awake)
}

/// Energy score with the default circadian weight
pub fn calculate_energy(process_s: f64, process_c: f64) -> f64 {
    TwoProcessModel::default().energy(process_s, process_c)
}

/// Circadian alertness for an arbitrary nadir
///
/// `C(h) = (1 − cos(2π(h − nadir)/24)) / 2`: 0 at the nadir, 1 twelve hours
/// later.
pub fn calculate_process_c(hour_of_day: f64, nadir_hour: f64) -> f64 {
    if !hour_of_day.is_finite() || !nadir_hour.is_finite() {
        return 0.5;
    }
    let phase = stats::circular_difference(hour_of_day, nadir_hour) / stats::HOURS_PER_DAY;
    (1.0 - (2.0 * PI * phase).cos()) / 2.0
}

fn finite_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Parse an ISO-8601 instant
///
/// Accepts RFC 3339 with an offset or `Z`, or a naive
/// `YYYY-MM-DDTHH:MM[:SS]` (space separator also accepted) read as UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            ParseError::InvalidInstant {
                input: input.to_string(),
            }
            .into()
        })
}
