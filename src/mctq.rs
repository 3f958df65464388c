//! Munich ChronoType Questionnaire (MCTQ) calculation
//!
//! Estimates an individual's ideal sleep duration, social jetlag and
//! chronotype from a history of nightly sleep records.
//!
//! # Sleep Science Background
//!
//! On workdays sleep is cut short by an alarm; on free days people sleep
//! longer to repay the accumulated debt. MCTQ uses the difference between the
//! two to back out the underlying need:
//!
//! - **SD_W / SD_F**: mean total sleep time on workdays / free days
//! - **SD_week**: weekly mean, `(5·SD_W + 2·SD_F) / 7`
//! - **Sleep need**: when free days run longer, `SD_F − (SD_F − SD_week) / 2`,
//!   otherwise `SD_week`
//! - **MSW / MSF**: median clock time of mid-sleep on workdays / free days
//! - **Social jetlag**: `|MSF − MSW|` on the clock circle
//! - **MSF_sc**: MSF shifted earlier by half the free-day oversleep; the
//!   standard chronotype marker
//!
//! # Confidence
//!
//! | Tier | Workdays | Free days |
//! |------|----------|-----------|
//! | high | ≥ 40 | ≥ 16 |
//! | medium | ≥ 20 | ≥ 8 |
//! | low | otherwise | |

use chrono::FixedOffset;
use tracing::debug;

use crate::classifier::DayClassifier;
use crate::config::SleepNeedConfig;
use crate::models::{Confidence, MctqResult, SleepVitalsEntry};
use crate::stats;
use crate::validation::EntryValidator;

/// Workdays in a standard week
const WORKDAYS_PER_WEEK: f64 = 5.0;

/// Free days in a standard week
const FREEDAYS_PER_WEEK: f64 = 2.0;

/// MCTQ calculation engine
#[derive(Debug, Clone, Default)]
pub struct MctqCalculator {
    config: SleepNeedConfig,
}

impl MctqCalculator {
    /// Create new MCTQ calculator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create new MCTQ calculator with custom configuration
    pub fn with_config(config: SleepNeedConfig) -> Self {
        MctqCalculator { config }
    }

    pub fn config(&self) -> &SleepNeedConfig {
        &self.config
    }

    /// Run the full pipeline: validate, classify, aggregate
    ///
    /// Returns `None` whenever either sample threshold is not met; a result is
    /// never partially filled.
    pub fn calculate(&self, entries: &[SleepVitalsEntry]) -> Option<MctqResult> {
        let valid = EntryValidator::new(&self.config).validate(entries);
        let history = DayClassifier::new(&self.config).partition(&valid);

        let workdays_count = history.workdays.len();
        let freedays_count = history.freedays.len();

        if workdays_count < self.config.required_workdays()
            || freedays_count < self.config.required_freedays()
        {
            debug!(
                workdays = workdays_count,
                freedays = freedays_count,
                workdays_needed = self.config.required_workdays(),
                freedays_needed = self.config.required_freedays(),
                "Insufficient data for MCTQ, result withheld"
            );
            return None;
        }

        let (data_start_date, data_end_date) = history.date_range()?;
        let offset = self.config.utc_offset();

        let sd_workday = stats::mean(&total_sleep_hours(&history.workdays));
        let sd_freeday = stats::mean(&total_sleep_hours(&history.freedays));
        let sd_week = weekly_sleep_duration(sd_workday, sd_freeday);
        let sleep_need_ideal = self
            .config
            .clamp_sleep_need(sleep_need(sd_workday, sd_freeday, sd_week));

        let mid_sleep_workday = stats::median_time(&mid_sleep_times(&history.workdays, offset));
        let mid_sleep_freeday = stats::median_time(&mid_sleep_times(&history.freedays, offset));
        let social_jetlag = social_jetlag(mid_sleep_freeday, mid_sleep_workday);
        let mid_sleep_corrected =
            corrected_mid_sleep(mid_sleep_freeday, sd_workday, sd_freeday);

        let confidence = Confidence::from_counts(workdays_count, freedays_count);

        debug!(
            sd_workday,
            sd_freeday,
            sleep_need_ideal,
            social_jetlag,
            %confidence,
            "MCTQ calculated"
        );

        Some(MctqResult {
            sd_workday: stats::round2(sd_workday),
            sd_freeday: stats::round2(sd_freeday),
            sd_week: stats::round2(sd_week),
            sleep_need_ideal: stats::round2(sleep_need_ideal),
            social_jetlag: stats::round2(social_jetlag),
            mid_sleep_workday: stats::round_time(mid_sleep_workday),
            mid_sleep_freeday: stats::round_time(mid_sleep_freeday),
            mid_sleep_corrected: stats::round_time(mid_sleep_corrected),
            workdays_count,
            freedays_count,
            confidence,
            data_start_date,
            data_end_date,
        })
    }
}

/// Calculate MCTQ sleep need with an explicit configuration
pub fn calculate_mctq(entries: &[SleepVitalsEntry], config: &SleepNeedConfig) -> Option<MctqResult> {
    MctqCalculator::with_config(config.clone()).calculate(entries)
}

fn total_sleep_hours(entries: &[&SleepVitalsEntry]) -> Vec<f64> {
    entries.iter().filter_map(|e| e.total_sleep_hours()).collect()
}

fn mid_sleep_times(entries: &[&SleepVitalsEntry], offset: FixedOffset) -> Vec<f64> {
    entries
        .iter()
        .filter_map(|e| e.mid_sleep())
        .map(|mid| stats::time_of_day_hours(mid, offset))
        .collect()
}

/// `(5·SD_W + 2·SD_F) / 7`
pub fn weekly_sleep_duration(sd_workday: f64, sd_freeday: f64) -> f64 {
    (WORKDAYS_PER_WEEK * sd_workday + FREEDAYS_PER_WEEK * sd_freeday)
        / (WORKDAYS_PER_WEEK + FREEDAYS_PER_WEEK)
}

/// Unclamped ideal sleep duration
pub fn sleep_need(sd_workday: f64, sd_freeday: f64, sd_week: f64) -> f64 {
    if sd_freeday > sd_workday {
        sd_freeday - (sd_freeday - sd_week) / 2.0
    } else {
        sd_week
    }
}

/// Absolute circular distance between free-day and workday mid-sleep
pub fn social_jetlag(mid_sleep_freeday: f64, mid_sleep_workday: f64) -> f64 {
    stats::circular_difference(mid_sleep_freeday, mid_sleep_workday).abs()
}

/// Free-day mid-sleep corrected for oversleep (MSF_sc)
pub fn corrected_mid_sleep(mid_sleep_freeday: f64, sd_workday: f64, sd_freeday: f64) -> f64 {
    if sd_freeday > sd_workday {
        stats::add_hours(mid_sleep_freeday, -(sd_freeday - sd_workday) / 2.0)
    } else {
        mid_sleep_freeday
    }
}
