//! Workday / free-day classification
//!
//! Infers which days of the week are constrained by an alarm from the shape of
//! historical wake times. Workdays wake early and consistently; free days wake
//! later, less consistently, or both.
//!
//! # Algorithm
//!
//! 1. Group entries by day of week and collect local wake times.
//! 2. Per weekday, compute the circular median wake time and its spread
//!    (population standard deviation around the circular mean).
//! 3. Measure each weekday's delay behind the earliest-waking weekday.
//! 4. A weekday is a workday when its delay and its spread are both within the
//!    configured thresholds; otherwise it is a free day.
//! 5. Weekdays without observations default to workday.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ClassifierConfig, SleepNeedConfig};
use crate::models::{DayType, SleepVitalsEntry, WeekSchedule};
use crate::stats;

/// Sunday-first ordering used throughout the week schedule
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// Wake-time statistics for one day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayWakeProfile {
    /// Day of week, Sunday = 0
    pub weekday: u8,

    pub samples: usize,

    /// Circular median wake time, `None` without samples
    pub median_wake_hour: Option<f64>,

    /// Standard deviation of wake times in hours
    pub wake_spread_hours: f64,

    /// Median wake delay behind the earliest weekday in hours
    pub wake_delay_hours: f64,

    pub day_type: DayType,
}

/// Validated entries split by the day type of their date
#[derive(Debug, Clone)]
pub struct PartitionedHistory<'a> {
    pub schedule: WeekSchedule,
    pub workdays: Vec<&'a SleepVitalsEntry>,
    pub freedays: Vec<&'a SleepVitalsEntry>,
}

impl<'a> PartitionedHistory<'a> {
    /// Earliest and latest date among all partitioned entries
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.workdays.iter().chain(self.freedays.iter()).map(|e| e.date);
        let start = dates.clone().min()?;
        let end = dates.max()?;
        Some((start, end))
    }
}

/// Day-of-week classifier driven by wake-time regularity
#[derive(Debug, Clone)]
pub struct DayClassifier {
    config: ClassifierConfig,
    offset: chrono::FixedOffset,
}

impl Default for DayClassifier {
    fn default() -> Self {
        Self::new(&SleepNeedConfig::default())
    }
}

impl DayClassifier {
    pub fn new(config: &SleepNeedConfig) -> Self {
        DayClassifier {
            config: config.classifier.clone(),
            offset: config.utc_offset(),
        }
    }

    /// Local wake times grouped Sunday-first
    fn wake_times_by_weekday(&self, entries: &[&SleepVitalsEntry]) -> [Vec<f64>; 7] {
        let mut groups: [Vec<f64>; 7] = Default::default();
        for entry in entries {
            if let Some(end) = entry.sleep_end {
                let index = entry.date.weekday().num_days_from_sunday() as usize;
                groups[index].push(stats::time_of_day_hours(end, self.offset));
            }
        }
        groups
    }

    /// Per-weekday wake statistics and resulting classification
    pub fn profiles(&self, entries: &[&SleepVitalsEntry]) -> Vec<WeekdayWakeProfile> {
        let groups = self.wake_times_by_weekday(entries);

        // Common axis so delays compare correctly even if wakes cross midnight
        let all_wakes: Vec<f64> = groups.iter().flatten().copied().collect();
        let anchor = stats::circular_mean_time(&all_wakes);

        let medians: Vec<Option<f64>> = groups
            .iter()
            .map(|wakes| (!wakes.is_empty()).then(|| stats::median_time(wakes)))
            .collect();

        let offsets: Vec<Option<f64>> = medians
            .iter()
            .map(|m| m.map(|median| stats::circular_difference(median, anchor)))
            .collect();

        let earliest = offsets
            .iter()
            .flatten()
            .copied()
            .fold(f64::INFINITY, f64::min);

        WEEKDAYS
            .iter()
            .enumerate()
            .map(|(index, weekday)| {
                let wakes = &groups[index];
                let spread = stats::time_spread(wakes);
                let delay = offsets[index].map(|o| o - earliest).unwrap_or(0.0);

                let day_type = match offsets[index] {
                    None => DayType::Workday,
                    Some(_) => {
                        if delay <= self.config.max_wake_delay_hours
                            && spread <= self.config.max_wake_spread_hours
                        {
                            DayType::Workday
                        } else {
                            DayType::Freeday
                        }
                    }
                };

                WeekdayWakeProfile {
                    weekday: weekday.num_days_from_sunday() as u8,
                    samples: wakes.len(),
                    median_wake_hour: medians[index],
                    wake_spread_hours: spread,
                    wake_delay_hours: delay,
                    day_type,
                }
            })
            .collect()
    }

    /// Map every day of the week to a [`DayType`]
    pub fn classify(&self, entries: &[&SleepVitalsEntry]) -> WeekSchedule {
        let mut schedule = WeekSchedule::default();
        for profile in self.profiles(entries) {
            schedule.set(WEEKDAYS[profile.weekday as usize], profile.day_type);
        }

        debug!(
            workdays = schedule.count(DayType::Workday),
            freedays = schedule.count(DayType::Freeday),
            schedule = ?schedule.days(),
            "Classified week schedule"
        );

        schedule
    }

    /// Classify the week and split entries by their date's day type
    pub fn partition<'a>(&self, entries: &[&'a SleepVitalsEntry]) -> PartitionedHistory<'a> {
        let schedule = self.classify(entries);
        let (workdays, freedays): (Vec<&SleepVitalsEntry>, Vec<&SleepVitalsEntry>) = entries
            .iter()
            .copied()
            .partition(|entry| schedule.for_date(entry.date) == DayType::Workday);

        PartitionedHistory {
            schedule,
            workdays,
            freedays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Night ending on `date` at `wake_hour` (UTC) after 7.5 hours
    fn night(date: NaiveDate, wake_hour: f64) -> SleepVitalsEntry {
        let midnight = Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap());
        let end = midnight + Duration::minutes((wake_hour * 60.0) as i64);
        let start = end - Duration::minutes(450);
        let mut entry = SleepVitalsEntry::new(date, start, end);
        entry.sleep_duration_hours = Some(7.5);
        entry
    }

    /// Four weeks: weekdays wake ~07:00, weekends ~09:00-10:30
    fn regular_history() -> Vec<SleepVitalsEntry> {
        // 2024-03-04 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut entries = Vec::new();
        for week in 0..4 {
            for day in 0..7 {
                let date = monday + Duration::days(week * 7 + day);
                let wake = match date.weekday() {
                    Weekday::Sat | Weekday::Sun => 9.0 + (week as f64) * 0.5,
                    _ => 7.0 + (day as f64) * 0.05,
                };
                entries.push(night(date, wake));
            }
        }
        entries
    }

    #[test]
    fn test_classifies_weekend_as_freeday() {
        let entries = regular_history();
        let refs: Vec<&SleepVitalsEntry> = entries.iter().collect();
        let schedule = DayClassifier::default().classify(&refs);

        assert_eq!(schedule.get(Weekday::Sat), DayType::Freeday);
        assert_eq!(schedule.get(Weekday::Sun), DayType::Freeday);
        for weekday in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
            assert_eq!(schedule.get(weekday), DayType::Workday);
        }
    }

    #[test]
    fn test_missing_weekday_defaults_to_workday() {
        let schedule = DayClassifier::default().classify(&[]);
        assert_eq!(schedule.count(DayType::Workday), 7);

        let entries: Vec<SleepVitalsEntry> = regular_history()
            .into_iter()
            .filter(|e| e.date.weekday() != Weekday::Sat)
            .collect();
        let refs: Vec<&SleepVitalsEntry> = entries.iter().collect();
        let schedule = DayClassifier::default().classify(&refs);
        assert_eq!(schedule.get(Weekday::Sat), DayType::Workday);
        assert_eq!(schedule.get(Weekday::Sun), DayType::Freeday);
    }

    #[test]
    fn test_early_but_erratic_day_is_freeday() {
        // Wednesdays wake early on average but swing by hours
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut entries = Vec::new();
        for week in 0..4 {
            for day in 0..5 {
                let date = monday + Duration::days(week * 7 + day);
                let wake = if date.weekday() == Weekday::Wed {
                    if week % 2 == 0 { 5.0 } else { 8.0 }
                } else {
                    7.0
                };
                entries.push(night(date, wake));
            }
        }
        let refs: Vec<&SleepVitalsEntry> = entries.iter().collect();
        let profiles = DayClassifier::default().profiles(&refs);

        let wednesday = &profiles[3];
        assert_eq!(wednesday.samples, 4);
        assert!(wednesday.wake_spread_hours > 1.0);
        assert_eq!(wednesday.day_type, DayType::Freeday);
        assert_eq!(profiles[1].day_type, DayType::Workday);
    }

    #[test]
    fn test_profiles_report_every_weekday() {
        let entries = regular_history();
        let refs: Vec<&SleepVitalsEntry> = entries.iter().collect();
        let profiles = DayClassifier::default().profiles(&refs);

        assert_eq!(profiles.len(), 7);
        assert!(profiles.iter().all(|p| p.samples == 4));
        let saturday = &profiles[6];
        assert!(saturday.wake_delay_hours > 1.5);
        assert!((saturday.median_wake_hour.unwrap() - 9.75).abs() < 0.01);
    }

    #[test]
    fn test_utc_offset_shifts_wake_times() {
        let entries = regular_history();
        let refs: Vec<&SleepVitalsEntry> = entries.iter().collect();
        let config = SleepNeedConfig {
            utc_offset_minutes: 120,
            ..SleepNeedConfig::default()
        };
        let profiles = DayClassifier::new(&config).profiles(&refs);
        let monday = &profiles[1];
        assert!((monday.median_wake_hour.unwrap() - 9.0).abs() < 0.01);
    }

    #[test]
    fn test_partition_splits_entries() {
        let entries = regular_history();
        let refs: Vec<&SleepVitalsEntry> = entries.iter().collect();
        let history = DayClassifier::default().partition(&refs);

        assert_eq!(history.workdays.len(), 20);
        assert_eq!(history.freedays.len(), 8);
        let (start, end) = history.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }
}
