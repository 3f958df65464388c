//! Core data types for sleep-need estimation
//!
//! All types serialize to camelCase JSON so they can be exchanged with the
//! surrounding application unchanged. Instants are carried internally as
//! `DateTime<Utc>` and cross the JSON boundary as Unix-epoch seconds.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats;

/// Minutes per hour, used for stage-duration conversion
const MINUTES_PER_HOUR: f64 = 60.0;

/// Instant from Unix-epoch seconds that may carry a fractional part
///
/// Sub-second precision is kept to the millisecond. Non-finite or
/// out-of-range values yield `None`.
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round();
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

/// Optional epoch-second timestamps, integer or fractional on input
mod epoch_seconds_option {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum EpochSeconds {
        Whole(i64),
        Fractional(f64),
    }

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        chrono::serde::ts_seconds_option::serialize(value, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let instant = match Option::<EpochSeconds>::deserialize(deserializer)? {
            None => return Ok(None),
            Some(EpochSeconds::Whole(seconds)) => DateTime::from_timestamp(seconds, 0)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", seconds)))?,
            Some(EpochSeconds::Fractional(seconds)) => super::from_epoch_seconds(seconds)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", seconds)))?,
        };
        Ok(Some(instant))
    }
}

/// Device-reported processing status of a sleep record
///
/// Mirrors the `validation` tag attached to wearable sleep summaries.
/// Unrecognized tags are preserved verbatim in [`ValidationStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValidationStatus {
    AutoFinal,
    AutoManual,
    AutoTentative,
    Manual,
    Device,
    EnhancedFinal,
    EnhancedConfirmed,
    EnhancedConfirmedFinal,
    EnhancedTentative,
    OffWrist,
    Invalid,
    Other(String),
}

impl ValidationStatus {
    /// Status tag as it appears on the wire
    pub fn as_str(&self) -> &str {
        match self {
            ValidationStatus::AutoFinal => "AUTO_FINAL",
            ValidationStatus::AutoManual => "AUTO_MANUAL",
            ValidationStatus::AutoTentative => "AUTO_TENTATIVE",
            ValidationStatus::Manual => "MANUAL",
            ValidationStatus::Device => "DEVICE",
            ValidationStatus::EnhancedFinal => "ENHANCED_FINAL",
            ValidationStatus::EnhancedConfirmed => "ENHANCED_CONFIRMED",
            ValidationStatus::EnhancedConfirmedFinal => "ENHANCED_CONFIRMED_FINAL",
            ValidationStatus::EnhancedTentative => "ENHANCED_TENTATIVE",
            ValidationStatus::OffWrist => "OFF_WRIST",
            ValidationStatus::Invalid => "INVALID",
            ValidationStatus::Other(tag) => tag,
        }
    }

    /// Finalized or user-confirmed records that are always trusted
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            ValidationStatus::AutoFinal
                | ValidationStatus::AutoManual
                | ValidationStatus::Manual
                | ValidationStatus::Device
                | ValidationStatus::EnhancedFinal
                | ValidationStatus::EnhancedConfirmed
                | ValidationStatus::EnhancedConfirmedFinal
        )
    }

    /// Provisional records, trusted only when they carry stage data
    pub fn is_tentative(&self) -> bool {
        matches!(
            self,
            ValidationStatus::AutoTentative | ValidationStatus::EnhancedTentative
        )
    }
}

impl From<String> for ValidationStatus {
    fn from(tag: String) -> Self {
        match tag.trim().to_uppercase().as_str() {
            "AUTO_FINAL" => ValidationStatus::AutoFinal,
            "AUTO_MANUAL" => ValidationStatus::AutoManual,
            "AUTO_TENTATIVE" => ValidationStatus::AutoTentative,
            "MANUAL" => ValidationStatus::Manual,
            "DEVICE" => ValidationStatus::Device,
            "ENHANCED_FINAL" => ValidationStatus::EnhancedFinal,
            "ENHANCED_CONFIRMED" => ValidationStatus::EnhancedConfirmed,
            "ENHANCED_CONFIRMED_FINAL" => ValidationStatus::EnhancedConfirmedFinal,
            "ENHANCED_TENTATIVE" => ValidationStatus::EnhancedTentative,
            "OFF_WRIST" => ValidationStatus::OffWrist,
            "INVALID" => ValidationStatus::Invalid,
            _ => ValidationStatus::Other(tag),
        }
    }
}

impl From<ValidationStatus> for String {
    fn from(status: ValidationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One night of sleep as reported by a wearable or manual log
///
/// # Usage
///
/// ```rust
/// use sleeprs::models::SleepVitalsEntry;
///
/// let json = r#"{
///     "date": "2024-03-04",
///     "sleepStartTimestamp": 1709503200,
///     "sleepEndTimestamp": 1709531100,
///     "deepSleepMinutes": 90,
///     "remSleepMinutes": 100,
///     "lightSleepMinutes": 240,
///     "validation": "ENHANCED_FINAL"
/// }"#;
///
/// let entry: SleepVitalsEntry = serde_json::from_str(json).unwrap();
/// assert_eq!(entry.total_sleep_hours(), Some(430.0 / 60.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepVitalsEntry {
    /// Calendar day the night is attributed to (wake-up day)
    pub date: NaiveDate,

    /// Sleep onset
    #[serde(
        rename = "sleepStartTimestamp",
        default,
        with = "epoch_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub sleep_start: Option<DateTime<Utc>>,

    /// Final wake time
    #[serde(
        rename = "sleepEndTimestamp",
        default,
        with = "epoch_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub sleep_end: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deep_sleep_minutes: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rem_sleep_minutes: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_sleep_minutes: Option<f64>,

    /// Awake time inside the sleep window; never counted as sleep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awake_sleep_minutes: Option<f64>,

    /// Reported total duration, used when no stage breakdown exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_duration_hours: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationStatus>,
}

impl SleepVitalsEntry {
    /// Create an entry from onset and wake instants with no stage data
    pub fn new(date: NaiveDate, sleep_start: DateTime<Utc>, sleep_end: DateTime<Utc>) -> Self {
        SleepVitalsEntry {
            date,
            sleep_start: Some(sleep_start),
            sleep_end: Some(sleep_end),
            deep_sleep_minutes: None,
            rem_sleep_minutes: None,
            light_sleep_minutes: None,
            awake_sleep_minutes: None,
            sleep_duration_hours: None,
            validation: None,
        }
    }

    /// Sum of deep, REM and light minutes (awake excluded)
    pub fn stage_minutes(&self) -> f64 {
        [
            self.deep_sleep_minutes,
            self.rem_sleep_minutes,
            self.light_sleep_minutes,
        ]
        .iter()
        .flatten()
        .sum()
    }

    /// Whether the record carries a usable stage breakdown
    pub fn has_stage_breakdown(&self) -> bool {
        self.stage_minutes() > 0.0
    }

    /// Total sleep time in hours
    ///
    /// Stage minutes take precedence when their sum is positive, otherwise the
    /// reported duration is used if positive. `None` means no TST can be
    /// derived and the entry cannot contribute to any aggregate.
    pub fn total_sleep_hours(&self) -> Option<f64> {
        let stage_minutes = self.stage_minutes();
        if stage_minutes > 0.0 {
            return Some(stage_minutes / MINUTES_PER_HOUR);
        }

        self.sleep_duration_hours.filter(|hours| *hours > 0.0)
    }

    /// Midpoint instant between onset and final wake
    pub fn mid_sleep(&self) -> Option<DateTime<Utc>> {
        match (self.sleep_start, self.sleep_end) {
            (Some(start), Some(end)) if end > start => Some(start + (end - start) / 2),
            _ => None,
        }
    }

    /// Day of week used for workday/freeday lookup
    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// Whether a day of the week follows a work (constrained) or free schedule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    #[default]
    Workday,
    Freeday,
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayType::Workday => write!(f, "workday"),
            DayType::Freeday => write!(f, "freeday"),
        }
    }
}

/// Day type for each of the seven days of the week
///
/// Indexed Sunday = 0 through Saturday = 6. The mapping is total: a day with
/// no observations stays [`DayType::Workday`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekSchedule {
    days: [DayType; 7],
}

impl WeekSchedule {
    pub fn get(&self, weekday: Weekday) -> DayType {
        self.days[weekday.num_days_from_sunday() as usize]
    }

    pub fn set(&mut self, weekday: Weekday, day_type: DayType) {
        self.days[weekday.num_days_from_sunday() as usize] = day_type;
    }

    /// Day type of a calendar date
    pub fn for_date(&self, date: NaiveDate) -> DayType {
        self.get(date.weekday())
    }

    /// Sunday-first view of all seven days
    pub fn days(&self) -> &[DayType; 7] {
        &self.days
    }

    /// Number of weekdays classified as the given type
    pub fn count(&self, day_type: DayType) -> usize {
        self.days.iter().filter(|d| **d == day_type).count()
    }
}

/// Reliability tier of an MCTQ estimate, ordered low < medium < high
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub const HIGH_MIN_WORKDAYS: usize = 40;
    pub const HIGH_MIN_FREEDAYS: usize = 16;
    pub const MEDIUM_MIN_WORKDAYS: usize = 20;
    pub const MEDIUM_MIN_FREEDAYS: usize = 8;

    /// Tier implied by the number of workday and freeday samples
    pub fn from_counts(workdays: usize, freedays: usize) -> Self {
        if workdays >= Self::HIGH_MIN_WORKDAYS && freedays >= Self::HIGH_MIN_FREEDAYS {
            Confidence::High
        } else if workdays >= Self::MEDIUM_MIN_WORKDAYS && freedays >= Self::MEDIUM_MIN_FREEDAYS {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    /// Sample counts required to reach the next tier, if any
    pub fn next_tier(&self) -> Option<(Confidence, usize, usize)> {
        match self {
            Confidence::Low => Some((
                Confidence::Medium,
                Self::MEDIUM_MIN_WORKDAYS,
                Self::MEDIUM_MIN_FREEDAYS,
            )),
            Confidence::Medium => Some((
                Confidence::High,
                Self::HIGH_MIN_WORKDAYS,
                Self::HIGH_MIN_FREEDAYS,
            )),
            Confidence::High => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// Result of an MCTQ sleep-need calculation
///
/// Durations are hours, mid-sleep values are local clock times in decimal
/// hours. All numbers are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MctqResult {
    /// Mean sleep duration on workdays (SD_W)
    pub sd_workday: f64,

    /// Mean sleep duration on free days (SD_F)
    pub sd_freeday: f64,

    /// Weekly weighted mean sleep duration, (5·SD_W + 2·SD_F) / 7
    pub sd_week: f64,

    /// Estimated ideal sleep duration, clamped to the configured bounds
    pub sleep_need_ideal: f64,

    /// Absolute clock difference between free-day and workday mid-sleep
    pub social_jetlag: f64,

    /// Median mid-sleep on workdays (MSW)
    pub mid_sleep_workday: f64,

    /// Median mid-sleep on free days (MSF)
    pub mid_sleep_freeday: f64,

    /// Free-day mid-sleep corrected for oversleep (MSF_sc)
    pub mid_sleep_corrected: f64,

    pub workdays_count: usize,

    pub freedays_count: usize,

    pub confidence: Confidence,

    pub data_start_date: NaiveDate,

    pub data_end_date: NaiveDate,
}

impl MctqResult {
    /// Ideal sleep need as `"7h 45m"`
    pub fn sleep_need_string(&self) -> String {
        stats::hours_to_duration_string(self.sleep_need_ideal)
    }

    pub fn mid_sleep_workday_string(&self) -> String {
        stats::hours_to_time_string(self.mid_sleep_workday)
    }

    pub fn mid_sleep_freeday_string(&self) -> String {
        stats::hours_to_time_string(self.mid_sleep_freeday)
    }

    /// Chronotype marker (MSF_sc) as `HH:MM`
    pub fn chronotype_string(&self) -> String {
        stats::hours_to_time_string(self.mid_sleep_corrected)
    }
}

/// Readiness report for an MCTQ calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSufficiencyReport {
    pub sufficient: bool,
    pub workdays_available: usize,
    pub freedays_available: usize,
    pub workdays_needed: usize,
    pub freedays_needed: usize,
    /// Tier the current sample counts would produce, even when insufficient
    pub projected_confidence: Confidence,
    pub recommendation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_entry() -> SleepVitalsEntry {
        let start = Utc.with_ymd_and_hms(2024, 3, 3, 23, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap();
        SleepVitalsEntry::new(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), start, end)
    }

    #[test]
    fn test_total_sleep_prefers_stages() {
        let mut entry = sample_entry();
        entry.deep_sleep_minutes = Some(90.0);
        entry.rem_sleep_minutes = Some(90.0);
        entry.light_sleep_minutes = Some(240.0);
        entry.awake_sleep_minutes = Some(30.0);
        entry.sleep_duration_hours = Some(9.0);

        assert_eq!(entry.total_sleep_hours(), Some(7.0));
    }

    #[test]
    fn test_total_sleep_duration_fallback() {
        let mut entry = sample_entry();
        assert_eq!(entry.total_sleep_hours(), None);

        entry.sleep_duration_hours = Some(7.25);
        assert_eq!(entry.total_sleep_hours(), Some(7.25));

        entry.sleep_duration_hours = Some(0.0);
        assert_eq!(entry.total_sleep_hours(), None);

        // Zero-sum stages fall through to the duration field
        entry.deep_sleep_minutes = Some(0.0);
        entry.sleep_duration_hours = Some(6.5);
        assert_eq!(entry.total_sleep_hours(), Some(6.5));
    }

    #[test]
    fn test_mid_sleep() {
        let entry = sample_entry();
        let mid = entry.mid_sleep().unwrap();
        assert_eq!(mid, Utc.with_ymd_and_hms(2024, 3, 4, 3, 0, 0).unwrap());

        let mut reversed = sample_entry();
        std::mem::swap(&mut reversed.sleep_start, &mut reversed.sleep_end);
        assert!(reversed.mid_sleep().is_none());
    }

    #[test]
    fn test_entry_json_boundary() {
        let json = r#"{"date":"2024-03-04","sleepStartTimestamp":1709506800,
            "sleepEndTimestamp":1709535600,"sleepDurationHours":8.0,"validation":"AUTO_FINAL"}"#;
        let entry: SleepVitalsEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.sleep_start, Some(Utc.timestamp_opt(1709506800, 0).unwrap()));
        assert_eq!(entry.validation, Some(ValidationStatus::AutoFinal));
        assert_eq!(entry.deep_sleep_minutes, None);

        let out = serde_json::to_value(&entry).unwrap();
        assert_eq!(out["sleepEndTimestamp"], 1709535600);
        assert_eq!(out["validation"], "AUTO_FINAL");
    }

    #[test]
    fn test_fractional_epoch_seconds_accepted() {
        let json = r#"{"date":"2024-03-04","sleepStartTimestamp":1709506800.5,
            "sleepEndTimestamp":1709535600.0,"sleepDurationHours":8.0}"#;
        let entry: SleepVitalsEntry = serde_json::from_str(json).unwrap();

        assert_eq!(
            entry.sleep_start,
            Some(Utc.timestamp_millis_opt(1_709_506_800_500).unwrap())
        );
        assert_eq!(entry.sleep_end, Some(Utc.timestamp_opt(1709535600, 0).unwrap()));

        let nulls: SleepVitalsEntry =
            serde_json::from_str(r#"{"date":"2024-03-04","sleepStartTimestamp":null}"#).unwrap();
        assert!(nulls.sleep_start.is_none());
        assert!(nulls.sleep_end.is_none());
    }

    #[test]
    fn test_from_epoch_seconds() {
        assert_eq!(
            from_epoch_seconds(1709506800.25),
            Some(Utc.timestamp_millis_opt(1_709_506_800_250).unwrap())
        );
        assert!(from_epoch_seconds(f64::NAN).is_none());
        assert!(from_epoch_seconds(f64::INFINITY).is_none());
        assert!(from_epoch_seconds(1e300).is_none());
    }

    #[test]
    fn test_unknown_validation_status_preserved() {
        let status = ValidationStatus::from("SOMETHING_NEW".to_string());
        assert_eq!(status, ValidationStatus::Other("SOMETHING_NEW".to_string()));
        assert!(!status.is_accepted());
        assert!(!status.is_tentative());
        assert_eq!(status.to_string(), "SOMETHING_NEW");
    }

    #[test]
    fn test_week_schedule_defaults_to_workday() {
        let mut schedule = WeekSchedule::default();
        assert_eq!(schedule.count(DayType::Workday), 7);

        schedule.set(Weekday::Sat, DayType::Freeday);
        schedule.set(Weekday::Sun, DayType::Freeday);
        assert_eq!(schedule.days()[0], DayType::Freeday);
        assert_eq!(schedule.days()[6], DayType::Freeday);
        assert_eq!(schedule.count(DayType::Freeday), 2);

        // 2024-03-09 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(schedule.for_date(saturday), DayType::Freeday);
    }

    #[test]
    fn test_confidence_tiers() {
        assert_eq!(Confidence::from_counts(40, 16), Confidence::High);
        assert_eq!(Confidence::from_counts(20, 8), Confidence::Medium);
        assert_eq!(Confidence::from_counts(39, 16), Confidence::Medium);
        assert_eq!(Confidence::from_counts(100, 7), Confidence::Low);
        assert_eq!(Confidence::from_counts(19, 100), Confidence::Low);
        assert!(Confidence::Low < Confidence::Medium && Confidence::Medium < Confidence::High);
    }

    #[test]
    fn test_confidence_serialization() {
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"medium\"");
        assert_eq!(serde_json::to_string(&DayType::Freeday).unwrap(), "\"freeday\"");
    }
}
