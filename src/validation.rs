//! Entry validation
//!
//! Filters a raw sleep history down to records that are well-formed and
//! physiologically plausible. Validation never fails: records that break a
//! rule are dropped and the reason is traced.

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::SleepNeedConfig;
use crate::models::SleepVitalsEntry;

/// Shortest total sleep time accepted for one night, in hours
pub const MIN_TOTAL_SLEEP_HOURS: f64 = 3.0;

/// Longest total sleep time accepted for one night, in hours
pub const MAX_TOTAL_SLEEP_HOURS: f64 = 14.0;

/// Why an entry was excluded from aggregation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectionReason {
    #[error("missing sleep start or end timestamp")]
    MissingTimestamps,

    #[error("sleep end is not after sleep start")]
    EndBeforeStart,

    #[error("no stage breakdown or duration to derive total sleep time")]
    NoSleepDuration,

    #[error("total sleep time {0:.2}h outside 3-14h")]
    DurationOutOfRange(f64),

    #[error("validation status {0} not accepted")]
    RejectedStatus(String),

    #[error("tentative status {0} without stage data")]
    TentativeWithoutStages(String),
}

/// Entry validator bound to a configuration
#[derive(Debug, Clone, Copy)]
pub struct EntryValidator {
    accept_tentative: bool,
}

impl Default for EntryValidator {
    fn default() -> Self {
        EntryValidator {
            accept_tentative: true,
        }
    }
}

impl EntryValidator {
    pub fn new(config: &SleepNeedConfig) -> Self {
        EntryValidator {
            accept_tentative: config.accept_tentative,
        }
    }

    /// Check one entry against every rule
    pub fn check(&self, entry: &SleepVitalsEntry) -> Result<(), RejectionReason> {
        let (start, end) = match (entry.sleep_start, entry.sleep_end) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(RejectionReason::MissingTimestamps),
        };
        if end <= start {
            return Err(RejectionReason::EndBeforeStart);
        }

        let tst = entry
            .total_sleep_hours()
            .ok_or(RejectionReason::NoSleepDuration)?;
        if !(MIN_TOTAL_SLEEP_HOURS..=MAX_TOTAL_SLEEP_HOURS).contains(&tst) {
            return Err(RejectionReason::DurationOutOfRange(tst));
        }

        if let Some(status) = &entry.validation {
            if status.is_tentative() {
                if !self.accept_tentative {
                    return Err(RejectionReason::RejectedStatus(status.to_string()));
                }
                if !entry.has_stage_breakdown() {
                    return Err(RejectionReason::TentativeWithoutStages(status.to_string()));
                }
            } else if !status.is_accepted() {
                return Err(RejectionReason::RejectedStatus(status.to_string()));
            }
        }

        Ok(())
    }

    pub fn is_valid(&self, entry: &SleepVitalsEntry) -> bool {
        self.check(entry).is_ok()
    }

    /// Keep only entries that pass every rule, preserving input order
    pub fn validate<'a>(&self, entries: &'a [SleepVitalsEntry]) -> Vec<&'a SleepVitalsEntry> {
        let valid: Vec<&SleepVitalsEntry> = entries
            .iter()
            .filter(|entry| match self.check(entry) {
                Ok(()) => true,
                Err(reason) => {
                    trace!(date = %entry.date, %reason, "Sleep entry rejected");
                    false
                }
            })
            .collect();

        debug!(
            total = entries.len(),
            accepted = valid.len(),
            rejected = entries.len() - valid.len(),
            "Validated sleep history"
        );

        valid
    }
}

/// Filter a history with the validator implied by `config`
pub fn validate_entries<'a>(
    entries: &'a [SleepVitalsEntry],
    config: &SleepNeedConfig,
) -> Vec<&'a SleepVitalsEntry> {
    EntryValidator::new(config).validate(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationStatus;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn entry_with_hours(hours: f64) -> SleepVitalsEntry {
        let start = Utc.with_ymd_and_hms(2024, 3, 3, 23, 0, 0).unwrap();
        let end = start + Duration::minutes((hours * 60.0) as i64 + 20);
        let mut entry =
            SleepVitalsEntry::new(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), start, end);
        entry.sleep_duration_hours = Some(hours);
        entry
    }

    #[test]
    fn test_accepts_plausible_entry() {
        let validator = EntryValidator::default();
        assert!(validator.is_valid(&entry_with_hours(7.5)));
        assert!(validator.is_valid(&entry_with_hours(3.0)));
        assert!(validator.is_valid(&entry_with_hours(14.0)));
    }

    #[test]
    fn test_rejects_out_of_range_duration() {
        let validator = EntryValidator::default();
        assert_eq!(
            validator.check(&entry_with_hours(2.5)),
            Err(RejectionReason::DurationOutOfRange(2.5))
        );
        assert!(!validator.is_valid(&entry_with_hours(14.5)));
    }

    #[test]
    fn test_rejects_missing_or_reversed_timestamps() {
        let validator = EntryValidator::default();

        let mut entry = entry_with_hours(7.0);
        entry.sleep_end = None;
        assert_eq!(validator.check(&entry), Err(RejectionReason::MissingTimestamps));

        let mut entry = entry_with_hours(7.0);
        entry.sleep_end = entry.sleep_start;
        assert_eq!(validator.check(&entry), Err(RejectionReason::EndBeforeStart));
    }

    #[test]
    fn test_rejects_entry_without_duration() {
        let mut entry = entry_with_hours(7.0);
        entry.sleep_duration_hours = None;
        assert_eq!(
            EntryValidator::default().check(&entry),
            Err(RejectionReason::NoSleepDuration)
        );
    }

    #[test]
    fn test_validation_status_rules() {
        let validator = EntryValidator::default();

        let mut entry = entry_with_hours(7.0);
        entry.validation = Some(ValidationStatus::EnhancedConfirmedFinal);
        assert!(validator.is_valid(&entry));

        entry.validation = Some(ValidationStatus::OffWrist);
        assert!(!validator.is_valid(&entry));

        entry.validation = Some(ValidationStatus::Other("BOGUS".to_string()));
        assert!(!validator.is_valid(&entry));
    }

    #[test]
    fn test_tentative_status_needs_stage_data() {
        let validator = EntryValidator::default();

        let mut entry = entry_with_hours(7.0);
        entry.validation = Some(ValidationStatus::EnhancedTentative);
        assert!(matches!(
            validator.check(&entry),
            Err(RejectionReason::TentativeWithoutStages(_))
        ));

        entry.deep_sleep_minutes = Some(80.0);
        entry.rem_sleep_minutes = Some(90.0);
        entry.light_sleep_minutes = Some(250.0);
        assert!(validator.is_valid(&entry));

        let strict = EntryValidator::new(&SleepNeedConfig {
            accept_tentative: false,
            ..SleepNeedConfig::default()
        });
        assert!(!strict.is_valid(&entry));
    }

    #[test]
    fn test_validate_filters_and_preserves_order() {
        let entries = vec![
            entry_with_hours(7.0),
            entry_with_hours(1.0),
            entry_with_hours(8.0),
        ];
        let valid = validate_entries(&entries, &SleepNeedConfig::default());

        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].sleep_duration_hours, Some(7.0));
        assert_eq!(valid[1].sleep_duration_hours, Some(8.0));
    }
}
