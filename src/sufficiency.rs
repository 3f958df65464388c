//! Data sufficiency checks
//!
//! Reports whether a sleep history is ready for an MCTQ calculation without
//! running the aggregation itself, and what is still missing.

use tracing::debug;

use crate::classifier::DayClassifier;
use crate::config::SleepNeedConfig;
use crate::models::{Confidence, DataSufficiencyReport, SleepVitalsEntry};
use crate::validation::EntryValidator;

/// Readiness checker sharing the MCTQ validation and classification pipeline
#[derive(Debug, Clone, Default)]
pub struct DataSufficiencyChecker {
    config: SleepNeedConfig,
}

impl DataSufficiencyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SleepNeedConfig) -> Self {
        DataSufficiencyChecker { config }
    }

    /// Count usable workday and free-day nights and build the report
    pub fn check(&self, entries: &[SleepVitalsEntry]) -> DataSufficiencyReport {
        let valid = EntryValidator::new(&self.config).validate(entries);
        let history = DayClassifier::new(&self.config).partition(&valid);

        let report = self.report_for_counts(history.workdays.len(), history.freedays.len());

        debug!(
            sufficient = report.sufficient,
            workdays = report.workdays_available,
            freedays = report.freedays_available,
            confidence = %report.projected_confidence,
            "Checked data sufficiency"
        );

        report
    }

    /// Build a report from already-known sample counts
    pub fn report_for_counts(&self, workdays: usize, freedays: usize) -> DataSufficiencyReport {
        let workdays_needed = self.config.required_workdays();
        let freedays_needed = self.config.required_freedays();
        let projected_confidence = Confidence::from_counts(workdays, freedays);

        let missing_workdays = workdays_needed.saturating_sub(workdays);
        let missing_freedays = freedays_needed.saturating_sub(freedays);
        let sufficient = missing_workdays == 0 && missing_freedays == 0;

        let recommendation = match (missing_workdays, missing_freedays) {
            (0, 0) => sufficient_recommendation(workdays, freedays, projected_confidence),
            (w, 0) => format!(
                "Track {} more workday {} to unlock your sleep need estimate ({} of {} recorded).",
                w,
                nights(w),
                workdays,
                workdays_needed
            ),
            (0, f) => format!(
                "Track {} more free day {} (weekends or days off) to unlock your sleep need \
                 estimate ({} of {} recorded).",
                f,
                nights(f),
                freedays,
                freedays_needed
            ),
            (w, f) => format!(
                "Keep tracking: {} more workday {} and {} more free day {} are needed \
                 before your sleep need can be estimated.",
                w,
                nights(w),
                f,
                nights(f)
            ),
        };

        DataSufficiencyReport {
            sufficient,
            workdays_available: workdays,
            freedays_available: freedays,
            workdays_needed,
            freedays_needed,
            projected_confidence,
            recommendation,
        }
    }
}

/// Check data sufficiency with an explicit configuration
pub fn check_data_sufficiency(
    entries: &[SleepVitalsEntry],
    config: &SleepNeedConfig,
) -> DataSufficiencyReport {
    DataSufficiencyChecker::with_config(config.clone()).check(entries)
}

fn nights(count: usize) -> &'static str {
    if count == 1 {
        "night"
    } else {
        "nights"
    }
}

fn sufficient_recommendation(workdays: usize, freedays: usize, confidence: Confidence) -> String {
    match confidence.next_tier() {
        None => format!(
            "Enough data for a high confidence estimate ({} workdays, {} free days).",
            workdays, freedays
        ),
        Some((next, workdays_target, freedays_target)) => {
            let more_workdays = workdays_target.saturating_sub(workdays);
            let more_freedays = freedays_target.saturating_sub(freedays);
            let mut missing = Vec::new();
            if more_workdays > 0 {
                missing.push(format!("{} more workday {}", more_workdays, nights(more_workdays)));
            }
            if more_freedays > 0 {
                missing.push(format!("{} more free day {}", more_freedays, nights(more_freedays)));
            }
            format!(
                "Enough data for a {} confidence estimate. Track {} to reach {} confidence.",
                confidence,
                missing.join(" and "),
                next
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sufficient_high_confidence() {
        let report = DataSufficiencyChecker::new().report_for_counts(45, 18);
        assert!(report.sufficient);
        assert_eq!(report.projected_confidence, Confidence::High);
        assert!(report.recommendation.contains("high confidence"));
    }

    #[test]
    fn test_sufficient_lower_tiers_point_to_next_tier() {
        let checker = DataSufficiencyChecker::new();

        let report = checker.report_for_counts(25, 8);
        assert!(report.sufficient);
        assert_eq!(report.projected_confidence, Confidence::Medium);
        assert!(report.recommendation.contains("medium confidence"));
        assert!(report.recommendation.contains("15 more workday nights"));
        assert!(report.recommendation.contains("8 more free day nights"));
        assert!(report.recommendation.contains("high confidence"));

        let report = checker.report_for_counts(12, 4);
        assert!(report.sufficient);
        assert_eq!(report.projected_confidence, Confidence::Low);
        assert!(report.recommendation.contains("low confidence"));
        assert!(report.recommendation.contains("medium confidence"));
    }

    #[test]
    fn test_insufficient_workdays_only() {
        let report = DataSufficiencyChecker::new().report_for_counts(9, 6);
        assert!(!report.sufficient);
        assert_eq!(report.workdays_needed, 10);
        assert!(report.recommendation.contains("1 more workday night "));
        assert!(!report.recommendation.contains("free day"));
    }

    #[test]
    fn test_insufficient_freedays_only() {
        let report = DataSufficiencyChecker::new().report_for_counts(30, 1);
        assert!(!report.sufficient);
        assert!(report.recommendation.contains("3 more free day nights"));
        assert_eq!(report.projected_confidence, Confidence::Low);
    }

    #[test]
    fn test_insufficient_both() {
        let report = DataSufficiencyChecker::new().report_for_counts(3, 1);
        assert!(!report.sufficient);
        assert!(report.recommendation.contains("7 more workday nights"));
        assert!(report.recommendation.contains("3 more free day nights"));
    }

    #[test]
    fn test_projected_confidence_when_insufficient() {
        let checker = DataSufficiencyChecker::with_config(SleepNeedConfig {
            min_workdays_for_calculation: 50,
            ..SleepNeedConfig::default()
        });
        let report = checker.report_for_counts(45, 20);
        assert!(!report.sufficient);
        assert_eq!(report.projected_confidence, Confidence::High);
    }

    #[test]
    fn test_empty_history() {
        let report = check_data_sufficiency(&[], &SleepNeedConfig::default());
        assert!(!report.sufficient);
        assert_eq!(report.workdays_available, 0);
        assert_eq!(report.freedays_available, 0);
    }
}
