use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::circadian::parse_instant;
use crate::error::{ImportError, ParseError, Result, SleepRsError};
use crate::import::{extension, ImportFormat};
use crate::models::{from_epoch_seconds, SleepVitalsEntry, ValidationStatus};

/// CSV importer with flexible column mapping
///
/// Timestamp columns accept Unix-epoch seconds or ISO-8601 date-times.
/// Empty cells are treated as missing values.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(&mut column_mapping, "date", &["date", "calendar_date", "day"]);
        Self::add_mapping(
            &mut column_mapping,
            "sleep_start",
            &["sleepstarttimestamp", "sleep_start_timestamp", "sleep_start", "start", "bedtime"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sleep_end",
            &["sleependtimestamp", "sleep_end_timestamp", "sleep_end", "end", "wake", "wake_time"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "deep",
            &["deepsleepminutes", "deep_sleep_minutes", "deep", "deep_minutes"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "rem",
            &["remsleepminutes", "rem_sleep_minutes", "rem", "rem_minutes"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "light",
            &["lightsleepminutes", "light_sleep_minutes", "light", "light_minutes"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "awake",
            &["awakesleepminutes", "awake_sleep_minutes", "awake", "awake_minutes"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration",
            &["sleepdurationhours", "sleep_duration_hours", "duration", "duration_hours"],
        );
        Self::add_mapping(&mut column_mapping, "validation", &["validation", "status"]);

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Read entries from any CSV source with a header row
    pub fn read_entries<R: Read>(&self, reader: R) -> Result<Vec<SleepVitalsEntry>> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: HashMap<String, usize> = csv_reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(index, name)| (self.normalize_column_name(name), index))
            .collect();

        if !columns.contains_key("date") {
            return Err(ImportError::InvalidRecord {
                row: 0,
                reason: "missing date column".to_string(),
            }
            .into());
        }

        let mut entries = Vec::new();
        for (index, record) in csv_reader.records().enumerate() {
            let record = record?;
            // Header is row 1
            let row = index + 2;
            let fields = RowFields {
                record: &record,
                columns: &columns,
            };
            entries.push(Self::entry_from_row(&fields).map_err(|err| {
                SleepRsError::from(ImportError::InvalidRecord {
                    row,
                    reason: err.to_string(),
                })
            })?);
        }

        Ok(entries)
    }

    fn entry_from_row(fields: &RowFields<'_>) -> Result<SleepVitalsEntry> {
        let date_str = fields.get("date").unwrap_or_default();
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|_| {
            ParseError::InvalidDate {
                input: date_str.to_string(),
            }
        })?;

        Ok(SleepVitalsEntry {
            date,
            sleep_start: fields.get("sleep_start").map(parse_timestamp).transpose()?,
            sleep_end: fields.get("sleep_end").map(parse_timestamp).transpose()?,
            deep_sleep_minutes: fields.number("deep")?,
            rem_sleep_minutes: fields.number("rem")?,
            light_sleep_minutes: fields.number("light")?,
            awake_sleep_minutes: fields.number("awake")?,
            sleep_duration_hours: fields.number("duration")?,
            validation: fields
                .get("validation")
                .map(|tag| ValidationStatus::from(tag.to_string())),
        })
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Column lookup over one CSV record
struct RowFields<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl<'a> RowFields<'a> {
    /// Non-empty cell value for a standard column
    fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|index| self.record.get(*index))
            .filter(|value| !value.is_empty())
    }

    fn number(&self, column: &str) -> Result<Option<f64>> {
        self.get(column)
            .map(|value| {
                value.parse::<f64>().map_err(|_| {
                    SleepRsError::from(ParseError::InvalidNumber {
                        column: column.to_string(),
                        input: value.to_string(),
                    })
                })
            })
            .transpose()
    }
}

/// Epoch seconds (whole or fractional) or ISO-8601 instant
fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let instant = if let Ok(seconds) = value.parse::<i64>() {
        DateTime::from_timestamp(seconds, 0)
    } else if let Ok(seconds) = value.parse::<f64>() {
        from_epoch_seconds(seconds)
    } else {
        return parse_instant(value);
    };

    instant.ok_or_else(|| {
        ParseError::InvalidTimestamp {
            value: value.to_string(),
        }
        .into()
    })
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        extension(file_path).as_deref() == Some("csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<SleepVitalsEntry>> {
        let file = std::fs::File::open(file_path)?;
        self.read_entries(file)
    }

    fn get_format_name(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_read_entries_with_aliases() {
        let data = "\
date,sleepStartTimestamp,sleepEndTimestamp,deepSleepMinutes,remSleepMinutes,lightSleepMinutes,validation
2024-03-04,1709506800,1709535600,90,100,240,ENHANCED_FINAL
2024-03-05,2024-03-04T23:15:00Z,2024-03-05T07:00:00Z,,,,
";
        let entries = CsvImporter::new().read_entries(data.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].total_sleep_hours(), Some(430.0 / 60.0));
        assert_eq!(entries[0].validation, Some(ValidationStatus::EnhancedFinal));
        assert_eq!(
            entries[1].sleep_start,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 23, 15, 0).unwrap())
        );
        assert_eq!(entries[1].deep_sleep_minutes, None);
        assert_eq!(entries[1].validation, None);
    }

    #[test]
    fn test_short_column_names() {
        let data = "Date,Start,End,Duration\n2024-03-04,1709506800,1709535600,8\n";
        let entries = CsvImporter::new().read_entries(data.as_bytes()).unwrap();
        assert_eq!(entries[0].sleep_duration_hours, Some(8.0));
        assert!(entries[0].sleep_end.is_some());
    }

    #[test]
    fn test_invalid_row_reports_row_number() {
        let data = "date,duration\n2024-03-04,8\nnot-a-date,7\n";
        let err = CsvImporter::new().read_entries(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SleepRsError::Import(ImportError::InvalidRecord { row: 3, .. })
        ));
    }

    #[test]
    fn test_non_numeric_stage_minutes() {
        let data = "date,deep\n2024-03-04,lots\n";
        let err = CsvImporter::new().read_entries(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("deep"));
    }

    #[test]
    fn test_fractional_epoch_seconds() {
        let data = "date,start,end,duration\n2024-03-04,1709506800.5,1709535600.0,8\n";
        let entries = CsvImporter::new().read_entries(data.as_bytes()).unwrap();
        assert_eq!(
            entries[0].sleep_start,
            Some(Utc.timestamp_millis_opt(1_709_506_800_500).unwrap())
        );
        assert_eq!(
            entries[0].sleep_end,
            Some(Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_non_finite_epoch_rejected() {
        let data = "date,start\n2024-03-04,NaN\n";
        let err = CsvImporter::new().read_entries(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("NaN"));
    }

    #[test]
    fn test_missing_date_column() {
        let data = "start,end\n1,2\n";
        assert!(CsvImporter::new().read_entries(data.as_bytes()).is_err());
    }
}
