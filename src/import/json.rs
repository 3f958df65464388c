use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::import::{extension, ImportFormat};
use crate::models::SleepVitalsEntry;

/// Importer for a JSON array of sleep entries (epoch-second timestamps)
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }

    /// Parse entries from an in-memory JSON document
    pub fn parse_str(content: &str) -> Result<Vec<SleepVitalsEntry>> {
        Ok(serde_json::from_str(content)?)
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        extension(file_path).as_deref() == Some("json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<SleepVitalsEntry>> {
        let content = fs::read_to_string(file_path)?;
        Self::parse_str(&content)
    }

    fn get_format_name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_array() {
        let entries = JsonImporter::parse_str(
            r#"[
                {"date":"2024-03-04","sleepStartTimestamp":1709506800,
                 "sleepEndTimestamp":1709535600,"sleepDurationHours":8.0},
                {"date":"2024-03-05","deepSleepMinutes":60}
            ]"#,
        )
        .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[1].sleep_start.is_none());
        assert_eq!(entries[1].deep_sleep_minutes, Some(60.0));
    }

    #[test]
    fn test_rejects_non_array() {
        assert!(JsonImporter::parse_str(r#"{"date":"2024-03-04"}"#).is_err());
    }

    #[test]
    fn test_can_import() {
        let importer = JsonImporter::new();
        assert!(importer.can_import(Path::new("history.JSON")));
        assert!(!importer.can_import(Path::new("history.csv")));
    }
}
