//! Sleep history import
//!
//! Boundary loaders that turn files into [`SleepVitalsEntry`] collections.
//! Loaders only check shape; physiological plausibility is left to the
//! validator so that one bad night never aborts an import.

use std::path::Path;
use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::models::SleepVitalsEntry;

pub mod csv;
pub mod json;

/// Trait for importing sleep history from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import sleep entries from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<SleepVitalsEntry>>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(json::JsonImporter::new()),
            Box::new(csv::CsvImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format from its extension
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<SleepVitalsEntry>> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound {
                path: file_path.to_path_buf(),
            }
            .into());
        }

        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: extension(file_path).unwrap_or_default(),
            })?;

        debug!(
            file = %file_path.display(),
            format = importer.get_format_name(),
            "Importing sleep history"
        );

        let mut entries = importer.import_file(file_path)?;
        entries.sort_by_key(|entry| entry.date);

        info!(
            file = %file_path.display(),
            entries = entries.len(),
            "Imported sleep history"
        );

        Ok(entries)
    }

    /// Import with an explicit format name, ignoring the file extension
    pub fn import_file_as(&self, file_path: &Path, format: &str) -> Result<Vec<SleepVitalsEntry>> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.get_format_name().eq_ignore_ascii_case(format))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                format: format.to_string(),
            })?;

        let mut entries = importer.import_file(file_path)?;
        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }
}

/// Lower-cased file extension
pub(crate) fn extension(file_path: &Path) -> Option<String> {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
