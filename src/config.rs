use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::circadian::CircadianConfig;
use crate::error::{Result, SleepRsError};
use crate::logging::LogConfig;

/// Tunable parameters for the MCTQ pipeline
///
/// Passed explicitly to every calculator; there is no global default
/// instance. Every field is optional in an override document:
///
/// ```rust
/// use sleeprs::config::SleepNeedConfig;
///
/// let config: SleepNeedConfig =
///     serde_json::from_str(r#"{"minWorkdaysForCalculation": 5}"#).unwrap();
/// assert_eq!(config.min_workdays_for_calculation, 5);
/// assert_eq!(config.min_freedays_for_calculation, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SleepNeedConfig {
    /// Minimum valid workday nights before a result is produced, at least 1 (default: 10)
    pub min_workdays_for_calculation: usize,

    /// Minimum valid free-day nights before a result is produced, at least 1 (default: 4)
    pub min_freedays_for_calculation: usize,

    /// Lower clamp for the ideal sleep need in hours (default: 6.0)
    pub min_sleep_need: f64,

    /// Upper clamp for the ideal sleep need in hours (default: 10.0)
    pub max_sleep_need: f64,

    /// Offset from UTC of the sleeper's local clock, in minutes (default: 0)
    pub utc_offset_minutes: i32,

    /// Conditionally accept tentative records that carry stage data
    pub accept_tentative: bool,

    /// Workday/freeday classification thresholds
    pub classifier: ClassifierConfig,
}

impl Default for SleepNeedConfig {
    fn default() -> Self {
        SleepNeedConfig {
            min_workdays_for_calculation: 10,
            min_freedays_for_calculation: 4,
            min_sleep_need: 6.0,
            max_sleep_need: 10.0,
            utc_offset_minutes: 0,
            accept_tentative: true,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl SleepNeedConfig {
    /// Local clock offset; out-of-range values fall back to UTC
    pub fn utc_offset(&self) -> FixedOffset {
        self.checked_offset().unwrap_or_else(|| Utc.fix())
    }

    fn checked_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    /// Workday nights actually required; a zero threshold counts as one
    pub fn required_workdays(&self) -> usize {
        self.min_workdays_for_calculation.max(1)
    }

    /// Free-day nights actually required; a zero threshold counts as one
    pub fn required_freedays(&self) -> usize {
        self.min_freedays_for_calculation.max(1)
    }

    /// Clamp a sleep-need estimate to the configured bounds
    pub fn clamp_sleep_need(&self, hours: f64) -> f64 {
        hours.max(self.min_sleep_need).min(self.max_sleep_need)
    }

    /// Check internal consistency of the thresholds
    pub fn validate(&self) -> Result<()> {
        if self.min_workdays_for_calculation == 0 || self.min_freedays_for_calculation == 0 {
            return Err(SleepRsError::Configuration(format!(
                "sample thresholds must be at least 1: workdays={} freedays={}",
                self.min_workdays_for_calculation, self.min_freedays_for_calculation
            )));
        }
        if !(self.min_sleep_need > 0.0 && self.min_sleep_need <= self.max_sleep_need) {
            return Err(SleepRsError::Configuration(format!(
                "invalid sleep need bounds: min={} max={}",
                self.min_sleep_need, self.max_sleep_need
            )));
        }
        if self.checked_offset().is_none() {
            return Err(SleepRsError::Configuration(format!(
                "invalid UTC offset: {} minutes",
                self.utc_offset_minutes
            )));
        }
        self.classifier.validate()
    }
}

/// Thresholds for classifying a weekday from its wake times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierConfig {
    /// Largest median-wake delay behind the earliest weekday that still
    /// counts as a workday, in hours (default: 1.0)
    pub max_wake_delay_hours: f64,

    /// Largest wake-time standard deviation for a workday, in hours (default: 0.75)
    pub max_wake_spread_hours: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            max_wake_delay_hours: 1.0,
            max_wake_spread_hours: 0.75,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.max_wake_delay_hours >= 0.0 && self.max_wake_spread_hours >= 0.0) {
            return Err(SleepRsError::Configuration(
                "classifier thresholds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// MCTQ thresholds and bounds
    #[serde(default)]
    pub sleep_need: SleepNeedConfig,

    /// Two-process model parameters
    #[serde(default)]
    pub circadian: CircadianConfig,

    /// Logging setup for the CLI
    #[serde(default)]
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            sleep_need: SleepNeedConfig::default(),
            circadian: CircadianConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| {
            SleepRsError::Configuration(format!(
                "failed to read config file {}: {}",
                path.display(),
                err
            ))
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|err| {
            SleepRsError::Configuration(format!("failed to parse {}: {}", path.display(), err))
        })?;

        config.sleep_need.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_content = toml::to_string_pretty(self).map_err(|err| {
            SleepRsError::Configuration(format!("failed to serialize configuration: {}", err))
        })?;
        fs::write(path, toml_content)?;

        Ok(())
    }

    /// Write a fresh default configuration to `path` and return it
    ///
    /// Never reads `path` first, so it works for files that do not exist yet.
    pub fn init_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = AppConfig::default();
        config.save_to_file(path)?;
        Ok(config)
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".sleeprs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file not loaded, using defaults"
                );
                Self::default()
            }
        }
    }
}
