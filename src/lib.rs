// Library interface for sleeprs modules
// Pure estimation pipeline plus boundary loaders used by the CLI

pub mod circadian;
pub mod classifier;
pub mod config;
pub mod error;
pub mod import;
pub mod logging;
pub mod mctq;
pub mod models;
pub mod stats;
pub mod sufficiency;
pub mod validation;

// Re-export commonly used types for convenience
pub use models::*;
pub use circadian::{
    calculate_energy, calculate_process_c, calculate_process_s, parse_instant, CircadianConfig,
    EnergyPoint, TwoProcessModel,
};
pub use classifier::{DayClassifier, PartitionedHistory, WeekdayWakeProfile};
pub use config::{AppConfig, ClassifierConfig, SleepNeedConfig};
pub use mctq::{calculate_mctq, MctqCalculator};
pub use sufficiency::{check_data_sufficiency, DataSufficiencyChecker};
pub use validation::{validate_entries, EntryValidator, RejectionReason};
pub use error::{SleepRsError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
