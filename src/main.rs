use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use sleeprs::classifier::DayClassifier;
use sleeprs::config::AppConfig;
use sleeprs::error::{ErrorSeverity, SleepRsError};
use sleeprs::import::ImportManager;
use sleeprs::logging::{init_logging, LogLevel};
use sleeprs::models::{Confidence, SleepVitalsEntry};
use sleeprs::stats::hours_to_time_string;
use sleeprs::validation::EntryValidator;
use sleeprs::{parse_instant, DataSufficiencyChecker, MctqCalculator, TwoProcessModel};

/// sleeprs - Sleep Need & Chronotype CLI
///
/// Estimates ideal sleep duration, social jetlag and chronotype from a sleep
/// history using the Munich ChronoType Questionnaire method, and projects
/// daytime energy with the two-process model.
#[derive(Parser)]
#[command(name = "sleeprs")]
#[command(version)]
#[command(about = "Sleep need and chronotype analysis CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate sleep need, social jetlag and chronotype
    Analyze {
        /// Sleep history file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (auto-detect if not specified)
        #[arg(long)]
        format: Option<String>,
    },

    /// Report whether the history is large enough for an estimate
    Sufficiency {
        /// Sleep history file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (auto-detect if not specified)
        #[arg(long)]
        format: Option<String>,
    },

    /// Show the inferred workday / free-day schedule
    Classify {
        /// Sleep history file (JSON or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// File format (auto-detect if not specified)
        #[arg(long)]
        format: Option<String>,
    },

    /// Project energy over the day from the last wake time
    Energy {
        /// Last wake time (ISO-8601)
        #[arg(short, long)]
        wake: String,

        /// Curve start (ISO-8601, defaults to the wake time)
        #[arg(long)]
        from: Option<String>,

        /// Hours to project
        #[arg(long, default_value = "16")]
        hours: u32,

        /// Minutes between points
        #[arg(long, default_value = "60")]
        step: u32,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(Tabled)]
struct WeekdayRow {
    #[tabled(rename = "Day")]
    day: &'static str,
    #[tabled(rename = "Nights")]
    samples: usize,
    #[tabled(rename = "Median wake")]
    median_wake: String,
    #[tabled(rename = "Spread (h)")]
    spread: String,
    #[tabled(rename = "Delay (h)")]
    delay: String,
    #[tabled(rename = "Type")]
    day_type: String,
}

#[derive(Tabled)]
struct EnergyRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Awake (h)")]
    awake: String,
    #[tabled(rename = "S")]
    process_s: String,
    #[tabled(rename = "C")]
    process_c: String,
    #[tabled(rename = "Energy")]
    energy: String,
}

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), &cli.command)?;

    let mut log_config = config.logging.clone();
    log_config.level = LogLevel::from_verbosity(log_config.level, cli.verbose);
    init_logging(&log_config)?;

    match cli.command {
        Commands::Analyze { file, format } => {
            let entries = load_history(&file, format.as_deref())?;
            let calculator = MctqCalculator::with_config(config.sleep_need.clone());
            let result = calculator.calculate(&entries);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            match result {
                Some(result) => {
                    println!("{}", "Sleep need analysis".cyan().bold());
                    println!(
                        "  Data: {} to {} ({} workdays, {} free days)",
                        result.data_start_date,
                        result.data_end_date,
                        result.workdays_count,
                        result.freedays_count
                    );
                    println!(
                        "  Sleep on workdays:   {:.2} h   mid-sleep {}",
                        result.sd_workday,
                        result.mid_sleep_workday_string()
                    );
                    println!(
                        "  Sleep on free days:  {:.2} h   mid-sleep {}",
                        result.sd_freeday,
                        result.mid_sleep_freeday_string()
                    );
                    println!("  Weekly average:      {:.2} h", result.sd_week);
                    println!(
                        "  {} {}",
                        "Ideal sleep need:".bold(),
                        result.sleep_need_string().green().bold()
                    );
                    println!("  Social jetlag:       {:.2} h", result.social_jetlag);
                    println!("  Chronotype (MSF_sc): {}", result.chronotype_string());
                    println!("  Confidence:          {}", colored_confidence(result.confidence));
                }
                None => {
                    let report = DataSufficiencyChecker::with_config(config.sleep_need.clone())
                        .check(&entries);
                    println!("{}", "Not enough data for a sleep need estimate".yellow().bold());
                    println!("  {}", report.recommendation);
                }
            }
        }

        Commands::Sufficiency { file, format } => {
            let entries = load_history(&file, format.as_deref())?;
            let report =
                DataSufficiencyChecker::with_config(config.sleep_need.clone()).check(&entries);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            let status = if report.sufficient {
                "✓ Sufficient data".green().bold()
            } else {
                "✗ Insufficient data".yellow().bold()
            };
            println!("{}", status);
            println!(
                "  Workdays:  {} / {}",
                report.workdays_available, report.workdays_needed
            );
            println!(
                "  Free days: {} / {}",
                report.freedays_available, report.freedays_needed
            );
            println!(
                "  Projected confidence: {}",
                colored_confidence(report.projected_confidence)
            );
            println!("  {}", report.recommendation);
        }

        Commands::Classify { file, format } => {
            let entries = load_history(&file, format.as_deref())?;
            let valid = EntryValidator::new(&config.sleep_need).validate(&entries);
            let profiles = DayClassifier::new(&config.sleep_need).profiles(&valid);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&profiles)?);
                return Ok(());
            }

            println!(
                "{}",
                format!(
                    "Week schedule from {} valid nights ({} rejected)",
                    valid.len(),
                    entries.len() - valid.len()
                )
                .cyan()
                .bold()
            );

            let rows: Vec<WeekdayRow> = profiles
                .iter()
                .map(|p| WeekdayRow {
                    day: DAY_NAMES[p.weekday as usize],
                    samples: p.samples,
                    median_wake: p
                        .median_wake_hour
                        .map(hours_to_time_string)
                        .unwrap_or_else(|| "-".to_string()),
                    spread: format!("{:.2}", p.wake_spread_hours),
                    delay: format!("{:.2}", p.wake_delay_hours),
                    day_type: p.day_type.to_string(),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Energy {
            wake,
            from,
            hours,
            step,
        } => {
            let last_wake = parse_instant(&wake).map_err(user_error)?;
            let start = match from {
                Some(from) => parse_instant(&from).map_err(user_error)?,
                None => last_wake,
            };

            let model = TwoProcessModel::with_config(config.circadian.clone());
            let curve = model.energy_curve(last_wake, start, hours, step);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&curve)?);
                return Ok(());
            }

            let now = model.energy_at(Utc::now(), last_wake);
            println!("{}", "Projected energy".cyan().bold());
            let rows: Vec<EnergyRow> = curve
                .iter()
                .map(|p| EnergyRow {
                    time: hours_to_time_string(p.hour_of_day),
                    awake: format!("{:.1}", p.hours_awake),
                    process_s: format!("{:.2}", p.process_s),
                    process_c: format!("{:.2}", p.process_c),
                    energy: format!("{:.0}", p.energy),
                })
                .collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!("  Energy right now: {:.0}", now.energy);
        }

        Commands::Config { init, show } => {
            if init {
                let path = cli.config.unwrap_or_else(AppConfig::default_config_path);
                AppConfig::init_at(&path).map_err(user_error)?;
                println!(
                    "{}",
                    format!("✓ Wrote default configuration to {}", path.display()).green()
                );
            }
            if show || !init {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

/// Configuration for this run
///
/// `config --init` starts from defaults and never reads the target file, so
/// `-c` may name a file that does not exist yet.
fn load_config(path: Option<&Path>, command: &Commands) -> Result<AppConfig> {
    if let Commands::Config { init: true, .. } = command {
        return Ok(AppConfig::default());
    }
    match path {
        Some(path) => AppConfig::load_from_file(path).map_err(user_error),
        None => Ok(AppConfig::load_or_default()),
    }
}

fn load_history(file: &Path, format: Option<&str>) -> Result<Vec<SleepVitalsEntry>> {
    let manager = ImportManager::new();
    let entries = match format {
        Some(format) => manager.import_file_as(file, format),
        None => manager.import_file(file),
    };
    entries
        .map_err(user_error)
        .with_context(|| format!("Failed to load sleep history: {}", file.display()))
}

/// Log a boundary error at its severity and turn it into a user-facing message
fn user_error(err: SleepRsError) -> anyhow::Error {
    match err.severity() {
        ErrorSeverity::Warning => tracing::warn!(error = %err, "Input problem"),
        ErrorSeverity::Error => tracing::error!(error = %err, "Operation failed"),
    }
    anyhow::anyhow!(err.user_message())
}

fn colored_confidence(confidence: Confidence) -> ColoredString {
    match confidence {
        Confidence::High => "high".green().bold(),
        Confidence::Medium => "medium".yellow(),
        Confidence::Low => "low".red(),
    }
}
