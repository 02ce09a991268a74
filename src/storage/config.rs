//! Athlete profile and application configuration.
//!
//! Configuration is loaded once and passed explicitly to the planner and the
//! power calculator; nothing here is cached globally.

use crate::plan::PlannerSettings;
use crate::power::{default_intensity_factors, IntensityFactors, PowerInputs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Kilometers in one mile.
const KM_PER_MILE: f64 = 1.609_344;

/// Unit system preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric units (kg, km)
    Metric,
    /// Imperial units (lbs, miles)
    #[default]
    Imperial,
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Units::Metric => write!(f, "Metric"),
            Units::Imperial => write!(f, "Imperial"),
        }
    }
}

/// Athlete profile with the physiological inputs for pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Unique identifier
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Functional Threshold Power in watts (50-600)
    pub ftp: u16,
    /// Weight in kilograms
    pub weight_kg: f32,
    /// Fraction of FTP lost at race altitude (0.0-0.5)
    pub altitude_adjustment_factor: f64,
    /// Unit preference
    pub units: Units,
    /// Profile creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Fraction of adjusted FTP per effort level
    pub intensity_factors: IntensityFactors,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            name: "Athlete".to_string(),
            ftp: 200,
            weight_kg: 75.0,
            altitude_adjustment_factor: 0.0,
            units: Units::Imperial,
            created_at: now,
            updated_at: now,
            intensity_factors: default_intensity_factors(),
        }
    }
}

impl AthleteProfile {
    /// Create a new athlete profile with the given name.
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Update FTP.
    pub fn set_ftp(&mut self, ftp: u16) -> Result<(), &'static str> {
        if !Self::validate_ftp(ftp) {
            return Err("FTP must be between 50 and 600 watts");
        }

        self.ftp = ftp;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Update the altitude adjustment for the target race.
    pub fn set_altitude_adjustment(&mut self, factor: f64) -> Result<(), &'static str> {
        if !(0.0..=crate::power::MAX_ALTITUDE_ADJUSTMENT).contains(&factor) {
            return Err("Altitude adjustment must be between 0.0 and 0.5");
        }

        self.altitude_adjustment_factor = factor;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Validate FTP value (50-600 watts).
    pub fn validate_ftp(ftp: u16) -> bool {
        (50..=600).contains(&ftp)
    }

    /// Inputs for the power calculator.
    pub fn power_inputs(&self) -> PowerInputs {
        PowerInputs {
            ftp_watts: self.ftp as f64,
            altitude_adjustment_factor: self.altitude_adjustment_factor,
            intensity_factors: self.intensity_factors,
        }
    }

    /// Convert a course distance in miles to the user's preferred units.
    pub fn convert_distance(&self, distance_miles: f64) -> (f64, &'static str) {
        match self.units {
            Units::Metric => (distance_miles * KM_PER_MILE, "km"),
            Units::Imperial => (distance_miles, "mi"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Athlete inputs
    pub athlete: AthleteProfile,
    /// Planner tunables
    #[serde(default)]
    pub planner: PlannerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            athlete: AthleteProfile::default(),
            planner: PlannerSettings::default(),
        }
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "rustpace", "RustPace")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&get_config_path())
}

/// Load application configuration from a file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(get_data_dir);

    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    tracing::info!("Saved config to {}", path.display());
    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
