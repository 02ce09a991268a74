//! Power targets derived from FTP.
//!
//! The calculator is a pure function of FTP, the race altitude adjustment
//! and the per-effort intensity factors. Inputs are validated by
//! [`PowerInputs::validate`] before the table is built.

pub mod targets;

pub use targets::{PowerTargetTable, TerrainMultipliers};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest accepted FTP in watts.
pub const MAX_FTP_WATTS: f64 = 2000.0;

/// Largest fraction by which FTP may be reduced for altitude.
pub const MAX_ALTITUDE_ADJUSTMENT: f64 = 0.5;

/// Largest accepted intensity factor.
pub const MAX_INTENSITY_FACTOR: f64 = 1.5;

/// Target intensity for a stretch of the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortLevel {
    #[default]
    Safe,
    Tempo,
    Pushing,
}

impl EffortLevel {
    /// All effort levels in increasing intensity.
    pub const ALL: [EffortLevel; 3] = [EffortLevel::Safe, EffortLevel::Tempo, EffortLevel::Pushing];

    /// Lowercase label used in exports.
    pub fn label(&self) -> &'static str {
        match self {
            EffortLevel::Safe => "safe",
            EffortLevel::Tempo => "tempo",
            EffortLevel::Pushing => "pushing",
        }
    }
}

impl std::fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffortLevel::Safe => write!(f, "Safe"),
            EffortLevel::Tempo => write!(f, "Tempo"),
            EffortLevel::Pushing => write!(f, "Pushing"),
        }
    }
}

impl std::str::FromStr for EffortLevel {
    type Err = PowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Ok(EffortLevel::Safe),
            "tempo" => Ok(EffortLevel::Tempo),
            "pushing" => Ok(EffortLevel::Pushing),
            other => Err(PowerError::UnknownEffort(other.to_string())),
        }
    }
}

/// One value per effort level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerEffort {
    pub safe: f64,
    pub tempo: f64,
    pub pushing: f64,
}

impl PerEffort {
    pub fn new(safe: f64, tempo: f64, pushing: f64) -> Self {
        Self {
            safe,
            tempo,
            pushing,
        }
    }

    /// Value for an effort level.
    pub fn get(&self, effort: EffortLevel) -> f64 {
        match effort {
            EffortLevel::Safe => self.safe,
            EffortLevel::Tempo => self.tempo,
            EffortLevel::Pushing => self.pushing,
        }
    }

    /// Apply `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            safe: f(self.safe),
            tempo: f(self.tempo),
            pushing: f(self.pushing),
        }
    }
}

/// Fraction of adjusted FTP held at each effort level.
pub type IntensityFactors = PerEffort;

/// Default intensity factors for a long endurance event.
pub fn default_intensity_factors() -> IntensityFactors {
    PerEffort::new(0.67, 0.70, 0.73)
}

/// Errors from power input validation.
#[derive(Debug, Error, PartialEq)]
pub enum PowerError {
    #[error("FTP must be positive, got {0}")]
    NonPositiveFtp(f64),

    #[error("FTP must be at most {max} W, got {value}")]
    FtpTooHigh { value: f64, max: f64 },

    #[error("Altitude adjustment must be between 0 and {max}, got {value}")]
    AltitudeOutOfRange { value: f64, max: f64 },

    #[error("Intensity factor for {effort} must be in (0, {max}], got {value}")]
    IntensityOutOfRange {
        effort: EffortLevel,
        value: f64,
        max: f64,
    },

    #[error("Unknown effort level: {0}")]
    UnknownEffort(String),
}

/// Athlete inputs for the power calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerInputs {
    pub ftp_watts: f64,
    pub altitude_adjustment_factor: f64,
    pub intensity_factors: IntensityFactors,
}

impl PowerInputs {
    /// Check all inputs are in range.
    pub fn validate(&self) -> Result<(), PowerError> {
        if !self.ftp_watts.is_finite() || self.ftp_watts <= 0.0 {
            return Err(PowerError::NonPositiveFtp(self.ftp_watts));
        }
        if self.ftp_watts > MAX_FTP_WATTS {
            return Err(PowerError::FtpTooHigh {
                value: self.ftp_watts,
                max: MAX_FTP_WATTS,
            });
        }

        if !(0.0..=MAX_ALTITUDE_ADJUSTMENT).contains(&self.altitude_adjustment_factor) {
            return Err(PowerError::AltitudeOutOfRange {
                value: self.altitude_adjustment_factor,
                max: MAX_ALTITUDE_ADJUSTMENT,
            });
        }

        for effort in EffortLevel::ALL {
            let value = self.intensity_factors.get(effort);
            if !value.is_finite() || value <= 0.0 || value > MAX_INTENSITY_FACTOR {
                return Err(PowerError::IntensityOutOfRange {
                    effort,
                    value,
                    max: MAX_INTENSITY_FACTOR,
                });
            }
        }

        Ok(())
    }

    /// Validate, then build the power target table with the default multipliers.
    pub fn power_targets(&self) -> Result<PowerTargetTable, PowerError> {
        self.validate()?;
        Ok(PowerTargetTable::calculate(
            self.ftp_watts,
            self.altitude_adjustment_factor,
            &self.intensity_factors,
        ))
    }
}
