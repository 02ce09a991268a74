//! Power target table per effort level and terrain.

use super::{EffortLevel, IntensityFactors, PerEffort};
use crate::course::terrain::TerrainClass;
use serde::{Deserialize, Serialize};

/// Multipliers applied to normalized power on each terrain class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainMultipliers {
    pub climbing: f64,
    pub flat: f64,
    pub descent: f64,
}

impl Default for TerrainMultipliers {
    fn default() -> Self {
        Self {
            climbing: 1.20,
            flat: 0.90,
            descent: 0.40,
        }
    }
}

impl TerrainMultipliers {
    pub fn get(&self, terrain: TerrainClass) -> f64 {
        match terrain {
            TerrainClass::Climbing => self.climbing,
            TerrainClass::Flat => self.flat,
            TerrainClass::Descent => self.descent,
        }
    }
}

/// Power targets in watts for every effort level and terrain class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerTargetTable {
    pub base_ftp: f64,
    /// FTP after the altitude reduction
    pub adjusted_ftp: f64,
    pub normalized_power: PerEffort,
    pub climbing_power: PerEffort,
    pub flat_power: PerEffort,
    pub descent_power: PerEffort,
}

impl PowerTargetTable {
    /// Build the table with the default terrain multipliers.
    ///
    /// Inputs are expected to be validated already.
    pub fn calculate(
        ftp_watts: f64,
        altitude_adjustment_factor: f64,
        intensity_factors: &IntensityFactors,
    ) -> Self {
        Self::calculate_with(
            ftp_watts,
            altitude_adjustment_factor,
            intensity_factors,
            &TerrainMultipliers::default(),
        )
    }

    /// Build the table with explicit terrain multipliers.
    pub fn calculate_with(
        ftp_watts: f64,
        altitude_adjustment_factor: f64,
        intensity_factors: &IntensityFactors,
        multipliers: &TerrainMultipliers,
    ) -> Self {
        let adjusted_ftp = ftp_watts * (1.0 - altitude_adjustment_factor);
        let normalized_power = intensity_factors.map(|factor| adjusted_ftp * factor);

        Self {
            base_ftp: ftp_watts,
            adjusted_ftp,
            normalized_power,
            climbing_power: normalized_power.map(|np| np * multipliers.climbing),
            flat_power: normalized_power.map(|np| np * multipliers.flat),
            descent_power: normalized_power.map(|np| np * multipliers.descent),
        }
    }

    /// Target watts for a terrain class at an effort level.
    pub fn for_terrain(&self, terrain: TerrainClass, effort: EffortLevel) -> f64 {
        match terrain {
            TerrainClass::Climbing => self.climbing_power.get(effort),
            TerrainClass::Flat => self.flat_power.get(effort),
            TerrainClass::Descent => self.descent_power.get(effort),
        }
    }

    /// Rounded `(low, high)` watt band around the terrain target, clamped to
    /// the `u16` range.
    pub fn band(&self, terrain: TerrainClass, effort: EffortLevel, half_width: f64) -> (u16, u16) {
        let target = self.for_terrain(terrain, effort);
        let watts = |w: f64| w.round().clamp(0.0, u16::MAX as f64) as u16;
        (watts(target * (1.0 - half_width)), watts(target * (1.0 + half_width)))
    }
}
