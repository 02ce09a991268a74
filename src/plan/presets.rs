//! Effort presets.
//!
//! A preset overwrites every segment's effort: segments whose mean grade is
//! climbing get the preset's climb effort, all others its default effort.

use super::segment::Segment;
use crate::course::terrain::{mean_gradient, TerrainThresholds};
use crate::course::ElevationPoint;
use crate::power::EffortLevel;
use serde::{Deserialize, Serialize};

/// Named pacing strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortPreset {
    Conservative,
    Tempo,
    Aggressive,
}

impl EffortPreset {
    pub const ALL: [EffortPreset; 3] = [
        EffortPreset::Conservative,
        EffortPreset::Tempo,
        EffortPreset::Aggressive,
    ];

    /// `(default_effort, climb_effort)` for this preset.
    pub fn efforts(&self) -> (EffortLevel, EffortLevel) {
        match self {
            EffortPreset::Conservative => (EffortLevel::Safe, EffortLevel::Tempo),
            EffortPreset::Tempo => (EffortLevel::Tempo, EffortLevel::Tempo),
            EffortPreset::Aggressive => (EffortLevel::Tempo, EffortLevel::Pushing),
        }
    }
}

impl std::fmt::Display for EffortPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffortPreset::Conservative => write!(f, "Conservative"),
            EffortPreset::Tempo => write!(f, "Tempo"),
            EffortPreset::Aggressive => write!(f, "Aggressive"),
        }
    }
}

impl std::str::FromStr for EffortPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conservative" => Ok(EffortPreset::Conservative),
            "tempo" => Ok(EffortPreset::Tempo),
            "aggressive" => Ok(EffortPreset::Aggressive),
            other => Err(format!("Unknown preset: {}", other)),
        }
    }
}

/// Overwrite the effort of every segment according to the preset.
///
/// Returns the number of segments assigned the climb effort.
pub fn apply_preset(
    preset: EffortPreset,
    segments: &mut [Segment],
    points: &[ElevationPoint],
    thresholds: &TerrainThresholds,
) -> usize {
    let (default_effort, climb_effort) = preset.efforts();
    let mut climbs = 0;

    for segment in segments.iter_mut() {
        let is_climb = mean_gradient(points, segment.start_mile, segment.end_mile)
            .is_some_and(|grade| grade >= thresholds.climbing_pct);

        segment.effort_level = if is_climb {
            climbs += 1;
            climb_effort
        } else {
            default_effort
        };
    }

    climbs
}
