//! Pacing plan: segments, presets and the interactive planner.

pub mod planner;
pub mod presets;
pub mod segment;

pub use planner::{
    reduce, CommandOutcome, DragState, Edge, PlanState, PlannerCommand, PlannerContext,
    PlannerError, RejectReason, SegmentPlanner,
};
pub use presets::EffortPreset;
pub use segment::{validate_partition, PartitionError, Segment};

use crate::course::terrain::TerrainThresholds;
use crate::power::TerrainMultipliers;
use serde::{Deserialize, Serialize};

/// Tunables for the planner, passed explicitly with every command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Half-width of a segment's power band as a fraction of its target
    pub power_band_half_width: f64,
    /// Narrowest segment a drag or split may leave behind, in miles
    pub min_segment_width_miles: f64,
    /// Grade thresholds for terrain classification
    pub thresholds: TerrainThresholds,
    /// Power multipliers per terrain class
    pub multipliers: TerrainMultipliers,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            power_band_half_width: 0.05,
            min_segment_width_miles: 0.01,
            thresholds: TerrainThresholds::default(),
            multipliers: TerrainMultipliers::default(),
        }
    }
}
