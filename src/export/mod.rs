//! Checkpoint export for external devices.
//!
//! Segments are walked in order and every segment end becomes a checkpoint
//! carrying the cumulative target time. No checkpoint is emitted for the
//! course start.

pub mod csv;

pub use self::csv::export_csv;

use crate::course::AidStation;
use crate::plan::{Segment, SegmentPlanner};
use crate::power::{EffortLevel, PowerTargetTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Distance within which a checkpoint is matched to an aid station, in miles.
const AID_STATION_MATCH_MILES: f64 = 1e-6;

/// One exported waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    /// Distance marker in miles
    pub mile: f64,
    /// Cumulative target time from the start
    pub target_minutes: f64,
    /// Effort of the segment ending here
    pub effort: EffortLevel,
    /// Cutoff of the aid station at this checkpoint, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_minutes: Option<f64>,
}

impl Checkpoint {
    /// Whether the planned arrival is later than the cutoff.
    pub fn misses_cutoff(&self) -> bool {
        self.cutoff_minutes
            .is_some_and(|cutoff| self.target_minutes > cutoff)
    }
}

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// No segments to export
    #[error("Plan has no segments to export")]
    NoData,

    #[error("Serialization failed: {0}")]
    SerializeFailed(#[from] serde_json::Error),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Project an ordered segment list onto cumulative-time checkpoints.
pub fn export_checkpoints(segments: &[Segment], aid_stations: &[AidStation]) -> Vec<Checkpoint> {
    let mut cumulative = 0.0;

    segments
        .iter()
        .map(|segment| {
            cumulative += segment.target_time_minutes;
            let cutoff_minutes = aid_stations
                .iter()
                .find(|station| (station.mile - segment.end_mile).abs() < AID_STATION_MATCH_MILES)
                .and_then(|station| station.cutoff_minutes);

            Checkpoint {
                name: segment.end_name.clone(),
                mile: segment.end_mile,
                target_minutes: cumulative,
                effort: segment.effort_level,
                cutoff_minutes,
            }
        })
        .collect()
}

/// Athlete fields carried through to the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteSummary {
    pub name: String,
    pub ftp_watts: f64,
    /// Not used by the planner, passed through for the device
    pub weight_kg: f64,
}

/// Flat document handed to the device-sync service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceExport {
    pub course_name: String,
    pub total_miles: f64,
    pub generated_at: DateTime<Utc>,
    pub athlete: AthleteSummary,
    pub checkpoints: Vec<Checkpoint>,
    pub power_targets: PowerTargetTable,
}

impl DeviceExport {
    /// Build the export document from the planner's committed segments.
    pub fn from_planner(
        planner: &SegmentPlanner,
        athlete: AthleteSummary,
    ) -> Result<Self, ExportError> {
        if planner.segments().is_empty() {
            return Err(ExportError::NoData);
        }

        let course = planner.course();
        let checkpoints = export_checkpoints(planner.segments(), &course.aid_stations);

        let late: Vec<&str> = checkpoints
            .iter()
            .filter(|c| c.misses_cutoff())
            .map(|c| c.name.as_str())
            .collect();
        if !late.is_empty() {
            tracing::warn!("Plan misses cutoffs at: {}", late.join(", "));
        }

        tracing::info!(
            "Exported {} checkpoints for '{}'",
            checkpoints.len(),
            course.name
        );

        Ok(Self {
            course_name: course.name.clone(),
            total_miles: course.total_distance(),
            generated_at: Utc::now(),
            athlete,
            checkpoints,
            power_targets: *planner.power_targets(),
        })
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total planned time in minutes.
    pub fn total_minutes(&self) -> f64 {
        self.checkpoints.last().map_or(0.0, |c| c.target_minutes)
    }
}
