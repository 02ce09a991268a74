//! Saved plans.
//!
//! A snapshot holds the committed segments and the course profile exactly as
//! they were; restoring it yields the same plan. The drag preview is never
//! part of a snapshot.

use crate::course::terrain::CourseProfile;
use crate::course::Course;
use crate::plan::{PlannerError, PlannerSettings, Segment, SegmentPlanner};
use crate::power::PowerInputs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot covers {saved} mi but the course is {course} mi")]
    DistanceMismatch { saved: f64, course: f64 },

    #[error(transparent)]
    Planner(#[from] PlannerError),
}

/// A plan as handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    pub version: u32,
    pub course_name: String,
    pub total_distance: f64,
    pub saved_at: DateTime<Utc>,
    pub profile: CourseProfile,
    pub segments: Vec<Segment>,
}

impl PlanSnapshot {
    /// Capture the committed state of a planner.
    pub fn capture(planner: &SegmentPlanner) -> Self {
        let course = planner.course();

        Self {
            version: SNAPSHOT_VERSION,
            course_name: course.name.clone(),
            total_distance: planner.state().total_distance(),
            saved_at: Utc::now(),
            profile: course.profile(&planner.settings().thresholds),
            segments: planner.segments().to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot)
    }

    /// Rebuild a planner from this snapshot for the given course.
    pub fn restore(
        self,
        course: Course,
        inputs: &PowerInputs,
        settings: PlannerSettings,
    ) -> Result<SegmentPlanner, SnapshotError> {
        let course_distance = course.total_distance();
        if course_distance != self.total_distance {
            return Err(SnapshotError::DistanceMismatch {
                saved: self.total_distance,
                course: course_distance,
            });
        }

        let planner = SegmentPlanner::with_segments(course, inputs, settings, self.segments)?;
        tracing::info!(
            "Restored plan for '{}' with {} segments",
            self.course_name,
            planner.segments().len()
        );
        Ok(planner)
    }
}
