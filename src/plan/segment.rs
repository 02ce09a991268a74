//! Pacing segments and the partition invariant.
//!
//! A valid segment list covers `[0, total_distance]` exactly: sorted by
//! `order` with no gaps in the numbering, the first segment starts at 0, the
//! last ends at the total distance, each segment starts exactly where the
//! previous one ends and every segment has positive width.

use crate::power::EffortLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A contiguous mile range of the course with one effort level and target time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique identifier
    pub id: Uuid,
    /// Position in the plan (0-based)
    pub order: u32,
    pub start_mile: f64,
    pub end_mile: f64,
    /// Label of the start boundary (e.g. an aid station)
    pub start_name: String,
    /// Label of the end boundary
    pub end_name: String,
    pub effort_level: EffortLevel,
    pub target_time_minutes: f64,
    /// Lower bound of the power band in watts
    pub power_target_low: u16,
    /// Upper bound of the power band in watts
    pub power_target_high: u16,
}

impl Segment {
    /// Create a new segment with a fresh id, safe effort and no target time.
    pub fn new(
        order: u32,
        start_mile: f64,
        end_mile: f64,
        start_name: impl Into<String>,
        end_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            start_mile,
            end_mile,
            start_name: start_name.into(),
            end_name: end_name.into(),
            effort_level: EffortLevel::default(),
            target_time_minutes: 0.0,
            power_target_low: 0,
            power_target_high: 0,
        }
    }

    /// Segment length in miles.
    pub fn width(&self) -> f64 {
        self.end_mile - self.start_mile
    }

    /// Required pace in minutes per mile, if a target time is set.
    pub fn pace_min_per_mile(&self) -> Option<f64> {
        let width = self.width();
        (self.target_time_minutes > 0.0 && width > 0.0).then(|| self.target_time_minutes / width)
    }
}

/// Ways a segment list can break the partition invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    #[error("Plan has no segments")]
    Empty,

    #[error("Segment at position {index} has order {order}")]
    OrderMismatch { index: usize, order: u32 },

    #[error("First segment starts at mile {0}, expected 0")]
    StartNotZero(f64),

    #[error("Last segment ends at mile {actual}, expected {expected}")]
    EndMismatch { expected: f64, actual: f64 },

    #[error("Segment {index} ends at mile {end} but the next starts at {next_start}")]
    Discontinuous {
        index: usize,
        end: f64,
        next_start: f64,
    },

    #[error("Segment {index} has non-positive width {width}")]
    NonPositiveWidth { index: usize, width: f64 },
}

/// Check a segment list against the partition invariant.
///
/// The list must already be sorted by `order`.
pub fn validate_partition(segments: &[Segment], total_distance: f64) -> Result<(), PartitionError> {
    let first = segments.first().ok_or(PartitionError::Empty)?;
    let last = segments.last().ok_or(PartitionError::Empty)?;

    if first.start_mile != 0.0 {
        return Err(PartitionError::StartNotZero(first.start_mile));
    }

    if last.end_mile != total_distance {
        return Err(PartitionError::EndMismatch {
            expected: total_distance,
            actual: last.end_mile,
        });
    }

    for (index, segment) in segments.iter().enumerate() {
        if segment.order as usize != index {
            return Err(PartitionError::OrderMismatch {
                index,
                order: segment.order,
            });
        }

        // Written as a negated comparison so NaN widths are caught too
        let width = segment.width();
        if !(width > 0.0) {
            return Err(PartitionError::NonPositiveWidth { index, width });
        }
    }

    for (index, pair) in segments.windows(2).enumerate() {
        if pair[1].start_mile != pair[0].end_mile {
            return Err(PartitionError::Discontinuous {
                index,
                end: pair[0].end_mile,
                next_start: pair[1].start_mile,
            });
        }
    }

    Ok(())
}

/// Renumber `order` to match list position.
pub fn renumber(segments: &mut [Segment]) {
    for (index, segment) in segments.iter_mut().enumerate() {
        segment.order = index as u32;
    }
}

/// Position of a segment by id.
pub fn position_of(segments: &[Segment], id: Uuid) -> Option<usize> {
    segments.iter().position(|s| s.id == id)
}

/// Sum of all target times in minutes.
pub fn total_target_minutes(segments: &[Segment]) -> f64 {
    segments.iter().map(|s| s.target_time_minutes).sum()
}
