//! RustPace - Race Pacing & Segment Planning
//!
//! Turns a course elevation trace and an athlete's FTP into a pacing plan:
//! terrain classification, altitude-adjusted power targets, an editable
//! partition of the course into segments, and a checkpoint export for
//! external devices.

pub mod course;
pub mod export;
pub mod plan;
pub mod power;
pub mod storage;

// Re-export commonly used types
pub use course::terrain::{CourseProfile, TerrainClass};
pub use course::{AidStation, Course, ElevationPoint};
pub use export::{Checkpoint, DeviceExport};
pub use plan::{EffortPreset, PlannerCommand, Segment, SegmentPlanner};
pub use power::{EffortLevel, PowerInputs, PowerTargetTable};
pub use storage::config::AthleteProfile;
