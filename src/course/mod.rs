//! Course data: the elevation trace and aid stations a plan is built on.
//!
//! A course is loaded once (from GPX or from pre-tagged points supplied by the
//! course-data service) and is read-only afterwards.

pub mod import;
pub mod terrain;

use serde::{Deserialize, Serialize};
use terrain::{CourseProfile, TerrainThresholds};
use thiserror::Error;

/// Meters in one statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Feet in one meter (the international foot is exactly 0.3048 m).
pub const FEET_PER_METER: f64 = 1.0 / 0.3048;

/// A single sample of the course elevation trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationPoint {
    /// Distance from the course start in miles
    pub mile: f64,
    /// Elevation in feet
    pub elevation_ft: f64,
    /// GPS latitude
    pub lat: f64,
    /// GPS longitude
    pub lon: f64,
    /// Grade of the span ending at this point (percent)
    #[serde(default)]
    pub gradient_pct: f64,
}

/// An aid station along the course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidStation {
    /// Display name
    pub name: String,
    /// Distance from the course start in miles
    pub mile: f64,
    /// Cutoff as elapsed minutes from the start, if the race enforces one
    #[serde(default)]
    pub cutoff_minutes: Option<f64>,
}

impl AidStation {
    /// Create an aid station without a cutoff.
    pub fn new(name: impl Into<String>, mile: f64) -> Self {
        Self {
            name: name.into(),
            mile,
            cutoff_minutes: None,
        }
    }

    /// Attach a cutoff time in minutes.
    pub fn with_cutoff(mut self, minutes: f64) -> Self {
        self.cutoff_minutes = Some(minutes);
        self
    }
}

/// Raw GPS sample before conversion to course units.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters
    pub elevation_m: Option<f64>,
}

/// Errors raised while building a course.
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("Course needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    #[error("Points are not in ascending mile order at index {index}")]
    Unordered { index: usize },

    #[error("{count} points have no elevation")]
    MissingElevation { count: usize },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// An imported course: ordered elevation trace plus aid stations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course name
    pub name: String,
    /// Elevation trace, ascending by mile
    pub points: Vec<ElevationPoint>,
    /// Aid stations, ascending by mile
    #[serde(default)]
    pub aid_stations: Vec<AidStation>,
}

impl Course {
    /// Build a course from already-tagged elevation points.
    pub fn from_points(
        name: impl Into<String>,
        points: Vec<ElevationPoint>,
        aid_stations: Vec<AidStation>,
    ) -> Result<Self, CourseError> {
        if points.len() < 2 {
            return Err(CourseError::TooFewPoints(points.len()));
        }

        if let Some(index) = points
            .windows(2)
            .position(|pair| pair[1].mile <= pair[0].mile)
        {
            return Err(CourseError::Unordered { index: index + 1 });
        }

        let mut aid_stations = aid_stations;
        aid_stations.sort_by(|a, b| a.mile.total_cmp(&b.mile));

        Ok(Self {
            name: name.into(),
            points,
            aid_stations,
        })
    }

    /// Build a course from raw GPS samples.
    ///
    /// Distances are accumulated with the haversine formula, elevations are
    /// converted to feet and every point is tagged with the grade of the span
    /// ending at it. Samples that do not advance along the course are dropped.
    pub fn from_track(
        name: impl Into<String>,
        track: &[TrackPoint],
        aid_stations: Vec<AidStation>,
    ) -> Result<Self, CourseError> {
        let missing = track.iter().filter(|p| p.elevation_m.is_none()).count();
        if missing > 0 {
            return Err(CourseError::MissingElevation { count: missing });
        }

        let mut points: Vec<ElevationPoint> = Vec::with_capacity(track.len());
        let mut cumulative_m = 0.0;

        for (i, sample) in track.iter().enumerate() {
            if i > 0 {
                let prev = &track[i - 1];
                let step = haversine_distance(
                    prev.latitude,
                    prev.longitude,
                    sample.latitude,
                    sample.longitude,
                );
                if step <= 0.0 {
                    continue;
                }
                cumulative_m += step;
            }

            points.push(ElevationPoint {
                mile: cumulative_m / METERS_PER_MILE,
                elevation_ft: sample.elevation_m.unwrap_or_default() * FEET_PER_METER,
                lat: sample.latitude,
                lon: sample.longitude,
                gradient_pct: 0.0,
            });
        }

        terrain::tag_gradients(&mut points);

        tracing::debug!(
            "Converted {} track samples into {} course points",
            track.len(),
            points.len()
        );

        Self::from_points(name, points, aid_stations)
    }

    /// Total course distance in miles.
    pub fn total_distance(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.mile)
    }

    /// Terrain profile of the course.
    ///
    /// GPS traces are classified from their elevations over great-circle
    /// distances. Traces without coordinates come pre-tagged: their spans are
    /// measured along the mile markers and classified by `gradient_pct`.
    pub fn profile(&self, thresholds: &TerrainThresholds) -> CourseProfile {
        let has_coordinates = self
            .points
            .windows(2)
            .any(|pair| pair[0].lat != pair[1].lat || pair[0].lon != pair[1].lon);

        if has_coordinates {
            CourseProfile::analyze(&self.points, thresholds, terrain::haversine_span)
        } else {
            CourseProfile::analyze_tagged(&self.points, thresholds, terrain::mile_span)
        }
    }

    /// Elevation at a mile marker, linearly interpolated between samples.
    pub fn elevation_at(&self, mile: f64) -> Option<f64> {
        if !mile.is_finite() {
            return None;
        }
        let first = self.points.first()?;
        let last = self.points.last()?;

        if mile <= first.mile {
            return Some(first.elevation_ft);
        }
        if mile >= last.mile {
            return Some(last.elevation_ft);
        }

        let idx = self.points.partition_point(|p| p.mile <= mile);
        let before = &self.points[idx - 1];
        let after = &self.points[idx];
        let span = after.mile - before.mile;
        if span <= 0.0 {
            return Some(before.elevation_ft);
        }

        let t = (mile - before.mile) / span;
        Some(before.elevation_ft + (after.elevation_ft - before.elevation_ft) * t)
    }
}

/// Calculate gradient between two points.
///
/// Both arguments must be in the same length unit.
pub fn calculate_gradient(elevation_change: f64, horizontal_distance: f64) -> f64 {
    if horizontal_distance <= 0.0 {
        return 0.0;
    }
    elevation_change / horizontal_distance * 100.0
}

/// Calculate horizontal distance between two GPS points (Haversine formula)
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS: f64 = 6_371_000.0; // meters

    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS * c
}
