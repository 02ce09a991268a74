//! Terrain classification of a course elevation trace.
//!
//! Every span between consecutive points gets a grade and a terrain class.
//! Span distances are weighted into three buckets (climbing, flat, descent)
//! to build the aggregate [`CourseProfile`].

use super::{calculate_gradient, haversine_distance, ElevationPoint, FEET_PER_METER, METERS_PER_MILE};
use serde::{Deserialize, Serialize};

/// Terrain class of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainClass {
    Climbing,
    Flat,
    Descent,
}

impl TerrainClass {
    /// Classify a grade with the default thresholds (+2% / -2%).
    pub fn from_grade(gradient_pct: f64) -> Self {
        TerrainThresholds::default().classify(gradient_pct)
    }
}

impl std::fmt::Display for TerrainClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerrainClass::Climbing => write!(f, "Climbing"),
            TerrainClass::Flat => write!(f, "Flat"),
            TerrainClass::Descent => write!(f, "Descent"),
        }
    }
}

/// Floating-point slack when comparing a grade to a threshold, in percent.
pub const GRADE_TOLERANCE: f64 = 1e-9;

/// Grade thresholds used for classification.
///
/// The steep thresholds are informational and never change the class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainThresholds {
    /// Grades at or above this are climbing
    pub climbing_pct: f64,
    /// Grades at or below this are descent
    pub descent_pct: f64,
    /// Climbs at or above this are flagged steep
    pub steep_climb_pct: f64,
    /// Descents at or below this are flagged steep
    pub steep_descent_pct: f64,
}

impl Default for TerrainThresholds {
    fn default() -> Self {
        Self {
            climbing_pct: 2.0,
            descent_pct: -2.0,
            steep_climb_pct: 8.0,
            steep_descent_pct: -8.0,
        }
    }
}

impl TerrainThresholds {
    /// Classify a grade. Boundaries are inclusive on the climbing and descent side.
    ///
    /// Grades within [`GRADE_TOLERANCE`] of a threshold count as on it, so a
    /// computed 1.9999999999998 % is climbing just like an exact 2 %.
    pub fn classify(&self, gradient_pct: f64) -> TerrainClass {
        if gradient_pct >= self.climbing_pct - GRADE_TOLERANCE {
            TerrainClass::Climbing
        } else if gradient_pct <= self.descent_pct + GRADE_TOLERANCE {
            TerrainClass::Descent
        } else {
            TerrainClass::Flat
        }
    }

    /// Whether a grade is past one of the steep thresholds.
    pub fn is_steep(&self, gradient_pct: f64) -> bool {
        gradient_pct >= self.steep_climb_pct - GRADE_TOLERANCE
            || gradient_pct <= self.steep_descent_pct + GRADE_TOLERANCE
    }
}

/// One classified span between two consecutive points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainSpan {
    pub start_mile: f64,
    pub end_mile: f64,
    /// Horizontal distance in meters
    pub distance_m: f64,
    pub gradient_pct: f64,
    pub class: TerrainClass,
    pub steep: bool,
}

/// Horizontal distance between two points, great-circle over their coordinates.
pub fn haversine_span(a: &ElevationPoint, b: &ElevationPoint) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Horizontal distance between two points taken from their mile markers.
///
/// Useful for traces supplied without coordinates.
pub fn mile_span(a: &ElevationPoint, b: &ElevationPoint) -> f64 {
    (b.mile - a.mile).max(0.0) * METERS_PER_MILE
}

/// Grade of a span from its elevation change, computed in feet.
fn elevation_grade(a: &ElevationPoint, b: &ElevationPoint, distance_m: f64) -> f64 {
    calculate_gradient(b.elevation_ft - a.elevation_ft, distance_m * FEET_PER_METER)
}

/// Classify every span of a trace from its elevation change.
/// Zero-distance spans are skipped.
pub fn classify_spans<F>(
    points: &[ElevationPoint],
    thresholds: &TerrainThresholds,
    distance: F,
) -> Vec<TerrainSpan>
where
    F: Fn(&ElevationPoint, &ElevationPoint) -> f64,
{
    classify_with(points, thresholds, distance, elevation_grade)
}

/// Classify every span of a pre-tagged trace.
///
/// A span takes the `gradient_pct` of the point it ends at, the same
/// convention [`tag_gradients`] writes.
pub fn classify_tagged_spans<F>(
    points: &[ElevationPoint],
    thresholds: &TerrainThresholds,
    distance: F,
) -> Vec<TerrainSpan>
where
    F: Fn(&ElevationPoint, &ElevationPoint) -> f64,
{
    classify_with(points, thresholds, distance, |_, b, _| b.gradient_pct)
}

fn classify_with<F, G>(
    points: &[ElevationPoint],
    thresholds: &TerrainThresholds,
    distance: F,
    grade: G,
) -> Vec<TerrainSpan>
where
    F: Fn(&ElevationPoint, &ElevationPoint) -> f64,
    G: Fn(&ElevationPoint, &ElevationPoint, f64) -> f64,
{
    points
        .windows(2)
        .filter_map(|pair| {
            let (a, b) = (&pair[0], &pair[1]);
            let distance_m = distance(a, b);
            if distance_m <= 0.0 {
                return None;
            }

            let gradient_pct = grade(a, b, distance_m);

            Some(TerrainSpan {
                start_mile: a.mile,
                end_mile: b.mile,
                distance_m,
                gradient_pct,
                class: thresholds.classify(gradient_pct),
                steep: thresholds.is_steep(gradient_pct),
            })
        })
        .collect()
}

/// Tag each point with the grade of the span ending at it.
///
/// The first point copies the grade of the first span.
pub fn tag_gradients(points: &mut [ElevationPoint]) {
    if points.len() < 2 {
        return;
    }

    for i in 1..points.len() {
        let distance_m = haversine_span(&points[i - 1], &points[i]);
        let distance_m = if distance_m > 0.0 {
            distance_m
        } else {
            mile_span(&points[i - 1], &points[i])
        };
        let grade = elevation_grade(&points[i - 1], &points[i], distance_m);
        points[i].gradient_pct = grade;
    }

    points[0].gradient_pct = points[1].gradient_pct;
}

/// Mean `gradient_pct` of the points inside `[start_mile, end_mile]`.
///
/// Returns `None` when no point falls inside the window.
pub fn mean_gradient(points: &[ElevationPoint], start_mile: f64, end_mile: f64) -> Option<f64> {
    let (sum, count) = points
        .iter()
        .filter(|p| p.mile >= start_mile && p.mile <= end_mile)
        .fold((0.0, 0usize), |(sum, count), p| (sum + p.gradient_pct, count + 1));

    (count > 0).then(|| sum / count as f64)
}

/// Aggregate terrain mix of a course.
///
/// Percentages are rounded independently, so they can sum to 99 or 101.
/// An all-zero profile means the trace had no usable terrain data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CourseProfile {
    pub climbing_pct: u8,
    pub flat_pct: u8,
    pub descent_pct: u8,
    /// Mean grade of climbing spans (percent)
    pub avg_climb_grade: f64,
    /// Mean grade of descent spans (percent, negative)
    pub avg_descent_grade: f64,
    pub elevation_gain_ft: f64,
    pub elevation_loss_ft: f64,
}

impl CourseProfile {
    /// Profile a trace with default thresholds and great-circle span distances.
    pub fn from_points(points: &[ElevationPoint]) -> Self {
        Self::analyze(points, &TerrainThresholds::default(), haversine_span)
    }

    /// Profile a trace with explicit thresholds and span distance function.
    pub fn analyze<F>(points: &[ElevationPoint], thresholds: &TerrainThresholds, distance: F) -> Self
    where
        F: Fn(&ElevationPoint, &ElevationPoint) -> f64,
    {
        if points.len() < 2 {
            return Self::default();
        }

        Self::from_spans(points, &classify_spans(points, thresholds, distance))
    }

    /// Profile a pre-tagged trace, classifying spans by their stored `gradient_pct`.
    pub fn analyze_tagged<F>(
        points: &[ElevationPoint],
        thresholds: &TerrainThresholds,
        distance: F,
    ) -> Self
    where
        F: Fn(&ElevationPoint, &ElevationPoint) -> f64,
    {
        if points.len() < 2 {
            return Self::default();
        }

        Self::from_spans(points, &classify_tagged_spans(points, thresholds, distance))
    }

    fn from_spans(points: &[ElevationPoint], spans: &[TerrainSpan]) -> Self {
        let mut climbing_m = 0.0;
        let mut flat_m = 0.0;
        let mut descent_m = 0.0;
        let mut climb_grade_sum = 0.0;
        let mut climb_count = 0usize;
        let mut descent_grade_sum = 0.0;
        let mut descent_count = 0usize;

        for span in spans {
            match span.class {
                TerrainClass::Climbing => {
                    climbing_m += span.distance_m;
                    climb_grade_sum += span.gradient_pct;
                    climb_count += 1;
                }
                TerrainClass::Flat => flat_m += span.distance_m,
                TerrainClass::Descent => {
                    descent_m += span.distance_m;
                    descent_grade_sum += span.gradient_pct;
                    descent_count += 1;
                }
            }
        }

        let total_m = climbing_m + flat_m + descent_m;
        if total_m <= 0.0 {
            tracing::warn!("Trace of {} points has no horizontal distance", points.len());
            return Self::default();
        }

        let (gain, loss) = points.windows(2).fold((0.0, 0.0), |(gain, loss), pair| {
            let delta = pair[1].elevation_ft - pair[0].elevation_ft;
            if delta > 0.0 {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        });

        let profile = Self {
            climbing_pct: percent_of(climbing_m, total_m),
            flat_pct: percent_of(flat_m, total_m),
            descent_pct: percent_of(descent_m, total_m),
            avg_climb_grade: mean(climb_grade_sum, climb_count),
            avg_descent_grade: mean(descent_grade_sum, descent_count),
            elevation_gain_ft: gain,
            elevation_loss_ft: loss,
        };

        tracing::debug!(
            "Course profile: {}% climbing, {}% flat, {}% descent over {} spans",
            profile.climbing_pct,
            profile.flat_pct,
            profile.descent_pct,
            spans.len()
        );

        profile
    }

    /// Whether this profile carries no terrain data.
    pub fn is_empty(&self) -> bool {
        self.climbing_pct == 0 && self.flat_pct == 0 && self.descent_pct == 0
    }

    /// Sum of the three rounded percentages (may differ from 100 by rounding).
    pub fn percent_total(&self) -> u16 {
        self.climbing_pct as u16 + self.flat_pct as u16 + self.descent_pct as u16
    }
}

fn percent_of(part: f64, total: f64) -> u8 {
    (part / total * 100.0).round().clamp(0.0, 100.0) as u8
}

fn mean(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
