//! Course import from GPX files or pre-tagged JSON traces.

use super::{AidStation, Course, CourseError, ElevationPoint, TrackPoint};
use std::path::Path;

/// Supported course file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Gpx,
    /// A JSON array of [`ElevationPoint`]s
    Json,
}

/// Detect file format from extension
pub fn detect_format(path: &Path) -> Result<FileFormat, CourseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| CourseError::ParseError("No file extension".to_string()))?;

    match ext.as_str() {
        "gpx" => Ok(FileFormat::Gpx),
        "json" => Ok(FileFormat::Json),
        _ => Err(CourseError::ParseError(format!(
            "Unsupported format: {}",
            ext
        ))),
    }
}

/// Parse GPX file content to track points
pub fn parse_gpx(content: &[u8]) -> Result<Vec<TrackPoint>, CourseError> {
    let gpx_data: gpx::Gpx = gpx::read(content)
        .map_err(|e| CourseError::ParseError(format!("GPX parse error: {}", e)))?;

    let to_track_point = |point: &gpx::Waypoint| TrackPoint {
        latitude: point.point().y(),
        longitude: point.point().x(),
        elevation_m: point.elevation,
    };

    let mut points: Vec<TrackPoint> = gpx_data
        .tracks
        .iter()
        .flat_map(|track| track.segments.iter())
        .flat_map(|segment| segment.points.iter())
        .map(to_track_point)
        .collect();

    // If no tracks, try routes
    if points.is_empty() {
        points = gpx_data
            .routes
            .iter()
            .flat_map(|route| route.points.iter())
            .map(to_track_point)
            .collect();
    }

    // If still empty, try waypoints
    if points.is_empty() {
        points = gpx_data.waypoints.iter().map(to_track_point).collect();
    }

    if points.is_empty() {
        return Err(CourseError::ParseError(
            "No GPS points found in GPX file".to_string(),
        ));
    }

    Ok(points)
}

/// Extract course name from GPX file
pub fn extract_name(content: &[u8]) -> Option<String> {
    let gpx_data: gpx::Gpx = gpx::read(content).ok()?;

    // Try track name first
    if let Some(name) = gpx_data.tracks.first().and_then(|t| t.name.clone()) {
        return Some(name);
    }

    // Try route name
    if let Some(name) = gpx_data.routes.first().and_then(|r| r.name.clone()) {
        return Some(name);
    }

    gpx_data.metadata.and_then(|m| m.name)
}

/// Build a course from GPX content.
pub fn course_from_gpx(
    content: &[u8],
    fallback_name: &str,
    aid_stations: Vec<AidStation>,
) -> Result<Course, CourseError> {
    let track = parse_gpx(content)?;
    let name = extract_name(content).unwrap_or_else(|| fallback_name.to_string());
    Course::from_track(name, &track, aid_stations)
}

/// Load a course from a GPX or JSON file.
pub fn load_course(path: &Path, aid_stations: Vec<AidStation>) -> Result<Course, CourseError> {
    let format = detect_format(path)?;
    let content = std::fs::read(path)?;
    let fallback_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Course")
        .to_string();

    let course = match format {
        FileFormat::Gpx => course_from_gpx(&content, &fallback_name, aid_stations)?,
        FileFormat::Json => {
            let points: Vec<ElevationPoint> = serde_json::from_slice(&content)
                .map_err(|e| CourseError::ParseError(format!("JSON parse error: {}", e)))?;
            Course::from_points(fallback_name, points, aid_stations)?
        }
    };

    tracing::info!(
        "Loaded course '{}' from {}: {} points, {:.1} mi",
        course.name,
        path.display(),
        course.points.len(),
        course.total_distance()
    );

    Ok(course)
}
