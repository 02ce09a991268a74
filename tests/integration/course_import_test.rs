//! Integration tests for course import.

use super::sample_course::{equator_gpx, CLIMB_M_PER_STEP};
use rustpace::course::import::{course_from_gpx, detect_format, load_course, FileFormat};
use rustpace::course::{AidStation, CourseError, FEET_PER_METER};
use rustpace::{CourseProfile, TerrainClass};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_detect_format() {
    assert_eq!(detect_format(Path::new("race.gpx")).unwrap(), FileFormat::Gpx);
    assert_eq!(detect_format(Path::new("race.GPX")).unwrap(), FileFormat::Gpx);
    assert_eq!(detect_format(Path::new("race.json")).unwrap(), FileFormat::Json);
    assert!(detect_format(Path::new("race.fit")).is_err());
    assert!(detect_format(Path::new("race")).is_err());
}

#[test]
fn test_gpx_import_builds_tagged_trace() {
    let course = course_from_gpx(equator_gpx().as_bytes(), "fallback", vec![]).unwrap();

    assert_eq!(course.name, "Equator Hill");
    assert_eq!(course.points.len(), 31);
    assert!((course.total_distance() - 20.728).abs() < 0.01);
    for pair in course.points.windows(2) {
        assert!(pair[1].mile > pair[0].mile);
    }

    // Flat, climbing and flat again
    assert!(course.points[5].gradient_pct.abs() < 1e-9);
    assert!((course.points[15].gradient_pct - 4.5).abs() < 0.01);
    assert!(course.points[25].gradient_pct.abs() < 1e-9);

    let summit_ft = (100.0 + CLIMB_M_PER_STEP * 10.0) * FEET_PER_METER;
    assert!((course.points[30].elevation_ft - summit_ft).abs() < 1e-6);
}

#[test]
fn test_gpx_course_profile() {
    let course = course_from_gpx(equator_gpx().as_bytes(), "fallback", vec![]).unwrap();
    let profile = CourseProfile::from_points(&course.points);

    assert_eq!(profile.climbing_pct, 33);
    assert_eq!(profile.flat_pct, 67);
    assert_eq!(profile.descent_pct, 0);
    assert!((profile.avg_climb_grade - 4.5).abs() < 0.01);
    assert!((profile.elevation_gain_ft - 500.0 * FEET_PER_METER).abs() < 1e-6);
    assert_eq!(profile.elevation_loss_ft, 0.0);
    assert_eq!(TerrainClass::from_grade(profile.avg_climb_grade), TerrainClass::Climbing);
}

#[test]
fn test_gpx_without_elevation_is_rejected() {
    let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="rustpace-tests">
  <trk><trkseg>
    <trkpt lat="0.0" lon="0.00"></trkpt>
    <trkpt lat="0.0" lon="0.01"></trkpt>
  </trkseg></trk>
</gpx>"#;

    assert!(matches!(
        course_from_gpx(gpx.as_bytes(), "bare", vec![]),
        Err(CourseError::MissingElevation { count: 2 })
    ));
}

#[test]
fn test_load_gpx_file_sorts_aid_stations() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hill.gpx");
    fs::write(&path, equator_gpx()).unwrap();

    let stations = vec![AidStation::new("Top", 14.0), AidStation::new("Base", 7.0)];
    let course = load_course(&path, stations).unwrap();

    let names: Vec<&str> = course.aid_stations.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Base", "Top"]);
}

#[test]
fn test_load_json_trace() {
    let imported = course_from_gpx(equator_gpx().as_bytes(), "fallback", vec![]).unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("hill.json");
    fs::write(&path, serde_json::to_string(&imported.points).unwrap()).unwrap();

    let course = load_course(&path, vec![]).unwrap();
    assert_eq!(course.name, "hill");
    assert_eq!(course.points, imported.points);
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let result = load_course(&dir.path().join("absent.gpx"), vec![]);
    assert!(matches!(result, Err(CourseError::IoError(_))));
}
