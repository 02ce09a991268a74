//! Integration tests for the import, plan and export workflow.

use super::sample_course::equator_gpx;
use rustpace::course::import::course_from_gpx;
use rustpace::course::AidStation;
use rustpace::export::{export_checkpoints, export_csv, AthleteSummary, DeviceExport};
use rustpace::export::csv::export_csv_to_file;
use rustpace::plan::{validate_partition, CommandOutcome, Edge, PlannerCommand, PlannerSettings};
use rustpace::power::{default_intensity_factors, PowerInputs};
use rustpace::{EffortLevel, EffortPreset, SegmentPlanner, TerrainClass};
use tempfile::tempdir;

fn inputs() -> PowerInputs {
    PowerInputs {
        ftp_watts: 250.0,
        altitude_adjustment_factor: 0.2,
        intensity_factors: default_intensity_factors(),
    }
}

fn planner() -> SegmentPlanner {
    let stations = vec![
        AidStation::new("Base", 7.0),
        AidStation::new("Summit", 14.0).with_cutoff(240.0),
    ];
    let course = course_from_gpx(equator_gpx().as_bytes(), "hill", stations).unwrap();
    SegmentPlanner::new(course, &inputs(), PlannerSettings::default()).unwrap()
}

fn athlete() -> AthleteSummary {
    AthleteSummary {
        name: "Rider".to_string(),
        ftp_watts: 250.0,
        weight_kg: 70.0,
    }
}

#[test]
fn test_imported_course_seeds_segments() {
    let planner = planner();
    let segments = planner.segments();
    let total = planner.course().total_distance();

    assert_eq!(segments.len(), 3);
    assert!(validate_partition(segments, total).is_ok());
    assert_eq!(segments[0].start_name, "Start");
    assert_eq!(segments[0].end_name, "Base");
    assert_eq!(segments[1].end_name, "Summit");
    assert_eq!(segments[2].end_name, "Finish");
    assert_eq!(segments[2].end_mile, total);

    let ctx = planner.context();
    let terrain: Vec<TerrainClass> = segments.iter().map(|s| ctx.segment_terrain(s)).collect();
    assert_eq!(
        terrain,
        vec![TerrainClass::Flat, TerrainClass::Climbing, TerrainClass::Flat]
    );
}

#[test]
fn test_preset_drag_and_export() {
    let mut planner = planner();

    planner.apply_preset(EffortPreset::Aggressive).unwrap();
    let efforts: Vec<EffortLevel> = planner.segments().iter().map(|s| s.effort_level).collect();
    assert_eq!(
        efforts,
        vec![EffortLevel::Tempo, EffortLevel::Pushing, EffortLevel::Tempo]
    );
    // climbing pushing = 200 * 0.73 * 1.2 = 175.2 W
    let climb = &planner.segments()[1];
    assert_eq!((climb.power_target_low, climb.power_target_high), (166, 184));

    planner
        .dispatch(PlannerCommand::DistributeGoalTime {
            total_minutes: 300.0,
        })
        .unwrap();

    let id = planner.segments()[0].id;
    assert_eq!(planner.begin_drag(id, Edge::End).unwrap(), CommandOutcome::DragStarted);
    planner.update_drag(6.5).unwrap();
    assert_eq!(planner.commit_drag().unwrap(), CommandOutcome::Applied);
    assert_eq!(planner.segments()[0].end_mile, 6.5);
    assert_eq!(planner.segments()[1].start_mile, 6.5);

    let export = DeviceExport::from_planner(&planner, athlete()).unwrap();
    assert_eq!(export.course_name, "Equator Hill");
    assert_eq!(export.checkpoints.len(), 3);
    assert_eq!(export.checkpoints[0].mile, 6.5);
    assert_eq!(export.checkpoints[1].cutoff_minutes, Some(240.0));
    assert!((export.total_minutes() - 300.0).abs() < 1e-9);
    assert_eq!(export.checkpoints[1].effort, EffortLevel::Pushing);

    let back: DeviceExport = serde_json::from_str(&export.to_json().unwrap()).unwrap();
    assert_eq!(back, export);
}

#[test]
fn test_missed_cutoff_is_flagged() {
    let mut planner = planner();
    planner
        .dispatch(PlannerCommand::DistributeGoalTime {
            total_minutes: 600.0,
        })
        .unwrap();

    let export = DeviceExport::from_planner(&planner, athlete()).unwrap();
    let summit = &export.checkpoints[1];
    assert_eq!(summit.name, "Summit");
    assert!(summit.target_minutes > 240.0);
    assert!(summit.misses_cutoff());
}

#[test]
fn test_csv_file_export() {
    let mut planner = planner();
    let ids: Vec<_> = planner.segments().iter().map(|s| s.id).collect();
    planner.set_target_time(ids[0], 30.0).unwrap();
    planner.set_target_time(ids[1], 60.0).unwrap();
    planner.set_target_time(ids[2], 30.0).unwrap();

    let checkpoints = export_checkpoints(planner.segments(), &planner.course().aid_stations);
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.csv");
    export_csv_to_file(&checkpoints, &path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, export_csv(&checkpoints).unwrap());

    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines[0],
        "name,mile,target_minutes,target_clock,effort,cutoff_minutes"
    );
    assert_eq!(lines[1], "Base,7.00,30.0,0:30,safe,");
    assert_eq!(lines[2], "Summit,14.00,90.0,1:30,safe,240.0");
    assert!(lines[3].starts_with("Finish,20.73,120.0,2:00,safe"));
}
