//! Unit tests for effort, time and structural edits.

use super::fixtures::{hundred_mile_course, race_inputs, three_segment_planner, two_stations};
use rustpace::course::AidStation;
use rustpace::plan::{
    reduce, validate_partition, CommandOutcome, PlanState, PlannerCommand, PlannerError,
    PlannerSettings, RejectReason, SegmentPlanner,
};
use rustpace::power::EffortLevel;

#[test]
fn test_initial_power_bands_follow_terrain() {
    let planner = three_segment_planner();
    let segments = planner.segments();

    // flat safe 120.6 W
    assert_eq!(
        (segments[0].power_target_low, segments[0].power_target_high),
        (115, 127)
    );
    // climbing safe 160.8 W
    assert_eq!(
        (segments[1].power_target_low, segments[1].power_target_high),
        (153, 169)
    );
    assert_eq!(
        (segments[2].power_target_low, segments[2].power_target_high),
        (115, 127)
    );
}

#[test]
fn test_set_effort_refreshes_band_without_moving_boundaries() {
    let mut planner = three_segment_planner();
    let before = planner.segments().to_vec();

    planner
        .set_effort(before[1].id, EffortLevel::Pushing)
        .unwrap();

    let segment = &planner.segments()[1];
    assert_eq!(segment.effort_level, EffortLevel::Pushing);
    // climbing pushing = 200 * 0.73 * 1.2 = 175.2 W
    assert_eq!(
        (segment.power_target_low, segment.power_target_high),
        (166, 184)
    );
    assert_eq!(segment.start_mile, before[1].start_mile);
    assert_eq!(segment.end_mile, before[1].end_mile);
}

#[test]
fn test_set_target_time() {
    let mut planner = three_segment_planner();
    let id = planner.segments()[2].id;

    assert_eq!(planner.set_target_time(id, 95.5).unwrap(), CommandOutcome::Applied);
    assert_eq!(planner.segments()[2].target_time_minutes, 95.5);
    assert_eq!(
        planner.set_target_time(id, f64::INFINITY),
        Err(PlannerError::InvalidTargetTime(f64::INFINITY))
    );
    assert_eq!(planner.segments()[2].target_time_minutes, 95.5);
}

#[test]
fn test_unknown_segment_is_error() {
    let mut planner = three_segment_planner();
    let stranger = uuid::Uuid::new_v4();
    assert_eq!(
        planner.set_effort(stranger, EffortLevel::Tempo),
        Err(PlannerError::UnknownSegment(stranger))
    );
}

#[test]
fn test_distribute_goal_time_by_distance() {
    let mut planner = three_segment_planner();
    planner
        .dispatch(PlannerCommand::DistributeGoalTime {
            total_minutes: 600.0,
        })
        .unwrap();

    let minutes: Vec<f64> = planner
        .segments()
        .iter()
        .map(|s| s.target_time_minutes)
        .collect();
    assert!((minutes[0] - 180.0).abs() < 1e-9);
    assert!((minutes[1] - 240.0).abs() < 1e-9);
    assert!((minutes[2] - 180.0).abs() < 1e-9);
}

#[test]
fn test_split_rejects_points_at_the_edges() {
    let mut planner = three_segment_planner();
    let id = planner.segments()[0].id;

    for at_mile in [0.0, 30.0, 0.001, 45.0] {
        let outcome = planner
            .dispatch(PlannerCommand::SplitSegment {
                segment_id: id,
                at_mile,
                name: "Mid".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Rejected(RejectReason::TooNarrowToSplit));
    }
    assert_eq!(planner.segments().len(), 3);
}

#[test]
fn test_split_then_drag_new_boundary() {
    let mut planner = three_segment_planner();
    let id = planner.segments()[1].id;

    planner
        .dispatch(PlannerCommand::SplitSegment {
            segment_id: id,
            at_mile: 50.0,
            name: "Summit".to_string(),
        })
        .unwrap();
    assert_eq!(planner.segments().len(), 4);
    assert!(validate_partition(planner.segments(), 100.0).is_ok());

    let tail = planner.segments()[2].id;
    planner.begin_drag(tail, rustpace::plan::Edge::Start).unwrap();
    planner.update_drag(55.0).unwrap();
    assert_eq!(planner.commit_drag().unwrap(), CommandOutcome::Applied);
    assert_eq!(planner.segments()[1].end_mile, 55.0);
    assert_eq!(planner.segments()[2].start_mile, 55.0);
}

#[test]
fn test_merge_down_to_single_segment() {
    let mut planner = three_segment_planner();
    while planner.segments().len() > 1 {
        let id = planner.segments()[0].id;
        planner
            .dispatch(PlannerCommand::MergeWithNext { segment_id: id })
            .unwrap();
    }

    let only = &planner.segments()[0];
    assert_eq!((only.start_mile, only.end_mile), (0.0, 100.0));
    assert_eq!(only.start_name, "Start");
    assert_eq!(only.end_name, "Finish");
    assert_eq!(only.order, 0);
}

#[test]
fn test_changing_ftp_refreshes_bands() {
    let mut planner = three_segment_planner();
    let mut inputs = race_inputs();
    inputs.altitude_adjustment_factor = 0.0;

    planner.set_power_inputs(&inputs).unwrap();

    // flat safe at 250 W adjusted = 250 * 0.67 * 0.9 = 150.75 W
    let segment = &planner.segments()[0];
    assert_eq!(
        (segment.power_target_low, segment.power_target_high),
        (143, 158)
    );

    inputs.ftp_watts = 0.0;
    assert!(planner.set_power_inputs(&inputs).is_err());
    assert!((planner.power_targets().adjusted_ftp - 250.0).abs() < 1e-9);
}

#[test]
fn test_aid_stations_near_edges_are_skipped() {
    let stations = vec![
        AidStation::new("Start Line", 0.0),
        AidStation::new("Aid A", 30.0),
        AidStation::new("Aid A again", 30.0),
        AidStation::new("Past finish", 120.0),
    ];
    let planner = SegmentPlanner::new(
        hundred_mile_course(stations),
        &race_inputs(),
        PlannerSettings::default(),
    )
    .unwrap();

    let names: Vec<&str> = planner
        .segments()
        .iter()
        .map(|s| s.end_name.as_str())
        .collect();
    assert_eq!(names, vec!["Aid A", "Finish"]);
}

#[test]
fn test_non_finite_aid_station_is_skipped() {
    let stations = vec![
        AidStation::new("Aid A", 50.0),
        AidStation::new("Nowhere", f64::NAN),
        AidStation::new("Beyond", f64::INFINITY),
    ];
    let planner = SegmentPlanner::new(
        hundred_mile_course(stations),
        &race_inputs(),
        PlannerSettings::default(),
    )
    .unwrap();

    let bounds: Vec<(f64, f64)> = planner
        .segments()
        .iter()
        .map(|s| (s.start_mile, s.end_mile))
        .collect();
    assert_eq!(bounds, vec![(0.0, 50.0), (50.0, 100.0)]);
    assert!(validate_partition(planner.segments(), 100.0).is_ok());
}

#[test]
fn test_no_aid_stations_gives_single_segment() {
    let planner = SegmentPlanner::new(
        hundred_mile_course(vec![]),
        &race_inputs(),
        PlannerSettings::default(),
    )
    .unwrap();
    assert_eq!(planner.segments().len(), 1);
    assert_eq!(planner.segments()[0].width(), 100.0);
}

#[test]
fn test_reduce_is_pure() {
    let course = hundred_mile_course(two_stations());
    let planner = SegmentPlanner::new(course, &race_inputs(), PlannerSettings::default()).unwrap();
    let ctx = planner.context();
    let state: PlanState = planner.state().clone();

    let id = state.segments()[0].id;
    let (dragging, _) = reduce(
        &state,
        PlannerCommand::BeginDrag {
            segment_id: id,
            edge: rustpace::plan::Edge::End,
        },
        &ctx,
    )
    .unwrap();
    let (moved, _) = reduce(&dragging, PlannerCommand::UpdateDrag { mile: 20.0 }, &ctx).unwrap();
    let (committed, outcome) = reduce(&moved, PlannerCommand::CommitDrag, &ctx).unwrap();

    assert_eq!(outcome, CommandOutcome::Applied);
    assert!(!state.is_dragging());
    assert!(dragging.is_dragging());
    assert_eq!(state.segments()[0].end_mile, 30.0);
    assert_eq!(moved.segments()[0].end_mile, 30.0);
    assert_eq!(committed.segments()[0].end_mile, 20.0);
    assert_eq!(committed.segments()[1].start_mile, 20.0);
}
