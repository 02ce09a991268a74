//! Unit tests for the segment model and partition invariant.

use rustpace::plan::segment::{total_target_minutes, validate_partition, PartitionError, Segment};
use rustpace::plan::PlanState;

fn partition(bounds: &[f64]) -> Vec<Segment> {
    bounds
        .windows(2)
        .enumerate()
        .map(|(i, pair)| Segment::new(i as u32, pair[0], pair[1], format!("B{}", i), format!("B{}", i + 1)))
        .collect()
}

#[test]
fn test_valid_partition() {
    assert!(validate_partition(&partition(&[0.0, 12.5, 40.0, 100.0]), 100.0).is_ok());
    assert!(validate_partition(&partition(&[0.0, 26.2]), 26.2).is_ok());
}

#[test]
fn test_first_segment_must_start_at_zero() {
    let mut segments = partition(&[0.0, 50.0, 100.0]);
    segments[0].start_mile = 1.0;
    assert_eq!(
        validate_partition(&segments, 100.0),
        Err(PartitionError::StartNotZero(1.0))
    );
}

#[test]
fn test_overlap_is_detected() {
    let mut segments = partition(&[0.0, 50.0, 100.0]);
    segments[1].start_mile = 45.0;
    assert!(matches!(
        validate_partition(&segments, 100.0),
        Err(PartitionError::Discontinuous { index: 0, .. })
    ));
}

#[test]
fn test_order_gap_is_detected() {
    let mut segments = partition(&[0.0, 50.0, 100.0]);
    segments[1].order = 2;
    assert!(matches!(
        validate_partition(&segments, 100.0),
        Err(PartitionError::OrderMismatch { index: 1, order: 2 })
    ));
}

#[test]
fn test_negative_width_is_detected() {
    let mut segments = partition(&[0.0, 50.0, 100.0]);
    segments[0].end_mile = 60.0;
    segments[1].start_mile = 60.0;
    segments[1].end_mile = 55.0;
    assert!(validate_partition(&segments, 100.0).is_err());
}

#[test]
fn test_rehydration_sorts_by_order() {
    let mut segments = partition(&[0.0, 30.0, 70.0, 100.0]);
    segments.reverse();

    let state = PlanState::from_segments(segments, 100.0).unwrap();
    let starts: Vec<f64> = state.segments().iter().map(|s| s.start_mile).collect();
    assert_eq!(starts, vec![0.0, 30.0, 70.0]);
    assert!(!state.is_dragging());
}

#[test]
fn test_rehydration_rejects_broken_plan() {
    let mut segments = partition(&[0.0, 30.0, 70.0, 100.0]);
    segments[2].end_mile = 90.0;
    assert!(matches!(
        PlanState::from_segments(segments, 100.0),
        Err(PartitionError::EndMismatch { .. })
    ));
}

#[test]
fn test_total_target_minutes() {
    let mut segments = partition(&[0.0, 30.0, 70.0, 100.0]);
    segments[0].target_time_minutes = 100.0;
    segments[2].target_time_minutes = 55.5;
    assert_eq!(total_target_minutes(&segments), 155.5);
}
