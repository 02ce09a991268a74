//! Unit tests for effort presets.

use super::fixtures::three_segment_planner;
use rustpace::plan::EffortPreset;
use rustpace::power::EffortLevel;

fn efforts(planner: &rustpace::SegmentPlanner) -> Vec<EffortLevel> {
    planner.segments().iter().map(|s| s.effort_level).collect()
}

#[test]
fn test_preset_effort_pairs() {
    assert_eq!(
        EffortPreset::Conservative.efforts(),
        (EffortLevel::Safe, EffortLevel::Tempo)
    );
    assert_eq!(
        EffortPreset::Tempo.efforts(),
        (EffortLevel::Tempo, EffortLevel::Tempo)
    );
    assert_eq!(
        EffortPreset::Aggressive.efforts(),
        (EffortLevel::Tempo, EffortLevel::Pushing)
    );
}

#[test]
fn test_climb_segment_gets_climb_effort() {
    let mut planner = three_segment_planner();

    planner.apply_preset(EffortPreset::Aggressive).unwrap();
    assert_eq!(
        efforts(&planner),
        vec![EffortLevel::Tempo, EffortLevel::Pushing, EffortLevel::Tempo]
    );

    planner.apply_preset(EffortPreset::Conservative).unwrap();
    assert_eq!(
        efforts(&planner),
        vec![EffortLevel::Safe, EffortLevel::Tempo, EffortLevel::Safe]
    );
}

#[test]
fn test_preset_overwrites_manual_choices() {
    let mut planner = three_segment_planner();
    let first = planner.segments()[0].id;
    planner.set_effort(first, EffortLevel::Pushing).unwrap();

    planner.apply_preset(EffortPreset::Conservative).unwrap();

    assert_eq!(planner.segments()[0].effort_level, EffortLevel::Safe);
}

#[test]
fn test_preset_refreshes_power_bands() {
    let mut planner = three_segment_planner();

    planner.apply_preset(EffortPreset::Tempo).unwrap();

    // flat tempo = 200 * 0.70 * 0.9 = 126 W
    let flat = &planner.segments()[0];
    assert_eq!((flat.power_target_low, flat.power_target_high), (120, 132));
    // climbing tempo = 200 * 0.70 * 1.2 = 168 W
    let climb = &planner.segments()[1];
    assert_eq!((climb.power_target_low, climb.power_target_high), (160, 176));
}

#[test]
fn test_preset_keeps_boundaries() {
    let mut planner = three_segment_planner();
    let before: Vec<(f64, f64)> = planner
        .segments()
        .iter()
        .map(|s| (s.start_mile, s.end_mile))
        .collect();

    for preset in EffortPreset::ALL {
        planner.apply_preset(preset).unwrap();
        let after: Vec<(f64, f64)> = planner
            .segments()
            .iter()
            .map(|s| (s.start_mile, s.end_mile))
            .collect();
        assert_eq!(after, before);
    }
}
