//! Interactive segment planner.
//!
//! Every edit is a [`PlannerCommand`] run through [`reduce`], a pure function
//! from the current [`PlanState`] to the next one. Drag previews live in
//! `PlanState::drag` and never touch the committed segment list; only a
//! successful commit moves a boundary, and it moves both segments that share
//! it in one step.
//!
//! Invalid drags are not errors. A commit that would collapse a segment or
//! leave the course is answered with [`CommandOutcome::Rejected`] and the
//! committed segments stay as they were. [`PlannerError`] is reserved for
//! misuse of the protocol, such as committing while no drag is active.

use super::presets::{apply_preset, EffortPreset};
use super::segment::{
    position_of, renumber, validate_partition, PartitionError, Segment,
};
use super::PlannerSettings;
use crate::course::terrain::{mean_gradient, TerrainClass};
use crate::course::{calculate_gradient, Course};
use crate::power::{EffortLevel, PowerError, PowerInputs, PowerTargetTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Feet in one mile.
const FEET_PER_MILE: f64 = 5280.0;

/// Which boundary of a segment is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Start,
    End,
}

/// An in-progress boundary drag. Discarded on commit or cancel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub segment_id: Uuid,
    pub edge: Edge,
    /// Edge position when the drag began
    pub initial_mile: f64,
    /// Latest previewed position
    pub current_mile: f64,
}

/// Edits accepted by the planner.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerCommand {
    BeginDrag { segment_id: Uuid, edge: Edge },
    UpdateDrag { mile: f64 },
    CommitDrag,
    CancelDrag,
    SetEffort { segment_id: Uuid, effort: EffortLevel },
    SetTargetTime { segment_id: Uuid, minutes: f64 },
    ApplyPreset(EffortPreset),
    SplitSegment {
        segment_id: Uuid,
        at_mile: f64,
        name: String,
    },
    MergeWithNext { segment_id: Uuid },
    DistributeGoalTime { total_minutes: f64 },
}

/// Why a command was refused without changing the plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// The course start and finish cannot move
    FixedBoundary,
    /// The target mile is not strictly inside the course
    OutsideCourse { mile: f64 },
    /// The move would leave a segment narrower than the minimum width
    CollapsesSegment { segment_id: Uuid },
    /// No neighbour shares the dragged boundary
    NoAdjacentSegment,
    /// A split point too close to either end of the segment
    TooNarrowToSplit,
    /// Merge requested on the last segment
    NoNextSegment,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::FixedBoundary => write!(f, "course start and finish are fixed"),
            RejectReason::OutsideCourse { mile } => write!(f, "mile {} is outside the course", mile),
            RejectReason::CollapsesSegment { segment_id } => {
                write!(f, "segment {} would collapse", segment_id)
            }
            RejectReason::NoAdjacentSegment => write!(f, "no segment shares this boundary"),
            RejectReason::TooNarrowToSplit => write!(f, "split point too close to segment edge"),
            RejectReason::NoNextSegment => write!(f, "last segment has no successor"),
        }
    }
}

/// Result of an accepted command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandOutcome {
    /// The committed segment list changed
    Applied,
    DragStarted,
    DragMoved,
    DragCancelled,
    /// Nothing changed
    Rejected(RejectReason),
}

impl CommandOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandOutcome::Rejected(_))
    }
}

/// Protocol misuse and invalid inputs.
#[derive(Debug, Error, PartialEq)]
pub enum PlannerError {
    #[error("Unknown segment: {0}")]
    UnknownSegment(Uuid),

    #[error("No drag in progress")]
    NotDragging,

    #[error("A drag is already in progress")]
    AlreadyDragging,

    #[error("Finish or cancel the current drag first")]
    DragInProgress,

    #[error("Target time must be a non-negative number of minutes, got {0}")]
    InvalidTargetTime(f64),

    #[error("Invalid plan: {0}")]
    Partition(#[from] PartitionError),

    #[error("Invalid power inputs: {0}")]
    Power(#[from] PowerError),
}

/// Read-only inputs every command needs.
#[derive(Debug, Clone, Copy)]
pub struct PlannerContext<'a> {
    pub course: &'a Course,
    pub power: &'a PowerTargetTable,
    pub settings: &'a PlannerSettings,
}

impl PlannerContext<'_> {
    /// Terrain of a segment from the mean grade of its points.
    ///
    /// Windows holding no point use the grade between the interpolated
    /// elevations at both ends.
    pub fn segment_terrain(&self, segment: &Segment) -> TerrainClass {
        let points = &self.course.points;
        let grade = mean_gradient(points, segment.start_mile, segment.end_mile).or_else(|| {
            let start = self.course.elevation_at(segment.start_mile)?;
            let end = self.course.elevation_at(segment.end_mile)?;
            Some(calculate_gradient(end - start, segment.width() * FEET_PER_MILE))
        });

        grade.map_or(TerrainClass::Flat, |g| self.settings.thresholds.classify(g))
    }

    /// Recompute a segment's power band from its terrain and effort.
    pub fn refresh_power_band(&self, segment: &mut Segment) {
        let terrain = self.segment_terrain(segment);
        let (low, high) = self.power.band(
            terrain,
            segment.effort_level,
            self.settings.power_band_half_width,
        );
        segment.power_target_low = low;
        segment.power_target_high = high;
    }

    fn min_width(&self) -> f64 {
        self.settings.min_segment_width_miles.max(f64::EPSILON)
    }
}

/// Committed segments plus the optional drag preview.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanState {
    total_distance: f64,
    segments: Vec<Segment>,
    drag: Option<DragState>,
}

impl PlanState {
    /// Initial plan with one segment between each pair of consecutive aid stations.
    ///
    /// Stations at a non-finite mile, outside the course, or closer than the
    /// minimum width to the previous boundary or the finish, are skipped.
    pub fn from_aid_stations(ctx: &PlannerContext<'_>) -> Self {
        let total_distance = ctx.course.total_distance();
        let min_width = ctx.min_width();

        let mut boundaries: Vec<(f64, String)> = vec![(0.0, "Start".to_string())];
        for station in &ctx.course.aid_stations {
            let last_mile = boundaries.last().map_or(0.0, |(mile, _)| *mile);
            if !station.mile.is_finite()
                || station.mile - last_mile < min_width
                || total_distance - station.mile < min_width
            {
                tracing::debug!("Skipping aid station '{}' at mile {}", station.name, station.mile);
                continue;
            }
            boundaries.push((station.mile, station.name.clone()));
        }
        boundaries.push((total_distance, "Finish".to_string()));

        let mut segments: Vec<Segment> = boundaries
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Segment::new(i as u32, pair[0].0, pair[1].0, &pair[0].1, &pair[1].1))
            .collect();

        for segment in segments.iter_mut() {
            ctx.refresh_power_band(segment);
        }

        tracing::info!(
            "Initialized plan for '{}' with {} segments over {:.1} mi",
            ctx.course.name,
            segments.len(),
            total_distance
        );

        Self {
            total_distance,
            segments,
            drag: None,
        }
    }

    /// Rehydrate a saved plan. Segments are sorted by `order` and checked.
    pub fn from_segments(
        mut segments: Vec<Segment>,
        total_distance: f64,
    ) -> Result<Self, PartitionError> {
        segments.sort_by_key(|s| s.order);
        validate_partition(&segments, total_distance)?;

        Ok(Self {
            total_distance,
            segments,
            drag: None,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Segment list the pending drag would commit.
    ///
    /// `None` when idle or when the commit would be rejected.
    pub fn preview(&self, ctx: &PlannerContext<'_>) -> Option<Vec<Segment>> {
        let drag = self.drag.as_ref()?;
        let (index, neighbour) = self.resolve_drag(drag, ctx).ok()?.ok()?;

        let mut segments = self.segments.clone();
        move_boundary(&mut segments, index, neighbour, drag.edge, drag.current_mile);
        Some(segments)
    }

    /// Indices of the dragged segment and the neighbour sharing its edge.
    fn resolve_drag(
        &self,
        drag: &DragState,
        ctx: &PlannerContext<'_>,
    ) -> Result<Result<(usize, usize), RejectReason>, PlannerError> {
        let index = position_of(&self.segments, drag.segment_id)
            .ok_or(PlannerError::UnknownSegment(drag.segment_id))?;

        let neighbour = match drag.edge {
            Edge::End => index + 1,
            Edge::Start => match index.checked_sub(1) {
                Some(previous) => previous,
                None => return Ok(Err(RejectReason::FixedBoundary)),
            },
        };

        let Some(adjacent) = self.segments.get(neighbour) else {
            return Ok(Err(RejectReason::FixedBoundary));
        };

        let shared = match drag.edge {
            Edge::End => adjacent.start_mile,
            Edge::Start => adjacent.end_mile,
        };
        if shared != drag.initial_mile {
            return Ok(Err(RejectReason::NoAdjacentSegment));
        }

        let mile = drag.current_mile;
        if !mile.is_finite() || mile <= 0.0 || mile >= self.total_distance {
            return Ok(Err(RejectReason::OutsideCourse { mile }));
        }

        let (lower, upper) = match drag.edge {
            Edge::End => (index, neighbour),
            Edge::Start => (neighbour, index),
        };
        let min_width = ctx.min_width();
        if mile - self.segments[lower].start_mile < min_width {
            return Ok(Err(RejectReason::CollapsesSegment {
                segment_id: self.segments[lower].id,
            }));
        }
        if self.segments[upper].end_mile - mile < min_width {
            return Ok(Err(RejectReason::CollapsesSegment {
                segment_id: self.segments[upper].id,
            }));
        }

        Ok(Ok((index, neighbour)))
    }

    fn segment_mut(&mut self, segment_id: Uuid) -> Result<&mut Segment, PlannerError> {
        self.segments
            .iter_mut()
            .find(|s| s.id == segment_id)
            .ok_or(PlannerError::UnknownSegment(segment_id))
    }
}

/// Set the shared boundary of two adjacent segments.
fn move_boundary(segments: &mut [Segment], index: usize, neighbour: usize, edge: Edge, mile: f64) {
    match edge {
        Edge::End => {
            segments[index].end_mile = mile;
            segments[neighbour].start_mile = mile;
        }
        Edge::Start => {
            segments[index].start_mile = mile;
            segments[neighbour].end_mile = mile;
        }
    }
}

/// Apply one command to a plan.
///
/// Never mutates `state`; the returned state is what the plan becomes.
pub fn reduce(
    state: &PlanState,
    command: PlannerCommand,
    ctx: &PlannerContext<'_>,
) -> Result<(PlanState, CommandOutcome), PlannerError> {
    let mut next = state.clone();

    let outcome = match command {
        PlannerCommand::BeginDrag { segment_id, edge } => {
            if next.drag.is_some() {
                return Err(PlannerError::AlreadyDragging);
            }
            let index = position_of(&next.segments, segment_id)
                .ok_or(PlannerError::UnknownSegment(segment_id))?;
            let segment = &next.segments[index];

            let is_fixed = match edge {
                Edge::Start => index == 0,
                Edge::End => index + 1 == next.segments.len(),
            };
            if is_fixed {
                CommandOutcome::Rejected(RejectReason::FixedBoundary)
            } else {
                let initial_mile = match edge {
                    Edge::Start => segment.start_mile,
                    Edge::End => segment.end_mile,
                };
                next.drag = Some(DragState {
                    segment_id,
                    edge,
                    initial_mile,
                    current_mile: initial_mile,
                });
                CommandOutcome::DragStarted
            }
        }

        PlannerCommand::UpdateDrag { mile } => {
            let drag = next.drag.as_mut().ok_or(PlannerError::NotDragging)?;
            drag.current_mile = mile;
            CommandOutcome::DragMoved
        }

        PlannerCommand::CommitDrag => {
            let drag = next.drag.take().ok_or(PlannerError::NotDragging)?;
            match next.resolve_drag(&drag, ctx)? {
                Ok((index, neighbour)) => {
                    move_boundary(&mut next.segments, index, neighbour, drag.edge, drag.current_mile);
                    ctx.refresh_power_band(&mut next.segments[index]);
                    ctx.refresh_power_band(&mut next.segments[neighbour]);
                    CommandOutcome::Applied
                }
                Err(reason) => CommandOutcome::Rejected(reason),
            }
        }

        PlannerCommand::CancelDrag => {
            next.drag.take().ok_or(PlannerError::NotDragging)?;
            CommandOutcome::DragCancelled
        }

        PlannerCommand::SetEffort { segment_id, effort } => {
            let segment = next.segment_mut(segment_id)?;
            segment.effort_level = effort;
            ctx.refresh_power_band(segment);
            CommandOutcome::Applied
        }

        PlannerCommand::SetTargetTime {
            segment_id,
            minutes,
        } => {
            if !minutes.is_finite() || minutes < 0.0 {
                return Err(PlannerError::InvalidTargetTime(minutes));
            }
            next.segment_mut(segment_id)?.target_time_minutes = minutes;
            CommandOutcome::Applied
        }

        PlannerCommand::ApplyPreset(preset) => {
            let climbs = apply_preset(
                preset,
                &mut next.segments,
                &ctx.course.points,
                &ctx.settings.thresholds,
            );
            for segment in next.segments.iter_mut() {
                ctx.refresh_power_band(segment);
            }
            tracing::info!(
                "Applied {} preset: {} of {} segments marked as climbs",
                preset,
                climbs,
                next.segments.len()
            );
            CommandOutcome::Applied
        }

        PlannerCommand::SplitSegment {
            segment_id,
            at_mile,
            name,
        } => {
            if next.drag.is_some() {
                return Err(PlannerError::DragInProgress);
            }
            let index = position_of(&next.segments, segment_id)
                .ok_or(PlannerError::UnknownSegment(segment_id))?;
            let original = &next.segments[index];
            let min_width = ctx.min_width();

            if !at_mile.is_finite()
                || at_mile - original.start_mile < min_width
                || original.end_mile - at_mile < min_width
            {
                CommandOutcome::Rejected(RejectReason::TooNarrowToSplit)
            } else {
                let share = (at_mile - original.start_mile) / original.width();
                let mut tail = Segment::new(
                    0,
                    at_mile,
                    original.end_mile,
                    name.clone(),
                    original.end_name.clone(),
                );
                tail.effort_level = original.effort_level;
                tail.target_time_minutes = original.target_time_minutes * (1.0 - share);

                let head = &mut next.segments[index];
                head.end_mile = at_mile;
                head.end_name = name;
                head.target_time_minutes *= share;
                ctx.refresh_power_band(head);
                ctx.refresh_power_band(&mut tail);

                next.segments.insert(index + 1, tail);
                renumber(&mut next.segments);
                CommandOutcome::Applied
            }
        }

        PlannerCommand::MergeWithNext { segment_id } => {
            if next.drag.is_some() {
                return Err(PlannerError::DragInProgress);
            }
            let index = position_of(&next.segments, segment_id)
                .ok_or(PlannerError::UnknownSegment(segment_id))?;

            if index + 1 >= next.segments.len() {
                CommandOutcome::Rejected(RejectReason::NoNextSegment)
            } else {
                let absorbed = next.segments.remove(index + 1);
                let merged = &mut next.segments[index];
                merged.end_mile = absorbed.end_mile;
                merged.end_name = absorbed.end_name;
                merged.target_time_minutes += absorbed.target_time_minutes;
                ctx.refresh_power_band(merged);
                renumber(&mut next.segments);
                CommandOutcome::Applied
            }
        }

        PlannerCommand::DistributeGoalTime { total_minutes } => {
            if !total_minutes.is_finite() || total_minutes < 0.0 {
                return Err(PlannerError::InvalidTargetTime(total_minutes));
            }
            let total_distance = next.total_distance;
            for segment in next.segments.iter_mut() {
                segment.target_time_minutes = total_minutes * segment.width() / total_distance;
            }
            CommandOutcome::Applied
        }
    };

    debug_assert!(
        validate_partition(&next.segments, next.total_distance).is_ok(),
        "partition invariant broken by {:?}",
        outcome
    );

    match outcome {
        CommandOutcome::Rejected(reason) => tracing::debug!("Command rejected: {}", reason),
        other => tracing::trace!("Command result: {:?}", other),
    }

    Ok((next, outcome))
}

/// Owner of a plan and everything needed to edit it.
#[derive(Debug, Clone)]
pub struct SegmentPlanner {
    course: Course,
    power: PowerTargetTable,
    settings: PlannerSettings,
    state: PlanState,
}

impl SegmentPlanner {
    /// Start a plan seeded from the course's aid stations.
    pub fn new(
        course: Course,
        inputs: &PowerInputs,
        settings: PlannerSettings,
    ) -> Result<Self, PowerError> {
        let power = build_table(inputs, &settings)?;
        let state = PlanState::from_aid_stations(&PlannerContext {
            course: &course,
            power: &power,
            settings: &settings,
        });

        Ok(Self {
            course,
            power,
            settings,
            state,
        })
    }

    /// Resume a saved plan.
    ///
    /// Boundaries, efforts and times are kept as saved. Power bands are
    /// recomputed from `inputs`, so a plan saved at another FTP comes back
    /// with current targets.
    pub fn with_segments(
        course: Course,
        inputs: &PowerInputs,
        settings: PlannerSettings,
        segments: Vec<Segment>,
    ) -> Result<Self, PlannerError> {
        let power = build_table(inputs, &settings)?;
        let mut state = PlanState::from_segments(segments, course.total_distance())?;
        let ctx = PlannerContext {
            course: &course,
            power: &power,
            settings: &settings,
        };
        for segment in state.segments.iter_mut() {
            ctx.refresh_power_band(segment);
        }

        Ok(Self {
            course,
            power,
            settings,
            state,
        })
    }

    /// Run a command. The plan is replaced only if the command succeeds.
    pub fn dispatch(&mut self, command: PlannerCommand) -> Result<CommandOutcome, PlannerError> {
        let ctx = PlannerContext {
            course: &self.course,
            power: &self.power,
            settings: &self.settings,
        };
        let (next, outcome) = reduce(&self.state, command, &ctx)?;
        self.state = next;
        Ok(outcome)
    }

    /// Replace the athlete inputs and refresh every power band.
    pub fn set_power_inputs(&mut self, inputs: &PowerInputs) -> Result<(), PowerError> {
        self.power = build_table(inputs, &self.settings)?;
        let ctx = PlannerContext {
            course: &self.course,
            power: &self.power,
            settings: &self.settings,
        };
        for segment in self.state.segments.iter_mut() {
            ctx.refresh_power_band(segment);
        }
        tracing::info!("Power targets updated: adjusted FTP {:.0} W", self.power.adjusted_ftp);
        Ok(())
    }

    pub fn begin_drag(&mut self, segment_id: Uuid, edge: Edge) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::BeginDrag { segment_id, edge })
    }

    pub fn update_drag(&mut self, mile: f64) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::UpdateDrag { mile })
    }

    pub fn commit_drag(&mut self) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::CommitDrag)
    }

    pub fn cancel_drag(&mut self) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::CancelDrag)
    }

    pub fn set_effort(
        &mut self,
        segment_id: Uuid,
        effort: EffortLevel,
    ) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::SetEffort { segment_id, effort })
    }

    pub fn set_target_time(
        &mut self,
        segment_id: Uuid,
        minutes: f64,
    ) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::SetTargetTime {
            segment_id,
            minutes,
        })
    }

    pub fn apply_preset(&mut self, preset: EffortPreset) -> Result<CommandOutcome, PlannerError> {
        self.dispatch(PlannerCommand::ApplyPreset(preset))
    }

    /// Segment list the pending drag would commit.
    pub fn preview(&self) -> Option<Vec<Segment>> {
        self.state.preview(&self.context())
    }

    pub fn context(&self) -> PlannerContext<'_> {
        PlannerContext {
            course: &self.course,
            power: &self.power,
            settings: &self.settings,
        }
    }

    pub fn state(&self) -> &PlanState {
        &self.state
    }

    pub fn segments(&self) -> &[Segment] {
        self.state.segments()
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn power_targets(&self) -> &PowerTargetTable {
        &self.power
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }
}

fn build_table(
    inputs: &PowerInputs,
    settings: &PlannerSettings,
) -> Result<PowerTargetTable, PowerError> {
    inputs.validate()?;
    Ok(PowerTargetTable::calculate_with(
        inputs.ftp_watts,
        inputs.altitude_adjustment_factor,
        &inputs.intensity_factors,
        &settings.multipliers,
    ))
}
