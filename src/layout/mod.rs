//! Day-column activity layout.
//!
//! Every calendar view lays out a day column through [`layout_day_column`]:
//! times are parsed, overlapping activities are grouped and given lanes, and
//! each activity gets a vertical position. The result is recomputed from
//! scratch on every frame.

mod lanes;
mod overlap;
mod position;
mod time;

pub use lanes::{assign_lane, LaneAssignment, COLUMN_FILL, COLUMN_INSET};
pub use overlap::{find_overlap_groups, OverlapGroup};
pub use position::{pixels_per_hour, PixelScale, HEADER_HEIGHT, MIN_PIXELS_PER_HOUR};
pub use time::{parse_time_to_minutes, Minutes, TimeParseError, TimeSpan};

/// Anything with an "HH:MM" start and end that can be placed in a day column
pub trait ScheduledActivity {
    fn start_time(&self) -> &str;
    fn end_time(&self) -> &str;
}

impl<T: ScheduledActivity + ?Sized> ScheduledActivity for &T {
    fn start_time(&self) -> &str {
        (**self).start_time()
    }

    fn end_time(&self) -> &str {
        (**self).end_time()
    }
}

/// Placement of one activity in its day column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityLayout {
    /// Index into the slice passed to [`layout_day_column`]
    pub index: usize,
    pub lane: LaneAssignment,
    /// NaN when the start time is malformed
    pub top: f32,
    /// NaN when either time is malformed
    pub height: f32,
}

impl ActivityLayout {
    pub fn is_overlapping(&self) -> bool {
        self.lane.is_overlapping
    }

    /// False for activities with malformed times; they are not drawn
    pub fn is_renderable(&self) -> bool {
        self.top.is_finite() && self.height.is_finite()
    }
}

/// Lay out the activities of a single day, in input order.
///
/// The caller filters to one date first. Malformed times never fail the
/// pass: the activity is left out of every overlap group and its
/// position comes back as NaN.
pub fn layout_day_column<A: ScheduledActivity>(
    activities: &[A],
    scale: PixelScale,
) -> Vec<ActivityLayout> {
    let starts: Vec<Option<Minutes>> = activities
        .iter()
        .map(|a| parse_logged(a.start_time()))
        .collect();
    let ends: Vec<Option<Minutes>> = activities
        .iter()
        .map(|a| parse_logged(a.end_time()))
        .collect();

    let spans: Vec<Option<TimeSpan>> = starts
        .iter()
        .zip(&ends)
        .map(|(start, end)| Some(TimeSpan { start: (*start)?, end: (*end)? }))
        .collect();

    let groups = find_overlap_groups(&spans);
    tracing::trace!(
        activities = activities.len(),
        groups = groups.len(),
        "laid out day column"
    );

    (0..activities.len())
        .map(|index| {
            let top = starts[index].map_or(f32::NAN, |start| scale.top(start));
            let height = spans[index].map_or(f32::NAN, |span| scale.height(span.start, span.end));
            ActivityLayout {
                index,
                lane: assign_lane(index, &groups),
                top,
                height,
            }
        })
        .collect()
}

fn parse_logged(time: &str) -> Option<Minutes> {
    match parse_time_to_minutes(time) {
        Ok(minutes) => Some(minutes),
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed activity time");
            None
        }
    }
}
