use super::overlap::OverlapGroup;

/// Share of the column width used by activity blocks
pub const COLUMN_FILL: f32 = 0.9;
/// Left inset of the first lane
pub const COLUMN_INSET: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneAssignment {
    pub is_overlapping: bool,
    pub lane_index: usize,
    pub lane_count: usize,
}

impl Default for LaneAssignment {
    fn default() -> Self {
        Self {
            is_overlapping: false,
            lane_index: 0,
            lane_count: 1,
        }
    }
}

impl LaneAssignment {
    /// (left, width) as fractions of the column width
    pub fn horizontal_span(&self) -> (f32, f32) {
        if !self.is_overlapping {
            return (COLUMN_INSET, COLUMN_FILL);
        }
        let width = COLUMN_FILL / self.lane_count as f32;
        (COLUMN_INSET + self.lane_index as f32 * width, width)
    }
}

/// Lane for the activity at `index`, taken from the first group that lists it
pub fn assign_lane(index: usize, groups: &[OverlapGroup]) -> LaneAssignment {
    groups
        .iter()
        .find_map(|group| {
            group.position(index).map(|lane_index| LaneAssignment {
                is_overlapping: true,
                lane_index,
                lane_count: group.len(),
            })
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::overlap::find_overlap_groups;
    use crate::layout::time::TimeSpan;

    fn groups_for(spans: &[(&str, &str)]) -> Vec<OverlapGroup> {
        let spans: Vec<_> = spans
            .iter()
            .map(|(s, e)| Some(TimeSpan::parse(s, e).unwrap()))
            .collect();
        find_overlap_groups(&spans)
    }

    #[test]
    fn ungrouped_activity_gets_full_lane() {
        let lane = assign_lane(0, &[]);
        assert_eq!(lane, LaneAssignment::default());
        assert_eq!(lane.horizontal_span(), (0.05, 0.9));
    }

    #[test]
    fn first_listing_group_wins() {
        let groups = groups_for(&[("09:00", "10:00"), ("09:30", "11:00"), ("10:30", "11:30")]);

        // B is listed in both groups; the first one decides
        let b = assign_lane(1, &groups);
        assert_eq!((b.lane_index, b.lane_count), (1, 2));

        let c = assign_lane(2, &groups);
        assert_eq!((c.lane_index, c.lane_count), (1, 2));
    }

    #[test]
    fn lanes_split_column_evenly() {
        let lane = LaneAssignment {
            is_overlapping: true,
            lane_index: 2,
            lane_count: 3,
        };
        let (left, width) = lane.horizontal_span();
        assert!((width - 0.3).abs() < 1e-6);
        assert!((left - 0.65).abs() < 1e-6);
    }
}
