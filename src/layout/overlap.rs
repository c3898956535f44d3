use super::time::TimeSpan;

/// Activities listed together because they overlap the group's anchor.
///
/// Members are indices into the day's activity slice. The first member is
/// the anchor, the rest follow in input order. Groups are not a partition:
/// an activity overlapping two anchors that don't overlap each other shows
/// up in both groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapGroup {
    members: Vec<usize>,
}

impl OverlapGroup {
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    /// Position of `index` within this group
    pub fn position(&self, index: usize) -> Option<usize> {
        self.members.iter().position(|&m| m == index)
    }
}

/// Find overlap groups for one day column.
///
/// For every anchor `i` the candidate group is `i` plus each later `j`
/// whose span overlaps `i`'s; candidates with at least two members are
/// emitted in anchor order. Unparseable spans (`None`) never overlap.
pub fn find_overlap_groups(spans: &[Option<TimeSpan>]) -> Vec<OverlapGroup> {
    let mut groups = Vec::new();

    for (i, anchor) in spans.iter().enumerate() {
        let mut members = vec![i];

        if let Some(anchor) = anchor {
            for (j, other) in spans.iter().enumerate().skip(i + 1) {
                if other.as_ref().is_some_and(|other| anchor.overlaps(other)) {
                    members.push(j);
                }
            }
        }

        if members.len() >= 2 {
            groups.push(OverlapGroup { members });
        }
    }

    groups
}
