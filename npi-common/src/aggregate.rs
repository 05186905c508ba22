//! Per-status counts

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::tracker::{Classified, StatusGroup, StatusKind, TrackerRecord};

/// Count of records per status
///
/// Every status of the tracker has an entry, zero included, so the counts
/// always sum to the number of records aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCounts<S: StatusKind> {
    counts: BTreeMap<S, usize>,
}

impl<S: StatusKind> StatusCounts<S> {
    pub fn new() -> Self {
        Self {
            counts: S::ALL.iter().map(|&s| (s, 0)).collect(),
        }
    }

    pub fn add(&mut self, status: S) {
        *self.counts.entry(status).or_insert(0) += 1;
    }

    pub fn get(&self, status: S) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Sum over every status in the group
    pub fn group_total(&self, group: StatusGroup) -> usize {
        self.counts
            .iter()
            .filter(|(status, _)| status.group() == group)
            .map(|(_, count)| count)
            .sum()
    }

    /// Statuses with their counts, in status order
    pub fn iter(&self) -> impl Iterator<Item = (S, usize)> + '_ {
        self.counts.iter().map(|(&s, &c)| (s, c))
    }
}

impl<S: StatusKind> Default for StatusCounts<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: StatusKind> Serialize for StatusCounts<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (status, count) in &self.counts {
            map.serialize_entry(status.label(), count)?;
        }
        map.end()
    }
}

/// Count classified records by status
pub fn aggregate<R: TrackerRecord>(rows: &[Classified<R>]) -> StatusCounts<R::Status> {
    let mut counts = StatusCounts::new();
    for row in rows {
        counts.add(row.status);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{MilestoneStatus, ReadinessStatus, SubMilestoneStatus};

    #[test]
    fn test_new_has_every_status_at_zero() {
        let counts = StatusCounts::<ReadinessStatus>::new();
        assert_eq!(counts.iter().count(), ReadinessStatus::ALL.len());
        assert_eq!(counts.total(), 0);
    }

    #[test]
    fn test_group_totals() {
        let mut counts = StatusCounts::<MilestoneStatus>::new();
        counts.add(MilestoneStatus::Delayed);
        counts.add(MilestoneStatus::OverdueNoActual);
        counts.add(MilestoneStatus::OverdueNoActual);
        counts.add(MilestoneStatus::Pending);

        assert_eq!(counts.group_total(StatusGroup::Delayed), 3);
        assert_eq!(counts.group_total(StatusGroup::Open), 1);
        assert_eq!(counts.group_total(StatusGroup::Closed), 0);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_serializes_by_label() {
        let mut counts = StatusCounts::<SubMilestoneStatus>::new();
        counts.add(SubMilestoneStatus::NotCompleted);

        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["Completed"], 0);
        assert_eq!(json["Not Completed"], 1);
    }
}
