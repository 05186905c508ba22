//! Sub-milestone tracker
//!
//! Free-text columns only; an item is complete once its "Actual" cell is
//! filled in.

use chrono::NaiveDate;
use serde::Serialize;

use super::{RowContext, StatusGroup, StatusKind, TrackerKind, TrackerRecord};
use crate::normalize::{ColumnLayout, FieldMatcher, NormalizedRow};

pub(super) fn layout() -> ColumnLayout {
    ColumnLayout::Named(vec![
        FieldMatcher::new("name", "Sub-Milestones", "Sub-Milestones"),
        FieldMatcher::new("plan", "Plan", "Plan"),
        FieldMatcher::new("cwv", "CWV", "CWV"),
        FieldMatcher::new("cw", "CW", "CW"),
        FieldMatcher::new("actual", "Actual", "Actual"),
        FieldMatcher::new("remarks", "Remarks", "Remarks"),
        FieldMatcher::new("lead_time", "Lead time", "Lead time"),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SubMilestoneStatus {
    #[serde(rename = "Completed")]
    Completed,
    #[serde(rename = "Not Completed")]
    NotCompleted,
}

impl StatusKind for SubMilestoneStatus {
    const ALL: &'static [Self] = &[SubMilestoneStatus::Completed, SubMilestoneStatus::NotCompleted];

    fn label(self) -> &'static str {
        match self {
            SubMilestoneStatus::Completed => "Completed",
            SubMilestoneStatus::NotCompleted => "Not Completed",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            SubMilestoneStatus::Completed => "closed-ontime",
            SubMilestoneStatus::NotCompleted => "pending",
        }
    }

    fn group(self) -> StatusGroup {
        match self {
            SubMilestoneStatus::Completed => StatusGroup::Closed,
            SubMilestoneStatus::NotCompleted => StatusGroup::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubMilestoneRecord {
    pub name: String,
    pub plan: String,
    pub cwv: String,
    pub cw: String,
    pub actual: String,
    pub remarks: String,
    pub lead_time: String,
    /// "Actual" holds something other than the placeholder
    pub completed: bool,
}

impl TrackerRecord for SubMilestoneRecord {
    type Status = SubMilestoneStatus;

    const KIND: TrackerKind = TrackerKind::SubMilestone;
    const FIELDS: &'static [&'static str] =
        &["name", "plan", "cwv", "cw", "actual", "remarks", "lead_time"];
    const STATUS_TITLE: &'static str = "Status";

    fn from_row(row: &NormalizedRow, ctx: &RowContext<'_>) -> Self {
        let actual = ctx.text(row, "actual");
        Self {
            name: ctx.text(row, "name"),
            plan: ctx.text(row, "plan"),
            cwv: ctx.text(row, "cwv"),
            cw: ctx.text(row, "cw"),
            completed: ctx.is_present(&actual),
            actual,
            remarks: ctx.text(row, "remarks"),
            lead_time: ctx.text(row, "lead_time"),
        }
    }

    fn classify(&self, _today: NaiveDate) -> SubMilestoneStatus {
        if self.completed {
            SubMilestoneStatus::Completed
        } else {
            SubMilestoneStatus::NotCompleted
        }
    }

    fn cells(&self, _placeholder: &str) -> Vec<String> {
        vec![
            self.name.clone(),
            self.plan.clone(),
            self.cwv.clone(),
            self.cw.clone(),
            self.actual.clone(),
            self.remarks.clone(),
            self.lead_time.clone(),
        ]
    }
}
