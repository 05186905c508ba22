//! Milestone tracker
//!
//! The milestone sheet has no usable header row: the first four columns are
//! task, milestone type, plan date and actual date, whatever their titles.

use chrono::NaiveDate;
use serde::Serialize;

use super::{Attribute, RowContext, StatusGroup, StatusKind, TrackerKind, TrackerRecord};
use crate::dates::{format_date, DAY_MONTH_FORMAT};
use crate::normalize::{ColumnLayout, NormalizedRow, PositionalField};

pub(super) fn layout() -> ColumnLayout {
    ColumnLayout::Positional {
        skip_rows: 0,
        fields: vec![
            PositionalField { field: "task", title: "Task", index: 0 },
            PositionalField { field: "milestone_type", title: "Milestone Type", index: 1 },
            PositionalField { field: "plan_date", title: "Plan Date", index: 2 },
            PositionalField { field: "actual_date", title: "Actual Date", index: 3 },
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MilestoneType {
    #[serde(rename = "WBS")]
    Wbs,
    #[serde(rename = "Sub Milestone")]
    SubMilestone,
}

impl MilestoneType {
    pub const ALL: [MilestoneType; 2] = [MilestoneType::Wbs, MilestoneType::SubMilestone];

    /// Parse a type cell; spacing, dashes and case are ignored
    pub fn parse(text: &str) -> Option<Self> {
        let key: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "wbs" => Some(MilestoneType::Wbs),
            "submilestone" | "submilestones" | "sub" => Some(MilestoneType::SubMilestone),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MilestoneType::Wbs => "WBS",
            MilestoneType::SubMilestone => "Sub Milestone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MilestoneStatus {
    #[serde(rename = "Completed On Time")]
    CompletedOnTime,
    #[serde(rename = "Delayed")]
    Delayed,
    #[serde(rename = "Overdue (No Actual)")]
    OverdueNoActual,
    #[serde(rename = "Pending")]
    Pending,
}

impl StatusKind for MilestoneStatus {
    const ALL: &'static [Self] = &[
        MilestoneStatus::CompletedOnTime,
        MilestoneStatus::Delayed,
        MilestoneStatus::OverdueNoActual,
        MilestoneStatus::Pending,
    ];

    fn label(self) -> &'static str {
        match self {
            MilestoneStatus::CompletedOnTime => "Completed On Time",
            MilestoneStatus::Delayed => "Delayed",
            MilestoneStatus::OverdueNoActual => "Overdue (No Actual)",
            MilestoneStatus::Pending => "Pending",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            MilestoneStatus::CompletedOnTime => "closed-ontime",
            MilestoneStatus::Delayed => "delayed",
            MilestoneStatus::OverdueNoActual => "overdue",
            MilestoneStatus::Pending => "pending",
        }
    }

    fn group(self) -> StatusGroup {
        match self {
            MilestoneStatus::CompletedOnTime => StatusGroup::Closed,
            MilestoneStatus::Delayed | MilestoneStatus::OverdueNoActual => StatusGroup::Delayed,
            MilestoneStatus::Pending => StatusGroup::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MilestoneRecord {
    pub task: String,
    /// Type cell as typed
    pub type_text: String,
    pub milestone_type: Option<MilestoneType>,
    pub plan_date: Option<NaiveDate>,
    pub actual_date: Option<NaiveDate>,
}

impl TrackerRecord for MilestoneRecord {
    type Status = MilestoneStatus;

    const KIND: TrackerKind = TrackerKind::Milestone;
    const FIELDS: &'static [&'static str] = &["task", "milestone_type", "plan_date", "actual_date"];
    const STATUS_TITLE: &'static str = "Status";
    const ATTRIBUTES: &'static [Attribute] = &[Attribute::MilestoneType];
    const GROUP_FIELD: Option<usize> = Some(0);

    fn from_row(row: &NormalizedRow, ctx: &RowContext<'_>) -> Self {
        let type_text = ctx.text(row, "milestone_type");
        Self {
            task: ctx.text(row, "task"),
            milestone_type: MilestoneType::parse(&type_text),
            type_text,
            plan_date: ctx.date(row, "plan_date"),
            actual_date: ctx.date(row, "actual_date"),
        }
    }

    fn classify(&self, today: NaiveDate) -> MilestoneStatus {
        if let Some(actual) = self.actual_date {
            return match self.plan_date {
                Some(plan) if actual <= plan => MilestoneStatus::CompletedOnTime,
                _ => MilestoneStatus::Delayed,
            };
        }
        match self.plan_date {
            Some(plan) if plan < today => MilestoneStatus::OverdueNoActual,
            _ => MilestoneStatus::Pending,
        }
    }

    fn cells(&self, placeholder: &str) -> Vec<String> {
        vec![
            self.task.clone(),
            self.type_text.clone(),
            format_date(self.plan_date, DAY_MONTH_FORMAT, placeholder),
            format_date(self.actual_date, DAY_MONTH_FORMAT, placeholder),
        ]
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            // Unrecognized types never equal a selected type
            Attribute::MilestoneType => Some(
                self.milestone_type
                    .map(MilestoneType::label)
                    .unwrap_or(self.type_text.as_str()),
            ),
            Attribute::Category | Attribute::Owner => None,
        }
    }
}
