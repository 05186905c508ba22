//! Process readiness tracker
//!
//! One row per readiness item: a process category, an optional sub item,
//! an owner, a target date and the status typed into the sheet. The derived
//! status combines "is it closed" with "is the target date behind us".

use chrono::NaiveDate;
use serde::Serialize;

use super::{Attribute, RowContext, StatusGroup, StatusKind, TrackerKind, TrackerRecord};
use crate::dates::DAY_MONTH_YEAR_FORMAT;
use crate::normalize::{ColumnLayout, FieldMatcher, NormalizedRow};

/// Sheet status values that count as closed (compared lowercased, trimmed)
pub const CLOSED_SYNONYMS: &[&str] = &["closed", "close", "done"];

pub(super) fn layout() -> ColumnLayout {
    ColumnLayout::Named(vec![
        FieldMatcher::new("category", "Process Category", "process category")
            .with_first_column_fallback(),
        FieldMatcher::new("sub_item", "Sub Item", "sub"),
        FieldMatcher::new("owner", "Owner", "owner"),
        FieldMatcher::new("target_date", "Target Date", "target"),
        FieldMatcher::new("status", "Status", "status"),
        FieldMatcher::new("remarks", "Remarks", "remark"),
    ])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ReadinessStatus {
    #[serde(rename = "Closed On Time")]
    ClosedOnTime,
    #[serde(rename = "Closed (Late)")]
    ClosedLate,
    #[serde(rename = "NOT CLOSED – DELAYED")]
    Delayed,
    #[serde(rename = "Open")]
    Open,
}

impl StatusKind for ReadinessStatus {
    const ALL: &'static [Self] = &[
        ReadinessStatus::ClosedOnTime,
        ReadinessStatus::ClosedLate,
        ReadinessStatus::Delayed,
        ReadinessStatus::Open,
    ];

    fn label(self) -> &'static str {
        match self {
            ReadinessStatus::ClosedOnTime => "Closed On Time",
            ReadinessStatus::ClosedLate => "Closed (Late)",
            ReadinessStatus::Delayed => "NOT CLOSED – DELAYED",
            ReadinessStatus::Open => "Open",
        }
    }

    fn slug(self) -> &'static str {
        match self {
            ReadinessStatus::ClosedOnTime => "closed-ontime",
            ReadinessStatus::ClosedLate => "closed-late",
            ReadinessStatus::Delayed => "delayed",
            ReadinessStatus::Open => "open",
        }
    }

    fn group(self) -> StatusGroup {
        match self {
            ReadinessStatus::ClosedOnTime | ReadinessStatus::ClosedLate => StatusGroup::Closed,
            ReadinessStatus::Delayed => StatusGroup::Delayed,
            ReadinessStatus::Open => StatusGroup::Open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessRecord {
    pub category: String,
    pub sub_item: String,
    pub owner: String,
    /// Target cell as typed, kept for display when it does not parse
    pub target_text: String,
    pub target_date: Option<NaiveDate>,
    pub raw_status: String,
    pub remarks: String,
    #[serde(skip)]
    raw_status_present: bool,
}

impl ReadinessRecord {
    /// Whether the sheet status marks the item closed
    pub fn is_closed(&self) -> bool {
        if !self.raw_status_present {
            return false;
        }
        let status = self.raw_status.trim().to_lowercase();
        CLOSED_SYNONYMS.contains(&status.as_str())
    }

    /// Target date strictly before the reference date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.target_date, Some(target) if target < today)
    }
}

impl TrackerRecord for ReadinessRecord {
    type Status = ReadinessStatus;

    const KIND: TrackerKind = TrackerKind::Readiness;
    const FIELDS: &'static [&'static str] =
        &["category", "sub_item", "owner", "target_date", "status", "remarks"];
    const STATUS_TITLE: &'static str = "Final Status";
    const ATTRIBUTES: &'static [Attribute] = &[Attribute::Owner, Attribute::Category];
    const GROUP_FIELD: Option<usize> = Some(0);

    fn from_row(row: &NormalizedRow, ctx: &RowContext<'_>) -> Self {
        let raw_status = ctx.text(row, "status");
        Self {
            category: ctx.text(row, "category"),
            sub_item: ctx.text(row, "sub_item"),
            owner: ctx.text(row, "owner"),
            target_text: ctx.text(row, "target_date"),
            target_date: ctx.date(row, "target_date"),
            raw_status_present: ctx.is_present(&raw_status),
            raw_status,
            remarks: ctx.text(row, "remarks"),
        }
    }

    fn classify(&self, today: NaiveDate) -> ReadinessStatus {
        let closed = self.is_closed();
        let overdue = self.is_overdue(today);

        if closed && !overdue {
            return ReadinessStatus::ClosedOnTime;
        }
        if closed && overdue {
            return ReadinessStatus::ClosedLate;
        }
        if overdue {
            return ReadinessStatus::Delayed;
        }
        ReadinessStatus::Open
    }

    fn cells(&self, _placeholder: &str) -> Vec<String> {
        let target = match self.target_date {
            Some(date) => date.format(DAY_MONTH_YEAR_FORMAT).to_string(),
            None => self.target_text.clone(),
        };
        vec![
            self.category.clone(),
            self.sub_item.clone(),
            self.owner.clone(),
            target,
            self.raw_status.clone(),
            self.remarks.clone(),
        ]
    }

    fn attribute(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::Category => Some(self.category.as_str()),
            Attribute::Owner => Some(self.owner.as_str()),
            Attribute::MilestoneType => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACEHOLDER: &str = "—";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(status: &str, target: Option<NaiveDate>) -> ReadinessRecord {
        let mut row = NormalizedRow::default();
        row.insert("category", "Tooling".to_string());
        row.insert("status", status.to_string());
        row.insert(
            "target_date",
            target
                .map(|d| d.format("%d-%m-%Y").to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        );
        ReadinessRecord::from_row(&row, &RowContext::new(PLACEHOLDER, date(2025, 6, 1)))
    }

    #[test]
    fn test_closed_late_scenario() {
        let r = record("Closed", Some(date(2025, 1, 1)));
        assert_eq!(r.classify(date(2025, 6, 1)), ReadinessStatus::ClosedLate);
    }

    #[test]
    fn test_closed_on_time() {
        let r = record("done", Some(date(2025, 7, 1)));
        assert_eq!(r.classify(date(2025, 6, 1)), ReadinessStatus::ClosedOnTime);
    }

    #[test]
    fn test_closed_without_target_is_on_time() {
        let r = record("  CLOSE ", None);
        assert_eq!(r.classify(date(2025, 6, 1)), ReadinessStatus::ClosedOnTime);
    }

    #[test]
    fn test_overdue_boundary_is_strict() {
        let today = date(2025, 6, 1);
        assert_eq!(record("Open", Some(today)).classify(today), ReadinessStatus::Open);
        assert_eq!(
            record("Open", Some(date(2025, 5, 31))).classify(today),
            ReadinessStatus::Delayed
        );
    }

    #[test]
    fn test_only_listed_synonyms_close() {
        let today = date(2025, 6, 1);
        let past = Some(date(2025, 1, 1));
        assert_eq!(record("Completed", past).classify(today), ReadinessStatus::Delayed);
        assert_eq!(record("closed.", past).classify(today), ReadinessStatus::Delayed);
    }

    #[test]
    fn test_all_fields_absent_is_open() {
        let row = NormalizedRow::default();
        let r = ReadinessRecord::from_row(&row, &RowContext::new(PLACEHOLDER, date(2025, 6, 1)));
        assert_eq!(r.category, PLACEHOLDER);
        assert_eq!(r.target_date, None);
        assert_eq!(r.classify(date(2025, 6, 1)), ReadinessStatus::Open);
    }

    #[test]
    fn test_placeholder_equal_to_synonym_does_not_close() {
        let mut row = NormalizedRow::default();
        row.insert("status", "done".to_string());
        let r = ReadinessRecord::from_row(&row, &RowContext::new("done", date(2025, 6, 1)));
        assert!(!r.is_closed());
    }

    #[test]
    fn test_cells_show_parsed_target_or_raw_text() {
        let r = record("Open", Some(date(2025, 3, 5)));
        assert_eq!(r.cells(PLACEHOLDER)[3], "05-Mar-2025");

        let mut row = NormalizedRow::default();
        row.insert("target_date", "TBD".to_string());
        let r = ReadinessRecord::from_row(&row, &RowContext::new(PLACEHOLDER, date(2025, 6, 1)));
        assert_eq!(r.cells(PLACEHOLDER)[3], "TBD");
    }
}
