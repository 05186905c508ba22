//! Tracker rule tables
//!
//! The three trackers share one pipeline. Each contributes a record type
//! implementing [`TrackerRecord`] (its column layout, how a row becomes a
//! record, and how a record is classified) and a status enum implementing
//! [`StatusKind`]. Everything downstream (aggregation, filtering, export,
//! rendering) is generic over those two traits.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::normalize::{ColumnLayout, NormalizedRow, NormalizedTable};

pub mod milestone;
pub mod readiness;
pub mod submilestone;

pub use milestone::{MilestoneRecord, MilestoneStatus, MilestoneType};
pub use readiness::{ReadinessRecord, ReadinessStatus};
pub use submilestone::{SubMilestoneRecord, SubMilestoneStatus};

/// Which tracker a configured dashboard runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerKind {
    Readiness,
    Milestone,
    SubMilestone,
}

impl TrackerKind {
    pub const ALL: [TrackerKind; 3] = [
        TrackerKind::Readiness,
        TrackerKind::Milestone,
        TrackerKind::SubMilestone,
    ];

    pub fn default_placeholder(self) -> &'static str {
        match self {
            TrackerKind::Readiness | TrackerKind::Milestone => "—",
            TrackerKind::SubMilestone => "NA",
        }
    }

    pub fn default_refresh_interval_secs(self) -> u64 {
        match self {
            TrackerKind::Readiness => 30,
            TrackerKind::Milestone => 60,
            TrackerKind::SubMilestone => 300,
        }
    }

    /// File name offered for the CSV download of the current view
    pub fn export_file_name(self) -> &'static str {
        match self {
            TrackerKind::Readiness => "process_readiness.csv",
            TrackerKind::Milestone => "milestone_data.csv",
            TrackerKind::SubMilestone => "sub_milestones_data.csv",
        }
    }

    /// Logical fields a column override may name
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            TrackerKind::Readiness => ReadinessRecord::FIELDS,
            TrackerKind::Milestone => MilestoneRecord::FIELDS,
            TrackerKind::SubMilestone => SubMilestoneRecord::FIELDS,
        }
    }

    /// Whether columns are bound by index rather than header text
    pub fn is_positional(self) -> bool {
        matches!(self.layout(&BTreeMap::new()), ColumnLayout::Positional { .. })
    }

    /// Column layout with per-field pattern overrides applied
    ///
    /// Named layouts take an override as the header substring; positional
    /// layouts take it as a column index and ignore values that are not one.
    pub fn layout(self, overrides: &BTreeMap<String, String>) -> ColumnLayout {
        let mut layout = match self {
            TrackerKind::Readiness => readiness::layout(),
            TrackerKind::Milestone => milestone::layout(),
            TrackerKind::SubMilestone => submilestone::layout(),
        };

        match &mut layout {
            ColumnLayout::Named(matchers) => {
                for matcher in matchers.iter_mut() {
                    if let Some(pattern) = overrides.get(matcher.field) {
                        matcher.pattern = pattern.clone();
                    }
                }
            }
            ColumnLayout::Positional { fields, .. } => {
                for field in fields.iter_mut() {
                    if let Some(index) = overrides.get(field.field).and_then(|v| v.trim().parse().ok()) {
                        field.index = index;
                    }
                }
            }
        }

        layout
    }
}

/// Bucket shared by every tracker's statuses, used by views and metric cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    Delayed,
    Open,
    Closed,
}

/// A tracker's status enumeration
pub trait StatusKind: Copy + Eq + Ord + Hash + Debug + Serialize + Send + Sync + 'static {
    /// Every status, in display order
    const ALL: &'static [Self];

    /// Text shown in tables and exports
    fn label(self) -> &'static str;

    /// Stable lowercase identifier, used for CSS classes
    fn slug(self) -> &'static str;

    fn group(self) -> StatusGroup;
}

/// Filterable record attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    MilestoneType,
    Category,
    Owner,
}

/// Per-row inputs that do not come from the row itself
#[derive(Debug, Clone, Copy)]
pub struct RowContext<'a> {
    pub placeholder: &'a str,
    /// Year appended to date cells that carry none
    pub year: i32,
}

impl<'a> RowContext<'a> {
    pub fn new(placeholder: &'a str, today: NaiveDate) -> Self {
        Self {
            placeholder,
            year: today.year(),
        }
    }

    /// Field text, falling back to the placeholder
    pub fn text(&self, row: &NormalizedRow, field: &str) -> String {
        row.get(field).unwrap_or(self.placeholder).to_string()
    }

    pub fn is_present(&self, value: &str) -> bool {
        value != self.placeholder
    }

    pub fn date(&self, row: &NormalizedRow, field: &str) -> Option<NaiveDate> {
        row.get(field)
            .and_then(|cell| crate::dates::parse_date_cell(cell, self.placeholder, self.year))
    }
}

/// One tracker's record type and its classification rules
pub trait TrackerRecord: Clone + Debug + Serialize + Send + Sync + 'static {
    type Status: StatusKind;

    const KIND: TrackerKind;

    /// Logical fields in export and display order
    const FIELDS: &'static [&'static str];

    /// Title of the derived status column
    const STATUS_TITLE: &'static str;

    /// Attributes the filter engine may constrain, in form order
    const ATTRIBUTES: &'static [Attribute] = &[];

    /// Index into [`Self::FIELDS`] whose repeated consecutive values are
    /// shown once in tables
    const GROUP_FIELD: Option<usize> = None;

    fn from_row(row: &NormalizedRow, ctx: &RowContext<'_>) -> Self;

    /// Pure classification against the reference date
    fn classify(&self, today: NaiveDate) -> Self::Status;

    /// Cell text in [`Self::FIELDS`] order
    fn cells(&self, placeholder: &str) -> Vec<String>;

    /// Value compared by the filter engine; `None` when the tracker does not
    /// carry the attribute
    fn attribute(&self, _attribute: Attribute) -> Option<&str> {
        None
    }
}

/// A record paired with its derived status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classified<R: TrackerRecord> {
    #[serde(flatten)]
    pub record: R,
    pub status: R::Status,
}

/// Build typed records from a normalized table
pub fn build_records<R: TrackerRecord>(
    table: &NormalizedTable,
    placeholder: &str,
    today: NaiveDate,
) -> Vec<R> {
    let ctx = RowContext::new(placeholder, today);
    table.rows.iter().map(|row| R::from_row(row, &ctx)).collect()
}

/// Classify every record, preserving order
pub fn classify_all<R: TrackerRecord>(records: Vec<R>, today: NaiveDate) -> Vec<Classified<R>> {
    records
        .into_iter()
        .map(|record| {
            let status = record.classify(today);
            Classified { record, status }
        })
        .collect()
}
