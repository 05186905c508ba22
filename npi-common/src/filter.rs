//! View filtering
//!
//! Criteria come straight from form selections. Anything unrecognized reads
//! as "All", so a stale bookmark or a hand-edited query string widens the
//! view instead of failing.

use serde::Serialize;

use crate::tracker::{Attribute, Classified, MilestoneType, StatusGroup, StatusKind, TrackerRecord};

/// Status-based view selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusView {
    #[default]
    All,
    OnlyDelayed,
    OnlyOpen,
    OnlyClosed,
}

impl StatusView {
    pub const ALL: [StatusView; 4] = [
        StatusView::All,
        StatusView::OnlyDelayed,
        StatusView::OnlyOpen,
        StatusView::OnlyClosed,
    ];

    /// Parse a view selection; unknown text is `All`
    pub fn parse(text: &str) -> Self {
        let key: String = text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "onlydelayed" | "delayed" | "overdue" | "overduedelayed" => StatusView::OnlyDelayed,
            "onlyopen" | "open" | "onlypending" | "pending" | "onlynotcompleted" | "notcompleted" => {
                StatusView::OnlyOpen
            }
            "onlyclosed" | "closed" | "onlycompleted" | "completed" | "completedontime" => {
                StatusView::OnlyClosed
            }
            _ => StatusView::All,
        }
    }

    /// Query-string value
    pub fn as_str(self) -> &'static str {
        match self {
            StatusView::All => "all",
            StatusView::OnlyDelayed => "only_delayed",
            StatusView::OnlyOpen => "only_open",
            StatusView::OnlyClosed => "only_closed",
        }
    }

    pub fn admits(self, group: StatusGroup) -> bool {
        match self {
            StatusView::All => true,
            StatusView::OnlyDelayed => group == StatusGroup::Delayed,
            StatusView::OnlyOpen => group == StatusGroup::Open,
            StatusView::OnlyClosed => group == StatusGroup::Closed,
        }
    }
}

/// AND-composed filter selections; `None` means "All"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterCriteria {
    pub milestone_type: Option<MilestoneType>,
    pub category: Option<String>,
    pub owner: Option<String>,
    pub status_view: StatusView,
}

impl FilterCriteria {
    /// Build criteria from raw form selections
    pub fn from_selections(
        milestone_type: Option<&str>,
        category: Option<&str>,
        owner: Option<&str>,
        view: Option<&str>,
    ) -> Self {
        Self {
            milestone_type: milestone_type.and_then(MilestoneType::parse),
            category: exact_choice(category),
            owner: exact_choice(owner),
            status_view: view.map(StatusView::parse).unwrap_or_default(),
        }
    }

    /// Selected value for an attribute, if any
    pub fn selection(&self, attribute: Attribute) -> Option<&str> {
        match attribute {
            Attribute::MilestoneType => self.milestone_type.map(MilestoneType::label),
            Attribute::Category => self.category.as_deref(),
            Attribute::Owner => self.owner.as_deref(),
        }
    }

    /// Reset a selection to "All"
    pub fn clear(&mut self, attribute: Attribute) {
        match attribute {
            Attribute::MilestoneType => self.milestone_type = None,
            Attribute::Category => self.category = None,
            Attribute::Owner => self.owner = None,
        }
    }

    /// Criteria with every category or owner that no row carries reset to
    /// "All"
    pub fn restricted_to<R: TrackerRecord>(&self, rows: &[Classified<R>]) -> Self {
        let mut criteria = self.clone();
        for attribute in [Attribute::Category, Attribute::Owner] {
            let known = match criteria.selection(attribute) {
                Some(wanted) => rows
                    .iter()
                    .any(|row| row.record.attribute(attribute) == Some(wanted)),
                None => true,
            };
            if !known {
                criteria.clear(attribute);
            }
        }
        criteria
    }

    pub fn matches<R: TrackerRecord>(&self, row: &Classified<R>) -> bool {
        let attributes = [Attribute::MilestoneType, Attribute::Category, Attribute::Owner];
        let attributes_match = attributes.iter().all(|&attribute| {
            match (self.selection(attribute), row.record.attribute(attribute)) {
                (Some(wanted), Some(value)) => wanted == value,
                // Unselected, or the tracker does not carry the attribute
                _ => true,
            }
        });

        attributes_match && self.status_view.admits(row.status.group())
    }
}

fn exact_choice(selection: Option<&str>) -> Option<String> {
    match selection.map(str::trim) {
        None | Some("") => None,
        Some(choice) if choice.eq_ignore_ascii_case("all") => None,
        Some(choice) => Some(choice.to_string()),
    }
}

/// Rows matching every criterion, in input order
///
/// A category or owner that appears in no row is ignored.
pub fn filter<R: TrackerRecord>(rows: &[Classified<R>], criteria: &FilterCriteria) -> Vec<Classified<R>> {
    let criteria = criteria.restricted_to(rows);
    rows.iter()
        .filter(|row| criteria.matches(*row))
        .cloned()
        .collect()
}
