//! Board assembly: one tracker's normalized table turned into the view a
//! page or an API client asks for

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{aggregate, StatusCounts};
use crate::export::column_titles;
use crate::filter::{filter, FilterCriteria};
use crate::normalize::NormalizedTable;
use crate::tracker::{build_records, classify_all, Attribute, Classified, MilestoneType, TrackerRecord};

/// Choices offered for one filterable attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Facet {
    pub attribute: Attribute,
    /// Distinct values, sorted
    pub values: Vec<String>,
}

/// Classified, counted and filtered view of one tracker
#[derive(Debug, Clone, Serialize)]
pub struct Board<R: TrackerRecord> {
    /// Column titles, status column last
    pub columns: Vec<String>,
    /// Rows passing the criteria, in source order
    pub rows: Vec<Classified<R>>,
    /// Counts over every row, unfiltered
    pub counts: StatusCounts<R::Status>,
    /// Counts over the filtered rows
    pub filtered_counts: StatusCounts<R::Status>,
    pub total: usize,
    pub facets: Vec<Facet>,
    pub criteria: FilterCriteria,
    pub today: NaiveDate,
}

impl<R: TrackerRecord> Board<R> {
    /// Build the board for a reference date and filter selection
    pub fn build(
        table: &NormalizedTable,
        placeholder: &str,
        today: NaiveDate,
        criteria: FilterCriteria,
    ) -> Self {
        let classified = classify_all(build_records::<R>(table, placeholder, today), today);
        let counts = aggregate(&classified);
        let mut criteria = criteria;
        let facets = facets(&classified, &mut criteria);
        let rows = filter(&classified, &criteria);
        let filtered_counts = aggregate(&rows);

        Self {
            columns: column_titles::<R>(table),
            total: classified.len(),
            rows,
            counts,
            filtered_counts,
            facets,
            criteria,
            today,
        }
    }
}

/// Facets in form order, each narrowed by the selections before it
///
/// A selection missing from its facet is reset to "All", so `criteria`
/// comes back holding only choices the form can show.
fn facets<R: TrackerRecord>(rows: &[Classified<R>], criteria: &mut FilterCriteria) -> Vec<Facet> {
    let mut scope: Vec<&Classified<R>> = rows.iter().collect();
    let mut facets = Vec::with_capacity(R::ATTRIBUTES.len());

    for &attribute in R::ATTRIBUTES {
        let values: Vec<String> = match attribute {
            Attribute::MilestoneType => MilestoneType::ALL
                .iter()
                .map(|t| t.label().to_string())
                .collect(),
            _ => scope
                .iter()
                .filter_map(|row| row.record.attribute(attribute))
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        match criteria.selection(attribute).map(str::to_string) {
            Some(wanted) if values.contains(&wanted) => {
                scope.retain(|row| row.record.attribute(attribute) == Some(wanted.as_str()));
            }
            Some(_) => criteria.clear(attribute),
            None => {}
        }

        facets.push(Facet { attribute, values });
    }

    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize, CellCleaner};
    use crate::table::RawTable;
    use crate::tracker::{ReadinessRecord, TrackerKind};
    use std::collections::BTreeMap;

    #[test]
    fn test_facets_are_sorted_and_distinct() {
        let raw = RawTable::from_csv_bytes(
            b"Process Category,Owner\nTooling,Zed\nTooling,Ann\nQuality,Ann\n",
        )
        .unwrap();
        let table = normalize(
            &raw,
            &TrackerKind::Readiness.layout(&BTreeMap::new()),
            &CellCleaner::with_default_markers("—"),
        );
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let board = Board::<ReadinessRecord>::build(&table, "—", today, FilterCriteria::default());

        assert_eq!(board.facets[0].attribute, Attribute::Owner);
        assert_eq!(board.facets[0].values, vec!["Ann", "Zed"]);
        assert_eq!(board.facets[1].values, vec!["Quality", "Tooling"]);
        assert_eq!(board.total, 3);
    }

    fn readiness_table() -> NormalizedTable {
        let raw = RawTable::from_csv_bytes(
            b"Process Category,Owner\nTooling,Ann\nQuality,Bob\nLaunch,Ann\n",
        )
        .unwrap();
        normalize(
            &raw,
            &TrackerKind::Readiness.layout(&BTreeMap::new()),
            &CellCleaner::with_default_markers("—"),
        )
    }

    #[test]
    fn test_category_facet_follows_selected_owner() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let criteria = FilterCriteria::from_selections(None, None, Some("Ann"), None);
        let board = Board::<ReadinessRecord>::build(&readiness_table(), "—", today, criteria);

        assert_eq!(board.facets[0].values, vec!["Ann", "Bob"]);
        assert_eq!(board.facets[1].values, vec!["Launch", "Tooling"]);
        assert_eq!(board.rows.len(), 2);
    }

    #[test]
    fn test_selection_outside_its_facet_is_reset() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        // Bob owns no Tooling item
        let criteria = FilterCriteria::from_selections(None, Some("Tooling"), Some("Bob"), None);
        let board = Board::<ReadinessRecord>::build(&readiness_table(), "—", today, criteria);

        assert_eq!(board.criteria.owner.as_deref(), Some("Bob"));
        assert_eq!(board.criteria.category, None);
        assert_eq!(board.rows.len(), 1);
        assert_eq!(board.rows[0].record.category, "Quality");
    }
}
