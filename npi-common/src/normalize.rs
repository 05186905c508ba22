//! Row normalization
//!
//! Maps raw sheet rows onto a tracker's logical fields. Named layouts resolve
//! fields against header text; positional layouts read fixed column indices.
//! Every field of every row comes out either as trimmed text or as the
//! tracker's placeholder token.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::table::RawTable;

/// Cell spellings treated as missing, on top of blank cells
///
/// These are the strings spreadsheet tooling conventionally reads as "not
/// available".
pub const DEFAULT_MISSING_MARKERS: &[&str] = &[
    "#N/A", "N/A", "NA", "n/a", "NULL", "null", "NaN", "nan", "None", "<NA>",
];

/// A logical field resolved by header text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatcher {
    /// Logical field name
    pub field: &'static str,
    /// Column title used when no header matches
    pub title: &'static str,
    /// Case-insensitive header text; exact match wins over substring match
    pub pattern: String,
    /// Use the first column when nothing matches
    pub fallback_first_column: bool,
}

impl FieldMatcher {
    pub fn new(field: &'static str, title: &'static str, pattern: impl Into<String>) -> Self {
        Self {
            field,
            title,
            pattern: pattern.into(),
            fallback_first_column: false,
        }
    }

    pub fn with_first_column_fallback(mut self) -> Self {
        self.fallback_first_column = true;
        self
    }
}

/// A logical field read from a fixed column index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionalField {
    pub field: &'static str,
    pub title: &'static str,
    pub index: usize,
}

/// How raw columns map onto logical fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLayout {
    /// Resolve fields from the header row; fully blank rows are dropped
    Named(Vec<FieldMatcher>),
    /// Read fixed indices, skipping leading data rows
    Positional {
        skip_rows: usize,
        fields: Vec<PositionalField>,
    },
}

/// Cell cleaning rules for one tracker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellCleaner {
    placeholder: String,
    missing_markers: Vec<String>,
}

impl CellCleaner {
    pub fn new(placeholder: impl Into<String>, missing_markers: Vec<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            missing_markers,
        }
    }

    /// Cleaner with the conventional missing markers
    pub fn with_default_markers(placeholder: impl Into<String>) -> Self {
        Self::new(
            placeholder,
            DEFAULT_MISSING_MARKERS.iter().map(|m| m.to_string()).collect(),
        )
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_missing(&self, cell: &str) -> bool {
        let text = cell.trim();
        text.is_empty()
            || text == self.placeholder
            || self.missing_markers.iter().any(|marker| marker == text)
    }

    /// Trimmed cell text, or the placeholder when the cell is missing
    pub fn clean(&self, cell: Option<&str>) -> String {
        match cell {
            Some(text) if !self.is_missing(text) => text.trim().to_string(),
            _ => self.placeholder.clone(),
        }
    }
}

/// A logical field after header resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedColumn {
    pub field: &'static str,
    /// Source header text when resolved, otherwise the default title
    pub title: String,
    /// Raw column index, `None` when the field is absent from the source
    pub source_index: Option<usize>,
}

/// One row keyed by logical field name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    values: BTreeMap<&'static str, String>,
}

impl NormalizedRow {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: &'static str, value: String) {
        self.values.insert(field, value);
    }
}

/// Normalized rows plus the resolved column set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTable {
    pub columns: Vec<ResolvedColumn>,
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    /// Display title for a logical field
    pub fn title(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| c.title.as_str())
    }

    /// Whether the field was found in the source
    pub fn is_resolved(&self, field: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.field == field && c.source_index.is_some())
    }
}

/// Normalize a raw table according to a column layout
pub fn normalize(table: &RawTable, layout: &ColumnLayout, cleaner: &CellCleaner) -> NormalizedTable {
    match layout {
        ColumnLayout::Named(matchers) => normalize_named(table, matchers, cleaner),
        ColumnLayout::Positional { skip_rows, fields } => {
            normalize_positional(table, *skip_rows, fields, cleaner)
        }
    }
}

fn normalize_named(
    table: &RawTable,
    matchers: &[FieldMatcher],
    cleaner: &CellCleaner,
) -> NormalizedTable {
    let columns = resolve_columns(&table.header, matchers);

    for column in columns.iter().filter(|c| c.source_index.is_none()) {
        debug!(field = column.field, "No header matches field; treating as absent");
    }

    let rows = table
        .rows
        .iter()
        .filter(|row| !row.iter().all(|cell| cleaner.is_missing(cell)))
        .map(|row| build_row(row, &columns, cleaner))
        .collect();

    NormalizedTable { columns, rows }
}

fn normalize_positional(
    table: &RawTable,
    skip_rows: usize,
    fields: &[PositionalField],
    cleaner: &CellCleaner,
) -> NormalizedTable {
    let columns: Vec<ResolvedColumn> = fields
        .iter()
        .map(|f| ResolvedColumn {
            field: f.field,
            title: f.title.to_string(),
            source_index: Some(f.index),
        })
        .collect();

    let rows = table
        .rows
        .iter()
        .skip(skip_rows)
        .map(|row| build_row(row, &columns, cleaner))
        .collect();

    NormalizedTable { columns, rows }
}

fn build_row(raw: &[String], columns: &[ResolvedColumn], cleaner: &CellCleaner) -> NormalizedRow {
    let mut row = NormalizedRow::default();
    for column in columns {
        let cell = column
            .source_index
            .and_then(|i| raw.get(i))
            .map(String::as_str);
        row.insert(column.field, cleaner.clean(cell));
    }
    row
}

/// Resolve each matcher to a header index
///
/// Pass 1 takes exact (case-insensitive) header matches, pass 2 the first
/// unclaimed header containing the pattern. Duplicate header names only
/// count at their first occurrence.
fn resolve_columns(header: &[String], matchers: &[FieldMatcher]) -> Vec<ResolvedColumn> {
    let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

    let mut seen = HashSet::new();
    let eligible: Vec<bool> = header
        .iter()
        .map(|h| seen.insert(h.trim().to_string()))
        .collect();

    let mut claimed = vec![false; header.len()];
    let mut resolved: Vec<Option<usize>> = vec![None; matchers.len()];

    for (slot, matcher) in resolved.iter_mut().zip(matchers) {
        let pattern = matcher.pattern.trim().to_lowercase();
        if pattern.is_empty() {
            continue;
        }
        if let Some(i) = (0..names.len()).find(|&i| eligible[i] && !claimed[i] && names[i] == pattern) {
            claimed[i] = true;
            *slot = Some(i);
        }
    }

    for (slot, matcher) in resolved.iter_mut().zip(matchers) {
        let pattern = matcher.pattern.trim().to_lowercase();
        if slot.is_some() || pattern.is_empty() {
            continue;
        }
        if let Some(i) =
            (0..names.len()).find(|&i| eligible[i] && !claimed[i] && names[i].contains(&pattern))
        {
            claimed[i] = true;
            *slot = Some(i);
        }
    }

    matchers
        .iter()
        .zip(resolved)
        .map(|(matcher, index)| {
            let index = index.or_else(|| {
                (matcher.fallback_first_column && !header.is_empty()).then_some(0)
            });
            ResolvedColumn {
                field: matcher.field,
                title: index
                    .map(|i| header[i].trim().to_string())
                    .unwrap_or_else(|| matcher.title.to_string()),
                source_index: index,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn table(header: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(strings(header), rows.iter().map(|r| strings(r)).collect())
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let raw = table(&["Task Owner", "Target Date"], &[&["Ann", "05-03"]]);
        let layout = ColumnLayout::Named(vec![
            FieldMatcher::new("owner", "Owner", "owner"),
            FieldMatcher::new("target", "Target Date", "TARGET"),
        ]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert_eq!(out.title("owner"), Some("Task Owner"));
        assert_eq!(out.rows[0].get("owner"), Some("Ann"));
        assert_eq!(out.rows[0].get("target"), Some("05-03"));
    }

    #[test]
    fn test_exact_match_beats_earlier_substring_match() {
        let raw = table(&["CWV", "CW"], &[&["12", "14"]]);
        let layout = ColumnLayout::Named(vec![
            FieldMatcher::new("cwv", "CWV", "CWV"),
            FieldMatcher::new("cw", "CW", "CW"),
        ]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("NA"));

        assert_eq!(out.rows[0].get("cwv"), Some("12"));
        assert_eq!(out.rows[0].get("cw"), Some("14"));
    }

    #[test]
    fn test_unmatched_field_is_placeholder_for_all_rows() {
        let raw = table(&["Task"], &[&["a"], &["b"]]);
        let layout = ColumnLayout::Named(vec![
            FieldMatcher::new("task", "Task", "task"),
            FieldMatcher::new("owner", "Owner", "owner"),
        ]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert!(!out.is_resolved("owner"));
        assert_eq!(out.title("owner"), Some("Owner"));
        assert!(out.rows.iter().all(|r| r.get("owner") == Some("—")));
    }

    #[test]
    fn test_first_column_fallback() {
        let raw = table(&["Area", "Owner"], &[&["Tooling", "Ann"]]);
        let layout = ColumnLayout::Named(vec![
            FieldMatcher::new("category", "Process Category", "process category")
                .with_first_column_fallback(),
        ]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert_eq!(out.title("category"), Some("Area"));
        assert_eq!(out.rows[0].get("category"), Some("Tooling"));
    }

    #[test]
    fn test_duplicate_headers_collapse_to_first() {
        let raw = table(&["Owner", "Owner", "Status"], &[&["Ann", "Bob", "Open"]]);
        let layout = ColumnLayout::Named(vec![
            FieldMatcher::new("owner", "Owner", "owner"),
            FieldMatcher::new("owner2", "Owner", "owner"),
        ]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert_eq!(out.rows[0].get("owner"), Some("Ann"));
        // Second header named "Owner" is not a candidate
        assert_eq!(out.rows[0].get("owner2"), Some("—"));
    }

    #[test]
    fn test_cells_trimmed_and_missing_filled() {
        let raw = table(
            &["Task", "Remarks"],
            &[&["  Build  ", "   "], &["Ship", "N/A"], &["Test"]],
        );
        let layout = ColumnLayout::Named(vec![
            FieldMatcher::new("task", "Task", "task"),
            FieldMatcher::new("remarks", "Remarks", "remark"),
        ]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert_eq!(out.rows[0].get("task"), Some("Build"));
        assert_eq!(out.rows[0].get("remarks"), Some("—"));
        assert_eq!(out.rows[1].get("remarks"), Some("—"));
        assert_eq!(out.rows[2].get("remarks"), Some("—"));
    }

    #[test]
    fn test_blank_rows_dropped_in_named_layout() {
        let raw = table(&["Task", "Owner"], &[&["", " "], &["Build", ""], &["NA", ""]]);
        let layout = ColumnLayout::Named(vec![FieldMatcher::new("task", "Task", "task")]);
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].get("task"), Some("Build"));
    }

    #[test]
    fn test_positional_layout_ignores_header_text() {
        let raw = table(
            &["ignored", "ignored"],
            &[&["Task", "Type", "Plan"], &["Build", "WBS"], &["Ship", "WBS", "05-03", "06-03"]],
        );
        let layout = ColumnLayout::Positional {
            skip_rows: 1,
            fields: vec![
                PositionalField { field: "task", title: "Task", index: 0 },
                PositionalField { field: "plan", title: "Plan Date", index: 2 },
                PositionalField { field: "actual", title: "Actual Date", index: 3 },
            ],
        };
        let out = normalize(&raw, &layout, &CellCleaner::with_default_markers("—"));

        assert_eq!(out.rows.len(), 2);
        assert_eq!(out.rows[0].get("task"), Some("Build"));
        assert_eq!(out.rows[0].get("plan"), Some("—"));
        assert_eq!(out.rows[1].get("actual"), Some("06-03"));
        assert_eq!(out.title("plan"), Some("Plan Date"));
    }
}
