//! End-to-end tracker pipeline: CSV text -> normalize -> classify ->
//! aggregate -> filter -> export

use chrono::NaiveDate;
use npi_common::board::Board;
use npi_common::export::{column_titles, write_csv};
use npi_common::normalize::{normalize, CellCleaner, NormalizedTable};
use npi_common::tracker::{
    build_records, classify_all, MilestoneRecord, MilestoneStatus, MilestoneType, ReadinessRecord,
    ReadinessStatus, SubMilestoneRecord, SubMilestoneStatus, TrackerKind,
};
use npi_common::{aggregate, filter, FilterCriteria, RawTable, StatusView};
use std::collections::BTreeMap;

const READINESS_CSV: &str = "\
Process Category,Sub Process,Owner,Target Date,Status,Remarks
E-NRE,Quote,Ann,01-01-2025,Closed,
E-NRE,PO,Bob,31-05-2025,Open,waiting on vendor
F-NRE,Fixture,Ann,01-06-2025,,
F-NRE,Stencil,Cho,10-06-2025,done,
,,,,,
Quality,PFMEA,Bob,,Open,
";

const MILESTONE_CSV: &str = "\
Task,Milestone Type,Plan,Actual
Proto build,WBS,10-02,
Proto build,Sub Milestone,05-03,05-03
Pilot run,WBS,20-03,25-03
Pilot run,Sub Milestone,,
";

const SUB_MILESTONE_CSV: &str = "\
Sub-Milestones,Plan,CWV,CW,Actual,Remarks,Lead time
Tool release,wk10,12,11,wk11,,2w
Fixture sign-off,wk12,14,,,pending QA,
";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn normalized(kind: TrackerKind, csv: &str) -> NormalizedTable {
    let raw = RawTable::from_csv_bytes(csv.as_bytes()).unwrap();
    normalize(
        &raw,
        &kind.layout(&BTreeMap::new()),
        &CellCleaner::with_default_markers(kind.default_placeholder()),
    )
}

#[test]
fn test_readiness_statuses_and_counts() {
    let today = date(2025, 6, 1);
    let table = normalized(TrackerKind::Readiness, READINESS_CSV);
    let rows = classify_all(build_records::<ReadinessRecord>(&table, "—", today), today);

    // Fully blank row dropped
    assert_eq!(rows.len(), 5);

    let statuses: Vec<ReadinessStatus> = rows.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            ReadinessStatus::ClosedLate,
            ReadinessStatus::Delayed,
            ReadinessStatus::Open,
            ReadinessStatus::ClosedOnTime,
            ReadinessStatus::Open,
        ]
    );

    let counts = aggregate(&rows);
    assert_eq!(counts.total(), rows.len());
    assert_eq!(counts.get(ReadinessStatus::Open), 2);
    assert_eq!(counts.get(ReadinessStatus::Delayed), 1);
}

#[test]
fn test_readiness_filters_compose() {
    let today = date(2025, 6, 1);
    let table = normalized(TrackerKind::Readiness, READINESS_CSV);
    let rows = classify_all(build_records::<ReadinessRecord>(&table, "—", today), today);

    let ann = filter(&rows, &FilterCriteria::from_selections(None, None, Some("Ann"), None));
    assert_eq!(ann.len(), 2);

    let ann_closed = filter(
        &rows,
        &FilterCriteria::from_selections(None, None, Some("Ann"), Some("Only Closed")),
    );
    assert_eq!(ann_closed.len(), 1);
    assert_eq!(ann_closed[0].record.sub_item, "Quote");

    let fnre_open = filter(
        &rows,
        &FilterCriteria::from_selections(None, Some("F-NRE"), None, Some("Only Open")),
    );
    assert_eq!(fnre_open.len(), 1);
    assert_eq!(fnre_open[0].record.sub_item, "Fixture");

    // Milestone type selection does not constrain a readiness board
    let ignored = filter(&rows, &FilterCriteria::from_selections(Some("WBS"), None, None, None));
    assert_eq!(ignored, rows);
}

#[test]
fn test_filter_all_is_identity() {
    let today = date(2025, 6, 1);
    let table = normalized(TrackerKind::Readiness, READINESS_CSV);
    let rows = classify_all(build_records::<ReadinessRecord>(&table, "—", today), today);

    let criteria = FilterCriteria::from_selections(None, Some("All"), None, None);
    assert_eq!(filter(&rows, &criteria), rows);
}

#[test]
fn test_milestone_board() {
    let today = date(2025, 3, 1);
    let table = normalized(TrackerKind::Milestone, MILESTONE_CSV);
    let board = Board::<MilestoneRecord>::build(&table, "—", today, FilterCriteria::default());

    let statuses: Vec<MilestoneStatus> = board.rows.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            MilestoneStatus::OverdueNoActual,
            MilestoneStatus::CompletedOnTime,
            MilestoneStatus::Delayed,
            MilestoneStatus::Pending,
        ]
    );
    assert_eq!(board.rows[0].record.plan_date, Some(date(2025, 2, 10)));
    assert_eq!(board.counts.total(), board.total);

    let wbs_delayed = Board::<MilestoneRecord>::build(
        &table,
        "—",
        today,
        FilterCriteria::from_selections(Some("WBS"), None, None, Some("Overdue / Delayed")),
    );
    assert_eq!(wbs_delayed.rows.len(), 2);
    assert!(wbs_delayed
        .rows
        .iter()
        .all(|r| r.record.milestone_type == Some(MilestoneType::Wbs)));
    // Unfiltered counts stay whole
    assert_eq!(wbs_delayed.counts.total(), 4);
    assert_eq!(wbs_delayed.filtered_counts.total(), 2);
}

#[test]
fn test_sub_milestone_completion() {
    let today = date(2025, 3, 1);
    let table = normalized(TrackerKind::SubMilestone, SUB_MILESTONE_CSV);
    let board = Board::<SubMilestoneRecord>::build(&table, "NA", today, FilterCriteria::default());

    assert_eq!(board.rows[0].status, SubMilestoneStatus::Completed);
    assert_eq!(board.rows[1].status, SubMilestoneStatus::NotCompleted);
    assert_eq!(board.rows[1].record.actual, "NA");
    assert_eq!(board.counts.get(SubMilestoneStatus::NotCompleted), 1);
    // "CW" is not mistaken for "CWV"
    assert_eq!(board.rows[0].record.cwv, "12");
    assert_eq!(board.rows[0].record.cw, "11");
    assert_eq!(board.rows[1].record.cw, "NA");

    let only_open = filter(
        &board.rows,
        &FilterCriteria { status_view: StatusView::OnlyOpen, ..Default::default() },
    );
    assert_eq!(only_open.len(), 1);
}

#[test]
fn test_adding_not_completed_row_increments_count() {
    let today = date(2025, 3, 1);
    let table = normalized(TrackerKind::SubMilestone, SUB_MILESTONE_CSV);
    let before = Board::<SubMilestoneRecord>::build(&table, "NA", today, FilterCriteria::default());

    let extended = format!("{}Gauge R&R,wk14,,,NA,,\n", SUB_MILESTONE_CSV);
    let table = normalized(TrackerKind::SubMilestone, &extended);
    let after = Board::<SubMilestoneRecord>::build(&table, "NA", today, FilterCriteria::default());

    assert_eq!(
        after.counts.get(SubMilestoneStatus::NotCompleted),
        before.counts.get(SubMilestoneStatus::NotCompleted) + 1
    );
}

#[test]
fn test_missing_columns_fall_through() {
    // No target or status column: every row is Open
    let today = date(2025, 6, 1);
    let table = normalized(TrackerKind::Readiness, "Area,Owner\nTooling,Ann\nQuality,Bob\n");
    let board = Board::<ReadinessRecord>::build(&table, "—", today, FilterCriteria::default());

    assert_eq!(board.counts.get(ReadinessStatus::Open), 2);
    assert_eq!(board.rows[0].record.category, "Tooling");
    assert_eq!(board.columns[0], "Area");
    assert_eq!(board.columns.last().map(String::as_str), Some("Final Status"));
}

#[test]
fn test_readiness_export_uses_source_titles() {
    let today = date(2025, 6, 1);
    let table = normalized(TrackerKind::Readiness, READINESS_CSV);
    let rows = classify_all(build_records::<ReadinessRecord>(&table, "—", today), today);
    let bytes = write_csv(&column_titles::<ReadinessRecord>(&table), &rows, "—").unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let mut lines = text.lines();

    assert_eq!(
        lines.next(),
        Some("Process Category,Sub Process,Owner,Target Date,Status,Remarks,Final Status")
    );
    assert_eq!(
        lines.next(),
        Some("E-NRE,Quote,Ann,01-Jan-2025,Closed,—,Closed (Late)")
    );
}

#[test]
fn test_unknown_category_and_owner_select_all() {
    let today = date(2025, 6, 1);
    let table = normalized(
        TrackerKind::Readiness,
        "Process Category,Owner\nTooling,Ann\nQuality,Bob\n",
    );
    let rows = classify_all(build_records::<ReadinessRecord>(&table, "—", today), today);
    let criteria =
        FilterCriteria::from_selections(None, Some("Retired Category"), Some("Gone Owner"), None);

    assert_eq!(filter(&rows, &criteria), rows);

    let board = Board::<ReadinessRecord>::build(&table, "—", today, criteria);
    assert_eq!(board.rows.len(), 2);
    assert_eq!(board.criteria, FilterCriteria::default());
}
