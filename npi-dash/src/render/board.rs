//! Tracker page

use chrono::{DateTime, Local};
use npi_common::tracker::Attribute;
use npi_common::{Board, StatusGroup, StatusKind, StatusView, TrackerKind, TrackerRecord};

use super::{escape_html, page, UPDATED_FORMAT};

/// Everything a tracker page shows
pub struct TrackerView<'a, R: TrackerRecord> {
    pub id: &'a str,
    pub title: &'a str,
    pub refresh_secs: u64,
    pub updated_at: Option<DateTime<Local>>,
    pub fetch_error: Option<&'a str>,
    pub board: &'a Board<R>,
    pub placeholder: &'a str,
    /// Current query string, without the leading `?`
    pub query: &'a str,
}

pub fn tracker_page<R: TrackerRecord>(view: &TrackerView<'_, R>) -> String {
    let mut body = String::new();

    body.push_str(&header(view));
    body.push_str(&metric_cards(view.board));
    body.push_str(&filter_form(view.board));
    body.push_str(&source_warning(view));
    body.push_str(&urgent_banner(view.board));
    body.push_str(&table(view.board, view.placeholder));
    body.push_str(&download_link(view));

    page(view.title, &body, Some(view.id))
}

fn header<R: TrackerRecord>(view: &TrackerView<'_, R>) -> String {
    let updated = view
        .updated_at
        .map(|at| at.format(UPDATED_FORMAT).to_string())
        .unwrap_or_else(|| "never".to_string());

    format!(
        r#"<div class="banner"><h1>{title}</h1><p>Updated: {updated} &bull; Auto-refresh every {secs}s</p></div>
<p><a href="/">&larr; All trackers</a></p>
"#,
        title = escape_html(view.title),
        updated = updated,
        secs = view.refresh_secs,
    )
}

fn metric_cards<R: TrackerRecord>(board: &Board<R>) -> String {
    let counts = &board.counts;
    let cards: Vec<(&str, &str, usize)> = match R::KIND {
        TrackerKind::Readiness => vec![
            ("metric-delayed", "Delayed", counts.group_total(StatusGroup::Delayed)),
            ("metric-open", "Open", counts.group_total(StatusGroup::Open)),
            ("metric-closed", "Closed", counts.group_total(StatusGroup::Closed)),
        ],
        TrackerKind::Milestone => vec![
            ("metric-delayed", "Overdue / Delayed", counts.group_total(StatusGroup::Delayed)),
            ("metric-open", "Pending", counts.group_total(StatusGroup::Open)),
        ],
        TrackerKind::SubMilestone => vec![
            ("metric-total", "Total Sub-Milestones", counts.total()),
            ("metric-closed", "Completed", counts.group_total(StatusGroup::Closed)),
        ],
    };

    let mut html = String::from(r#"<div class="cards">"#);
    for (class, label, value) in cards {
        html.push_str(&format!(
            r#"<div class="metric {class}"><p>{label}</p><h2>{value}</h2></div>"#
        ));
    }
    html.push_str("</div>\n");
    html
}

fn view_choices(kind: TrackerKind) -> &'static [(StatusView, &'static str)] {
    match kind {
        TrackerKind::Readiness => &[
            (StatusView::All, "All Items"),
            (StatusView::OnlyDelayed, "Only Delayed"),
            (StatusView::OnlyOpen, "Only Open"),
            (StatusView::OnlyClosed, "Only Closed"),
        ],
        TrackerKind::Milestone => &[
            (StatusView::All, "All"),
            (StatusView::OnlyDelayed, "Overdue / Delayed"),
            (StatusView::OnlyOpen, "Pending"),
            (StatusView::OnlyClosed, "Completed On Time"),
        ],
        TrackerKind::SubMilestone => &[],
    }
}

fn attribute_param(attribute: Attribute) -> (&'static str, &'static str) {
    match attribute {
        Attribute::MilestoneType => ("milestone_type", "Milestone Type"),
        Attribute::Category => ("category", "Process Category"),
        Attribute::Owner => ("owner", "Owner"),
    }
}

fn filter_form<R: TrackerRecord>(board: &Board<R>) -> String {
    let views = view_choices(R::KIND);
    if board.facets.is_empty() && views.is_empty() {
        return String::new();
    }

    let mut html = String::from(r#"<form class="filters" method="get">"#);

    for facet in &board.facets {
        let (param, label) = attribute_param(facet.attribute);
        let selected = board.criteria.selection(facet.attribute);
        html.push_str(&format!(r#"<label>{label}<select name="{param}"><option value="All">All</option>"#));
        for value in &facet.values {
            let marker = if selected == Some(value.as_str()) { " selected" } else { "" };
            let value = escape_html(value);
            html.push_str(&format!(r#"<option value="{value}"{marker}>{value}</option>"#));
        }
        html.push_str("</select></label>");
    }

    if !views.is_empty() {
        html.push_str(r#"<label>View<select name="view">"#);
        for (view, label) in views {
            let marker = if *view == board.criteria.status_view { " selected" } else { "" };
            html.push_str(&format!(
                r#"<option value="{}"{}>{}</option>"#,
                view.as_str(),
                marker,
                label
            ));
        }
        html.push_str("</select></label>");
    }

    html.push_str(r#"<button type="submit">Apply</button></form>"#);
    html.push('\n');
    html
}

fn source_warning<R: TrackerRecord>(view: &TrackerView<'_, R>) -> String {
    match view.fetch_error {
        Some(error) => format!(
            r#"<div class="alert alert-warning">⚠️ Could not load tracker data: {}. Retrying every {}s.</div>
"#,
            escape_html(error),
            view.refresh_secs
        ),
        None if view.board.total == 0 => {
            r#"<div class="alert alert-warning">⚠️ No data found in the source sheet.</div>
"#
            .to_string()
        }
        None => String::new(),
    }
}

/// Readiness alerts on the filtered view, milestones on the whole set
fn urgent_banner<R: TrackerRecord>(board: &Board<R>) -> String {
    let (urgent, alert, clear) = match R::KIND {
        TrackerKind::Readiness => (
            board.filtered_counts.group_total(StatusGroup::Delayed),
            "items DELAYED &amp; NOT CLOSED!",
            "✅ All items are On Track or Closed",
        ),
        TrackerKind::Milestone => (
            board.counts.group_total(StatusGroup::Delayed),
            "milestones DELAYED or OVERDUE!",
            "✅ All milestones are on track",
        ),
        TrackerKind::SubMilestone => return String::new(),
    };

    if urgent > 0 {
        format!(r#"<div class="alert alert-urgent">🚨 URGENT: {urgent} {alert}</div>"#) + "\n"
    } else {
        format!(r#"<div class="alert alert-clear">{clear}</div>"#) + "\n"
    }
}

fn table<R: TrackerRecord>(board: &Board<R>, placeholder: &str) -> String {
    let mut html = String::from(r#"<table class="tracker"><thead><tr>"#);
    for column in &board.columns {
        html.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    html.push_str("</tr></thead><tbody>");

    let mut previous_group: Option<String> = None;
    for row in &board.rows {
        let cells = row.record.cells(placeholder);
        html.push_str("<tr>");
        for (index, cell) in cells.iter().enumerate() {
            let shown = if Some(index) == R::GROUP_FIELD {
                let repeated = previous_group.as_deref() == Some(cell.as_str());
                previous_group = Some(cell.clone());
                if repeated { "" } else { cell.as_str() }
            } else {
                cell.as_str()
            };
            html.push_str(&format!("<td>{}</td>", escape_html(shown)));
        }
        html.push_str(&format!(
            r#"<td class="status-{}">{}</td>"#,
            row.status.slug(),
            escape_html(row.status.label())
        ));
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table>\n");
    html
}

fn download_link<R: TrackerRecord>(view: &TrackerView<'_, R>) -> String {
    let query = if view.query.is_empty() {
        String::new()
    } else {
        format!("?{}", view.query)
    };
    format!(
        r#"<a class="download" href="/trackers/{}/download.csv{}">📥 Download Current View</a>"#,
        escape_html(view.id),
        escape_html(&query)
    )
}
