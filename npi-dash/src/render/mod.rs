//! Server-rendered HTML pages

mod board;

pub use board::{tracker_page, TrackerView};

use chrono::{DateTime, Local};

/// Display form of the last refresh time
pub const UPDATED_FORMAT: &str = "%d-%b-%Y %H:%M:%S";

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One entry on the home page
pub struct TrackerCard<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub refresh_secs: u64,
    /// `None` until the first fetch completes
    pub updated_at: Option<DateTime<Local>>,
    pub record_count: Option<usize>,
    pub ok: bool,
}

/// Landing page with one card per tracker
pub fn home_page(cards: &[TrackerCard<'_>]) -> String {
    let mut body = String::from(
        r#"<div class="banner"><h1>NPI Tracker Dashboard</h1><p>Process readiness and milestone tracking</p></div>
<div class="cards">"#,
    );

    for card in cards {
        let detail = match (card.updated_at, card.record_count) {
            (Some(at), Some(count)) if card.ok => format!(
                "{} records &bull; updated {}",
                count,
                at.format(UPDATED_FORMAT)
            ),
            (Some(at), _) => format!("Source unavailable &bull; tried {}", at.format(UPDATED_FORMAT)),
            _ => "Not loaded yet".to_string(),
        };
        body.push_str(&format!(
            r#"<a class="card" href="/trackers/{id}"><h2>{title}</h2><p>{detail}</p><p class="muted">Auto-refresh every {secs}s</p></a>"#,
            id = escape_html(card.id),
            title = escape_html(card.title),
            detail = detail,
            secs = card.refresh_secs,
        ));
    }
    body.push_str("</div>");

    page("NPI Tracker Dashboard", &body, None)
}

/// Full document around a page body
///
/// With a tracker id, the page reloads itself when that tracker refreshes.
pub(crate) fn page(title: &str, body: &str, reload_on: Option<&str>) -> String {
    let script = match reload_on {
        Some(id) => format!(
            r#"<script>
(function () {{
    const trackerId = "{id}";
    const source = new EventSource("/api/events");
    source.addEventListener("TrackerRefreshed", function (e) {{
        try {{
            if (JSON.parse(e.data).tracker_id === trackerId) {{
                window.location.reload();
            }}
        }} catch (_) {{}}
    }});
}})();
</script>"#,
            id = escape_html(id),
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{css}</style>
</head>
<body>
<div class="container">
{body}
<footer>npi-dash v{version} [{git}] built {built} ({profile})</footer>
</div>
{script}
</body>
</html>
"#,
        title = escape_html(title),
        css = STYLE,
        body = body,
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        script = script,
    )
}

const STYLE: &str = r#"
* { margin: 0; padding: 0; box-sizing: border-box; }
body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #f8fafc; color: #1e293b; line-height: 1.5; }
.container { max-width: 1400px; margin: 0 auto; padding: 24px; }
.banner { text-align: center; padding: 20px; background: linear-gradient(135deg, #1d4ed8 0%, #3b82f6 100%); color: white; border-radius: 16px; margin-bottom: 24px; }
.banner h1 { font-size: 2rem; }
.banner p { opacity: 0.9; }
.cards { display: flex; flex-wrap: wrap; gap: 20px; justify-content: center; margin-bottom: 24px; }
.card { display: block; min-width: 260px; padding: 20px 32px; border-radius: 16px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; text-decoration: none; }
.metric { min-width: 180px; padding: 20px 40px; border-radius: 16px; text-align: center; color: white; }
.metric p { font-size: 1.2rem; font-weight: 700; }
.metric h2 { font-size: 2rem; }
.metric-delayed { background: #ef4444; }
.metric-open { background: #fbbf24; }
.metric-closed { background: #22c55e; }
.metric-total { background: linear-gradient(135deg, #3b82f6 0%, #1d4ed8 100%); }
.muted { color: #9ca3af; font-size: 0.9rem; }
.card .muted { color: #e0e7ff; }
form.filters { display: flex; flex-wrap: wrap; gap: 16px; align-items: end; margin-bottom: 16px; }
form.filters label { display: flex; flex-direction: column; font-weight: 600; font-size: 0.9rem; }
form.filters select { padding: 6px 10px; border-radius: 8px; border: 1px solid #cbd5e1; min-width: 180px; }
form.filters button { padding: 8px 16px; border: none; border-radius: 8px; background: #1e40af; color: white; font-weight: 600; cursor: pointer; }
.alert { padding: 14px 20px; border-radius: 12px; margin-bottom: 16px; font-weight: 700; }
.alert-urgent { background: #fee2e2; color: #991b1b; }
.alert-clear { background: #dcfce7; color: #166534; }
.alert-warning { background: #fef3c7; color: #92400e; }
table.tracker { width: 100%; border-collapse: collapse; margin-bottom: 16px; font-size: 0.95rem; }
table.tracker th { background: #1e40af; color: white; padding: 15px; text-align: left; font-weight: 800; }
table.tracker td { padding: 12px 15px; border-bottom: 1px solid #e2e8f0; background: white; }
table.tracker td.status-delayed, table.tracker td.status-overdue { background: #ef4444; color: white; font-weight: bold; }
table.tracker td.status-closed-ontime { background: #22c55e; color: white; font-weight: bold; }
table.tracker td.status-closed-late { background: #86efac; color: black; font-weight: bold; }
table.tracker td.status-open, table.tracker td.status-pending { background: #fbbf24; color: black; font-weight: bold; }
.download { display: inline-block; padding: 10px 18px; border-radius: 8px; background: #059669; color: white; text-decoration: none; font-weight: 600; }
footer { margin-top: 32px; text-align: center; color: #9ca3af; font-size: 0.8rem; font-family: 'Courier New', monospace; }
"#;
