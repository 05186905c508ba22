//! Landing page

use axum::{extract::State, response::Html};

use crate::render::{self, TrackerCard};
use crate::AppState;

/// GET /
///
/// Lists configured trackers from whatever is cached; never fetches.
pub async fn home_page(State(state): State<AppState>) -> Html<String> {
    let mut entries = Vec::with_capacity(state.registry.len());
    for service in state.registry.iter() {
        entries.push((service.clone(), service.cached().await));
    }

    let cards: Vec<TrackerCard<'_>> = entries
        .iter()
        .map(|(service, entry)| TrackerCard {
            id: service.id(),
            title: &service.config().title,
            refresh_secs: service.config().refresh_interval_secs(),
            updated_at: entry.as_ref().map(|e| e.fetched_at),
            record_count: entry.as_ref().map(|e| e.table.rows.len()),
            ok: entry.as_ref().map_or(true, |e| e.is_ok()),
        })
        .collect();

    Html(render::home_page(&cards))
}
