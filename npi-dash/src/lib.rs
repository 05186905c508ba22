//! npi-dash library - NPI tracker dashboard service
//!
//! Fetches published tracker sheets, classifies every row, and serves the
//! result as auto-refreshing HTML pages, JSON boards and CSV downloads.

use std::sync::Arc;

use axum::Router;
use chrono::{Local, NaiveDate};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod refresh;
pub mod render;
pub mod service;
pub mod source;

use refresh::DashboardEvent;
use service::TrackerRegistry;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<TrackerRegistry>,
    /// Refresh notifications fanned out to SSE clients
    pub events: broadcast::Sender<DashboardEvent>,
    /// Fixed reference date; `None` uses the local calendar date
    pub today_override: Option<NaiveDate>,
}

impl AppState {
    pub fn new(registry: Arc<TrackerRegistry>, events: broadcast::Sender<DashboardEvent>) -> Self {
        Self {
            registry,
            events,
            today_override: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today_override = Some(today);
        self
    }

    /// Reference date for classification
    pub fn today(&self) -> NaiveDate {
        self.today_override
            .unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let pages = Router::new()
        .route("/", get(api::home_page))
        .route("/trackers/:id", get(api::tracker_page))
        .route("/trackers/:id/download.csv", get(api::download_csv));

    let json = Router::new()
        .route("/api/trackers", get(api::list_trackers))
        .route("/api/trackers/:id", get(api::tracker_board))
        .route("/api/events", get(api::event_stream));

    Router::new()
        .merge(pages)
        .merge(json)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
