//! Tracker pages, board JSON and CSV download
//!
//! All tracker routes take the same optional query parameters:
//! `milestone_type`, `category`, `owner`, `view`. Unrecognized values
//! select "All".

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use npi_common::export::write_csv;
use npi_common::tracker::{MilestoneRecord, ReadinessRecord, SubMilestoneRecord};
use npi_common::{Board, FilterCriteria, TrackerKind, TrackerRecord};

use crate::render::{self, TrackerView};
use crate::service::{FetchedTable, TrackerService};
use crate::AppState;

/// Filter selections from the query string
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ViewQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

impl ViewQuery {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria::from_selections(
            self.milestone_type.as_deref(),
            self.category.as_deref(),
            self.owner.as_deref(),
            self.view.as_deref(),
        )
    }

    /// Re-encoded query string, carried into the download link
    pub fn query_string(&self) -> String {
        serde_urlencoded::to_string(self).unwrap_or_default()
    }
}

/// Configured tracker as listed by `GET /api/trackers`
#[derive(Debug, Serialize)]
pub struct TrackerSummary {
    pub id: String,
    pub title: String,
    pub kind: TrackerKind,
    pub refresh_interval_secs: u64,
    pub updated_at: Option<DateTime<Local>>,
    pub record_count: Option<usize>,
    pub error: Option<String>,
}

/// Board JSON for `GET /api/trackers/:id`
#[derive(Debug, Serialize)]
pub struct BoardResponse<'a, R: TrackerRecord> {
    pub id: &'a str,
    pub title: &'a str,
    pub kind: TrackerKind,
    pub updated_at: DateTime<Local>,
    pub error: Option<&'a str>,
    pub board: Board<R>,
}

/// GET /api/trackers
pub async fn list_trackers(State(state): State<AppState>) -> Json<Vec<TrackerSummary>> {
    let mut summaries = Vec::with_capacity(state.registry.len());
    for service in state.registry.iter() {
        let entry = service.cached().await;
        let config = service.config();
        summaries.push(TrackerSummary {
            id: config.id.clone(),
            title: config.title.clone(),
            kind: config.kind,
            refresh_interval_secs: config.refresh_interval_secs(),
            updated_at: entry.as_ref().map(|e| e.fetched_at),
            record_count: entry.as_ref().map(|e| e.table.rows.len()),
            error: entry.as_ref().and_then(|e| e.error.clone()),
        });
    }
    Json(summaries)
}

/// GET /trackers/:id
pub async fn tracker_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Html<String>, ApiError> {
    let (service, entry) = load(&state, &id).await?;
    let today = state.today();
    let html = match service.config().kind {
        TrackerKind::Readiness => page_for::<ReadinessRecord>(&service, &entry, today, &query),
        TrackerKind::Milestone => page_for::<MilestoneRecord>(&service, &entry, today, &query),
        TrackerKind::SubMilestone => page_for::<SubMilestoneRecord>(&service, &entry, today, &query),
    };
    Ok(Html(html))
}

/// GET /api/trackers/:id
pub async fn tracker_board(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    let (service, entry) = load(&state, &id).await?;
    let today = state.today();
    let response = match service.config().kind {
        TrackerKind::Readiness => board_for::<ReadinessRecord>(&service, &entry, today, &query),
        TrackerKind::Milestone => board_for::<MilestoneRecord>(&service, &entry, today, &query),
        TrackerKind::SubMilestone => board_for::<SubMilestoneRecord>(&service, &entry, today, &query),
    };
    Ok(response)
}

/// GET /trackers/:id/download.csv
///
/// CSV of the filtered view, status column last.
pub async fn download_csv(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, ApiError> {
    let (service, entry) = load(&state, &id).await?;
    let today = state.today();
    let kind = service.config().kind;
    let body = match kind {
        TrackerKind::Readiness => csv_for::<ReadinessRecord>(&service, &entry, today, &query),
        TrackerKind::Milestone => csv_for::<MilestoneRecord>(&service, &entry, today, &query),
        TrackerKind::SubMilestone => csv_for::<SubMilestoneRecord>(&service, &entry, today, &query),
    }?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", kind.export_file_name()),
            ),
        ],
        body,
    )
        .into_response())
}

async fn load(state: &AppState, id: &str) -> Result<(Arc<TrackerService>, Arc<FetchedTable>), ApiError> {
    let service = state
        .registry
        .get(id)
        .ok_or_else(|| ApiError::TrackerNotFound(id.to_string()))?;
    let entry = service.current().await;
    Ok((service, entry))
}

fn build_board<R: TrackerRecord>(
    service: &TrackerService,
    entry: &FetchedTable,
    today: NaiveDate,
    query: &ViewQuery,
) -> Board<R> {
    Board::build(&entry.table, service.config().placeholder(), today, query.criteria())
}

fn page_for<R: TrackerRecord>(
    service: &TrackerService,
    entry: &FetchedTable,
    today: NaiveDate,
    query: &ViewQuery,
) -> String {
    let board = build_board::<R>(service, entry, today, query);
    let query_string = query.query_string();
    let config = service.config();

    render::tracker_page(&TrackerView {
        id: &config.id,
        title: &config.title,
        refresh_secs: config.refresh_interval_secs(),
        updated_at: Some(entry.fetched_at),
        fetch_error: entry.error.as_deref(),
        board: &board,
        placeholder: config.placeholder(),
        query: &query_string,
    })
}

fn board_for<R: TrackerRecord>(
    service: &TrackerService,
    entry: &FetchedTable,
    today: NaiveDate,
    query: &ViewQuery,
) -> Response {
    let config = service.config();
    Json(BoardResponse {
        id: &config.id,
        title: &config.title,
        kind: config.kind,
        updated_at: entry.fetched_at,
        error: entry.error.as_deref(),
        board: build_board::<R>(service, entry, today, query),
    })
    .into_response()
}

fn csv_for<R: TrackerRecord>(
    service: &TrackerService,
    entry: &FetchedTable,
    today: NaiveDate,
    query: &ViewQuery,
) -> Result<Vec<u8>, ApiError> {
    let board = build_board::<R>(service, entry, today, query);
    write_csv(&board.columns, &board.rows, service.config().placeholder()).map_err(|e| {
        warn!(tracker = %service.id(), error = %e, "CSV export failed");
        ApiError::Export(e.to_string())
    })
}

/// Tracker route errors
#[derive(Debug)]
pub enum ApiError {
    TrackerNotFound(String),
    Export(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::TrackerNotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Unknown tracker: {}", id))
            }
            ApiError::Export(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", msg))
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
