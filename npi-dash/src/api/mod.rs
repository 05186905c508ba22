//! HTTP API handlers for npi-dash

pub mod health;
pub mod sse;
pub mod trackers;
pub mod ui;

pub use health::health_routes;
pub use sse::event_stream;
pub use trackers::{download_csv, list_trackers, tracker_board, tracker_page, ApiError, ViewQuery};
pub use ui::home_page;
