//! Periodic refresh of every tracker
//!
//! One task per tracker re-fetches on that tracker's interval and announces
//! the result on the event channel. Pages subscribed over SSE reload when
//! their tracker refreshes.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::service::{TrackerRegistry, TrackerService};

/// Capacity of the dashboard event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Events pushed to connected browsers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum DashboardEvent {
    TrackerRefreshed {
        tracker_id: String,
        record_count: usize,
        ok: bool,
        refreshed_at: DateTime<Local>,
    },
}

impl DashboardEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            DashboardEvent::TrackerRefreshed { .. } => "TrackerRefreshed",
        }
    }
}

/// Drives the per-tracker refresh loops
pub struct RefreshScheduler {
    registry: Arc<TrackerRegistry>,
    events: broadcast::Sender<DashboardEvent>,
}

impl RefreshScheduler {
    pub fn new(registry: Arc<TrackerRegistry>, events: broadcast::Sender<DashboardEvent>) -> Self {
        Self { registry, events }
    }

    /// Spawn one refresh loop per tracker
    ///
    /// The first tick fires immediately, so every cache is warm shortly after
    /// startup. Ticks missed while a slow fetch runs are skipped.
    pub fn start(self) -> Vec<JoinHandle<()>> {
        self.registry
            .iter()
            .map(|service| {
                let service = service.clone();
                let events = self.events.clone();
                info!(
                    tracker = %service.id(),
                    interval_secs = service.config().refresh_interval_secs(),
                    "Starting refresh loop"
                );
                tokio::spawn(async move {
                    let mut timer = interval(service.ttl());
                    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

                    loop {
                        timer.tick().await;
                        refresh_once(&service, &events).await;
                    }
                })
            })
            .collect()
    }
}

/// Refresh one tracker and announce the outcome
pub async fn refresh_once(service: &TrackerService, events: &broadcast::Sender<DashboardEvent>) {
    let entry = service.refresh().await;
    // The fetch itself already warned on failure
    debug!(
        tracker = %service.id(),
        rows = entry.table.rows.len(),
        ok = entry.is_ok(),
        "Refreshed"
    );

    let event = DashboardEvent::TrackerRefreshed {
        tracker_id: service.id().to_string(),
        record_count: entry.table.rows.len(),
        ok: entry.is_ok(),
        refreshed_at: entry.fetched_at,
    };

    // No subscribers is not an error
    let _ = events.send(event);
}
