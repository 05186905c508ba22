//! Per-tracker fetch cache
//!
//! Each tracker keeps its last fetch result for one refresh interval so that
//! any number of viewers share a single fetch. The fetch step is the only
//! writer; handlers only read.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use npi_common::config::{DashboardConfig, TrackerConfig};
use npi_common::normalize::{normalize, CellCleaner, ColumnLayout, NormalizedTable};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::source::CsvSource;

/// One fetch cycle's outcome
///
/// A failed fetch is stored too, as an empty table with the error, so the
/// page can show the degraded state until the next attempt.
#[derive(Debug, Clone)]
pub struct FetchedTable {
    pub table: NormalizedTable,
    pub fetched_at: DateTime<Local>,
    pub error: Option<String>,
    fetched_instant: Instant,
}

impl FetchedTable {
    pub fn age(&self) -> Duration {
        self.fetched_instant.elapsed()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetch, normalize and memoize one tracker's source
pub struct TrackerService {
    config: TrackerConfig,
    layout: ColumnLayout,
    cleaner: CellCleaner,
    source: Arc<dyn CsvSource>,
    cache: RwLock<Option<Arc<FetchedTable>>>,
    fetch_lock: Mutex<()>,
}

impl TrackerService {
    pub fn new(config: TrackerConfig, missing_markers: &[String], source: Arc<dyn CsvSource>) -> Self {
        Self {
            layout: config.layout(),
            cleaner: config.cleaner(missing_markers),
            config,
            source,
            cache: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Cache lifetime; the same as the refresh interval
    pub fn ttl(&self) -> Duration {
        self.config.refresh_interval()
    }

    /// Last stored result, fresh or not
    pub async fn cached(&self) -> Option<Arc<FetchedTable>> {
        self.cache.read().await.clone()
    }

    /// Cached result when younger than the TTL, otherwise a new fetch
    ///
    /// Concurrent callers that find the cache stale wait on one fetch.
    pub async fn current(&self) -> Arc<FetchedTable> {
        if let Some(entry) = self.fresh().await {
            return entry;
        }

        let _guard = self.fetch_lock.lock().await;
        if let Some(entry) = self.fresh().await {
            return entry;
        }
        self.fetch_and_store().await
    }

    /// Fetch unconditionally (scheduler tick)
    pub async fn refresh(&self) -> Arc<FetchedTable> {
        let _guard = self.fetch_lock.lock().await;
        self.fetch_and_store().await
    }

    async fn fresh(&self) -> Option<Arc<FetchedTable>> {
        let ttl = self.ttl();
        self.cache
            .read()
            .await
            .as_ref()
            .filter(|entry| entry.age() < ttl)
            .cloned()
    }

    async fn fetch_and_store(&self) -> Arc<FetchedTable> {
        let entry = Arc::new(self.fetch().await);
        *self.cache.write().await = Some(entry.clone());
        entry
    }

    async fn fetch(&self) -> FetchedTable {
        let (table, error) = match self.source.fetch_table(&self.config.source_url).await {
            Ok(raw) => {
                let table = normalize(&raw, &self.layout, &self.cleaner);
                debug!(
                    tracker = %self.config.id,
                    rows = table.rows.len(),
                    "Fetched and normalized source"
                );
                (table, None)
            }
            Err(e) => {
                warn!(tracker = %self.config.id, error = %e, "Source fetch failed; showing no data");
                (NormalizedTable::default(), Some(e.to_string()))
            }
        };

        FetchedTable {
            table,
            fetched_at: Local::now(),
            error,
            fetched_instant: Instant::now(),
        }
    }
}

/// All configured trackers, in configuration order
pub struct TrackerRegistry {
    services: Vec<Arc<TrackerService>>,
}

impl TrackerRegistry {
    pub fn new(config: &DashboardConfig, source: Arc<dyn CsvSource>) -> Self {
        let services = config
            .trackers
            .iter()
            .map(|tracker| {
                Arc::new(TrackerService::new(
                    tracker.clone(),
                    &config.missing_markers,
                    source.clone(),
                ))
            })
            .collect();
        Self { services }
    }

    pub fn get(&self, id: &str) -> Option<Arc<TrackerService>> {
        self.services.iter().find(|s| s.id() == id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TrackerService>> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
