//! Tabular data sources
//!
//! A [`CsvSource`] turns a source URL into a [`RawTable`]. Production uses
//! [`HttpCsvSource`]; tests plug in [`StaticCsvSource`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use npi_common::RawTable;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = concat!("npi-dash/", env!("CARGO_PKG_VERSION"));

/// Fetch failures; every one of them degrades to an empty board
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Source answered HTTP {0}")]
    Status(u16),

    #[error("Not a CSV table: {0}")]
    Parse(String),
}

#[async_trait]
pub trait CsvSource: Send + Sync {
    async fn fetch_table(&self, url: &str) -> Result<RawTable, FetchError>;
}

/// Published-sheet fetcher over HTTP
pub struct HttpCsvSource {
    http_client: reqwest::Client,
}

impl HttpCsvSource {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl CsvSource for HttpCsvSource {
    async fn fetch_table(&self, url: &str) -> Result<RawTable, FetchError> {
        debug!(url = %url, "Fetching CSV export");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        RawTable::from_csv_bytes(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// In-memory source keyed by URL; unknown URLs fail like an unreachable host
#[derive(Debug, Default, Clone)]
pub struct StaticCsvSource {
    bodies: HashMap<String, String>,
}

impl StaticCsvSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl CsvSource for StaticCsvSource {
    async fn fetch_table(&self, url: &str) -> Result<RawTable, FetchError> {
        let body = self
            .bodies
            .get(url)
            .ok_or_else(|| FetchError::Network(format!("no route to {}", url)))?;
        RawTable::from_csv_bytes(body.as_bytes()).map_err(|e| FetchError::Parse(e.to_string()))
    }
}
