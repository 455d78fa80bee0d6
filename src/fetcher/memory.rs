use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{FetchFailure, FetcherSetupError, PageFetcher};
use crate::grid::{PageRequest, Row};

/// Serves pages out of a fixed row set held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryPageFetcher {
    rows: Arc<Vec<Row>>,
    latency: Option<Duration>,
}

impl MemoryPageFetcher {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
            latency: None,
        }
    }

    /// Delays every page by `latency`, to mimic a slow server.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn from_json(path: &str, contents: &str) -> Result<Self, FetcherSetupError> {
        let rows = serde_json::from_str::<Vec<Row>>(contents).map_err(|e| {
            FetcherSetupError::FileParse {
                path: path.to_string(),
                source: e,
            }
        })?;
        Ok(Self::new(rows))
    }

    pub async fn from_json_file(path: &str) -> Result<Self, FetcherSetupError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| FetcherSetupError::FileRead {
                    path: path.to_string(),
                    source: e,
                })?;
        Self::from_json(path, &contents)
    }

    pub fn total_items(&self) -> usize {
        self.rows.len()
    }

    /// First row's keys, in the order they appear.
    pub fn field_keys(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.fields().keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn page(&self, request: PageRequest) -> Vec<Row> {
        let start = request.start().min(self.rows.len());
        let end = start.saturating_add(request.limit()).min(self.rows.len());
        self.rows[start..end].to_vec()
    }
}

#[async_trait]
impl PageFetcher for MemoryPageFetcher {
    async fn fetch(&self, request: PageRequest) -> Result<Vec<Row>, FetchFailure> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.page(request))
    }
}
