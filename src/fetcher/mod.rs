pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::grid::{PageRequest, Row};

pub use http::{HttpOptions, HttpPageFetcher};
pub use memory::MemoryPageFetcher;

/// Why a page could not be fetched. Carried into the grid's error overlay.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("invalid page payload: {message}")]
    Decode { message: String },
}

#[derive(Debug, Error)]
pub enum FetcherSetupError {
    #[error("invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read rows file: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rows file is not a JSON array of objects: {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Retrieves one page of rows. Retries, if any, belong to the implementation.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: PageRequest) -> Result<Vec<Row>, FetchFailure>;
}
