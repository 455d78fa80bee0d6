use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{FetchFailure, FetcherSetupError, PageFetcher};
use crate::grid::{PageRequest, Row};

#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    /// Honor HTTP_PROXY and friends when no explicit proxy is set.
    pub system_proxy: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
            system_proxy: true,
        }
    }
}

/// Fetches pages with `GET {endpoint}?_start=..&_limit=..`.
#[derive(Clone, Debug)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpPageFetcher {
    pub fn new(endpoint: &str, options: &HttpOptions) -> Result<Self, FetcherSetupError> {
        let endpoint =
            reqwest::Url::parse(endpoint.trim()).map_err(|_| FetcherSetupError::InvalidEndpoint {
                url: endpoint.to_string(),
            })?;
        let client = build_client(options)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    pub fn page_url(&self, request: PageRequest) -> reqwest::Url {
        page_url(&self.endpoint, request)
    }
}

pub fn page_url(endpoint: &reqwest::Url, request: PageRequest) -> reqwest::Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("_start", &request.start().to_string())
        .append_pair("_limit", &request.limit().to_string());
    url
}

fn build_client(options: &HttpOptions) -> Result<reqwest::Client, FetcherSetupError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!("pagegrid/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(
        reqwest::header::ACCEPT,
        reqwest::header::HeaderValue::from_static("application/json"),
    );

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_secs(options.timeout_seconds.max(1)));

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| FetcherSetupError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    } else if !options.system_proxy {
        builder = builder.no_proxy();
    }

    builder
        .build()
        .map_err(|e| FetcherSetupError::HttpClientBuild { source: e })
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, request: PageRequest) -> Result<Vec<Row>, FetchFailure> {
        let url = self.page_url(request);
        debug!(%url, "fetching page");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!(%url, error = %e, "page request failed");
            FetchFailure::Transport {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "page request rejected");
            return Err(FetchFailure::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchFailure::Transport {
                message: e.to_string(),
            })?;
        serde_json::from_slice::<Vec<Row>>(&body).map_err(|e| FetchFailure::Decode {
            message: e.to_string(),
        })
    }
}
