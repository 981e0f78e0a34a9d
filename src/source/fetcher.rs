//! HTTP record fetching.
//!
//! One GET against the configured endpoint, decoded as a JSON array of
//! incident records. Any failure is terminal for the run; nothing here
//! retries.

use crate::models::IncidentRecord;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Default endpoint serving the incident feed.
pub const DEFAULT_SOURCE_URL: &str = "https://web-production-c1c9.up.railway.app/all-crimes";

/// Errors that abort a fetch.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure: DNS, connect, TLS, timeout, or body read.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    /// The body was not a JSON array of records.
    #[error("response body is not a list of incident records: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Connection settings for the record endpoint.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub url: String,
    /// Transport timeout; `None` leaves it to the client defaults.
    pub timeout_seconds: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_seconds: None,
        }
    }
}

/// Client for the incident record endpoint.
pub struct RecordSource {
    config: SourceConfig,
    http_client: Client,
}

impl RecordSource {
    /// Create a source for the given endpoint.
    pub fn new(config: SourceConfig) -> Result<Self, SourceError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http_client = builder.build().map_err(SourceError::Client)?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// The endpoint this source reads from.
    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// Fetch and decode every record from the endpoint.
    pub async fn fetch_records(&self) -> Result<Vec<IncidentRecord>, SourceError> {
        let url = &self.config.url;
        let start = Instant::now();

        debug!("Fetching incident records from {}", url);

        let request_error = |source: reqwest::Error| SourceError::Request {
            url: url.clone(),
            source,
        };

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        debug!("Received {} bytes", body.len());

        let records = decode_records(&body)?;

        info!(
            "Fetched {} records in {:.2}s",
            records.len(),
            start.elapsed().as_secs_f32()
        );

        Ok(records)
    }
}

/// Decode a response body into incident records.
pub fn decode_records(body: &[u8]) -> Result<Vec<IncidentRecord>, SourceError> {
    Ok(serde_json::from_slice(body)?)
}
