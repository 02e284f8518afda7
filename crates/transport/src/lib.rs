//! Transport layer: prioritized endpoint failover for radar volume fetches.
//!
//! A fetch walks the configured endpoints strictly in priority order, bounds
//! every attempt with the configured timeout, and absorbs per-endpoint
//! failures until the list is exhausted. Nothing is persisted between
//! calls and an endpoint is never retried within one call; retry policy
//! belongs to the caller.

pub mod error;
pub mod ftp;
pub mod http;
pub mod listing;

use bytes::Bytes;
use chrono::Utc;
use radar_common::RawMessage;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use error::{EndpointFailure, FetchFailure, TransportError};

/// Wire protocol an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Ftp,
}

/// A configured data server. Immutable once configured; ordered lists are
/// shared read-only across concurrently running pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Base URL, e.g. `https://mesonet.example/data` or `ftp://host/pub`.
    pub url: String,
    pub protocol: Protocol,
    /// Lower rank is tried first.
    #[serde(default)]
    pub priority: u32,
}

impl ServerEndpoint {
    pub fn new(url: impl Into<String>, protocol: Protocol, priority: u32) -> Self {
        Self {
            url: url.into(),
            protocol,
            priority,
        }
    }

    /// Join a path below this endpoint's base URL.
    fn join(&self, path: &str) -> String {
        let base = self.url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Descriptor for fetching one known file.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Path below each endpoint's base URL.
    pub path: String,
}

/// Descriptor for fetching the newest file in a remote directory.
#[derive(Debug, Clone)]
pub struct ListingRequest {
    /// Directory path below each endpoint's base URL.
    pub path: String,
    /// File name suffix to match, e.g. `.ar2v`.
    pub suffix: String,
}

/// The transport layer. Cheap to clone; the HTTP client pools connections.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    timeout: Duration,
}

impl Transport {
    /// Build a transport whose attempts are each bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(30)))
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    /// Fetch one file, failing over across endpoints in priority order.
    pub async fn fetch(
        &self,
        endpoints: &[ServerEndpoint],
        request: &FetchRequest,
    ) -> Result<RawMessage, TransportError> {
        self.walk_endpoints(endpoints, |endpoint| {
            let url = endpoint.join(&request.path);
            async move { self.fetch_one(endpoint, url).await }
        })
        .await
    }

    /// Fetch the newest matching file from a remote directory, failing over
    /// across endpoints. Listing and download happen against the same
    /// endpoint within one attempt.
    pub async fn fetch_latest(
        &self,
        endpoints: &[ServerEndpoint],
        request: &ListingRequest,
    ) -> Result<RawMessage, TransportError> {
        self.walk_endpoints(endpoints, |endpoint| {
            let dir_url = endpoint.join(&request.path);
            let suffix = request.suffix.clone();
            async move {
                let names = match endpoint.protocol {
                    Protocol::Http => {
                        let page = http::fetch_text(&self.client, &dir_url).await?;
                        listing::extract_hrefs(&page, &suffix)
                    }
                    Protocol::Ftp => ftp::list_names(&dir_url)
                        .await?
                        .into_iter()
                        .filter(|name| name.ends_with(&suffix))
                        .collect(),
                };

                let newest = listing::latest(names)
                    .ok_or_else(|| FetchFailure::NoMatchingFiles(suffix.clone()))?;
                debug!(file = %newest, dir = %dir_url, "Selected newest volume from listing");

                let file_url = format!(
                    "{}/{}",
                    dir_url.trim_end_matches('/'),
                    newest.trim_start_matches('/')
                );
                self.fetch_one(endpoint, file_url).await
            }
        })
        .await
    }

    /// Try `attempt` against each endpoint in priority order, recording
    /// failures, until one succeeds or the list runs out.
    async fn walk_endpoints<'a, F, Fut>(
        &self,
        endpoints: &'a [ServerEndpoint],
        attempt: F,
    ) -> Result<RawMessage, TransportError>
    where
        F: Fn(&'a ServerEndpoint) -> Fut,
        Fut: std::future::Future<Output = Result<RawMessage, FetchFailure>>,
    {
        let mut order: Vec<&ServerEndpoint> = endpoints.iter().collect();
        order.sort_by_key(|e| e.priority);

        let mut attempts = Vec::with_capacity(order.len());
        for endpoint in order {
            debug!(endpoint = %endpoint.url, "Trying endpoint");
            let reason = match tokio::time::timeout(self.timeout, attempt(endpoint)).await {
                Ok(Ok(message)) => {
                    info!(
                        endpoint = %endpoint.url,
                        bytes = message.len(),
                        "Fetched volume"
                    );
                    return Ok(message);
                }
                Ok(Err(reason)) => reason,
                Err(_) => FetchFailure::Timeout,
            };

            warn!(endpoint = %endpoint.url, reason = %reason, "Endpoint failed, trying next");
            attempts.push(EndpointFailure {
                endpoint: endpoint.url.clone(),
                reason,
            });
        }

        Err(TransportError::AllEndpointsExhausted { attempts })
    }

    /// One bounded download from one endpoint.
    async fn fetch_one(
        &self,
        endpoint: &ServerEndpoint,
        url: String,
    ) -> Result<RawMessage, FetchFailure> {
        let payload: Bytes = match endpoint.protocol {
            Protocol::Http => http::fetch_bytes(&self.client, &url).await?,
            Protocol::Ftp => ftp::fetch_bytes(&url).await?,
        };

        Ok(RawMessage::new(payload, url, Utc::now()))
    }
}
