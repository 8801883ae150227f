//! HTTP schedule provider.
//!
//! Fetches the schedule with a single GET and decodes the body as a JSON
//! array of events. The whole request is bounded by a timeout so a hanging
//! upstream fails the refresh cycle instead of stalling it.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use roomcal_core::EventRecord;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, ScheduleProvider};

/// Schedule of the conference the project started with.
pub const DEFAULT_SCHEDULE_URL: &str = "http://bl0rg.net/~andi/gpn13-fahrplan.json";

/// Configuration for the HTTP provider.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Schedule endpoint.
    pub url: Url,

    /// Request timeout, covering connect and body download.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl HttpSourceConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a new configuration for the given URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or not http(s).
    pub fn new(url: impl AsRef<str>) -> ProviderResult<Self> {
        let parsed = Url::parse(url.as_ref()).map_err(|e| {
            ProviderError::configuration(format!("invalid schedule URL '{}': {}", url.as_ref(), e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::configuration(format!(
                "unsupported schedule URL scheme '{}'",
                parsed.scheme()
            )));
        }
        Ok(Self {
            url: parsed,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("roomcal/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches the schedule from an HTTP endpoint.
#[derive(Debug)]
pub struct HttpScheduleProvider {
    client: Client,
    config: HttpSourceConfig,
}

impl HttpScheduleProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: HttpSourceConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::network(format!("Failed to create HTTP client: {}", e))
                    .with_provider("http")
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    async fn fetch(&self) -> ProviderResult<Vec<EventRecord>> {
        let url = self.config.url.clone();
        trace!(url = %url, "Sending request");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.transport_error("Request failed", e))?;

        let status = response.status();
        trace!(status = %status, "Received response");

        match status {
            s if s.is_success() => {
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| self.transport_error("Failed to read response", e))?;
                debug!(bytes = body.len(), "Downloaded schedule");
                decode_schedule(&body)
            }
            StatusCode::NOT_FOUND => Err(ProviderError::not_found(format!(
                "Schedule not found at {}",
                self.config.url
            ))),
            s if s.is_server_error() => Err(ProviderError::server(format!(
                "Server error ({})",
                s
            ))),
            s => {
                warn!(status = %s, "Unexpected response status");
                Err(ProviderError::invalid_response(format!(
                    "Unexpected status {}",
                    s
                )))
            }
        }
    }

    fn transport_error(&self, context: &str, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::timeout(format!(
                "{}: no response within {}s",
                context,
                self.config.timeout.as_secs_f64()
            ))
            .with_source(err)
        } else {
            ProviderError::network(format!("{}: {}", context, err)).with_source(err)
        }
    }
}

impl ScheduleProvider for HttpScheduleProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch_schedule(&self) -> BoxFuture<'_, ProviderResult<Vec<EventRecord>>> {
        Box::pin(async move { self.fetch().await.map_err(|e| e.with_provider("http")) })
    }

    fn source(&self) -> String {
        self.config.url.to_string()
    }
}

/// Decodes a schedule body: a JSON array of events.
pub fn decode_schedule(body: &[u8]) -> ProviderResult<Vec<EventRecord>> {
    serde_json::from_slice(body).map_err(|e| {
        ProviderError::invalid_response(format!("Failed to decode schedule: {}", e)).with_source(e)
    })
}
