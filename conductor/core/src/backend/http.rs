//! HTTP Backend Implementation
//!
//! Talks to the RAG backend over HTTP.
//!
//! # Backend API
//!
//! - `POST /api/chat/default` - direct retrieval answer (event stream)
//! - `POST /api/chat/agent` - tool-using agent answer (event stream)
//! - `GET /health` - liveness check
//!
//! Both chat endpoints take `{"query": "..."}` and answer with
//! `text/event-stream`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tokio::sync::mpsc;

use super::traits::{ChatBackend, ChatRequest, ExchangeError};
use crate::config::ClientConfig;
use crate::routing::ChatMode;
use crate::transport::{pump_events, EventReceiver};

/// Default channel capacity between the body pump and the exchange
const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// HTTP client for the RAG backend
#[derive(Clone)]
pub struct HttpBackend {
    /// Base URL without trailing slash, e.g. `http://localhost:3001`
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
    /// Buffered events between the body pump and the consumer
    channel_capacity: usize,
}

impl HttpBackend {
    /// Create a backend with default client settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a backend using a preconfigured client
    pub fn with_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            http_client,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Create from a loaded [`ClientConfig`]
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms));
        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }

        let mut backend = Self::with_client(config.backend_url.clone(), builder.build()?);
        backend.channel_capacity = config.channel_capacity.max(1);
        Ok(backend)
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat endpoint URL for a mode
    fn chat_url(&self, mode: ChatMode) -> String {
        format!("{}{}", self.base_url, mode.route())
    }

    /// Health endpoint URL
    fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Classify a failed send
fn classify_send_error(e: &reqwest::Error) -> ExchangeError {
    if e.is_connect() {
        ExchangeError::Connection(e.to_string())
    } else {
        ExchangeError::Request(e.to_string())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "RAG backend"
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "Health check failed");
                false
            }
        }
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<EventReceiver, ExchangeError> {
        let url = self.chat_url(request.mode);
        tracing::debug!(url = %url, mode = ?request.mode, "Opening answer stream");

        let response = self
            .http_client
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(&request.body())
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        // Check for HTTP errors
        if !response.status().is_success() {
            let status = response.status().as_u16();
            tracing::warn!(status = status, url = %url, "Backend returned error status");
            return Err(ExchangeError::Server { status });
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        tokio::spawn(pump_events(response.bytes_stream(), tx));

        Ok(rx)
    }
}
