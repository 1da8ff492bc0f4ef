//! Chat Backend Traits
//!
//! Trait definitions for the question-answering backend. The exchange driver
//! only needs an endpoint that accepts a query and answers with an event
//! stream; this trait is that seam, so tests can script a backend without a
//! network.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::routing::ChatMode;
use crate::transport::EventReceiver;

/// Shown when the backend cannot be reached at all
pub const CONNECTION_ERROR_MESSAGE: &str =
    "⚠️ Backend 서버에 연결할 수 없습니다. 서버가 실행 중인지 확인해주세요.";

/// Shown when the user interrupts an exchange before it finishes
pub const ABANDONED_MESSAGE: &str = "⚠️ 응답이 중단되었습니다.";

/// Failure of one exchange
///
/// None of these end the session; each is recorded as an assistant entry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ExchangeError {
    /// The transport could not be established
    #[error("Backend unreachable: {0}")]
    Connection(String),

    /// The backend answered with a non-success status
    #[error("Backend returned status {status}")]
    Server {
        /// HTTP status code
        status: u16,
    },

    /// The backend sent an `error` event mid-stream
    #[error("Backend reported an error: {0}")]
    ServerEvent(String),

    /// The body stream broke after it was opened
    #[error("Stream interrupted: {0}")]
    Transport(String),

    /// Any other request failure
    #[error("Request failed: {0}")]
    Request(String),

    /// The user gave up on the exchange before it finished
    #[error("Exchange abandoned")]
    Abandoned,
}

impl ExchangeError {
    /// Deterministic text recorded in the transcript for this failure
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection(_) => CONNECTION_ERROR_MESSAGE.to_string(),
            Self::Server { status } => format!("Error: API returned status code {status}"),
            Self::ServerEvent(message) => format!("Error: {message}"),
            Self::Transport(detail) | Self::Request(detail) => {
                format!("⚠️ An error occurred: {detail}")
            }
            Self::Abandoned => ABANDONED_MESSAGE.to_string(),
        }
    }
}

/// A single question for the backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    /// The user's question
    pub query: String,
    /// Query strategy, which selects the endpoint
    pub mode: ChatMode,
}

impl ChatRequest {
    /// Create a request
    pub fn new(query: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }

    /// JSON body sent to the backend
    #[must_use]
    pub fn body(&self) -> ChatRequestBody<'_> {
        ChatRequestBody { query: &self.query }
    }
}

/// Wire body of a chat request: `{"query": "..."}`
#[derive(Debug, Serialize)]
pub struct ChatRequestBody<'a> {
    /// The user's question
    pub query: &'a str,
}

/// Chat backend trait
///
/// Implement this trait to connect the session to a different transport.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name for logs and status lines
    fn name(&self) -> &str;

    /// Check if the backend is reachable and healthy
    async fn health_check(&self) -> bool;

    /// Send a request and open its event stream
    ///
    /// Fails with [`ExchangeError::Connection`] when the backend cannot be
    /// reached and [`ExchangeError::Server`] on a non-success status. The
    /// returned receiver closes when the stream ends.
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventReceiver, ExchangeError>;
}
