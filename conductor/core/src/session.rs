//! Session Management
//!
//! A [`ChatSession`] owns everything that lives for one interactive session:
//! the selected mode, the [`ConversationLog`], and the bookkeeping for the
//! single exchange that may be in flight.
//!
//! # Exchange Ownership
//!
//! Each exchange is identified by an [`ExchangeTicket`] that remembers the log
//! generation it started in. Clearing the log bumps the generation, so a
//! late finalization from before the clear is discarded instead of appearing
//! in the fresh history.
//!
//! ```text
//! begin(query) ──► user entry appended, ticket issued
//!      │
//!      ▼
//! StreamSession::run ──► ExchangeReport
//!      │
//!      ▼
//! complete(ticket, report) ──► assistant entry appended (same generation only)
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{ChatBackend, ChatRequest, ExchangeError};
use crate::events::{ExchangeObserver, ExchangeUpdate};
use crate::exchange::{ExchangeReport, StreamSession};
use crate::messages::{Citation, ConversationEntry, SessionId};
use crate::routing::ChatMode;

/// Errors from session operations
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Another exchange is still open
    #[error("An exchange is already in progress")]
    Busy,

    /// The query was empty or whitespace only
    #[error("Query is empty")]
    EmptyQuery,
}

// ============================================================================
// Conversation Log
// ============================================================================

/// Ordered history of user and assistant entries
#[derive(Clone, Debug, Default)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
    generation: u64,
}

impl ConversationLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn append(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Append only if no clear happened since `generation` was observed
    ///
    /// Returns whether the entry was appended.
    pub fn append_if_generation(&mut self, generation: u64, entry: ConversationEntry) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// All entries, oldest first
    #[must_use]
    pub fn all(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Most recent entry
    #[must_use]
    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    /// Remove every entry and start a new generation
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation += 1;
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current generation, bumped by every [`clear`](Self::clear)
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// ============================================================================
// Exchange Tickets
// ============================================================================

/// Handle for an exchange started with [`ChatSession::begin`]
#[derive(Clone, Debug)]
pub struct ExchangeTicket {
    exchange_id: u64,
    generation: u64,
    request: ChatRequest,
}

impl ExchangeTicket {
    /// The request to send
    #[must_use]
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    /// Log generation the exchange started in
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenExchange {
    exchange_id: u64,
    generation: u64,
}

/// What the observer has been shown for the open exchange
#[derive(Clone, Debug, Default)]
struct PartialAnswer {
    text: String,
    citations: Vec<Citation>,
}

/// Observer wrapper that keeps [`PartialAnswer`] current
///
/// The updates land in the session itself, so they survive the exchange
/// future being dropped.
struct Tracking<'a, O: ?Sized> {
    partial: &'a mut PartialAnswer,
    inner: &'a mut O,
}

impl<O: ExchangeObserver + ?Sized> ExchangeObserver for Tracking<'_, O> {
    fn notify(&mut self, update: &ExchangeUpdate) {
        match update {
            ExchangeUpdate::Text { partial } => self.partial.text.clone_from(partial),
            ExchangeUpdate::Sources { citations } => {
                self.partial.citations.clone_from(citations);
            }
            _ => {}
        }
        self.inner.notify(update);
    }
}

// ============================================================================
// Chat Session
// ============================================================================

/// One interactive chat session
pub struct ChatSession<B: ChatBackend + ?Sized> {
    id: SessionId,
    backend: Arc<B>,
    mode: ChatMode,
    log: ConversationLog,
    open: Option<OpenExchange>,
    partial: PartialAnswer,
    next_exchange_id: u64,
}

impl<B: ChatBackend + ?Sized> ChatSession<B> {
    /// Create a session in the given mode
    pub fn new(backend: Arc<B>, mode: ChatMode) -> Self {
        let id = SessionId::new();
        tracing::debug!(session_id = %id, mode = ?mode, "Session created");
        Self {
            id,
            backend,
            mode,
            log: ConversationLog::new(),
            open: None,
            partial: PartialAnswer::default(),
            next_exchange_id: 1,
        }
    }

    /// Session ID
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Shared handle to the backend
    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// Current mode
    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Change the mode used by subsequent submissions
    pub fn set_mode(&mut self, mode: ChatMode) {
        if mode != self.mode {
            tracing::info!(from = ?self.mode, to = ?mode, "Mode changed");
            self.mode = mode;
        }
    }

    /// Switch to the other mode and return it
    pub fn toggle_mode(&mut self) -> ChatMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    /// Conversation history, oldest first
    pub fn history(&self) -> &[ConversationEntry] {
        self.log.all()
    }

    /// The underlying log
    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Number of entries in the history
    pub fn message_count(&self) -> usize {
        self.log.len()
    }

    /// Whether an exchange is open
    pub fn is_busy(&self) -> bool {
        self.open.is_some()
    }

    /// Clear the history
    ///
    /// An open exchange keeps running but its result will not be recorded.
    pub fn clear(&mut self) {
        if self.open.is_some() {
            tracing::debug!("Clearing history with an exchange in flight");
        }
        self.log.clear();
    }

    /// Check backend health
    pub async fn health_check(&self) -> bool {
        self.backend.health_check().await
    }

    /// Start an exchange: record the user entry and issue a ticket
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyQuery`] for a blank query and
    /// [`SessionError::Busy`] while another exchange is open. Nothing is
    /// recorded in either case.
    pub fn begin(&mut self, query: &str) -> Result<ExchangeTicket, SessionError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyQuery);
        }
        if self.open.is_some() {
            return Err(SessionError::Busy);
        }

        let exchange_id = self.next_exchange_id;
        self.next_exchange_id += 1;
        let generation = self.log.generation();

        self.log.append(ConversationEntry::user(query));
        self.partial = PartialAnswer::default();
        self.open = Some(OpenExchange {
            exchange_id,
            generation,
        });

        Ok(ExchangeTicket {
            exchange_id,
            generation,
            request: ChatRequest::new(query, self.mode),
        })
    }

    /// Record the result of an exchange started with [`begin`](Self::begin)
    ///
    /// Returns whether the assistant entry was appended. It is dropped when
    /// the ticket is not the open exchange, or when the log was cleared after
    /// the exchange began.
    pub fn complete(&mut self, ticket: &ExchangeTicket, report: ExchangeReport) -> bool {
        let matches = self.open
            == Some(OpenExchange {
                exchange_id: ticket.exchange_id,
                generation: ticket.generation,
            });
        if !matches {
            tracing::warn!(
                exchange_id = ticket.exchange_id,
                "Ignoring result for an exchange that is no longer open"
            );
            return false;
        }
        self.open = None;

        let appended = self.log.append_if_generation(ticket.generation, report.entry);
        if !appended {
            tracing::warn!(
                exchange_id = ticket.exchange_id,
                started_in = ticket.generation,
                current = self.log.generation(),
                "Discarding stale exchange result after history clear"
            );
        }
        appended
    }

    /// Give up on the open exchange, recording it as abandoned
    ///
    /// The assistant entry keeps the text and citations that arrived through
    /// [`submit`](Self::submit) before the interruption. With no text yet,
    /// it carries the abandon message instead. Returns whether an exchange
    /// was open.
    pub fn abandon(&mut self) -> bool {
        let Some(open) = self.open.take() else {
            return false;
        };

        let PartialAnswer { text, citations } = std::mem::take(&mut self.partial);
        tracing::warn!(
            exchange_id = open.exchange_id,
            partial_len = text.len(),
            citations = citations.len(),
            "Exchange abandoned"
        );
        let text = if text.is_empty() {
            ExchangeError::Abandoned.user_message()
        } else {
            text
        };
        self.log
            .append_if_generation(open.generation, ConversationEntry::assistant(text, citations));
        true
    }

    /// Run a full exchange for `query` in the current mode
    ///
    /// Every termination path appends exactly one assistant entry, unless the
    /// history is cleared while the exchange runs.
    ///
    /// # Errors
    ///
    /// Same as [`begin`](Self::begin). Backend failures are not errors here;
    /// they are recorded in the history and reported in the
    /// [`ExchangeReport`].
    pub async fn submit<O>(
        &mut self,
        query: &str,
        observer: &mut O,
    ) -> Result<ExchangeReport, SessionError>
    where
        O: ExchangeObserver + ?Sized,
    {
        let ticket = self.begin(query)?;
        let mut tracking = Tracking {
            partial: &mut self.partial,
            inner: observer,
        };
        let report = StreamSession::new(self.backend.as_ref())
            .run(ticket.request(), &mut tracking)
            .await;
        self.complete(&ticket, report.clone());
        Ok(report)
    }
}
