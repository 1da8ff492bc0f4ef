//! Exchange Driver
//!
//! A [`StreamSession`] runs exactly one request/response exchange:
//!
//! ```text
//! open_stream ──► recv event ──► apply to accumulator ──► notify observer
//!                     ▲                                        │
//!                     └──────────── until terminal ◄───────────┘
//!                                        │
//!                                        ▼
//!                              finalize → assistant entry
//! ```
//!
//! Event handling:
//!
//! - `Sources`: replace the citation list (the last batch wins)
//! - `Chunk`: append to the answer text
//! - `Done`: completed, stop reading
//! - `Error`: failed with the server's message, stop reading
//! - stream closed without either: completed with whatever arrived
//!
//! Every path, including connection failures, ends in exactly one assistant
//! [`ConversationEntry`].

use std::ops::ControlFlow;
use std::time::Instant;

use crate::accumulator::{ExchangeStatus, ResponseAccumulator};
use crate::backend::{ChatBackend, ChatRequest, ExchangeError};
use crate::events::{ExchangeObserver, ExchangeUpdate, StreamEvent};
use crate::messages::ConversationEntry;

/// Outcome of a finished exchange
#[derive(Clone, Debug)]
pub struct ExchangeReport {
    /// Assistant entry built at finalization
    pub entry: ConversationEntry,
    /// Terminal status
    pub status: ExchangeStatus,
    /// The failure, when the exchange did not complete
    pub error: Option<ExchangeError>,
    /// Number of text fragments received
    pub chunk_count: u32,
    /// Wall time from request to finalization
    pub elapsed_ms: u64,
}

impl ExchangeReport {
    /// Whether the exchange completed normally
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ExchangeStatus::Completed
    }
}

/// Drives one exchange against a backend
pub struct StreamSession<'a, B: ChatBackend + ?Sized> {
    backend: &'a B,
    accumulator: ResponseAccumulator,
    failure: Option<ExchangeError>,
}

impl<'a, B: ChatBackend + ?Sized> StreamSession<'a, B> {
    /// Create a driver with a fresh accumulator
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            accumulator: ResponseAccumulator::new(),
            failure: None,
        }
    }

    /// Current accumulator state
    pub fn accumulator(&self) -> &ResponseAccumulator {
        &self.accumulator
    }

    /// Run the exchange to its end and build the assistant entry
    pub async fn run<O>(mut self, request: &ChatRequest, observer: &mut O) -> ExchangeReport
    where
        O: ExchangeObserver + ?Sized,
    {
        let start = Instant::now();
        tracing::info!(
            backend = self.backend.name(),
            mode = ?request.mode,
            query_len = request.query.len(),
            "Starting exchange"
        );

        match self.backend.open_stream(request).await {
            Ok(mut rx) => {
                observer.notify(&ExchangeUpdate::Started {
                    endpoint: request.mode.route(),
                });

                while let Some(item) = rx.recv().await {
                    let flow = match item {
                        Ok(event) => self.apply(event, observer),
                        Err(e) => {
                            self.fail(ExchangeError::Transport(e.to_string()), observer);
                            ControlFlow::Break(())
                        }
                    };
                    if flow.is_break() {
                        break;
                    }
                }

                if !self.accumulator.status().is_terminal() {
                    tracing::debug!("Stream closed without done event, completing");
                    self.complete(observer);
                }
            }
            Err(e) => {
                self.fail(e, observer);
            }
        }

        self.finalize(start)
    }

    /// Apply one event to the accumulator and notify the observer
    ///
    /// Returns `Break` once the exchange has reached a terminal status.
    pub fn apply<O>(&mut self, event: StreamEvent, observer: &mut O) -> ControlFlow<()>
    where
        O: ExchangeObserver + ?Sized,
    {
        if self.accumulator.status().is_terminal() {
            return ControlFlow::Break(());
        }

        match event {
            StreamEvent::Sources(citations) => {
                tracing::debug!(count = citations.len(), "Received sources");
                self.accumulator.replace_citations(citations);
                observer.notify(&ExchangeUpdate::Sources {
                    citations: self.accumulator.citations().to_vec(),
                });
                ControlFlow::Continue(())
            }
            StreamEvent::Chunk(fragment) => {
                self.accumulator.append_text(&fragment);
                observer.notify(&ExchangeUpdate::Text {
                    partial: self.accumulator.text().to_string(),
                });
                ControlFlow::Continue(())
            }
            StreamEvent::Done => {
                self.complete(observer);
                ControlFlow::Break(())
            }
            StreamEvent::Error(message) => {
                tracing::warn!(message = %message, "Backend sent error event");
                self.accumulator.fail(message.clone());
                self.failure = Some(ExchangeError::ServerEvent(message.clone()));
                observer.notify(&ExchangeUpdate::Failed { message });
                ControlFlow::Break(())
            }
        }
    }

    fn complete<O>(&mut self, observer: &mut O)
    where
        O: ExchangeObserver + ?Sized,
    {
        self.accumulator.complete();
        observer.notify(&ExchangeUpdate::Completed {
            text: self.accumulator.text().to_string(),
        });
    }

    fn fail<O>(&mut self, error: ExchangeError, observer: &mut O)
    where
        O: ExchangeObserver + ?Sized,
    {
        tracing::warn!(error = %error, "Exchange failed");
        let message = error.user_message();
        self.accumulator.fail(message.clone());
        self.failure = Some(error);
        observer.notify(&ExchangeUpdate::Failed { message });
    }

    /// Build the assistant entry from the accumulator
    fn finalize(self, start: Instant) -> ExchangeReport {
        let chunk_count = self.accumulator.chunk_count();
        let (text, citations, status) = self.accumulator.into_parts();

        let text = match &status {
            ExchangeStatus::Failed { message } if text.is_empty() => self
                .failure
                .as_ref()
                .map_or_else(|| message.clone(), ExchangeError::user_message),
            _ => text,
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            status = ?status,
            chunks = chunk_count,
            citations = citations.len(),
            elapsed_ms = elapsed_ms,
            "Exchange finished"
        );

        ExchangeReport {
            entry: ConversationEntry::assistant(text, citations),
            status,
            error: self.failure,
            chunk_count,
            elapsed_ms,
        }
    }
}
