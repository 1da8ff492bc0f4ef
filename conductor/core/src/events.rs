//! Stream Events and Display Notifications
//!
//! Two directions of traffic pass through an exchange:
//!
//! - [`StreamEvent`]: typed events decoded from the backend's event stream
//! - [`ExchangeUpdate`]: notifications pushed to the UI surface while the
//!   exchange is being consumed
//!
//! The core never renders anything itself. A surface implements
//! [`ExchangeObserver`] (or passes a closure) and draws whatever it is told.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::messages::Citation;

/// A decoded event from the backend stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// Source documents retrieved for this answer (full list, replaces earlier ones)
    Sources(Vec<Citation>),
    /// A fragment of answer text
    Chunk(String),
    /// The backend finished the answer
    Done,
    /// The backend reported an error mid-stream
    Error(String),
}

impl StreamEvent {
    /// Whether this event ends the exchange
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error(_))
    }
}

/// Notification sent to the UI surface while an exchange is running
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeUpdate {
    /// Request accepted by the backend, stream opened
    Started {
        /// Endpoint path the request went to
        endpoint: String,
    },
    /// The citation set changed
    Sources {
        /// Current full citation list
        citations: Vec<Citation>,
    },
    /// More answer text arrived
    Text {
        /// Answer text accumulated so far
        partial: String,
    },
    /// Exchange finished normally
    Completed {
        /// Final answer text
        text: String,
    },
    /// Exchange failed
    Failed {
        /// User-facing failure message
        message: String,
    },
}

/// Receives display notifications during an exchange
///
/// Called synchronously from the event-processing step, once per processed
/// event, in arrival order.
pub trait ExchangeObserver {
    /// Handle one update
    fn notify(&mut self, update: &ExchangeUpdate);
}

impl<F> ExchangeObserver for F
where
    F: FnMut(&ExchangeUpdate),
{
    fn notify(&mut self, update: &ExchangeUpdate) {
        self(update);
    }
}

/// Forwards updates into a channel for surfaces that render on their own task
///
/// A closed receiver is ignored: the exchange still finalizes.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ExchangeUpdate>,
}

impl ChannelObserver {
    /// Create an observer and the receiving end for the surface
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ExchangeUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ExchangeObserver for ChannelObserver {
    fn notify(&mut self, update: &ExchangeUpdate) {
        if self.tx.send(update.clone()).is_err() {
            tracing::trace!("Exchange update receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(StreamEvent::Done.is_terminal());
        assert!(StreamEvent::Error("boom".to_string()).is_terminal());
        assert!(!StreamEvent::Chunk("x".to_string()).is_terminal());
        assert!(!StreamEvent::Sources(Vec::new()).is_terminal());
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = Vec::new();
        {
            let mut observer = |update: &ExchangeUpdate| seen.push(update.clone());
            observer.notify(&ExchangeUpdate::Text {
                partial: "혈당이".to_string(),
            });
        }
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn test_channel_observer_forwards() {
        let (mut observer, mut rx) = ChannelObserver::new();
        observer.notify(&ExchangeUpdate::Completed {
            text: "done".to_string(),
        });

        let update = rx.recv().await.unwrap();
        assert!(matches!(update, ExchangeUpdate::Completed { text } if text == "done"));
    }

    #[test]
    fn test_channel_observer_survives_dropped_receiver() {
        let (mut observer, rx) = ChannelObserver::new();
        drop(rx);
        observer.notify(&ExchangeUpdate::Failed {
            message: "gone".to_string(),
        });
    }
}
