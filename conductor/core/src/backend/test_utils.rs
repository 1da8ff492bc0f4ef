//! Scripted Backend for Tests
//!
//! Replays canned event streams without a network, and records every request
//! it receives for later verification.
//!
//! # Usage
//!
//! ```ignore
//! use medrag_conductor::backend::test_utils::{ScriptedBackend, ScriptedReply};
//!
//! let backend = ScriptedBackend::new();
//! backend.push_events(vec![StreamEvent::Chunk("혈당이".into()), StreamEvent::Done]);
//! backend.push_reply(ScriptedReply::Refuse(ExchangeError::Server { status: 500 }));
//!
//! // ... run exchanges ...
//! assert_eq!(backend.request_count(), 2);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::traits::{ChatBackend, ChatRequest, ExchangeError};
use crate::events::StreamEvent;
use crate::transport::{EventItem, EventReceiver};

/// One canned reply to `open_stream`
#[derive(Debug)]
pub enum ScriptedReply {
    /// Deliver these items, then close the stream
    Items(Vec<EventItem>),
    /// Fail to open with this error
    Refuse(ExchangeError),
    /// Deliver these items and keep the stream open until the backend drops
    Stall(Vec<EventItem>),
}

/// Backend that answers from a queue of [`ScriptedReply`]s
///
/// Clones share the queue and the request history.
#[derive(Clone, Debug, Default)]
pub struct ScriptedBackend {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
    stalled: Arc<Mutex<Vec<mpsc::Sender<EventItem>>>>,
    healthy: bool,
}

impl ScriptedBackend {
    /// Create a healthy backend with an empty script
    #[must_use]
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create a backend whose health check fails
    #[must_use]
    pub fn unhealthy() -> Self {
        Self::default()
    }

    /// Queue a reply
    pub fn push_reply(&self, reply: ScriptedReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Queue a stream of well-formed events
    pub fn push_events(&self, events: Vec<StreamEvent>) {
        self.push_reply(ScriptedReply::Items(events.into_iter().map(Ok).collect()));
    }

    /// Requests received so far, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far
    #[must_use]
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn channel_for(items: Vec<EventItem>) -> (mpsc::Sender<EventItem>, EventReceiver) {
    let (tx, rx) = mpsc::channel(items.len().max(1));
    for item in items {
        // Capacity covers every item, so this never fails
        let _ = tx.try_send(item);
    }
    (tx, rx)
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    async fn open_stream(&self, request: &ChatRequest) -> Result<EventReceiver, ExchangeError> {
        lock(&self.requests).push(request.clone());

        let reply = lock(&self.replies).pop_front();
        match reply {
            Some(ScriptedReply::Items(items)) => Ok(channel_for(items).1),
            Some(ScriptedReply::Stall(items)) => {
                let (tx, rx) = channel_for(items);
                lock(&self.stalled).push(tx);
                Ok(rx)
            }
            Some(ScriptedReply::Refuse(e)) => Err(e),
            None => Err(ExchangeError::Connection("no scripted reply".to_string())),
        }
    }
}
