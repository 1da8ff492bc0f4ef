//! Conductor Core - Streaming Chat Client for the Medical RAG Backend
//!
//! This crate holds the client side of a medical question-answering chat:
//! it sends a question to the RAG backend, consumes the streamed answer as it
//! arrives, and keeps the session history. It is independent of any
//! presentation; a terminal REPL, a test harness, or another surface drives
//! it through [`ChatSession`] and observes progress through
//! [`ExchangeObserver`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Surface                                 │
//! │        (REPL, tests)  ◄── ExchangeUpdate (observer) ──┐          │
//! └───────────────┬───────────────────────────────────────┼──────────┘
//!                 │ submit(query)                         │
//! ┌───────────────┼───────────────────────────────────────┼──────────┐
//! │               ▼          CONDUCTOR CORE               │          │
//! │  ┌────────────────────┐   ┌────────────────────────────┴───────┐ │
//! │  │    ChatSession     │──►│  StreamSession                     │ │
//! │  │ mode, log, ticket  │   │  ResponseAccumulator               │ │
//! │  └────────────────────┘   └───────────────┬────────────────────┘ │
//! │                                           │ StreamEvent          │
//! │  ┌────────────┐   ┌───────────────────────┴────────────────────┐ │
//! │  │  ChatMode  │──►│  ChatBackend (HttpBackend)                 │ │
//! │  │  routing   │   │  EventFrameParser ◄── `data: {...}` bytes  │ │
//! │  └────────────┘   └────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatSession`]: mode, history, and the single in-flight exchange
//! - [`StreamSession`]: drives one request/response exchange
//! - [`ResponseAccumulator`]: answer text, citations, and status of one exchange
//! - [`ConversationLog`]: ordered history of user and assistant entries
//! - [`ChatMode`]: picks the backend endpoint
//! - [`EventFrameParser`]: turns body bytes into [`StreamEvent`]s
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use medrag_conductor::{load_config, ChatSession, ExchangeUpdate, HttpBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let backend = Arc::new(HttpBackend::from_config(&config)?);
//!     let mut session = ChatSession::new(backend, config.default_mode);
//!
//!     let report = session
//!         .submit("당뇨병의 증상은 무엇인가요?", &mut |update: &ExchangeUpdate| {
//!             println!("{update:?}");
//!         })
//!         .await?;
//!
//!     println!("{}", report.entry.text);
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`accumulator`]: per-exchange response state
//! - [`backend`]: backend trait and HTTP implementation
//! - [`config`]: TOML + environment configuration
//! - [`events`]: parsed stream events and observer notifications
//! - [`exchange`]: single-exchange driver
//! - [`messages`]: conversation entries and citations
//! - [`routing`]: mode to endpoint selection
//! - [`session`]: session state and the conversation log
//! - [`transport`]: event-stream framing
//!
//! # No UI Dependencies
//!
//! Nothing here prints. Rendering the in-progress marker, numbering
//! citations, and the status line are all surface concerns.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod accumulator;
pub mod backend;
pub mod config;
pub mod events;
pub mod exchange;
pub mod messages;
pub mod routing;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use accumulator::{ExchangeStatus, ResponseAccumulator};
pub use backend::{
    ChatBackend, ChatRequest, ExchangeError, HttpBackend, ABANDONED_MESSAGE,
    CONNECTION_ERROR_MESSAGE,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ConfigError,
    ConfigOverrides, ConfigSource,
};
pub use events::{ChannelObserver, ExchangeObserver, ExchangeUpdate, StreamEvent};
pub use exchange::{ExchangeReport, StreamSession};
pub use messages::{Citation, ConversationEntry, EntryId, Role, SessionId};
pub use routing::{ChatMode, UnknownMode};
pub use session::{ChatSession, ConversationLog, ExchangeTicket, SessionError};
pub use transport::{EventFrameParser, TransportError};
