//! Backend Integration
//!
//! Abstracted access to the question-answering backend through a common
//! trait, plus the HTTP implementation used in production.
//!
//! # Usage
//!
//! ```ignore
//! use medrag_conductor::backend::{ChatBackend, ChatRequest, HttpBackend};
//! use medrag_conductor::routing::ChatMode;
//!
//! let backend = HttpBackend::new("http://localhost:3001");
//! let request = ChatRequest::new("당뇨병의 증상은 무엇인가요?", ChatMode::Default);
//! let rx = backend.open_stream(&request).await?;
//! ```

mod http;
pub mod test_utils;
mod traits;

pub use http::HttpBackend;
pub use traits::{
    ChatBackend, ChatRequest, ChatRequestBody, ExchangeError, ABANDONED_MESSAGE,
    CONNECTION_ERROR_MESSAGE,
};
