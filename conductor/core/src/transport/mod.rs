//! Transport Layer for the Backend Event Stream
//!
//! The backend answers with a server-sent-events style body: one `data: `
//! line per event, blank lines between events. This module turns the raw
//! bytes of that body into [`StreamEvent`](crate::events::StreamEvent)s.
//!
//! # Leniency
//!
//! Individual frames that fail to decode are dropped and logged at debug
//! level. Only failures of the underlying connection surface as errors.

pub mod frame;
pub mod stream;

use thiserror::Error;

pub use frame::{parse_frame, EventFrameParser, LineDecoder, DATA_PREFIX};
pub use stream::{pump_events, EventItem, EventReceiver};

/// Errors from the stream transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// A framed line did not decode into a known event shape
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Reading the response body failed mid-stream
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::MalformedFrame(e.to_string())
    }
}
