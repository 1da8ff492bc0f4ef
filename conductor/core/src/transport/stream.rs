//! Response Body Pump
//!
//! Drives an [`EventFrameParser`] over a live body stream and forwards the
//! decoded events through a bounded channel. The receiving end is the lazy,
//! finite event sequence an exchange consumes: it closes when the body ends,
//! when a terminal event has been forwarded, or when a read fails.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use super::{EventFrameParser, TransportError};
use crate::events::StreamEvent;

/// Items delivered to the exchange driver
pub type EventItem = Result<StreamEvent, TransportError>;

/// Receiving end of a pumped body
pub type EventReceiver = mpsc::Receiver<EventItem>;

/// Read `body` to completion (or first terminal event), sending events to `tx`
///
/// Stops early when the receiver is dropped.
pub async fn pump_events<S, B, E>(body: S, tx: mpsc::Sender<EventItem>)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut body = std::pin::pin!(body);
    let mut parser = EventFrameParser::new();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for event in parser.push(bytes.as_ref()) {
                    if tx.send(Ok(event)).await.is_err() {
                        tracing::debug!("Event receiver dropped, stopping body pump");
                        return;
                    }
                }
                if parser.is_finished() {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Response body read failed");
                let _ = tx.send(Err(TransportError::ReceiveFailed(e.to_string()))).await;
                return;
            }
        }
    }

    if let Some(event) = parser.finish() {
        let _ = tx.send(Ok(event)).await;
    }

    if parser.dropped_frames() > 0 {
        tracing::debug!(
            dropped = parser.dropped_frames(),
            "Body closed; some frames were dropped"
        );
    }
}
