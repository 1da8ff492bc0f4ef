//! Event Frame Protocol
//!
//! Wire format of the backend answer stream.
//!
//! # Frame Format
//!
//! ```text
//! data: {"type":"sources","sources":[{"disease_name":"...","content":"...","section":"..."}]}
//!
//! data: {"type":"chunk","chunk":"혈당이"}
//!
//! data: {"type":"done"}
//! ```
//!
//! Only lines starting with `data: ` carry a payload. Blank separator lines
//! and any other line are ignored. A payload whose JSON is invalid, or whose
//! shape does not match its `type`, is dropped without ending the stream.
//! Unknown `type` values are ignored so newer servers can add event kinds.

use serde::Deserialize;
use serde_json::Value;

use super::TransportError;
use crate::events::StreamEvent;
use crate::messages::Citation;

/// Prefix that marks a payload line
pub const DATA_PREFIX: &str = "data: ";

/// Citation record as the backend sends it
#[derive(Debug, Deserialize)]
struct WireCitation {
    disease_name: String,
    content: String,
    #[serde(default)]
    section: Option<String>,
}

impl From<WireCitation> for Citation {
    fn from(wire: WireCitation) -> Self {
        let citation = Citation::new(wire.disease_name, wire.content);
        match wire.section {
            Some(section) => citation.with_section(section),
            None => citation,
        }
    }
}

/// Parse a single line of the stream
///
/// Returns `None` for unframed lines, malformed payloads and unknown event
/// types.
pub fn parse_frame(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;

    match decode_payload(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "Dropping malformed frame");
            None
        }
    }
}

/// Decode the JSON part of a framed line
fn decode_payload(payload: &str) -> Result<Option<StreamEvent>, TransportError> {
    let value: Value = serde_json::from_str(payload)?;
    let object = value
        .as_object()
        .ok_or_else(|| TransportError::MalformedFrame("payload is not an object".to_string()))?;

    match object.get("type").and_then(Value::as_str) {
        Some("sources") => {
            let citations = match object.get("sources") {
                None | Some(Value::Null) => Vec::new(),
                Some(sources) => Vec::<WireCitation>::deserialize(sources)?
                    .into_iter()
                    .map(Citation::from)
                    .collect(),
            };
            Ok(Some(StreamEvent::Sources(citations)))
        }
        Some("chunk") => {
            let chunk = object
                .get("chunk")
                .and_then(Value::as_str)
                .ok_or_else(|| TransportError::MalformedFrame("chunk without text".to_string()))?;
            Ok(Some(StreamEvent::Chunk(chunk.to_string())))
        }
        Some("done") => Ok(Some(StreamEvent::Done)),
        kind => {
            if let Some(error) = object.get("error") {
                let message = match error {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                return Ok(Some(StreamEvent::Error(message)));
            }
            tracing::trace!(kind = ?kind, "Ignoring unknown event type");
            Ok(None)
        }
    }
}

/// Splits a byte stream into text lines
///
/// Bytes are buffered until a newline arrives, so multi-byte UTF-8 sequences
/// split across network chunks decode correctly. A trailing `\r` is removed.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes to the buffer
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete line, if one is buffered
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Take whatever is left once the transport has closed
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let mut rest = std::mem::take(&mut self.buffer);
        if rest.last() == Some(&b'\r') {
            rest.pop();
        }
        Some(String::from_utf8_lossy(&rest).into_owned())
    }

    /// Number of buffered bytes not yet returned as a line
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Stateful parser for one response body
///
/// Once a terminal event (`Done` or an error) has been produced the parser is
/// finished and ignores any further input. A parser is tied to a single
/// response and is not reused.
#[derive(Debug, Default)]
pub struct EventFrameParser {
    lines: LineDecoder,
    finished: bool,
    dropped: usize,
}

impl EventFrameParser {
    /// Create a parser for a new response body
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and collect the events they complete
    pub fn push(&mut self, data: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.finished {
            return events;
        }

        self.lines.push(data);
        while let Some(line) = self.lines.next_line() {
            if let Some(event) = self.parse_line(&line) {
                events.push(event);
                if self.finished {
                    break;
                }
            }
        }
        events
    }

    /// Parse one already-split line
    pub fn parse_line(&mut self, line: &str) -> Option<StreamEvent> {
        if self.finished {
            return None;
        }

        let event = parse_frame(line);
        match &event {
            Some(event) if event.is_terminal() => self.finished = true,
            None if line.starts_with(DATA_PREFIX) => self.dropped += 1,
            _ => {}
        }
        event
    }

    /// Flush a final line that had no trailing newline
    pub fn finish(&mut self) -> Option<StreamEvent> {
        let line = self.lines.finish()?;
        self.parse_line(&line)
    }

    /// Whether a terminal event has been seen
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of framed lines that produced no event
    #[must_use]
    pub fn dropped_frames(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_chunk() {
        let event = parse_frame(r#"data: {"type":"chunk","chunk":"혈당이"}"#);
        assert_eq!(event, Some(StreamEvent::Chunk("혈당이".to_string())));
    }

    #[test]
    fn test_parse_sources() {
        let line = r#"data: {"type":"sources","sources":[{"disease_name":"당뇨병","content":"...","section":"증상"},{"disease_name":"고혈압","content":"요약"}]}"#;
        let event = parse_frame(line);

        assert_eq!(
            event,
            Some(StreamEvent::Sources(vec![
                Citation::new("당뇨병", "...").with_section("증상"),
                Citation::new("고혈압", "요약"),
            ]))
        );
    }

    #[test]
    fn test_parse_sources_null_section_and_missing_list() {
        let event = parse_frame(
            r#"data: {"type":"sources","sources":[{"disease_name":"A","content":"b","section":null}]}"#,
        );
        assert_eq!(event, Some(StreamEvent::Sources(vec![Citation::new("A", "b")])));

        let event = parse_frame(r#"data: {"type":"sources"}"#);
        assert_eq!(event, Some(StreamEvent::Sources(Vec::new())));
    }

    #[test]
    fn test_parse_done_and_error() {
        assert_eq!(parse_frame(r#"data: {"type":"done"}"#), Some(StreamEvent::Done));
        assert_eq!(
            parse_frame(r#"data: {"error":"An error occurred"}"#),
            Some(StreamEvent::Error("An error occurred".to_string()))
        );
    }

    #[test]
    fn test_error_with_unknown_type_is_error() {
        assert_eq!(
            parse_frame(r#"data: {"type":"status","error":"overloaded"}"#),
            Some(StreamEvent::Error("overloaded".to_string()))
        );
    }

    #[test]
    fn test_non_string_error_is_stringified() {
        assert_eq!(
            parse_frame(r#"data: {"error":{"code":500}}"#),
            Some(StreamEvent::Error(r#"{"code":500}"#.to_string()))
        );
    }

    #[test]
    fn test_ignored_lines() {
        assert_eq!(parse_frame(""), None);
        assert_eq!(parse_frame(": keep-alive"), None);
        assert_eq!(parse_frame("event: message"), None);
        assert_eq!(parse_frame(r#"data:{"type":"done"}"#), None);
        assert_eq!(parse_frame(r#"data: {"type":"progress","step":2}"#), None);
    }

    #[test]
    fn test_malformed_frames_dropped() {
        assert_eq!(parse_frame("data: {not json"), None);
        assert_eq!(parse_frame("data: [DONE]"), None);
        assert_eq!(parse_frame(r#"data: {"type":"chunk"}"#), None);
        assert_eq!(parse_frame(r#"data: {"type":"chunk","chunk":7}"#), None);
        assert_eq!(
            parse_frame(r#"data: {"type":"sources","sources":[{"content":"no name"}]}"#),
            None
        );
        assert_eq!(parse_frame(r#"data: {"type":"sources","sources":"x"}"#), None);
    }

    #[test]
    fn test_line_decoder_splits_lines() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"data: a\r\n\ndata: b");

        assert_eq!(decoder.next_line().as_deref(), Some("data: a"));
        assert_eq!(decoder.next_line().as_deref(), Some(""));
        assert_eq!(decoder.next_line(), None);
        assert_eq!(decoder.pending(), 7);
        assert_eq!(decoder.finish().as_deref(), Some("data: b"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_line_decoder_utf8_across_chunks() {
        let line = "data: 혈당\n".as_bytes();
        // Split inside the first Hangul syllable
        let (head, tail) = line.split_at(8);

        let mut decoder = LineDecoder::new();
        decoder.push(head);
        assert_eq!(decoder.next_line(), None);
        decoder.push(tail);
        assert_eq!(decoder.next_line().as_deref(), Some("data: 혈당"));
    }

    #[test]
    fn test_parser_across_pushes() {
        let body = concat!(
            "data: {\"type\":\"chunk\",\"chunk\":\"혈당이\"}\n\n",
            "data: {\"type\":\"chunk\",\"chunk\":\" 높아집니다.\"}\n\n",
            "data: {\"type\":\"done\"}\n\n",
        )
        .as_bytes();

        let mut parser = EventFrameParser::new();
        let mut events = Vec::new();
        for piece in body.chunks(5) {
            events.extend(parser.push(piece));
        }

        assert_eq!(
            events,
            vec![
                StreamEvent::Chunk("혈당이".to_string()),
                StreamEvent::Chunk(" 높아집니다.".to_string()),
                StreamEvent::Done,
            ]
        );
        assert!(parser.is_finished());
    }

    #[test]
    fn test_parser_stops_after_terminal_event() {
        let mut parser = EventFrameParser::new();
        let events = parser.push(
            b"data: {\"error\":\"boom\"}\n\ndata: {\"type\":\"chunk\",\"chunk\":\"late\"}\n\n",
        );

        assert_eq!(events, vec![StreamEvent::Error("boom".to_string())]);
        assert!(parser.push(b"data: {\"type\":\"done\"}\n").is_empty());
        assert_eq!(parser.finish(), None);
    }

    #[test]
    fn test_parser_counts_dropped_frames() {
        let mut parser = EventFrameParser::new();
        let events = parser.push(b"data: {oops\n\n: comment\ndata: {\"type\":\"mystery\"}\n");

        assert!(events.is_empty());
        assert_eq!(parser.dropped_frames(), 2);
        assert!(!parser.is_finished());
    }

    #[test]
    fn test_parser_flushes_unterminated_last_line() {
        let mut parser = EventFrameParser::new();
        assert!(parser.push(b"data: {\"type\":\"done\"}").is_empty());
        assert_eq!(parser.finish(), Some(StreamEvent::Done));
        assert!(parser.is_finished());
    }
}
