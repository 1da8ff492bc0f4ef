//! Response Accumulator
//!
//! Partial state of the answer currently being streamed. Owned by exactly one
//! exchange and discarded once that exchange has produced its transcript
//! entry.

use crate::messages::Citation;

/// Lifecycle of an exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// Still consuming events
    Open,
    /// Finished normally (explicit `done` or transport closed)
    Completed,
    /// Finished with an error
    Failed {
        /// User-facing failure message
        message: String,
    },
}

impl ExchangeStatus {
    /// Whether the exchange has ended
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

/// In-flight answer state
#[derive(Clone, Debug)]
pub struct ResponseAccumulator {
    text: String,
    citations: Vec<Citation>,
    status: ExchangeStatus,
    chunk_count: u32,
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseAccumulator {
    /// Create an open, empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: String::new(),
            citations: Vec::new(),
            status: ExchangeStatus::Open,
            chunk_count: 0,
        }
    }

    /// Append a text fragment
    pub fn append_text(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.chunk_count += 1;
    }

    /// Replace the citation list with the latest batch
    pub fn replace_citations(&mut self, citations: Vec<Citation>) {
        self.citations = citations;
    }

    /// Mark the exchange completed (no-op once terminal)
    pub fn complete(&mut self) {
        if self.status == ExchangeStatus::Open {
            self.status = ExchangeStatus::Completed;
        }
    }

    /// Mark the exchange failed (no-op once terminal)
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status == ExchangeStatus::Open {
            self.status = ExchangeStatus::Failed {
                message: message.into(),
            };
        }
    }

    /// Text accumulated so far
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current citations
    #[must_use]
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> &ExchangeStatus {
        &self.status
    }

    /// Number of text fragments received
    #[must_use]
    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    /// Consume the accumulator, yielding text and citations
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Citation>, ExchangeStatus) {
        (self.text, self.citations, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_text() {
        let mut acc = ResponseAccumulator::new();
        acc.append_text("혈당이");
        acc.append_text(" 높아집니다.");

        assert_eq!(acc.text(), "혈당이 높아집니다.");
        assert_eq!(acc.chunk_count(), 2);
        assert_eq!(acc.status(), &ExchangeStatus::Open);
    }

    #[test]
    fn test_citations_replaced_not_merged() {
        let mut acc = ResponseAccumulator::new();
        acc.replace_citations(vec![Citation::new("A", "a"), Citation::new("B", "b")]);
        acc.replace_citations(vec![Citation::new("C", "c")]);

        assert_eq!(acc.citations(), &[Citation::new("C", "c")]);
    }

    #[test]
    fn test_duplicate_citations_kept() {
        let mut acc = ResponseAccumulator::new();
        acc.replace_citations(vec![Citation::new("A", "a"), Citation::new("A", "a")]);
        assert_eq!(acc.citations().len(), 2);
    }

    #[test]
    fn test_first_terminal_status_wins() {
        let mut acc = ResponseAccumulator::new();
        acc.fail("boom");
        acc.complete();
        assert_eq!(
            acc.status(),
            &ExchangeStatus::Failed {
                message: "boom".to_string()
            }
        );

        let mut acc = ResponseAccumulator::new();
        acc.complete();
        acc.fail("late");
        assert_eq!(acc.status(), &ExchangeStatus::Completed);
        assert!(acc.status().is_terminal());
    }
}
