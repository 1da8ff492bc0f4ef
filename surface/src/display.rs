//! Terminal rendering
//!
//! [`TerminalRenderer`] is the exchange observer for the REPL. It prints the
//! citation block when sources arrive and writes answer text as it grows,
//! keeping a `▌` marker after the last character until the exchange ends.

use std::io::Write;

use medrag_conductor::{
    ChatMode, Citation, ConversationEntry, ExchangeObserver, ExchangeUpdate, Role,
};

/// In-progress marker shown after streaming text
pub const STREAM_MARKER: char = '▌';

/// Moves back over the marker, blanks it, and moves back again
const ERASE_MARKER: &str = "\u{8} \u{8}";

/// Renders exchange updates to a terminal-like writer
pub struct TerminalRenderer<W: Write> {
    out: W,
    printed: usize,
    marker_shown: bool,
}

impl<W: Write> TerminalRenderer<W> {
    /// Create a renderer writing to `out`
    pub fn new(out: W) -> Self {
        Self {
            out,
            printed: 0,
            marker_shown: false,
        }
    }

    /// Consume the renderer, returning the writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn erase_marker(&mut self) -> std::io::Result<()> {
        if self.marker_shown {
            self.out.write_all(ERASE_MARKER.as_bytes())?;
            self.marker_shown = false;
        }
        Ok(())
    }

    fn end_answer(&mut self) -> std::io::Result<()> {
        self.erase_marker()?;
        if self.printed > 0 {
            writeln!(self.out)?;
        }
        self.printed = 0;
        self.out.flush()
    }

    fn render(&mut self, update: &ExchangeUpdate) -> std::io::Result<()> {
        match update {
            ExchangeUpdate::Started { endpoint } => {
                tracing::debug!(endpoint = %endpoint, "Exchange started");
            }
            ExchangeUpdate::Sources { citations } => {
                if citations.is_empty() {
                    return Ok(());
                }
                self.erase_marker()?;
                if self.printed > 0 {
                    writeln!(self.out)?;
                }
                self.out.write_all(render_sources(citations).as_bytes())?;
                self.printed = 0;
            }
            ExchangeUpdate::Text { partial } => {
                // Text only grows; anything already printed is skipped
                let delta = partial.get(self.printed..).unwrap_or_default();
                self.erase_marker()?;
                write!(self.out, "{delta}{STREAM_MARKER}")?;
                self.printed = partial.len();
                self.marker_shown = true;
            }
            ExchangeUpdate::Completed { .. } | ExchangeUpdate::Failed { .. } => {
                return self.end_answer();
            }
        }
        self.out.flush()
    }

    /// Close out an exchange the user interrupted
    pub fn interrupted(&mut self, message: &str) -> std::io::Result<()> {
        self.end_answer()?;
        writeln!(self.out, "{message}")?;
        self.out.flush()
    }
}

impl<W: Write> ExchangeObserver for TerminalRenderer<W> {
    fn notify(&mut self, update: &ExchangeUpdate) {
        if let Err(e) = self.render(update) {
            tracing::debug!(error = %e, "Failed to write to terminal");
        }
    }
}

/// Citation block printed when sources arrive
pub fn render_sources(citations: &[Citation]) -> String {
    let mut block = format!("📚 참고한 문서 ({}개)\n", citations.len());
    for (idx, citation) in citations.iter().enumerate() {
        block.push_str(&format!("  {}. {}\n", idx + 1, citation.label));
        for line in citation.excerpt.lines().filter(|l| !l.trim().is_empty()) {
            block.push_str(&format!("     {}\n", line.trim()));
        }
        if let Some(section) = &citation.section {
            block.push_str(&format!("     섹션: {section}\n"));
        }
    }
    block.push_str("---\n");
    block
}

/// One-line session summary
pub fn status_line(mode: ChatMode, backend_url: &str, message_count: usize) -> String {
    format!(
        "Current Mode: {} | Backend: {backend_url} | Messages: {message_count}",
        mode.label()
    )
}

/// Both modes with descriptions, marking the current one
pub fn render_modes(current: ChatMode) -> String {
    let mut text = String::new();
    for mode in ChatMode::ALL {
        let marker = if mode == current { '*' } else { ' ' };
        text.push_str(&format!(
            "{marker} {} ({})\n    {}\n",
            mode.label(),
            mode.endpoint_path(),
            mode.description()
        ));
    }
    text
}

/// Replay of the conversation, assistant turns with their reference footer
pub fn render_history(entries: &[ConversationEntry]) -> String {
    if entries.is_empty() {
        return "(no messages yet)\n".to_string();
    }

    let mut text = String::new();
    for entry in entries {
        let speaker = match entry.role {
            Role::User => "🧑 You",
            Role::Assistant => "🏥 Assistant",
        };
        text.push_str(&format!("{speaker}:\n{}\n\n", entry.transcript_text().trim_end()));
    }
    text
}
