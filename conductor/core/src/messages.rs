//! Conversation Messages
//!
//! Transcript types shared between the core and any UI surface. Entries are
//! created by the session layer only: a user entry on submit, an assistant
//! entry when an exchange finalizes. Once appended to the log they are never
//! mutated.

use serde::{Deserialize, Serialize};

/// Who produced a conversation entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing questions
    User,
    /// The backend answer
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A source document the backend used to produce an answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Document label (the disease name on the wire)
    pub label: String,
    /// Preview of the document content
    pub excerpt: String,
    /// Section of the document, when the backend knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl Citation {
    /// Create a citation without a section
    pub fn new(label: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            excerpt: excerpt.into(),
            section: None,
        }
    }

    /// Attach a section; empty strings are treated as absent
    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        let section = section.into();
        self.section = if section.is_empty() {
            None
        } else {
            Some(section)
        };
        self
    }
}

/// Unique identifier for a conversation entry
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub String);

impl EntryId {
    /// Generate a new unique entry ID
    pub fn new() -> Self {
        Self(format!("entry_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random session ID
    pub fn new() -> Self {
        Self(format!("session_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One turn of the conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    /// Unique entry ID
    pub id: EntryId,
    /// Who produced this entry
    pub role: Role,
    /// Entry text (the query, or the final answer / error message)
    pub text: String,
    /// Sources attached to an assistant answer, in arrival order
    #[serde(default)]
    pub citations: Vec<Citation>,
}

impl ConversationEntry {
    /// Create a user entry
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::User,
            text: text.into(),
            citations: Vec::new(),
        }
    }

    /// Create an assistant entry
    pub fn assistant(text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            id: EntryId::new(),
            role: Role::Assistant,
            text: text.into(),
            citations,
        }
    }

    /// Text as it should appear in a replayed transcript
    ///
    /// Assistant answers with sources get a numbered reference footer.
    pub fn transcript_text(&self) -> String {
        if self.citations.is_empty() {
            return self.text.clone();
        }

        let mut rendered = self.text.clone();
        rendered.push_str("\n\n---\n**참고 문서:**\n");
        for (idx, citation) in self.citations.iter().enumerate() {
            rendered.push_str(&format!("{}. {}\n", idx + 1, citation.label));
        }
        rendered
    }
}
