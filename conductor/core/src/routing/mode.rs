//! Chat Mode Selection
//!
//! The backend exposes one streaming endpoint per query strategy. Choosing a
//! mode is a pure lookup; nothing about the exchange itself changes.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Query strategy used for an exchange
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Direct retrieval: vector search first, then the LLM answers with that context
    #[default]
    Default,

    /// Tool-using agent: the LLM decides when to search documents
    #[serde(rename = "agent", alias = "agent_assisted")]
    AgentAssisted,
}

impl ChatMode {
    /// Every selectable mode, in menu order
    pub const ALL: [ChatMode; 2] = [ChatMode::Default, ChatMode::AgentAssisted];

    /// Endpoint path segment under `/api/chat/`
    #[must_use]
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::AgentAssisted => "agent",
        }
    }

    /// Full request path for this mode
    #[must_use]
    pub fn route(&self) -> String {
        format!("/api/chat/{}", self.endpoint_path())
    }

    /// Human-readable name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::AgentAssisted => "AI Agent",
        }
    }

    /// Short explanation shown when the mode is selected
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Default => {
                "직접 벡터 검색을 수행하여 관련 문서를 찾고, \
                 LLM에게 컨텍스트와 함께 질문을 전달하는 방식입니다."
            }
            Self::AgentAssisted => {
                "LLM이 Tool을 사용하여 필요시 자동으로 문서를 검색하고 \
                 답변하는 방식입니다. 의학과 무관한 질문도 답변할 수 있습니다."
            }
        }
    }

    /// The other mode
    #[must_use]
    pub fn toggled(&self) -> Self {
        match self {
            Self::Default => Self::AgentAssisted,
            Self::AgentAssisted => Self::Default,
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an unrecognized mode name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown chat mode '{0}' (expected 'default' or 'agent')")]
pub struct UnknownMode(pub String);

impl FromStr for ChatMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "direct" => Ok(Self::Default),
            "agent" | "ai agent" | "agent_assisted" | "agent-assisted" => Ok(Self::AgentAssisted),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}
