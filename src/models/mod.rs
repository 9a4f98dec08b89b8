// Data models shared by the extractor, the conversation driver and the CLI

pub mod assist_chat;

pub use assist_chat::{
    AppliedSuggestion, AssistTarget, ChatTurn, ConversationContext, MessageRole, MessageStore,
    StructuredRecommendation, SuggestionResult,
};

use serde::{Deserialize, Serialize};

/// Lifecycle of a conversation driver: `Idle -> Sending -> Idle`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Idle,
    Sending,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Idle => "idle",
            ConversationStatus::Sending => "sending",
        }
    }
}

impl std::fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Local agent CLIs that can serve assist conversations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Claude,
    Opencode,
    Cursor,
    Codex,
    Qwen,
    Droid,
}

impl AgentType {
    /// Returns all available agent types
    pub fn all() -> &'static [AgentType] {
        &[
            AgentType::Claude,
            AgentType::Opencode,
            AgentType::Cursor,
            AgentType::Codex,
            AgentType::Qwen,
            AgentType::Droid,
        ]
    }

    /// Returns the string representation of this agent type
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Claude => "claude",
            AgentType::Opencode => "opencode",
            AgentType::Cursor => "cursor",
            AgentType::Codex => "codex",
            AgentType::Qwen => "qwen",
            AgentType::Droid => "droid",
        }
    }

    /// Name of the executable for this agent
    pub fn program(&self) -> &'static str {
        match self {
            AgentType::Claude => "claude",
            AgentType::Opencode => "opencode",
            AgentType::Cursor => "cursor-agent",
            AgentType::Codex => "codex",
            AgentType::Qwen => "qwen",
            AgentType::Droid => "droid",
        }
    }

    /// Whether the CLI can report a session id and resume it later
    pub fn supports_resume(&self) -> bool {
        matches!(self, AgentType::Claude)
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(AgentType::Claude),
            "opencode" => Ok(AgentType::Opencode),
            "cursor" | "cursor-agent" => Ok(AgentType::Cursor),
            "codex" => Ok(AgentType::Codex),
            "qwen" => Ok(AgentType::Qwen),
            "droid" => Ok(AgentType::Droid),
            _ => Err(format!(
                "Unknown agent type: '{}'. Expected one of: claude, opencode, cursor, codex, qwen, droid",
                s
            )),
        }
    }
}

impl Default for AgentType {
    fn default() -> Self {
        AgentType::Claude
    }
}
