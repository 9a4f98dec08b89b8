// Assist Chat Models - canonical types for prompt-assist conversations and suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Message Role Enum
// ============================================================================

/// Author of a chat turn.
/// Serializes/deserializes as lowercase strings, as in transcript JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(format!(
                "Invalid message role: '{}'. Expected 'user' or 'assistant'",
                s
            )),
        }
    }
}

// ============================================================================
// Chat Turns
// ============================================================================

/// One message in an assist conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurn {
    #[serde(default = "new_turn_id")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_turn_id() -> String {
    Uuid::new_v4().to_string()
}

impl ChatTurn {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: new_turn_id(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// Ordered, append-only sequence of chat turns for one conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    turns: Vec<ChatTurn>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user turn and return a copy of it
    pub fn push_user(&mut self, content: impl Into<String>) -> ChatTurn {
        self.push(ChatTurn::user(content))
    }

    /// Append an assistant turn and return a copy of it
    pub fn push_assistant(&mut self, content: impl Into<String>) -> ChatTurn {
        self.push(ChatTurn::assistant(content))
    }

    fn push(&mut self, turn: ChatTurn) -> ChatTurn {
        self.turns.push(turn.clone());
        turn
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Assistant turns, most recent first
    pub fn assistant_turns_newest_first(&self) -> impl Iterator<Item = &ChatTurn> {
        self.turns.iter().rev().filter(|t| t.is_assistant())
    }

    pub fn latest_assistant(&self) -> Option<&ChatTurn> {
        self.assistant_turns_newest_first().next()
    }
}

impl From<Vec<ChatTurn>> for MessageStore {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }
}

// ============================================================================
// Assist Target
// ============================================================================

/// Which agent-authoring field a conversation's suggestions will populate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistTarget {
    Description,
    SystemPrompt,
}

impl AssistTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistTarget::Description => "description",
            AssistTarget::SystemPrompt => "system_prompt",
        }
    }

    /// Human-readable label used in prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            AssistTarget::Description => "description",
            AssistTarget::SystemPrompt => "system prompt",
        }
    }
}

impl std::fmt::Display for AssistTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssistTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "description" => Ok(AssistTarget::Description),
            "system_prompt" | "systemprompt" => Ok(AssistTarget::SystemPrompt),
            _ => Err(format!(
                "Invalid assist target: '{}'. Expected 'description' or 'system_prompt'",
                s
            )),
        }
    }
}

impl Default for AssistTarget {
    fn default() -> Self {
        AssistTarget::Description
    }
}

// ============================================================================
// Conversation Context
// ============================================================================

/// Prompt-construction inputs for one conversation.
/// Not interpreted by the suggestion extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub assist_target: AssistTarget,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub agent_type_hint: String,
    #[serde(default)]
    pub current_field_value: String,
}

impl ConversationContext {
    pub fn new(assist_target: AssistTarget, agent_name: impl Into<String>) -> Self {
        Self {
            assist_target,
            agent_name: agent_name.into(),
            ..Default::default()
        }
    }

    pub fn with_type_hint(mut self, hint: impl Into<String>) -> Self {
        self.agent_type_hint = hint.into();
        self
    }

    pub fn with_current_value(mut self, value: impl Into<String>) -> Self {
        self.current_field_value = value.into();
        self
    }

    /// True when there is an existing value to improve rather than a blank field
    pub fn has_current_value(&self) -> bool {
        !self.current_field_value.trim().is_empty()
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// Normalized suggestion extracted from assistant turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionResult {
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl SuggestionResult {
    /// A suggestion recovered from unstructured text
    pub fn plain(recommendation: impl Into<String>) -> Self {
        Self {
            recommendation: recommendation.into(),
            reasoning: None,
            comments: None,
        }
    }
}

/// The `recommendation` payload of a structured assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredRecommendation {
    Text(String),
    Structured {
        role: Option<String>,
        capabilities: Vec<String>,
        constraints: Vec<String>,
        /// Other string-valued fields, in document order
        extras: Vec<(String, String)>,
    },
}

/// A suggestion ready to be written into its target field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedSuggestion {
    pub target: AssistTarget,
    pub value: String,
}
