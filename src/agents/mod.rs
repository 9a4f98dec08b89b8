// Agent execution collaborators
//
// The conversation driver talks to agents only through `AgentExecutor`.
// Two implementations ship with the crate:
// - cli_executor: runs a local agent CLI (claude, opencode, ...)
// - http_executor: calls a remote agent execution endpoint

pub mod cli_executor;
pub mod http_executor;
pub mod path_resolver;
pub mod prompt_builder;

pub use cli_executor::CliAgentExecutor;
pub use http_executor::HttpAgentExecutor;
pub use path_resolver::{AgentAvailability, CliPathResolver};
pub use prompt_builder::build_agent_prompt;

use crate::models::{ChatTurn, ConversationContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of an agent execution call
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Agent timed out after {0} seconds. The process may have hung or be unresponsive.")]
    Timeout(u64),

    #[error("Agent process was interrupted (SIGINT/SIGTERM)")]
    Interrupted,

    #[error("Agent returned error (exit code: {0:?})")]
    ExitStatus(Option<i32>),

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Agent request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Agent API error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Invalid agent response: {0}")]
    InvalidResponse(String),
}

/// One call to the agent execution collaborator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// Text of the user turn being sent
    pub user_text: String,
    /// Turns that precede the one being sent
    pub prior_turns: Vec<ChatTurn>,
    /// External session to resume, if a previous reply reported one
    pub session_id: Option<String>,
    pub context: Option<ConversationContext>,
}

/// Reply from the agent execution collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentReply {
    pub output: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl AgentReply {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }
}

/// External "agent execution" collaborator
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(&self, request: AgentRequest) -> Result<AgentReply, AgentError>;
}
