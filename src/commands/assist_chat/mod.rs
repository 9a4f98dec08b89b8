// Assist Chat commands - AI-assisted authoring of agent descriptions and system prompts
//
// This module is organized into submodules:
// - driver: the conversation driver (send / start / clear, suggestion access)
// - input: interactive chat line parsing
//
// Conversations live in memory only; transcripts are read, never written.

mod driver;
mod input;

pub use driver::{ConversationDriver, IgnoreReason, SendOutcome};
pub use input::{ChatInput, CHAT_HELP};

use crate::agents::http_executor::{API_TOKEN_ENV, HTTP_TIMEOUT_SECS};
use crate::agents::{AgentError, AgentExecutor, CliAgentExecutor, HttpAgentExecutor};
use crate::config::{AgentBackend, AgentConfig};
use crate::models::{ChatTurn, ConversationContext};
use crate::utils::ResultExt;
use std::sync::Arc;

/// Synthesize the opening user message for a conversation.
///
/// A blank current value asks for a draft, anything else asks for an
/// improvement of the existing text.
pub fn build_initial_prompt(context: &ConversationContext) -> String {
    let field = context.assist_target.display_name();
    let agent = match context.agent_name.trim() {
        "" => "my agent".to_string(),
        name => format!("my agent \"{}\"", name),
    };
    let type_note = match context.agent_type_hint.trim() {
        "" => String::new(),
        hint => format!(" It is a {} agent.", hint),
    };

    if context.has_current_value() {
        format!(
            "Help me improve the {} for {}.{} Here is the current version:\n\n{}",
            field,
            agent,
            type_note,
            context.current_field_value.trim()
        )
    } else {
        format!(
            "Help me write a {} for {}.{} Suggest a first draft, or ask me what you need to know.",
            field, agent, type_note
        )
    }
}

/// Build the agent execution collaborator described by the config
pub fn executor_from_config(config: &AgentConfig) -> Result<Arc<dyn AgentExecutor>, AgentError> {
    match config.backend {
        AgentBackend::Cli => {
            let mut executor =
                CliAgentExecutor::new(config.agent_type).with_history(config.include_history);
            if let Some(program) = &config.program {
                executor = executor.with_program(program);
            }
            if let Some(dir) = &config.working_dir {
                executor = executor.with_working_dir(dir);
            }
            if let Some(secs) = config.timeout_secs {
                executor = executor.with_timeout_secs(secs);
            }
            log::debug!("Using {} CLI backend", config.agent_type);
            Ok(Arc::new(executor))
        }
        AgentBackend::Http => {
            let base_url = config.base_url.clone().ok_or_else(|| {
                AgentError::InvalidResponse("http backend requires a base URL".to_string())
            })?;
            let agent_id = config.agent_id.clone().ok_or_else(|| {
                AgentError::InvalidResponse("http backend requires an agent id".to_string())
            })?;
            let executor = HttpAgentExecutor::new(
                base_url,
                agent_id,
                config.timeout_secs.unwrap_or(HTTP_TIMEOUT_SECS),
            )?
            .with_token(std::env::var(API_TOKEN_ENV).ok());
            log::debug!("Using HTTP backend at {}", executor.endpoint());
            Ok(Arc::new(executor))
        }
    }
}

/// Parse a JSON transcript: an array of turns with `role` and `content`
pub fn parse_transcript(json: &str) -> Result<Vec<ChatTurn>, String> {
    serde_json::from_str::<Vec<ChatTurn>>(json).with_context("Invalid transcript")
}
