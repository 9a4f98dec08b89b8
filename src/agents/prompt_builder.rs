//! Prompt construction for agents that take a single text prompt
//!
//! CLI agents receive everything in one prompt: the assist instructions,
//! the agent being authored, the conversation so far, and the new message.

use crate::agents::AgentRequest;
use crate::models::{AssistTarget, MessageRole};

/// Build the full prompt for one assist turn.
///
/// History is left out when `include_history` is false, which callers use
/// when the agent resumes an external session that already holds it.
pub fn build_agent_prompt(request: &AgentRequest, include_history: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str(ASSIST_SYSTEM_PROMPT);

    if let Some(context) = &request.context {
        prompt.push_str("\n\n=== AGENT BEING AUTHORED ===\n\n");
        prompt.push_str(&format!(
            "**Field to write:** {}\n",
            context.assist_target.display_name()
        ));
        prompt.push_str(target_guidance(context.assist_target));
        prompt.push('\n');

        if !context.agent_name.trim().is_empty() {
            prompt.push_str(&format!("**Agent name:** {}\n", context.agent_name.trim()));
        }
        if !context.agent_type_hint.trim().is_empty() {
            prompt.push_str(&format!(
                "**Agent type:** {}\n",
                context.agent_type_hint.trim()
            ));
        }
        if context.has_current_value() {
            prompt.push_str(&format!(
                "\n**Current {}:**\n```\n{}\n```\n",
                context.assist_target.display_name(),
                context.current_field_value.trim()
            ));
        }

        prompt.push_str("\n=== END AGENT ===\n\n");
    } else {
        prompt.push_str("\n\n");
    }

    if include_history && !request.prior_turns.is_empty() {
        prompt.push_str("=== Conversation History ===\n\n");
        for turn in &request.prior_turns {
            let role_label = match turn.role {
                MessageRole::User => "User",
                MessageRole::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{}: {}\n\n", role_label, turn.content));
        }
        prompt.push_str("=== End History ===\n\n");
    }

    prompt.push_str(&format!("User: {}\n\nAssistant:", request.user_text));
    prompt
}

fn target_guidance(target: AssistTarget) -> &'static str {
    match target {
        AssistTarget::Description => {
            "A description is one or two sentences telling users what the agent does and who it is for."
        }
        AssistTarget::SystemPrompt => {
            "A system prompt defines the agent's role, its capabilities and the guidelines it must follow. \
             Use the structured recommendation form (role, capabilities, constraints)."
        }
    }
}

const ASSIST_SYSTEM_PROMPT: &str = r#"You are a Prompt Assistant helping the user author an AI agent.

YOUR GOAL:
Help the user write or improve one field of their agent's configuration.

INSTRUCTIONS:
- If the request is unclear, ask at most 2 short clarifying questions
- Otherwise answer with a suggestion the user can apply directly
- Keep suggestions concise and specific to the agent described

RESPONSE FORMAT:
When you have a suggestion, reply with a single JSON object:

```json
{
  "recommendation": "the suggested text",
  "reasoning": "one sentence on why this works",
  "comments": "optional follow-up question or remark"
}
```

For system prompts, "recommendation" may be an object instead:

```json
{
  "recommendation": {
    "role": "You are ...",
    "capabilities": ["...", "..."],
    "constraints": ["...", "..."]
  },
  "reasoning": "..."
}
```

DO NOT:
- Wrap the JSON in extra commentary when giving a suggestion
- Invent features the user did not mention
"#;
