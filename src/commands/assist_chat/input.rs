// Interactive chat input: slash commands versus plain messages

/// One line typed into the interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Print the current suggestion
    Suggest,
    /// Print the value that would populate the target field
    Apply,
    Clear,
    Quit,
    Help,
    /// Slash command nobody recognizes
    Unknown(String),
    /// Anything else is sent to the agent
    Message(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return ChatInput::Message(trimmed.to_string());
        };

        match command.to_lowercase().as_str() {
            "suggest" | "s" => ChatInput::Suggest,
            "apply" | "a" => ChatInput::Apply,
            "clear" => ChatInput::Clear,
            "quit" | "exit" | "q" => ChatInput::Quit,
            "help" | "?" => ChatInput::Help,
            _ => ChatInput::Unknown(trimmed.to_string()),
        }
    }
}

pub const CHAT_HELP: &str = "\
Commands:
  /suggest   show the current suggestion
  /apply     show the value to apply to the field
  /clear     start over
  /quit      leave the chat
Anything else is sent to the assistant.";
