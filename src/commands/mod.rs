// Command handlers for the prompt assist surfaces

pub mod assist_chat;

// Re-export commands for the binary and embedders
pub use assist_chat::*;
