//! Conversation driver - owns one assist conversation and mediates agent calls
//!
//! State machine: `Idle -> Sending -> Idle`, with an optional error message
//! after a failed send. At most one send is in flight; a second send while
//! busy is dropped. The state mutex is never held across an await.

use crate::agents::{AgentExecutor, AgentRequest};
use crate::events::{
    to_payload, AssistErrorPayload, AssistEventEmitter, ClearedPayload, NoopEmitter,
    StatusChangedPayload, TurnAppendedPayload, EVENT_ASSIST_CLEARED, EVENT_ASSIST_ERROR,
    EVENT_ASSIST_STATUS_CHANGED, EVENT_ASSIST_TURN_APPENDED,
};
use crate::models::{
    AppliedSuggestion, ChatTurn, ConversationContext, ConversationStatus, MessageStore,
    SuggestionResult,
};
use crate::parsers::{ExtractionOptions, SuggestionExtractor};
use crate::utils::lock_mutex_recover;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::build_initial_prompt;

/// Why a send was dropped without contacting the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyMessage,
    Busy,
}

/// Result of a send
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The agent replied; the assistant turn was appended
    Replied(ChatTurn),
    /// The agent call failed; the message is now the conversation error
    Failed(String),
    /// Nothing was sent
    Ignored(IgnoreReason),
    /// The conversation was cleared while the call was in flight; the reply was dropped
    Discarded,
}

#[derive(Debug)]
struct ConversationState {
    store: MessageStore,
    status: ConversationStatus,
    error: Option<String>,
    session_id: Option<String>,
    context: Option<ConversationContext>,
    /// Bumped on every reset so late replies can be recognized
    generation: u64,
}

impl ConversationState {
    fn new() -> Self {
        Self {
            store: MessageStore::new(),
            status: ConversationStatus::Idle,
            error: None,
            session_id: None,
            context: None,
            generation: 0,
        }
    }

    fn reset(&mut self) -> ConversationStatus {
        let old_status = self.status;
        self.store.clear();
        self.session_id = None;
        self.error = None;
        self.status = ConversationStatus::Idle;
        self.generation += 1;
        old_status
    }
}

pub struct ConversationDriver {
    id: String,
    executor: Arc<dyn AgentExecutor>,
    emitter: Arc<dyn AssistEventEmitter>,
    extractor: SuggestionExtractor,
    state: Mutex<ConversationState>,
}

impl ConversationDriver {
    pub fn new(executor: Arc<dyn AgentExecutor>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            executor,
            emitter: Arc::new(NoopEmitter),
            extractor: SuggestionExtractor::new(),
            state: Mutex::new(ConversationState::new()),
        }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn AssistEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    pub fn with_extraction_options(mut self, options: ExtractionOptions) -> Self {
        self.extractor = SuggestionExtractor::with_options(options);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Reset the conversation and send the synthesized opening message
    pub async fn start(&self, context: ConversationContext) -> SendOutcome {
        {
            let mut state = lock_mutex_recover(&self.state);
            let old_status = state.reset();
            state.context = Some(context.clone());
            drop(state);
            self.emit_cleared(old_status);
        }

        let prompt = build_initial_prompt(&context);
        log::info!(
            "Starting {} assist for agent '{}'",
            context.assist_target,
            context.agent_name
        );
        self.send(&prompt, Some(context)).await
    }

    /// Send a user message and wait for the agent's reply
    pub async fn send(&self, text: &str, context: Option<ConversationContext>) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored(IgnoreReason::EmptyMessage);
        }

        let mut cleared = false;
        let (request, generation, user_turn) = {
            let mut state = lock_mutex_recover(&self.state);
            if state.status == ConversationStatus::Sending {
                log::debug!("Conversation {} is busy, dropping send", self.id);
                return SendOutcome::Ignored(IgnoreReason::Busy);
            }

            if let Some(context) = context {
                if Self::target_changed(&state, &context) {
                    state.reset();
                    cleared = true;
                }
                state.context = Some(context);
            }

            let prior_turns = state.store.turns().to_vec();
            let user_turn = state.store.push_user(text);
            state.status = ConversationStatus::Sending;
            state.error = None;

            let request = AgentRequest {
                user_text: text.to_string(),
                prior_turns,
                session_id: state.session_id.clone(),
                context: state.context.clone(),
            };
            (request, state.generation, user_turn)
        };

        if cleared {
            self.emit_cleared(ConversationStatus::Idle);
        }
        self.emit_turn(&user_turn);
        self.emit_status(ConversationStatus::Idle, ConversationStatus::Sending);

        let result = self.executor.execute(request).await;

        let mut state = lock_mutex_recover(&self.state);
        // The reset that bumped the generation already emitted Cleared and
        // the Sending -> Idle status change for this send
        if state.generation != generation {
            log::debug!(
                "Conversation {} was reset while sending, dropping reply",
                self.id
            );
            return SendOutcome::Discarded;
        }
        state.status = ConversationStatus::Idle;

        match result {
            Ok(reply) => {
                let turn = state.store.push_assistant(reply.output);
                if let Some(session_id) = reply.session_id {
                    state.session_id = Some(session_id);
                }
                drop(state);

                self.emit_turn(&turn);
                self.emit_status(ConversationStatus::Sending, ConversationStatus::Idle);
                SendOutcome::Replied(turn)
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Assist agent call failed: {}", message);
                state.error = Some(message.clone());
                drop(state);

                self.emitter.emit(
                    EVENT_ASSIST_ERROR,
                    to_payload(AssistErrorPayload {
                        conversation_id: self.id.clone(),
                        message: message.clone(),
                    }),
                );
                self.emit_status(ConversationStatus::Sending, ConversationStatus::Idle);
                SendOutcome::Failed(message)
            }
        }
    }

    /// Discard all turns, the session id and any error
    pub fn clear(&self) {
        let old_status = lock_mutex_recover(&self.state).reset();
        self.emit_cleared(old_status);
    }

    /// Replace the context; a different assist target clears the conversation
    pub fn set_context(&self, context: ConversationContext) {
        let mut state = lock_mutex_recover(&self.state);
        let cleared = if Self::target_changed(&state, &context) {
            Some(state.reset())
        } else {
            None
        };
        state.context = Some(context);
        drop(state);

        if let Some(old_status) = cleared {
            self.emit_cleared(old_status);
        }
    }

    fn target_changed(state: &ConversationState, context: &ConversationContext) -> bool {
        state
            .context
            .as_ref()
            .map_or(false, |current| current.assist_target != context.assist_target)
    }

    // ------------------------------------------------------------------------
    // Suggestions
    // ------------------------------------------------------------------------

    /// Best suggestion in the current transcript
    pub fn suggestion(&self) -> Option<SuggestionResult> {
        let turns = self.turns();
        self.extractor.extract(&turns)
    }

    /// Suggestion paired with the field it should populate
    pub fn apply_suggestion(&self) -> Option<AppliedSuggestion> {
        let suggestion = self.suggestion()?;
        let target = self
            .context()
            .map(|c| c.assist_target)
            .unwrap_or_default();
        Some(AppliedSuggestion {
            target,
            value: suggestion.recommendation,
        })
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn turns(&self) -> Vec<ChatTurn> {
        lock_mutex_recover(&self.state).store.turns().to_vec()
    }

    pub fn status(&self) -> ConversationStatus {
        lock_mutex_recover(&self.state).status
    }

    pub fn is_sending(&self) -> bool {
        self.status() == ConversationStatus::Sending
    }

    pub fn error(&self) -> Option<String> {
        lock_mutex_recover(&self.state).error.clone()
    }

    pub fn session_id(&self) -> Option<String> {
        lock_mutex_recover(&self.state).session_id.clone()
    }

    pub fn context(&self) -> Option<ConversationContext> {
        lock_mutex_recover(&self.state).context.clone()
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    fn emit_turn(&self, turn: &ChatTurn) {
        self.emitter.emit(
            EVENT_ASSIST_TURN_APPENDED,
            to_payload(TurnAppendedPayload {
                conversation_id: self.id.clone(),
                turn: turn.clone(),
            }),
        );
    }

    fn emit_status(&self, old_status: ConversationStatus, new_status: ConversationStatus) {
        self.emitter.emit(
            EVENT_ASSIST_STATUS_CHANGED,
            to_payload(StatusChangedPayload {
                conversation_id: self.id.clone(),
                old_status,
                new_status,
            }),
        );
    }

    fn emit_cleared(&self, old_status: ConversationStatus) {
        self.emitter.emit(
            EVENT_ASSIST_CLEARED,
            to_payload(ClearedPayload {
                conversation_id: self.id.clone(),
            }),
        );
        if old_status != ConversationStatus::Idle {
            self.emit_status(old_status, ConversationStatus::Idle);
        }
    }
}
