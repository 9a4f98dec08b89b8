// Event types and payload structures for conversation updates
// The rendering layer subscribes to these to refresh chat bubbles and status

use crate::models::{ChatTurn, ConversationStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Event name constants
pub const EVENT_ASSIST_TURN_APPENDED: &str = "assist:turn_appended";
pub const EVENT_ASSIST_STATUS_CHANGED: &str = "assist:status_changed";
pub const EVENT_ASSIST_ERROR: &str = "assist:error";
pub const EVENT_ASSIST_CLEARED: &str = "assist:cleared";

/// Payload for turn appended events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnAppendedPayload {
    pub conversation_id: String,
    pub turn: ChatTurn,
}

/// Payload for status change events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangedPayload {
    pub conversation_id: String,
    pub old_status: ConversationStatus,
    pub new_status: ConversationStatus,
}

/// Payload for collaborator failures
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistErrorPayload {
    pub conversation_id: String,
    pub message: String,
}

/// Payload for cleared conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedPayload {
    pub conversation_id: String,
}

/// Trait for emitting conversation events
pub trait AssistEventEmitter: Send + Sync {
    fn emit(&self, event_type: &str, payload: serde_json::Value);
}

/// Emitter that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl AssistEventEmitter for NoopEmitter {
    fn emit(&self, _event_type: &str, _payload: serde_json::Value) {}
}

/// An event as delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistEvent {
    pub event: String,
    pub payload: serde_json::Value,
}

/// Fan-out emitter backed by a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    tx: broadcast::Sender<AssistEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<AssistEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl AssistEventEmitter for EventBroadcaster {
    fn emit(&self, event_type: &str, payload: serde_json::Value) {
        // Ignore send errors (no receivers)
        let _ = self.tx.send(AssistEvent {
            event: event_type.to_string(),
            payload,
        });
    }
}

/// Serialize a payload, falling back to null
pub fn to_payload(payload: impl Serialize) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}
