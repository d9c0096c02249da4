use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};
use crate::session::SessionStatus;

/// Events emitted to external subscribers (§6). `PersistentMessage` carries the
/// fully-formed message exactly as appended to the log, emitted for every append
/// whose `for_display` is not `VisibleOnly`-exclusive of the LLM — concretely,
/// whenever the message is meant to be seen by the human-facing view (§6: "Emitted
/// for every append with forDisplay ≠ false").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PersistentMessage { message: Box<Message> },
    StreamMessage {
        role: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        thought: Option<String>,
    },
    SessionStatus {
        status: SessionStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl SessionEvent {
    pub fn persistent_message(message: Message) -> Self {
        SessionEvent::PersistentMessage {
            message: Box::new(message),
        }
    }

    pub fn stream_text(role: Role, text: impl Into<String>) -> Self {
        SessionEvent::StreamMessage {
            role,
            text: Some(text.into()),
            thought: None,
        }
    }

    pub fn stream_thought(role: Role, thought: impl Into<String>) -> Self {
        SessionEvent::StreamMessage {
            role,
            text: None,
            thought: Some(thought.into()),
        }
    }

    pub fn status(status: SessionStatus, message: Option<String>) -> Self {
        SessionEvent::SessionStatus { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_event_serializes() {
        let event = SessionEvent::status(SessionStatus::Pending, Some("Tool call pending.".into()));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"session_status"#));
        assert!(json.contains("Tool call pending."));
    }

    #[test]
    fn stream_text_tags_role() {
        let event = SessionEvent::stream_text(Role::GroundingModel, "box found");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""role":"grounding_model"#));
    }
}
