use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::function_call::{FunctionCall, FunctionResponseData};
use crate::review::ToolReviewAttachment;

/// Who produced a message. `Workflow` is system-generated narration (screenshots,
/// review prompts); `GroundingModel` tags output from the grounding LLM so it can
/// be streamed on the same channel as the planning model without being confused
/// for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    Tool,
    Workflow,
    GroundingModel,
}

/// Visibility of a message to the human-facing view vs. the LLM-facing history.
/// Tri-state rather than a bool: a message can be shown to neither, either, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForDisplay {
    VisibleOnly,
    HiddenOnly,
    Both,
}

impl ForDisplay {
    pub fn is_visible(&self) -> bool {
        !matches!(self, ForDisplay::HiddenOnly)
    }

    pub fn is_llm_visible(&self) -> bool {
        !matches!(self, ForDisplay::VisibleOnly)
    }
}

/// A reference to an image blob owned by a session: `internal://<session>/<file>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub session_id: String,
    pub file_name: String,
}

impl ImageRef {
    pub fn new(session_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            file_name: file_name.into(),
        }
    }

    pub fn to_uri(&self) -> String {
        format!("internal://{}/{}", self.session_id, self.file_name)
    }

    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("internal://")?;
        let (session_id, file_name) = rest.split_once('/')?;
        if session_id.is_empty() || file_name.is_empty() {
            return None;
        }
        Some(Self::new(session_id, file_name))
    }
}

/// One block of content within a message. At most one of {Thought, FunctionCall}
/// may appear per block — that invariant is enforced by `Message::push_*` helpers,
/// not by the type itself, since a message is built incrementally during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    Thought { text: String },
    FunctionCall { call: FunctionCall },
    FunctionResponse {
        id: String,
        name: String,
        response: FunctionResponseData,
    },
    Image { reference: ImageRef },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn thought(text: impl Into<String>) -> Self {
        ContentBlock::Thought { text: text.into() }
    }

    pub fn function_call(call: FunctionCall) -> Self {
        ContentBlock::FunctionCall { call }
    }

    pub fn function_response(
        id: impl Into<String>,
        name: impl Into<String>,
        response: FunctionResponseData,
    ) -> Self {
        ContentBlock::FunctionResponse {
            id: id.into(),
            name: name.into(),
            response,
        }
    }

    pub fn image(reference: ImageRef) -> Self {
        ContentBlock::Image { reference }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            ContentBlock::FunctionCall { call } => Some(call),
            _ => None,
        }
    }
}

/// One immutable entry in a session's append-only message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ToolReviewAttachment>,
    pub for_display: ForDisplay,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(session_id: impl Into<String>, role: Role) -> Self {
        Self {
            id: crate::id::new_message_id(),
            session_id: session_id.into(),
            role,
            blocks: Vec::new(),
            review: None,
            for_display: ForDisplay::Both,
            timestamp: Utc::now(),
        }
    }

    pub fn with_block(mut self, block: ContentBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_blocks(mut self, blocks: Vec<ContentBlock>) -> Self {
        self.blocks.extend(blocks);
        self
    }

    pub fn with_review(mut self, review: ToolReviewAttachment) -> Self {
        self.review = Some(review);
        self
    }

    pub fn with_for_display(mut self, for_display: ForDisplay) -> Self {
        self.for_display = for_display;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.for_display = ForDisplay::HiddenOnly;
        self
    }

    pub fn visible_only(mut self) -> Self {
        self.for_display = ForDisplay::VisibleOnly;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_snake_case() {
        let json = serde_json::to_string(&Role::GroundingModel).unwrap();
        assert_eq!(json, "\"grounding_model\"");
    }

    #[test]
    fn image_ref_roundtrip() {
        let uri = "internal://2026-01-01T00-00-00-000Z/shot.png";
        let parsed = ImageRef::parse(uri).unwrap();
        assert_eq!(parsed.session_id, "2026-01-01T00-00-00-000Z");
        assert_eq!(parsed.file_name, "shot.png");
        assert_eq!(parsed.to_uri(), uri);
    }

    #[test]
    fn image_ref_rejects_malformed() {
        assert!(ImageRef::parse("not-a-uri").is_none());
        assert!(ImageRef::parse("internal://session-only").is_none());
    }

    #[test]
    fn for_display_visibility() {
        assert!(ForDisplay::Both.is_visible());
        assert!(ForDisplay::Both.is_llm_visible());
        assert!(!ForDisplay::HiddenOnly.is_visible());
        assert!(ForDisplay::HiddenOnly.is_llm_visible());
        assert!(ForDisplay::VisibleOnly.is_visible());
        assert!(!ForDisplay::VisibleOnly.is_llm_visible());
    }

    #[test]
    fn message_builder() {
        let msg = Message::new("s1", Role::User)
            .with_block(ContentBlock::text("hello"))
            .hidden();
        assert_eq!(msg.blocks.len(), 1);
        assert_eq!(msg.for_display, ForDisplay::HiddenOnly);
        assert_eq!(msg.session_id, "s1");
    }
}
