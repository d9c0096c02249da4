//! Converts the persisted message log into an LLM-facing history (§4.2).
//!
//! Pure and I/O-free: image bytes are supplied by the caller (already loaded
//! from the `Session Store`), keeping history assembly separate from the
//! I/O that feeds it.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pilotcore_core::{ContentBlock, FunctionCall, FunctionResponseData, ImageRef, Message, Role};

use crate::error::{ContextError, Result};

/// The two sides of an LLM conversation. Every `Role` other than `Model` maps
/// to `User` (§4.2 rule 2): tool results, workflow narration, and grounding
/// output are all user-side from the planning model's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmRole {
    User,
    Model,
}

impl From<Role> for LlmRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Model => LlmRole::Model,
            Role::User | Role::Tool | Role::Workflow | Role::GroundingModel => LlmRole::User,
        }
    }
}

/// One piece of LLM-facing content. `Thought` blocks have no counterpart here —
/// they are chain-of-thought and are never sent back to the model (§3).
#[derive(Debug, Clone, PartialEq)]
pub enum LlmPart {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse {
        id: String,
        name: String,
        response: FunctionResponseData,
    },
    InlineImage {
        mime_type: &'static str,
        data_base64: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub parts: Vec<LlmPart>,
}

impl LlmMessage {
    fn new(role: LlmRole) -> Self {
        Self { role, parts: Vec::new() }
    }
}

/// Assembles LLM-facing history from a session's message log.
///
/// `images` must contain the decoded bytes for every `ImageRef` appearing in
/// an `Image` block of a visible message; a reference is looked up by its
/// `(session_id, file_name)` pair. A reference whose `session_id` differs from
/// `current_session_id` is rejected rather than looked up (§4.2 rule 3).
pub fn assemble_history(
    messages: &[Message],
    current_session_id: &str,
    images: &HashMap<ImageRef, Vec<u8>>,
) -> Result<Vec<LlmMessage>> {
    let mut out: Vec<LlmMessage> = Vec::new();

    for message in messages {
        if !message.for_display.is_llm_visible() {
            continue;
        }

        let role: LlmRole = message.role.into();
        let mut parts = Vec::new();
        for block in &message.blocks {
            if let Some(part) = convert_block(block, current_session_id, images)? {
                parts.push(part);
            }
        }
        if parts.is_empty() {
            continue;
        }

        match out.last_mut() {
            Some(last) if last.role == role => last.parts.extend(parts),
            _ => {
                let mut next = LlmMessage::new(role);
                next.parts = parts;
                out.push(next);
            }
        }
    }

    Ok(out)
}

/// Merges a freshly produced turn (already built as an `LlmMessage`) onto an
/// existing history, applying the same adjacent-same-role merge rule used when
/// seeding from storage (§4.2 rule 4).
pub fn append_turn(history: &mut Vec<LlmMessage>, turn: LlmMessage) {
    if turn.parts.is_empty() {
        return;
    }
    match history.last_mut() {
        Some(last) if last.role == turn.role => last.parts.extend(turn.parts),
        _ => history.push(turn),
    }
}

fn convert_block(
    block: &ContentBlock,
    current_session_id: &str,
    images: &HashMap<ImageRef, Vec<u8>>,
) -> Result<Option<LlmPart>> {
    match block {
        ContentBlock::Text { text } => Ok(Some(LlmPart::Text(text.clone()))),
        ContentBlock::Thought { .. } => Ok(None),
        ContentBlock::FunctionCall { call } => Ok(Some(LlmPart::FunctionCall(call.clone()))),
        ContentBlock::FunctionResponse { id, name, response } => Ok(Some(LlmPart::FunctionResponse {
            id: id.clone(),
            name: name.clone(),
            response: response.clone(),
        })),
        ContentBlock::Image { reference } => {
            if reference.session_id != current_session_id {
                return Err(ContextError::CrossSessionImageRef {
                    file_name: reference.file_name.clone(),
                    owner: reference.session_id.clone(),
                    current: current_session_id.to_string(),
                });
            }
            let bytes = images
                .get(reference)
                .ok_or_else(|| ContextError::MissingImageBytes(reference.file_name.clone()))?;
            Ok(Some(LlmPart::InlineImage {
                mime_type: "image/png",
                data_base64: BASE64.encode(bytes),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilotcore_core::ForDisplay;
    use std::collections::HashMap;

    fn msg(session_id: &str, role: Role, text: &str) -> Message {
        Message::new(session_id, role).with_block(ContentBlock::text(text))
    }

    #[test]
    fn hidden_messages_are_excluded() {
        let visible = msg("s1", Role::User, "hi");
        let hidden = Message::new("s1", Role::Workflow)
            .with_block(ContentBlock::text("tile debug"))
            .hidden();
        let history = assemble_history(&[visible, hidden], "s1", &HashMap::new()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].parts, vec![LlmPart::Text("hi".into())]);
    }

    #[test]
    fn visible_only_messages_are_excluded_from_llm_history() {
        let llm_and_human = msg("s1", Role::User, "both");
        let human_only = Message::new("s1", Role::Workflow)
            .with_block(ContentBlock::text("note"))
            .visible_only();
        let history = assemble_history(&[llm_and_human, human_only], "s1", &HashMap::new()).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn non_model_roles_map_to_user_side() {
        let messages = vec![
            msg("s1", Role::User, "a"),
            msg("s1", Role::Tool, "b"),
            msg("s1", Role::Workflow, "c"),
        ];
        let history = assemble_history(&messages, "s1", &HashMap::new()).unwrap();
        // All three collapse into a single adjacent user-side message.
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, LlmRole::User);
        assert_eq!(history[0].parts.len(), 3);
    }

    #[test]
    fn adjacent_same_role_messages_merge() {
        let messages = vec![
            msg("s1", Role::User, "first"),
            msg("s1", Role::User, "second"),
            msg("s1", Role::Model, "reply"),
        ];
        let history = assemble_history(&messages, "s1", &HashMap::new()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history[0].parts,
            vec![LlmPart::Text("first".into()), LlmPart::Text("second".into())]
        );
        assert_eq!(history[1].role, LlmRole::Model);
    }

    #[test]
    fn thought_blocks_never_reach_llm_history() {
        let message = Message::new("s1", Role::Model)
            .with_block(ContentBlock::thought("pondering"))
            .with_block(ContentBlock::text("answer"));
        let history = assemble_history(&[message], "s1", &HashMap::new()).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].parts, vec![LlmPart::Text("answer".into())]);
    }

    #[test]
    fn image_blocks_are_inlined_as_base64_png() {
        let reference = ImageRef::new("s1", "shot.png");
        let message = Message::new("s1", Role::Workflow).with_block(ContentBlock::image(reference.clone()));
        let mut images = HashMap::new();
        images.insert(reference, b"PNGDATA".to_vec());

        let history = assemble_history(&[message], "s1", &images).unwrap();
        assert_eq!(history.len(), 1);
        match &history[0].parts[0] {
            LlmPart::InlineImage { mime_type, data_base64 } => {
                assert_eq!(*mime_type, "image/png");
                assert_eq!(data_base64, &BASE64.encode(b"PNGDATA"));
            }
            other => panic!("expected inline image, got {other:?}"),
        }
    }

    #[test]
    fn cross_session_image_reference_is_rejected() {
        let reference = ImageRef::new("other-session", "shot.png");
        let message = Message::new("s1", Role::Workflow).with_block(ContentBlock::image(reference.clone()));
        let mut images = HashMap::new();
        images.insert(reference, b"PNGDATA".to_vec());

        let err = assemble_history(&[message], "s1", &images).unwrap_err();
        assert!(matches!(err, ContextError::CrossSessionImageRef { .. }));
    }

    #[test]
    fn missing_image_bytes_is_an_error() {
        let reference = ImageRef::new("s1", "shot.png");
        let message = Message::new("s1", Role::Workflow).with_block(ContentBlock::image(reference));
        let err = assemble_history(&[message], "s1", &HashMap::new()).unwrap_err();
        assert!(matches!(err, ContextError::MissingImageBytes(_)));
    }

    #[test]
    fn append_turn_merges_into_same_role_tail() {
        let mut history = vec![LlmMessage {
            role: LlmRole::User,
            parts: vec![LlmPart::Text("hi".into())],
        }];
        append_turn(
            &mut history,
            LlmMessage {
                role: LlmRole::User,
                parts: vec![LlmPart::Text("more".into())],
            },
        );
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].parts.len(), 2);

        append_turn(
            &mut history,
            LlmMessage {
                role: LlmRole::Model,
                parts: vec![LlmPart::Text("reply".into())],
            },
        );
        assert_eq!(history.len(), 2);
    }
}
