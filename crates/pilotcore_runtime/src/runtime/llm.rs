//! Bridges `pilotcore_context`'s pure history representation to the wire
//! shapes `pilotcore_llm::ContentGenerator` accepts. The two crates define
//! parallel but distinct types on purpose (§6: the LLM boundary must not
//! depend on the context assembler) — this is the one place that converts
//! between them.

use pilotcore_context::{LlmMessage, LlmPart, LlmRole};
use pilotcore_llm::{RequestMessage, RequestPart, RequestRole, ToolDeclaration};
use pilotcore_tools::ToolCatalog;

use super::Runtime;

impl Runtime {
    pub(crate) fn to_request_messages(history: Vec<LlmMessage>) -> Vec<RequestMessage> {
        history.into_iter().map(to_request_message).collect()
    }

    pub(crate) fn tool_declarations(catalog: &ToolCatalog) -> Vec<ToolDeclaration> {
        catalog
            .tools()
            .iter()
            .map(|tool| ToolDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }
}

fn to_request_message(message: LlmMessage) -> RequestMessage {
    RequestMessage {
        role: match message.role {
            LlmRole::User => RequestRole::User,
            LlmRole::Model => RequestRole::Model,
        },
        parts: message.parts.into_iter().map(to_request_part).collect(),
    }
}

fn to_request_part(part: LlmPart) -> RequestPart {
    match part {
        LlmPart::Text(text) => RequestPart::Text(text),
        LlmPart::FunctionCall(call) => RequestPart::FunctionCall(call),
        LlmPart::FunctionResponse { id, name, response } => RequestPart::FunctionResponse {
            id,
            name,
            response: serde_json::to_value(response).unwrap_or(serde_json::Value::Null),
        },
        LlmPart::InlineImage { mime_type, data_base64 } => RequestPart::InlineImage { mime_type, data_base64 },
    }
}
