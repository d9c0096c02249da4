//! Wire-shaped types for a `generate_content_stream` call (§6).

use pilotcore_core::{FunctionCall, TokenUsage};
use serde_json::Value;

/// Which side of the conversation a `RequestMessage` represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestRole {
    User,
    Model,
}

/// One piece of content sent to the model. Mirrors `pilotcore_context::LlmPart`
/// but lives in this crate so the boundary has no dependency on the context
/// assembler — the runtime converts between the two at the call site.
#[derive(Debug, Clone)]
pub enum RequestPart {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse {
        id: String,
        name: String,
        response: Value,
    },
    InlineImage {
        mime_type: &'static str,
        data_base64: String,
    },
}

#[derive(Debug, Clone)]
pub struct RequestMessage {
    pub role: RequestRole,
    pub parts: Vec<RequestPart>,
}

/// Thinking/chain-of-thought knobs (§4.4 "temperature 0, a small thinking
/// budget, thought inclusion enabled" for grounding; §4.6 "thinking enabled
/// with thoughts included" for planning).
#[derive(Debug, Clone, Default)]
pub struct ThinkingConfig {
    pub include_thoughts: bool,
    pub thinking_budget: Option<u32>,
}

/// One tool declaration handed to the planning model (§4.5).
#[derive(Debug, Clone)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A JSON schema constraint on the response, used by the grounding call's
/// bounded-JSON mode (§4.4 step 2: `responseMimeType: application/json`).
#[derive(Debug, Clone)]
pub struct ResponseSchema {
    pub schema: Value,
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub temperature: f32,
    pub thinking: ThinkingConfig,
    pub tools: Vec<ToolDeclaration>,
    pub response_schema: Option<ResponseSchema>,
}

impl GenerateConfig {
    /// The planning call's config (§4.6 step 3): temperature 0.2, thinking
    /// enabled with thoughts included, the five catalog tools declared.
    pub fn planning(tools: Vec<ToolDeclaration>) -> Self {
        Self {
            temperature: 0.2,
            thinking: ThinkingConfig {
                include_thoughts: true,
                thinking_budget: None,
            },
            tools,
            response_schema: None,
        }
    }

    /// The grounding call's config (§4.4 step 2): temperature 0, a small
    /// thinking budget, thought inclusion enabled, bounded-JSON mode.
    pub fn grounding(schema: Value) -> Self {
        Self {
            temperature: 0.0,
            thinking: ThinkingConfig {
                include_thoughts: true,
                thinking_budget: Some(256),
            },
            tools: Vec::new(),
            response_schema: Some(ResponseSchema { schema }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub contents: Vec<RequestMessage>,
    pub config: GenerateConfig,
}

/// One chunk of a streamed completion. A chunk may carry thought-flagged
/// text, plain text, and/or zero or more function calls (§6). `token_usage`
/// is populated on the final chunk of a call, when the provider reports it.
#[derive(Debug, Clone, Default)]
pub struct ResponseChunk {
    pub thought: Option<String>,
    pub text: Option<String>,
    pub function_calls: Vec<FunctionCall>,
    pub token_usage: Option<TokenUsage>,
}

impl ResponseChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn thought(thought: impl Into<String>) -> Self {
        Self {
            thought: Some(thought.into()),
            ..Default::default()
        }
    }

    pub fn function_call(call: FunctionCall) -> Self {
        Self {
            function_calls: vec![call],
            ..Default::default()
        }
    }
}
