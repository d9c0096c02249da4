//! A thin HTTP `ContentGenerator`, mirroring `pilotcore_automation`'s
//! `HttpAutomationClient`: the model backend itself is external (§1), this
//! just turns a `GenerateRequest` into a POST and its streamed
//! newline-delimited JSON body into `ResponseChunk`s.

use async_trait::async_trait;
use pilotcore_core::{FunctionCall, TokenUsage};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::provider::{ContentGenerator, ContentStream};
use crate::types::{GenerateRequest, RequestPart, RequestRole, ResponseChunk};

pub struct HttpContentGenerator {
    base_url: String,
    client: reqwest::Client,
}

impl HttpContentGenerator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    FunctionCall { call: FunctionCall },
    FunctionResponse { id: String, name: String, response: serde_json::Value },
    InlineImage { mime_type: String, data_base64: String },
}

#[derive(Serialize)]
struct WireTool {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    contents: Vec<WireMessage>,
    temperature: f32,
    include_thoughts: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_budget: Option<u32>,
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct WireChunk {
    #[serde(default)]
    thought: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_calls: Vec<FunctionCall>,
    #[serde(default)]
    prompt_tokens: Option<u64>,
    #[serde(default)]
    completion_tokens: Option<u64>,
}

fn to_wire_request(request: GenerateRequest) -> WireRequest {
    let contents = request
        .contents
        .into_iter()
        .map(|message| WireMessage {
            role: match message.role {
                RequestRole::User => "user",
                RequestRole::Model => "model",
            },
            parts: message.parts.into_iter().map(to_wire_part).collect(),
        })
        .collect();

    let tools = request
        .config
        .tools
        .into_iter()
        .map(|tool| WireTool {
            name: tool.name,
            description: tool.description,
            parameters: tool.parameters,
        })
        .collect();

    WireRequest {
        model: request.model,
        contents,
        temperature: request.config.temperature,
        include_thoughts: request.config.thinking.include_thoughts,
        thinking_budget: request.config.thinking.thinking_budget,
        tools,
        response_schema: request.config.response_schema.map(|s| s.schema),
    }
}

fn to_wire_part(part: RequestPart) -> WirePart {
    match part {
        RequestPart::Text(text) => WirePart::Text { text },
        RequestPart::FunctionCall(call) => WirePart::FunctionCall { call },
        RequestPart::FunctionResponse { id, name, response } => WirePart::FunctionResponse { id, name, response },
        RequestPart::InlineImage { mime_type, data_base64 } => {
            WirePart::InlineImage { mime_type: mime_type.to_string(), data_base64 }
        }
    }
}

fn parse_chunk(line: &str) -> Result<ResponseChunk> {
    let wire: WireChunk = serde_json::from_str(line).map_err(|e| LlmError::MalformedJson(e.to_string()))?;
    let token_usage = match (wire.prompt_tokens, wire.completion_tokens) {
        (None, None) => None,
        (prompt, completion) => Some(TokenUsage::new(prompt.unwrap_or(0), completion.unwrap_or(0))),
    };
    Ok(ResponseChunk {
        thought: wire.thought,
        text: wire.text,
        function_calls: wire.function_calls,
        token_usage,
    })
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate_content_stream(&self, request: GenerateRequest) -> Result<ContentStream> {
        let wire = to_wire_request(request);
        let url = format!("{}/v1/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&wire)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!("HTTP {status}: {body}")));
        }

        let stream = futures::stream::unfold((response, String::new()), |(mut response, mut buf)| async move {
            loop {
                if let Some(pos) = buf.find('\n') {
                    let line = buf[..pos].trim().to_string();
                    buf.drain(..=pos);
                    if line.is_empty() {
                        continue;
                    }
                    return Some((parse_chunk(&line), (response, buf)));
                }

                match response.chunk().await {
                    Ok(Some(bytes)) => buf.push_str(&String::from_utf8_lossy(&bytes)),
                    Ok(None) => {
                        let line = std::mem::take(&mut buf);
                        let line = line.trim();
                        if line.is_empty() {
                            return None;
                        }
                        return Some((parse_chunk(line), (response, buf)));
                    }
                    Err(e) => return Some((Err(LlmError::RequestFailed(e.to_string())), (response, buf))),
                }
            }
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenerateConfig, RequestMessage};

    #[test]
    fn wire_request_maps_role_and_temperature() {
        let request = GenerateRequest {
            model: "claude-3".into(),
            contents: vec![RequestMessage { role: RequestRole::User, parts: vec![RequestPart::Text("hi".into())] }],
            config: GenerateConfig::grounding(serde_json::json!({"type": "object"})),
        };
        let wire = to_wire_request(request);
        assert_eq!(wire.model, "claude-3");
        assert_eq!(wire.contents[0].role, "user");
        assert_eq!(wire.temperature, 0.0);
        assert!(wire.response_schema.is_some());
    }

    #[test]
    fn parse_chunk_defaults_missing_fields() {
        let chunk = parse_chunk(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(chunk.text.as_deref(), Some("hello"));
        assert!(chunk.thought.is_none());
        assert!(chunk.function_calls.is_empty());
    }

    #[test]
    fn parse_chunk_rejects_malformed_json() {
        let err = parse_chunk("not json").unwrap_err();
        assert!(matches!(err, LlmError::MalformedJson(_)));
    }
}
