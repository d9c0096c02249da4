//! The `AutomationClient` trait boundary (§6) and its HTTP implementation.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::action::{ActionResponse, ComputerAction};
use crate::error::{AutomationError, Result};

/// The OS-automation tool runtime reaches through this boundary (§6: "both
/// are modeled as `#[async_trait]` traits").
#[async_trait]
pub trait AutomationClient: Send + Sync {
    async fn execute(&self, action: ComputerAction) -> Result<ActionResponse>;

    /// Convenience wrapper used by the Agent Loop's observe step: runs a
    /// `screenshot` action and enforces the PNG-only rule (§6: "any other
    /// mimeType is a fatal error for the turn").
    async fn screenshot(&self) -> Result<Vec<u8>> {
        match self.execute(ComputerAction::Screenshot).await? {
            ActionResponse::Image { mime_type, data } if mime_type == "image/png" => Ok(data),
            ActionResponse::Image { mime_type, .. } => Err(AutomationError::UnsupportedScreenshotFormat(mime_type)),
            ActionResponse::Text(_) => Err(AutomationError::UnsupportedScreenshotFormat("text".to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ActionResponseWire {
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
    data: Option<String>,
    text: Option<String>,
    error: Option<String>,
}

/// Reaches the `.computer` endpoint over HTTP using `reqwest`.
pub struct HttpAutomationClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAutomationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AutomationClient for HttpAutomationClient {
    async fn execute(&self, action: ComputerAction) -> Result<ActionResponse> {
        let url = format!("{}/v1/computer", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&action)
            .send()
            .await
            .map_err(|e| AutomationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body: ActionResponseWire = response
            .json()
            .await
            .map_err(|e| AutomationError::RequestFailed(e.to_string()))?;

        if !status.is_success() {
            return Err(AutomationError::ServiceError(
                body.error.unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }
        if let Some(error) = body.error {
            return Err(AutomationError::ServiceError(error));
        }

        match (body.mime_type, body.data) {
            (Some(mime_type), Some(data_b64)) => {
                use base64::engine::general_purpose::STANDARD;
                use base64::Engine;
                let data = STANDARD
                    .decode(data_b64)
                    .map_err(|e| AutomationError::RequestFailed(format!("invalid base64 image data: {e}")))?;
                Ok(ActionResponse::Image { mime_type, data })
            }
            _ => Ok(ActionResponse::Text(body.text.unwrap_or_default())),
        }
    }
}

/// Builds the JSON body sent for a screenshot action, exposed for tests that
/// assert on wire shape without a real endpoint.
pub fn screenshot_request_body() -> serde_json::Value {
    json!(ComputerAction::Screenshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_action_serializes_with_tagged_action_field() {
        let body = screenshot_request_body();
        assert_eq!(body["action"], "screenshot");
    }
}
