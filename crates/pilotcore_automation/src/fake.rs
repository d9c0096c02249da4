//! A hand-written fake `AutomationClient` for integration tests (no mocking
//! framework, matching this codebase's other trait-level fakes).

use std::sync::Mutex;

use async_trait::async_trait;

use crate::action::{ActionResponse, ComputerAction};
use crate::client::AutomationClient;
use crate::error::{AutomationError, Result};

/// Replays a fixed screenshot for every `screenshot` action and a fixed
/// text/error response for every other action, recording every action seen.
pub struct FakeAutomationClient {
    screenshot_png: Vec<u8>,
    action_reply: ActionReply,
    received: Mutex<Vec<ComputerAction>>,
}

enum ActionReply {
    Text(String),
    Error(String),
}

impl FakeAutomationClient {
    pub fn new(screenshot_png: Vec<u8>) -> Self {
        Self {
            screenshot_png,
            action_reply: ActionReply::Text("ok".to_string()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn with_action_text(mut self, text: impl Into<String>) -> Self {
        self.action_reply = ActionReply::Text(text.into());
        self
    }

    pub fn with_action_error(mut self, message: impl Into<String>) -> Self {
        self.action_reply = ActionReply::Error(message.into());
        self
    }

    /// Drains and returns every action seen so far, in call order.
    pub fn received(&self) -> Vec<ComputerAction> {
        std::mem::take(&mut self.received.lock().unwrap())
    }
}

#[async_trait]
impl AutomationClient for FakeAutomationClient {
    async fn execute(&self, action: ComputerAction) -> Result<ActionResponse> {
        self.received.lock().unwrap().push(action.clone());
        match action {
            ComputerAction::Screenshot => Ok(ActionResponse::Image {
                mime_type: "image/png".to_string(),
                data: self.screenshot_png.clone(),
            }),
            _ => match &self.action_reply {
                ActionReply::Text(text) => Ok(ActionResponse::Text(text.clone())),
                ActionReply::Error(message) => Err(AutomationError::ServiceError(message.clone())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_screenshot_bytes() {
        let fake = FakeAutomationClient::new(vec![1, 2, 3]);
        let png = fake.screenshot().await.unwrap();
        assert_eq!(png, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn records_non_screenshot_actions() {
        let fake = FakeAutomationClient::new(vec![]).with_action_text("done");
        fake.execute(ComputerAction::Wait { time: 1.0 }).await.unwrap();
        let received = fake.received();
        assert_eq!(received, vec![ComputerAction::Wait { time: 1.0 }]);
    }

    #[tokio::test]
    async fn action_error_is_returned() {
        let fake = FakeAutomationClient::new(vec![]).with_action_error("boom");
        let err = fake.execute(ComputerAction::Wait { time: 1.0 }).await.unwrap_err();
        assert!(matches!(err, AutomationError::ServiceError(_)));
    }
}
