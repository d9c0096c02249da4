//! Step 4, "Ground and dispatch" (§4.6): walks the function calls from one
//! plan response, routing each through direct execution, Tool Catalog
//! validation/grounding, or the review gate.

use async_trait::async_trait;
use pilotcore_automation::ComputerAction;
use pilotcore_core::{
    ContentBlock, FunctionCall, FunctionResponseData, Message, Role, SessionEvent, ToolReviewAttachment,
    ToolReviewRequest, ToolReviewResponseData,
};
use pilotcore_grounding::{GroundingDetector, GroundingOutcome, GroundingPipeline};
use pilotcore_vision::ScreenGeometry;
use tokio::sync::mpsc;

use super::{description, NormalizedCall, Runtime};
use crate::error::Result;

/// Wraps a `GroundingPipeline` so every detection's thought/text deltas are
/// forwarded to the session's event sink tagged `grounding_model` (§4.4: "the
/// grounding LLM's stream is surfaced via the same streaming channel as the
/// planning LLM but tagged `grounding_model`"). Uses `try_send` so a slow
/// subscriber drops events rather than blocking the turn (§5 "must never
/// block the agent loop").
struct EventForwardingDetector<'a> {
    pipeline: &'a GroundingPipeline,
    event_tx: &'a mpsc::Sender<SessionEvent>,
}

impl<'a> EventForwardingDetector<'a> {
    fn new(pipeline: &'a GroundingPipeline, event_tx: &'a mpsc::Sender<SessionEvent>) -> Self {
        Self { pipeline, event_tx }
    }
}

#[async_trait]
impl<'a> GroundingDetector for EventForwardingDetector<'a> {
    fn tile_count(&self) -> usize {
        self.pipeline.geometry().tile_count()
    }

    async fn detect(
        &self,
        tile_index: usize,
        element_description: &str,
    ) -> std::result::Result<GroundingOutcome, String> {
        let sink = |thought: Option<&str>, text: Option<&str>| {
            if let Some(t) = thought {
                let _ = self.event_tx.try_send(SessionEvent::stream_thought(Role::GroundingModel, t.to_string()));
            }
            if let Some(t) = text {
                let _ = self.event_tx.try_send(SessionEvent::stream_text(Role::GroundingModel, t.to_string()));
            }
        };
        self.pipeline.detect(tile_index, element_description, &sink).await.map_err(|e| e.to_string())
    }
}

/// A grounded call whose review was already auto-accepted this turn (because
/// its original name was already in the accept-set); executed at finalize,
/// after every review message for the turn has been decided (§4.6 step 4).
pub(crate) struct DelayedCall {
    pub original: FunctionCall,
    pub grounded: FunctionCall,
}

/// Everything produced by processing one plan response's function calls.
#[derive(Default)]
pub(crate) struct TurnOutcome {
    /// Tool-response parts for calls that never became a `.computer` review:
    /// direct (non-catalog) dispatch results, validation failures, grounding
    /// failures. Persisted as a single `tool` message (§4.6 step 5 bullet 1).
    pub immediate_parts: Vec<ContentBlock>,
    /// Review-request and synthetic auto-accept-response messages, in the
    /// fixed relative order they were produced (§5 "Ordering").
    pub review_messages: Vec<Message>,
    pub delayed: Vec<DelayedCall>,
    pub pending: bool,
}

impl Runtime {
    pub(crate) async fn ground_and_dispatch(
        &self,
        calls: Vec<FunctionCall>,
        screenshot_png: &[u8],
        geometry: &ScreenGeometry,
        pipeline: &GroundingPipeline,
    ) -> Result<TurnOutcome> {
        let detector = EventForwardingDetector::new(pipeline, &self.event_tx);
        let mut outcome = TurnOutcome::default();

        for call in calls {
            let original = NormalizedCall::from_model(call).original;

            let tool = self.catalog.get(&original.name).cloned();
            let Some(tool) = tool else {
                let part = self.execute_direct(&original).await;
                outcome.immediate_parts.push(part);
                continue;
            };

            if let Err(message) = tool.validate(&original.args, detector.tile_count()) {
                outcome.immediate_parts.push(ContentBlock::function_response(
                    original.id.clone(),
                    original.name.clone(),
                    FunctionResponseData::error(message),
                ));
                continue;
            }

            let grounded_call = match tool.ground(&original, &detector).await {
                Ok(call) => call,
                Err(message) => {
                    outcome.immediate_parts.push(ContentBlock::function_response(
                        original.id.clone(),
                        original.name.clone(),
                        FunctionResponseData::error(format!("Error during grounding: {message}")),
                    ));
                    continue;
                }
            };

            let review_id = pilotcore_core::id::new_review_id();
            let description_blocks = description::describe(
                &self.store,
                &self.session.id,
                geometry,
                screenshot_png,
                &review_id,
                &grounded_call.description,
            )
            .await?;

            let request = ToolReviewRequest {
                review_id: review_id.clone(),
                grounded_function_call: grounded_call.grounded.clone(),
                original_function_call: original.clone(),
            };
            let review_message = Message::new(&self.session.id, Role::Workflow)
                .with_blocks(description_blocks)
                .with_review(ToolReviewAttachment::Request(request));
            outcome.review_messages.push(review_message);

            if self.session.is_auto_accepted(&original.name) {
                let response = ToolReviewResponseData {
                    review_id: review_id.clone(),
                    choice: pilotcore_core::ReviewChoice::AcceptSession,
                };
                let response_message =
                    Message::new(&self.session.id, Role::User).with_review(ToolReviewAttachment::Response(response));
                outcome.review_messages.push(response_message);
                outcome.delayed.push(DelayedCall { original, grounded: grounded_call.grounded });
            } else {
                outcome.pending = true;
            }
        }

        Ok(outcome)
    }

    /// Executes every delayed auto-accepted call, in order, awaiting each one
    /// before starting the next (§9(c): keep log ordering guarantees rather
    /// than fire-and-forget).
    pub(crate) async fn execute_delayed(&self, delayed: Vec<DelayedCall>) -> Vec<ContentBlock> {
        let mut parts = Vec::with_capacity(delayed.len());
        for call in delayed {
            let response = self.execute_grounded(&call.original, &call.grounded).await;
            parts.push(response);
        }
        parts
    }

    /// Runs a `FunctionCall` whose name isn't in the Tool Catalog directly
    /// against the OS-automation tool, treating its own name (minus the
    /// `computer_` prefix) as the action tag (§4.6 step 4: "execute directly
    /// through the tool runtime").
    async fn execute_direct(&self, call: &FunctionCall) -> ContentBlock {
        let action_name = call.name.strip_prefix("computer_").unwrap_or(&call.name);
        let mut args = call.args.clone();
        if let Some(object) = args.as_object_mut() {
            object.insert("action".to_string(), serde_json::Value::String(action_name.to_string()));
        }

        let response = match ComputerAction::from_grounded_args(&args) {
            Err(message) => FunctionResponseData::error(message),
            Ok(action) => match self.automation.execute(action).await {
                Ok(result) => action_response_data(result),
                Err(e) => FunctionResponseData::error(e.to_string()),
            },
        };
        ContentBlock::function_response(call.id.clone(), call.name.clone(), response)
    }

    /// Runs an already-grounded `.computer` call, used both for delayed
    /// auto-accepted execution and for resumed `accept_once`/`accept_session`
    /// decisions (§4.6 step 1 and step 5).
    pub(crate) async fn execute_grounded(&self, original: &FunctionCall, grounded: &FunctionCall) -> ContentBlock {
        let response = match ComputerAction::from_grounded_args(&grounded.args) {
            Err(message) => FunctionResponseData::error(message),
            Ok(action) => match self.automation.execute(action).await {
                Ok(result) => action_response_data(result),
                Err(e) => FunctionResponseData::error(e.to_string()),
            },
        };
        ContentBlock::function_response(original.id.clone(), original.name.clone(), response)
    }
}

fn action_response_data(response: pilotcore_automation::ActionResponse) -> FunctionResponseData {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    match response {
        pilotcore_automation::ActionResponse::Text(text) => {
            FunctionResponseData::output(serde_json::json!({ "output": text }))
        }
        pilotcore_automation::ActionResponse::Image { mime_type, data } => {
            FunctionResponseData::output(serde_json::json!({ "mimeType": mime_type, "data": STANDARD.encode(&data) }))
        }
    }
}
