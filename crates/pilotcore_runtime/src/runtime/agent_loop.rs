//! The turn procedure (§4.6): seed → observe → plan → ground and dispatch →
//! finalize, looping until the turn suspends (`pending`), stops normally
//! (`stagnant`), or fails (`error`).

use std::collections::HashMap;

use futures::StreamExt;
use pilotcore_core::{
    ContentBlock, FunctionResponseData, ImageRef, Message, ReviewChoice, Role, SessionEvent, SessionStatus,
    SessionUpdate, TokenUsage,
};
use pilotcore_grounding::GroundingPipeline;
use pilotcore_llm::{GenerateConfig, GenerateRequest, ResponseChunk};
use pilotcore_vision::{png_dimensions, ScreenGeometry, Tiler};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::ground::TurnOutcome;
use super::{Runtime, TurnInput};
use crate::error::{Result, RuntimeError};

const CONTINUE_PROMPT: &str = "continue";

/// What a completed plan call (§4.6 step 3) produced.
struct PlanResult {
    function_calls: Vec<pilotcore_core::FunctionCall>,
}

impl Runtime {
    /// Runs one turn to completion (suspending at the review gate if needed),
    /// then keeps looping into further turns until the session reaches a
    /// terminal status for this call: `stagnant`, `pending`, or `error`
    /// (§4.6, §5 "Suspension at the review gate is indefinite").
    pub async fn run(&mut self, input: TurnInput, cancel: CancellationToken) -> Result<SessionStatus> {
        let span = pilotcore_observability::agent_span!(self.session.id.as_str(), "run");
        let _guard = span.enter();

        if !self.seed_turn(input).await? {
            return Ok(self.session.status);
        }

        loop {
            match self.run_one_turn(&cancel).await {
                Ok(TurnEnd::Continue) => continue,
                Ok(TurnEnd::Stop(status)) => return Ok(status),
                Err(e) => {
                    pilotcore_observability::record_error(&e);
                    self.set_status(SessionStatus::Error, Some(e.to_string())).await?;
                    return Ok(SessionStatus::Error);
                }
            }
        }
    }

    /// Step 1, "Seed inputs". Returns `false` if the turn is already over
    /// (every tool-review decision was `reject_once`).
    async fn seed_turn(&mut self, input: TurnInput) -> Result<bool> {
        match input {
            TurnInput::Text(text) => {
                let message = Message::new(&self.session.id, Role::User).with_block(ContentBlock::text(text));
                self.append_and_emit(vec![message]).await?;
                Ok(true)
            }
            TurnInput::Resolved(decisions) => {
                let mut all_rejected = true;
                let mut blocks = Vec::with_capacity(decisions.len());
                for decision in decisions {
                    let block = if matches!(decision.choice, ReviewChoice::RejectOnce) {
                        ContentBlock::function_response(
                            decision.original_function_call.id.clone(),
                            decision.original_function_call.name.clone(),
                            FunctionResponseData::error("Rejected by user"),
                        )
                    } else {
                        all_rejected = false;
                        self.execute_grounded(&decision.original_function_call, &decision.function_call)
                            .await
                    };
                    blocks.push(block);
                }
                let message = Message::new(&self.session.id, Role::Tool).with_blocks(blocks);
                self.append_and_emit(vec![message]).await?;

                if all_rejected {
                    self.set_status(
                        SessionStatus::Stagnant,
                        Some("User rejected all tool calls.".to_string()),
                    )
                    .await?;
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
        }
    }

    async fn run_one_turn(&mut self, cancel: &CancellationToken) -> Result<TurnEnd> {
        let turn_n = self.session.next_turn();
        self.store
            .update(&self.session.id, SessionUpdate::status(SessionStatus::Running, None))
            .await?;
        self.set_status(SessionStatus::Running, Some(format!("Turn {turn_n}"))).await?;

        // Step 2: Observe.
        let (geometry, tiles, screenshot_png) = self.observe(cancel).await?;

        // Step 3: Plan.
        let plan = match self.plan(&geometry, &tiles, cancel).await? {
            Some(plan) => plan,
            None => return Ok(TurnEnd::Stop(self.session.status)),
        };

        // Step 4: Ground and dispatch.
        if plan.function_calls.is_empty() {
            self.set_status(SessionStatus::Stagnant, Some("No more tool calls from model.".to_string()))
                .await?;
            return Ok(TurnEnd::Stop(SessionStatus::Stagnant));
        }

        let cancel_for_grounding = cancel.clone();
        let pipeline = GroundingPipeline::new(
            self.generator.clone(),
            self.session.model.clone(),
            geometry.clone(),
            tiles,
            cancel_for_grounding,
        );
        let outcome = self
            .ground_and_dispatch(plan.function_calls, &screenshot_png, &geometry, &pipeline)
            .await?;

        // Step 5: Finalize.
        self.finalize_turn(outcome, turn_n).await
    }

    /// Step 2, "Observe" (§4.6): captures a fresh screenshot, builds the
    /// geometry for it, tiles it, and persists the two `workflow` messages
    /// (human-facing screenshot, LLM-facing tiles) describing this moment.
    async fn observe(&mut self, cancel: &CancellationToken) -> Result<(ScreenGeometry, Vec<Vec<u8>>, Vec<u8>)> {
        let screenshot_png = tokio::select! {
            _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
            result = self.automation.screenshot() => result?,
        };

        let (width, height) = png_dimensions(&screenshot_png)?;
        let geometry = ScreenGeometry::new(width, height);
        let tiler = Tiler::new(&geometry);
        let tiles = tiler.tile(&screenshot_png)?;

        let label = format!("Screenshot at {}", chrono::Utc::now().to_rfc3339());

        let screenshot_name = format!("screenshot-{}.png", pilotcore_core::id::new_message_id());
        let screenshot_file = self.store.put_image(&self.session.id, &screenshot_name, &screenshot_png).await?;
        let human_message = Message::new(&self.session.id, Role::Workflow)
            .with_block(ContentBlock::text(label.clone()))
            .with_block(ContentBlock::image(ImageRef::new(&self.session.id, screenshot_file)))
            .visible_only();

        let mut tile_blocks = vec![ContentBlock::text(label)];
        for (i, tile_png) in tiles.iter().enumerate() {
            let tile_name = format!("tile-{}-{i}.png", pilotcore_core::id::new_message_id());
            let tile_file = self.store.put_image(&self.session.id, &tile_name, tile_png).await?;
            tile_blocks.push(ContentBlock::image(ImageRef::new(&self.session.id, tile_file)));
        }
        let llm_message = Message::new(&self.session.id, Role::Workflow).with_blocks(tile_blocks).hidden();

        self.append_and_emit(vec![human_message, llm_message]).await?;

        Ok((geometry, tiles, screenshot_png))
    }

    /// Step 3, "Plan" (§4.6): assembles history, requests a streaming
    /// completion, and persists the resulting `model` message. Returns `None`
    /// if the turn already reached a terminal status (empty response even
    /// after the single "continue" retry).
    async fn plan(
        &mut self,
        geometry: &ScreenGeometry,
        tiles: &[Vec<u8>],
        cancel: &CancellationToken,
    ) -> Result<Option<PlanResult>> {
        let _ = (geometry, tiles);

        let mut response = self.plan_once(cancel).await?;
        let mut usage = response.token_usage.take();

        if response.is_empty() {
            let retry_message = Message::new(&self.session.id, Role::Workflow)
                .with_block(ContentBlock::text(CONTINUE_PROMPT))
                .hidden();
            self.append_and_emit(vec![retry_message]).await?;
            response = self.plan_once(cancel).await?;
            usage = merge_token_usage(usage, response.token_usage.take());
        }

        if response.is_empty() {
            self.set_status(
                SessionStatus::Error,
                Some("Model returned empty response even after retry.".to_string()),
            )
            .await?;
            return Ok(None);
        }

        let mut blocks = Vec::new();
        if let Some(thought) = &response.thought {
            blocks.push(ContentBlock::thought(thought.clone()));
        }
        if let Some(text) = &response.text {
            blocks.push(ContentBlock::text(text.clone()));
        }
        for call in &response.function_calls {
            blocks.push(ContentBlock::function_call(call.clone()));
        }
        let message = Message::new(&self.session.id, Role::Model).with_blocks(blocks);
        self.append_and_emit(vec![message]).await?;

        if let Some(usage) = usage {
            self.session.record_token_usage(usage);
            self.store.update(&self.session.id, SessionUpdate::token_usage(usage)).await?;
        }

        Ok(Some(PlanResult { function_calls: response.function_calls }))
    }

    /// One planning call: assembles the full history from the persisted log
    /// and streams a completion, forwarding every delta via `stream_message`
    /// (§4.6 step 3).
    async fn plan_once(&self, cancel: &CancellationToken) -> Result<PlanResponse> {
        let history = self.load_history().await?;
        let contents = Self::to_request_messages(history);
        let tools = Self::tool_declarations(&self.catalog);

        let request = GenerateRequest {
            model: self.session.model.clone(),
            contents,
            config: GenerateConfig::planning(tools),
        };

        if cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        let mut stream = self.generator.generate_content_stream(request).await?;
        let mut thought = String::new();
        let mut text = String::new();
        let mut function_calls = Vec::new();
        let mut token_usage = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(RuntimeError::Cancelled),
                next = stream.next() => {
                    match next {
                        None => break,
                        Some(Err(e)) => return Err(RuntimeError::Llm(e)),
                        Some(Ok(chunk)) => {
                            token_usage = merge_token_usage(token_usage, chunk.token_usage);
                            self.consume_chunk(chunk, &mut thought, &mut text, &mut function_calls).await;
                        }
                    }
                }
            }
        }

        Ok(PlanResponse {
            thought: non_empty(thought),
            text: non_empty(text),
            function_calls,
            token_usage,
        })
    }

    async fn consume_chunk(
        &self,
        chunk: ResponseChunk,
        thought: &mut String,
        text: &mut String,
        function_calls: &mut Vec<pilotcore_core::FunctionCall>,
    ) {
        if let Some(t) = &chunk.thought {
            thought.push_str(t);
            let _ = self.event_tx.send(SessionEvent::stream_thought(Role::Model, t.clone())).await;
        }
        if let Some(t) = &chunk.text {
            text.push_str(t);
            let _ = self.event_tx.send(SessionEvent::stream_text(Role::Model, t.clone())).await;
        }
        function_calls.extend(chunk.function_calls);
    }

    /// Step 5, "Finalize the turn" (§4.6).
    async fn finalize_turn(&mut self, outcome: TurnOutcome, turn_n: u64) -> Result<TurnEnd> {
        let _ = turn_n;

        if !outcome.immediate_parts.is_empty() {
            let message = Message::new(&self.session.id, Role::Tool).with_blocks(outcome.immediate_parts);
            self.append_and_emit(vec![message]).await?;
        }

        if !outcome.review_messages.is_empty() {
            self.append_and_emit(outcome.review_messages).await?;
        }

        if outcome.pending {
            self.set_status(SessionStatus::Pending, Some("Tool call pending.".to_string())).await?;
            return Ok(TurnEnd::Stop(SessionStatus::Pending));
        }

        if !outcome.delayed.is_empty() {
            let parts = self.execute_delayed(outcome.delayed).await;
            if !parts.is_empty() {
                let message = Message::new(&self.session.id, Role::Tool).with_blocks(parts);
                self.append_and_emit(vec![message]).await?;
            }
        }

        Ok(TurnEnd::Continue)
    }

    /// §4.2 "Input": reassembles LLM-facing history fresh from the persisted
    /// log before every plan call, so everything seeded/observed/retried so
    /// far this turn (already persisted as messages) is naturally included.
    async fn load_history(&self) -> Result<Vec<pilotcore_context::LlmMessage>> {
        let messages = self.store.get_messages(&self.session.id, true).await?;

        let mut images = HashMap::new();
        for message in &messages {
            if !message.for_display.is_llm_visible() {
                continue;
            }
            for block in &message.blocks {
                if let ContentBlock::Image { reference } = block {
                    if reference.session_id == self.session.id && !images.contains_key(reference) {
                        let bytes = self.store.get_image(&self.session.id, &reference.file_name).await?;
                        images.insert(reference.clone(), bytes);
                    }
                }
            }
        }

        Ok(pilotcore_context::assemble_history(&messages, &self.session.id, &images)?)
    }

    pub(crate) async fn append_and_emit(&self, messages: Vec<Message>) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        self.store.append_messages(&self.session.id, &messages).await?;
        for message in messages {
            if message.for_display.is_visible() {
                let _ = self.event_tx.send(SessionEvent::persistent_message(message)).await;
            }
        }
        Ok(())
    }

    pub(crate) async fn set_status(&mut self, status: SessionStatus, message: Option<String>) -> Result<()> {
        self.session.set_status(status, message.clone());
        self.store
            .update(&self.session.id, SessionUpdate::status(status, message.clone()))
            .await?;
        let _ = self.event_tx.send(SessionEvent::status(status, message)).await;
        info!(session_id = %self.session.id, ?status, "session status transition");
        Ok(())
    }
}

enum TurnEnd {
    Continue,
    Stop(SessionStatus),
}

struct PlanResponse {
    thought: Option<String>,
    text: Option<String>,
    function_calls: Vec<pilotcore_core::FunctionCall>,
    token_usage: Option<TokenUsage>,
}

impl PlanResponse {
    fn is_empty(&self) -> bool {
        self.text.is_none() && self.function_calls.is_empty()
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Sums two optional usages, since a streamed call's usage can arrive split
/// across chunks and a retried call's usage should add to the first attempt's.
fn merge_token_usage(a: Option<TokenUsage>, b: Option<TokenUsage>) -> Option<TokenUsage> {
    match (a, b) {
        (None, None) => None,
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (Some(a), Some(b)) => Some(TokenUsage {
            prompt_tokens: a.prompt_tokens + b.prompt_tokens,
            completion_tokens: a.completion_tokens + b.completion_tokens,
            cache_read_tokens: add_optional(a.cache_read_tokens, b.cache_read_tokens),
            cache_write_tokens: add_optional(a.cache_write_tokens, b.cache_write_tokens),
        }),
    }
}

fn add_optional(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(0) + b.unwrap_or(0)),
    }
}
