//! The Agent Loop's aggregate error type (§7, §10.2).
//!
//! Only the failure categories §7 calls fatal for a turn ("LLM protocol
//! errors", "persistence errors", and the OS-automation RPC that backs the
//! Observe step, which has no function call to attach a forged error to)
//! surface here and propagate out of [`crate::Runtime::run`]. Validation,
//! grounding, and tool-execution failures for an individual function call are
//! recoverable — they become a forged `{error}` tool-response part and the
//! turn continues (§7 categories 1-3); see `pilotcore_runtime::runtime::ground`.
//! "Resumption errors" (§7 category 7) are reported synchronously by
//! [`crate::Runtime::resolve_review`] without touching session state.

use pilotcore_automation::AutomationError;
use pilotcore_context::ContextError;
use pilotcore_llm::LlmError;
use pilotcore_store::StoreError;
use pilotcore_vision::VisionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to tile screenshot: {0}")]
    Vision(#[from] VisionError),

    #[error("planning call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("OS-automation screenshot request failed: {0}")]
    Automation(#[from] AutomationError),

    #[error("no pending review with id `{0}`")]
    UnknownReview(String),

    #[error("review `{0}` was already answered")]
    AlreadyAnswered(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("turn cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
