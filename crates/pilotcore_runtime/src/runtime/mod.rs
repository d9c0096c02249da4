//! The `Runtime` type: one in-process handle to a session's agent loop
//! (§4.6) — a struct bundling the session, its collaborators, and an event
//! sink, built fresh per session rather than kept as a long-lived singleton.

mod agent_loop;
mod description;
mod ground;
mod llm;
mod resume;

use std::sync::Arc;

use pilotcore_automation::AutomationClient;
use pilotcore_core::{FunctionCall, ReviewChoice, Session};
use pilotcore_llm::ContentGenerator;
use pilotcore_store::SessionStore;
use pilotcore_tools::ToolCatalog;
use tokio::sync::mpsc;

use crate::config::RuntimeConfig;
use crate::error::Result;

/// What a turn is seeded with (§4.6 "Input is either a plain user text or a
/// list of resolved tool reviews").
pub enum TurnInput {
    Text(String),
    Resolved(Vec<pilotcore_core::ResolvedReview>),
}

/// One decision on a single outstanding review, as delivered by a
/// `tool_review` client request (§6).
pub struct ReviewDecision {
    pub review_id: String,
    pub choice: ReviewChoice,
}

/// Ties a session's durable state to its collaborators for the duration of
/// one turn procedure. Not `Clone`/`Send` across tasks by design — §5 runs
/// one logical agent task per session, sequentially, so a `Runtime` is owned
/// by that one task.
pub struct Runtime {
    pub(crate) session: Session,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) automation: Arc<dyn AutomationClient>,
    pub(crate) generator: Arc<dyn ContentGenerator>,
    pub(crate) catalog: Arc<ToolCatalog>,
    pub(crate) event_tx: mpsc::Sender<pilotcore_core::SessionEvent>,
    pub(crate) config: RuntimeConfig,
}

impl Runtime {
    /// Creates a brand-new session (persisted immediately) and a `Runtime`
    /// bound to it, applying the configured default accept-set.
    pub async fn create(
        store: Arc<SessionStore>,
        automation: Arc<dyn AutomationClient>,
        generator: Arc<dyn ContentGenerator>,
        catalog: Arc<ToolCatalog>,
        config: RuntimeConfig,
        display_name: impl Into<String>,
        event_tx: mpsc::Sender<pilotcore_core::SessionEvent>,
    ) -> Result<Self> {
        let mut session = Session::new(display_name, config.model.clone());
        for tool in &config.default_accept_set {
            session.accept_for_session(tool.clone());
        }
        store.create(&session).await?;

        Ok(Self {
            session,
            store,
            automation,
            generator,
            catalog,
            event_tx,
            config,
        })
    }

    /// Rebinds a `Runtime` to an already-persisted session, e.g. to resume a
    /// `pending` session or to start a fresh turn on a `stagnant` one.
    pub async fn resume(
        store: Arc<SessionStore>,
        automation: Arc<dyn AutomationClient>,
        generator: Arc<dyn ContentGenerator>,
        catalog: Arc<ToolCatalog>,
        config: RuntimeConfig,
        session_id: &str,
        event_tx: mpsc::Sender<pilotcore_core::SessionEvent>,
    ) -> Result<Self> {
        let session = store.get(session_id).await?;
        Ok(Self {
            session,
            store,
            automation,
            generator,
            catalog,
            event_tx,
            config,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// An id-normalized function call paired with the one the LLM actually
/// returned, used while walking the plan response (§4.6 step 4).
pub(crate) struct NormalizedCall {
    pub original: FunctionCall,
}

impl NormalizedCall {
    pub(crate) fn from_model(call: FunctionCall) -> Self {
        if call.id.is_empty() {
            let id = pilotcore_core::id::synthetic_function_call_id(&call.name);
            NormalizedCall {
                original: FunctionCall::new(id, call.name, call.args),
            }
        } else {
            NormalizedCall { original: call }
        }
    }
}
