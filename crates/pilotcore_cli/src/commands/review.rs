//! `pilot-agent review <session> <reviewId> <choice>`: answers one
//! outstanding tool-review request and resumes the session if that was the
//! last one outstanding for its turn (§4.6 "Resumption").

use std::sync::Arc;

use anyhow::Result;
use pilotcore_automation::AutomationClient;
use pilotcore_llm::ContentGenerator;
use pilotcore_runtime::{Runtime, RuntimeConfig};
use pilotcore_store::SessionStore;
use pilotcore_tools::ToolCatalog;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cli::ReviewChoiceArg;
use crate::output;

#[allow(clippy::too_many_arguments)]
pub async fn handle(
    store: Arc<SessionStore>,
    automation: Arc<dyn AutomationClient>,
    generator: Arc<dyn ContentGenerator>,
    catalog: Arc<ToolCatalog>,
    config: RuntimeConfig,
    session_id: String,
    review_id: String,
    choice: ReviewChoiceArg,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(config.event_channel_capacity);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            output::event(&event);
        }
    });

    let mut runtime = Runtime::resume(store, automation, generator, catalog, config, &session_id, tx).await?;
    let status = runtime.resolve_review(&review_id, choice.into(), CancellationToken::new()).await?;
    drop(runtime);
    let _ = printer.await;

    output::kv("status", &format!("{status:?}").to_lowercase());
    Ok(())
}
