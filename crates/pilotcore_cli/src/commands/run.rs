//! `pilot-agent run <prompt>`: starts a new session and runs it to its next
//! suspension point (`stagnant`, `pending`, or `error`).

use std::sync::Arc;

use anyhow::Result;
use pilotcore_automation::AutomationClient;
use pilotcore_llm::ContentGenerator;
use pilotcore_runtime::{Runtime, RuntimeConfig, TurnInput};
use pilotcore_store::SessionStore;
use pilotcore_tools::ToolCatalog;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::output;

#[allow(clippy::too_many_arguments)]
pub async fn handle(
    store: Arc<SessionStore>,
    automation: Arc<dyn AutomationClient>,
    generator: Arc<dyn ContentGenerator>,
    catalog: Arc<ToolCatalog>,
    config: RuntimeConfig,
    prompt: String,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(config.event_channel_capacity);
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            output::event(&event);
        }
    });

    let mut runtime = Runtime::create(store, automation, generator, catalog, config, "cli session", tx).await?;
    output::kv("session", &runtime.session().id.clone());

    let status = runtime.run(TurnInput::Text(prompt), CancellationToken::new()).await?;
    drop(runtime);
    let _ = printer.await;

    output::kv("status", &format!("{status:?}").to_lowercase());
    if matches!(status, pilotcore_core::SessionStatus::Pending) {
        output::dim("Resolve outstanding tool reviews with `pilot-agent review <session> <reviewId> <choice>`.");
    }

    Ok(())
}
