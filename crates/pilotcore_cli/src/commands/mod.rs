//! Command dispatch.

pub mod review;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use pilotcore_automation::{AutomationClient, HttpAutomationClient};
use pilotcore_llm::{ContentGenerator, HttpContentGenerator};
use pilotcore_runtime::RuntimeConfig;
use pilotcore_tools::ToolCatalog;

use crate::cli::{Cli, Command};

pub async fn handle(cli: Cli) -> Result<()> {
    let store_root = cli
        .store_root
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::var("PILOTCORE_STORE_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./sessions")));
    let automation_url = cli
        .automation_url
        .clone()
        .unwrap_or_else(|| std::env::var("PILOTCORE_AUTOMATION_URL").unwrap_or_else(|_| "http://localhost:8090".to_string()));
    let llm_url = cli
        .llm_url
        .clone()
        .unwrap_or_else(|| std::env::var("PILOTCORE_LLM_URL").unwrap_or_else(|_| "http://localhost:8091".to_string()));

    let store = Arc::new(pilotcore_store::SessionStore::new(store_root.clone()));
    let automation: Arc<dyn AutomationClient> = Arc::new(HttpAutomationClient::new(automation_url));
    let generator: Arc<dyn ContentGenerator> = Arc::new(HttpContentGenerator::new(llm_url));
    let catalog = Arc::new(ToolCatalog::standard());
    let config = RuntimeConfig::from_env(store_root);

    match cli.command {
        Command::Run { prompt, model, provider } => {
            let config = apply_overrides(config, model, provider);
            run::handle(store, automation, generator, catalog, config, prompt).await
        }
        Command::Review { session, review_id, choice } => {
            review::handle(store, automation, generator, catalog, config, session, review_id, choice).await
        }
    }
}

fn apply_overrides(
    mut config: RuntimeConfig,
    model: Option<String>,
    provider: Option<crate::cli::ProviderArg>,
) -> RuntimeConfig {
    if let Some(model) = model {
        config = config.with_model(model);
    }
    if let Some(provider) = provider {
        config = config.with_provider(provider.into());
    }
    config
}
