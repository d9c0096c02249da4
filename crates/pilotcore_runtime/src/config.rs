//! Runtime configuration (§10.3): store root, model name, provider backend,
//! default accept-set, and event-channel sizing, overridable by environment
//! variable for deployment and by explicit builder calls for tests.

use std::path::PathBuf;
use std::str::FromStr;

/// Which content-generator backend a `pilotcore_cli`-constructed `Runtime`
/// should wire up. The `ContentGenerator` trait itself is opaque (§6); this
/// only selects which concrete implementation the CLI instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    #[default]
    Gemini,
    Anthropic,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::Anthropic => "anthropic",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(LlmProvider::Gemini),
            "anthropic" => Ok(LlmProvider::Anthropic),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Runtime configuration for one `Runtime` instance.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Planning/grounding model name (§4.6 step 3: "model = session model").
    pub model: String,
    /// Which `ContentGenerator` backend `pilotcore_cli` should construct.
    pub provider: LlmProvider,
    /// Root directory the `SessionStore` persists sessions under.
    pub store_root: PathBuf,
    /// Tool names auto-accepted (as if the user had already chosen
    /// `accept_session`) for every newly created session.
    pub default_accept_set: Vec<String>,
    /// Bounded channel capacity for the per-session `SessionEvent` sink.
    pub event_channel_capacity: usize,
}

impl RuntimeConfig {
    pub fn new(store_root: PathBuf) -> Self {
        Self {
            model: "gemini-2.5-computer-use".to_string(),
            provider: LlmProvider::default(),
            store_root,
            default_accept_set: Vec::new(),
            event_channel_capacity: 64,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_default_accept_set(mut self, tools: Vec<String>) -> Self {
        self.default_accept_set = tools;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Reads `PILOTCORE_MODEL`, `PILOTCORE_PROVIDER`, `PILOTCORE_STORE_ROOT`,
    /// `PILOTCORE_ACCEPT_SET` (comma-separated), `PILOTCORE_EVENT_BUFFER`.
    pub fn from_env(default_store_root: PathBuf) -> Self {
        let mut config = Self::new(default_store_root);

        if let Ok(model) = std::env::var("PILOTCORE_MODEL") {
            config.model = model;
        }
        if let Ok(provider) = std::env::var("PILOTCORE_PROVIDER") {
            if let Ok(provider) = provider.parse::<LlmProvider>() {
                config.provider = provider;
            }
        }
        if let Ok(root) = std::env::var("PILOTCORE_STORE_ROOT") {
            config.store_root = PathBuf::from(root);
        }
        if let Ok(list) = std::env::var("PILOTCORE_ACCEPT_SET") {
            config.default_accept_set =
                list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        }
        if let Ok(capacity) = std::env::var("PILOTCORE_EVENT_BUFFER") {
            if let Ok(val) = capacity.parse::<usize>() {
                config.event_channel_capacity = val;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_str() {
        assert_eq!("gemini".parse(), Ok(LlmProvider::Gemini));
        assert_eq!("ANTHROPIC".parse(), Ok(LlmProvider::Anthropic));
        assert!("unknown".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let config = RuntimeConfig::new(PathBuf::from("/tmp/sessions"))
            .with_model("gemini-3-pro")
            .with_provider(LlmProvider::Anthropic)
            .with_default_accept_set(vec!["computer_wait".to_string()])
            .with_event_channel_capacity(8);
        assert_eq!(config.model, "gemini-3-pro");
        assert_eq!(config.provider, LlmProvider::Anthropic);
        assert_eq!(config.default_accept_set, vec!["computer_wait".to_string()]);
        assert_eq!(config.event_channel_capacity, 8);
    }
}
