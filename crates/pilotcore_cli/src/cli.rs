//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand, ValueEnum};

/// Computer-use agent execution core
#[derive(Parser)]
#[command(name = "pilot-agent", about, version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory session state is persisted under (defaults to
    /// `PILOTCORE_STORE_ROOT` or `./sessions`)
    #[arg(long, global = true)]
    pub store_root: Option<String>,

    /// Base URL of the OS-automation `.computer` endpoint
    #[arg(long, global = true)]
    pub automation_url: Option<String>,

    /// Base URL of the LLM content-generator endpoint
    #[arg(long, global = true)]
    pub llm_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a new session and run it to its next suspension point
    Run {
        /// Initial user instruction
        prompt: String,
        /// Model name (defaults to `PILOTCORE_MODEL` or a built-in default)
        #[arg(long)]
        model: Option<String>,
        /// LLM provider backend
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
    },
    /// Resolve one outstanding tool-review request and resume a session
    Review {
        /// Session id
        session: String,
        /// Review id
        review_id: String,
        /// Disposition to apply to the pending tool call
        #[arg(value_enum)]
        choice: ReviewChoiceArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProviderArg {
    Gemini,
    Anthropic,
}

impl From<ProviderArg> for pilotcore_runtime::LlmProvider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => pilotcore_runtime::LlmProvider::Gemini,
            ProviderArg::Anthropic => pilotcore_runtime::LlmProvider::Anthropic,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReviewChoiceArg {
    AcceptOnce,
    AcceptSession,
    RejectOnce,
}

impl From<ReviewChoiceArg> for pilotcore_core::ReviewChoice {
    fn from(arg: ReviewChoiceArg) -> Self {
        match arg {
            ReviewChoiceArg::AcceptOnce => pilotcore_core::ReviewChoice::AcceptOnce,
            ReviewChoiceArg::AcceptSession => pilotcore_core::ReviewChoice::AcceptSession,
            ReviewChoiceArg::RejectOnce => pilotcore_core::ReviewChoice::RejectOnce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_parses_prompt_and_optional_flags() {
        let cli = Cli::try_parse_from(["pilot-agent", "run", "open the browser", "--model", "gemini-3-pro"]).unwrap();
        match cli.command {
            Command::Run { prompt, model, provider } => {
                assert_eq!(prompt, "open the browser");
                assert_eq!(model.as_deref(), Some("gemini-3-pro"));
                assert!(provider.is_none());
            }
            _ => panic!("expected Run"),
        }
    }

    #[test]
    fn review_parses_positional_args_and_choice() {
        let cli = Cli::try_parse_from(["pilot-agent", "review", "s1", "r1", "accept-once"]).unwrap();
        match cli.command {
            Command::Review { session, review_id, choice } => {
                assert_eq!(session, "s1");
                assert_eq!(review_id, "r1");
                assert!(matches!(choice, ReviewChoiceArg::AcceptOnce));
            }
            _ => panic!("expected Review"),
        }
    }

    #[test]
    fn review_rejects_unknown_choice() {
        assert!(Cli::try_parse_from(["pilot-agent", "review", "s1", "r1", "bogus"]).is_err());
    }
}
