use thiserror::Error;

/// Errors crossing the LLM content-generator boundary (§7 "LLM protocol errors").
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request to model failed: {0}")]
    RequestFailed(String),

    #[error("model returned malformed JSON: {0}")]
    MalformedJson(String),

    #[error("call was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, LlmError>;
