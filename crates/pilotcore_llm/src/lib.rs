//! The LLM content-generator boundary (§6): an opaque streaming completion
//! provider shared by the planning model and the grounding model. The real
//! provider (whatever backs the screen-observing agent) lives outside this
//! crate; only the trait and wire-shaped types are defined here so the
//! runtime and grounding pipeline can be exercised against fakes.

pub mod error;
pub mod http;
pub mod provider;
pub mod types;

#[cfg(feature = "test-util")]
pub mod fake;

pub use error::{LlmError, Result};
pub use http::HttpContentGenerator;
pub use provider::{ContentGenerator, ContentStream};
pub use types::{
    GenerateConfig, GenerateRequest, RequestMessage, RequestPart, RequestRole, ResponseChunk,
    ResponseSchema, ThinkingConfig, ToolDeclaration,
};
