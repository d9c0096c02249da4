use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{GenerateRequest, ResponseChunk};

/// An asynchronous sequence of response chunks (§6).
pub type ContentStream = BoxStream<'static, Result<ResponseChunk>>;

/// The LLM content generator (§6), opaque to this crate. The planning loop
/// and the grounding pipeline both call through this trait — the grounding
/// call simply passes a different `GenerateConfig` (bounded JSON, temperature
/// 0) and a tile image instead of the full screenshot set.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content_stream(&self, request: GenerateRequest) -> Result<ContentStream>;
}
