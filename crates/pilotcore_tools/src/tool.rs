//! The `ComputerTool` trait every catalog entry implements (§4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde_json::Value;

use crate::grounded_call::GroundedToolCall;

#[async_trait]
pub trait ComputerTool: Send + Sync {
    /// The function name the planning LLM sees, e.g. `"computer_click"`.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters_schema(&self) -> Value;

    /// Validates `args` against this tool's schema and any semantic rules
    /// (required/optional pairing, numeric ranges, `image_id` bounds) without
    /// contacting the grounding model. `tile_count` is the number of tiles
    /// produced for the current screenshot.
    ///
    /// Failures here become a forged `{error: <msg>}` tool response verbatim
    /// (§4.6 step 4: "If validation fails, push a forged ... tool-response").
    fn validate(&self, args: &Value, tile_count: usize) -> Result<(), String>;

    /// Runs detection(s) against `detector` and builds the grounded call.
    /// Only called after `validate` has succeeded. Failures here are wrapped
    /// by the caller with the `"Error during grounding: "` prefix (§4.6 step 4).
    async fn ground(
        &self,
        original: &FunctionCall,
        detector: &dyn GroundingDetector,
    ) -> Result<GroundedToolCall, String>;
}
