//! The output of a successful `ComputerTool::ground` call (§4.5).

use pilotcore_core::FunctionCall;
use pilotcore_vision::geometry::NormalizedBox;

/// The grounded call's function name is fixed regardless of which tool
/// produced it (§4.6 step 4: "produce a grounded call (name `.computer`...)").
pub const GROUNDED_CALL_NAME: &str = ".computer";

/// One screen location a tool grounded, tagged with the tile it came from so
/// the description producer can draw the right highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundedTarget {
    pub tile_index: usize,
    pub bbox: NormalizedBox,
}

/// What the description producer needs to build the human-readable review
/// text + annotated screenshot (§4.5 "description producer"). Carries only
/// tile indices and boxes; turning this into actual highlighted image bytes
/// is the Agent Loop's job, since only it owns the `Tiler` and the session's
/// image storage.
#[derive(Debug, Clone)]
pub enum DescriptionSpec {
    /// A single grounded point, e.g. click/type (highlight_box).
    Point { text: String, target: GroundedTarget },
    /// Two grounded points joined by an arrow, e.g. drag_and_drop (highlight_arrow).
    Arrow {
        text: String,
        start: GroundedTarget,
        end: GroundedTarget,
    },
    /// No screen target to highlight, e.g. key/wait.
    Plain { text: String },
}

/// A tool call whose element references have been resolved to screen
/// coordinates, paired with the text/image description shown to the
/// reviewer.
#[derive(Debug, Clone)]
pub struct GroundedToolCall {
    pub original: FunctionCall,
    pub grounded: FunctionCall,
    pub description: DescriptionSpec,
}
