//! `computer_scroll`. Fully implemented, like every other tool, but
//! deliberately never added to [`crate::catalog::ToolCatalog::standard`]'s
//! declaration list (§9(a), §4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grounded_call::{DescriptionSpec, GroundedTarget, GroundedToolCall, GROUNDED_CALL_NAME};
use crate::tool::ComputerTool;

#[derive(Debug, Deserialize)]
struct ScrollArgs {
    image_id: i64,
    element_description: String,
    #[serde(default)]
    direction: ScrollDirection,
    #[serde(default = "default_amount")]
    amount: u32,
}

fn default_amount() -> u32 {
    3
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ScrollDirection {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

pub struct Scroll;

#[async_trait]
impl ComputerTool for Scroll {
    fn name(&self) -> &'static str {
        "computer_scroll"
    }

    fn description(&self) -> &'static str {
        "Scroll at the location of a UI element identified by a natural-language description."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_id": {"type": "integer", "minimum": 0},
                "element_description": {"type": "string"},
                "direction": {"type": "string", "enum": ["up", "down", "left", "right"], "default": "down"},
                "amount": {"type": "integer", "minimum": 1, "default": 3}
            },
            "required": ["image_id", "element_description"]
        })
    }

    fn validate(&self, args: &Value, tile_count: usize) -> Result<(), String> {
        let args: ScrollArgs =
            serde_json::from_value(args.clone()).map_err(|e| format!("invalid arguments for scroll: {e}"))?;
        if args.image_id < 0 || args.image_id as usize >= tile_count {
            return Err(format!(
                "Image ID exceeds the number of cropped screenshots (got {}, have {tile_count})",
                args.image_id
            ));
        }
        Ok(())
    }

    async fn ground(
        &self,
        original: &FunctionCall,
        detector: &dyn GroundingDetector,
    ) -> Result<GroundedToolCall, String> {
        let args: ScrollArgs = serde_json::from_value(original.args.clone())
            .map_err(|e| format!("invalid arguments for scroll: {e}"))?;
        let tile_index = args.image_id as usize;

        let outcome = detector
            .detect(tile_index, &format!("Click on: {}", args.element_description))
            .await?;

        let grounded = FunctionCall::new(
            original.id.clone(),
            GROUNDED_CALL_NAME,
            json!({
                "action": "scroll",
                "coordinate": [outcome.screen_coordinate.x, outcome.screen_coordinate.y],
                "direction": args.direction.as_str(),
                "amount": args.amount,
            }),
        );

        let description = DescriptionSpec::Point {
            text: format!(
                "Scroll {} on \"{}\" at ({}, {})",
                args.direction.as_str(), args.element_description, outcome.screen_coordinate.x, outcome.screen_coordinate.y
            ),
            target: GroundedTarget { tile_index: outcome.tile_index, bbox: outcome.bbox },
        };

        Ok(GroundedToolCall { original: original.clone(), grounded, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range_image_id() {
        let scroll = Scroll;
        let args = json!({"image_id": 2, "element_description": "list"});
        assert!(scroll.validate(&args, 1).is_err());
    }
}
