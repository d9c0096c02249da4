//! `computer_drag_and_drop` (§4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grounded_call::{DescriptionSpec, GroundedTarget, GroundedToolCall, GROUNDED_CALL_NAME};
use crate::tool::ComputerTool;

#[derive(Debug, Deserialize)]
struct DragAndDropArgs {
    starting_image_id: i64,
    starting_description: String,
    ending_image_id: i64,
    ending_description: String,
    #[serde(default)]
    hold_keys: Vec<String>,
}

pub struct DragAndDrop;

#[async_trait]
impl ComputerTool for DragAndDrop {
    fn name(&self) -> &'static str {
        "computer_drag_and_drop"
    }

    fn description(&self) -> &'static str {
        "Drag from one UI element to another, each identified by a natural-language description."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "starting_image_id": {"type": "integer", "minimum": 0},
                "starting_description": {"type": "string"},
                "ending_image_id": {"type": "integer", "minimum": 0},
                "ending_description": {"type": "string"},
                "hold_keys": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["starting_image_id", "starting_description", "ending_image_id", "ending_description"]
        })
    }

    fn validate(&self, args: &Value, tile_count: usize) -> Result<(), String> {
        let args: DragAndDropArgs = serde_json::from_value(args.clone())
            .map_err(|e| format!("invalid arguments for drag_and_drop: {e}"))?;
        for (label, id) in [
            ("starting_image_id", args.starting_image_id),
            ("ending_image_id", args.ending_image_id),
        ] {
            if id < 0 || id as usize >= tile_count {
                return Err(format!(
                    "Image ID exceeds the number of cropped screenshots ({label} = {id}, have {tile_count})"
                ));
            }
        }
        Ok(())
    }

    async fn ground(
        &self,
        original: &FunctionCall,
        detector: &dyn GroundingDetector,
    ) -> Result<GroundedToolCall, String> {
        let args: DragAndDropArgs = serde_json::from_value(original.args.clone())
            .map_err(|e| format!("invalid arguments for drag_and_drop: {e}"))?;

        let start = detector
            .detect(args.starting_image_id as usize, &format!("Click on: {}", args.starting_description))
            .await?;
        let end = detector
            .detect(args.ending_image_id as usize, &format!("Click on: {}", args.ending_description))
            .await?;

        let grounded = FunctionCall::new(
            original.id.clone(),
            GROUNDED_CALL_NAME,
            json!({
                "action": "drag_and_drop",
                "coordinate": [start.screen_coordinate.x, start.screen_coordinate.y],
                "target_coordinate": [end.screen_coordinate.x, end.screen_coordinate.y],
                "hold_keys": args.hold_keys,
            }),
        );

        let description = DescriptionSpec::Arrow {
            text: format!(
                "Drag \"{}\" to \"{}\"",
                args.starting_description, args.ending_description
            ),
            start: GroundedTarget { tile_index: start.tile_index, bbox: start.bbox },
            end: GroundedTarget { tile_index: end.tile_index, bbox: end.bbox },
        };

        Ok(GroundedToolCall { original: original.clone(), grounded, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_out_of_range_either_id() {
        let tool = DragAndDrop;
        let args = json!({
            "starting_image_id": 0, "starting_description": "a",
            "ending_image_id": 5, "ending_description": "b"
        });
        let err = tool.validate(&args, 2).unwrap_err();
        assert!(err.contains("Image ID exceeds"));
    }
}
