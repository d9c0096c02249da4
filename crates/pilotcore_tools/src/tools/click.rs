//! `computer_click` (§4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grounded_call::{DescriptionSpec, GroundedTarget, GroundedToolCall, GROUNDED_CALL_NAME};
use crate::tool::ComputerTool;

#[derive(Debug, Deserialize)]
struct ClickArgs {
    image_id: i64,
    element_description: String,
    #[serde(default = "default_num_clicks")]
    num_clicks: u32,
    #[serde(default)]
    button_type: ButtonType,
    #[serde(default)]
    hold_keys: Vec<String>,
}

fn default_num_clicks() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
enum ButtonType {
    #[default]
    Left,
    Middle,
    Right,
}

impl ButtonType {
    fn as_str(self) -> &'static str {
        match self {
            ButtonType::Left => "left",
            ButtonType::Middle => "middle",
            ButtonType::Right => "right",
        }
    }
}

pub struct Click;

#[async_trait]
impl ComputerTool for Click {
    fn name(&self) -> &'static str {
        "computer_click"
    }

    fn description(&self) -> &'static str {
        "Click on a UI element identified by a natural-language description within a numbered screenshot tile."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "image_id": {"type": "integer", "minimum": 0},
                "element_description": {"type": "string"},
                "num_clicks": {"type": "integer", "minimum": 1, "default": 1},
                "button_type": {"type": "string", "enum": ["left", "middle", "right"], "default": "left"},
                "hold_keys": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["image_id", "element_description"]
        })
    }

    fn validate(&self, args: &Value, tile_count: usize) -> Result<(), String> {
        let args: ClickArgs =
            serde_json::from_value(args.clone()).map_err(|e| format!("invalid arguments for click: {e}"))?;
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
        let args: ClickArgs = serde_json::from_value(original.args.clone())
            .map_err(|e| format!("invalid arguments for click: {e}"))?;
        let tile_index = args.image_id as usize;

        let outcome = detector
            .detect(tile_index, &format!("Click on: {}", args.element_description))
            .await?;

        let grounded = FunctionCall::new(
            original.id.clone(),
            GROUNDED_CALL_NAME,
            json!({
                "action": "click",
                "coordinate": [outcome.screen_coordinate.x, outcome.screen_coordinate.y],
                "num_clicks": args.num_clicks,
                "button_type": args.button_type.as_str(),
                "hold_keys": args.hold_keys,
            }),
        );

        let description = DescriptionSpec::Point {
            text: format!(
                "Click ({}x) on \"{}\" at ({}, {})",
                args.num_clicks, args.element_description, outcome.screen_coordinate.x, outcome.screen_coordinate.y
            ),
            target: GroundedTarget {
                tile_index: outcome.tile_index,
                bbox: outcome.bbox,
            },
        };

        Ok(GroundedToolCall {
            original: original.clone(),
            grounded,
            description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilotcore_grounding::GroundingOutcome;
    use pilotcore_vision::geometry::{NormalizedBox, ScreenCoord};

    struct FakeDetector {
        tile_count: usize,
        outcome: GroundingOutcome,
    }

    #[async_trait]
    impl GroundingDetector for FakeDetector {
        fn tile_count(&self) -> usize {
            self.tile_count
        }

        async fn detect(&self, _tile_index: usize, _desc: &str) -> Result<GroundingOutcome, String> {
            Ok(self.outcome.clone())
        }
    }

    fn sample_outcome() -> GroundingOutcome {
        GroundingOutcome {
            tile_index: 0,
            bbox: NormalizedBox { ymin: 0, xmin: 0, ymax: 100, xmax: 100 },
            screen_coordinate: ScreenCoord { x: 42, y: 84 },
            label: Some("OK button".to_string()),
        }
    }

    #[test]
    fn validate_rejects_out_of_range_image_id() {
        let click = Click;
        let args = json!({"image_id": 3, "element_description": "OK"});
        let err = click.validate(&args, 2).unwrap_err();
        assert!(err.contains("Image ID exceeds"));
    }

    #[test]
    fn validate_accepts_in_range_image_id() {
        let click = Click;
        let args = json!({"image_id": 1, "element_description": "OK"});
        assert!(click.validate(&args, 2).is_ok());
    }

    #[tokio::test]
    async fn ground_produces_computer_action() {
        let click = Click;
        let original = FunctionCall::new(
            "call-1",
            "computer_click",
            json!({"image_id": 0, "element_description": "OK button", "num_clicks": 2}),
        );
        let detector = FakeDetector { tile_count: 1, outcome: sample_outcome() };
        let grounded = click.ground(&original, &detector).await.unwrap();
        assert_eq!(grounded.grounded.name, GROUNDED_CALL_NAME);
        assert_eq!(grounded.grounded.id, "call-1");
        assert_eq!(grounded.grounded.args["action"], "click");
        assert_eq!(grounded.grounded.args["coordinate"], json!([42, 84]));
        assert_eq!(grounded.grounded.args["num_clicks"], 2);
    }
}
