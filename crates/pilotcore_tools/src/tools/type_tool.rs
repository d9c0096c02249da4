//! `computer_type` (§4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grounded_call::{DescriptionSpec, GroundedTarget, GroundedToolCall, GROUNDED_CALL_NAME};
use crate::tool::ComputerTool;

#[derive(Debug, Deserialize)]
struct TypeArgs {
    text: String,
    image_id: Option<i64>,
    element_description: Option<String>,
    #[serde(default)]
    overwrite: bool,
    #[serde(default)]
    enter: bool,
}

impl TypeArgs {
    fn check_pairing(&self) -> Result<(), String> {
        if self.image_id.is_some() != self.element_description.is_some() {
            return Err("image_id and element_description must be both present or both absent".to_string());
        }
        Ok(())
    }
}

pub struct Type;

#[async_trait]
impl ComputerTool for Type {
    fn name(&self) -> &'static str {
        "computer_type"
    }

    fn description(&self) -> &'static str {
        "Type text, optionally clicking a UI element first and/or clearing its existing contents."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "image_id": {"type": "integer", "minimum": 0},
                "element_description": {"type": "string"},
                "overwrite": {"type": "boolean", "default": false},
                "enter": {"type": "boolean", "default": false}
            },
            "required": ["text"]
        })
    }

    fn validate(&self, args: &Value, tile_count: usize) -> Result<(), String> {
        let args: TypeArgs =
            serde_json::from_value(args.clone()).map_err(|e| format!("invalid arguments for type: {e}"))?;
        args.check_pairing()?;
        if let Some(image_id) = args.image_id {
            if image_id < 0 || image_id as usize >= tile_count {
                return Err(format!(
                    "Image ID exceeds the number of cropped screenshots (got {image_id}, have {tile_count})"
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
        let args: TypeArgs = serde_json::from_value(original.args.clone())
            .map_err(|e| format!("invalid arguments for type: {e}"))?;
        args.check_pairing()?;

        let (coordinate, description) = match (args.image_id, &args.element_description) {
            (Some(image_id), Some(desc)) => {
                let tile_index = image_id as usize;
                let outcome = detector.detect(tile_index, &format!("Click on: {desc}")).await?;
                (
                    Some([outcome.screen_coordinate.x, outcome.screen_coordinate.y]),
                    DescriptionSpec::Point {
                        text: format!("Type \"{}\" into \"{desc}\"", args.text),
                        target: GroundedTarget { tile_index: outcome.tile_index, bbox: outcome.bbox },
                    },
                )
            }
            _ => (None, DescriptionSpec::Plain { text: format!("Type \"{}\"", args.text) }),
        };

        let grounded = FunctionCall::new(
            original.id.clone(),
            GROUNDED_CALL_NAME,
            json!({
                "action": "type",
                "coordinate": coordinate,
                "text": args.text,
                "overwrite": args.overwrite,
                "enter": args.enter,
            }),
        );

        Ok(GroundedToolCall { original: original.clone(), grounded, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_partial_pairing() {
        let type_tool = Type;
        let args = json!({"text": "hello", "image_id": 0});
        let err = type_tool.validate(&args, 2).unwrap_err();
        assert!(err.contains("must be both present or both absent"));
    }

    #[test]
    fn validate_accepts_text_only() {
        let type_tool = Type;
        let args = json!({"text": "hello"});
        assert!(type_tool.validate(&args, 0).is_ok());
    }
}
