//! `computer_key` (§4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grounded_call::{DescriptionSpec, GroundedToolCall, GROUNDED_CALL_NAME};
use crate::tool::ComputerTool;

#[derive(Debug, Deserialize)]
struct KeyArgs {
    keys: Vec<String>,
    #[serde(default)]
    hold_duration: f64,
}

impl KeyArgs {
    fn check(&self) -> Result<(), String> {
        if self.keys.is_empty() {
            return Err("keys must be a non-empty list".to_string());
        }
        if self.hold_duration < 0.0 {
            return Err("hold_duration must be >= 0".to_string());
        }
        Ok(())
    }
}

pub struct Key;

#[async_trait]
impl ComputerTool for Key {
    fn name(&self) -> &'static str {
        "computer_key"
    }

    fn description(&self) -> &'static str {
        "Press a key or key combination."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keys": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                "hold_duration": {"type": "number", "minimum": 0, "default": 0}
            },
            "required": ["keys"]
        })
    }

    fn validate(&self, args: &Value, _tile_count: usize) -> Result<(), String> {
        let args: KeyArgs =
            serde_json::from_value(args.clone()).map_err(|e| format!("invalid arguments for key: {e}"))?;
        args.check()
    }

    async fn ground(
        &self,
        original: &FunctionCall,
        _detector: &dyn GroundingDetector,
    ) -> Result<GroundedToolCall, String> {
        let args: KeyArgs = serde_json::from_value(original.args.clone())
            .map_err(|e| format!("invalid arguments for key: {e}"))?;
        args.check()?;

        let grounded = FunctionCall::new(
            original.id.clone(),
            GROUNDED_CALL_NAME,
            json!({
                "action": "key",
                "keys": args.keys,
                "hold_duration": args.hold_duration,
            }),
        );

        let description = DescriptionSpec::Plain { text: format!("Press {}", args.keys.join("+")) };

        Ok(GroundedToolCall { original: original.clone(), grounded, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_keys() {
        let key = Key;
        let args = json!({"keys": []});
        assert!(key.validate(&args, 0).is_err());
    }

    #[test]
    fn validate_rejects_negative_hold_duration() {
        let key = Key;
        let args = json!({"keys": ["Return"], "hold_duration": -1});
        assert!(key.validate(&args, 0).is_err());
    }
}
