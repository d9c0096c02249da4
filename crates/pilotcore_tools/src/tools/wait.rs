//! `computer_wait` (§4.5).

use async_trait::async_trait;
use pilotcore_core::FunctionCall;
use pilotcore_grounding::GroundingDetector;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::grounded_call::{DescriptionSpec, GroundedToolCall, GROUNDED_CALL_NAME};
use crate::tool::ComputerTool;

#[derive(Debug, Deserialize)]
struct WaitArgs {
    time: f64,
}

pub struct Wait;

#[async_trait]
impl ComputerTool for Wait {
    fn name(&self) -> &'static str {
        "computer_wait"
    }

    fn description(&self) -> &'static str {
        "Wait for a number of seconds before continuing."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "time": {"type": "number", "minimum": 0}
            },
            "required": ["time"]
        })
    }

    fn validate(&self, args: &Value, _tile_count: usize) -> Result<(), String> {
        let args: WaitArgs =
            serde_json::from_value(args.clone()).map_err(|e| format!("invalid arguments for wait: {e}"))?;
        if args.time < 0.0 {
            return Err("time must be >= 0".to_string());
        }
        Ok(())
    }

    async fn ground(
        &self,
        original: &FunctionCall,
        _detector: &dyn GroundingDetector,
    ) -> Result<GroundedToolCall, String> {
        let args: WaitArgs = serde_json::from_value(original.args.clone())
            .map_err(|e| format!("invalid arguments for wait: {e}"))?;
        if args.time < 0.0 {
            return Err("time must be >= 0".to_string());
        }

        let grounded = FunctionCall::new(
            original.id.clone(),
            GROUNDED_CALL_NAME,
            json!({"action": "wait", "time": args.time}),
        );

        let description = DescriptionSpec::Plain { text: format!("Wait {}s", args.time) };

        Ok(GroundedToolCall { original: original.clone(), grounded, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_negative_time() {
        let wait = Wait;
        let args = json!({"time": -0.5});
        assert!(wait.validate(&args, 0).is_err());
    }

    #[test]
    fn validate_accepts_zero() {
        let wait = Wait;
        let args = json!({"time": 0});
        assert!(wait.validate(&args, 0).is_ok());
    }
}
