//! The `.computer` action union (§6) and the response shape it returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One action in the union `{click, type, drag_and_drop, scroll, key, wait, screenshot}`
/// accepted by the OS-automation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ComputerAction {
    Click {
        coordinate: [i64; 2],
        num_clicks: u32,
        button_type: String,
        hold_keys: Vec<String>,
    },
    Type {
        coordinate: Option<[i64; 2]>,
        text: String,
        overwrite: bool,
        enter: bool,
    },
    DragAndDrop {
        coordinate: [i64; 2],
        target_coordinate: [i64; 2],
        hold_keys: Vec<String>,
    },
    Scroll {
        coordinate: [i64; 2],
        direction: String,
        amount: u32,
    },
    Key {
        keys: Vec<String>,
        hold_duration: f64,
    },
    Wait {
        time: f64,
    },
    Screenshot,
}

impl ComputerAction {
    /// Parses the grounded tool call's JSON `args` (produced by
    /// `pilotcore_tools`) into a typed action. The Tool Catalog emits plain
    /// `serde_json::Value` so this crate doesn't need a dependency on it.
    pub fn from_grounded_args(args: &Value) -> std::result::Result<Self, String> {
        serde_json::from_value(args.clone()).map_err(|e| format!("malformed grounded call args: {e}"))
    }
}

/// What the automation endpoint returns for one action (§6: "Returns inline
/// data for screenshots ... and a text output for others").
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResponse {
    Image { mime_type: String, data: Vec<u8> },
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_click_action_from_grounded_json() {
        let args = json!({
            "action": "click",
            "coordinate": [10, 20],
            "num_clicks": 2,
            "button_type": "left",
            "hold_keys": []
        });
        let action = ComputerAction::from_grounded_args(&args).unwrap();
        assert_eq!(
            action,
            ComputerAction::Click {
                coordinate: [10, 20],
                num_clicks: 2,
                button_type: "left".to_string(),
                hold_keys: vec![],
            }
        );
    }

    #[test]
    fn parses_type_action_with_null_coordinate() {
        let args = json!({"action": "type", "coordinate": null, "text": "hi", "overwrite": false, "enter": true});
        let action = ComputerAction::from_grounded_args(&args).unwrap();
        assert_eq!(
            action,
            ComputerAction::Type { coordinate: None, text: "hi".to_string(), overwrite: false, enter: true }
        );
    }

    #[test]
    fn rejects_malformed_args() {
        let args = json!({"action": "click"});
        assert!(ComputerAction::from_grounded_args(&args).is_err());
    }
}
