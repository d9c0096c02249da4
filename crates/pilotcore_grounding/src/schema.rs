//! The bounded-JSON response contract for a grounding call (§4.4 step 2/4).

use pilotcore_vision::geometry::NormalizedBox;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{GroundingError, Result};

/// `{box_2d: [ymin, xmin, ymax, xmax], label?: string}` as returned by the
/// grounding model, before range/ordering validation.
#[derive(Debug, Deserialize)]
pub struct Detection {
    pub box_2d: Vec<i64>,
    pub label: Option<String>,
}

impl Detection {
    /// Validates §4.4 step 4: exactly four elements, each in [0, 1000],
    /// `ymin < ymax` and `xmin < xmax`.
    pub fn into_validated_box(self) -> Result<NormalizedBox> {
        if self.box_2d.len() != 4 {
            return Err(GroundingError::WrongBoxLength(self.box_2d.len()));
        }
        for &v in &self.box_2d {
            if !(0..=1000).contains(&v) {
                return Err(GroundingError::CoordinateOutOfRange(v));
            }
        }
        let (ymin, xmin, ymax, xmax) = (
            self.box_2d[0] as i32,
            self.box_2d[1] as i32,
            self.box_2d[2] as i32,
            self.box_2d[3] as i32,
        );
        if ymin >= ymax {
            return Err(GroundingError::InvertedYRange { ymin, ymax });
        }
        if xmin >= xmax {
            return Err(GroundingError::InvertedXRange { xmin, xmax });
        }
        Ok(NormalizedBox { ymin, xmin, ymax, xmax })
    }
}

/// Parses the grounding model's JSON text (§4.4 step 3: "If the response is
/// an array, take element 0").
pub fn parse_detection(text: &str) -> Result<Detection> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| GroundingError::MalformedJson(e.to_string()))?;
    let object = match value {
        Value::Array(mut items) => {
            if items.is_empty() {
                return Err(GroundingError::EmptyResponse);
            }
            items.remove(0)
        }
        other => other,
    };
    serde_json::from_value(object).map_err(|e| GroundingError::MalformedJson(e.to_string()))
}

/// The JSON schema supplied as `responseMimeType: application/json` config (§4.4 step 2).
pub fn response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "box_2d": {
                "type": "array",
                "items": { "type": "integer" },
                "minItems": 4,
                "maxItems": 4
            },
            "label": { "type": "string" }
        },
        "required": ["box_2d"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let detection = parse_detection(r#"{"box_2d": [1, 2, 3, 4]}"#).unwrap();
        assert_eq!(detection.box_2d, vec![1, 2, 3, 4]);
    }

    #[test]
    fn parses_array_and_takes_first() {
        let detection =
            parse_detection(r#"[{"box_2d": [1, 2, 3, 4]}, {"box_2d": [5, 6, 7, 8]}]"#).unwrap();
        assert_eq!(detection.box_2d, vec![1, 2, 3, 4]);
    }

    #[test]
    fn rejects_wrong_length() {
        let detection = Detection {
            box_2d: vec![1, 2, 3],
            label: None,
        };
        let err = detection.into_validated_box().unwrap_err();
        assert!(matches!(err, GroundingError::WrongBoxLength(3)));
    }

    #[test]
    fn rejects_out_of_range_coordinate() {
        let detection = Detection {
            box_2d: vec![0, 0, 100, 1001],
            label: None,
        };
        let err = detection.into_validated_box().unwrap_err();
        assert!(matches!(err, GroundingError::CoordinateOutOfRange(1001)));
    }

    #[test]
    fn accepts_boundary_values() {
        let detection = Detection {
            box_2d: vec![0, 0, 1000, 1000],
            label: None,
        };
        assert!(detection.into_validated_box().is_ok());
    }
}
