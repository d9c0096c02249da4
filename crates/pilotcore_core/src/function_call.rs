use serde::{Deserialize, Serialize};

/// A tool/function invocation requested by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub id: String,
    pub name: String,
    pub args: serde_json::Value,
}

impl FunctionCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// The outcome of executing a `FunctionCall`: exactly one of `output`/`error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionResponseData {
    Output { output: serde_json::Value },
    Error { error: String },
}

impl FunctionResponseData {
    pub fn output(value: serde_json::Value) -> Self {
        FunctionResponseData::Output { output: value }
    }

    pub fn error(message: impl Into<String>) -> Self {
        FunctionResponseData::Error {
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FunctionResponseData::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_response_error_roundtrip() {
        let resp = FunctionResponseData::error("Rejected by user");
        let json = serde_json::to_string(&resp).unwrap();
        let decoded: FunctionResponseData = serde_json::from_str(&json).unwrap();
        assert!(decoded.is_error());
    }

    #[test]
    fn function_response_output_is_not_error() {
        let resp = FunctionResponseData::output(serde_json::json!({"ok": true}));
        assert!(!resp.is_error());
    }
}
