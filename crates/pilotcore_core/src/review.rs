use serde::{Deserialize, Serialize};

use crate::function_call::FunctionCall;

/// A user's disposition on a single pending grounded tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewChoice {
    AcceptOnce,
    AcceptSession,
    RejectOnce,
}

impl ReviewChoice {
    pub fn accepts(&self) -> bool {
        !matches!(self, ReviewChoice::RejectOnce)
    }

    pub fn accepts_for_session(&self) -> bool {
        matches!(self, ReviewChoice::AcceptSession)
    }
}

/// A request for the user to approve or reject a grounded tool call before it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolReviewRequest {
    pub review_id: String,
    pub grounded_function_call: FunctionCall,
    pub original_function_call: FunctionCall,
}

/// The user's response to a previously issued `ToolReviewRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolReviewResponseData {
    pub review_id: String,
    pub choice: ReviewChoice,
}

/// The tagged union attached to `workflow`/`user` messages that carry review
/// traffic. For each `review_id` there is exactly one `Request` and at most one
/// `Response` in the log (§8 invariant); enforcement lives in the store/runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolReviewAttachment {
    Request(ToolReviewRequest),
    Response(ToolReviewResponseData),
}

impl ToolReviewAttachment {
    pub fn review_id(&self) -> &str {
        match self {
            ToolReviewAttachment::Request(r) => &r.review_id,
            ToolReviewAttachment::Response(r) => &r.review_id,
        }
    }

    pub fn as_request(&self) -> Option<&ToolReviewRequest> {
        match self {
            ToolReviewAttachment::Request(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_response(&self) -> Option<&ToolReviewResponseData> {
        match self {
            ToolReviewAttachment::Response(r) => Some(r),
            _ => None,
        }
    }
}

/// A resolved tool-review decision, as fed back into `run_agent` on resumption.
#[derive(Debug, Clone)]
pub struct ResolvedReview {
    pub review_id: String,
    pub function_call: FunctionCall,
    pub original_function_call: FunctionCall,
    pub choice: ReviewChoice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_choice_accepts() {
        assert!(ReviewChoice::AcceptOnce.accepts());
        assert!(ReviewChoice::AcceptSession.accepts());
        assert!(!ReviewChoice::RejectOnce.accepts());
        assert!(ReviewChoice::AcceptSession.accepts_for_session());
        assert!(!ReviewChoice::AcceptOnce.accepts_for_session());
    }

    #[test]
    fn attachment_review_id() {
        let req = ToolReviewAttachment::Request(ToolReviewRequest {
            review_id: "r1".into(),
            grounded_function_call: FunctionCall::new("c1", ".computer", serde_json::json!({})),
            original_function_call: FunctionCall::new("c1", "computer_click", serde_json::json!({})),
        });
        assert_eq!(req.review_id(), "r1");
        assert!(req.as_request().is_some());
        assert!(req.as_response().is_none());
    }
}
