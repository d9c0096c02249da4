//! Resumption (§4.6 "Resumption"): answering one outstanding tool-review
//! request and, once every sibling request for that turn has an answer,
//! re-entering the turn loop with the full resolved-decision list.

use std::collections::HashMap;

use pilotcore_core::{Message, ResolvedReview, ReviewChoice, Role, SessionStatus, SessionUpdate};
use tokio_util::sync::CancellationToken;

use super::{Runtime, TurnInput};
use crate::error::{Result, RuntimeError};

impl Runtime {
    /// Resolves one outstanding tool-review response. Returns immediately if
    /// other reviews from the same turn are still unanswered; otherwise
    /// re-enters the turn loop with every resolved decision for that turn.
    pub async fn resolve_review(
        &mut self,
        review_id: &str,
        choice: ReviewChoice,
        cancel: CancellationToken,
    ) -> Result<SessionStatus> {
        let messages = self.store.get_messages(&self.session.id, true).await?;
        let outstanding = outstanding_reviews(&messages);

        let request = outstanding
            .iter()
            .find(|r| r.review_id == review_id)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownReview(review_id.to_string()))?;

        if messages
            .iter()
            .filter_map(|m| m.review.as_ref())
            .filter_map(|a| a.as_response())
            .any(|r| r.review_id == review_id)
        {
            return Err(RuntimeError::AlreadyAnswered(review_id.to_string()));
        }

        let response = Message::new(&self.session.id, Role::User).with_review(
            pilotcore_core::ToolReviewAttachment::Response(pilotcore_core::ToolReviewResponseData {
                review_id: review_id.to_string(),
                choice,
            }),
        );
        self.append_and_emit(vec![response]).await?;

        if choice.accepts_for_session() && !self.session.is_auto_accepted(&request.original_function_call.name) {
            self.session.accept_for_session(request.original_function_call.name.clone());
            self.store
                .update(
                    &self.session.id,
                    SessionUpdate::accept_set(self.session.accept_set.clone()),
                )
                .await?;
        }

        let messages = self.store.get_messages(&self.session.id, true).await?;
        let unresolved_same_turn = outstanding_reviews(&messages)
            .into_iter()
            .filter(|r| r.turn_index == request.turn_index)
            .count();
        if unresolved_same_turn > 0 {
            return Ok(self.session.status);
        }

        let decisions = resolved_decisions_for_turn(&messages, request.turn_index);
        self.run(TurnInput::Resolved(decisions), cancel).await
    }
}

/// One outstanding (unanswered) review request, tagged with the index of the
/// run of review-tagged messages it belongs to (§5 "Ordering": every review
/// request, auto-accept response, and later resumed response for one turn
/// stays contiguous in the log, since no new turn starts while a turn is
/// `pending` — so a run boundary is exactly a turn boundary).
#[derive(Clone)]
struct OutstandingReview {
    review_id: String,
    original_function_call: pilotcore_core::FunctionCall,
    turn_index: usize,
}

/// Groups every `ToolReviewRequest` in the log by the run of review-tagged
/// messages (request or response) it falls in, ignoring non-review messages
/// that close a run and start the next one.
fn requests_by_turn(messages: &[Message]) -> Vec<(usize, &pilotcore_core::ToolReviewRequest)> {
    let mut out = Vec::new();
    let mut turn_index = 0usize;
    let mut in_run = false;
    for message in messages {
        match &message.review {
            Some(attachment) => {
                in_run = true;
                if let Some(request) = attachment.as_request() {
                    out.push((turn_index, request));
                }
            }
            None => {
                if in_run {
                    turn_index += 1;
                    in_run = false;
                }
            }
        }
    }
    out
}

/// Finds every review request in the log with no matching response.
fn outstanding_reviews(messages: &[Message]) -> Vec<OutstandingReview> {
    let answered: std::collections::HashSet<&str> = messages
        .iter()
        .filter_map(|m| m.review.as_ref())
        .filter_map(|a| a.as_response())
        .map(|r| r.review_id.as_str())
        .collect();

    requests_by_turn(messages)
        .into_iter()
        .filter(|(_, request)| !answered.contains(request.review_id.as_str()))
        .map(|(turn_index, request)| OutstandingReview {
            review_id: request.review_id.clone(),
            original_function_call: request.original_function_call.clone(),
            turn_index,
        })
        .collect()
}

/// Builds the full resolved-decisions list for one turn's worth of review
/// requests: every request in that run, paired with its (now-persisted)
/// response choice — including ones the accept-set already auto-resolved
/// earlier in the same turn.
fn resolved_decisions_for_turn(messages: &[Message], turn_index: usize) -> Vec<ResolvedReview> {
    let responses: HashMap<&str, ReviewChoice> = messages
        .iter()
        .filter_map(|m| m.review.as_ref())
        .filter_map(|a| a.as_response())
        .map(|r| (r.review_id.as_str(), r.choice))
        .collect();

    requests_by_turn(messages)
        .into_iter()
        .filter(|(index, _)| *index == turn_index)
        .filter_map(|(_, request)| {
            let choice = *responses.get(request.review_id.as_str())?;
            Some(ResolvedReview {
                review_id: request.review_id.clone(),
                function_call: request.grounded_function_call.clone(),
                original_function_call: request.original_function_call.clone(),
                choice,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pilotcore_core::{ContentBlock, FunctionCall, ToolReviewAttachment, ToolReviewRequest, ToolReviewResponseData};

    use super::*;

    fn request_message(session_id: &str, review_id: &str) -> Message {
        let call = FunctionCall::new("call-1", "click", serde_json::json!({}));
        Message::new(session_id, Role::Tool)
            .with_block(ContentBlock::text("review needed"))
            .with_review(ToolReviewAttachment::Request(ToolReviewRequest {
                review_id: review_id.to_string(),
                original_function_call: call.clone(),
                grounded_function_call: call,
            }))
    }

    fn response_message(session_id: &str, review_id: &str, choice: ReviewChoice) -> Message {
        Message::new(session_id, Role::User).with_review(ToolReviewAttachment::Response(ToolReviewResponseData {
            review_id: review_id.to_string(),
            choice,
        }))
    }

    fn workflow_message(session_id: &str) -> Message {
        Message::new(session_id, Role::Workflow).with_block(ContentBlock::text("screenshot"))
    }

    #[test]
    fn outstanding_reviews_skips_answered() {
        let session_id = "s1";
        let messages = vec![
            request_message(session_id, "r1"),
            response_message(session_id, "r1", ReviewChoice::AcceptOnce),
            request_message(session_id, "r2"),
        ];
        let outstanding = outstanding_reviews(&messages);
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].review_id, "r2");
    }

    #[test]
    fn turn_index_increments_only_across_non_review_messages() {
        let session_id = "s1";
        let messages = vec![
            workflow_message(session_id),
            request_message(session_id, "r1"),
            request_message(session_id, "r2"),
            response_message(session_id, "r1", ReviewChoice::AcceptOnce),
            workflow_message(session_id),
            request_message(session_id, "r3"),
        ];
        let outstanding = outstanding_reviews(&messages);
        let turn_of = |id: &str| outstanding.iter().find(|r| r.review_id == id).unwrap().turn_index;
        assert_eq!(turn_of("r2"), turn_of("r3") - 1);
    }

    #[test]
    fn resolved_decisions_include_responses_added_after_the_original_batch() {
        let session_id = "s1";
        let mut messages = vec![
            request_message(session_id, "r1"),
            request_message(session_id, "r2"),
            response_message(session_id, "r1", ReviewChoice::AcceptOnce),
        ];
        // Simulate a later call to `resolve_review` appending the second
        // response well after the original request batch, with nothing else
        // persisted in between (the turn was `pending` the whole time).
        messages.push(response_message(session_id, "r2", ReviewChoice::RejectOnce));

        let decisions = resolved_decisions_for_turn(&messages, 0);
        assert_eq!(decisions.len(), 2);
        assert!(decisions.iter().any(|d| d.review_id == "r1" && d.choice == ReviewChoice::AcceptOnce));
        assert!(decisions.iter().any(|d| d.review_id == "r2" && d.choice == ReviewChoice::RejectOnce));
    }
}
