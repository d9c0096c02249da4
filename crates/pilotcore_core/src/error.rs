use thiserror::Error;

/// Errors surfaced by the data-model crate itself: malformed ids, cross-session
/// image references, and the like. Component-specific failures (store I/O,
/// grounding validation, tool argument errors) live in their own crates' error
/// types per §7/§10.2.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("image reference `{0}` does not belong to session `{1}`")]
    CrossSessionImageRef(String, String),

    #[error("malformed image reference: {0}")]
    MalformedImageRef(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_session_error_message() {
        let err = CoreError::CrossSessionImageRef("other".into(), "this".into());
        assert!(err.to_string().contains("other"));
        assert!(err.to_string().contains("this"));
    }
}
