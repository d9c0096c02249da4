//! Span-construction macros and span-recording helpers shared across the
//! agent execution core (§10.1).

/// Creates a span for one agent-loop operation (e.g. `run`, a single turn).
///
/// ```rust
/// use pilotcore_observability::agent_span;
///
/// let span = agent_span!("session-123", "run");
/// let _guard = span.enter();
/// // ... turn procedure ...
/// ```
#[macro_export]
macro_rules! agent_span {
    ($session_id:expr, $operation:expr) => {
        tracing::info_span!(
            "agent.operation",
            session.id = $session_id,
            operation = $operation,
        )
    };
}

/// Creates a span for one grounding-detection call.
#[macro_export]
macro_rules! grounding_span {
    ($session_id:expr, $tile_index:expr) => {
        tracing::info_span!(
            "grounding.detect",
            session.id = $session_id,
            tile.index = $tile_index,
        )
    };
}

/// Records an error on the current span and emits an `error!` event.
pub fn record_error<E: std::error::Error>(error: &E) {
    let span = tracing::Span::current();
    span.record("error", true);
    span.record("error.message", error.to_string());
    tracing::error!(error = %error, "operation failed");
}

/// Records a duration (in milliseconds) on the current span.
pub fn record_duration(key: &str, duration: std::time::Duration) {
    let span = tracing::Span::current();
    span.record(key, duration.as_millis() as u64);
}
