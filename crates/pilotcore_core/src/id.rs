use chrono::Utc;
use rand::Rng;

/// A new session identifier: an ISO-8601 timestamp with `:` and `.` replaced by `-`
/// so it sorts lexicographically and is filesystem-safe (§6).
pub fn new_session_id() -> String {
    session_id_from_timestamp(Utc::now())
}

pub fn session_id_from_timestamp(ts: chrono::DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace(':', "-")
        .replace('.', "-")
}

pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn new_review_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Ad-hoc id generator used when the LLM omits a function-call id: `<name>-<unix_ms>-<random>`.
/// §9(b): this is preserved from the original design; a broken LLM emitting colliding ids
/// across one plan response will corrupt response mapping downstream — callers must reject
/// duplicate ids within a single plan response rather than silently overwrite.
pub fn synthetic_function_call_id(name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{name}-{millis}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_has_no_colons_or_dots() {
        let id = new_session_id();
        assert!(!id.contains(':'));
        assert!(!id.contains('.'));
    }

    #[test]
    fn session_id_is_lexicographically_sortable() {
        let t1 = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00.000Z")
            .unwrap()
            .with_timezone(&Utc);
        let t2 = chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:01.000Z")
            .unwrap()
            .with_timezone(&Utc);
        let id1 = session_id_from_timestamp(t1);
        let id2 = session_id_from_timestamp(t2);
        assert!(id1 < id2);
    }

    #[test]
    fn synthetic_id_contains_name() {
        let id = synthetic_function_call_id("computer_click");
        assert!(id.starts_with("computer_click-"));
        assert_eq!(id.split('-').count(), 3);
    }
}
