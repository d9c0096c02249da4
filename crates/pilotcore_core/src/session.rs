use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::new_session_id;

/// Durable session status (§3). `Error` carries no payload here — the status
/// message field on `Session` carries the text, matching the illustrative
/// metadata.json layout in §6 (one flat JSON object, not a tagged enum on disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Pending,
    Stagnant,
    Error,
}

impl Default for SessionStatus {
    fn default() -> Self {
        SessionStatus::Running
    }
}

/// Token counts from one LLM call (§10.1 ambient observability). Cache
/// fields are optional since not every provider reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            cache_read_tokens: None,
            cache_write_tokens: None,
        }
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Durable session metadata (§3). Created on first user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub display_name: String,
    pub model: String,
    pub status: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub accept_set: HashSet<String>,
    pub turn_counter: u64,
    #[serde(default)]
    pub total_prompt_tokens: u64,
    #[serde(default)]
    pub total_completion_tokens: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(display_name: impl Into<String>, model: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_session_id(),
            display_name: display_name.into(),
            model: model.into(),
            status: SessionStatus::Running,
            status_message: None,
            accept_set: HashSet::new(),
            turn_counter: 0,
            total_prompt_tokens: 0,
            total_completion_tokens: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Folds one LLM call's usage into the session's running totals (§3,
    /// mirroring the teacher's per-turn `TokenUsage` but accumulated at the
    /// session level since this system has no per-turn on-disk record).
    pub fn record_token_usage(&mut self, usage: TokenUsage) {
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: SessionStatus, message: Option<String>) {
        self.status = status;
        self.status_message = message;
        self.updated_at = Utc::now();
    }

    pub fn accept_for_session(&mut self, tool_name: impl Into<String>) -> bool {
        let inserted = self.accept_set.insert(tool_name.into());
        if inserted {
            self.updated_at = Utc::now();
        }
        inserted
    }

    pub fn is_auto_accepted(&self, tool_name: &str) -> bool {
        self.accept_set.contains(tool_name)
    }

    pub fn next_turn(&mut self) -> u64 {
        self.turn_counter += 1;
        self.turn_counter
    }

    /// Merges a partial metadata update into this session (§4.1 `update`). The id
    /// is immutable and never overwritten.
    pub fn apply_update(&mut self, update: SessionUpdate) {
        if let Some(display_name) = update.display_name {
            self.display_name = display_name;
        }
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(status_message) = update.status_message {
            self.status_message = status_message;
        }
        if let Some(accept_set) = update.accept_set {
            self.accept_set = accept_set;
        }
        if let Some(usage) = update.add_token_usage {
            self.total_prompt_tokens += usage.prompt_tokens;
            self.total_completion_tokens += usage.completion_tokens;
        }
        self.updated_at = Utc::now();
    }
}

/// A partial update applied to session metadata via `SessionStore::update`.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub display_name: Option<String>,
    pub model: Option<String>,
    pub status: Option<SessionStatus>,
    pub status_message: Option<Option<String>>,
    pub accept_set: Option<HashSet<String>>,
    pub add_token_usage: Option<TokenUsage>,
}

impl SessionUpdate {
    pub fn status(status: SessionStatus, message: Option<String>) -> Self {
        Self {
            status: Some(status),
            status_message: Some(message),
            ..Default::default()
        }
    }

    pub fn accept_set(accept_set: HashSet<String>) -> Self {
        Self {
            accept_set: Some(accept_set),
            ..Default::default()
        }
    }

    pub fn token_usage(usage: TokenUsage) -> Self {
        Self {
            add_token_usage: Some(usage),
            ..Default::default()
        }
    }
}
