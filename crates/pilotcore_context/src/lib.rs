//! Pure, I/O-free conversion from a session's persisted message log into the
//! LLM-facing history (§4.2).

pub mod assembler;
pub mod error;

pub use assembler::{append_turn, assemble_history, LlmMessage, LlmPart, LlmRole};
pub use error::{ContextError, Result};
