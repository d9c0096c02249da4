//! The Agent Loop (§4.6): the turn procedure that ties the Session Store,
//! Context Assembler, Screen Tiler, Grounding Pipeline, and Tool Catalog
//! together into one resumable per-session control loop.

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{LlmProvider, RuntimeConfig};
pub use error::{Result, RuntimeError};
pub use runtime::{Runtime, TurnInput};
