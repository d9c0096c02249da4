//! Error types for the observability crate.

use thiserror::Error;

/// Errors that can occur during observability initialization.
#[derive(Error, Debug)]
pub enum ObservabilityError {
    #[error("failed to initialize observability: {0}")]
    InitFailed(String),

    #[error("configuration error: {0}")]
    Config(String),
}
