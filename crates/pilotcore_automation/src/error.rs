//! OS-automation tool boundary errors (§6, §7 "tool execution errors").

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("automation request failed: {0}")]
    RequestFailed(String),

    #[error("automation service returned an error: {0}")]
    ServiceError(String),

    #[error("screenshot response had mimeType {0}, only image/png is accepted")]
    UnsupportedScreenshotFormat(String),

    #[error("automation call was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AutomationError>;
