//! The OS-automation tool boundary (§6): a remote `.computer` endpoint
//! reached by the Agent Loop to take screenshots and dispatch grounded
//! actions.

pub mod action;
pub mod client;
pub mod error;
#[cfg(feature = "test-util")]
pub mod fake;

pub use action::{ActionResponse, ComputerAction};
pub use client::{AutomationClient, HttpAutomationClient};
pub use error::{AutomationError, Result};
