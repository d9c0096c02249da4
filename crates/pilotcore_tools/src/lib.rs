//! The Tool Catalog (§4.5): declares the abstract computer-control tools
//! exposed to the planning LLM, validates their arguments, and produces
//! grounded tool calls.

pub mod catalog;
pub mod error;
pub mod grounded_call;
pub mod tool;
pub mod tools;

pub use catalog::ToolCatalog;
pub use error::{Result, ToolCatalogError};
pub use grounded_call::{DescriptionSpec, GroundedTarget, GroundedToolCall, GROUNDED_CALL_NAME};
pub use tool::ComputerTool;
