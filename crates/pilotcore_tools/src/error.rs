//! Tool Catalog errors (§7 "validation" and "tool execution" categories).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolCatalogError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

pub type Result<T> = std::result::Result<T, ToolCatalogError>;
