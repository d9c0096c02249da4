//! The registry of tools declared to the planning LLM (§4.5).

use std::sync::Arc;

use crate::error::{Result, ToolCatalogError};
use crate::tool::ComputerTool;
use crate::tools::{click::Click, drag_and_drop::DragAndDrop, key::Key, type_tool::Type, wait::Wait};

/// Declares the five catalog tools visible to the planner. `computer_scroll`
/// ([`crate::tools::scroll::Scroll`]) is implemented with full grounding
/// logic exactly like the others but is intentionally left out of this list
/// (§9(a)): construct it directly if you need it outside the catalog.
pub struct ToolCatalog {
    tools: Vec<Arc<dyn ComputerTool>>,
}

impl ToolCatalog {
    pub fn standard() -> Self {
        Self {
            tools: vec![
                Arc::new(Click),
                Arc::new(Type),
                Arc::new(DragAndDrop),
                Arc::new(Key),
                Arc::new(Wait),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ComputerTool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn require(&self, name: &str) -> Result<&Arc<dyn ComputerTool>> {
        self.get(name).ok_or_else(|| ToolCatalogError::UnknownTool(name.to_string()))
    }

    pub fn tools(&self) -> &[Arc<dyn ComputerTool>] {
        &self.tools
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
