//! Ordered set of tools, looked up by name.
use std::sync::Arc;

use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::tools::{DrawPainting, DrawSeedream4, EditImage, EditSeedream4, Tool, ToolCall, ToolContext, ToolOutput};

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry { tools: Vec::new() }
    }

    /// All tools shipped with the crate.
    pub fn builtin() -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(DrawPainting);
        registry.register(DrawSeedream4);
        registry.register(EditImage);
        registry.register(EditSeedream4);
        registry
    }

    /// Add a tool; a tool with the same name is replaced in place.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let tool: Arc<dyn Tool> = Arc::new(tool);
        tracing::debug!("Registered tool: {}", tool.name());
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn schemas(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub async fn invoke(&self, name: &str, call: &ToolCall, ctx: &ToolContext) -> AppResult<ToolOutput> {
        let tool = self.get(name).ok_or_else(|| AppError::UnknownTool(name.to_string()))?;
        tracing::info!(tool = name, origin = %call.user.origin, "Invoking tool");
        tool.call(call, ctx).await
    }
}
