//! Tool registry
//!
//! Built once at startup; the router only reads it.

use std::collections::BTreeMap;
use std::sync::Arc;

use exec_tool::RunCommandTool;
use preview_tool::BrowserPreviewTool;
use serde_json::{Map, Value};
use tool_common::Tool;

use crate::error::{HubError, HubResult};

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool
    pub fn with_defaults(
        exec: exec_tool::Config,
        filesystem: filesystem_tool::Config,
    ) -> HubResult<Self> {
        let mut registry = Self::new();

        let run_command = RunCommandTool::with_config(exec).map_err(|e| HubError::ToolSetup {
            tool: "run_command",
            message: e.to_string(),
        })?;
        registry.register(Arc::new(run_command));
        registry.register(Arc::new(BrowserPreviewTool::new()));
        for tool in filesystem_tool::filesystem_tools(filesystem) {
            registry.register(tool);
        }

        tracing::info!(
            count = registry.len(),
            tools = %registry.names().collect::<Vec<_>>().join(", "),
            "registered tools"
        );
        Ok(registry)
    }

    /// Register a tool under its name, replacing any previous one
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// `{name: {name, description, schema}}` for every tool
    pub fn definitions(&self) -> Value {
        let map: Map<String, Value> = self
            .tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.descriptor().to_definition()))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sorted() {
        let registry =
            ToolRegistry::with_defaults(exec_tool::Config::default(), filesystem_tool::Config::default())
                .unwrap();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(
            names,
            vec!["browser_preview", "edit_file", "run_command", "view_file", "write_to_file"]
        );
    }

    #[test]
    fn test_definitions_carry_schema() {
        let registry =
            ToolRegistry::with_defaults(exec_tool::Config::default(), filesystem_tool::Config::default())
                .unwrap();
        let defs = registry.definitions();
        assert_eq!(defs["view_file"]["name"], "view_file");
        assert!(defs["run_command"]["schema"]["required"].is_array());
    }

    #[test]
    fn test_bad_guard_pattern_fails_setup() {
        let mut exec = exec_tool::Config::default();
        exec.guard.deny = vec!["(".to_string()];
        let result = ToolRegistry::with_defaults(exec, filesystem_tool::Config::default());
        assert!(matches!(result, Err(HubError::ToolSetup { tool: "run_command", .. })));
    }
}
